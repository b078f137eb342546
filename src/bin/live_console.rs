use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use triage::config::TriageConfig;
use triage::feed::console::{parse_console_line, HELP};
use triage::kernel::scheduler::SideEffect;
use triage::Reactor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Starting live triage console...");

    // 2. Setup Reactor + Channels
    let config = TriageConfig::from_env()?;
    let rules = config.load_rules()?;
    let (tx_input, rx_input) = mpsc::channel(100);
    let mut reactor = Reactor::new(rx_input, rules, config.reactor.clone());

    // 3. Spawn Input Reader (Stdin). EOF closes the channel and ends the session.
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        println!("{}", HELP);

        while let Ok(Some(line)) = lines.next_line().await {
            let event = match parse_console_line("console", &line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(msg) => {
                    println!("! {}", msg);
                    continue;
                }
            };

            if let Err(e) = tx_input.send(event).await {
                tracing::error!("Failed to send input: {}", e);
                break;
            }
        }
    });

    // 4. Run Kernel, echoing results for the operator
    tracing::info!("Kernel Loop Active.");
    let snapshot = reactor
        .run_with(|effect| {
            triage::kernel::reactor::log_effect(effect);
            print_effect(effect);
        })
        .await;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn print_effect(effect: &SideEffect) {
    match effect {
        SideEffect::ClassificationChanged { result, .. } => match &result.category {
            Some(category) => println!(
                "> {} / {} ({:.0}%)",
                category,
                result.severity,
                result.confidence * 100.0
            ),
            None => println!("> unclassified"),
        },
        SideEffect::FieldsUpdated { changed, fields, .. } => {
            for key in changed {
                let marker = if fields.is_verified(*key) { "verified" } else { "extracted" };
                println!("  {} [{}, {:.0}%]", key, marker, fields.confidence(*key) * 100.0);
            }
        }
        SideEffect::DispatchReadiness { ready, priority } => {
            println!("> dispatch {} ({})", if *ready { "ready" } else { "not ready" }, priority)
        }
        SideEffect::Dispatched(request) => println!("> unit requested: {}", request.id),
        SideEffect::DispatchRejected { reason } => println!("! dispatch rejected: {}", reason),
        SideEffect::Log(msg) => println!("! {}", msg),
    }
}
