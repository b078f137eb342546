use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use triage::config::TriageConfig;
use triage::feed::{pump, ScriptedFeed};
use triage::kernel::event::{Event, InputEvent, OperatorAction};
use triage::{Reactor, TriageError};

/// Replays the scripted cardiac call through a live reactor, asks for a
/// unit at the end and prints the final session as JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = TriageConfig::from_env()?;
    let rules = config.load_rules().context("loading rule set")?;
    tracing::info!("Triage kernel booting. Feed interval: {}ms", config.feed_interval_ms);

    let (tx, rx) = mpsc::channel(100);
    let mut reactor = Reactor::new(rx, rules, config.reactor.clone());

    let pause = Duration::from_millis(config.feed_interval_ms);
    let feeder = tokio::spawn(async move {
        tx.send(Event::Input(InputEvent::call_metadata("telephony", "+1 (555) 123-4567")))
            .await
            .map_err(|_| TriageError::FeedClosed)?;

        let sent = pump(ScriptedFeed::demo_call(), "demo", &tx, pause).await?;

        tx.send(Event::Operator(OperatorAction::RequestDispatch))
            .await
            .map_err(|_| TriageError::FeedClosed)?;
        Ok::<usize, TriageError>(sent)
        // tx dropped here, which stops the reactor
    });

    let snapshot = reactor.run().await;
    let sent = feeder.await??;

    let stats = reactor.telemetry.snapshot();
    tracing::info!(
        chunks = sent,
        classification_changes = stats.classification_stats.automatic_changes,
        fields_extracted = stats.field_stats.extracted,
        dispatches = stats.dispatch_stats.issued,
        "Demo call replayed"
    );

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
