use std::time::Duration;

use tokio::sync::mpsc;
use triage::error::TriageError;
use triage::feed::console::parse_console_line;
use triage::feed::{pump, ScriptedFeed, TranscriptFeed};
use triage::kernel::event::{Event, InputContent, InputEvent, OperatorAction};
use triage::kernel::incident::{CategoryId, FieldEdit, FieldKey, Severity};

#[test]
fn test_scripted_feed_replays_in_order() {
    let mut feed = ScriptedFeed::demo_call();
    assert_eq!(feed.remaining(), 10);
    assert_eq!(feed.next_chunk().as_deref(), Some("Hello, 911, what's your emergency?"));
    assert_eq!(feed.remaining(), 9);
}

#[tokio::test]
async fn test_pump_sends_every_chunk() {
    let (tx, mut rx) = mpsc::channel(16);
    let lines = vec!["one".to_string(), "two".to_string()];

    let sent = pump(lines.into_iter(), "radio", &tx, Duration::from_millis(1)).await.unwrap();
    assert_eq!(sent, 2);

    assert_eq!(rx.recv().await, Some(Event::Input(InputEvent::transcript("radio", "one"))));
    let second = rx.recv().await.unwrap();
    match second {
        Event::Input(InputEvent { source, content: InputContent::Transcript(text) }) => {
            assert_eq!(source, "radio");
            assert_eq!(text, "two");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_pump_fails_when_reactor_is_gone() {
    let (tx, rx) = mpsc::channel(4);
    drop(rx);

    let result = pump(ScriptedFeed::new(["chest pain"]), "demo", &tx, Duration::ZERO).await;
    assert!(matches!(result, Err(TriageError::FeedClosed)));
}

#[test]
fn test_console_lines() {
    assert_eq!(parse_console_line("console", "   "), Ok(None));
    assert_eq!(
        parse_console_line("console", "  he collapsed  "),
        Ok(Some(Event::Input(InputEvent::transcript("console", "he collapsed"))))
    );

    let op = |line: &str| match parse_console_line("console", line) {
        Ok(Some(Event::Operator(action))) => action,
        other => panic!("'{}' parsed to {:?}", line, other),
    };

    assert_eq!(op("/category stroke"), OperatorAction::SelectCategory(CategoryId::new("stroke")));
    assert_eq!(op("/severity Critical"), OperatorAction::SelectSeverity(Severity::Critical));
    assert_eq!(op("/clear"), OperatorAction::ClearOverride);
    assert_eq!(
        op("/edit address 500 Oak Avenue"),
        OperatorAction::EditField(FieldEdit::Address("500 Oak Avenue".to_string()))
    );
    assert_eq!(op("/edit patient-count 3"), OperatorAction::EditField(FieldEdit::PatientCount(3)));
    assert_eq!(op("/reopen caller_name"), OperatorAction::ReopenField(FieldKey::CallerName));
    assert_eq!(op("/dispatch"), OperatorAction::RequestDispatch);
    assert_eq!(op("/end"), OperatorAction::EndCall);

    assert_eq!(
        parse_console_line("console", "/phone +1 555 0100"),
        Ok(Some(Event::Input(InputEvent::call_metadata("console", "+1 555 0100"))))
    );
}

#[test]
fn test_console_rejects_malformed_commands() {
    for line in [
        "/category",
        "/severity urgent",
        "/edit address",
        "/edit patient_count many",
        "/reopen blood_type",
        "/phone",
        "/teleport",
    ] {
        assert!(parse_console_line("console", line).is_err(), "'{}' should be rejected", line);
    }
}
