use std::collections::VecDeque;

use tokio::sync::mpsc;
use triage::config::ReactorConfig;
use triage::feed::ScriptedFeed;
use triage::kernel::event::{Event, InputEvent, OperatorAction, TranscriptRevision};
use triage::kernel::incident::{FieldEdit, FieldKey, RuleSet};
use triage::kernel::reactor::Reactor;
use triage::kernel::telemetry::event::{FieldEventKind, TelemetryEvent};
use triage::kernel::telemetry::metrics::compute_snapshot;
use triage::kernel::telemetry::recorder::TelemetryRecorder;

fn reactor(telemetry_enabled: bool) -> Reactor {
    let (_tx, rx) = mpsc::channel(10);
    let config = ReactorConfig { telemetry_enabled, ..ReactorConfig::default() };
    Reactor::new(rx, RuleSet::default(), config)
}

fn demo_events() -> Vec<Event> {
    ScriptedFeed::demo_call()
        .map(|line| Event::Input(InputEvent::transcript("demo", &line)))
        .collect()
}

#[tokio::test]
async fn test_demo_call_metrics() {
    let mut reactor = reactor(true);
    let expected_bytes: usize = ScriptedFeed::demo_call().map(|l| l.len()).sum();

    reactor.tick_step(demo_events());
    reactor.tick_step(vec![
        Event::Operator(OperatorAction::EditField(FieldEdit::PatientCount(1))),
        Event::Operator(OperatorAction::RequestDispatch),
        Event::Operator(OperatorAction::EndCall),
    ]);

    let snap = reactor.telemetry.snapshot();
    assert_eq!(snap.transcript_stats.chunks, 10);
    assert_eq!(snap.transcript_stats.total_bytes, expected_bytes as u64);
    assert!(snap.transcript_stats.avg_chunk_bytes > 0.0);

    // emergency -> other, then chest pain -> cardiac, then the hang-up reset
    assert_eq!(snap.classification_stats.automatic_changes, 3);
    assert_eq!(snap.classification_stats.cleared, 1);
    assert_eq!(snap.field_stats.verified, 1);
    assert!(snap.field_stats.extracted >= 3);
    assert_eq!(snap.dispatch_stats.issued, 1);
    assert_eq!(snap.dispatch_stats.calls_ended, 1);
    assert_eq!(snap.dispatch_stats.total_call_ticks, 2);
}

#[tokio::test]
async fn test_telemetry_never_carries_call_content() {
    let mut reactor = reactor(true);
    reactor.tick_step(vec![Event::Input(InputEvent::call_metadata("telephony", "+1 (555) 123-4567"))]);
    reactor.tick_step(demo_events());
    reactor.tick_step(vec![Event::Operator(OperatorAction::EditField(FieldEdit::CallerName(
        "Jane Doe".to_string(),
    )))]);

    let dump = serde_json::to_string(&reactor.telemetry.events().collect::<Vec<_>>()).unwrap();
    for secret in ["Main Street", "husband", "chest pain", "555", "Jane Doe", "40.7128"] {
        assert!(!dump.contains(secret), "telemetry leaked '{}'", secret);
    }
}

#[tokio::test]
async fn test_field_lifecycle_events() {
    let mut reactor = reactor(true);
    reactor.tick_step(vec![Event::Input(InputEvent::transcript("t", "3 people hurt"))]);
    reactor.tick_step(vec![Event::Operator(OperatorAction::EditField(FieldEdit::PatientCount(4)))]);
    reactor.tick_step(vec![Event::Operator(OperatorAction::ReopenField(FieldKey::PatientCount))]);

    let lifecycle: Vec<FieldEventKind> = reactor
        .telemetry
        .events()
        .filter_map(|e| match e {
            TelemetryEvent::FieldLifecycle { field: FieldKey::PatientCount, event } => Some(*event),
            _ => None,
        })
        .collect();

    assert_eq!(
        lifecycle,
        vec![FieldEventKind::Extracted, FieldEventKind::Verified, FieldEventKind::Reopened]
    );
}

#[tokio::test]
async fn test_disabled_telemetry_records_nothing() {
    let mut reactor = reactor(false);
    reactor.tick_step(demo_events());
    assert!(reactor.telemetry.is_empty());
    assert_eq!(reactor.telemetry.snapshot().transcript_stats.chunks, 0);
}

#[test]
fn test_recorder_is_bounded() {
    let mut recorder = TelemetryRecorder::new();
    for i in 0..10_050u64 {
        recorder.record(TelemetryEvent::TranscriptAppended {
            revision: TranscriptRevision(i),
            bytes: 1,
        });
    }
    assert_eq!(recorder.len(), 10_000);
    // Oldest events are dropped first
    assert!(matches!(
        recorder.events().next(),
        Some(TelemetryEvent::TranscriptAppended { revision: TranscriptRevision(50), .. })
    ));

    recorder.clear();
    assert!(recorder.is_empty());
}

#[test]
fn test_empty_snapshot() {
    let snap = compute_snapshot(&VecDeque::new());
    assert_eq!(snap.transcript_stats.chunks, 0);
    assert_eq!(snap.transcript_stats.avg_chunk_bytes, 0.0);
    assert_eq!(snap.dispatch_stats.issued, 0);
}
