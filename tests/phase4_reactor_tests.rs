use tokio::sync::mpsc;
use triage::config::ReactorConfig;
use triage::feed::{pump, ScriptedFeed};
use triage::kernel::event::{Event, InputEvent, OperatorAction, TranscriptRevision};
use triage::kernel::incident::{
    analyse, CategoryId, ClassificationResult, ClassificationSource, FieldEdit, FieldKey, RuleSet,
    Severity,
};
use triage::kernel::reactor::Reactor;
use triage::kernel::scheduler::SideEffect;
use triage::kernel::time::Tick;

fn reactor() -> (mpsc::Sender<Event>, Reactor) {
    let (tx, rx) = mpsc::channel(100);
    let reactor = Reactor::new(rx, RuleSet::default(), ReactorConfig::default());
    (tx, reactor)
}

fn say(text: &str) -> Event {
    Event::Input(InputEvent::transcript("test", text))
}

fn op(action: OperatorAction) -> Event {
    Event::Operator(action)
}

#[tokio::test]
async fn test_empty_step_only_advances_tick() {
    let (_tx, mut reactor) = reactor();
    assert_eq!(reactor.state.version, 0);

    let effects = reactor.tick_step(vec![]);
    assert!(effects.is_empty());
    assert_eq!(reactor.tick, Tick { frame: 1 });
    assert_eq!(reactor.state.last_tick, Tick { frame: 1 });
    assert_eq!(reactor.state.version, 1);
    assert_eq!(reactor.state.revision, TranscriptRevision(0));
}

#[tokio::test]
async fn test_transcript_chunk_is_analysed_in_the_same_step() {
    let (_tx, mut reactor) = reactor();

    let effects = reactor.tick_step(vec![say("My husband is having chest pain")]);

    assert_eq!(reactor.state.revision, TranscriptRevision(1));
    assert_eq!(reactor.state.analysed_revision(), Some(TranscriptRevision(1)));
    assert_eq!(reactor.state.classification().category, Some(CategoryId::new("cardiac")));

    assert!(matches!(
        &effects[0],
        SideEffect::ClassificationChanged { revision: TranscriptRevision(1), result }
            if result.severity == Severity::Critical
    ));
    assert!(effects.iter().any(|e| matches!(e, SideEffect::FieldsUpdated { changed, .. }
        if changed == &vec![FieldKey::CallerRelationship])));
    assert!(effects.iter().any(|e| matches!(e, SideEffect::DispatchReadiness { ready: true, .. })));
}

#[tokio::test]
async fn test_chunks_accumulate_with_separator() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![say("first"), say("   "), say("second")]);

    // Blank chunks do not count as a revision
    assert_eq!(reactor.state.revision, TranscriptRevision(2));
    assert_eq!(reactor.state.transcript(), "first\n\nsecond");
}

#[tokio::test]
async fn test_stale_analysis_is_rejected() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![say("chest pain")]);
    reactor.tick_step(vec![say("he is fine now")]);
    assert_eq!(reactor.state.revision, TranscriptRevision(2));

    // Computed against revision 1, arrives late
    let late = analyse("severe bleeding", TranscriptRevision(1), None, reactor.rules());
    assert!(!reactor.apply_analysis(late));

    assert_eq!(reactor.state.classification().category, Some(CategoryId::new("cardiac")));
    assert_eq!(reactor.state.analysed_revision(), Some(TranscriptRevision(2)));
    assert_eq!(reactor.telemetry.snapshot().transcript_stats.stale_discarded, 1);
}

#[tokio::test]
async fn test_events_apply_in_arrival_order() {
    let (_tx, mut reactor) = reactor();

    let effects = reactor.tick_step(vec![
        say("chest pain"),
        op(OperatorAction::SelectCategory(CategoryId::new("stroke"))),
        say("severe bleeding everywhere"),
    ]);

    let changes: Vec<&ClassificationResult> = effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::ClassificationChanged { result, .. } => Some(result),
            _ => None,
        })
        .collect();

    // cardiac (auto), then stroke (manual); the third chunk cannot move a pinned category
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].category, Some(CategoryId::new("cardiac")));
    assert_eq!(changes[1].category, Some(CategoryId::new("stroke")));

    let current = reactor.state.classification();
    assert_eq!(current.category, Some(CategoryId::new("stroke")));
    assert_eq!(current.confidence, 1.0);
    assert_eq!(current.source, ClassificationSource::Manual);
    // Manual category keeps the derived severity
    assert_eq!(current.severity, Severity::Critical);
    assert!(reactor.state.is_overridden());
}

#[tokio::test]
async fn test_clear_override_restores_automatic_result() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![
        say("chest pain"),
        op(OperatorAction::SelectCategory(CategoryId::new("accident"))),
        op(OperatorAction::SelectSeverity(Severity::Stable)),
    ]);
    assert_eq!(reactor.state.classification().severity, Severity::Stable);

    reactor.tick_step(vec![op(OperatorAction::ClearOverride)]);

    let current = reactor.state.classification();
    assert!(!reactor.state.is_overridden());
    assert_eq!(current.category, Some(CategoryId::new("cardiac")));
    assert_eq!(current.severity, Severity::Critical);
    assert_eq!(current.source, ClassificationSource::Automatic);
}

#[tokio::test]
async fn test_pinned_severity_survives_new_text() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![op(OperatorAction::SelectSeverity(Severity::Stable))]);
    reactor.tick_step(vec![say("cardiac arrest")]);

    let current = reactor.state.classification();
    assert_eq!(current.category, Some(CategoryId::new("cardiac")));
    assert_eq!(current.severity, Severity::Stable);
}

#[tokio::test]
async fn test_unknown_category_is_ignored() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![say("chest pain")]);

    let effects = reactor.tick_step(vec![op(OperatorAction::SelectCategory(CategoryId::new("fire")))]);

    assert!(matches!(&effects[..], [SideEffect::Log(msg)] if msg.contains("fire")));
    assert_eq!(reactor.state.classification().category, Some(CategoryId::new("cardiac")));
    assert!(!reactor.state.is_overridden());
}

#[tokio::test]
async fn test_verified_field_is_frozen_until_reopened() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![say("We're at 1234 Main Street.")]);
    assert_eq!(reactor.state.fields().address.value, "1234 Main Street");

    let effects = reactor.tick_step(vec![op(OperatorAction::EditField(FieldEdit::Address(
        "500 Oak Avenue".to_string(),
    )))]);
    assert!(effects.iter().any(|e| matches!(e, SideEffect::FieldsUpdated { changed, .. }
        if changed == &vec![FieldKey::Address])));

    reactor.tick_step(vec![say("Sorry, it's 77 Elm Road.")]);
    let address = &reactor.state.fields().address;
    assert_eq!(address.value, "500 Oak Avenue");
    assert_eq!(address.confidence, 1.0);
    assert!(address.verified);

    reactor.tick_step(vec![op(OperatorAction::ReopenField(FieldKey::Address))]);
    let address = &reactor.state.fields().address;
    assert!(!address.verified);
    // First address in the transcript wins
    assert_eq!(address.value, "1234 Main Street");
    assert!((address.confidence - 0.92).abs() < 1e-6);
}

#[tokio::test]
async fn test_caller_phone_comes_from_metadata() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![
        Event::Input(InputEvent::call_metadata("telephony", "+1 (555) 123-4567")),
        say("my name is John Smith"),
    ]);

    let fields = reactor.state.fields();
    assert_eq!(fields.caller_phone.value, "+1 (555) 123-4567");
    assert_eq!(fields.caller_phone.confidence, 1.0);
    assert_eq!(fields.caller_name.value, "John Smith");
}

#[tokio::test]
async fn test_end_call_resets_and_ignores_late_text() {
    let (_tx, mut reactor) = reactor();
    reactor.tick_step(vec![say("chest pain at 12 Oak Street")]);
    let revision = reactor.state.revision;

    reactor.tick_step(vec![op(OperatorAction::EndCall), say("hello?")]);

    assert!(!reactor.state.call_active);
    assert!(reactor.state.transcript().is_empty());
    assert!(reactor.state.revision > revision);
    assert_eq!(reactor.state.classification(), &ClassificationResult::unclassified());
    assert_eq!(reactor.state.fields().address.value, "");

    // An analysis of the pre-hangup text is stale now
    let late = analyse("chest pain at 12 Oak Street", revision, None, reactor.rules());
    assert!(!reactor.apply_analysis(late));
}

#[tokio::test]
async fn test_run_drains_channel_and_returns_snapshot() {
    let (tx, rx) = mpsc::channel(100);
    let config = ReactorConfig { tick_ms: 1, telemetry_enabled: true };
    let mut reactor = Reactor::new(rx, RuleSet::default(), config);

    let sent = pump(ScriptedFeed::demo_call(), "demo", &tx, std::time::Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(sent, 10);
    drop(tx);

    let snapshot = reactor.run().await;
    assert_eq!(snapshot.revision, TranscriptRevision(10));
    assert_eq!(snapshot.classification.category, Some(CategoryId::new("cardiac")));
    assert_eq!(snapshot.classification.severity, Severity::Critical);
    assert_eq!(snapshot.fields.address.value, "1234 Main Street, apartment 5B");
    assert_eq!(snapshot.recommended_protocols, vec!["cpr", "choking"]);
    assert!(snapshot.dispatch_ready);
}
