use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{interval, Duration, MissedTickBehavior}; // Only for the loop driver
use tracing::{debug, info, warn};

use super::event::{Event, InputContent, InputEvent, OperatorAction};
use super::scheduler::{Scheduler, SideEffect};
use super::state::{ResultsView, SessionSnapshot, SessionState, StateDelta};
use super::telemetry::event::{DispatchEventKind, FieldEventKind, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Tick;
use crate::config::ReactorConfig;
use crate::dispatch::build_request;
use crate::error::TriageError;
use crate::kernel::incident::{analyse, Analysis, FieldKey, RuleSet};

pub struct Reactor {
    pub receiver: mpsc::Receiver<Event>,
    pub state: SessionState,
    pub scheduler: Scheduler,
    pub telemetry: TelemetryRecorder,
    pub tick: Tick,
    rules: RuleSet,
    config: ReactorConfig,
}

impl Reactor {
    pub fn new(receiver: mpsc::Receiver<Event>, rules: RuleSet, config: ReactorConfig) -> Self {
        let telemetry = if config.telemetry_enabled {
            TelemetryRecorder::new()
        } else {
            TelemetryRecorder::disabled()
        };

        Self {
            receiver,
            state: SessionState::new(),
            scheduler: Scheduler,
            telemetry,
            tick: Tick::new(),
            rules,
            config,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot(&self.rules)
    }

    /// Pure Tick Step: Advances State. Returns SideEffects to be executed by the driver.
    /// MUST NOT await I/O or timers.
    ///
    /// Events are applied strictly in arrival order. A transcript chunk is
    /// analysed before the next event is looked at, so the results after
    /// event N reflect exactly the text up to N.
    pub fn tick_step(&mut self, events: Vec<Event>) -> Vec<SideEffect> {
        self.tick = self.tick.next();
        self.state.reduce(StateDelta::Tick(self.tick));
        let mut effects = Vec::new();

        for event in events {
            let before = self.state.view();

            match event {
                Event::Input(input) => self.handle_input(input, &mut effects),
                Event::Operator(action) => self.handle_operator(action, &mut effects),
            }

            let after = self.state.view();
            self.record_transitions(&before, &after);
            effects.extend(self.scheduler.project(&before, &after, self.state.revision));
        }

        effects
    }

    /// STALE REJECTION: only an analysis of the current revision may land.
    pub fn apply_analysis(&mut self, analysis: Analysis) -> bool {
        if analysis.revision != self.state.revision {
            info!(
                "Discarded stale analysis: revision {} vs current {}",
                analysis.revision.0, self.state.revision.0
            );
            self.telemetry.record(TelemetryEvent::StaleAnalysisDiscarded {
                analysed: analysis.revision,
                current: self.state.revision,
            });
            return false;
        }
        self.state.reduce(StateDelta::AnalysisCompleted(analysis));
        true
    }

    fn reanalyse(&mut self) {
        let analysis = analyse(
            self.state.transcript(),
            self.state.revision,
            Some(self.state.fields()),
            &self.rules,
        );
        self.apply_analysis(analysis);
    }

    fn handle_input(&mut self, input: InputEvent, effects: &mut Vec<SideEffect>) {
        match input.content {
            InputContent::Transcript(text) => {
                if !self.state.call_active {
                    warn!("Transcript from '{}' after call ended, ignored", input.source);
                    effects.push(SideEffect::Log("transcript ignored: call has ended".to_string()));
                    return;
                }
                if text.trim().is_empty() {
                    return;
                }

                let bytes = text.len();
                self.state.reduce(StateDelta::TranscriptAppended(text));
                self.telemetry.record(TelemetryEvent::TranscriptAppended {
                    revision: self.state.revision,
                    bytes,
                });
                debug!(
                    source = %input.source,
                    revision = self.state.revision.0,
                    bytes,
                    "Transcript chunk appended"
                );

                self.reanalyse();
            }
            InputContent::CallMetadata { caller_phone } => {
                debug!(source = %input.source, "Call metadata received");
                self.state.reduce(StateDelta::CallerPhoneReceived(caller_phone));
            }
        }
    }

    fn handle_operator(&mut self, action: OperatorAction, effects: &mut Vec<SideEffect>) {
        match action {
            OperatorAction::SelectCategory(id) => match self.rules.require_category(&id) {
                Ok(category) => {
                    let category = category.clone();
                    info!("Operator selected category '{}'", category.id);
                    self.state.reduce(StateDelta::CategorySelected(category));
                }
                Err(e) => {
                    warn!("Manual selection rejected: {}", e);
                    effects.push(SideEffect::Log(e.to_string()));
                }
            },
            OperatorAction::SelectSeverity(severity) => {
                info!("Operator set severity '{}'", severity);
                self.state.reduce(StateDelta::SeveritySelected(severity));
            }
            OperatorAction::ClearOverride => {
                info!("Operator cleared classification override");
                self.state.reduce(StateDelta::OverrideCleared);
                // The heuristic takes over again right away
                self.reanalyse();
            }
            OperatorAction::EditField(edit) => {
                debug!("Operator edited field '{}'", edit.key());
                self.state.reduce(StateDelta::FieldEdited(edit));
            }
            OperatorAction::ReopenField(key) => {
                debug!("Operator reopened field '{}'", key);
                self.state.reduce(StateDelta::FieldReopened(key));
                self.reanalyse();
            }
            OperatorAction::RequestDispatch => self.handle_dispatch(effects),
            OperatorAction::EndCall => {
                let duration_ticks = self.tick.since(self.state.call_started_at);
                info!("Call ended after {} ticks", duration_ticks);
                self.state.reduce(StateDelta::CallEnded);
                self.telemetry.record(TelemetryEvent::CallEnded { duration_ticks });
            }
        }
    }

    fn handle_dispatch(&mut self, effects: &mut Vec<SideEffect>) {
        let outcome = if self.state.dispatch().is_some() {
            Err(TriageError::DispatchBlocked("unit already dispatched for this call".to_string()))
        } else if !self.state.call_active {
            Err(TriageError::DispatchBlocked("call has ended".to_string()))
        } else {
            build_request(
                self.state.session_id,
                self.state.revision,
                self.state.classification(),
                self.state.fields(),
            )
        };

        match outcome {
            Ok(request) => {
                info!(
                    "Dispatch issued: request {} priority {} category '{}'",
                    request.id, request.priority, request.category
                );
                self.state.reduce(StateDelta::Dispatched(request.clone()));
                self.telemetry.record(TelemetryEvent::Dispatch {
                    event: DispatchEventKind::Issued,
                    tick: self.tick,
                });
                effects.push(SideEffect::Dispatched(request));
            }
            Err(e) => {
                warn!("{}", e);
                self.telemetry.record(TelemetryEvent::Dispatch {
                    event: DispatchEventKind::Rejected,
                    tick: self.tick,
                });
                effects.push(SideEffect::DispatchRejected { reason: e.to_string() });
            }
        }
    }

    fn record_transitions(&mut self, before: &ResultsView, after: &ResultsView) {
        if before.classification != after.classification {
            self.telemetry.record(TelemetryEvent::ClassificationChanged {
                category: after.classification.category.clone(),
                severity: after.classification.severity,
                source: after.classification.source,
            });
        }

        for key in after.fields.changed_keys(&before.fields) {
            self.telemetry.record(TelemetryEvent::FieldLifecycle {
                field: key,
                event: field_event(key, before, after),
            });
        }
    }

    /// Async Driver Loop. Runs until every sender is gone, then returns the
    /// final picture of the session.
    pub async fn run(&mut self) -> SessionSnapshot {
        self.run_with(log_effect).await
    }

    pub async fn run_with<F>(&mut self, mut on_effect: F) -> SessionSnapshot
    where
        F: FnMut(&SideEffect),
    {
        info!("Reactor loop started. Tick: {}ms", self.config.tick_ms);

        let mut cadence = interval(Duration::from_millis(self.config.tick_ms.max(1)));
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Driver: Wait for physical time boundary
            cadence.tick().await;

            // Driver: Drain everything queued so far, keeping arrival order
            let mut events = Vec::new();
            let mut closed = false;
            loop {
                match self.receiver.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }

            // Core: Execute Step
            let effects = self.tick_step(events);

            // Driver: Hand off Side Effects
            for effect in &effects {
                on_effect(effect);
            }

            if closed {
                info!("Event channel closed. Reactor stopping at tick {}", self.tick.frame);
                break;
            }
        }

        self.snapshot()
    }
}

fn field_event(key: FieldKey, before: &ResultsView, after: &ResultsView) -> FieldEventKind {
    if after.fields.is_verified(key) {
        FieldEventKind::Verified
    } else if before.fields.is_verified(key) {
        FieldEventKind::Reopened
    } else {
        FieldEventKind::Extracted
    }
}

/// Default effect sink. Never logs transcript text or caller identity.
pub fn log_effect(effect: &SideEffect) {
    match effect {
        SideEffect::Log(msg) => info!("[LOG] {}", msg),
        SideEffect::ClassificationChanged { revision, result } => info!(
            "[CLASSIFY r{}] category={} severity={} confidence={:.2} source={:?}",
            revision.0,
            result.category.as_ref().map(|c| c.as_str()).unwrap_or("unclassified"),
            result.severity,
            result.confidence,
            result.source
        ),
        SideEffect::FieldsUpdated { revision, changed, .. } => {
            let keys: Vec<&str> = changed.iter().map(|k| k.as_str()).collect();
            info!("[FIELDS r{}] updated: {}", revision.0, keys.join(", "));
        }
        SideEffect::DispatchReadiness { ready, priority } => {
            info!("[DISPATCH] ready={} priority={}", ready, priority)
        }
        SideEffect::Dispatched(request) => info!(
            "[DISPATCH] request {} sent, priority {}, {} patient(s)",
            request.id, request.priority, request.patient_count
        ),
        SideEffect::DispatchRejected { reason } => warn!("[DISPATCH] rejected: {}", reason),
    }
}
