use std::collections::VecDeque;

use super::event::{DispatchEventKind, FieldEventKind, TelemetryEvent};
use crate::kernel::incident::ClassificationSource;

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub transcript_stats: TranscriptStats,
    pub classification_stats: ClassificationStats,
    pub field_stats: FieldStats,
    pub dispatch_stats: DispatchStats,
}

#[derive(Debug, Clone, Default)]
pub struct TranscriptStats {
    pub chunks: u64,
    pub total_bytes: u64,
    pub avg_chunk_bytes: f64,
    pub stale_discarded: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    pub automatic_changes: u64,
    pub manual_changes: u64,
    /// Transitions back to "no category".
    pub cleared: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FieldStats {
    pub extracted: u64,
    pub verified: u64,
    pub reopened: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    pub issued: u64,
    pub rejected: u64,
    pub calls_ended: u64,
    pub total_call_ticks: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::TranscriptAppended { bytes, .. } => {
                snap.transcript_stats.chunks += 1;
                snap.transcript_stats.total_bytes += *bytes as u64;
            }
            TelemetryEvent::StaleAnalysisDiscarded { .. } => {
                snap.transcript_stats.stale_discarded += 1;
            }
            TelemetryEvent::ClassificationChanged { category, source, .. } => {
                if category.is_none() {
                    snap.classification_stats.cleared += 1;
                }
                match source {
                    ClassificationSource::Automatic => snap.classification_stats.automatic_changes += 1,
                    ClassificationSource::Manual => snap.classification_stats.manual_changes += 1,
                }
            }
            TelemetryEvent::FieldLifecycle { event, .. } => match event {
                FieldEventKind::Extracted => snap.field_stats.extracted += 1,
                FieldEventKind::Verified => snap.field_stats.verified += 1,
                FieldEventKind::Reopened => snap.field_stats.reopened += 1,
            },
            TelemetryEvent::Dispatch { event, .. } => match event {
                DispatchEventKind::Issued => snap.dispatch_stats.issued += 1,
                DispatchEventKind::Rejected => snap.dispatch_stats.rejected += 1,
            },
            TelemetryEvent::CallEnded { duration_ticks } => {
                snap.dispatch_stats.calls_ended += 1;
                snap.dispatch_stats.total_call_ticks += duration_ticks;
            }
        }
    }

    if snap.transcript_stats.chunks > 0 {
        snap.transcript_stats.avg_chunk_bytes =
            snap.transcript_stats.total_bytes as f64 / snap.transcript_stats.chunks as f64;
    }

    snap
}
