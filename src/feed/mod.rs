//! Transcript sources. Anything that yields text chunks in order can feed a
//! session; the reactor does not care where the words come from.

pub mod console;

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{TriageError, TriageResult};
use crate::kernel::event::{Event, InputEvent};

pub trait TranscriptFeed {
    /// Next chunk of transcribed speech, `None` once the feed is exhausted.
    fn next_chunk(&mut self) -> Option<String>;
}

impl<I> TranscriptFeed for I
where
    I: Iterator<Item = String>,
{
    fn next_chunk(&mut self) -> Option<String> {
        self.next()
    }
}

/// A fixed call script replayed chunk by chunk.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFeed {
    lines: VecDeque<String>,
}

impl ScriptedFeed {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Cardiac call used by the demo binary.
    pub fn demo_call() -> Self {
        Self::new([
            "Hello, 911, what's your emergency?",
            "My husband is having chest pain and he can't breathe properly.",
            "Okay, I understand. Is he conscious right now?",
            "Yes, but he looks very pale and he's sweating a lot.",
            "Can you tell me your exact location?",
            "We're at 1234 Main Street, apartment 5B in downtown.",
            "I'm dispatching an ambulance to your location right now.",
            "Please stay on the line with me. Is he still conscious?",
            "Yes, he's sitting on the couch but he says the pain is getting worse.",
            "I need you to help him take slow, deep breaths...",
        ])
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl Iterator for ScriptedFeed {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// Push every chunk of `feed` into the reactor channel, pausing between
/// chunks. Returns how many chunks were sent.
pub async fn pump<F>(
    mut feed: F,
    source: &str,
    tx: &mpsc::Sender<Event>,
    pause: Duration,
) -> TriageResult<usize>
where
    F: TranscriptFeed,
{
    let mut sent = 0;
    while let Some(chunk) = feed.next_chunk() {
        if sent > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        tx.send(Event::Input(InputEvent::transcript(source, &chunk)))
            .await
            .map_err(|_| TriageError::FeedClosed)?;
        sent += 1;
        debug!("Fed chunk {} from '{}'", sent, source);
    }
    Ok(sent)
}
