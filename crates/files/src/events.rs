//! Event Bus - conversion progress notifications
//!
//! Design: enums over a tokio broadcast channel, not trait objects.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::converter::Direction;

/// Conversion events that can be dispatched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConversionEvent {
    Started {
        job: usize,
        direction: Direction,
        input: PathBuf,
    },
    Completed {
        job: usize,
        output: PathBuf,
        ignored_tokens: usize,
    },
    Failed {
        job: usize,
        input: PathBuf,
        error: String,
    },
}

impl ConversionEvent {
    pub fn job(&self) -> usize {
        match self {
            ConversionEvent::Started { job, .. }
            | ConversionEvent::Completed { job, .. }
            | ConversionEvent::Failed { job, .. } => *job,
        }
    }
}

/// Simple event bus using tokio broadcast channel
pub struct EventBus {
    tx: broadcast::Sender<ConversionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: ConversionEvent) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ConversionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
