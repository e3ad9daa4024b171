//! Target execution reporting

use std::path::PathBuf;
use std::time::Duration;

/// Events emitted during target execution
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A target run is starting
    Started { name: String },
    /// The target's sources match its cache record; commands are skipped
    CacheHit { name: String },
    /// A command is about to run
    CommandStarted { name: String, command: String },
    /// A cache record was written
    CacheSaved { name: String, path: PathBuf },
    /// A target finished
    Completed {
        name: String,
        duration: Duration,
        cached: bool,
    },
    /// A target failed
    Failed {
        name: String,
        duration: Duration,
        error: String,
    },
}

/// Trait for reporting execution progress
pub trait TaskReporter: Send + Sync {
    /// Handle an event
    fn report(&self, event: &TaskEvent);
}

/// Simple reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { name } => {
                tracing::info!("Starting {}", name);
            }
            TaskEvent::CacheHit { name } => {
                tracing::info!("{} is cached", name);
            }
            TaskEvent::CommandStarted { name, command } => {
                tracing::debug!("[{}] {}", name, command);
            }
            TaskEvent::CacheSaved { name, path } => {
                tracing::debug!("{} cached at {}", name, path.display());
            }
            TaskEvent::Completed {
                name,
                duration,
                cached,
            } => {
                if *cached {
                    tracing::info!("{} completed (cached) in {:.1}s", name, duration.as_secs_f64());
                } else {
                    tracing::info!("{} completed in {:.1}s", name, duration.as_secs_f64());
                }
            }
            TaskEvent::Failed {
                name,
                duration,
                error,
            } => {
                tracing::error!("{} failed after {:.1}s: {}", name, duration.as_secs_f64(), error);
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: std::sync::Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
