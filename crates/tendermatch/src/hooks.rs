//! Post-commit hook list.
//!
//! The pipeline persists its result first; hooks run unconditionally
//! afterward as a separate step. A hook can observe the outcome but can
//! never change it or fail the pipeline.

use std::sync::Arc;

use crate::services::{NotificationSink, PipelineEvent};

#[derive(Clone, Default)]
pub struct PostCommitHooks {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl PostCommitHooks {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Runs every hook in registration order.
    pub async fn run(&self, owner_id: &str, event: &PipelineEvent) {
        for sink in &self.sinks {
            sink.notify(owner_id, event).await;
        }
    }
}
