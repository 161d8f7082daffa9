// src/output/types.rs
//! Delivery plans and their reports.

use std::path::PathBuf;

/// Deliveries to run, in order.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    pub operations: Vec<DeliveryTarget>,
}

impl OutputPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: DeliveryTarget) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// Append to a file, creating it (and its directory) when missing.
    AppendFile { path: PathBuf, content: String },
    /// Replace a file's content.
    WriteFile { path: PathBuf, content: String },
    PrintToStdout { content: String },
}

impl DeliveryTarget {
    pub fn content(&self) -> &str {
        match self {
            Self::AppendFile { content, .. }
            | Self::WriteFile { content, .. }
            | Self::PrintToStdout { content } => content,
        }
    }
}

/// Outcome of a delivered plan.
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    pub completed: Vec<CompletedOperation>,
    pub failed: Vec<FailedOperation>,
    pub bytes_written: usize,
    pub total_duration_ms: u64,
}

impl OutputReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completed(mut self, operation: CompletedOperation) -> Self {
        self.bytes_written += operation.bytes_written;
        self.completed.push(operation);
        self
    }

    pub fn with_failed(mut self, operation: FailedOperation) -> Self {
        self.failed.push(operation);
        self
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Error messages of the failed deliveries.
    pub fn failures(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.error.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct CompletedOperation {
    pub operation: DeliveryTarget,
    pub bytes_written: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct FailedOperation {
    pub operation: DeliveryTarget,
    pub error: String,
}
