// src/output/writer.rs
//! Executes delivery plans. The only place the export touches the
//! filesystem or stdout.

use super::types::*;
use crate::error::AppError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Runs every delivery of the plan, recording failures instead of stopping.
pub fn deliver(plan: OutputPlan) -> OutputReport {
    let mut report = OutputReport::new();
    let start_time = Instant::now();

    log::debug!("Delivering {} outputs", plan.operations.len());

    for operation in plan.operations {
        let op_start = Instant::now();
        match execute_operation(&operation) {
            Ok(bytes_written) => {
                report = report.with_completed(CompletedOperation {
                    operation,
                    bytes_written,
                    duration_ms: op_start.elapsed().as_millis() as u64,
                });
            }
            Err(e) => {
                log::error!("Delivery failed: {}", e);
                report = report.with_failed(FailedOperation {
                    operation,
                    error: e.to_string(),
                });
            }
        }
    }

    report.total_duration_ms = start_time.elapsed().as_millis() as u64;
    log::debug!(
        "Delivered {} outputs ({} bytes), {} failed in {}ms",
        report.completed.len(),
        report.bytes_written,
        report.failed.len(),
        report.total_duration_ms
    );
    report
}

/// As [`deliver`], turning any failed delivery into an error.
pub fn deliver_all(plan: OutputPlan) -> Result<OutputReport, AppError> {
    let report = deliver(plan);
    if report.is_success() {
        Ok(report)
    } else {
        Err(AppError::DeliveryFailed {
            failures: report.failures(),
        })
    }
}

fn execute_operation(operation: &DeliveryTarget) -> Result<usize, AppError> {
    match operation {
        DeliveryTarget::AppendFile { path, content } => append_file(path, content),
        DeliveryTarget::WriteFile { path, content } => write_file(path, content),
        DeliveryTarget::PrintToStdout { content } => {
            print_to_stdout(content)?;
            Ok(content.len())
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn append_file(path: &Path, content: &str) -> Result<usize, AppError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    log::debug!("Appended {} bytes to {}", content.len(), path.display());
    Ok(content.len())
}

fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    ensure_parent(path)?;
    fs::write(path, content)?;
    log::info!("Wrote {}", path.display());
    Ok(content.len())
}

fn print_to_stdout(content: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mfp_diary_writer_{}", std::process::id()));
        dir.join(name)
    }

    #[test]
    fn appends_after_an_initial_write() {
        let path = scratch_file("append.jsonl");
        let plan = OutputPlan::new()
            .with_operation(DeliveryTarget::WriteFile {
                path: path.clone(),
                content: "a\n".into(),
            })
            .with_operation(DeliveryTarget::AppendFile {
                path: path.clone(),
                content: "b\n".into(),
            })
            .with_operation(DeliveryTarget::AppendFile {
                path: path.clone(),
                content: "c\n".into(),
            });

        let report = deliver(plan);
        assert!(report.is_success());
        assert_eq!(report.bytes_written, 6);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let blocker = scratch_file("blocker");
        ensure_parent(&blocker).unwrap();
        fs::write(&blocker, "file, not a directory").unwrap();

        let plan = OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
            path: blocker.join("out.jsonl"),
            content: "x".into(),
        });
        let report = deliver(plan.clone());
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            deliver_all(plan),
            Err(AppError::DeliveryFailed { failures }) if failures.len() == 1
        ));
        let _ = fs::remove_file(&blocker);
    }
}
