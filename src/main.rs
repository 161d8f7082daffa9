// src/main.rs
use clap::Parser;
use futures::StreamExt;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use mfp_diary::output::deliver_all;
use mfp_diary::{
    check_range, render_day_json_lines, render_json_lines, render_summary, AppError,
    CombinedDiaryTable, CommandLineInput, ConcurrentCollector, DayResult, DeliveryTarget,
    OutputPlan, ProgressEvent, RunConfig, SerialCollector,
};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("mfp_diary.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {M} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn show_progress(event: ProgressEvent) {
    eprintln!("{}", event);
}

/// Serial run: days arrive one by one and are appended to the export as
/// they do.
async fn run_serial(config: &RunConfig) -> Result<CombinedDiaryTable, AppError> {
    let collector = SerialCollector::authenticated(
        &config.collector,
        config.credentials.as_ref(),
        config.target.clone(),
    )
    .await?
    .with_progress(show_progress);

    if let Some(path) = &config.output_file {
        deliver_all(OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
            path: path.clone(),
            content: String::new(),
        }))?;
    }

    let mut combined = CombinedDiaryTable::new();
    let mut days = Box::pin(collector.collect(config.range));
    while let Some(outcome) = days.next().await {
        if let (Some(path), DayResult::Entries(table)) = (&config.output_file, &outcome.result) {
            let content = render_day_json_lines(outcome.date, table)?;
            deliver_all(OutputPlan::new().with_operation(DeliveryTarget::AppendFile {
                path: path.clone(),
                content,
            }))?;
        }
        combined.record(outcome.date, outcome.result);
    }
    log::info!("{}", combined.summary());
    Ok(combined)
}

/// Concurrent run: the export is written once every day is in.
async fn run_concurrent(config: &RunConfig) -> Result<CombinedDiaryTable, AppError> {
    check_range(&config.range, config.collector.max_range_days)?;

    let collector = ConcurrentCollector::authenticated(
        &config.collector,
        config.credentials.as_ref(),
        config.target.clone(),
    )
    .await?
    .with_progress(show_progress);
    let combined = collector.collect_concurrent(config.range).await?;

    if let Some(path) = &config.output_file {
        deliver_all(OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
            path: path.clone(),
            content: render_json_lines(&combined)?,
        }))?;
    }
    Ok(combined)
}

/// Collects the configured range, exports it and reports on it.
async fn execute_run(config: &RunConfig) -> Result<(), AppError> {
    let combined = if config.serial {
        run_serial(config).await?
    } else {
        run_concurrent(config).await?
    };

    let mut plan = OutputPlan::new();
    if config.summary {
        plan = plan.with_operation(DeliveryTarget::PrintToStdout {
            content: render_summary(&combined, config.top_foods),
        });
    } else {
        eprintln!("{}", combined.summary());
    }
    if let Some(path) = &config.output_file {
        eprintln!("Entries saved to {}", path.display());
    }
    if !plan.is_empty() {
        deliver_all(plan)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = RunConfig::resolve(cli)?;

    if let Err(e) = execute_run(&config).await {
        if e.should_narrow_range() {
            eprintln!("Try a shorter --start/--end range or a lower --concurrency.");
        }
        return Err(e.into());
    }

    Ok(())
}
