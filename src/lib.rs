// src/lib.rs
//! mfp-diary library: collects MyFitnessPal food diaries over a date range
//! and normalises them into typed, date-ordered entries.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `FetchError`, `ValidationError`
//! - **Configuration**: `CollectorConfig`, `RunConfig`
//! - **Domain model**: `DiaryEntry`, `DiaryTable`, `CombinedDiaryTable`
//! - **Sessions and pages**: `SessionAuthenticator`, `DiaryPageFetcher`,
//!   the `DiaryPageSource` trait
//! - **Diary cleaning**: `parse_diary_table`, `clean_diary_table`
//! - **Collectors**: `SerialCollector`, `ConcurrentCollector`
//! - **Analytics and export**: `total_macros`, `daily_intake`,
//!   `render_json_lines`, `deliver`

pub mod analytics;
pub mod api;
pub mod collector;
pub mod config;
pub mod constants;
pub mod diary;
pub mod error;
mod error_recovery;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, FetchError, NoDiaryFound, NoDiaryReason, RangeRejection};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CollectorConfig, CommandLineInput, RunConfig};

// --- Domain Types ---
pub use crate::types::{Credentials, DateRange, Password, Username};

// --- Domain Model ---
pub use crate::model::{CombinedDiaryTable, DayResult, DayStatus, DiaryEntry, DiaryTable};

// --- Sessions and Pages ---
pub use crate::api::{
    DiaryPageFetcher, DiaryPageSource, DiaryTarget, RawPage, Session, SessionAuthenticator,
    SessionIdentity,
};

// --- Diary Cleaning ---
pub use crate::diary::{
    clean_diary_table, parse_diary_table, split_food_cell, Cell, RawTableGrid,
};

// --- Collectors ---
pub use crate::collector::{check_range, ConcurrentCollector, SerialCollector};
pub use crate::pipeline::{
    process_page, DayOutcome, NoProgress, ProgressEvent, ProgressReporter,
};

// --- Analytics and Export ---
pub use crate::analytics::{
    daily_intake, logged_days, macro_breakdown, most_common_foods, total_macros, DailyIntake,
    Macro, MacroKcal, MacroTotals,
};
pub use crate::output::{
    deliver, render_day_json_lines, render_json_lines, render_summary, DeliveryTarget,
    OutputPlan, OutputReport,
};
