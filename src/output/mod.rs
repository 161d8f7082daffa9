// src/output/mod.rs
//! Export of collected diaries, with planning kept apart from execution.
//!
//! Rendering turns a table into text without touching the filesystem;
//! [`deliver`] carries out a plan of delivery targets and reports on each.

mod render;
mod types;
mod writer;

pub use render::{render_day_json_lines, render_json_lines, render_summary};
pub use types::{DeliveryTarget, OutputPlan, OutputReport};
pub use writer::{deliver, deliver_all};
