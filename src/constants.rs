// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. Reading them
//! top to bottom tells how a collection run talks to MyFitnessPal, how much
//! it is allowed to ask for, and how a diary page is recognised.

// ---------------------------------------------------------------------------
// MyFitnessPal endpoints
// ---------------------------------------------------------------------------

/// Host every request goes to unless a run overrides the base URL.
pub const MFP_BASE_URL: &str = "https://www.myfitnesspal.com";

/// Session-initiation endpoint that hands out the CSRF token.
pub const CSRF_PATH: &str = "api/auth/csrf";

/// Credential submission endpoint (form encoded).
pub const LOGIN_PATH: &str = "api/auth/callback/credentials";

/// Session resource fetched after login so the cookies settle.
pub const SESSION_PATH: &str = "api/auth/session";

/// Page the login callback points back at.
pub const LOGIN_CALLBACK_PATH: &str = "account/login";

/// Diary page; a username path segment selects someone else's diary.
pub const DIARY_PATH: &str = "food/diary";

/// Present on every page rendered for a signed-in user.
pub const LOGGED_IN_MARKER: &str = "/account/logout";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("mfp-diary/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Run boundaries
// ---------------------------------------------------------------------------

/// Hard cap on the number of days one run may request.
///
/// A year of diaries is 365 page loads; anything longer is almost always a
/// mistyped date and would hammer the service.
pub const MAX_RANGE_DAYS: usize = 365;

/// Default number of diary pages in flight at once for concurrent runs.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Upper bound accepted for the concurrency setting.
pub const MAX_CONCURRENCY: usize = 32;

/// Attempts per day in the serial collector before the day is marked failed.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

pub const CONNECT_TIMEOUT_SECS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backoff before the first retry of a day; doubled per attempt.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Days collected when no start date is given.
pub const DEFAULT_RANGE_DAYS: u64 = 7;

/// Foods listed by the run summary.
pub const DEFAULT_TOP_FOODS: usize = 10;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

pub const ENV_USERNAME: &str = "MFP_USER";
pub const ENV_PASSWORD: &str = "MFP_PASS";

// ---------------------------------------------------------------------------
// Diary table layout
// ---------------------------------------------------------------------------

/// Label forced onto the first column of every diary table.
pub const FOOD_COLUMN: &str = "food";

/// Column produced by splitting the quantity off the food cell.
pub const QTY_COLUMN: &str = "qty";

/// Column injected by the collectors.
pub const DATE_COLUMN: &str = "date";

/// Prefix carried by every column derived from the daily-goal row.
pub const GOAL_PREFIX: &str = "goal_";

/// Marks the per-meal "Add Food / Quick Tools" row.
pub const QUICK_TOOLS_MARKER: &str = "quick tools";

/// Marks the row holding the user's nutrition targets.
pub const DAILY_GOAL_MARKER: &str = "daily goal";

/// Food cells (lower-cased) of the summary rows closing the table.
pub const FOOTER_LABELS: &[&str] = &["totals", "remaining"];

/// Size of the footer block: totals, goal, remaining, the label echo row and
/// the goal record merged back into the table.
pub const FOOTER_ROWS: usize = 5;

/// Separator between a value and its unit label inside one cell.
pub const CELL_LABEL_SEPARATOR: &str = "  ";

/// Column-name suffixes that mark a nutrient column besides `_g` and
/// `calories`.
pub const NUTRIENT_UNIT_SUFFIXES: &[&str] = &["_mg", "_mcg", "_iu", "_kcal", "_%"];

/// Columns that must hold a value in every emitted entry when present.
pub const CORE_NUTRIENT_COLUMNS: &[&str] = &["calories_kcal", "carbs_g", "fat_g", "protein_g"];

/// Columns every combined table exposes, in this order.
pub const GUARANTEED_COLUMNS: &[&str] = &[
    FOOD_COLUMN,
    QTY_COLUMN,
    DATE_COLUMN,
    "calories_kcal",
    "carbs_g",
    "fat_g",
    "protein_g",
    "goal_calories_kcal",
    "goal_carbs_g",
    "goal_fat_g",
    "goal_protein_g",
];

/// Page text shown instead of a diary when the owner restricted access.
pub const PRIVATE_DIARY_MARKERS: &[&str] = &[
    "this diary is private",
    "diary is locked",
    "password protected",
    "password-protected",
];

// ---------------------------------------------------------------------------
// Energy content of macros
// ---------------------------------------------------------------------------

pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing response bodies in errors.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
