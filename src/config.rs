// src/config.rs
use crate::api::DiaryTarget;
use crate::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONCURRENCY, DEFAULT_RANGE_DAYS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_TOP_FOODS, ENV_PASSWORD, ENV_USERNAME, MAX_CONCURRENCY, MAX_RANGE_DAYS, MFP_BASE_URL,
    REQUEST_TIMEOUT_SECS, RETRY_INITIAL_DELAY_MS, RETRY_MAX_DELAY_MS, USER_AGENT,
};
use crate::error::AppError;
use crate::types::{parse_iso_date, Credentials, DateRange, Password, Username, ValidationError};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// First day to collect (YYYY-MM-DD). Defaults to a week before --end
    #[arg(short, long)]
    pub start: Option<String>,

    /// Last day to collect (YYYY-MM-DD). Defaults to today
    #[arg(short, long)]
    pub end: Option<String>,

    /// Whose diary to read. Required for public diaries
    #[arg(short, long)]
    pub user: Option<String>,

    /// Log in with MFP_USER / MFP_PASS before fetching (private diaries)
    #[arg(long, default_value_t = false)]
    pub private: bool,

    /// Fetch one day at a time, appending each day to --output as it arrives
    #[arg(long, default_value_t = false)]
    pub serial: bool,

    /// Number of diary pages fetched at once (default: 16, max 32)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Longest range accepted for one run (at most 365 days)
    #[arg(long, default_value_t = MAX_RANGE_DAYS)]
    pub max_days: usize,

    /// JSON-lines file the entries are written to
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print nutrition totals and most common foods after the run
    #[arg(long, default_value_t = false)]
    pub summary: bool,

    /// Number of foods listed by --summary
    #[arg(long, default_value_t = DEFAULT_TOP_FOODS)]
    pub top: usize,

    /// Service root, for mirrors and local testing
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Settings shared by the session, the fetcher and both collectors.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Always ends with `/` so endpoint paths join below it.
    pub base_url: Url,
    pub user_agent: String,
    pub concurrency: usize,
    pub max_range_days: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: normalise_base_url(MFP_BASE_URL)
                .expect("Default base URL should be valid"),
            user_agent: USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            max_range_days: MAX_RANGE_DAYS,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_initial_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            retry_max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
        }
    }
}

impl CollectorConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ValidationError> {
        self.base_url = normalise_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Lowers the range cap; it never rises above [`MAX_RANGE_DAYS`].
    pub fn with_max_range_days(mut self, days: usize) -> Self {
        self.max_range_days = days.clamp(1, MAX_RANGE_DAYS);
        self
    }

    pub fn with_retries(mut self, attempts: u32, initial_delay: Duration) -> Self {
        self.retry_attempts = attempts.max(1);
        self.retry_initial_delay = initial_delay;
        self.retry_max_delay = self.retry_max_delay.max(initial_delay);
        self
    }

    /// In-flight window actually used, whatever was configured.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

/// Parses an `http(s)` service root and makes sure it ends with a slash.
pub fn normalise_base_url(input: &str) -> Result<Url, ValidationError> {
    let mut url = Url::parse(input.trim()).map_err(|e| ValidationError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Resolved run configuration, validated and ready to drive a collection.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub range: DateRange,
    pub target: DiaryTarget,
    pub credentials: Option<Credentials>,
    pub serial: bool,
    pub collector: CollectorConfig,
    pub output_file: Option<PathBuf>,
    pub summary: bool,
    pub top_foods: usize,
    pub verbose: bool,
}

impl RunConfig {
    /// Resolves a complete run configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, Local::now().date_naive(), |name| std::env::var(name).ok())
    }

    /// As [`resolve`](Self::resolve), with today's date and the environment
    /// supplied by the caller.
    pub fn resolve_with(
        cli: CommandLineInput,
        today: NaiveDate,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let end = match cli.end.as_deref() {
            Some(end) => parse_iso_date(end)?,
            None => today,
        };
        let range = match cli.start.as_deref() {
            Some(start) => DateRange::new(parse_iso_date(start)?, end)?,
            None => DateRange::ending_on(end, DEFAULT_RANGE_DAYS)?,
        };

        let credentials = if cli.private {
            Some(credentials_from_env(&env)?)
        } else {
            None
        };

        let target = match (&cli.user, &credentials) {
            (Some(user), _) => DiaryTarget::User(Username::new(user.as_str())?),
            (None, Some(_)) => DiaryTarget::Own,
            (None, None) => {
                return Err(AppError::MissingConfiguration(
                    "--user is required unless --private is set".to_string(),
                ))
            }
        };

        if cli.max_days == 0 || cli.max_days > MAX_RANGE_DAYS {
            return Err(ValidationError::OutOfBounds {
                value: cli.max_days,
                min: 1,
                max: MAX_RANGE_DAYS,
            }
            .into());
        }
        let mut collector = CollectorConfig::default().with_max_range_days(cli.max_days);
        if let Some(concurrency) = cli.concurrency {
            if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                return Err(ValidationError::OutOfBounds {
                    value: concurrency,
                    min: 1,
                    max: MAX_CONCURRENCY,
                }
                .into());
            }
            collector = collector.with_concurrency(concurrency);
        }
        if let Some(base_url) = cli.base_url.as_deref() {
            collector = collector.with_base_url(base_url)?;
        }

        Ok(RunConfig {
            range,
            target,
            credentials,
            serial: cli.serial,
            collector,
            output_file: cli.output.map(PathBuf::from),
            summary: cli.summary,
            top_foods: cli.top,
            verbose: cli.verbose,
        })
    }
}

fn credentials_from_env(env: &impl Fn(&str) -> Option<String>) -> Result<Credentials, AppError> {
    let read = |name: &str| {
        env(name).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
            AppError::MissingConfiguration(format!(
                "{} environment variable not set (needed for --private)",
                name
            ))
        })
    };
    let username = Username::new(read(ENV_USERNAME)?)?;
    let password = Password::new(read(ENV_PASSWORD)?)?;
    Ok(Credentials::new(username, password))
}
