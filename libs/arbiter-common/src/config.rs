// Harness configuration, read from the process environment
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://judge0-ce.p.rapidapi.com";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

/// Ceilings applied identically to every submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimits {
    /// Seconds of CPU time
    pub cpu_time_limit: f64,
    /// Seconds of wall clock time
    pub wall_time_limit: f64,
    /// Kilobytes
    pub memory_limit_kb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_time_limit: 5.0,
            wall_time_limit: 10.0,
            memory_limit_kb: 256_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Longest a single test case may wait on the backend
    pub fn ceiling(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub request_timeout: Duration,
    pub poll: PollPolicy,
    pub limits: ResourceLimits,
    /// Total time budget for one submission across all test cases; unbounded when `None`
    pub batch_deadline: Option<Duration>,
    pub languages_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_host: None,
            request_timeout: Duration::from_secs(15),
            poll: PollPolicy::default(),
            limits: ResourceLimits::default(),
            batch_deadline: None,
            languages_file: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_url = get("JUDGE0_API_URL")
            .unwrap_or(defaults.api_url)
            .trim_end_matches('/')
            .to_string();
        let api_key = get("JUDGE0_API_KEY").or_else(|| get("RAPIDAPI_KEY"));
        let api_host = get("JUDGE0_API_HOST").or_else(|| rapidapi_host(&api_url));

        let poll = PollPolicy {
            interval: match get("JUDGE0_POLL_INTERVAL_MS") {
                Some(v) => Duration::from_millis(
                    v.parse().context("JUDGE0_POLL_INTERVAL_MS must be an integer")?,
                ),
                None => defaults.poll.interval,
            },
            max_attempts: match get("JUDGE0_MAX_POLL_ATTEMPTS") {
                Some(v) => v.parse().context("JUDGE0_MAX_POLL_ATTEMPTS must be an integer")?,
                None => defaults.poll.max_attempts,
            },
        };

        if poll.max_attempts == 0 {
            bail!("JUDGE0_MAX_POLL_ATTEMPTS must be at least 1");
        }

        let mut limits = defaults.limits;
        if let Some(v) = get("JUDGE0_CPU_TIME_LIMIT") {
            limits.cpu_time_limit = v.parse().context("JUDGE0_CPU_TIME_LIMIT must be a number")?;
        }
        if let Some(v) = get("JUDGE0_WALL_TIME_LIMIT") {
            limits.wall_time_limit = v.parse().context("JUDGE0_WALL_TIME_LIMIT must be a number")?;
        }
        if let Some(v) = get("JUDGE0_MEMORY_LIMIT_KB") {
            limits.memory_limit_kb = v.parse().context("JUDGE0_MEMORY_LIMIT_KB must be an integer")?;
        }

        let batch_deadline = match get("ARBITER_BATCH_DEADLINE_SECS") {
            Some(v) => Some(Duration::from_secs(
                v.parse().context("ARBITER_BATCH_DEADLINE_SECS must be an integer")?,
            )),
            None => None,
        };

        Ok(Self {
            api_url,
            api_key,
            api_host,
            request_timeout: defaults.request_timeout,
            poll,
            limits,
            batch_deadline,
            languages_file: get("ARBITER_LANGUAGES_FILE").map(PathBuf::from),
        })
    }
}

/// RapidAPI proxies expect the upstream host echoed in a header
fn rapidapi_host(api_url: &str) -> Option<String> {
    let host = api_url
        .split("://")
        .nth(1)
        .unwrap_or(api_url)
        .split('/')
        .next()?;
    host.ends_with("rapidapi.com").then(|| host.to_string())
}
