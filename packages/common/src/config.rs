use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Scheduling and scoring configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct JudgeConfig {
    /// Number of long-lived judge workers. Default: 4.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the bounded admission queue. Default: 64.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Score awarded for an accepted submission. Default: 100.
    #[serde(default = "default_max_score")]
    pub max_score: i32,
}

fn default_workers() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    64
}
fn default_max_score() -> i32 {
    100
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_score: default_max_score(),
        }
    }
}

/// Resource limits and runner locations for the executor.
#[derive(Debug, Deserialize, Clone)]
pub struct ExecutorConfig {
    /// Per-test-case wall-clock limit, seconds. Default: 2.
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,
    /// Compile-phase limit, seconds. Default: 10.
    #[serde(default = "default_compile_time_limit_secs")]
    pub compile_time_limit_secs: u64,
    /// Address-space ceiling per run, megabytes. Default: 256.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,
    /// Directory holding the per-language runner scripts. Default: "runners".
    #[serde(default = "default_runners_dir")]
    pub runners_dir: String,
}

fn default_time_limit_secs() -> u64 {
    2
}
fn default_compile_time_limit_secs() -> u64 {
    10
}
fn default_memory_limit_mb() -> u64 {
    256
}
fn default_runners_dir() -> String {
    "runners".into()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: default_time_limit_secs(),
            compile_time_limit_secs: default_compile_time_limit_secs(),
            memory_limit_mb: default_memory_limit_mb(),
            runners_dir: default_runners_dir(),
        }
    }
}

/// Application configuration, layered from defaults, an optional file named
/// by `GAVEL_CONFIG`, and `GAVEL__`-prefixed environment variables
/// (e.g. `GAVEL__JUDGE__WORKERS=8`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix("GAVEL").separator("__"))
    }

    fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("GAVEL_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("judge.workers", 4_i64)?
            .set_default("judge.queue_capacity", 64_i64)?
            .set_default("judge.max_score", 100_i64)?
            .set_default("executor.time_limit_secs", 2_i64)?
            .set_default("executor.compile_time_limit_secs", 10_i64)?
            .set_default("executor.memory_limit_mb", 256_i64)?
            .set_default("executor.runners_dir", "runners")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(env)
            .build()?;

        s.try_deserialize()
    }
}
