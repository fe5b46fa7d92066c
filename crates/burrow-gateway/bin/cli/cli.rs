use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "BURROW_REDIS_URL";
pub const MYSQL_DSN_ENV: &str = "BURROW_MYSQL_DSN";
pub const CACHE_CAPACITY_ENV: &str = "BURROW_CACHE_CAPACITY";
pub const CODE_LENGTH_ENV: &str = "BURROW_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "BURROW_MAX_ATTEMPTS";
pub const DEFAULT_TTL_SECS_ENV: &str = "BURROW_DEFAULT_TTL_SECS";
pub const STORE_TIMEOUT_MS_ENV: &str = "BURROW_STORE_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten a URL and print the stored binding.
    Shorten { url: String },
    /// Resolve a short code, counting one click.
    Resolve { code: String },
    /// Print the click statistics for a short code.
    Stats { code: String },
    /// Remove expired records once, or every `--watch` seconds until Ctrl-C.
    Sweep {
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Read newline-delimited JSON requests from stdin and answer each on stdout.
    Batch,
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "Short-link operator CLI")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = burrow_cache::DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = burrow_generator::hash::DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = burrow_generator::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[arg(long, env = DEFAULT_TTL_SECS_ENV)]
    pub default_ttl_secs: Option<u64>,

    #[arg(long, env = STORE_TIMEOUT_MS_ENV, default_value_t = DEFAULT_STORE_TIMEOUT_MS)]
    pub store_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}
