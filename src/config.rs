use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// Input requests CSV file
    pub input: PathBuf,

    /// JSON file with the merchants and customers to load before processing
    #[arg(long, env = "PAYPROC_SEED")]
    pub seed: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYPROC_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Upper bound on a single payment authorization, in milliseconds
    #[arg(long, env = "PAYPROC_AUTHORIZATION_TIMEOUT_MS", default_value_t = 30_000)]
    pub authorization_timeout_ms: u64,

    /// Log filter directives, e.g. `info` or `payproc=debug`
    #[arg(long, env = "PAYPROC_LOG", default_value = "warn")]
    pub log_level: String,

    /// Actor recorded in the audit trail of created invoices
    #[arg(long, env = "PAYPROC_CREATED_BY", default_value = "system")]
    pub created_by: String,
}

impl Settings {
    pub fn authorization_timeout(&self) -> Duration {
        Duration::from_millis(self.authorization_timeout_ms)
    }
}
