// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;
pub mod logging;

use crate::core::naming::DEFAULT_LOG_FILE;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Schema Installer - installer of database structure
///
/// Applies the configured SQL scripts in order inside one transaction,
/// runs the tests exposed by the installed schema and imports predefined data.
#[derive(Parser, Debug)]
#[command(name = "schema-installer")]
#[command(author = "Schema Installer Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Installer of database structure")]
#[command(long_about = "Schema Installer - installer of database structure

Runs three phases in order:
  1. Apply    - execute the configured SQL scripts in order, commit once
  2. Test     - call the schema's test entry point for each configured module
  3. Import   - run the predefined-data importer and propagate its exit code

Supported databases: PostgreSQL, MySQL, SQLite")]
#[command(after_help = "EXAMPLES:
  # Full installation into the production database
  schema-installer

  # Reinstall into the development database without importing data
  schema-installer --use-dev-database --disable-predefined-data

  # Show what would be executed
  schema-installer --dry-run")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Don't clear database structure (only for clean end-user installation, saves some time)
    #[arg(long)]
    pub disable_clear: bool,

    /// Don't run tests
    #[arg(long)]
    pub disable_tests: bool,

    /// Don't import predefined data
    #[arg(long)]
    pub disable_predefined_data: bool,

    /// Log file (also forwarded to the predefined data importer)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_filename: PathBuf,

    /// Use the development database instead of the production one
    #[arg(long)]
    pub use_dev_database: bool,

    /// Exit with an error when any test fails
    #[arg(long)]
    pub fail_on_test_failure: bool,

    /// Timeout for acquiring the database connection (in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Dry run - show the scripts that would be applied without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}
