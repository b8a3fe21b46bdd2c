use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use schema_installer::cli::commands::install::{
    InstallCommand, InstallCommandHandler, InstallOutcome,
};
use schema_installer::cli::{logging, Cli};
use std::env;
use std::process;
use tracing::error;

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_filename, cli.verbose) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(outcome) => {
            if !outcome.output.is_empty() {
                println!("{}", outcome.output);
            }
            // 取り込みプログラムの終了コードをそのまま引き継ぐ
            if outcome.exit_code != 0 {
                process::exit(outcome.exit_code);
            }
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<InstallOutcome> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    let command = InstallCommand {
        project_path,
        config_path: cli.config,
        clear: !cli.disable_clear,
        tests: !cli.disable_tests,
        predefined_data: !cli.disable_predefined_data,
        log_filename: cli.log_filename,
        use_dev_database: cli.use_dev_database,
        fail_on_test_failure: cli.fail_on_test_failure,
        timeout: cli.timeout,
        dry_run: cli.dry_run,
        format: cli.format,
    };

    InstallCommandHandler::new().execute(&command).await
}
