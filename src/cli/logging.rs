// ロギング初期化
//
// 標準エラー出力とログファイルの両方へ tracing のイベントを書き出す。
// RUST_LOG が設定されていればそちらを優先する。

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// 既定のフィルタ指定を作成
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("schema_installer={},sqlx=warn", level)
}

/// グローバルなサブスクライバーを設定
///
/// # Arguments
///
/// * `log_filename` - 追記するログファイル
/// * `verbose` - デバッグレベルのログを出力するか
pub fn init(log_filename: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_filename)
        .with_context(|| format!("Failed to open log file: {:?}", log_filename))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr.and(Mutex::new(file)))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "schema_installer=info,sqlx=warn");
        assert_eq!(default_filter(true), "schema_installer=debug,sqlx=warn");
    }

    #[test]
    fn test_init_fails_for_unwritable_log_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing-dir").join("install.log");
        let err = init(&path, false).unwrap_err();
        assert!(err.to_string().contains("Failed to open log file"));
    }
}
