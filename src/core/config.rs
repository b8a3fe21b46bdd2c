// 設定ファイル管理
//
// インストーラーの設定ファイル（YAML形式）の読み込み、検証、
// 適用するスクリプトの順序、テスト・事前定義データ取り込みの設定、
// 環境別のデータベース接続設定の管理を行います。

use crate::core::naming::MODULE_PLACEHOLDER;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl Dialect {
    /// 方言ごとの既定ポート（SQLiteはポートを使わない）
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::PostgreSQL => Some(5432),
            Dialect::MySQL => Some(3306),
            Dialect::SQLite => None,
        }
    }

    /// 最初のバインドパラメータのマーカー
    pub fn first_bind_marker(&self) -> &'static str {
        match self {
            Dialect::PostgreSQL | Dialect::SQLite => "$1",
            Dialect::MySQL => "?",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

/// インストーラー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// データベース方言
    pub dialect: Dialect,

    /// スクリプトの基準ディレクトリ（設定ファイルからの相対パス）
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// 全スクリプトの前に実行されるクリア用スクリプト
    #[serde(default = "default_clear_script")]
    pub clear_script: String,

    /// 適用するスクリプト（記載順に実行される）
    #[serde(default)]
    pub scripts: Vec<String>,

    /// テストフェーズの設定
    #[serde(default)]
    pub tests: TestsConfig,

    /// 事前定義データ取り込みの設定
    #[serde(default)]
    pub predefined_data: PredefinedDataConfig,

    /// 環境別のデータベース設定
    pub environments: HashMap<String, DatabaseConfig>,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_clear_script() -> String {
    "clear.sql".to_string()
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 指定された環境のデータベース設定を取得
    pub fn get_database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            let mut available: Vec<_> = self.environments.keys().collect();
            available.sort();
            anyhow!(
                "Environment '{}' not found. Available environments: {:?}",
                environment,
                available
            )
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        // バージョンチェック
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        // 環境設定チェック
        if self.environments.is_empty() {
            return Err(anyhow!(
                "At least one environment configuration is required"
            ));
        }

        // 各環境のデータベース設定を検証
        for (env_name, db_config) in &self.environments {
            db_config
                .validate()
                .with_context(|| format!("Invalid config for environment '{}'", env_name))?;
        }

        if self.scripts.is_empty() {
            return Err(anyhow!("At least one script must be listed in 'scripts'"));
        }

        if let Some(position) = self.scripts.iter().position(|s| s.trim().is_empty()) {
            return Err(anyhow!("Script entry #{} is empty", position + 1));
        }

        if self.clear_script.trim().is_empty() {
            return Err(anyhow!("'clear_script' must not be empty"));
        }

        self.tests.validate().context("Invalid 'tests' section")?;
        self.predefined_data
            .validate()
            .context("Invalid 'predefined_data' section")?;

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// 既定のテストエントリポイント呼び出し
///
/// `name` 型や `char(n)` はAnyドライバーで扱えないため text に変換する。
pub const DEFAULT_TEST_QUERY: &str =
    "SELECT name::text AS name, result, errcode::text AS errcode, errmsg::text AS errmsg FROM test.run_module({module})";

/// テストフェーズの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestsConfig {
    /// テスト対象のモジュール（記載順に実行される）
    #[serde(default)]
    pub modules: Vec<String>,

    /// テストエントリポイントを呼び出すクエリ。`{module}` がバインドパラメータになる
    #[serde(default = "default_test_query")]
    pub query: String,

    /// テスト失敗時にインストール全体を失敗させるか
    #[serde(default)]
    pub fail_on_failure: bool,
}

fn default_test_query() -> String {
    DEFAULT_TEST_QUERY.to_string()
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            query: default_test_query(),
            fail_on_failure: false,
        }
    }
}

impl TestsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.query.contains(MODULE_PLACEHOLDER) {
            return Err(anyhow!(
                "Test query must contain the {} placeholder: {}",
                MODULE_PLACEHOLDER,
                self.query
            ));
        }
        if self.query.matches(MODULE_PLACEHOLDER).count() > 1 {
            return Err(anyhow!(
                "Test query must contain the {} placeholder exactly once",
                MODULE_PLACEHOLDER
            ));
        }
        Ok(())
    }
}

/// 事前定義データ取り込みの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredefinedDataConfig {
    /// 取り込みプログラムの作業ディレクトリ（設定ファイルからの相対パス）
    #[serde(default = "default_predefined_data_dir")]
    pub working_dir: PathBuf,

    /// 取り込みプログラムのコマンドライン（先頭がプログラム名）
    #[serde(default = "default_import_command")]
    pub command: Vec<String>,
}

fn default_predefined_data_dir() -> PathBuf {
    PathBuf::from("predefined-data")
}

fn default_import_command() -> Vec<String> {
    vec!["python".to_string(), "import.py".to_string()]
}

impl Default for PredefinedDataConfig {
    fn default() -> Self {
        Self {
            working_dir: default_predefined_data_dir(),
            command: default_import_command(),
        }
    }
}

impl PredefinedDataConfig {
    pub fn validate(&self) -> Result<()> {
        match self.command.first() {
            Some(program) if !program.trim().is_empty() => Ok(()),
            _ => Err(anyhow!("Import command must name a program")),
        }
    }
}

/// データベース接続設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（省略時は方言の既定ポート）
    #[serde(default)]
    pub port: Option<u16>,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    pub user: Option<String>,

    /// パスワード
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl DatabaseConfig {
    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        Ok(())
    }

    /// 方言の既定値で補ったポート番号
    pub fn port_or_default(&self, dialect: Dialect) -> Option<u16> {
        self.port.or_else(|| dialect.default_port())
    }
}
