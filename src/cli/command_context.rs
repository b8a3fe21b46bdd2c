// コマンド共通コンテキスト
//
// 設定ファイル読み込みやパス解決の重複をCLI層で集約する。
// 設定内の相対パスは設定ファイルのあるディレクトリを基準に解決する。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::sqlx_session::SqlxSession;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::services::config_loader::ConfigLoader;
use crate::services::database_config_resolver::DatabaseConfigResolver;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = match custom_config_path {
            Some(path) if path.is_absolute() => path,
            Some(path) => project_path.join(path),
            None => project_path.join(Config::DEFAULT_CONFIG_PATH),
        };

        if !config_path.exists() {
            return Err(anyhow!("Config file not found: {:?}", config_path));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 相対パスの基準ディレクトリ（設定ファイルのあるディレクトリ）
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .parent()
            .unwrap_or(self.project_path.as_path())
    }

    /// スクリプトディレクトリの絶対パス
    pub fn scripts_dir(&self) -> PathBuf {
        self.base_dir().join(&self.config.scripts_dir)
    }

    /// 事前定義データ取り込みの作業ディレクトリ
    pub fn predefined_data_dir(&self) -> PathBuf {
        self.base_dir().join(&self.config.predefined_data.working_dir)
    }

    /// プロジェクトルートを基準にパスを解決
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_path.join(path)
        }
    }

    /// 環境に応じたデータベース設定を取得（環境変数上書き込み）
    pub fn database_config(&self, env: &str) -> Result<DatabaseConfig> {
        let config = self
            .config
            .get_database_config(env)
            .with_context(|| format!("Config for environment '{}' not found", env))?;
        Ok(DatabaseConfigResolver::apply_env_overrides(&config))
    }

    /// データベース方言を取得
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// タイムアウト付きでデータベースセッションを開く
    pub async fn connect_session(&self, env: &str, timeout: Option<u64>) -> Result<SqlxSession> {
        let mut db_config = self.database_config(env)?;
        if let Some(t) = timeout {
            db_config.timeout = Some(t);
        }

        let db_service = DatabaseConnectionService::new();
        let pool = db_service
            .create_pool(self.config.dialect, &db_config)
            .await
            .with_context(|| "Failed to connect to database")?;
        db_service.test_connection(&pool).await?;

        Ok(SqlxSession::new(pool, self.config.dialect).with_test_query(&self.config.tests.query))
    }
}
