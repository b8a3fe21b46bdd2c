// 統合テスト共通ヘルパー
//
// 呼び出し順を記録するセッションと取り込みポート、ログの取得、
// 一時プロジェクトの作成を提供する。

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use schema_installer::core::error::{DatabaseError, ImportError};
use schema_installer::core::import::{ImportOutcome, ImportRequest};
use schema_installer::core::test_result::TestResult;
use schema_installer::services::traits::{ImportDataPort, SchemaSession};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;

/// セッションに対する呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Begin,
    Execute(String),
    Commit,
    Rollback,
    TestModule(String),
    Close,
}

/// 呼び出しを記録するスキーマセッション
///
/// `fail_marker` を含むSQLの実行は失敗する。
#[derive(Debug, Default)]
pub struct RecordingSession {
    pub events: Vec<SessionEvent>,
    pub fail_marker: Option<String>,
    pub test_rows: HashMap<String, Vec<TestResult>>,
    pub fail_test_module: Option<String>,
    pub name_width: usize,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            name_width: 16,
            ..Default::default()
        }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::new()
        }
    }

    pub fn with_test_rows(mut self, module: &str, rows: Vec<TestResult>) -> Self {
        self.test_rows.insert(module.to_string(), rows);
        self
    }

    /// 実行されたSQL（前後の空白を除去）
    pub fn executed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Execute(sql) => Some(sql.trim().to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &SessionEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &SessionEvent) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }
}

#[async_trait]
impl SchemaSession for RecordingSession {
    async fn begin(&mut self) -> Result<(), DatabaseError> {
        self.events.push(SessionEvent::Begin);
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.events.push(SessionEvent::Execute(sql.to_string()));
        match &self.fail_marker {
            Some(marker) if sql.contains(marker.as_str()) => Err(DatabaseError::Query {
                message: format!("simulated failure at {}", marker),
                sql: None,
            }),
            _ => Ok(()),
        }
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.events.push(SessionEvent::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.events.push(SessionEvent::Rollback);
        Ok(())
    }

    async fn name_column_width(&mut self) -> Result<usize, DatabaseError> {
        Ok(self.name_width)
    }

    async fn run_test_module(&mut self, module: &str) -> Result<Vec<TestResult>, DatabaseError> {
        self.events.push(SessionEvent::TestModule(module.to_string()));
        if self.fail_test_module.as_deref() == Some(module) {
            return Err(DatabaseError::Query {
                message: "function test.run_module(unknown) does not exist".to_string(),
                sql: None,
            });
        }
        Ok(self.test_rows.get(module).cloned().unwrap_or_default())
    }

    async fn close(&mut self) {
        self.events.push(SessionEvent::Close);
    }
}

/// 呼び出し内容を記録し、固定の終了コードを返す取り込みポート
#[derive(Debug, Default)]
pub struct RecordingImporter {
    pub exit_code: i32,
    pub requests: Mutex<Vec<ImportRequest>>,
}

impl RecordingImporter {
    pub fn with_exit_code(exit_code: i32) -> Arc<Self> {
        Arc::new(Self {
            exit_code,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<ImportRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImportDataPort for RecordingImporter {
    async fn import(&self, request: &ImportRequest) -> Result<ImportOutcome, ImportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(ImportOutcome {
            exit_code: self.exit_code,
        })
    }
}

/// メモリに書き込まれたログ
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if let Ok(mut buf) = self.0.lock() {
            buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 現在のスレッドのログをメモリに取得する（ガードが生きている間のみ）
pub fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// スクリプトファイルを書き出す
pub fn write_script(dir: &Path, name: &str, sql: &str) -> Result<()> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, sql)?;
    Ok(())
}

/// SQLiteを使う一時プロジェクトを作成
///
/// スクリプトは `sql/` に、取り込みディレクトリは `predefined-data/` に作られる。
pub fn setup_sqlite_project(
    scripts: &[(&str, &str)],
    test_query: Option<&str>,
    modules: &[&str],
    import_command: &[&str],
) -> Result<(TempDir, PathBuf)> {
    sqlx::any::install_default_drivers();
    let temp_dir = TempDir::new()?;
    let project_path = temp_dir.path().to_path_buf();
    let sql_dir = project_path.join("sql");
    fs::create_dir_all(&sql_dir)?;
    fs::create_dir_all(project_path.join("predefined-data"))?;

    for (name, sql) in scripts {
        write_script(&sql_dir, name, sql)?;
    }

    let listed: Vec<&str> = scripts
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| *name != "clear.sql")
        .collect();

    let mut yaml = String::from("version: \"1.0\"\ndialect: sqlite\nscripts_dir: sql\nclear_script: clear.sql\nscripts:\n");
    for name in listed {
        yaml.push_str(&format!("  - {}\n", name));
    }
    if modules.is_empty() {
        yaml.push_str("tests:\n  modules: []\n");
    } else {
        yaml.push_str("tests:\n  modules:\n");
        for module in modules {
            yaml.push_str(&format!("    - {}\n", module));
        }
    }
    if let Some(query) = test_query {
        yaml.push_str(&format!("  query: \"{}\"\n", query));
    }
    yaml.push_str("predefined_data:\n  working_dir: predefined-data\n  command:\n");
    for part in import_command {
        yaml.push_str(&format!("    - \"{}\"\n", part));
    }
    yaml.push_str(&format!(
        "environments:\n  production:\n    database: \"{}\"\n  development:\n    database: \"{}\"\n",
        project_path.join("prod.db").display(),
        project_path.join("dev.db").display()
    ));

    fs::write(project_path.join(".installer.yaml"), yaml)?;
    Ok((temp_dir, project_path))
}

/// SQLiteファイルへの単一接続プールを開く
pub async fn open_sqlite(path: &Path) -> sqlx::AnyPool {
    sqlx::any::install_default_drivers();
    sqlx::any::AnyPoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite://{}?mode=rwc", path.display()))
        .await
        .unwrap()
}

/// SQLiteに指定テーブルが存在するか
pub async fn sqlite_table_exists(pool: &sqlx::AnyPool, table: &str) -> bool {
    sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = $1")
        .bind(table.to_string())
        .fetch_optional(pool)
        .await
        .unwrap()
        .is_some()
}
