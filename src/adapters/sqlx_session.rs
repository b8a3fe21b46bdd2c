// SQLxによるスキーマセッション
//
// 1本の接続上でトランザクションを明示的に開始・コミット・ロールバックし、
// スクリプトをバッチ実行する。テストエントリポイントの呼び出しも担う。

use crate::core::config::{Dialect, DEFAULT_TEST_QUERY};
use crate::core::error::DatabaseError;
use crate::core::naming::MODULE_PLACEHOLDER;
use crate::core::test_result::TestResult;
use crate::services::traits::SchemaSession;
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{Any, AnyConnection, AnyPool, Executor, Row, Transaction};
use tracing::debug;

/// テスト名の列幅の既定値（PostgreSQLの name 型と同じ長さ）
pub const DEFAULT_NAME_WIDTH: usize = 64;

/// PostgreSQLの name 型の長さを取得するSQL
const NAME_TYPE_LENGTH_SQL: &str = "SELECT typlen FROM pg_type WHERE oid = 'name'::regtype";

/// SQLxによるスキーマセッション
pub struct SqlxSession {
    pool: AnyPool,
    dialect: Dialect,
    test_query: String,
    tx: Option<Transaction<'static, Any>>,
}

impl std::fmt::Debug for SqlxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxSession")
            .field("dialect", &self.dialect)
            .field("test_query", &self.test_query)
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}

impl SqlxSession {
    /// 接続プールからセッションを作成
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self {
            pool,
            dialect,
            test_query: DEFAULT_TEST_QUERY.to_string(),
            tx: None,
        }
    }

    /// テストエントリポイントの呼び出しクエリを指定
    pub fn with_test_query(mut self, query: impl Into<String>) -> Self {
        self.test_query = query.into();
        self
    }

    /// トランザクションが開いているか
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// プレースホルダーを方言のバインドマーカーに置き換えたテストクエリ
    pub fn rendered_test_query(&self) -> String {
        render_test_query(&self.test_query, self.dialect)
    }

    fn transaction(&mut self) -> Result<&mut Transaction<'static, Any>, DatabaseError> {
        self.tx.as_mut().ok_or_else(|| DatabaseError::Transaction {
            message: "No transaction is open".to_string(),
        })
    }
}

/// テストクエリのプレースホルダーを方言のバインドマーカーに置き換える
pub fn render_test_query(template: &str, dialect: Dialect) -> String {
    template.replacen(MODULE_PLACEHOLDER, dialect.first_bind_marker(), 1)
}

#[async_trait]
impl SchemaSession for SqlxSession {
    async fn begin(&mut self) -> Result<(), DatabaseError> {
        if self.tx.is_some() {
            return Err(DatabaseError::Transaction {
                message: "A transaction is already open".to_string(),
            });
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction {
                message: format!("Failed to start transaction: {}", e),
            })?;
        self.tx = Some(tx);
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let tx = self.transaction()?;

        let conn: &mut AnyConnection = &mut **tx;
        conn.execute(sqlx::raw_sql(sql))
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: None,
            })
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        let tx = self.tx.take().ok_or_else(|| DatabaseError::Transaction {
            message: "No transaction is open".to_string(),
        })?;

        tx.commit().await.map_err(|e| DatabaseError::Transaction {
            message: format!("Failed to commit transaction: {}", e),
        })
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(|e| DatabaseError::Transaction {
                message: format!("Failed to roll back transaction: {}", e),
            }),
            None => Ok(()),
        }
    }

    async fn name_column_width(&mut self) -> Result<usize, DatabaseError> {
        if self.dialect != Dialect::PostgreSQL {
            return Ok(DEFAULT_NAME_WIDTH);
        }

        let row = sqlx::query(NAME_TYPE_LENGTH_SQL)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to read length of the name type: {}", e),
                sql: Some(NAME_TYPE_LENGTH_SQL.to_string()),
            })?;

        let length: i16 = row.try_get(0).map_err(|e| DatabaseError::Query {
            message: format!("Unexpected typlen value: {}", e),
            sql: Some(NAME_TYPE_LENGTH_SQL.to_string()),
        })?;

        Ok(usize::try_from(length)
            .ok()
            .filter(|width| *width > 0)
            .unwrap_or(DEFAULT_NAME_WIDTH))
    }

    async fn run_test_module(&mut self, module: &str) -> Result<Vec<TestResult>, DatabaseError> {
        let sql = self.rendered_test_query();
        debug!(module, sql = %sql, "Calling test entry point");

        let query = sqlx::query(&sql).bind(module.to_string());
        let rows = match self.tx.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(|e| DatabaseError::Query {
            message: format!("Failed to run tests of module '{}': {}", module, e),
            sql: Some(sql.clone()),
        })?;

        rows.iter()
            .map(|row| decode_test_row(module, row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::Query {
                message: format!("Unexpected test result row in module '{}': {}", module, e),
                sql: Some(sql.clone()),
            })
    }

    async fn close(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                debug!("Rollback on close failed: {}", e);
            }
        }
        self.pool.close().await;
    }
}

/// テスト結果行 (name, result, errcode, errmsg) をデコード
fn decode_test_row(module: &str, row: &AnyRow) -> Result<TestResult, sqlx::Error> {
    let name: String = row.try_get(0)?;
    let passed = decode_flag(row, 1)?;
    let error_code: Option<String> = row.try_get(2)?;
    let error_message: Option<String> = row.try_get(3)?;

    Ok(TestResult::new(
        module,
        name,
        passed,
        error_code.unwrap_or_default(),
        error_message.unwrap_or_default(),
    ))
}

/// 真偽値の列を方言に依らずデコード（bool、整数、文字列を受け付ける）
fn decode_flag(row: &AnyRow, index: usize) -> Result<bool, sqlx::Error> {
    if let Ok(value) = row.try_get::<bool, _>(index) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<i64, _>(index) {
        return Ok(value != 0);
    }
    if let Ok(value) = row.try_get::<i32, _>(index) {
        return Ok(value != 0);
    }
    let text: String = row.try_get(index)?;
    Ok(matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "t" | "true" | "1" | "y" | "yes"
    ))
}
