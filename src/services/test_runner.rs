// データベース内テスト実行サービス
//
// 適用済みスキーマが公開するテストエントリポイントをモジュールごとに呼び出し、
// 結果行をすべてログに出力する。テストの失敗はエラーとして伝播しない。

use crate::core::error::DatabaseError;
use crate::core::test_result::TestResult;
use crate::services::traits::SchemaSession;
use tracing::{error, info, warn};

/// テスト実行サービス
#[derive(Debug, Clone, Default)]
pub struct TestRunner {}

impl TestRunner {
    /// 新しいTestRunnerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 指定モジュールのテストを順に実行
    ///
    /// テストは専用のトランザクション内で実行され、最後にロールバックされる。
    /// 接続エラーやエントリポイント不在のみがエラーになる。
    ///
    /// # Returns
    ///
    /// モジュールの指定順、モジュール内は行の順に並んだテスト結果
    pub async fn run<S>(
        &self,
        session: &mut S,
        modules: &[String],
    ) -> Result<Vec<TestResult>, DatabaseError>
    where
        S: SchemaSession + ?Sized,
    {
        info!("Running tests");

        // テスト名の出力幅をテスト名の型の長さに合わせる
        let width = session.name_column_width().await?;

        session.begin().await?;
        let outcome = self.run_modules(session, modules, width).await;
        if let Err(e) = session.rollback().await {
            warn!("Failed to roll back test transaction: {}", e);
        }
        outcome
    }

    async fn run_modules<S>(
        &self,
        session: &mut S,
        modules: &[String],
        width: usize,
    ) -> Result<Vec<TestResult>, DatabaseError>
    where
        S: SchemaSession + ?Sized,
    {
        let mut results = Vec::new();

        for module in modules {
            info!("TESTING MODULE: {}", module);
            info!("{}", format_row("name", "result", width));

            for result in session.run_test_module(module).await? {
                info!("{}", format_row(&result.name, result_label(&result), width));
                if result.has_error() {
                    error!(
                        "Error code: {}\nError message: {}",
                        result.error_code, result.error_message
                    );
                }
                results.push(result);
            }
        }

        Ok(results)
    }
}

fn result_label(result: &TestResult) -> &'static str {
    if result.passed {
        "passed"
    } else {
        "FAILED"
    }
}

/// テスト名を列幅で左寄せして結果と連結
pub fn format_row(name: &str, result: &str, width: usize) -> String {
    format!("{:<width$}{}", name, result, width = width)
}
