// データベース内テストの結果モデル

use serde::Serialize;

/// テストエントリポイントが返す1行分の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    /// テスト対象のモジュール
    pub module: String,
    /// テスト名
    pub name: String,
    /// 成否
    pub passed: bool,
    /// エラーコード（無い場合は空文字列）
    pub error_code: String,
    /// エラーメッセージ（無い場合は空文字列）
    pub error_message: String,
}

impl TestResult {
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
        passed: bool,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            passed,
            error_code: error_code.into(),
            error_message: error_message.into(),
        }
    }

    /// エラーコードまたはエラーメッセージが報告されているか
    pub fn has_error(&self) -> bool {
        !self.error_code.is_empty() || !self.error_message.is_empty()
    }

    /// 失敗として扱うか
    pub fn is_failure(&self) -> bool {
        !self.passed || self.has_error()
    }
}

/// テスト結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub total: usize,
    pub failed: usize,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        Self {
            total: results.len(),
            failed: results.iter().filter(|r| r.is_failure()).count(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
