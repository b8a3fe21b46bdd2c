// サービストレイト定義
//
// データベースセッションと事前定義データ取り込みの境界を抽象化し、
// テスト時のモック差し替えを可能にするためのトレイト群。

use crate::core::error::{DatabaseError, ImportError};
use crate::core::import::{ImportOutcome, ImportRequest};
use crate::core::test_result::TestResult;
use async_trait::async_trait;

/// 明示的なライフサイクルを持つデータベースセッション
///
/// open → begin → execute_batch* → commit | rollback → close の順で使う。
/// 1つの接続を逐次的に使い、並行利用はしない。
#[async_trait]
pub trait SchemaSession: Send {
    /// トランザクションを開始
    async fn begin(&mut self) -> Result<(), DatabaseError>;

    /// 複数文を含むSQLを1つのバッチとして実行
    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// 開いているトランザクションをコミット
    async fn commit(&mut self) -> Result<(), DatabaseError>;

    /// 開いているトランザクションをロールバック（開いていなければ何もしない）
    async fn rollback(&mut self) -> Result<(), DatabaseError>;

    /// テスト結果出力で使うテスト名の列幅
    async fn name_column_width(&mut self) -> Result<usize, DatabaseError>;

    /// テストエントリポイントを呼び出し、指定モジュールの結果行を取得
    async fn run_test_module(&mut self, module: &str) -> Result<Vec<TestResult>, DatabaseError>;

    /// 接続を閉じる
    async fn close(&mut self);
}

/// 事前定義データ取り込みの外部協調者
#[async_trait]
pub trait ImportDataPort: Send + Sync {
    /// 取り込みを実行し、終了コードを変更せずに返す
    async fn import(&self, request: &ImportRequest) -> Result<ImportOutcome, ImportError>;
}
