// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DatabaseError, ApplyError, ImportError を定義します。

use thiserror::Error;

/// データベースエラー
///
/// データベース操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// トランザクションエラーかどうか
    pub fn is_transaction(&self) -> bool {
        matches!(self, DatabaseError::Transaction { .. })
    }
}

/// スクリプト適用エラー
///
/// スクリプト適用フェーズで発生し、インストール全体を中断させるエラー。
/// どのバリアントでもコミットは行われていない。
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Script file could not be read
    #[error("Failed to read script #{position} '{script}' ({path}): {cause}")]
    ScriptRead {
        /// スクリプト名
        script: String,
        /// 実行順序（1始まり）
        position: usize,
        /// 解決済みのファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Script execution failed on the database
    #[error("Failed to execute script #{position} '{script}'")]
    ScriptExecution {
        /// スクリプト名
        script: String,
        /// 実行順序（1始まり）
        position: usize,
        /// データベースエラー
        #[source]
        source: DatabaseError,
    },

    /// Begin, commit or rollback failed
    #[error(transparent)]
    Transaction(DatabaseError),
}

impl ApplyError {
    /// 失敗したスクリプト名を取得
    pub fn script(&self) -> Option<&str> {
        match self {
            ApplyError::ScriptRead { script, .. } | ApplyError::ScriptExecution { script, .. } => {
                Some(script)
            }
            ApplyError::Transaction(_) => None,
        }
    }

    /// スクリプト読み込みエラーかどうか
    pub fn is_script_read(&self) -> bool {
        matches!(self, ApplyError::ScriptRead { .. })
    }

    /// スクリプト実行エラーかどうか
    pub fn is_script_execution(&self) -> bool {
        matches!(self, ApplyError::ScriptExecution { .. })
    }
}

/// 事前定義データ取り込みエラー
///
/// 子プロセスを起動できなかった場合のエラー。
/// 子プロセスが非ゼロで終了した場合はエラーではなく終了コードとして扱う。
#[derive(Debug, Error)]
pub enum ImportError {
    /// Working directory does not exist
    #[error("Predefined data directory not found: {path}")]
    WorkingDirectoryNotFound {
        /// ディレクトリパス
        path: String,
    },

    /// Command line is empty
    #[error("Import command is empty")]
    EmptyCommand,

    /// Process could not be spawned or awaited
    #[error("Failed to run importer '{program}': {cause}")]
    Spawn {
        /// 起動したプログラム
        program: String,
        /// エラー原因
        cause: String,
    },
}
