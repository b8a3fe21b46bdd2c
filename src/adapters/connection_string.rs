// 接続文字列ビルダー
//
// DatabaseConfig と Dialect から接続文字列を生成する。

use crate::core::config::{DatabaseConfig, Dialect};
use urlencoding::encode;

/// SQLiteのインメモリデータベース指定
const SQLITE_MEMORY: &str = ":memory:";

/// インメモリデータベースの接続文字列
const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

/// 接続文字列を生成
///
/// ユーザー名とパスワードはパーセントエンコードされます。
/// SQLiteのファイルデータベースは存在しない場合に作成されます。
pub fn build_connection_string(dialect: Dialect, config: &DatabaseConfig) -> String {
    match dialect {
        Dialect::PostgreSQL => {
            let auth = build_auth(config, "postgres");
            let port = config.port_or_default(dialect).unwrap_or(5432);
            format!(
                "postgresql://{}@{}:{}/{}",
                auth, config.host, port, config.database
            )
        }
        Dialect::MySQL => {
            let auth = build_auth(config, "root");
            let port = config.port_or_default(dialect).unwrap_or(3306);
            format!(
                "mysql://{}@{}:{}/{}",
                auth, config.host, port, config.database
            )
        }
        Dialect::SQLite => {
            if config.database == SQLITE_MEMORY {
                SQLITE_MEMORY_URL.to_string()
            } else {
                format!("sqlite://{}?mode=rwc", config.database)
            }
        }
    }
}

fn build_auth(config: &DatabaseConfig, default_user: &str) -> String {
    let user = config.user.as_deref().unwrap_or(default_user);
    let encoded_user = encode(user);
    match config.password.as_deref() {
        Some(password) if !password.is_empty() => {
            format!("{}:{}", encoded_user, encode(password))
        }
        _ => encoded_user.to_string(),
    }
}
