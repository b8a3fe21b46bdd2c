// Adapters
// データベースと外部プロセスへのアクセスを抽象化

pub mod connection_string;
pub mod database;
pub mod process_importer;
pub mod sqlx_session;
