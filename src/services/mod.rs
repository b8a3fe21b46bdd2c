// Services Layer
// ドメインロジックを実行するサービス層

pub mod config_loader;
pub mod database_config_resolver;
pub mod predefined_data;
pub mod schema_applier;
pub mod test_runner;
pub mod traits;
