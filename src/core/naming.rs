// 命名ポリシー
//
// 設定ファイル名や環境名などの単一ソースを提供します。

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".installer.yaml";

/// 既定のログファイル名
pub const DEFAULT_LOG_FILE: &str = "install.log";

/// 本番環境名
pub const PRODUCTION_ENV: &str = "production";

/// 開発用データベースの環境名
pub const DEVELOPMENT_ENV: &str = "development";

/// テストエントリポイントのクエリ内でモジュール名に置き換えられるプレースホルダー
pub const MODULE_PLACEHOLDER: &str = "{module}";

/// `--use-dev-database` フラグの有無から接続先の環境名を選ぶ
pub fn environment_name(use_dev_database: bool) -> &'static str {
    if use_dev_database {
        DEVELOPMENT_ENV
    } else {
        PRODUCTION_ENV
    }
}
