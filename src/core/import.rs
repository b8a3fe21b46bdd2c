// 事前定義データ取り込みの呼び出しモデル
//
// 取り込み処理は外部プログラムが担い、インストーラーは作業ディレクトリと
// 転送するフラグを渡して終了コードを受け取るだけ。

use serde::Serialize;
use std::path::PathBuf;

/// 取り込みプログラムへ転送するログファイル指定フラグ
pub const LOG_FILENAME_FLAG: &str = "--log-filename";

/// 取り込みプログラムへ転送する開発用データベース指定フラグ
pub const USE_DEV_DATABASE_FLAG: &str = "--use-dev-database";

/// 取り込みプログラムの呼び出し内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRequest {
    /// 作業ディレクトリ
    pub working_dir: PathBuf,
    /// コマンドライン（先頭がプログラム名）
    pub command: Vec<String>,
    /// 転送するログファイルのパス
    pub log_filename: PathBuf,
    /// 開発用データベースを使うか
    pub use_dev_database: bool,
}

impl ImportRequest {
    /// 起動するプログラム名
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// 転送フラグを含めたプログラム引数
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.push(LOG_FILENAME_FLAG.to_string());
        args.push(self.log_filename.display().to_string());
        if self.use_dev_database {
            args.push(USE_DEV_DATABASE_FLAG.to_string());
        }
        args
    }
}

/// 取り込みプログラムの実行結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    /// 子プロセスの終了コード
    pub exit_code: i32,
}

impl ImportOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
