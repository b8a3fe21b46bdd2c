// 外部プロセスによる事前定義データ取り込み
//
// 取り込みプログラムを作業ディレクトリ内で起動し、終了まで待機する。
// タイムアウトやキャンセルは持たない。

use crate::core::error::ImportError;
use crate::core::import::{ImportOutcome, ImportRequest};
use crate::services::traits::ImportDataPort;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// シグナルで終了した子プロセスに割り当てる終了コード
pub const SIGNALED_EXIT_CODE: i32 = 1;

/// 子プロセスを起動する取り込みポート
#[derive(Debug, Clone, Default)]
pub struct ProcessImporter {}

impl ProcessImporter {
    /// 新しいProcessImporterを作成
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ImportDataPort for ProcessImporter {
    async fn import(&self, request: &ImportRequest) -> Result<ImportOutcome, ImportError> {
        let program = request.program().ok_or(ImportError::EmptyCommand)?;

        if !request.working_dir.is_dir() {
            return Err(ImportError::WorkingDirectoryNotFound {
                path: request.working_dir.display().to_string(),
            });
        }

        let args = request.args();
        debug!(program, args = ?args, cwd = %request.working_dir.display(), "Spawning importer");

        let status = Command::new(program)
            .args(&args)
            .current_dir(&request.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ImportError::Spawn {
                program: program.to_string(),
                cause: e.to_string(),
            })?;

        let exit_code = match status.code() {
            Some(code) => code,
            None => {
                warn!("Importer was terminated by a signal");
                SIGNALED_EXIT_CODE
            }
        };

        Ok(ImportOutcome { exit_code })
    }
}
