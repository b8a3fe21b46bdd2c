// 事前定義データ取り込みサービス
//
// 取り込み処理そのものは ImportDataPort の実装に委ね、
// ここではログ出力と終了コードの受け渡しだけを行う。

use crate::core::error::ImportError;
use crate::core::import::{ImportOutcome, ImportRequest};
use crate::services::traits::ImportDataPort;
use tracing::{debug, error, info};

/// 事前定義データを取り込み、子プロセスの終了コードをそのまま返す
pub async fn import_predefined_data<P>(
    port: &P,
    request: &ImportRequest,
) -> Result<ImportOutcome, ImportError>
where
    P: ImportDataPort + ?Sized,
{
    info!("Importing predefined data");
    debug!(
        working_dir = %request.working_dir.display(),
        command = ?request.command,
        use_dev_database = request.use_dev_database,
        "Launching importer"
    );

    let outcome = port.import(request).await?;

    if outcome.success() {
        info!("Predefined data imported");
    } else {
        error!(exit_code = outcome.exit_code, "Predefined data import failed");
    }

    Ok(outcome)
}
