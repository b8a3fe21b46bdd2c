// スキーマ適用サービス
//
// 適用ランのスクリプトを記載順に1つずつ読み込んで実行し、
// 全スクリプトの成功後に一度だけコミットする。
// 途中で失敗した場合はロールバックし、後続のスクリプトは実行しない。

use crate::core::error::ApplyError;
use crate::core::script::{ApplyRun, ScriptUnit};
use crate::services::traits::SchemaSession;
use chrono::Utc;
use std::error::Error as _;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 適用済みスクリプトの記録
#[derive(Debug, Clone, Serialize)]
pub struct AppliedScript {
    pub name: String,
    pub position: usize,
    pub duration_ms: i64,
}

/// 適用ランの結果
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// 実行順に並んだ適用済みスクリプト
    pub scripts: Vec<AppliedScript>,
    /// クリア用スクリプトを含んだか
    pub cleared: bool,
    /// 合計実行時間（ミリ秒）
    pub total_duration_ms: i64,
}

impl ApplyReport {
    pub fn applied_count(&self) -> usize {
        self.scripts.len()
    }
}

/// スキーマ適用サービス
#[derive(Debug, Clone)]
pub struct SchemaApplier {
    scripts_dir: PathBuf,
}

impl SchemaApplier {
    /// スクリプトの基準ディレクトリを指定して作成
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    /// 適用ランを1つのトランザクションとして実行
    ///
    /// # Arguments
    ///
    /// * `session` - 開いているデータベースセッション
    /// * `run` - 実行するスクリプトの順序付き集合
    ///
    /// # Returns
    ///
    /// 全スクリプトが成功してコミットされた場合は適用結果、それ以外はエラー
    pub async fn apply<S>(&self, session: &mut S, run: &ApplyRun) -> Result<ApplyReport, ApplyError>
    where
        S: SchemaSession + ?Sized,
    {
        let started = Utc::now();
        debug!(
            scripts_dir = %self.scripts_dir.display(),
            count = run.len(),
            clear = run.includes_clear(),
            "Starting apply run"
        );

        session.begin().await.map_err(ApplyError::Transaction)?;

        let scripts = match self.apply_units(session, run.units()).await {
            Ok(scripts) => scripts,
            Err(e) => {
                match e.source() {
                    Some(cause) => error!("{}: {}", e, cause),
                    None => error!("{}", e),
                }
                if let Err(rollback_error) = session.rollback().await {
                    warn!("Rollback after failed script also failed: {}", rollback_error);
                }
                return Err(e);
            }
        };

        debug!("Committing {} script(s)", scripts.len());
        session.commit().await.map_err(ApplyError::Transaction)?;

        let total_duration_ms = Utc::now().signed_duration_since(started).num_milliseconds();
        info!(
            count = scripts.len(),
            duration_ms = total_duration_ms,
            "Database structure installed"
        );

        Ok(ApplyReport {
            scripts,
            cleared: run.includes_clear(),
            total_duration_ms,
        })
    }

    async fn apply_units<S>(
        &self,
        session: &mut S,
        units: &[ScriptUnit],
    ) -> Result<Vec<AppliedScript>, ApplyError>
    where
        S: SchemaSession + ?Sized,
    {
        let mut applied = Vec::with_capacity(units.len());

        for unit in units {
            info!("Importing {}", unit.name);
            let start_time = Utc::now();

            let path = unit.resolve(&self.scripts_dir);
            let sql = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ApplyError::ScriptRead {
                    script: unit.name.clone(),
                    position: unit.position,
                    path: path.display().to_string(),
                    cause: e.to_string(),
                })?;

            session
                .execute_batch(&sql)
                .await
                .map_err(|e| ApplyError::ScriptExecution {
                    script: unit.name.clone(),
                    position: unit.position,
                    source: e,
                })?;

            applied.push(AppliedScript {
                name: unit.name.clone(),
                position: unit.position,
                duration_ms: Utc::now()
                    .signed_duration_since(start_time)
                    .num_milliseconds(),
            });
        }

        Ok(applied)
    }
}
