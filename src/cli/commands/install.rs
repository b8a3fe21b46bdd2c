// installコマンドハンドラー
//
// インストールの3フェーズを順に実行します。
// - スクリプト適用（失敗時は中断、コミットなし）
// - データベース内テスト（失敗はログに記録、既定では続行）
// - 事前定義データ取り込み（子プロセスの終了コードを伝播）

use crate::adapters::process_importer::ProcessImporter;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::import::ImportRequest;
use crate::core::naming::environment_name;
use crate::core::script::ApplyRun;
use crate::core::test_result::{TestResult, TestSummary};
use crate::services::predefined_data::import_predefined_data;
use crate::services::schema_applier::SchemaApplier;
use crate::services::test_runner::TestRunner;
use crate::services::traits::{ImportDataPort, SchemaSession};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// installコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InstallCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// クリア用スクリプトを先に実行するか
    pub clear: bool,
    /// テストを実行するか
    pub tests: bool,
    /// 事前定義データを取り込むか
    pub predefined_data: bool,
    /// ログファイル（取り込みプログラムへ転送）
    pub log_filename: PathBuf,
    /// 開発用データベースを使うか
    pub use_dev_database: bool,
    /// テスト失敗時にエラーとするか（設定ファイルの指定と OR を取る）
    pub fail_on_test_failure: bool,
    /// タイムアウト（秒）
    pub timeout: Option<u64>,
    /// Dry run - 接続せずに適用予定のスクリプトを表示
    pub dry_run: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// installコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    /// Dry runモードかどうか
    pub dry_run: bool,
    /// 接続先の環境
    pub environment: String,
    /// 実行順のスクリプト
    pub scripts: Vec<String>,
    /// クリア用スクリプトを含んだか
    pub cleared: bool,
    /// 適用されたスクリプト数
    pub applied_count: usize,
    /// テスト結果の集計（テスト無効時はなし）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSummary>,
    /// 失敗したテスト
    pub failed_tests: Vec<TestResult>,
    /// 取り込みプログラムの終了コード（取り込み無効時はなし）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_exit_code: Option<i32>,
    /// 合計実行時間（ミリ秒）
    pub total_duration_ms: i64,
    /// 警告メッセージ
    pub warnings: Vec<String>,
    /// メッセージ
    #[serde(skip)]
    pub message: String,
}

impl CommandOutput for InstallOutput {
    fn to_text(&self) -> String {
        self.message.clone()
    }
}

/// installコマンドの結果
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// 表示用に整形された出力
    pub output: String,
    /// プロセスの終了コード
    pub exit_code: i32,
}

/// installコマンドハンドラー
pub struct InstallCommandHandler {
    importer: Arc<dyn ImportDataPort>,
}

impl std::fmt::Debug for InstallCommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallCommandHandler").finish_non_exhaustive()
    }
}

impl Default for InstallCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallCommandHandler {
    /// 子プロセスで取り込みを行うハンドラーを作成
    pub fn new() -> Self {
        Self::with_importer(Arc::new(ProcessImporter::new()))
    }

    /// 取り込みポートを差し替えてハンドラーを作成
    pub fn with_importer(importer: Arc<dyn ImportDataPort>) -> Self {
        Self { importer }
    }

    /// installコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - installコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は出力と終了コード（取り込みが失敗した場合はその終了コード）
    pub async fn execute(&self, command: &InstallCommand) -> Result<InstallOutcome> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        if command.dry_run {
            return self.execute_dry_run(&context, command);
        }

        let environment = environment_name(command.use_dev_database);
        info!(environment, dialect = %context.dialect(), "Connecting to database");
        let mut session = context
            .connect_session(environment, command.timeout)
            .await?;

        self.execute_with_session(&context, command, &mut session)
            .await
    }

    /// 開いているセッションでインストールの各フェーズを実行
    ///
    /// セッションは取り込みフェーズの前に必ず閉じられる。
    pub async fn execute_with_session<S>(
        &self,
        context: &CommandContext,
        command: &InstallCommand,
        session: &mut S,
    ) -> Result<InstallOutcome>
    where
        S: SchemaSession + ?Sized,
    {
        let result = self.run_database_phases(context, command, session).await;
        session.close().await;
        let (mut output, test_failure) = result?;

        if let Some(failed) = test_failure {
            return Err(anyhow!(
                "{} test(s) failed and failing on test failure is enabled",
                failed
            ));
        }

        let mut exit_code = 0;
        if command.predefined_data {
            let request = ImportRequest {
                working_dir: context.predefined_data_dir(),
                command: context.config.predefined_data.command.clone(),
                log_filename: context.resolve_path(&command.log_filename),
                use_dev_database: command.use_dev_database,
            };

            let outcome = import_predefined_data(self.importer.as_ref(), &request)
                .await
                .with_context(|| "Failed to import predefined data")?;
            exit_code = outcome.exit_code;
            output.import_exit_code = Some(outcome.exit_code);
        } else {
            debug!("Predefined data import disabled");
        }

        output.message = self.generate_summary(&output);
        Ok(InstallOutcome {
            output: render_output(&output, &command.format)?,
            exit_code,
        })
    }

    /// スクリプト適用とテストを実行
    ///
    /// テスト失敗を致命的に扱う場合は失敗数を返す。
    async fn run_database_phases<S>(
        &self,
        context: &CommandContext,
        command: &InstallCommand,
        session: &mut S,
    ) -> Result<(InstallOutput, Option<usize>)>
    where
        S: SchemaSession + ?Sized,
    {
        let started = Utc::now();
        let config = &context.config;
        let run = build_apply_run(context, command.clear);

        let applier = SchemaApplier::new(context.scripts_dir());
        let report = applier
            .apply(session, &run)
            .await
            .with_context(|| "Failed to install database structure")?;

        let mut tests = None;
        let mut failed_tests = Vec::new();
        let mut test_failure = None;

        if command.tests {
            let results = TestRunner::new()
                .run(session, &config.tests.modules)
                .await
                .with_context(|| "Failed to run tests")?;

            let summary = TestSummary::from_results(&results);
            if !summary.all_passed() {
                warn!("{} of {} test(s) failed", summary.failed, summary.total);
                if command.fail_on_test_failure || config.tests.fail_on_failure {
                    test_failure = Some(summary.failed);
                }
            }

            failed_tests = results.into_iter().filter(|r| r.is_failure()).collect();
            tests = Some(summary);
        }

        let output = InstallOutput {
            dry_run: false,
            environment: environment_name(command.use_dev_database).to_string(),
            scripts: run.names().iter().map(|s| s.to_string()).collect(),
            cleared: report.cleared,
            applied_count: report.applied_count(),
            tests,
            failed_tests,
            import_exit_code: None,
            total_duration_ms: Utc::now().signed_duration_since(started).num_milliseconds(),
            warnings: vec![],
            message: String::new(),
        };

        Ok((output, test_failure))
    }

    /// Dry runモードの実行
    fn execute_dry_run(
        &self,
        context: &CommandContext,
        command: &InstallCommand,
    ) -> Result<InstallOutcome> {
        let run = build_apply_run(context, command.clear);
        let scripts_dir = context.scripts_dir();

        let mut text_output = String::from("=== DRY RUN MODE ===\n");
        text_output.push_str(&format!(
            "The following {} script(s) will be applied in one transaction:\n\n",
            run.len()
        ));

        let mut warnings = Vec::new();
        for unit in run.units() {
            let path = unit.resolve(&scripts_dir);
            if path.is_file() {
                text_output.push_str(&format!("{:>4}. {}\n", unit.position, unit.name));
            } else {
                let warning = format!("Script not found: {}", path.display());
                text_output.push_str(&format!(
                    "{:>4}. {} {}\n",
                    unit.position,
                    unit.name,
                    "(missing)".red()
                ));
                warnings.push(warning);
            }
        }

        text_output.push('\n');
        if command.tests {
            text_output.push_str(&format!(
                "Tests: {}\n",
                context.config.tests.modules.join(", ")
            ));
        } else {
            text_output.push_str("Tests: disabled\n");
        }

        if command.predefined_data {
            text_output.push_str(&format!(
                "Predefined data: {} (in {})\n",
                context.config.predefined_data.command.join(" "),
                context.predefined_data_dir().display()
            ));
        } else {
            text_output.push_str("Predefined data: disabled\n");
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        let output = InstallOutput {
            dry_run: true,
            environment: environment_name(command.use_dev_database).to_string(),
            scripts: run.names().iter().map(|s| s.to_string()).collect(),
            cleared: run.includes_clear(),
            applied_count: 0,
            tests: None,
            failed_tests: vec![],
            import_exit_code: None,
            total_duration_ms: 0,
            warnings,
            message: text_output,
        };

        Ok(InstallOutcome {
            output: render_output(&output, &command.format)?,
            exit_code: 0,
        })
    }

    /// 実行結果のサマリーを生成
    fn generate_summary(&self, output: &InstallOutput) -> String {
        let mut summary = format!(
            "{} Installed {} script(s) into the {} database",
            "✓".green(),
            output.applied_count,
            output.environment
        );
        if output.cleared {
            summary.push_str(" (cleared first)");
        }
        summary.push('\n');

        match &output.tests {
            Some(tests) if tests.all_passed() => {
                summary.push_str(&format!("{} {} test(s) passed\n", "✓".green(), tests.total));
            }
            Some(tests) => {
                summary.push_str(&format!(
                    "{} {} of {} test(s) failed\n",
                    "✗".red(),
                    tests.failed,
                    tests.total
                ));
                for failed in &output.failed_tests {
                    summary.push_str(&format!("    {}::{}\n", failed.module, failed.name));
                }
            }
            None => summary.push_str("Tests skipped\n"),
        }

        match output.import_exit_code {
            Some(0) => summary.push_str(&format!("{} Predefined data imported\n", "✓".green())),
            Some(code) => summary.push_str(&format!(
                "{} Predefined data import failed with exit code {}\n",
                "✗".red(),
                code
            )),
            None => summary.push_str("Predefined data import skipped\n"),
        }

        summary.push_str(&format!("Total time: {}ms", output.total_duration_ms));
        summary
    }
}

/// 設定とフラグから適用ランを作成
fn build_apply_run(context: &CommandContext, clear: bool) -> ApplyRun {
    let clear_script = clear.then_some(context.config.clear_script.as_str());
    ApplyRun::build(&context.config.scripts, clear_script)
}
