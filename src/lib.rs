// Schema Installerライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付、ロギング、installコマンド）
// - core: コアドメイン（設定、エラー、スクリプト適用ラン、テスト結果）
// - adapters: データベース接続と外部プロセスへのアクセス
// - services: スキーマ適用、テスト実行、事前定義データ取り込み

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
