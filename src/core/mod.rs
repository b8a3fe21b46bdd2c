// Core Domain
// 設定、エラー、スクリプト適用ラン、テスト結果、取り込み呼び出しの純粋なドメインモデル

pub mod config;
pub mod error;
pub mod import;
pub mod naming;
pub mod script;
pub mod test_result;
