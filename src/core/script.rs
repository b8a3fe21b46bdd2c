// スクリプト単位と適用ランのドメインモデル
//
// スクリプトの内容は実行時に読み込まれ、ここでは保持しない。

use serde::Serialize;
use std::path::{Path, PathBuf};

/// 1つのSQLスクリプトファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptUnit {
    /// 基準ディレクトリからの相対パス
    pub name: String,
    /// 適用ラン内での実行順序（1始まり）
    pub position: usize,
}

impl ScriptUnit {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// 基準ディレクトリに対するファイルパスを解決
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.name)
    }
}

/// 1回の実行で適用されるスクリプトの順序付き集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyRun {
    units: Vec<ScriptUnit>,
    clear_included: bool,
}

impl ApplyRun {
    /// スクリプト名のリストから適用ランを作成
    ///
    /// `clear_script` が指定された場合は先頭に挿入される。
    pub fn build<S: AsRef<str>>(scripts: &[S], clear_script: Option<&str>) -> Self {
        let names = clear_script
            .into_iter()
            .chain(scripts.iter().map(|s| s.as_ref()));

        let units = names
            .enumerate()
            .map(|(index, name)| ScriptUnit::new(name, index + 1))
            .collect();

        Self {
            units,
            clear_included: clear_script.is_some(),
        }
    }

    pub fn units(&self) -> &[ScriptUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// クリア用スクリプトが含まれているか
    pub fn includes_clear(&self) -> bool {
        self.clear_included
    }

    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_clear_keeps_order() {
        let run = ApplyRun::build(&["pre.sql", "common.sql", "post.sql"], None);

        assert_eq!(run.names(), vec!["pre.sql", "common.sql", "post.sql"]);
        assert!(!run.includes_clear());
        let positions: Vec<_> = run.units().iter().map(|u| u.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_build_with_clear_prepends() {
        let run = ApplyRun::build(&["pre.sql", "common.sql"], Some("clear.sql"));

        assert_eq!(run.len(), 3);
        assert!(run.includes_clear());
        assert_eq!(run.units()[0], ScriptUnit::new("clear.sql", 1));
        assert_eq!(run.units()[2], ScriptUnit::new("common.sql", 3));
    }

    #[test]
    fn test_clear_is_first_even_if_listed_later() {
        let run = ApplyRun::build(&["pre.sql", "clear.sql"], Some("clear.sql"));
        assert_eq!(run.names(), vec!["clear.sql", "pre.sql", "clear.sql"]);
    }

    #[test]
    fn test_resolve_nested_path() {
        let unit = ScriptUnit::new("epic/test/test_core.sql", 1);
        let path = unit.resolve(Path::new("/srv/sql"));
        assert_eq!(path, PathBuf::from("/srv/sql/epic/test/test_core.sql"));
    }
}
