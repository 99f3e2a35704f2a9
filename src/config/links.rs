//! `[links]` section: link policy and the link list.
use serde::Deserialize;
use std::path::Path;

use crate::expand::Environment;
use crate::resources::link::LinkSpec;

/// Raw `[links]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinksSection {
    /// Replace existing entries that are not the correct link.
    #[serde(default)]
    pub overwrite: bool,
    /// Keep replaced entries as `<name>.bak`.
    #[serde(default)]
    pub backup: bool,
    /// `[[links.entries]]`
    #[serde(default)]
    pub entries: Vec<LinkEntry>,
}

/// One `[[links.entries]]` item.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    /// Live path that should become a link.
    pub path: String,
    /// Link target; relative targets are resolved inside the store.
    pub target: String,
}

/// Convert entries to link specs, rooting relative targets at `store`.
///
/// Relativity is decided after expansion so `%APPDATA%\x` counts as
/// absolute.  The strings themselves stay unexpanded.
#[must_use]
pub fn resolve(entries: &[LinkEntry], store: Option<&str>, env: &Environment) -> Vec<LinkSpec> {
    entries
        .iter()
        .map(|entry| {
            let target = match store {
                Some(store) if env.expand_path(&entry.target).is_relative() => Path::new(store)
                    .join(&entry.target)
                    .to_string_lossy()
                    .into_owned(),
                _ => entry.target.clone(),
            };
            LinkSpec::new(entry.path.clone(), target)
        })
        .collect()
}

/// Index of the first entry with an empty path or target.
#[must_use]
pub fn first_invalid(entries: &[LinkEntry]) -> Option<usize> {
    entries
        .iter()
        .position(|e| e.path.trim().is_empty() || e.target.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry(path: &str, target: &str) -> LinkEntry {
        LinkEntry {
            path: path.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn relative_targets_join_store() {
        let specs = resolve(
            &[entry("~/.gitconfig", "git/config")],
            Some("/store"),
            &Environment::default(),
        );
        assert_eq!(
            specs[0].target,
            Path::new("/store").join("git/config").to_string_lossy()
        );
        assert_eq!(specs[0].path, "~/.gitconfig");
    }

    #[test]
    fn targets_absolute_after_expansion_are_kept() {
        let env = Environment::from_pairs([("DOTFILES", "/elsewhere")]);
        let specs = resolve(&[entry("/live", "$DOTFILES/vim")], Some("/store"), &env);
        assert_eq!(specs[0].target, "$DOTFILES/vim");
    }

    #[test]
    fn without_store_targets_are_unchanged() {
        let specs = resolve(&[entry("/live", "vim")], None, &Environment::default());
        assert_eq!(specs[0].target, "vim");
    }

    #[test]
    fn empty_fields_are_flagged() {
        assert_eq!(first_invalid(&[entry("/a", "b"), entry(" ", "c")]), Some(1));
        assert_eq!(first_invalid(&[entry("/a", "b")]), None);
    }
}
