//! `[purge]` section.
use serde::Deserialize;

use crate::purge::PurgeRequest;

/// Raw `[purge]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurgeSection {
    /// Directory-glob patterns, purged in order.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl PurgeSection {
    /// One request per non-blank pattern.
    #[must_use]
    pub fn requests(&self) -> Vec<PurgeRequest> {
        self.patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(PurgeRequest::new)
            .collect()
    }
}
