//! When a document re-reads its file.

use chrono::{DateTime, Utc};

/// Decides, before every read, whether the cached map is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// Re-read the file before every access.
    Always,
    /// Re-read when the file was modified after the last successful load.
    #[default]
    OnChange,
    /// Only re-read on an explicit [`reload`](super::ConfigDocument::reload).
    Manual,
}

impl ReloadPolicy {
    /// Returns true if a document that last loaded at `last_loaded` should
    /// re-read a file last modified at `modified`.
    ///
    /// A document that never loaded is always stale for `Always` and
    /// `OnChange`. An unknown modification time never triggers `OnChange`.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use thunderfile::document::ReloadPolicy;
    ///
    /// let loaded = Utc.timestamp_opt(100, 0).unwrap();
    /// let later = Utc.timestamp_opt(200, 0).unwrap();
    ///
    /// assert!(ReloadPolicy::OnChange.should_reload(Some(loaded), Some(later)));
    /// assert!(!ReloadPolicy::OnChange.should_reload(Some(later), Some(loaded)));
    /// assert!(!ReloadPolicy::Manual.should_reload(Some(loaded), Some(later)));
    /// ```
    pub fn should_reload(
        &self,
        last_loaded: Option<DateTime<Utc>>,
        modified: Option<DateTime<Utc>>,
    ) -> bool {
        match self {
            ReloadPolicy::Always => true,
            ReloadPolicy::Manual => false,
            ReloadPolicy::OnChange => match (last_loaded, modified) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(loaded), Some(modified)) => modified > loaded,
            },
        }
    }
}
