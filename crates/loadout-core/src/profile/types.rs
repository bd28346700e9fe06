//! Profile data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tool membership in a profile: the canonical key plus the desired
/// enabled state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileToolEntry {
    pub key: String,
    pub enabled: bool,
}

/// A named snapshot of desired tool states
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub tools: Vec<ProfileToolEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A new, empty profile
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tools: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the profile as modified now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The persisted collection of profiles plus the active pointer
///
/// Loaded, validated, and saved as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub active_profile_id: Option<Uuid>,
}

impl ProfileStore {
    /// Look up a profile by id
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Look up a profile by id, mutably
    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    /// Look up a profile by name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Tally of one profile switch
///
/// A failure toggling one tool never aborts the rest; it lands here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchReport {
    /// Toggles applied
    pub toggled: usize,
    /// Profile entries whose tool no longer exists
    pub skipped: usize,
    /// Toggles attempted and failed
    pub failed: usize,
    /// One message per failure
    pub errors: Vec<String>,
}

/// Outcome of pruning stale entries from a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries whose tool still exists
    pub valid: usize,
    /// Entries dropped because the tool vanished
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_lookup() {
        let mut store = ProfileStore::default();
        let profile = Profile::new("dev");
        let id = profile.id;
        store.profiles.push(profile);

        assert_eq!(store.find(id).unwrap().name, "dev");
        assert_eq!(store.find_by_name("dev").unwrap().id, id);
        assert!(store.find(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_touch_advances_updated_at() {
        let mut profile = Profile::new("dev");
        let created = profile.updated_at;
        profile.touch();
        assert!(profile.updated_at >= created);
    }
}
