//! Profile reconciliation engine
//!
//! Profiles are named snapshots of desired tool states. Switching applies
//! the delta between a profile and the live inventory, one toggle at a
//! time; the profile is a closed set, so live enabled tools outside it are
//! disabled.

use chrono::Utc;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapter::PlatformAdapter;
use crate::config::ConfigService;
use crate::error::{ConfigError, ConfigResult};
use crate::manager::ToolManager;
use crate::model::{validate_name, NormalizedTool, ToolScope, ToolStatus};
use crate::schema::{self, SchemaRegistry};

use super::bundle::{
    metadata_equivalent, BundleProfile, BundleTool, ImportAnalysis, ImportDisposition,
    ImportItem, ProfileBundle, BUNDLE_TYPE, BUNDLE_VERSION,
};
use super::store::KvStore;
use super::types::{Profile, ProfileStore, ProfileToolEntry, ReconcileReport, SwitchReport};

const STORE_KEY: &str = "profile-store";

/// Orchestrates profile CRUD, switching, reconciliation, and export
pub struct ProfileEngine<'a> {
    service: &'a ConfigService,
    adapter: &'a dyn PlatformAdapter,
    kv: &'a dyn KvStore,
    schemas: SchemaRegistry,
}

impl<'a> ProfileEngine<'a> {
    pub fn new(
        service: &'a ConfigService,
        adapter: &'a dyn PlatformAdapter,
        kv: &'a dyn KvStore,
    ) -> Self {
        Self {
            service,
            adapter,
            kv,
            schemas: SchemaRegistry::builtin(),
        }
    }

    /// Load the persisted store
    ///
    /// Corrupt or invalid stored data fails closed to the empty default;
    /// it is never propagated as a hard error on the read path.
    #[must_use]
    pub fn load_store(&self) -> ProfileStore {
        let payload = match self.kv.get(STORE_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return ProfileStore::default(),
            Err(e) => {
                warn!(error = %e, "profile store unreadable, starting empty");
                return ProfileStore::default();
            }
        };

        let value: Value = match serde_json::from_str(&payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "profile store corrupt, starting empty");
                return ProfileStore::default();
            }
        };
        if let Err(e) = self.schemas.validate(schema::PROFILE_STORE, &value) {
            warn!(error = %e, "profile store invalid, starting empty");
            return ProfileStore::default();
        }
        match serde_json::from_value(value) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "profile store undeserializable, starting empty");
                ProfileStore::default()
            }
        }
    }

    /// Validate and persist the whole store
    pub fn save_store(&self, store: &ProfileStore) -> ConfigResult<()> {
        let value =
            serde_json::to_value(store).map_err(|e| ConfigError::Internal(e.to_string()))?;
        self.schemas.validate(schema::PROFILE_STORE, &value)?;
        let payload = serde_json::to_string_pretty(&value)
            .map_err(|e| ConfigError::Internal(e.to_string()))?;
        self.kv.set(STORE_KEY, &payload)
    }

    /// The live non-managed inventory with a definite enabled state
    fn snapshot(&self) -> Vec<NormalizedTool> {
        self.service
            .read_inventory(self.adapter)
            .into_iter()
            .filter(|t| t.scope != ToolScope::Managed)
            .filter(|t| matches!(t.status, ToolStatus::Enabled | ToolStatus::Disabled))
            .collect()
    }

    /// Create a profile snapshotting the current inventory
    pub fn create_profile(&self, name: &str) -> ConfigResult<Profile> {
        validate_name(name)?;
        let mut store = self.load_store();
        if store.find_by_name(name).is_some() {
            return Err(ConfigError::InvalidName(format!(
                "profile '{name}' already exists"
            )));
        }

        let mut profile = Profile::new(name);
        profile.tools = self
            .snapshot()
            .iter()
            .map(|t| ProfileToolEntry {
                key: t.canonical_key(),
                enabled: t.status.is_enabled(),
            })
            .collect();
        profile.tools.sort_by(|a, b| a.key.cmp(&b.key));

        store.profiles.push(profile.clone());
        self.save_store(&store)?;
        info!(name, tools = profile.tools.len(), "created profile");
        Ok(profile)
    }

    /// Rename a profile and/or replace its tool list
    pub fn update_profile(
        &self,
        id: Uuid,
        rename: Option<&str>,
        tools: Option<Vec<ProfileToolEntry>>,
    ) -> ConfigResult<Profile> {
        let mut store = self.load_store();
        let profile = store
            .find_mut(id)
            .ok_or_else(|| ConfigError::ProfileNotFound { id: id.to_string() })?;

        if let Some(name) = rename {
            validate_name(name)?;
            profile.name = name.to_string();
        }
        if let Some(tools) = tools {
            profile.tools = tools;
        }
        profile.touch();
        let updated = profile.clone();
        self.save_store(&store)?;
        Ok(updated)
    }

    /// Delete a profile; deleting the active one clears the active pointer
    pub fn delete_profile(&self, id: Uuid) -> ConfigResult<()> {
        let mut store = self.load_store();
        let before = store.profiles.len();
        store.profiles.retain(|p| p.id != id);
        if store.profiles.len() == before {
            return Err(ConfigError::ProfileNotFound { id: id.to_string() });
        }
        if store.active_profile_id == Some(id) {
            store.active_profile_id = None;
        }
        self.save_store(&store)
    }

    /// Apply a profile, or deactivate with `None`
    ///
    /// The plan contains only real deltas, so re-running a partially
    /// applied switch is idempotent. Toggles execute strictly sequentially;
    /// shared-file read-modify-write cycles must not interleave. One
    /// failure never aborts the rest. The active pointer is persisted only
    /// after every toggle has been attempted.
    pub fn switch_profile(&self, id: Option<Uuid>) -> ConfigResult<SwitchReport> {
        let mut store = self.load_store();

        let Some(id) = id else {
            store.active_profile_id = None;
            self.save_store(&store)?;
            return Ok(SwitchReport::default());
        };

        let profile = store
            .find(id)
            .ok_or_else(|| ConfigError::ProfileNotFound { id: id.to_string() })?
            .clone();

        let inventory = self.snapshot();
        let index: HashMap<String, &NormalizedTool> = inventory
            .iter()
            .map(|t| (t.canonical_key(), t))
            .collect();
        let member_keys: HashSet<&str> =
            profile.tools.iter().map(|e| e.key.as_str()).collect();

        let mut report = SwitchReport::default();
        let mut plan: Vec<(&NormalizedTool, bool)> = Vec::new();

        for entry in &profile.tools {
            match index.get(&entry.key) {
                None => report.skipped += 1,
                Some(tool) if tool.status.is_enabled() == entry.enabled => {}
                Some(tool) => plan.push((*tool, entry.enabled)),
            }
        }
        // Closed set: live enabled tools outside the profile get disabled
        for tool in &inventory {
            if tool.status.is_enabled() && !member_keys.contains(tool.canonical_key().as_str()) {
                plan.push((tool, false));
            }
        }

        let manager = ToolManager::new(self.service, self.adapter);
        for (tool, enable) in plan {
            let result = manager.toggle_tool(tool, enable);
            if result.success {
                report.toggled += 1;
            } else {
                report.failed += 1;
                if let Some(error) = result.error {
                    report.errors.push(format!("{}: {error}", tool.display_name()));
                }
            }
        }

        store.active_profile_id = Some(id);
        self.save_store(&store)?;
        info!(
            profile = %profile.name,
            toggled = report.toggled,
            skipped = report.skipped,
            failed = report.failed,
            "switched profile"
        );
        Ok(report)
    }

    /// Drop profile entries whose tool no longer exists
    ///
    /// Persists only when something was actually removed.
    pub fn reconcile_profile(&self, id: Uuid) -> ConfigResult<ReconcileReport> {
        let mut store = self.load_store();
        let live_keys: HashSet<String> = self
            .snapshot()
            .iter()
            .map(NormalizedTool::canonical_key)
            .collect();

        let profile = store
            .find_mut(id)
            .ok_or_else(|| ConfigError::ProfileNotFound { id: id.to_string() })?;
        let before = profile.tools.len();
        profile.tools.retain(|e| live_keys.contains(&e.key));
        let valid = profile.tools.len();
        let removed = before - valid;
        if removed > 0 {
            profile.touch();
        }

        if removed > 0 {
            self.save_store(&store)?;
        }
        Ok(ReconcileReport { valid, removed })
    }

    /// Export a profile as a self-contained bundle
    ///
    /// Entries whose live tool has vanished are silently dropped.
    pub fn export_profile(&self, id: Uuid) -> ConfigResult<ProfileBundle> {
        let store = self.load_store();
        let profile = store
            .find(id)
            .ok_or_else(|| ConfigError::ProfileNotFound { id: id.to_string() })?;

        let inventory = self.snapshot();
        let index: HashMap<String, &NormalizedTool> = inventory
            .iter()
            .map(|t| (t.canonical_key(), t))
            .collect();

        let mut tools = Vec::new();
        for entry in &profile.tools {
            let Some(tool) = index.get(&entry.key) else {
                continue;
            };
            let config = serde_json::to_value(&tool.metadata)
                .map_err(|e| ConfigError::Internal(e.to_string()))?;
            tools.push(BundleTool {
                key: entry.key.clone(),
                kind: tool.kind,
                enabled: entry.enabled,
                config,
            });
        }

        Ok(ProfileBundle {
            bundle_type: BUNDLE_TYPE.into(),
            version: BUNDLE_VERSION,
            profile: BundleProfile {
                name: profile.name.clone(),
                exported_at: Utc::now(),
            },
            tools,
        })
    }

    /// Classify every bundle entry against the live inventory
    pub fn analyze_import(&self, bundle: &ProfileBundle) -> ConfigResult<ImportAnalysis> {
        if bundle.bundle_type != BUNDLE_TYPE {
            return Err(ConfigError::ValidationFailed {
                schema: schema::PROFILE_BUNDLE.to_string(),
                detail: format!("unknown bundle_type '{}'", bundle.bundle_type),
            });
        }
        if bundle.version != BUNDLE_VERSION {
            return Err(ConfigError::UnsupportedBundleVersion(bundle.version));
        }

        let inventory = self.snapshot();
        let index: HashMap<String, &NormalizedTool> = inventory
            .iter()
            .map(|t| (t.canonical_key(), t))
            .collect();

        let mut analysis = ImportAnalysis::default();
        for tool in &bundle.tools {
            let disposition = match index.get(&tool.key) {
                None => ImportDisposition::Missing,
                Some(live) => match tool.metadata() {
                    Some(imported) if metadata_equivalent(&imported, &live.metadata) => {
                        ImportDisposition::Matching
                    }
                    _ => ImportDisposition::Conflicting,
                },
            };
            analysis.items.push(ImportItem {
                key: tool.key.clone(),
                disposition,
            });
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterEnv, ClaudeAdapter};
    use crate::profile::store::JsonFileStore;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        adapter: ClaudeAdapter,
        service: ConfigService,
        kv: JsonFileStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let env = AdapterEnv::new(dir.path().to_path_buf())
            .with_managed_root(dir.path().join("managed"));
        let kv = JsonFileStore::new(dir.path().join("store.json"));
        Fixture {
            adapter: ClaudeAdapter::new(env),
            service: ConfigService::new(dir.path().join("backups")),
            kv,
            _dir: dir,
        }
    }

    impl Fixture {
        fn engine(&self) -> ProfileEngine<'_> {
            ProfileEngine::new(&self.service, &self.adapter, &self.kv)
        }
    }

    #[test]
    fn test_load_store_fails_closed_on_corruption() {
        let fx = fixture();
        fs::write(fx._dir.path().join("store.json"), "{broken").unwrap();
        let store = fx.engine().load_store();
        assert!(store.profiles.is_empty());
        assert!(store.active_profile_id.is_none());
    }

    #[test]
    fn test_create_rejects_duplicate_name() {
        let fx = fixture();
        let engine = fx.engine();
        engine.create_profile("dev").unwrap();
        assert!(engine.create_profile("dev").is_err());
    }

    #[test]
    fn test_delete_active_profile_clears_pointer() {
        let fx = fixture();
        let engine = fx.engine();
        let profile = engine.create_profile("dev").unwrap();
        engine.switch_profile(Some(profile.id)).unwrap();
        assert_eq!(engine.load_store().active_profile_id, Some(profile.id));

        engine.delete_profile(profile.id).unwrap();
        assert_eq!(engine.load_store().active_profile_id, None);
    }

    #[test]
    fn test_switch_none_deactivates_without_mutations() {
        let fx = fixture();
        let engine = fx.engine();
        let profile = engine.create_profile("dev").unwrap();
        engine.switch_profile(Some(profile.id)).unwrap();

        let report = engine.switch_profile(None).unwrap();
        assert_eq!(report.toggled, 0);
        assert_eq!(engine.load_store().active_profile_id, None);
    }

    #[test]
    fn test_switch_unknown_id_fails_whole() {
        let fx = fixture();
        let result = fx.engine().switch_profile(Some(Uuid::new_v4()));
        assert!(matches!(result, Err(ConfigError::ProfileNotFound { .. })));
    }
}
