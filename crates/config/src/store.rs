//! Settings access.

use std::sync::RwLock;

use crate::settings::{AutomationSettings, FollowUpSettings};

/// Source of settings snapshots.
///
/// Each call returns an immutable snapshot; consumers never observe a
/// half-updated configuration. Refresh is caller-controlled; implementations
/// must not hide a TTL cache behind this trait.
pub trait ConfigStore: Send + Sync {
    fn automation_settings(&self) -> AutomationSettings;
    fn follow_up_settings(&self) -> FollowUpSettings;
}

/// Snapshot-holding store for tests and single-process deployments.
///
/// The surrounding application replaces snapshots when its source of truth
/// (admin UI, settings table) changes.
#[derive(Debug, Default)]
pub struct StaticConfigStore {
    automation: RwLock<AutomationSettings>,
    follow_up: RwLock<FollowUpSettings>,
}

impl StaticConfigStore {
    pub fn new(automation: AutomationSettings, follow_up: FollowUpSettings) -> Self {
        Self {
            automation: RwLock::new(automation),
            follow_up: RwLock::new(follow_up),
        }
    }

    pub fn replace_automation(&self, settings: AutomationSettings) {
        *self.automation.write().unwrap() = settings;
    }

    pub fn replace_follow_up(&self, settings: FollowUpSettings) {
        *self.follow_up.write().unwrap() = settings;
    }
}

impl ConfigStore for StaticConfigStore {
    fn automation_settings(&self) -> AutomationSettings {
        self.automation.read().unwrap().clone()
    }

    fn follow_up_settings(&self) -> FollowUpSettings {
        self.follow_up.read().unwrap().clone()
    }
}
