//! `promokit-config` — automation settings snapshots.
//!
//! Settings are read-only configuration supplied by the surrounding
//! application through a [`ConfigStore`]. The store is injected into the
//! dispatcher and the follow-up scheduler explicitly; there is no
//! process-wide singleton and no hidden refresh. Callers swap snapshots
//! when their source of truth changes.

pub mod settings;
pub mod store;

pub use settings::{
    AutomationSettings, ChannelToggles, ConfigError, FollowUpRule, FollowUpSettings,
    MessageTemplate, QueueSettings,
};
pub use store::{ConfigStore, StaticConfigStore};
