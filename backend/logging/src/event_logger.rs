//! Boot Event Logger
//!
//! Structured bootstrap events (registrations, installs, transitions, mount,
//! failure) emitted on the `boot_events` tracing target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

pub const BOOT_EVENTS_TARGET: &str = "boot_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BootEvent {
    ModuleRegistered { surface: String, name: String },
    PluginInstalled { name: String },
    ExtensionAttached { name: String },
    StateChanged { from: String, to: String },
    Mounted { app_id: String, target: String },
    Failed { at: String, error: String },
}

impl BootEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, BootEvent::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct BootLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: BootEvent,
}

impl BootLogEntry {
    pub fn new(event: BootEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

pub struct BootEventLogger;

impl BootEventLogger {
    /// Log a bootstrap event as one JSON line on the `boot_events` target.
    pub fn log(event: BootEvent) -> BootLogEntry {
        let entry = BootLogEntry::new(event);
        if entry.event.is_failure() {
            error!(target: BOOT_EVENTS_TARGET, entry = %entry.to_json(), "Boot event");
        } else {
            info!(target: BOOT_EVENTS_TARGET, entry = %entry.to_json(), "Boot event");
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Records the target of every event it sees.
    struct TargetRecorder(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for TargetRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(event.metadata().target().to_string());
        }
    }

    #[test]
    fn test_events_use_boot_events_target() {
        let targets = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(TargetRecorder(targets.clone()));

        tracing::subscriber::with_default(subscriber, || {
            BootEventLogger::log(BootEvent::PluginInstalled { name: "x".into() });
            BootEventLogger::log(BootEvent::Failed {
                at: "installing".into(),
                error: "boom".into(),
            });
        });

        let targets = targets.lock().unwrap();
        assert_eq!(*targets, vec![BOOT_EVENTS_TARGET, BOOT_EVENTS_TARGET]);
    }

    #[test]
    fn test_entry_serializes_tagged() {
        let entry = BootEventLogger::log(BootEvent::PluginInstalled {
            name: "context-menu".into(),
        });
        let json: serde_json::Value = serde_json::from_str(&entry.to_json()).unwrap();
        assert_eq!(json["event"]["type"], "plugin_installed");
        assert_eq!(json["event"]["name"], "context-menu");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_failure_flag() {
        let failed = BootEvent::Failed {
            at: "unstarted".into(),
            error: "plugin already installed: context-menu".into(),
        };
        assert!(failed.is_failure());
        assert!(!BootEvent::ExtensionAttached { name: "x".into() }.is_failure());
    }
}
