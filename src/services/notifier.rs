//! Notifications filtered by runtime preferences
//!
//! Callers receive an `Arc<dyn Notifier>`; the preference filter wraps the
//! delivery notifier, so turning a kind off never touches call sites.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    SaleRecorded,
    ImportCompleted,
    PriceChanged,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::LowStock,
        NotificationKind::SaleRecorded,
        NotificationKind::ImportCompleted,
        NotificationKind::PriceChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LowStock => "low_stock",
            NotificationKind::SaleRecorded => "sale_recorded",
            NotificationKind::ImportCompleted => "import_completed",
            NotificationKind::PriceChanged => "price_changed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low_stock" => Some(NotificationKind::LowStock),
            "sale_recorded" => Some(NotificationKind::SaleRecorded),
            "import_completed" => Some(NotificationKind::ImportCompleted),
            "price_changed" => Some(NotificationKind::PriceChanged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Delivers notifications to the log
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) {
        tracing::info!(
            kind = notification.kind.as_str(),
            "{}",
            notification.message
        );
    }
}

/// Set of enabled notification kinds, changeable at runtime
#[derive(Debug)]
pub struct NotificationPreferences {
    enabled: RwLock<HashSet<NotificationKind>>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self::new(NotificationKind::ALL)
    }
}

impl NotificationPreferences {
    pub fn new(enabled: impl IntoIterator<Item = NotificationKind>) -> Self {
        Self {
            enabled: RwLock::new(enabled.into_iter().collect()),
        }
    }

    /// Comma separated kinds, e.g. `low_stock,price_changed`. Unknown names are skipped.
    pub fn parse(list: &str) -> Self {
        let kinds = list.split(',').filter_map(|name| {
            let kind = NotificationKind::from_str(name);
            if kind.is_none() && !name.trim().is_empty() {
                tracing::warn!("Ignoring unknown notification kind '{}'", name.trim());
            }
            kind
        });
        Self::new(kinds)
    }

    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        self.enabled.read().contains(&kind)
    }

    pub fn set_enabled(&self, kind: NotificationKind, enabled: bool) {
        let mut set = self.enabled.write();
        if enabled {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
    }

    pub fn enabled_kinds(&self) -> Vec<NotificationKind> {
        let set = self.enabled.read();
        NotificationKind::ALL
            .into_iter()
            .filter(|k| set.contains(k))
            .collect()
    }
}

pub struct PreferenceFilteredNotifier {
    inner: Arc<dyn Notifier>,
    preferences: Arc<NotificationPreferences>,
}

impl PreferenceFilteredNotifier {
    pub fn new(inner: Arc<dyn Notifier>, preferences: Arc<NotificationPreferences>) -> Self {
        Self { inner, preferences }
    }
}

#[async_trait]
impl Notifier for PreferenceFilteredNotifier {
    async fn notify(&self, notification: Notification) {
        if self.preferences.is_enabled(notification.kind) {
            self.inner.notify(notification).await;
        } else {
            tracing::trace!("Suppressed {} notification", notification.kind.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) {
            self.sent.lock().push(notification);
        }
    }

    #[tokio::test]
    async fn test_disabled_kind_is_suppressed() {
        let recorder = Arc::new(RecordingNotifier::default());
        let preferences = Arc::new(NotificationPreferences::new([NotificationKind::LowStock]));
        let notifier = PreferenceFilteredNotifier::new(recorder.clone(), preferences.clone());

        notifier.notify(Notification::new(NotificationKind::LowStock, "Beans: 2 left")).await;
        notifier.notify(Notification::new(NotificationKind::SaleRecorded, "Sale #4")).await;
        assert_eq!(recorder.sent.lock().len(), 1);

        preferences.set_enabled(NotificationKind::SaleRecorded, true);
        preferences.set_enabled(NotificationKind::LowStock, false);
        notifier.notify(Notification::new(NotificationKind::LowStock, "Beans: 1 left")).await;
        notifier.notify(Notification::new(NotificationKind::SaleRecorded, "Sale #5")).await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].message, "Sale #5");
    }

    #[test]
    fn test_parse_preferences() {
        let preferences = NotificationPreferences::parse("low_stock, price_changed,bogus,");
        assert_eq!(
            preferences.enabled_kinds(),
            vec![NotificationKind::LowStock, NotificationKind::PriceChanged]
        );
    }

    #[test]
    fn test_default_enables_everything() {
        let preferences = NotificationPreferences::default();
        assert!(NotificationKind::ALL.iter().all(|k| preferences.is_enabled(*k)));
    }
}
