use serde::{Deserialize, Serialize};

use crate::services::notifier::NotificationKind;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPreferencesResponse {
    pub enabled: Vec<NotificationKind>,
}

/// Kinds to switch on or off; kinds not mentioned keep their state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotificationPreferencesRequest {
    #[serde(default)]
    pub enable: Vec<NotificationKind>,
    #[serde(default)]
    pub disable: Vec<NotificationKind>,
}
