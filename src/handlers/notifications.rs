use axum::{extract::State, Json};

use crate::models::notification::{NotificationPreferencesResponse, UpdateNotificationPreferencesRequest};
use crate::AppState;

/// GET /api/notifications/preferences
pub async fn get_preferences(State(state): State<AppState>) -> Json<NotificationPreferencesResponse> {
    Json(NotificationPreferencesResponse {
        enabled: state.preferences.enabled_kinds(),
    })
}

/// PUT /api/notifications/preferences
///
/// Takes effect for the next notification sent; nothing is persisted.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(payload): Json<UpdateNotificationPreferencesRequest>,
) -> Json<NotificationPreferencesResponse> {
    for kind in payload.enable {
        state.preferences.set_enabled(kind, true);
    }
    for kind in payload.disable {
        state.preferences.set_enabled(kind, false);
    }

    tracing::info!("Notification preferences now {:?}", state.preferences.enabled_kinds());

    Json(NotificationPreferencesResponse {
        enabled: state.preferences.enabled_kinds(),
    })
}
