//! DTOs for the `/api/config` endpoints.

use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `PUT /api/config`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SettingsUpdateRequest {
    /// Partial configuration, deep-merged into `settings.yaml`.
    #[schema(value_type = Object)]
    pub config: serde_json::Value,
}
