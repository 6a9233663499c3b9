use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::dto::settings::SettingDto;
use crate::application::use_cases::settings::delete_setting::DeleteSetting;
use crate::application::use_cases::settings::get_setting::GetSetting;
use crate::application::use_cases::settings::list_settings::ListSettings;
use crate::application::use_cases::settings::put_setting::PutSetting;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::error::{ApiError, ErrorBody};
use crate::presentation::http::extract::{ApiJson, ApiPath};

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:-]{1,128}$").unwrap());

#[derive(Debug, Serialize, ToSchema)]
pub struct Setting {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SettingDto> for Setting {
    fn from(d: SettingDto) -> Self {
        Setting {
            key: d.key,
            value: d.value,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PutSettingRequest {
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

fn validate_key(key: &str) -> Result<(), ApiError> {
    if KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid setting key: {}", key)))
    }
}

#[utoipa::path(get, path = "/api/settings", tag = "Settings",
    responses((status = 200, body = [Setting])))]
pub async fn list_settings(State(ctx): State<AppContext>) -> Result<Json<Vec<Setting>>, ApiError> {
    let repo = ctx.settings_repo();
    let uc = ListSettings {
        repo: repo.as_ref(),
    };
    let items = uc.execute().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/api/settings/{key}", tag = "Settings",
    params(("key" = String, Path, description = "Setting key")),
    responses((status = 200, body = Setting), (status = 404, body = ErrorBody)))]
pub async fn get_setting(
    State(ctx): State<AppContext>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<Setting>, ApiError> {
    validate_key(&key)?;
    let repo = ctx.settings_repo();
    let uc = GetSetting {
        repo: repo.as_ref(),
    };
    match uc.execute(&key).await? {
        Some(item) => Ok(Json(item.into())),
        None => Err(ApiError::NotFound(format!("setting not found: {}", key))),
    }
}

#[utoipa::path(put, path = "/api/settings/{key}", tag = "Settings", request_body = PutSettingRequest,
    params(("key" = String, Path, description = "Setting key")),
    responses((status = 200, body = Setting), (status = 400, body = ErrorBody)))]
pub async fn put_setting(
    State(ctx): State<AppContext>,
    ApiPath(key): ApiPath<String>,
    ApiJson(req): ApiJson<PutSettingRequest>,
) -> Result<Json<Setting>, ApiError> {
    validate_key(&key)?;
    let repo = ctx.settings_repo();
    let uc = PutSetting {
        repo: repo.as_ref(),
    };
    let item = uc.execute(&key, req.value).await?;
    tracing::debug!(key = %key, "setting_saved");
    Ok(Json(item.into()))
}

#[utoipa::path(delete, path = "/api/settings/{key}", tag = "Settings",
    params(("key" = String, Path, description = "Setting key")),
    responses((status = 204, description = "Deleted or absent")))]
pub async fn delete_setting(
    State(ctx): State<AppContext>,
    ApiPath(key): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    validate_key(&key)?;
    let repo = ctx.settings_repo();
    let uc = DeleteSetting {
        repo: repo.as_ref(),
    };
    if uc.execute(&key).await? {
        tracing::debug!(key = %key, "setting_deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/settings", get(list_settings))
        .route(
            "/settings/:key",
            get(get_setting).put(put_setting).delete(delete_setting),
        )
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::validate_key;

    #[test]
    fn keys_are_restricted_to_a_safe_alphabet() {
        assert!(validate_key("ui.theme").is_ok());
        assert!(validate_key("ai:openai_api-key").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("has space").is_err());
        assert!(validate_key(&"k".repeat(129)).is_err());
    }
}
