pub mod delete_setting;
pub mod get_setting;
pub mod list_settings;
pub mod put_setting;

use crate::application::dto::settings::SettingDto;
use crate::domain::settings::setting::StoredSetting;

// Rows written before encryption was enabled hold raw text; those come back as
// JSON when they parse and as a JSON string otherwise.
pub(crate) fn decode_row(row: StoredSetting) -> SettingDto {
    let value = serde_json::from_str(&row.value)
        .unwrap_or_else(|_| serde_json::Value::String(row.value.clone()));
    SettingDto {
        key: row.key,
        value,
        updated_at: row.updated_at,
    }
}
