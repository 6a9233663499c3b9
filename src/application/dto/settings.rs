#[derive(Debug, Clone)]
pub struct SettingDto {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
