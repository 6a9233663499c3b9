/// Setting row with its value decrypted back to serialised JSON text.
#[derive(Debug, Clone)]
pub struct StoredSetting {
    pub key: String,
    pub value: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
