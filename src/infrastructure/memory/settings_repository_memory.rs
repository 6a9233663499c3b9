use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::settings_repository::SettingsRepository;
use crate::domain::settings::setting::StoredSetting;
use crate::infrastructure::crypto;

/// Rows hold ciphertext, same as the Postgres table.
#[derive(Clone)]
pub struct InMemorySettingsRepository {
    rows: Arc<RwLock<BTreeMap<String, StoredSetting>>>,
    encryption_key: Arc<str>,
}

impl InMemorySettingsRepository {
    pub fn new(encryption_key: impl Into<String>) -> Self {
        let encryption_key: String = encryption_key.into();
        Self {
            rows: Arc::default(),
            encryption_key: Arc::from(encryption_key),
        }
    }

    /// The value exactly as held at rest.
    pub async fn raw_value(&self, key: &str) -> Option<String> {
        self.rows.read().await.get(key).map(|r| r.value.clone())
    }

    fn decrypted(&self, row: &StoredSetting) -> anyhow::Result<StoredSetting> {
        Ok(StoredSetting {
            value: crypto::decrypt_string(&self.encryption_key, &row.value)?,
            ..row.clone()
        })
    }

    #[cfg(test)]
    async fn insert_raw(&self, key: &str, raw: &str) {
        let now = chrono::Utc::now();
        self.rows.write().await.insert(
            key.to_string(),
            StoredSetting {
                key: key.to_string(),
                value: raw.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get(&self, key: &str) -> anyhow::Result<Option<StoredSetting>> {
        self.rows
            .read()
            .await
            .get(key)
            .map(|r| self.decrypted(r))
            .transpose()
    }

    async fn list(&self) -> anyhow::Result<Vec<StoredSetting>> {
        self.rows
            .read()
            .await
            .values()
            .map(|r| self.decrypted(r))
            .collect()
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<StoredSetting> {
        let enc_value = crypto::encrypt_string(&self.encryption_key, value)?;
        let now = chrono::Utc::now();
        let mut rows = self.rows.write().await;
        let created_at = rows.get(key).map(|r| r.created_at).unwrap_or(now);
        let row = StoredSetting {
            key: key.to_string(),
            value: enc_value,
            created_at,
            updated_at: now,
        };
        rows.insert(key.to_string(), row.clone());
        Ok(StoredSetting {
            value: value.to_string(),
            ..row
        })
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.rows.write().await.remove(key).is_some())
    }
}
