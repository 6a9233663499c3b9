use async_trait::async_trait;

use crate::domain::settings::setting::StoredSetting;

/// Values cross this port as plaintext JSON text. Implementations keep them
/// encrypted at rest.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<StoredSetting>>;

    async fn list(&self) -> anyhow::Result<Vec<StoredSetting>>;

    // Insert or replace
    async fn put(&self, key: &str, value: &str) -> anyhow::Result<StoredSetting>;

    async fn delete(&self, key: &str) -> anyhow::Result<bool>;
}
