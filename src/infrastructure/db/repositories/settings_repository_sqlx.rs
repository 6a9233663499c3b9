use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::settings_repository::SettingsRepository;
use crate::domain::settings::setting::StoredSetting;
use crate::infrastructure::crypto;
use crate::infrastructure::db::PgPool;

pub struct SqlxSettingsRepository {
    pub pool: PgPool,
    encryption_key: String,
}

impl SqlxSettingsRepository {
    pub fn new(pool: PgPool, encryption_key: impl Into<String>) -> Self {
        Self {
            pool,
            encryption_key: encryption_key.into(),
        }
    }

    fn map_setting(&self, r: PgRow) -> anyhow::Result<StoredSetting> {
        let raw: String = r.get("value");
        Ok(StoredSetting {
            key: r.get("key"),
            value: crypto::decrypt_string(&self.encryption_key, &raw)?,
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        })
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self, key: &str) -> anyhow::Result<Option<StoredSetting>> {
        let row = sqlx::query(
            "SELECT key, value, created_at, updated_at FROM settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| self.map_setting(r)).transpose()
    }

    async fn list(&self) -> anyhow::Result<Vec<StoredSetting>> {
        let rows =
            sqlx::query("SELECT key, value, created_at, updated_at FROM settings ORDER BY key ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(|r| self.map_setting(r)).collect()
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<StoredSetting> {
        let enc_value = crypto::encrypt_string(&self.encryption_key, value)?;
        let row = sqlx::query(
            r#"INSERT INTO settings (key, value) VALUES ($1, $2)
               ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
               RETURNING key, value, created_at, updated_at"#,
        )
        .bind(key)
        .bind(&enc_value)
        .fetch_one(&self.pool)
        .await?;
        self.map_setting(row)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
