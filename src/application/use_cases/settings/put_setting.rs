use crate::application::dto::settings::SettingDto;
use crate::application::ports::settings_repository::SettingsRepository;

pub struct PutSetting<'a, R: SettingsRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: SettingsRepository + ?Sized> PutSetting<'a, R> {
    pub async fn execute(&self, key: &str, value: serde_json::Value) -> anyhow::Result<SettingDto> {
        let text = serde_json::to_string(&value)?;
        let row = self.repo.put(key, &text).await?;
        Ok(SettingDto {
            key: row.key,
            value,
            updated_at: row.updated_at,
        })
    }
}
