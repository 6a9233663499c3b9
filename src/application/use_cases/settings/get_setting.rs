use crate::application::dto::settings::SettingDto;
use crate::application::ports::settings_repository::SettingsRepository;

use super::decode_row;

pub struct GetSetting<'a, R: SettingsRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: SettingsRepository + ?Sized> GetSetting<'a, R> {
    pub async fn execute(&self, key: &str) -> anyhow::Result<Option<SettingDto>> {
        Ok(self.repo.get(key).await?.map(decode_row))
    }
}
