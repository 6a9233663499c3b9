use crate::application::dto::settings::SettingDto;
use crate::application::ports::settings_repository::SettingsRepository;

use super::decode_row;

pub struct ListSettings<'a, R: SettingsRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: SettingsRepository + ?Sized> ListSettings<'a, R> {
    pub async fn execute(&self) -> anyhow::Result<Vec<SettingDto>> {
        let rows = self.repo.list().await?;
        Ok(rows.into_iter().map(decode_row).collect())
    }
}
