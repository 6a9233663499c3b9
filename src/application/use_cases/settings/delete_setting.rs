use crate::application::ports::settings_repository::SettingsRepository;

pub struct DeleteSetting<'a, R: SettingsRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: SettingsRepository + ?Sized> DeleteSetting<'a, R> {
    pub async fn execute(&self, key: &str) -> anyhow::Result<bool> {
        self.repo.delete(key).await
    }
}
