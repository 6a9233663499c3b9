pub mod node_repository_sqlx;
pub mod settings_repository_sqlx;
