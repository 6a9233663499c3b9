pub mod node_repository;
pub mod settings_repository;
