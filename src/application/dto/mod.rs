pub mod nodes;
pub mod settings;
