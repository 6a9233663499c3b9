// In-process stores: `STORE_BACKEND=memory` and tests
pub mod node_repository_memory;
pub mod settings_repository_memory;
