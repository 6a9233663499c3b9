// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup
// - infrastructure: Postgres/in-memory stores and crypto adapters
// - presentation: HTTP handlers and routing
// - application: node tree manager, ports and settings use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
