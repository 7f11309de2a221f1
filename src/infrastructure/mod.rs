// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod defaults_store;
pub mod metrics_api;
