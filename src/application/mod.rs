// Application layer - Use cases over the metrics repository
pub mod dashboard_service;
#[cfg(test)]
pub mod fake_repository;
pub mod filter_cascade;
pub mod filter_defaults;
pub mod health_service;
pub mod map_bucketing;
pub mod map_service;
pub mod metric_detail_service;
pub mod metrics_repository;
pub mod signal_inventory;
pub mod summary_trend_service;
pub mod view_registry;
