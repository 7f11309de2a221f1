// Domain layer - filter, metric, signal and view models
pub mod chart;
pub mod filter;
pub mod health;
pub mod map;
pub mod measure;
pub mod metric;
pub mod signal;
pub mod view;
