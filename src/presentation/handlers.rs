// HTTP request handlers
use crate::application::filter_cascade::{CascadeState, FilterPatch, FilterSnapshot};
use crate::application::health_service::{parse_month, previous_month};
use crate::application::signal_inventory::{Paging, SignalColumnFilters};
use crate::domain::filter::non_empty;
use crate::domain::health::HealthCategory;
use crate::domain::map::{find_range, MapRangeConfig, MAINTENANCE_METRICS, OPERATIONS_METRICS};
use crate::domain::view::{
    DashboardView, HealthView, MapView, MetricDetailView, SignalTable, SummaryTrendView, ViewKind,
    ViewState,
};
use crate::infrastructure::config::{FeatureFlags, Goals, MapSettings};
use crate::presentation::app_state::AppState;
use crate::presentation::error::{AppError, AppResult};
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_MAP_METRIC: &str = "dailyTrafficVolume";

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub features: FeatureFlags,
    pub goals: Goals,
    pub map: MapSettings,
    pub operations_metrics: &'static [&'static str],
    pub maintenance_metrics: &'static [&'static str],
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ClientConfig> {
    Json(ClientConfig {
        features: state.settings.features,
        goals: state.settings.goals,
        map: state.settings.map,
        operations_metrics: &OPERATIONS_METRICS,
        maintenance_metrics: &MAINTENANCE_METRICS,
    })
}

/// Current selections and dropdown lists. The first call populates the lists.
pub async fn get_filters(State(state): State<Arc<AppState>>) -> AppResult<Json<FilterSnapshot>> {
    {
        let cascade = state.cascade.read().await;
        if cascade.state() != CascadeState::Idle {
            return Ok(Json(cascade.snapshot()));
        }
    }

    let mut cascade = state.cascade.write().await;
    if cascade.state() == CascadeState::Idle {
        cascade.load_options().await?;
    }
    Ok(Json(cascade.snapshot()))
}

#[derive(Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub value: Option<String>,
}

pub async fn select_zone_group(
    State(state): State<Arc<AppState>>,
    Json(selection): Json<Selection>,
) -> AppResult<Json<FilterSnapshot>> {
    let mut cascade = state.cascade.write().await;
    cascade
        .select_zone_group(selection.value.as_deref().and_then(non_empty))
        .await?;
    Ok(Json(cascade.snapshot()))
}

pub async fn select_corridor(
    State(state): State<Arc<AppState>>,
    Json(selection): Json<Selection>,
) -> AppResult<Json<FilterSnapshot>> {
    let mut cascade = state.cascade.write().await;
    cascade
        .select_corridor(selection.value.as_deref().and_then(non_empty))
        .await?;
    Ok(Json(cascade.snapshot()))
}

pub async fn update_filters(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<FilterPatch>,
) -> Json<FilterSnapshot> {
    let mut cascade = state.cascade.write().await;
    cascade.update(patch);
    Json(cascade.snapshot())
}

pub async fn apply_filters(State(state): State<Arc<AppState>>) -> AppResult<Json<FilterSnapshot>> {
    let mut cascade = state.cascade.write().await;
    cascade.apply().await?;
    Ok(Json(cascade.snapshot()))
}

pub async fn reset_filters(State(state): State<Arc<AppState>>) -> AppResult<Json<FilterSnapshot>> {
    let mut cascade = state.cascade.write().await;
    cascade.reset().await?;
    Ok(Json(cascade.snapshot()))
}

pub async fn save_defaults(State(state): State<Arc<AppState>>) -> AppResult<Json<FilterSnapshot>> {
    let mut cascade = state.cascade.write().await;
    cascade.save_defaults().await?;
    Ok(Json(cascade.snapshot()))
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub map_metric: Option<String>,
}

pub async fn dashboard_view(
    Query(query): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ViewState<DashboardView>>> {
    let metric = query.map_metric.unwrap_or_else(|| DEFAULT_MAP_METRIC.to_string());
    let range = find_range(&metric).ok_or_else(|| AppError::UnknownMetric(metric.clone()))?;

    let slot = &state.views.dashboard;
    let token = slot.begin();
    let view = state
        .dashboard_service
        .get_dashboard(token, &state.applied_filter(), range)
        .await;
    Ok(Json(slot.commit(&metric, view).await))
}

fn detail_range(metric: &str, allowed: &[&str]) -> AppResult<&'static MapRangeConfig> {
    if !allowed.contains(&metric) {
        return Err(AppError::UnknownMetric(metric.to_string()));
    }
    find_range(metric).ok_or_else(|| AppError::UnknownMetric(metric.to_string()))
}

pub async fn operations_view(
    Path(metric): Path<String>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ViewState<MetricDetailView>>> {
    let range = detail_range(&metric, &OPERATIONS_METRICS)?;

    let slot = &state.views.operations;
    let token = slot.begin();
    let view = state
        .metric_detail_service
        .get_metric(ViewKind::Operations, token, range, &state.applied_filter())
        .await;
    Ok(Json(slot.commit(&metric, view).await))
}

pub async fn maintenance_view(
    Path(metric): Path<String>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ViewState<MetricDetailView>>> {
    let range = detail_range(&metric, &MAINTENANCE_METRICS)?;

    let slot = &state.views.maintenance;
    let token = slot.begin();
    let view = state
        .metric_detail_service
        .get_metric(ViewKind::Maintenance, token, range, &state.applied_filter())
        .await;
    Ok(Json(slot.commit(&metric, view).await))
}

#[derive(Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

pub async fn health_view(
    Path(category): Path<String>,
    Query(query): Query<MonthQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ViewState<HealthView>>> {
    let category = category
        .parse::<HealthCategory>()
        .map_err(AppError::BadRequest)?;
    let month = match query.month.as_deref() {
        Some(month) => parse_month(month)
            .ok_or_else(|| AppError::BadRequest(format!("invalid month {}, expected YYYY-MM", month)))?,
        None => previous_month(),
    };

    let slot = &state.views.health;
    let token = slot.begin();
    let view = state
        .health_service
        .get_health(token, category, month, &state.applied_filter())
        .await;
    let key = format!("{}@{}", category, month.format("%Y-%m"));
    Ok(Json(slot.commit(&key, view).await))
}

pub async fn summary_trend_view(State(state): State<Arc<AppState>>) -> Json<ViewState<SummaryTrendView>> {
    let slot = &state.views.summary_trend;
    let token = slot.begin();
    let view = state
        .summary_trend_service
        .get_trends(token, &state.applied_filter())
        .await;
    Json(slot.commit("all", view).await)
}

pub async fn map_view(
    Path(metric): Path<String>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ViewState<MapView>>> {
    let range = find_range(&metric).ok_or_else(|| AppError::UnknownMetric(metric.clone()))?;

    let slot = &state.views.map;
    let token = slot.begin();
    let map = state.map_service.build_map(range, &state.applied_filter()).await;
    let view = match map.error.clone() {
        Some(error) => ViewState::fallback(ViewKind::Map, token, map, error),
        None => ViewState::live(ViewKind::Map, token, map),
    };
    Ok(Json(slot.commit(&metric, view).await))
}

pub async fn signals_view(
    Query(filters): Query<SignalColumnFilters>,
    Query(paging): Query<Paging>,
    RawQuery(raw): RawQuery,
    State(state): State<Arc<AppState>>,
) -> Json<ViewState<SignalTable>> {
    let slot = &state.views.signals;
    let token = slot.begin();
    let view = state
        .signal_inventory_service
        .get_table(token, &filters, paging)
        .await;
    Json(slot.commit(raw.as_deref().unwrap_or_default(), view).await)
}

/// The filtered inventory as a CSV download.
pub async fn export_signals(
    Query(filters): Query<SignalColumnFilters>,
    State(state): State<Arc<AppState>>,
) -> AppResult<impl IntoResponse> {
    let csv = state
        .signal_inventory_service
        .export_csv(&filters)
        .await
        .map_err(|e| AppError::Upstream(format!("{:#}", e)))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"signals.csv\""),
        ],
        csv,
    ))
}
