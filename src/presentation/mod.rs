// Presentation layer - HTTP routes over the application services
pub mod app_state;
pub mod error;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(health_check))
        .route("/config", get(get_config))
        .route("/filters", get(get_filters).patch(update_filters))
        .route("/filters/zone-group", post(select_zone_group))
        .route("/filters/corridor", post(select_corridor))
        .route("/filters/apply", post(apply_filters))
        .route("/filters/reset", post(reset_filters))
        .route("/filters/defaults", post(save_defaults))
        .route("/views/dashboard", get(dashboard_view))
        .route("/views/operations/:metric", get(operations_view))
        .route("/views/maintenance/:metric", get(maintenance_view))
        .route("/views/health/:category", get(health_view))
        .route("/views/summary-trend", get(summary_trend_view))
        .route("/views/map/:metric", get(map_view))
        .route("/views/signals", get(signals_view))
        .route("/views/signals/export", get(export_signals));

    // Unknown paths fall through to the front end so client-side routes load.
    if let Some(dir) = &state.settings.server.static_dir {
        let index = Path::new(dir).join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::FakeRepository;
    use crate::application::filter_defaults::MemoryDefaultsStore;
    use crate::application::metrics_repository::OptionList;
    use crate::domain::metric::StraightAverage;
    use crate::domain::signal::Signal;
    use crate::infrastructure::config::{
        ApiSettings, AppSettings, FeatureFlags, FilterSettings, Goals, MapSettings, ServerSettings,
    };
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn settings() -> AppSettings {
        AppSettings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                static_dir: None,
            },
            api: ApiSettings {
                base_url: "http://localhost".to_string(),
                timeout_secs: None,
            },
            map: MapSettings {
                center_lat: 33.757776,
                center_lon: -84.391578,
                default_zoom: 12.0,
            },
            filters: FilterSettings::default(),
            features: FeatureFlags::default(),
            goals: Goals::default(),
        }
    }

    fn app(repo: FakeRepository) -> (Arc<FakeRepository>, Router) {
        app_with(repo, settings())
    }

    fn app_with(repo: FakeRepository, settings: AppSettings) -> (Arc<FakeRepository>, Router) {
        let repo = Arc::new(repo);
        let state = AppState::new(settings, repo.clone(), Arc::new(MemoryDefaultsStore::default()));
        (repo, build_router(Arc::new(state)))
    }

    async fn get_text(app: &Router, uri: &str) -> (StatusCode, String, Option<String>) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_healthz() {
        let (_repo, app) = app(FakeRepository::default());
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_first_filter_read_loads_options() {
        let mut repo = FakeRepository::default();
        repo.options
            .insert(OptionList::ZoneGroups, vec!["Central Metro".to_string(), "North".to_string()]);
        let (repo, app) = app(repo);

        let (status, json) = send(&app, Method::GET, "/filters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["options"]["zoneGroups"][1], "North");
        assert_eq!(json["state"], "ready");

        send(&app, Method::GET, "/filters", None).await;
        assert_eq!(repo.calls_to("options").len(), 8);
    }

    #[tokio::test]
    async fn test_views_use_applied_filter_only() {
        let (repo, app) = app(FakeRepository::default());

        let (status, _) = send(
            &app,
            Method::POST,
            "/filters/zone-group",
            Some(serde_json::json!({"value": "North"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Pending selection: views still query with the applied filter.
        send(&app, Method::GET, "/views/summary-trend", None).await;
        assert_eq!(
            repo.zone_groups_sent("summarytrends"),
            vec![Some("Central Metro".to_string())]
        );

        let (_, applied) = send(&app, Method::POST, "/filters/apply", None).await;
        assert_eq!(applied["appliedGeneration"], 1);
        assert_eq!(applied["filter"]["zone_Group"], "North");
        assert_eq!(repo.calls_to("corridorsbyfilter").len(), 1);

        send(&app, Method::GET, "/views/summary-trend", None).await;
        assert_eq!(
            repo.zone_groups_sent("summarytrends"),
            vec![Some("Central Metro".to_string()), Some("North".to_string())]
        );
    }

    #[tokio::test]
    async fn test_dashboard_reports_failed_kpis() {
        let mut repo = FakeRepository::default().fail("straightaverage:tp");
        repo.straight_averages.insert(
            "aogd".to_string(),
            StraightAverage { avg: Some(0.5), delta: None },
        );
        let (_repo, app) = app(repo);

        let (status, json) = send(&app, Method::GET, "/views/dashboard?map_metric=throughput", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["kind"], "dashboard");
        assert_eq!(json["data"]["performance"][0]["value"], "N/A");
        assert_eq!(json["data"]["performance"][1]["value"], "50.0");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_metric_is_not_found() {
        let (_repo, app) = app(FakeRepository::default());

        let (status, json) = send(&app, Method::GET, "/views/operations/detectorUptime", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");

        let (status, _) = send(&app, Method::GET, "/views/maintenance/detectorUptime", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_view_validates_input() {
        let (_repo, app) = app(FakeRepository::default());

        let (status, _) = send(&app, Method::GET, "/views/health/watchdog", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/views/health/safety?month=May", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(&app, Method::GET, "/views/health/safety?month=2025-04", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["month"], "2025-04");
        assert_eq!(json["data"]["category"], "safety");
    }

    #[tokio::test]
    async fn test_failed_map_is_flagged_fallback() {
        let (_repo, app) = app(FakeRepository::default().fail("signals"));

        let (status, json) = send(&app, Method::GET, "/views/map/cctvUptime", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["data"]["source"], "fallback");
    }

    #[tokio::test]
    async fn test_patch_then_reset() {
        let (_repo, app) = app(FakeRepository::default());

        let (_, patched) = send(
            &app,
            Method::PATCH,
            "/filters",
            Some(serde_json::json!({"dateRange": 0, "signalId": "1001"})),
        )
        .await;
        assert_eq!(patched["filter"]["dateRange"], 0);
        assert_eq!(patched["filter"]["signalId"], "1001");
        assert_eq!(patched["isFiltering"], true);

        let (_, cleared) = send(
            &app,
            Method::PATCH,
            "/filters",
            Some(serde_json::json!({"signalId": null})),
        )
        .await;
        assert!(cleared["filter"]["signalId"].is_null());
        assert_eq!(cleared["filter"]["dateRange"], 0);

        let (status, reset) = send(&app, Method::POST, "/filters/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reset["filter"]["dateRange"], 4);
        assert!(reset["filter"]["signalId"].is_null());
    }

    #[tokio::test]
    async fn test_config_exposes_goals_and_flags() {
        let (_repo, app) = app(FakeRepository::default());

        let (_, json) = send(&app, Method::GET, "/config", None).await;
        assert_eq!(json["goals"]["tti"], 1.2);
        assert_eq!(json["features"]["has_page_reports"], false);
        assert_eq!(json["operationsMetrics"][1], "throughput");
    }

    #[tokio::test]
    async fn test_signal_inventory_table_and_export() {
        let mut repo = FakeRepository::default();
        let mut peachtree = Signal::new("1001", 33.8, -84.4);
        peachtree.corridor = Some("SR-9".to_string());
        let mut other = Signal::new("2002", 33.9, -84.3);
        other.corridor = Some("US-41".to_string());
        repo.signals = vec![peachtree, other];
        let (_repo, app) = app(repo);

        let (status, json) = send(&app, Method::GET, "/views/signals?corridor=sr-9&per_page=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["kind"], "signals");
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["per_page"], 5);
        assert_eq!(json["data"]["rows"][0]["signalID"], "1001");

        let (status, body, content_type) = get_text(&app, "/views/signals/export?signalId=2002").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/csv; charset=utf-8"));
        assert_eq!(body.lines().count(), 2);
        assert!(body.lines().nth(1).unwrap().starts_with("2002,"));
    }

    #[tokio::test]
    async fn test_export_without_inventory_is_bad_gateway() {
        let (_repo, app) = app(FakeRepository::default().fail("signals"));

        let (status, json) = send(&app, Method::GET, "/views/signals/export", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], "BAD_GATEWAY");

        let (status, json) = send(&app, Method::GET, "/views/signals", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "fallback");
    }

    #[tokio::test]
    async fn test_front_end_is_served_with_client_route_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>sigops</html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets").join("app.js"), "console.log(1)").unwrap();

        let mut settings = settings();
        settings.server.static_dir = Some(dir.path().to_str().unwrap().to_string());
        let (_repo, app) = app_with(FakeRepository::default(), settings);

        let (status, body, content_type) = get_text(&app, "/assets/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1)");
        assert!(content_type.unwrap().contains("javascript"));

        let (status, body, _) = get_text(&app, "/operations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html>sigops</html>");

        let (status, body, _) = get_text(&app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_api_only_without_static_dir() {
        let (_repo, app) = app(FakeRepository::default());
        let (status, _, _) = get_text(&app, "/operations").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
