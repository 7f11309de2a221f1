// SigOps metrics API client - reqwest implementation of MetricsRepository
use crate::application::metrics_repository::{HealthQuery, MetricsRepository, OptionList};
use crate::domain::filter::{CorridorQuery, FilterState};
use crate::domain::metric::{HealthMetricRow, MetricRecord, StraightAverage, SummaryTrends, TimeSeriesRow};
use crate::domain::signal::Signal;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use urlencoding::encode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode { url: String, source: reqwest::Error },
}

#[derive(Debug, Clone)]
pub struct MetricsApi {
    base_url: String,
    client: reqwest::Client,
}

impl MetricsApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let request = self.client.get(&url).header("Accept", "application/json");
        Self::execute(url, request).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &FilterState,
    ) -> std::result::Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let request = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&filter.to_request());
        Self::execute(url, request).await
    }

    async fn execute<T: DeserializeOwned>(
        url: String,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return Err(ApiError::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { url, status, body });
        }

        match response.json::<T>().await {
            Ok(data) => Ok(data),
            Err(source) => Err(ApiError::Decode { url, source }),
        }
    }
}

fn metric_path(endpoint: &str, source: &str, measure: &str) -> String {
    format!(
        "/metrics/{}?source={}&measure={}",
        endpoint,
        encode(source),
        encode(measure)
    )
}

#[async_trait]
impl MetricsRepository for MetricsApi {
    async fn list_signals(&self) -> Result<Vec<Signal>> {
        Ok(self
            .get("/signals/all")
            .await
            .context("Failed to load signal inventory")?)
    }

    async fn list_options(&self, list: OptionList) -> Result<Vec<String>> {
        Ok(self
            .get(&format!("/signals/{}", list.path()))
            .await
            .with_context(|| format!("Failed to load {}", list.path()))?)
    }

    async fn zones_by_zone_group(&self, zone_group: &str) -> Result<Vec<String>> {
        Ok(self
            .get(&format!("/signals/zonesbyzonegroup/{}", encode(zone_group)))
            .await
            .with_context(|| format!("Failed to load zones for {}", zone_group))?)
    }

    async fn corridors_by_filter(&self, query: &CorridorQuery) -> Result<Vec<String>> {
        Ok(self
            .get(&format!("/signals/corridorsbyfilter?{}", query.to_query_string()))
            .await
            .context("Failed to load corridors")?)
    }

    async fn subcorridors_by_corridor(&self, corridor: &str) -> Result<Vec<String>> {
        Ok(self
            .get(&format!("/signals/subcorridorsbycorridor/{}", encode(corridor)))
            .await
            .with_context(|| format!("Failed to load subcorridors for {}", corridor))?)
    }

    async fn metrics_filter(
        &self,
        source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> Result<Vec<TimeSeriesRow>> {
        Ok(self
            .post(&metric_path("filter", source, measure), filter)
            .await
            .with_context(|| format!("Failed to load {} time series", measure))?)
    }

    async fn metrics_average(
        &self,
        source: &str,
        measure: &str,
        dashboard: bool,
        filter: &FilterState,
    ) -> Result<Vec<MetricRecord>> {
        let path = format!("{}&dashboard={}", metric_path("average", source, measure), dashboard);
        Ok(self
            .post(&path, filter)
            .await
            .with_context(|| format!("Failed to load {} averages", measure))?)
    }

    async fn straight_average(
        &self,
        source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> Result<StraightAverage> {
        Ok(self
            .post(&metric_path("straightaverage", source, measure), filter)
            .await
            .with_context(|| format!("Failed to load {} straight average", measure))?)
    }

    async fn signals_filter_average(
        &self,
        source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> Result<Vec<MetricRecord>> {
        Ok(self
            .post(&metric_path("signals/filter/average", source, measure), filter)
            .await
            .with_context(|| format!("Failed to load {} per-signal averages", measure))?)
    }

    async fn summary_trends(&self, filter: &FilterState) -> Result<SummaryTrends> {
        Ok(self
            .post("/metrics/summarytrends?source=main", filter)
            .await
            .context("Failed to load summary trends")?)
    }

    async fn month_averages(&self, zone_group: &str, month: &str) -> Result<Vec<f64>> {
        let path = format!(
            "/metrics/monthaverages?zoneGroup={}&month={}",
            encode(zone_group),
            encode(month)
        );
        Ok(self
            .get(&path)
            .await
            .with_context(|| format!("Failed to load month averages for {}", zone_group))?)
    }

    async fn health_metrics(&self, query: &HealthQuery) -> Result<Vec<HealthMetricRow>> {
        let path = format!(
            "/metrics?source={}&level={}&interval={}&measure={}&start={}&end={}",
            encode(&query.source),
            encode(&query.level),
            encode(&query.interval),
            encode(&query.measure),
            encode(&query.start),
            encode(&query.end)
        );
        Ok(self
            .get(&path)
            .await
            .with_context(|| format!("Failed to load {} health metrics", query.measure))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serves `router` on an ephemeral port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_metric_path_encodes_values() {
        assert_eq!(
            metric_path("straightaverage", "main", "tp"),
            "/metrics/straightaverage?source=main&measure=tp"
        );
        assert_eq!(
            metric_path("filter", "main", "a b"),
            "/metrics/filter?source=main&measure=a%20b"
        );
    }

    #[tokio::test]
    async fn test_list_signals_and_zone_path() {
        let router = Router::new()
            .route(
                "/signals/all",
                get(|| async {
                    Json(serde_json::json!([
                        {"signalID": 1001, "latitude": "33.8", "longitude": -84.4},
                    ]))
                }),
            )
            .route(
                "/signals/zonesbyzonegroup/:group",
                get(|Path(group): Path<String>| async move { Json(vec![format!("{} zone", group)]) }),
            );
        let api = MetricsApi::new(&serve(router).await, None).unwrap();

        let signals = api.list_signals().await.unwrap();
        assert_eq!(signals[0].signal_id, "1001");
        assert_eq!(signals[0].latitude, Some(33.8));

        let zones = api.zones_by_zone_group("Central Metro").await.unwrap();
        assert_eq!(zones, vec!["Central Metro zone".to_string()]);
    }

    #[tokio::test]
    async fn test_post_sends_request_payload() {
        let seen: Arc<Mutex<Option<(HashMap<String, String>, serde_json::Value)>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/metrics/straightaverage",
            post(
                move |Query(params): Query<HashMap<String, String>>, Json(body): Json<serde_json::Value>| {
                    let captured = captured.clone();
                    async move {
                        *captured.lock().unwrap() = Some((params, body));
                        Json(serde_json::json!({"avg": 0.5, "delta": 0.1}))
                    }
                },
            ),
        );
        let api = MetricsApi::new(&serve(router).await, None).unwrap();

        let mut filter = FilterState::default();
        filter.signal_id = Some("7021".to_string());
        let average = api.straight_average("main", "aogd", &filter).await.unwrap();
        assert_eq!(average.avg, Some(0.5));

        let (params, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(params["measure"], "aogd");
        assert_eq!(body["signalId"], "7021");
        assert!(body["zone_Group"].is_null());
    }

    #[tokio::test]
    async fn test_error_status_is_typed() {
        let router = Router::new().route(
            "/signals/zones",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let api = MetricsApi::new(&serve(router).await, None).unwrap();

        let err = api.list_options(OptionList::Zones).await.unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Status { status, body, .. }) => {
                assert_eq!(*status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_a_decode_error() {
        let router = Router::new().route("/signals/cities", get(|| async { "not json" }));
        let api = MetricsApi::new(&serve(router).await, None).unwrap();

        let err = api.list_options(OptionList::Cities).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Decode { .. })));
    }
}
