use std::time::{Duration, Instant};

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{CountryDetail, CountryRecord, CountrySort, GlobalSummary, Historical};

/// Thin typed client for the disease.sh COVID-19 endpoints.
///
/// Every call is a fresh GET; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct DiseaseClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DiseaseClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Self::with_client(http, &cfg.upstream_api_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid upstream URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("upstream URL '{base_url}' cannot be a base")));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `GET /all`
    pub async fn fetch_summary(&self) -> Result<GlobalSummary> {
        let url = self.endpoint(&["all"], &[])?;
        self.get_json(url).await
    }

    /// `GET /countries?sort=`; upstream returns the list already ordered by `sort`.
    pub async fn fetch_countries(&self, sort: CountrySort) -> Result<Vec<CountryRecord>> {
        let url = self.endpoint(&["countries"], &[("sort", sort.to_string())])?;
        self.get_json(url).await
    }

    /// `GET /countries/{name}`
    pub async fn fetch_country(&self, name: &str) -> Result<CountryDetail> {
        let url = self.endpoint(&["countries", name], &[])?;
        self.get_json(url).await
    }

    /// `GET /historical/{name}?lastdays=`
    pub async fn fetch_historical(&self, name: &str, days: u32) -> Result<Historical> {
        let url = self.endpoint(&["historical", name], &[("lastdays", days.to_string())])?;
        self.get_json(url).await
    }

    /// Append path segments (percent-encoded) and query pairs to the base URL.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Config("upstream URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            for seg in segments {
                path.push(seg.trim());
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let started = Instant::now();
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream fetch"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(upstream_message(&body).unwrap_or_else(|| url.path().to_string())));
        }
        if !status.is_success() {
            warn!("upstream {url} answered {status}");
            return Err(AppError::Upstream(match upstream_message(&body) {
                Some(m) => format!("{status}: {m}"),
                None => status.to_string(),
            }));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// The `message` field upstream puts on error bodies.
fn upstream_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChartSeries;

    fn client(base: &str) -> DiseaseClient {
        DiseaseClient::with_client(reqwest::Client::new(), base).unwrap()
    }

    #[test]
    fn endpoint_encodes_country_names() {
        let c = client("https://disease.sh/v3/covid-19");
        let url = c.endpoint(&["countries", "Côte d'Ivoire"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://disease.sh/v3/covid-19/countries/C%C3%B4te%20d'Ivoire");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_and_adds_query() {
        let c = client("http://localhost:9000/v3/covid-19/");
        let url = c
            .endpoint(&["countries"], &[("sort", CountrySort::Deaths.to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v3/covid-19/countries?sort=deaths");
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(matches!(
            DiseaseClient::with_client(reqwest::Client::new(), "mailto:someone@example.com"),
            Err(AppError::Config(_))
        ));
        assert!(DiseaseClient::with_client(reqwest::Client::new(), "not a url").is_err());
    }

    #[test]
    fn parses_summary_ignoring_extra_fields() {
        let raw = r#"{"updated":1583930096000,"cases":704753090,"todayCases":0,"deaths":7010681,"recovered":675619811,"active":22122598,"affectedCountries":231}"#;
        let s: GlobalSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(s.cases, 704_753_090);
        assert_eq!(s.deaths, 7_010_681);
        assert_eq!(s.recovered, 675_619_811);
        assert_eq!(s.updated, 1_583_930_096_000);
    }

    #[test]
    fn parses_country_list_in_upstream_order() {
        let raw = r#"[
            {"country":"USA","countryInfo":{"iso2":"US"},"cases":111820082,"deaths":1219487,"recovered":109814428,"active":786167},
            {"country":"Vietnam","countryInfo":{"iso2":"VN"},"cases":11624000,"deaths":43206,"recovered":10612675,"active":968119}
        ]"#;
        let list: Vec<CountryRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].country, "USA");
        assert_eq!(list[1].active, 968_119);
        assert_eq!(list[1].deaths, 43_206);
    }

    #[test]
    fn parses_country_detail() {
        let raw = r#"{"updated":1583930096000,"country":"Turkey","cases":17232066,"todayCases":12,"deaths":101419,"todayDeaths":1,"recovered":0,"active":17130647,"critical":0}"#;
        let d: CountryDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(d.country, "Turkey");
        assert_eq!(d.today_cases, 12);
        assert_eq!(d.today_deaths, 1);
        assert_eq!(d.recovered, 0);
    }

    #[test]
    fn timeline_keeps_upstream_date_order() {
        let raw = r#"{"country":"Vietnam","province":["mainland"],"timeline":{
            "cases":{"9/28/22":11480000,"9/29/22":11481000,"10/1/22":11482500,"10/2/22":null},
            "deaths":{"9/28/22":43100,"9/29/22":43101,"10/1/22":43103,"10/2/22":43104},
            "recovered":{"9/28/22":0}
        }}"#;
        let h: Historical = serde_json::from_str(raw).unwrap();
        let cases = h.timeline.series(ChartSeries::Cases);
        assert_eq!(cases.labels().collect::<Vec<_>>(), vec!["9/28/22", "9/29/22", "10/1/22", "10/2/22"]);
        assert_eq!(cases.last_value(), Some(0));
        assert_eq!(h.timeline.series(ChartSeries::Deaths).last_value(), Some(43_104));
    }

    #[test]
    fn upstream_error_message_extracted() {
        let body = br#"{"message":"Country not found or doesn't have any cases"}"#;
        assert_eq!(
            upstream_message(body).as_deref(),
            Some("Country not found or doesn't have any cases")
        );
        assert!(upstream_message(b"<html>").is_none());
    }

    /// Local stand-in for disease.sh answering with fixed statuses.
    async fn stub_upstream() -> String {
        use axum::{http::StatusCode, routing::get, Json, Router};
        use serde_json::json;

        let app = Router::new()
            .route(
                "/countries/:name",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"message": "Country not found or doesn't have any cases"})),
                    )
                }),
            )
            .route(
                "/countries",
                get(|| async {
                    Json(json!([{"country": "Peru", "active": 5, "recovered": 7, "deaths": 1}]))
                }),
            )
            .route("/all", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route(
                "/historical/:name",
                get(|| async {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({"message": "rate limited"})),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn upstream_404_maps_to_not_found_with_message() {
        let c = client(&stub_upstream().await);
        match c.fetch_country("Atlantis").await {
            Err(AppError::NotFound(msg)) => {
                assert_eq!(msg, "Country not found or doesn't have any cases")
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_upstream_error() {
        let c = client(&stub_upstream().await);
        match c.fetch_summary().await {
            Err(AppError::Upstream(msg)) => assert!(msg.starts_with("500"), "{msg}"),
            other => panic!("expected Upstream, got {other:?}"),
        }
        match c.fetch_historical("Peru", 30).await {
            Err(AppError::Upstream(msg)) => {
                assert!(msg.starts_with("503"), "{msg}");
                assert!(msg.ends_with("rate limited"), "{msg}");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_fetch_parses_body() {
        let c = client(&stub_upstream().await);
        let list = c.fetch_countries(CountrySort::Active).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].country, "Peru");
        assert_eq!(list[0].recovered, 7);
    }
}
