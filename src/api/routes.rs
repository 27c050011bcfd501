use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::DiseaseClient;
use crate::format::{chart_step_size, format_epoch_millis};
use crate::i18n::{Catalog, Key, Locale};
use crate::metrics::{active_count, derive, ratio_pct};
use crate::search;
use crate::types::{
    ChartSeries, CountryDetail, CountryRecord, CountrySort, DerivedPercentages, GlobalSummary,
    Historical,
};

#[derive(Clone)]
pub struct ApiState {
    pub client: DiseaseClient,
    pub catalog: Arc<Catalog>,
    pub cfg: Arc<Config>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

impl ApiState {
    pub fn new(cfg: Config, client: DiseaseClient, catalog: Catalog) -> Self {
        Self {
            client,
            catalog: Arc::new(catalog),
            cfg: Arc::new(cfg),
            health: Arc::new(HealthState::new()),
            latency: Arc::new(LatencyStats::new()),
        }
    }

    /// Run one upstream call, feeding its timing and outcome into health/latency.
    async fn observe<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let res = call.await;
        self.latency.record(started.elapsed());
        match &res {
            Ok(_) => self.health.record_success(now_ms()),
            // unknown country is the caller's fault, not an upstream outage
            Err(AppError::NotFound(_)) => self.health.record_success(now_ms()),
            Err(e) => {
                warn!("upstream call failed: {e}");
                self.health.record_failure();
            }
        }
        res
    }

    fn locale(&self, requested: Option<&str>) -> Result<Locale> {
        match requested {
            Some(code) => code
                .parse()
                .map_err(|_| AppError::BadRequest(format!("unsupported locale '{code}'"))),
            None => Ok(self.cfg.locale),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/countries", get(get_countries))
        .route("/countries/:name", get(get_country))
        .route("/countries/:name/chart", get(get_country_chart))
        .route("/translations/:locale", get(get_translations))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Deserialize)]
pub struct CountriesQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub series: Option<String>,
    pub days: Option<u32>,
    pub locale: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub pct: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub active: i64,
    pub updated: i64,
    pub updated_label: String,
    pub percentages: DerivedPercentages,
    /// Pie segments in draw order: recovered, active, deaths.
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Serialize)]
pub struct CountryDetailResponse {
    #[serde(flatten)]
    pub detail: CountryDetail,
    pub death_rate_pct: f64,
    pub recovery_rate_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub country: String,
    pub series: ChartSeries,
    pub title: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub step_size: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub upstream: String,
    pub upstream_ok: bool,
    pub last_success_ms: Option<i64>,
    pub upstream_failures: u64,
    pub locale: Locale,
}

#[derive(Debug, Serialize)]
pub struct LatencyResponse {
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub sample_count: u64,
}

// ---------------------------------------------------------------------------
// Response builders
// ---------------------------------------------------------------------------

pub fn summary_response(summary: &GlobalSummary, catalog: &Catalog, locale: Locale) -> SummaryResponse {
    let percentages = derive(summary);
    SummaryResponse {
        cases: summary.cases,
        deaths: summary.deaths,
        recovered: summary.recovered,
        active: active_count(summary),
        updated: summary.updated,
        updated_label: format_epoch_millis(summary.updated),
        percentages,
        legend: vec![
            LegendEntry {
                label: catalog.translate(Key::Recovered, locale),
                pct: percentages.recovered_pct,
            },
            LegendEntry {
                label: catalog.translate(Key::Active, locale),
                pct: percentages.active_pct,
            },
            LegendEntry {
                label: catalog.translate(Key::Death, locale),
                pct: percentages.deaths_pct,
            },
        ],
    }
}

pub fn country_detail_response(detail: CountryDetail) -> CountryDetailResponse {
    CountryDetailResponse {
        death_rate_pct: ratio_pct(detail.deaths, detail.cases),
        recovery_rate_pct: ratio_pct(detail.recovered, detail.cases),
        detail,
    }
}

pub fn chart_response(
    historical: &Historical,
    series: ChartSeries,
    catalog: &Catalog,
    locale: Locale,
) -> ChartResponse {
    let points = historical.timeline.series(series);
    let title_key = match series {
        ChartSeries::Cases => Key::NumberOfCasesChart,
        ChartSeries::Deaths => Key::NumberOfDeathChart,
    };
    ChartResponse {
        country: historical.country.clone(),
        series,
        title: catalog.translate(title_key, locale),
        labels: points.labels().map(str::to_string).collect(),
        values: points.values().collect(),
        step_size: chart_step_size(series, points.last_value()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_summary(
    State(state): State<ApiState>,
    Query(params): Query<LocaleQuery>,
) -> Result<Json<SummaryResponse>> {
    let locale = state.locale(params.locale.as_deref())?;
    let summary = state.observe(state.client.fetch_summary()).await?;
    Ok(Json(summary_response(&summary, &state.catalog, locale)))
}

async fn get_countries(
    State(state): State<ApiState>,
    Query(params): Query<CountriesQuery>,
) -> Result<Json<Vec<CountryRecord>>> {
    let sort = match params.sort.as_deref() {
        Some(s) => s.parse::<CountrySort>()?,
        None => state.cfg.country_sort,
    };
    let all = state.observe(state.client.fetch_countries(sort)).await?;
    let query = params.q.unwrap_or_default();
    Ok(Json(search::filter(&all, &query)))
}

async fn get_country(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<CountryDetailResponse>> {
    let detail = state.observe(state.client.fetch_country(&name)).await?;
    Ok(Json(country_detail_response(detail)))
}

async fn get_country_chart(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<ChartQuery>,
) -> Result<Json<ChartResponse>> {
    let locale = state.locale(params.locale.as_deref())?;
    let series = match params.series.as_deref() {
        None | Some("cases") => ChartSeries::Cases,
        Some("deaths") => ChartSeries::Deaths,
        Some(other) => return Err(AppError::BadRequest(format!("unknown series '{other}'"))),
    };
    let days = params.days.filter(|&d| d > 0).unwrap_or(state.cfg.history_days);
    let historical = state
        .observe(state.client.fetch_historical(&name, days))
        .await?;
    Ok(Json(chart_response(&historical, series, &state.catalog, locale)))
}

async fn get_translations(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> Result<Json<BTreeMap<&'static str, &'static str>>> {
    let locale = state.locale(Some(&code))?;
    Ok(Json(state.catalog.table(locale).into_iter().collect()))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        upstream: state.client.base_url().to_string(),
        upstream_ok: state.health.upstream_ok(),
        last_success_ms: state.health.last_success_ms(),
        upstream_failures: state.health.upstream_failures(),
        locale: state.cfg.locale,
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let p = state.latency.percentiles_ms();
    Json(LatencyResponse {
        p50_ms: p.map(|p| p.0),
        p95_ms: p.map(|p| p.1),
        p99_ms: p.map(|p| p.2),
        sample_count: state.latency.len(),
    })
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatedSeries, Timeline};

    #[test]
    fn summary_response_carries_derived_values() {
        let catalog = Catalog::load().unwrap();
        let summary = GlobalSummary {
            cases: 100,
            deaths: 10,
            recovered: 80,
            updated: 0,
        };
        let resp = summary_response(&summary, &catalog, Locale::EnUs);
        assert_eq!(resp.active, 10);
        assert_eq!(resp.percentages.active_pct, 10);
        assert_eq!(resp.updated_label, "1970-01-01 00:00:00 UTC");
        let legend: Vec<(&str, i64)> = resp.legend.iter().map(|l| (l.label, l.pct)).collect();
        assert_eq!(legend, vec![("Recovered", 80), ("Active", 10), ("Deaths", 10)]);
    }

    #[test]
    fn detail_rates_guard_zero_cases() {
        let resp = country_detail_response(CountryDetail {
            country: "Nowhere".to_string(),
            ..Default::default()
        });
        assert_eq!(resp.death_rate_pct, 0.0);
        assert_eq!(resp.recovery_rate_pct, 0.0);

        let resp = country_detail_response(CountryDetail {
            country: "Somewhere".to_string(),
            cases: 1_000,
            deaths: 21,
            recovered: 900,
            ..Default::default()
        });
        assert!((resp.death_rate_pct - 2.1).abs() < 1e-9);
        assert!((resp.recovery_rate_pct - 90.0).abs() < 1e-9);
    }

    #[test]
    fn detail_response_flattens_upstream_fields() {
        let resp = country_detail_response(CountryDetail {
            country: "Turkey".to_string(),
            cases: 10,
            today_cases: 2,
            ..Default::default()
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["country"], "Turkey");
        assert_eq!(json["todayCases"], 2);
        assert_eq!(json["death_rate_pct"], 0.0);
    }

    #[test]
    fn chart_response_uses_series_and_step() {
        let catalog = Catalog::load().unwrap();
        let historical = Historical {
            country: "Vietnam".to_string(),
            timeline: Timeline {
                cases: DatedSeries(vec![("1/1/22".to_string(), 200_000), ("1/2/22".to_string(), 250_000)]),
                deaths: DatedSeries(vec![("1/1/22".to_string(), 40), ("1/2/22".to_string(), 41)]),
            },
        };

        let cases = chart_response(&historical, ChartSeries::Cases, &catalog, Locale::EnUs);
        assert_eq!(cases.values, vec![200_000, 250_000]);
        assert_eq!(cases.labels, vec!["1/1/22", "1/2/22"]);
        assert_eq!(cases.step_size, 25_000);
        assert_eq!(cases.title, "Number of Cases");

        let deaths = chart_response(&historical, ChartSeries::Deaths, &catalog, Locale::TrTr);
        assert_eq!(deaths.values, vec![40, 41]);
        assert_eq!(deaths.step_size, 2_500);
        assert_eq!(deaths.title, "Ölüm Sayısı Grafiği");
    }
}
