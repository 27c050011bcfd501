use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use covid_tracker::config::{Config, TUI_NOTICE_SECS};
use covid_tracker::error::Result;
use covid_tracker::fetcher::DiseaseClient;
use covid_tracker::format::chart_step_size;
use covid_tracker::i18n::{Catalog, Key, Locale};
use covid_tracker::metrics::derive;
use covid_tracker::search;
use covid_tracker::types::{
    ChartSeries, CountryDetail, CountryRecord, CountrySort, DerivedPercentages, GlobalSummary,
    Historical,
};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Search,
}

/// Screens stacked under the Search tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    List,
    Detail,
    Chart(ChartSeries),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Error(String),
}

/// Work the event loop has to do after a key press. Anything that needs the
/// network comes back here instead of being done inside `on_key`.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    OpenDetail(String),
    OpenChart(ChartSeries),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub until: Instant,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct App {
    pub catalog: Catalog,
    pub locale: Locale,
    pub sort: CountrySort,
    pub history_days: u32,

    pub tab: Tab,
    pub screen: Screen,
    pub status: LoadStatus,
    pub show_about: bool,
    pub notice: Option<Notice>,

    pub summary: Option<GlobalSummary>,
    pub percentages: DerivedPercentages,

    /// Full list as fetched; `countries` is the filtered view of it.
    pub all_countries: Vec<CountryRecord>,
    pub countries: Vec<CountryRecord>,
    pub selected: usize,
    pub search_open: bool,
    pub search_text: String,

    pub detail: Option<CountryDetail>,
    pub history: Option<Historical>,
}

impl App {
    pub fn new(cfg: &Config, catalog: Catalog) -> Self {
        Self {
            catalog,
            locale: cfg.locale,
            sort: cfg.country_sort,
            history_days: cfg.history_days,
            tab: Tab::Home,
            screen: Screen::List,
            status: LoadStatus::Loading,
            show_about: false,
            notice: None,
            summary: None,
            percentages: DerivedPercentages::default(),
            all_countries: Vec::new(),
            countries: Vec::new(),
            selected: 0,
            search_open: false,
            search_text: String::new(),
            detail: None,
            history: None,
        }
    }

    pub fn t(&self, key: Key) -> &'static str {
        self.catalog.translate(key, self.locale)
    }

    // -- data ---------------------------------------------------------------

    /// Re-fetch the summary and the country list. `reset_search` closes the
    /// search box and clears the filter, as a user-triggered refresh does; the
    /// timer refresh passes `false` and the current query is re-applied.
    pub async fn refresh(&mut self, client: &DiseaseClient, reset_search: bool) {
        self.status = LoadStatus::Loading;
        let (summary, countries) =
            tokio::join!(client.fetch_summary(), client.fetch_countries(self.sort));
        self.apply_refresh(summary, countries, reset_search);
    }

    /// Apply each half of a refresh on its own; a failure in one keeps the other.
    pub fn apply_refresh(
        &mut self,
        summary: Result<GlobalSummary>,
        countries: Result<Vec<CountryRecord>>,
        reset_search: bool,
    ) {
        let mut failure = None;
        match summary {
            Ok(s) => self.set_summary(s),
            Err(e) => {
                tracing::warn!("summary refresh failed: {e}");
                failure = Some(e.to_string());
            }
        }
        match countries {
            Ok(c) => {
                self.set_countries(c);
                if reset_search {
                    self.close_search();
                }
            }
            Err(e) => {
                tracing::warn!("country list refresh failed: {e}");
                failure.get_or_insert_with(|| e.to_string());
            }
        }

        match failure {
            Some(msg) => self.status = LoadStatus::Error(msg),
            None => {
                self.status = LoadStatus::Ready;
                let text = self.t(Key::Refreshed).to_string();
                self.notify(text);
                tracing::info!(countries = self.all_countries.len(), "refreshed");
            }
        }
    }

    /// Load one country's detail and switch to the detail screen.
    pub async fn load_detail(&mut self, client: &DiseaseClient, country: &str) {
        self.status = LoadStatus::Loading;
        match client.fetch_country(country).await {
            Ok(d) => {
                self.detail = Some(d);
                self.history = None;
                self.screen = Screen::Detail;
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                tracing::warn!("detail for {country} failed: {e}");
                self.status = LoadStatus::Error(e.to_string());
            }
        }
    }

    /// Load history for the open country (once) and switch to its chart.
    pub async fn load_chart(&mut self, client: &DiseaseClient, series: ChartSeries) {
        let Some(country) = self.detail.as_ref().map(|d| d.country.clone()) else {
            return;
        };
        if self.history.is_none() {
            self.status = LoadStatus::Loading;
            match client.fetch_historical(&country, self.history_days).await {
                Ok(h) => self.history = Some(h),
                Err(e) => {
                    tracing::warn!("history for {country} failed: {e}");
                    self.status = LoadStatus::Error(e.to_string());
                    return;
                }
            }
        }
        self.screen = Screen::Chart(series);
        self.status = LoadStatus::Ready;
    }

    pub fn set_summary(&mut self, summary: GlobalSummary) {
        self.percentages = derive(&summary);
        self.summary = Some(summary);
    }

    pub fn set_countries(&mut self, countries: Vec<CountryRecord>) {
        self.all_countries = countries;
        self.apply_filter();
    }

    // -- search -------------------------------------------------------------

    fn apply_filter(&mut self) {
        self.countries = search::filter(&self.all_countries, &self.search_text);
        self.selected = self.selected.min(self.countries.len().saturating_sub(1));
    }

    pub fn open_search(&mut self) {
        self.search_open = true;
    }

    pub fn close_search(&mut self) {
        self.search_open = false;
        self.search_text.clear();
        self.apply_filter();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_text.push(c);
        self.apply_filter();
    }

    pub fn pop_search_char(&mut self) {
        self.search_text.pop();
        self.apply_filter();
    }

    pub fn selected_country(&self) -> Option<&CountryRecord> {
        self.countries.get(self.selected)
    }

    // -- notices ------------------------------------------------------------

    pub fn notify(&mut self, text: String) {
        self.notice = Some(Notice {
            text,
            until: Instant::now() + Duration::from_secs(TUI_NOTICE_SECS),
        });
    }

    pub fn active_notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| Instant::now() < n.until)
            .map(|n| n.text.as_str())
    }

    // -- keys ---------------------------------------------------------------

    pub fn on_key(&mut self, code: KeyCode) -> Action {
        if self.show_about {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('a')) {
                self.show_about = false;
            }
            return Action::None;
        }

        // typing into the search box swallows everything but control keys
        if self.tab == Tab::Search && self.screen == Screen::List && self.search_open {
            match code {
                KeyCode::Esc => {
                    self.close_search();
                    return Action::None;
                }
                KeyCode::Backspace => {
                    self.pop_search_char();
                    return Action::None;
                }
                KeyCode::Char(c) => {
                    self.push_search_char(c);
                    return Action::None;
                }
                _ => {}
            }
        }

        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let text = self.t(Key::Refreshing).to_string();
                self.notify(text);
                Action::Refresh
            }
            KeyCode::Char('a') => {
                self.show_about = true;
                Action::None
            }
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::Home => Tab::Search,
                    Tab::Search => Tab::Home,
                };
                Action::None
            }
            KeyCode::Esc | KeyCode::Left => {
                self.back();
                Action::None
            }
            _ => match (self.tab, self.screen) {
                (Tab::Search, Screen::List) => self.on_list_key(code),
                (Tab::Search, Screen::Detail) => match code {
                    KeyCode::Char('c') => Action::OpenChart(ChartSeries::Cases),
                    KeyCode::Char('d') => Action::OpenChart(ChartSeries::Deaths),
                    _ => Action::None,
                },
                _ => Action::None,
            },
        }
    }

    fn on_list_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('/') => {
                self.open_search();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.countries.len().saturating_sub(1);
                self.selected = (self.selected + 1).min(max);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Enter | KeyCode::Right => match self.selected_country() {
                Some(c) => Action::OpenDetail(c.country.clone()),
                None => Action::None,
            },
            _ => Action::None,
        }
    }

    /// Pop one screen off the Search stack.
    pub fn back(&mut self) {
        self.screen = match self.screen {
            Screen::Chart(_) => Screen::Detail,
            Screen::Detail | Screen::List => Screen::List,
        };
    }

    // -- chart data ---------------------------------------------------------

    /// (index, value) points plus the grid step for the open chart.
    pub fn chart_data(&self, series: ChartSeries) -> (Vec<(f64, f64)>, u64) {
        let Some(history) = &self.history else {
            return (Vec::new(), chart_step_size(series, None));
        };
        let points = history.timeline.series(series);
        let data = points
            .values()
            .enumerate()
            .map(|(i, v)| (i as f64, v as f64))
            .collect();
        (data, chart_step_size(series, points.last_value()))
    }

    pub fn chart_labels(&self, series: ChartSeries) -> Vec<String> {
        self.history
            .as_ref()
            .map(|h| h.timeline.series(series).labels().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Y-axis tick values: multiples of `step` covering `max`, thinned so at most
/// `max_ticks` labels are drawn.
pub fn axis_ticks(max: u64, step: u64, max_ticks: usize) -> Vec<u64> {
    let step = step.max(1);
    let top = max.div_ceil(step).max(1) * step;
    let count = (top / step) as usize + 1;
    let stride = count.div_ceil(max_ticks.max(2) - 1).max(1);
    let mut ticks: Vec<u64> = (0..count)
        .step_by(stride)
        .map(|i| i as u64 * step)
        .collect();
    if ticks.last() != Some(&top) {
        ticks.push(top);
    }
    ticks
}
