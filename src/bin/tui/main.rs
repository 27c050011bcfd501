mod app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
        TableState, Wrap,
    },
    Frame, Terminal,
};
use tracing_subscriber::EnvFilter;

use app::{axis_ticks, Action, App, LoadStatus, Screen, Tab};
use covid_tracker::config::{Config, TUI_REFRESH_INTERVAL_SECS};
use covid_tracker::fetcher::DiseaseClient;
use covid_tracker::format::{
    format_epoch_millis, format_time_millis, percent_1dp, thousands, thousands_signed, truncate,
};
use covid_tracker::i18n::{Catalog, Key};
use covid_tracker::metrics::{active_count, ratio_pct};
use covid_tracker::types::ChartSeries;

const RECOVERED_COLOR: Color = Color::Green;
const ACTIVE_COLOR: Color = Color::Yellow;
const DEATHS_COLOR: Color = Color::Red;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let cfg = Config::from_env().map_err(io::Error::other)?;
    init_file_logging(&cfg)?;

    let catalog = Catalog::load().map_err(io::Error::other)?;
    let client = DiseaseClient::new(&cfg).map_err(io::Error::other)?;

    let mut app = App::new(&cfg, catalog);

    // Initial fetch before rendering
    app.refresh(&client, true).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &client).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// The terminal belongs to the UI, so logs only go to `TUI_LOG_FILE` when set.
fn init_file_logging(cfg: &Config) -> io::Result<()> {
    let Ok(path) = std::env::var("TUI_LOG_FILE") else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &DiseaseClient,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(TUI_REFRESH_INTERVAL_SECS);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app))?;

        // redraw at least once a second so notices expire on time
        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(Duration::from_secs(1));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.on_key(key.code) {
                        Action::Quit => return Ok(()),
                        Action::Refresh => {
                            terminal.draw(|f| render(f, app))?;
                            app.refresh(client, true).await;
                            last_tick = std::time::Instant::now();
                        }
                        Action::OpenDetail(country) => app.load_detail(client, &country).await,
                        Action::OpenChart(series) => app.load_chart(client, series).await,
                        Action::None => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client, false).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Outer vertical split: tab bar | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // tab bar
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_tab_bar(f, app, chunks[0]);
    match (app.tab, app.screen) {
        (Tab::Home, _) => render_home(f, app, chunks[1]),
        (Tab::Search, Screen::List) => render_country_list(f, app, chunks[1]),
        (Tab::Search, Screen::Detail) => render_country_detail(f, app, chunks[1]),
        (Tab::Search, Screen::Chart(series)) => render_chart(f, app, series, chunks[1]),
    }
    render_footer(f, app, chunks[2]);

    if app.show_about {
        render_about(f, app, area);
    }
}

fn render_tab_bar(f: &mut Frame, app: &App, area: Rect) {
    let tab_style = |tab: Tab| {
        if app.tab == tab {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let (status_text, status_color) = match &app.status {
        LoadStatus::Ready => ("● ok".to_string(), Color::Green),
        LoadStatus::Loading => (format!("◌ {}", app.t(Key::Loading)), Color::Yellow),
        LoadStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let spans = vec![
        Span::styled(
            " Covid-19  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", app.t(Key::Home)), tab_style(Tab::Home)),
        Span::raw(" "),
        Span::styled(format!(" {} ", app.t(Key::Search)), tab_style(Tab::Search)),
        Span::raw("  │  "),
        Span::styled(status_text, Style::default().fg(status_color)),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

// -- Home -------------------------------------------------------------------

fn render_home(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // breakdown
            Constraint::Length(5), // cards row 1
            Constraint::Length(5), // cards row 2
            Constraint::Length(1), // last update
            Constraint::Min(0),
        ])
        .split(area);

    render_breakdown(f, app, rows[0]);

    let summary = app.summary.unwrap_or_default();
    let loaded = app.summary.is_some_and(|s| s.cases > 0);
    let value = |n: String| if loaded { n } else { "…".to_string() };

    let top = halves(rows[1]);
    render_card(f, app.t(Key::TotalCase), &value(thousands(summary.cases)), Color::Cyan, top[0]);
    render_card(f, app.t(Key::Death), &value(thousands(summary.deaths)), DEATHS_COLOR, top[1]);

    let bottom = halves(rows[2]);
    render_card(f, app.t(Key::Recovered), &value(thousands(summary.recovered)), RECOVERED_COLOR, bottom[0]);
    render_card(
        f,
        app.t(Key::ActiveSick),
        &value(thousands_signed(active_count(&summary))),
        ACTIVE_COLOR,
        bottom[1],
    );

    let updated = if loaded { format_epoch_millis(summary.updated) } else { "—".to_string() };
    let line = Line::from(Span::styled(
        format!(" {} : {}", app.t(Key::LastUpdate), updated),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(line), rows[3]);
}

/// Terminal stand-in for the pie chart: one proportional bar plus a legend.
fn render_breakdown(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.t(Key::Worldwide)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    if app.summary.is_none() {
        let text = Paragraph::new(app.t(Key::PleaseWait))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(text, area);
        return;
    }

    let p = app.percentages;
    let width = area.width.saturating_sub(2) as i64;
    let segments = [
        (p.recovered_pct, RECOVERED_COLOR),
        (p.active_pct, ACTIVE_COLOR),
        (p.deaths_pct, DEATHS_COLOR),
    ];
    let bar: Vec<Span> = segments
        .iter()
        .map(|&(pct, color)| {
            let cells = (pct.max(0) * width / 100) as usize;
            Span::styled("█".repeat(cells), Style::default().fg(color))
        })
        .collect();

    let legend = |label: &str, pct: i64, color: Color| {
        Line::from(vec![
            Span::styled("● ", Style::default().fg(color)),
            Span::raw(format!("{label:<14}")),
            Span::styled(format!("{pct}%"), Style::default().add_modifier(Modifier::BOLD)),
        ])
    };

    let lines = vec![
        Line::from(bar),
        Line::raw(""),
        legend(app.t(Key::Active), p.active_pct, ACTIVE_COLOR),
        legend(app.t(Key::Recovered), p.recovered_pct, RECOVERED_COLOR),
        legend(app.t(Key::Death), p.deaths_pct, DEATHS_COLOR),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_card(f: &mut Frame, subtitle: &str, number: &str, color: Color, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            number.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle.to_string(), Style::default().fg(Color::Gray))),
    ];
    let card = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(card, area);
}

fn halves(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

// -- Search -----------------------------------------------------------------

fn render_country_list(f: &mut Frame, app: &App, area: Rect) {
    let search_height = if app.search_open { 3 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(search_height),
            Constraint::Min(0),
        ])
        .split(area);

    let updated = app
        .summary
        .map_or("—".to_string(), |s| format_time_millis(s.updated));
    let legend = Line::from(vec![
        Span::styled(" ● ", Style::default().fg(ACTIVE_COLOR)),
        Span::raw(app.t(Key::Active)),
        Span::styled("  ● ", Style::default().fg(RECOVERED_COLOR)),
        Span::raw(app.t(Key::Recovered)),
        Span::styled("  ● ", Style::default().fg(DEATHS_COLOR)),
        Span::raw(app.t(Key::Death)),
        Span::styled(
            format!("   {}: {updated}", app.t(Key::LastUpdate)),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(legend), rows[0]);

    if app.search_open {
        let input = if app.search_text.is_empty() {
            Span::styled(app.t(Key::EnterCountry), Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(app.search_text.as_str())
        };
        let search = Paragraph::new(Line::from(vec![Span::raw("/ "), input])).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(search, rows[1]);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ({}) ", app.t(Key::Countries), app.countries.len()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    if app.countries.is_empty() {
        let text = match app.status {
            LoadStatus::Loading => app.t(Key::Loading),
            _ => app.t(Key::NoResults),
        };
        let empty = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, rows[2]);
        return;
    }

    let header_cells = ["#", app.t(Key::Countries), app.t(Key::Active), app.t(Key::Recovered), app.t(Key::Death)]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let table_rows: Vec<Row> = app
        .countries
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&c.country, 28)),
                Cell::from(thousands(c.active)).style(Style::default().fg(ACTIVE_COLOR)),
                Cell::from(thousands(c.recovered)).style(Style::default().fg(RECOVERED_COLOR)),
                Cell::from(thousands(c.deaths)).style(Style::default().fg(DEATHS_COLOR)),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(table, rows[2], &mut state);
}

fn render_country_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(d) = &app.detail else {
        f.render_widget(Paragraph::new(app.t(Key::PleaseWait)), area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", d.country),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let stat = |label: &str, value: String, color: Color| {
        Line::from(vec![
            Span::raw(format!("  {label:<18}")),
            Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", app.t(Key::AllInfo)),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        stat(app.t(Key::TotalCases), thousands(d.cases), Color::Cyan),
        stat(app.t(Key::Death), thousands(d.deaths), DEATHS_COLOR),
        stat(app.t(Key::Recovered), thousands(d.recovered), RECOVERED_COLOR),
        stat(app.t(Key::Active), thousands(d.active), ACTIVE_COLOR),
        Line::raw(""),
        stat(app.t(Key::TodayCases), thousands(d.today_cases), Color::White),
        stat(app.t(Key::TodayDeaths), thousands(d.today_deaths), Color::White),
        stat(app.t(Key::DeathRatio), percent_1dp(ratio_pct(d.deaths, d.cases)), Color::White),
        Line::raw(""),
        Line::from(vec![
            Span::styled(" [c] ", Style::default().fg(Color::Yellow)),
            Span::raw(app.t(Key::NumberOfCasesChart)),
            Span::styled("   [d] ", Style::default().fg(Color::Yellow)),
            Span::raw(app.t(Key::NumberOfDeathChart)),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_chart(f: &mut Frame, app: &App, series: ChartSeries, area: Rect) {
    let (title_key, color) = match series {
        ChartSeries::Cases => (Key::NumberOfCasesChart, ACTIVE_COLOR),
        ChartSeries::Deaths => (Key::NumberOfDeathChart, DEATHS_COLOR),
    };
    let country = app.detail.as_ref().map_or("", |d| d.country.as_str());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {country} · {} ", app.t(title_key)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let (data, step) = app.chart_data(series);
    if data.is_empty() {
        f.render_widget(Paragraph::new(app.t(Key::NoResults)).block(block), area);
        return;
    }

    let labels = app.chart_labels(series);
    let x_labels = match labels.as_slice() {
        [] => Vec::new(),
        [only] => vec![only.clone()],
        [first, .., last] => vec![first.clone(), labels[labels.len() / 2].clone(), last.clone()],
    };

    let max = data.iter().map(|&(_, v)| v as u64).max().unwrap_or(0);
    let ticks = axis_ticks(max, step, 8);
    let y_top = ticks.last().copied().unwrap_or(step) as f64;
    let y_labels: Vec<String> = ticks.iter().map(|&t| thousands(t)).collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (data.len().saturating_sub(1)).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_top])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

// -- Overlays ---------------------------------------------------------------

fn render_about(f: &mut Frame, app: &App, area: Rect) {
    let popup = centered(area, 50, 9);
    let lines = vec![
        Line::raw(""),
        Line::from(app.t(Key::AboutText)),
        Line::raw(""),
        Line::from(Span::styled(
            format!("[Esc] {}", app.t(Key::Close)),
            Style::default().fg(Color::Yellow),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    format!(" {} ", app.t(Key::About)),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        );
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[Tab] ", Style::default().fg(Color::Yellow)),
        Span::raw("switch  "),
    ];
    if app.tab == Tab::Search {
        spans.extend([
            Span::styled("[/] ", Style::default().fg(Color::Yellow)),
            Span::raw("search  "),
            Span::styled("[↑↓ Enter Esc] ", Style::default().fg(Color::Yellow)),
            Span::raw("browse  "),
        ]);
    }
    spans.push(Span::styled("[a] ", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw("about  "));
    if let Some(notice) = app.active_notice() {
        spans.push(Span::styled(
            format!(" {notice} "),
            Style::default().fg(Color::Black).bg(Color::Green),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rect of `width` percent and `height` rows centered in `area`.
fn centered(area: Rect, width_pct: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_pct) / 2),
            Constraint::Percentage(width_pct),
            Constraint::Percentage((100 - width_pct) / 2),
        ])
        .split(vertical[1])[1]
}
