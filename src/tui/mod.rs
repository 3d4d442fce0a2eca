//! Ratatui-based terminal UI.
//!
//! Four screens share one event loop:
//! - Home: pick a screen
//! - Files: list, preview, upload (typed path) and delete (multi-select)
//! - Forecast: file, mode, category, product and model, then the model
//!   comparison, a chart and the 30-day table
//! - Clusters: file, dimension, statistics and k, then a scatter and the table
//!
//! Runs go through [`crate::app::pipeline`], the same code path as the CLI.
//! Failures land in the status line; the UI keeps running.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
};

use crate::app::pipeline::{self, ClusterRun, ForecastOutput};
use crate::cluster::{ClusterTable, MAX_CLUSTERS, MIN_CLUSTERS};
use crate::domain::{
    ClusterRequest, Dimension, ForecastRequest, ModelChoice, Schema, SelectionMode, SeriesSelection, Statistic,
};
use crate::error::AppError;
use crate::io::{DataStore, SalesTable, TablePreview, load_sales_table, preview_table};
use crate::report;

mod plotters_chart;

use plotters_chart::{
    ClusterScatter, ForecastChart, ModelLines, cluster_rgb, day_label, model_rgb, terminal_color,
};

const PREVIEW_ROWS: usize = 15;
const FORECAST_FIELDS: usize = 5;
const CLUSTER_FIELDS: usize = 4;
const SCROLL_STEP: u16 = 5;

/// Start the TUI on the given data directory.
pub fn run(store: DataStore) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::Terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(store);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Files,
    Forecast,
    Clusters,
}

impl Screen {
    const ALL: [Screen; 4] = [Screen::Home, Screen::Files, Screen::Forecast, Screen::Clusters];

    fn title(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Files => "Files",
            Screen::Forecast => "Forecast",
            Screen::Clusters => "Clusters",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Screen::Home => "",
            Screen::Files => "upload, preview and delete sales spreadsheets",
            Screen::Forecast => "compare Holt-Winters, SARIMA and a moving average; project 30 days",
            Screen::Clusters => "segment products, customers or stores with k-means",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn step(self, delta: i32) -> Self {
        Self::ALL[cycle(self.index(), Self::ALL.len(), delta)]
    }
}

/// Work that runs after the next redraw, so "working" statuses are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Forecast,
    Cluster,
}

#[derive(Debug, Default)]
struct FilesState {
    cursor: usize,
    marked: BTreeSet<String>,
    /// Upload path being typed.
    input: Option<String>,
    preview: Option<(String, TablePreview)>,
}

#[derive(Debug)]
struct ForecastState {
    field: usize,
    file: Option<String>,
    table: Option<SalesTable>,
    mode: SelectionMode,
    category: usize,
    product: usize,
    model: ModelChoice,
    output: Option<ForecastOutput>,
    scroll: u16,
}

impl Default for ForecastState {
    fn default() -> Self {
        Self {
            field: 0,
            file: None,
            table: None,
            mode: SelectionMode::Category,
            category: 0,
            product: 0,
            model: ModelChoice::All,
            output: None,
            scroll: 0,
        }
    }
}

impl ForecastState {
    fn categories(&self) -> Vec<String> {
        self.table.as_ref().map(SalesTable::categories).unwrap_or_default()
    }

    fn category_name(&self) -> Option<String> {
        self.categories().get(self.category).cloned()
    }

    fn products(&self) -> Vec<String> {
        match (&self.table, self.category_name()) {
            (Some(table), Some(category)) => table.products_in(&category),
            _ => Vec::new(),
        }
    }

    fn product_name(&self) -> Option<String> {
        self.products().get(self.product).cloned()
    }
}

#[derive(Debug)]
struct ClusterState {
    field: usize,
    file: Option<String>,
    dimension: Dimension,
    /// Toggles aligned with `dimension.catalog()`.
    enabled: Vec<bool>,
    stat_cursor: usize,
    k: usize,
    run: Option<ClusterRun>,
    scroll: u16,
}

impl Default for ClusterState {
    fn default() -> Self {
        let dimension = Dimension::Product;
        Self {
            field: 0,
            file: None,
            dimension,
            enabled: vec![true; dimension.catalog().len()],
            stat_cursor: 0,
            k: 3,
            run: None,
            scroll: 0,
        }
    }
}

impl ClusterState {
    fn selected_stats(&self) -> Vec<Statistic> {
        self.dimension
            .catalog()
            .iter()
            .zip(&self.enabled)
            .filter(|(_, on)| **on)
            .map(|(stat, _)| *stat)
            .collect()
    }
}

struct App {
    store: DataStore,
    screen: Screen,
    home_cursor: usize,
    /// Spreadsheets in the data directory, shared by every screen.
    names: Vec<String>,
    files: FilesState,
    forecast: ForecastState,
    clusters: ClusterState,
    pending: Option<Job>,
    status: String,
}

impl App {
    fn new(store: DataStore) -> Self {
        let mut app = Self {
            store,
            screen: Screen::Home,
            home_cursor: 0,
            names: Vec::new(),
            files: FilesState::default(),
            forecast: ForecastState::default(),
            clusters: ClusterState::default(),
            pending: None,
            status: String::new(),
        };
        match app.refresh_files() {
            Ok(()) => {
                app.status = format!("{} spreadsheet(s) in {}", app.names.len(), app.store.root().display());
            }
            Err(err) => app.report_error(err),
        }
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::Terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if self.pending.is_some() {
                self.run_pending();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::Terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::Terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn report_error(&mut self, err: AppError) {
        tracing::warn!(error = %err, screen = self.screen.title(), "tui action failed");
        self.status = format!("Error: {err}");
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.files.input.is_some() {
            self.handle_path_input(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.screen = self.screen.step(1),
            KeyCode::BackTab => self.screen = self.screen.step(-1),
            KeyCode::Esc => self.screen = Screen::Home,
            _ => {
                let outcome = match self.screen {
                    Screen::Home => {
                        self.handle_home_key(code);
                        Ok(())
                    }
                    Screen::Files => self.handle_files_key(code),
                    Screen::Forecast => self.handle_forecast_key(code),
                    Screen::Clusters => self.handle_clusters_key(code),
                };
                if let Err(err) = outcome {
                    self.report_error(err);
                }
            }
        }
        false
    }

    fn handle_home_key(&mut self, code: KeyCode) {
        let entries = Screen::ALL.len() - 1;
        match code {
            KeyCode::Up => self.home_cursor = self.home_cursor.saturating_sub(1),
            KeyCode::Down => self.home_cursor = (self.home_cursor + 1).min(entries - 1),
            KeyCode::Enter => self.screen = Screen::ALL[self.home_cursor + 1],
            _ => {}
        }
    }

    fn handle_files_key(&mut self, code: KeyCode) -> Result<(), AppError> {
        match code {
            KeyCode::Up => self.files.cursor = self.files.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.files.cursor + 1 < self.names.len() {
                    self.files.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(name) = self.names.get(self.files.cursor) {
                    if !self.files.marked.remove(name) {
                        self.files.marked.insert(name.clone());
                    }
                }
            }
            KeyCode::Char('u') => {
                self.files.input = Some(String::new());
                self.status = "Type a spreadsheet path. Enter to upload, Esc to cancel.".to_string();
            }
            KeyCode::Char('d') => self.delete_files()?,
            KeyCode::Char('r') => {
                self.refresh_files()?;
                self.status = format!("{} spreadsheet(s).", self.names.len());
            }
            KeyCode::Enter => self.preview_current()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_path_input(&mut self, code: KeyCode) {
        let Some(input) = self.files.input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.files.input = None;
                self.status = "Upload canceled.".to_string();
            }
            KeyCode::Enter => {
                let path = input.trim().to_string();
                self.files.input = None;
                if let Err(err) = self.upload(&path) {
                    self.report_error(err);
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
    }

    fn handle_forecast_key(&mut self, code: KeyCode) -> Result<(), AppError> {
        match code {
            KeyCode::Up => self.forecast.field = self.forecast.field.saturating_sub(1),
            KeyCode::Down => self.forecast.field = (self.forecast.field + 1).min(FORECAST_FIELDS - 1),
            KeyCode::Left => self.adjust_forecast(-1)?,
            KeyCode::Right => self.adjust_forecast(1)?,
            KeyCode::Enter => self.queue(Job::Forecast),
            KeyCode::PageDown => self.forecast.scroll = self.forecast.scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageUp => self.forecast.scroll = self.forecast.scroll.saturating_sub(SCROLL_STEP),
            _ => {}
        }
        Ok(())
    }

    fn handle_clusters_key(&mut self, code: KeyCode) -> Result<(), AppError> {
        match code {
            KeyCode::Up => self.clusters.field = self.clusters.field.saturating_sub(1),
            KeyCode::Down => self.clusters.field = (self.clusters.field + 1).min(CLUSTER_FIELDS - 1),
            KeyCode::Left => self.adjust_clusters(-1)?,
            KeyCode::Right => self.adjust_clusters(1)?,
            KeyCode::Char(' ') if self.clusters.field == 2 => {
                if let Some(on) = self.clusters.enabled.get_mut(self.clusters.stat_cursor) {
                    *on = !*on;
                    self.clusters.run = None;
                }
            }
            KeyCode::Enter => self.queue(Job::Cluster),
            KeyCode::PageDown => self.clusters.scroll = self.clusters.scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageUp => self.clusters.scroll = self.clusters.scroll.saturating_sub(SCROLL_STEP),
            _ => {}
        }
        Ok(())
    }

    fn adjust_forecast(&mut self, delta: i32) -> Result<(), AppError> {
        self.forecast.output = None;
        self.forecast.scroll = 0;
        match self.forecast.field {
            0 => {
                let name = step_name(&self.names, self.forecast.file.as_deref(), delta)?;
                self.load_forecast_file(name)?;
            }
            1 => self.forecast.mode = step_variant(self.forecast.mode, delta),
            2 => {
                let n = self.forecast.categories().len();
                self.forecast.category = cycle(self.forecast.category, n, delta);
                self.forecast.product = 0;
            }
            3 => {
                let n = self.forecast.products().len();
                self.forecast.product = cycle(self.forecast.product, n, delta);
            }
            4 => self.forecast.model = step_variant(self.forecast.model, delta),
            _ => {}
        }
        Ok(())
    }

    fn adjust_clusters(&mut self, delta: i32) -> Result<(), AppError> {
        match self.clusters.field {
            0 => {
                let name = step_name(&self.names, self.clusters.file.as_deref(), delta)?;
                self.clusters.file = Some(name);
            }
            1 => {
                self.clusters.dimension = step_variant(self.clusters.dimension, delta);
                self.clusters.enabled = vec![true; self.clusters.dimension.catalog().len()];
                self.clusters.stat_cursor = 0;
            }
            2 => {
                let n = self.clusters.dimension.catalog().len();
                self.clusters.stat_cursor = cycle(self.clusters.stat_cursor, n, delta);
                return Ok(());
            }
            3 => self.clusters.k = step_k(self.clusters.k, delta),
            _ => {}
        }
        self.clusters.run = None;
        self.clusters.scroll = 0;
        Ok(())
    }

    fn queue(&mut self, job: Job) {
        self.status = match job {
            Job::Forecast => "Fitting models...".to_string(),
            Job::Cluster => "Clustering...".to_string(),
        };
        self.pending = Some(job);
    }

    fn run_pending(&mut self) {
        let Some(job) = self.pending.take() else {
            return;
        };
        let outcome = match job {
            Job::Forecast => self.compute_forecast(),
            Job::Cluster => self.compute_clusters(),
        };
        if let Err(err) = outcome {
            self.report_error(err);
        }
    }

    fn refresh_files(&mut self) -> Result<(), AppError> {
        self.names = self.store.list()?;
        self.files.cursor = self.files.cursor.min(self.names.len().saturating_sub(1));

        let names = &self.names;
        self.files.marked.retain(|n| names.contains(n));
        if self.files.preview.as_ref().is_some_and(|(n, _)| !names.contains(n)) {
            self.files.preview = None;
        }
        if self.forecast.file.as_ref().is_some_and(|f| !names.contains(f)) {
            self.forecast = ForecastState::default();
        }
        if self.clusters.file.as_ref().is_some_and(|f| !names.contains(f)) {
            self.clusters.file = None;
            self.clusters.run = None;
        }
        Ok(())
    }

    fn upload(&mut self, path: &str) -> Result<(), AppError> {
        if path.is_empty() {
            return Err(AppError::InvalidInput("No path entered.".to_string()));
        }
        let table = self.store.upload(Path::new(path))?;
        tracing::info!(path, rows = table.rows_used, "uploaded spreadsheet");
        self.refresh_files()?;
        self.status = format!(
            "Uploaded {path}: {} rows used, {} rejected.",
            table.rows_used,
            table.row_errors.len()
        );
        Ok(())
    }

    fn delete_files(&mut self) -> Result<(), AppError> {
        let targets: Vec<String> = if self.files.marked.is_empty() {
            self.names.get(self.files.cursor).cloned().into_iter().collect()
        } else {
            self.files.marked.iter().cloned().collect()
        };
        if targets.is_empty() {
            return Err(AppError::InvalidInput("No spreadsheet selected.".to_string()));
        }

        let outcomes = self.store.delete(&targets);
        let failed: Vec<String> = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| format!("{}: {e}", o.name)))
            .collect();
        let deleted = outcomes.len() - failed.len();
        tracing::info!(deleted, failed = failed.len(), "deleted spreadsheets");

        self.files.marked.clear();
        self.refresh_files()?;
        self.status = if failed.is_empty() {
            format!("Deleted {deleted} file(s).")
        } else {
            format!("Deleted {deleted} file(s); failed {}", failed.join("; "))
        };
        Ok(())
    }

    fn preview_current(&mut self) -> Result<(), AppError> {
        let Some(name) = self.names.get(self.files.cursor).cloned() else {
            return Ok(());
        };
        let path = self.store.resolve(&name)?;
        let preview = preview_table(&path, PREVIEW_ROWS)?;
        self.status = format!("{name}: {} rows.", preview.total_rows);
        self.files.preview = Some((name, preview));
        Ok(())
    }

    fn load_forecast_file(&mut self, name: String) -> Result<(), AppError> {
        let path = self.store.resolve(&name)?;
        self.forecast.file = Some(name.clone());
        self.forecast.table = None;
        self.forecast.category = 0;
        self.forecast.product = 0;

        let table = load_sales_table(&path, Schema::Forecast)?;
        self.status = format!(
            "{name}: {} rows, {} categories.",
            table.rows_used,
            table.categories().len()
        );
        self.forecast.table = Some(table);
        Ok(())
    }

    fn compute_forecast(&mut self) -> Result<(), AppError> {
        let Some(name) = self.forecast.file.clone() else {
            return Err(AppError::InvalidInput("Pick a file first (File row, \u{2190}/\u{2192}).".to_string()));
        };
        let file = self.store.resolve(&name)?;
        let category = self
            .forecast
            .category_name()
            .ok_or_else(|| AppError::InvalidInput(format!("{name} has no categories to forecast.")))?;
        let selection = SeriesSelection::new(self.forecast.mode, category, self.forecast.product_name())?;
        let request = ForecastRequest {
            file,
            selection,
            model: self.forecast.model,
        };

        let run = pipeline::run_forecast(&request)?;
        let best = run
            .output
            .evaluation
            .best()
            .map(|r| r.kind.display_name())
            .unwrap_or("-");
        self.status = format!(
            "{}: {} days, best model {best}.",
            run.output.selection.legend(),
            run.output.series.len()
        );
        if let Some(err) = &run.output.extension_error {
            self.status.push_str(&format!(" No 30-day extension: {err}"));
        }
        self.forecast.table = Some(run.table);
        self.forecast.output = Some(run.output);
        self.forecast.scroll = 0;
        Ok(())
    }

    fn compute_clusters(&mut self) -> Result<(), AppError> {
        let Some(name) = self.clusters.file.clone() else {
            return Err(AppError::InvalidInput("Pick a file first (File row, \u{2190}/\u{2192}).".to_string()));
        };
        let request = ClusterRequest {
            file: self.store.resolve(&name)?,
            dimension: self.clusters.dimension,
            stats: self.clusters.selected_stats(),
            k: self.clusters.k,
        };

        let run = pipeline::run_cluster(&request)?;
        self.status = format!(
            "{}: {} entities in {} clusters (inertia {}).",
            run.clusters.dimension.display_name(),
            run.clusters.rows.len(),
            run.clusters.k,
            report::fmt_metric(run.clusters.inertia)
        );
        self.clusters.run = Some(run);
        self.clusters.scroll = 0;
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(4)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let titles: Vec<Line> = Screen::ALL.iter().map(|s| Line::from(s.title())).collect();
        let title = Line::from(vec![
            Span::styled(" miq ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("| data: {} ", self.store.root().display())),
        ]);
        let tabs = Tabs::new(titles)
            .select(self.screen.index())
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        match self.screen {
            Screen::Home => self.draw_home(frame, area),
            Screen::Files => self.draw_files(frame, area),
            Screen::Forecast => self.draw_forecast(frame, area),
            Screen::Clusters => self.draw_clusters(frame, area),
        }
    }

    fn draw_home(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(area);

        let items: Vec<ListItem> = Screen::ALL[1..]
            .iter()
            .map(|s| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<10}", s.title()), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(s.description()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().title("MarketIQ").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(self.home_cursor));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let info = Text::from(vec![
            Line::from(format!("Data directory: {}", self.store.root().display())),
            Line::from(format!("Spreadsheets:   {}", self.names.len())),
            Line::from(""),
            Line::from(Span::styled(
                "Tab/Shift-Tab switch screens, Esc returns here.",
                Style::default().fg(Color::Gray),
            )),
        ]);
        frame.render_widget(Paragraph::new(info).block(Block::default().borders(Borders::ALL)), chunks[1]);
    }

    fn draw_files(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Min(0)])
            .split(area);

        let block = Block::default().title("Spreadsheets").borders(Borders::ALL);
        if self.names.is_empty() {
            let msg = Paragraph::new("No spreadsheets yet. Press u to upload one.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .names
                .iter()
                .map(|name| {
                    let mark = if self.files.marked.contains(name) { "[x]" } else { "[ ]" };
                    ListItem::new(format!("{mark} {name}"))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
                .highlight_symbol("» ");
            let mut state = ListState::default();
            state.select(Some(self.files.cursor));
            frame.render_stateful_widget(list, chunks[0], &mut state);
        }

        let preview = match &self.files.preview {
            Some((name, preview)) => Paragraph::new(report::format_preview(name, preview)),
            None => Paragraph::new("Enter previews the highlighted file.").style(Style::default().fg(Color::Gray)),
        };
        frame.render_widget(preview.block(Block::default().title("Preview").borders(Borders::ALL)), chunks[1]);

        if let Some(input) = &self.files.input {
            let list_area = chunks[0];
            let rect = Rect {
                x: list_area.x,
                y: list_area.y + list_area.height.saturating_sub(3),
                width: list_area.width,
                height: list_area.height.min(3),
            };
            frame.render_widget(Clear, rect);
            let field = Paragraph::new(format!("{input}_"))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                .block(Block::default().title("Upload path").borders(Borders::ALL));
            frame.render_widget(field, rect);
        }
    }

    fn draw_forecast(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(0)])
            .split(area);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(14)])
            .split(cols[1]);

        self.draw_forecast_settings(frame, cols[0]);
        self.draw_forecast_chart(frame, right[0]);
        self.draw_forecast_tables(frame, right[1]);
    }

    fn draw_forecast_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let fc = &self.forecast;
        let product = match fc.mode {
            SelectionMode::Category => "(all)".to_string(),
            SelectionMode::Product => fc.product_name().unwrap_or_else(|| "-".to_string()),
        };
        let items = vec![
            ListItem::new(format!("File: {}", fc.file.as_deref().unwrap_or("-"))),
            ListItem::new(format!("Mode: {}", fc.mode.display_name())),
            ListItem::new(format!("Category: {}", fc.category_name().unwrap_or_else(|| "-".to_string()))),
            ListItem::new(format!("Product: {product}")),
            ListItem::new(format!("Model: {}", fc.model.display_name())),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(fc.field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_forecast_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut title = vec![Span::raw("Forecast "), Span::styled("\u{25a0} history ", Style::default().fg(Color::White))];
        if let Some(output) = &self.forecast.output {
            for result in output.evaluation.results.values().filter(|r| r.is_ok()) {
                title.push(Span::styled(
                    format!("\u{25a0} {} ", result.kind.display_name()),
                    Style::default().fg(terminal_color(model_rgb(result.kind))),
                ));
            }
        }
        let block = Block::default().title(Line::from(title)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((output, data)) = self
            .forecast
            .output
            .as_ref()
            .and_then(|o| forecast_chart_data(o).map(|d| (o, d)))
        else {
            let msg = Paragraph::new("Pick a file and press Enter to fit the models.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };
        let Some(origin) = output.series.start() else {
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = ForecastChart {
            history: &data.history,
            models: &data.models,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            origin,
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            let axes = Axes {
                x_bounds: data.x_bounds,
                y_bounds: data.y_bounds,
                x_desc: "date",
                y_desc: "units",
                fmt_x: &|v: f64| day_label(origin, v),
                fmt_y: &|v: f64| format!("{v:.0}"),
            };
            draw_axis_ticks(frame, inner, chart_rect, insets, &axes);
        }
    }

    fn draw_forecast_tables(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let (comparison, extension) = match &self.forecast.output {
            Some(out) => (
                report::format_forecast_report(&out.selection, &out.series, &out.evaluation),
                report::format_extension_table(&out.extension),
            ),
            None => (String::new(), String::new()),
        };

        let scroll = (self.forecast.scroll, 0);
        frame.render_widget(
            Paragraph::new(comparison)
                .scroll(scroll)
                .block(Block::default().title("Model comparison").borders(Borders::ALL)),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(extension)
                .scroll(scroll)
                .block(Block::default().title("30-day forecast").borders(Borders::ALL)),
            chunks[1],
        );
    }

    fn draw_clusters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(cols[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(14)])
            .split(cols[1]);

        self.draw_cluster_settings(frame, left[0]);
        self.draw_cluster_stats(frame, left[1]);
        self.draw_cluster_scatter(frame, right[0]);

        let text = match &self.clusters.run {
            Some(run) => format!(
                "{}\n{}",
                report::format_cluster_table(&run.clusters),
                report::format_cluster_profiles(&run.clusters)
            ),
            None => String::new(),
        };
        frame.render_widget(
            Paragraph::new(text)
                .scroll((self.clusters.scroll, 0))
                .block(Block::default().title("Segments").borders(Borders::ALL)),
            right[1],
        );
    }

    fn draw_cluster_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cs = &self.clusters;
        let items = vec![
            ListItem::new(format!("File: {}", cs.file.as_deref().unwrap_or("-"))),
            ListItem::new(format!("Dimension: {}", cs.dimension.display_name())),
            ListItem::new(format!(
                "Statistics: {}/{} selected",
                cs.selected_stats().len(),
                cs.dimension.catalog().len()
            )),
            ListItem::new(format!("k: {:<2} {MIN_CLUSTERS} {} {MAX_CLUSTERS}", cs.k, k_slider(cs.k))),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(cs.field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_cluster_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cs = &self.clusters;
        let items: Vec<ListItem> = cs
            .dimension
            .catalog()
            .iter()
            .zip(&cs.enabled)
            .map(|(stat, on)| ListItem::new(format!("{} {}", if *on { "[x]" } else { "[ ]" }, stat.label())))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Statistics (space toggles)").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select((cs.field == 2).then_some(cs.stat_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_cluster_scatter(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut title = vec![Span::raw("Scatter ")];
        if let Some(run) = &self.clusters.run {
            for profile in run.clusters.profiles() {
                title.push(Span::styled(
                    format!("\u{25a0} {} ", profile.cluster),
                    Style::default().fg(terminal_color(cluster_rgb(profile.cluster))),
                ));
            }
        }
        let block = Block::default().title(Line::from(title)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = self.clusters.run.as_ref().and_then(|run| scatter_data(&run.clusters)) else {
            let msg = Paragraph::new("Pick a file and press Enter to cluster.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = ClusterScatter {
            points: &data.points,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_desc: data.x_stat.label(),
            y_desc: data.y_stat.label(),
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            let axes = Axes {
                x_bounds: data.x_bounds,
                y_bounds: data.y_bounds,
                x_desc: data.x_stat.label(),
                y_desc: data.y_stat.label(),
                fmt_x: &|v: f64| format!("{v:.1}"),
                fmt_y: &|v: f64| format!("{v:.1}"),
            };
            draw_axis_ticks(frame, inner, chart_rect, insets, &axes);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.files.input.is_some() {
            "Enter upload  Backspace erase  Esc cancel"
        } else {
            match self.screen {
                Screen::Home => "\u{2191}/\u{2193} select  Enter open  Tab switch  q quit",
                Screen::Files => "\u{2191}/\u{2193} move  Space mark  d delete  u upload  Enter preview  r refresh  q quit",
                Screen::Forecast => "\u{2191}/\u{2193} field  \u{2190}/\u{2192} change  Enter run  PgUp/PgDn scroll  Tab switch  q quit",
                Screen::Clusters => "\u{2191}/\u{2193} field  \u{2190}/\u{2192} change  Space toggle  Enter run  PgUp/PgDn scroll  q quit",
            }
        };
        let status_style = if self.status.starts_with("Error") {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let text = Text::from(vec![
            Line::from(Span::styled(help, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(self.status.as_str(), status_style)),
        ]);
        let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Step `idx` by `delta` within `0..len`, wrapping.
fn cycle(idx: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    (idx as i64 + i64::from(delta)).rem_euclid(len as i64) as usize
}

fn step_variant<T: ValueEnum + PartialEq + Copy>(current: T, delta: i32) -> T {
    let all = T::value_variants();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    all[cycle(idx, all.len(), delta)]
}

fn step_name(names: &[String], current: Option<&str>, delta: i32) -> Result<String, AppError> {
    if names.is_empty() {
        return Err(AppError::InvalidInput(
            "No spreadsheets uploaded yet; add one on the Files screen.".to_string(),
        ));
    }
    let idx = match current.and_then(|c| names.iter().position(|n| n == c)) {
        Some(pos) => cycle(pos, names.len(), delta),
        None => 0,
    };
    Ok(names[idx].clone())
}

/// k moves one step at a time and stops at the bounds.
fn step_k(k: usize, delta: i32) -> usize {
    if delta < 0 {
        k.saturating_sub(1).max(MIN_CLUSTERS)
    } else {
        (k + 1).min(MAX_CLUSTERS)
    }
}

fn k_slider(k: usize) -> String {
    (MIN_CLUSTERS..=MAX_CLUSTERS)
        .map(|v| if v == k { '\u{25cf}' } else { '\u{2500}' })
        .collect()
}

/// Finite bounds padded by 5%; a flat range is widened by one unit each side.
fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 1.0, hi + 1.0];
    }
    let pad = (hi - lo) * 0.05;
    [lo - pad, hi + pad]
}

#[derive(Debug)]
struct ForecastChartData {
    history: Vec<(f64, f64)>,
    models: Vec<ModelLines>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Chart series with x as the day offset from the series start.
fn forecast_chart_data(output: &ForecastOutput) -> Option<ForecastChartData> {
    let origin = output.series.start()?;
    let offset = |d: NaiveDate| (d - origin).num_days() as f64;
    let finite_points = |series: &crate::domain::TimeSeries| -> Vec<(f64, f64)> {
        series
            .points()
            .filter(|(_, v)| v.is_finite())
            .map(|(d, v)| (offset(d), v))
            .collect()
    };

    let history = finite_points(&output.series);
    let models: Vec<ModelLines> = output
        .evaluation
        .results
        .values()
        .filter(|r| r.is_ok())
        .map(|r| ModelLines {
            kind: r.kind,
            test: finite_points(&r.predictions),
            extension: output
                .extension
                .iter()
                .find(|e| e.kind == r.kind)
                .map(|e| finite_points(&e.forecast))
                .unwrap_or_default(),
        })
        .collect();

    let all_points = || {
        history
            .iter()
            .chain(models.iter().flat_map(|m| m.test.iter().chain(m.extension.iter())))
            .copied()
    };
    let x_bounds = padded_bounds(all_points().map(|(x, _)| x));
    let y_bounds = padded_bounds(all_points().map(|(_, y)| y));

    Some(ForecastChartData {
        history,
        models,
        x_bounds,
        y_bounds,
    })
}

#[derive(Debug)]
struct ScatterData {
    points: Vec<(usize, f64, f64)>,
    x_stat: Statistic,
    y_stat: Statistic,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// x is the first statistic, y the second (or the first again).
fn scatter_data(table: &ClusterTable) -> Option<ScatterData> {
    let x_stat = *table.stats.first()?;
    let y_idx = if table.stats.len() > 1 { 1 } else { 0 };
    let y_stat = table.stats[y_idx];

    let points: Vec<(usize, f64, f64)> = table
        .rows
        .iter()
        .map(|row| (row.cluster, row.values[0], row.values[y_idx]))
        .collect();
    let x_bounds = padded_bounds(points.iter().map(|p| p.1));
    let y_bounds = padded_bounds(points.iter().map(|p| p.2));

    Some(ScatterData {
        points,
        x_stat,
        y_stat,
        x_bounds,
        y_bounds,
    })
}

struct Axes<'a> {
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_desc: &'a str,
    y_desc: &'a str,
    fmt_x: &'a dyn Fn(f64) -> String,
    fmt_y: &'a dyn Fn(f64) -> String,
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: Rect, insets: AxisInsets, axes: &Axes<'_>) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = axes.x_bounds[0] + u * (axes.x_bounds[1] - axes.x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = (axes.fmt_x)(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = axes.y_bounds[0] + u * (axes.y_bounds[1] - axes.y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = (axes.fmt_y)(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(axes.x_desc)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(axes.y_desc).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sample, write_sample_csv};
    use ratatui::backend::TestBackend;

    fn store_with(names: &[&str]) -> (tempfile::TempDir, DataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("data"));
        std::fs::create_dir_all(store.root()).unwrap();
        for name in names {
            std::fs::write(store.root().join(name), "x").unwrap();
        }
        (dir, store)
    }

    fn store_with_sample() -> (tempfile::TempDir, DataStore) {
        let (dir, store) = store_with(&[]);
        let records = generate_sample(&SampleConfig::default()).unwrap();
        write_sample_csv(&store.root().join("ventas.csv"), &records).unwrap();
        (dir, store)
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            assert!(!app.handle_key(*key));
        }
    }

    #[test]
    fn marked_files_are_deleted_together() {
        let (_dir, store) = store_with(&["a.csv", "b.csv", "c.csv"]);
        let mut app = App::new(store);
        app.screen = Screen::Files;

        press(&mut app, &[KeyCode::Char(' '), KeyCode::Down, KeyCode::Down, KeyCode::Char(' ')]);
        assert_eq!(app.files.marked.len(), 2);
        press(&mut app, &[KeyCode::Char('d')]);

        assert_eq!(app.names, vec!["b.csv".to_string()]);
        assert!(app.files.marked.is_empty());
        assert_eq!(app.status, "Deleted 2 file(s).");
    }

    #[test]
    fn failed_upload_lands_in_status_line() {
        let (dir, store) = store_with(&[]);
        let mut app = App::new(store);
        app.screen = Screen::Files;

        press(&mut app, &[KeyCode::Char('u')]);
        let missing = dir.path().join("missing.csv").to_string_lossy().to_string();
        // `q` is text while typing a path.
        for c in missing.chars().chain("q".chars()) {
            press(&mut app, &[KeyCode::Char(c)]);
        }
        press(&mut app, &[KeyCode::Backspace, KeyCode::Enter]);

        assert!(app.files.input.is_none());
        assert!(app.status.starts_with("Error:"), "{}", app.status);
        assert!(app.names.is_empty());
    }

    #[test]
    fn forecast_requires_a_file() {
        let (_dir, store) = store_with(&[]);
        let mut app = App::new(store);
        app.screen = Screen::Forecast;
        press(&mut app, &[KeyCode::Enter]);
        app.run_pending();
        assert!(app.status.starts_with("Error: Pick a file"), "{}", app.status);
        assert!(app.forecast.output.is_none());
    }

    #[test]
    fn forecast_runs_from_the_settings_panel() {
        let (_dir, store) = store_with_sample();
        let mut app = App::new(store);
        app.screen = Screen::Forecast;

        press(&mut app, &[KeyCode::Right]);
        assert_eq!(app.forecast.file.as_deref(), Some("ventas.csv"));
        assert_eq!(app.forecast.category_name().as_deref(), Some("Bebidas"));

        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.pending, Some(Job::Forecast));
        app.run_pending();

        let output = app.forecast.output.as_ref().expect("forecast output");
        assert!(app.status.contains("best model"), "{}", app.status);
        assert!(!output.extension.is_empty());
        let data = forecast_chart_data(output).unwrap();
        assert_eq!(data.history.len(), output.series.len());
    }

    #[test]
    fn changing_a_setting_discards_the_previous_forecast() {
        let (_dir, store) = store_with_sample();
        let mut app = App::new(store);
        app.screen = Screen::Forecast;
        press(&mut app, &[KeyCode::Right, KeyCode::Down, KeyCode::Down, KeyCode::Down, KeyCode::Down]);
        assert_eq!(app.forecast.field, FORECAST_FIELDS - 1);

        press(&mut app, &[KeyCode::Left]);
        assert_eq!(app.forecast.model, ModelChoice::MovingAverage);
        press(&mut app, &[KeyCode::Right]);
        assert_eq!(app.forecast.model, ModelChoice::All);
        assert!(app.forecast.output.is_none());
    }

    #[test]
    fn k_slider_stops_at_bounds() {
        let (_dir, store) = store_with(&[]);
        let mut app = App::new(store);
        app.screen = Screen::Clusters;
        press(&mut app, &[KeyCode::Down, KeyCode::Down, KeyCode::Down]);

        for _ in 0..20 {
            press(&mut app, &[KeyCode::Right]);
        }
        assert_eq!(app.clusters.k, MAX_CLUSTERS);
        for _ in 0..20 {
            press(&mut app, &[KeyCode::Left]);
        }
        assert_eq!(app.clusters.k, MIN_CLUSTERS);
        assert_eq!(k_slider(2), "\u{25cf}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}");
    }

    #[test]
    fn clearing_every_statistic_is_reported() {
        let (_dir, store) = store_with_sample();
        let mut app = App::new(store);
        app.screen = Screen::Clusters;

        press(&mut app, &[KeyCode::Right, KeyCode::Down, KeyCode::Right, KeyCode::Right, KeyCode::Down]);
        assert_eq!(app.clusters.dimension, Dimension::Store);
        for _ in Dimension::Store.catalog() {
            press(&mut app, &[KeyCode::Char(' '), KeyCode::Right]);
        }
        assert!(app.clusters.selected_stats().is_empty());

        press(&mut app, &[KeyCode::Enter]);
        app.run_pending();
        assert!(app.status.starts_with("Error:"), "{}", app.status);
        assert!(app.clusters.run.is_none());
    }

    #[test]
    fn stores_cluster_from_the_settings_panel() {
        let (_dir, store) = store_with_sample();
        let mut app = App::new(store);
        app.screen = Screen::Clusters;

        press(&mut app, &[KeyCode::Right, KeyCode::Down, KeyCode::Left, KeyCode::Enter]);
        assert_eq!(app.clusters.dimension, Dimension::Store);
        app.run_pending();

        let run = app.clusters.run.as_ref().expect("cluster run");
        assert_eq!(run.clusters.rows.len(), 3);
        let data = scatter_data(&run.clusters).unwrap();
        assert_eq!(data.x_stat, Statistic::TotalSales);
        assert_eq!(data.y_stat, Statistic::AvgMargin);
    }

    #[test]
    fn tab_cycles_screens_and_q_quits() {
        let (_dir, store) = store_with(&[]);
        let mut app = App::new(store);
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        assert_eq!(app.screen, Screen::Forecast);
        press(&mut app, &[KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        assert_eq!(app.screen, Screen::Clusters);
        press(&mut app, &[KeyCode::Esc, KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.screen, Screen::Forecast);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn padded_bounds_handle_flat_and_missing_values() {
        assert_eq!(padded_bounds([10.0, 10.0, f64::NAN].into_iter()), [9.0, 11.0]);
        assert_eq!(padded_bounds(std::iter::empty()), [0.0, 1.0]);
        let [lo, hi] = padded_bounds([0.0, 100.0].into_iter());
        assert!((lo + 5.0).abs() < 1e-12 && (hi - 105.0).abs() < 1e-12);
    }

    #[test]
    fn home_and_files_screens_render() {
        let (_dir, store) = store_with(&["ventas.csv"]);
        let mut app = App::new(store);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal.draw(|f| app.draw(f)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Clusters"));
        assert!(text.contains("Spreadsheets:   1"));

        app.screen = Screen::Files;
        terminal.draw(|f| app.draw(f)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("[ ] ventas.csv"));
    }
}
