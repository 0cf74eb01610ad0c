use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEvent,
    MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use semver::Version;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::client;
use crate::feed::{DateGroup, FeedStore, LinkEntry};
use crate::overlay::{Fragment, Overlay};
use crate::prefs::{self, Preferences, PrefsPort};
use crate::presenter::{self, PresentationAction};
use crate::update;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const KEY_HINTS: &str = "enter view · c comments · n nsfw · d theme · w width · r refresh · q quit";

struct Palette {
    header: Color,
    text: Color,
    dim: Color,
    selected_bg: Color,
    border: Color,
    nsfw: Color,
    panel_bg: Color,
}

const DARK: Palette = Palette {
    header: Color::Rgb(137, 180, 250),
    text: Color::Rgb(205, 214, 244),
    dim: Color::Rgb(166, 173, 200),
    selected_bg: Color::Rgb(69, 71, 90),
    border: Color::Rgb(49, 50, 68),
    nsfw: Color::Rgb(243, 139, 168),
    panel_bg: Color::Rgb(24, 24, 36),
};

const LIGHT: Palette = Palette {
    header: Color::Rgb(30, 102, 245),
    text: Color::Rgb(76, 79, 105),
    dim: Color::Rgb(108, 111, 133),
    selected_bg: Color::Rgb(204, 208, 218),
    border: Color::Rgb(172, 176, 190),
    nsfw: Color::Rgb(210, 15, 57),
    panel_bg: Color::Rgb(230, 233, 239),
};

#[derive(Default)]
struct Spinner {
    frame: usize,
}

impl Spinner {
    fn advance(&mut self) -> bool {
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        true
    }

    fn reset(&mut self) {
        self.frame = 0;
    }

    fn glyph(&self) -> &'static str {
        SPINNER_FRAMES[self.frame]
    }
}

/// One renderable line of the feed list. Selection only ever lands on link
/// rows; date headers are skipped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Header(usize),
    Link { group: usize, index: usize },
}

enum AsyncResponse {
    Feed {
        result: Result<String>,
    },
    Update {
        result: Result<Option<update::UpdateInfo>>,
    },
}

pub struct Options {
    pub status_message: String,
    pub client: Option<Arc<client::Client>>,
    pub prefs: Preferences,
    pub prefs_port: Option<Arc<dyn PrefsPort>>,
    pub config_path: String,
    pub fetch_on_start: bool,
}

pub struct Model {
    status_message: String,
    client: Option<Arc<client::Client>>,
    prefs: Preferences,
    prefs_port: Option<Arc<dyn PrefsPort>>,
    config_path: String,
    store: FeedStore,
    groups: Vec<DateGroup>,
    rows: Vec<Row>,
    selected: usize,
    list_state: ListState,
    overlay: Overlay,
    overlay_area: Option<Rect>,
    fetch_in_progress: bool,
    fetch_on_start: bool,
    update_notice: Option<update::UpdateInfo>,
    update_check_in_progress: bool,
    update_checked: bool,
    current_version: Version,
    needs_redraw: bool,
    spinner: Spinner,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
}

impl Model {
    pub fn new(options: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            status_message: options.status_message,
            client: options.client,
            prefs: options.prefs,
            prefs_port: options.prefs_port,
            config_path: options.config_path,
            store: FeedStore::new(),
            groups: Vec::new(),
            rows: Vec::new(),
            selected: 0,
            list_state: ListState::default(),
            overlay: Overlay::default(),
            overlay_area: None,
            fetch_in_progress: false,
            fetch_on_start: options.fetch_on_start,
            update_notice: None,
            update_check_in_progress: false,
            update_checked: false,
            current_version: Version::parse(crate::VERSION)
                .unwrap_or_else(|_| Version::new(0, 0, 0)),
            needs_redraw: true,
            spinner: Spinner::default(),
            response_tx,
            response_rx,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        if self.fetch_on_start {
            self.queue_refresh();
        }
        self.queue_update_check();

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.fetch_in_progress && self.spinner.advance() {
                    self.mark_dirty();
                } else if !self.fetch_in_progress {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn queue_update_check(&mut self) {
        if self.update_checked || self.update_check_in_progress {
            return;
        }
        if cfg!(test) || std::env::var(update::SKIP_UPDATE_ENV).is_ok() {
            self.update_checked = true;
            return;
        }
        self.update_checked = true;
        self.update_check_in_progress = true;
        let tx = self.response_tx.clone();
        let version = self.current_version.clone();
        thread::spawn(move || {
            let result = update::check_for_update(&version);
            let _ = tx.send(AsyncResponse::Update { result });
        });
    }

    /// Spawns one fetch worker. Refreshes never overlap: a second request
    /// while one is in flight only updates the status line.
    fn queue_refresh(&mut self) {
        let Some(client) = self.client.clone() else {
            self.status_message = format!(
                "Feed client unavailable; check feed.endpoint in {}.",
                self.config_path
            );
            self.mark_dirty();
            return;
        };
        if self.fetch_in_progress {
            self.status_message = "A refresh is already in progress…".to_string();
            self.mark_dirty();
            return;
        }
        self.fetch_in_progress = true;
        self.status_message = format!("Fetching {}…", client.endpoint());
        self.mark_dirty();

        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = client.fetch_feed();
            let _ = tx.send(AsyncResponse::Feed { result });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut updated = false;
        while let Ok(response) = self.response_rx.try_recv() {
            match response {
                AsyncResponse::Feed { result } => {
                    self.fetch_in_progress = false;
                    self.apply_feed_result(result);
                }
                AsyncResponse::Update { result } => {
                    self.update_check_in_progress = false;
                    if let Ok(Some(info)) = result {
                        self.update_notice = Some(info);
                    }
                }
            }
            updated = true;
        }
        updated
    }

    /// A failed fetch or a malformed body leaves the cached feed and the
    /// rendered list exactly as they were; only the status line reports it.
    fn apply_feed_result(&mut self, result: Result<String>) {
        match result {
            Ok(body) => {
                let loaded = self.store.load(&body).map(|feed| {
                    (
                        feed.groups.len(),
                        feed.groups.iter().map(|g| g.links.len()).sum::<usize>(),
                        feed.fetched_at,
                    )
                });
                match loaded {
                    Ok((groups, links, fetched_at)) => {
                        let stamp = fetched_at.with_timezone(&chrono::Local).format("%H:%M");
                        self.status_message =
                            format!("Loaded {links} links in {groups} groups at {stamp}.");
                        self.rebuild_rows();
                    }
                    Err(err) => {
                        self.status_message = format!("Feed left unchanged: {err}");
                    }
                }
            }
            Err(err) => {
                self.status_message = format!("Fetch failed, keeping last feed: {err:#}");
            }
        }
        self.mark_dirty();
    }

    fn rebuild_rows(&mut self) {
        self.groups = self.store.visible_groups(&self.prefs);
        self.rows = build_rows(&self.groups);
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
        if let Some(idx) = nearest_link_row(&self.rows, self.selected) {
            self.selected = idx;
            self.list_state.select(Some(idx));
        } else {
            self.list_state.select(None);
        }
        self.mark_dirty();
    }

    fn selected_entry(&self) -> Option<&LinkEntry> {
        match self.rows.get(self.selected)? {
            Row::Link { group, index } => self.groups.get(*group)?.links.get(*index),
            Row::Header(_) => None,
        }
    }

    fn move_selection(&mut self, forward: bool) {
        if let Some(idx) = step_link_row(&self.rows, self.selected, forward) {
            self.selected = idx;
            self.list_state.select(Some(idx));
            self.mark_dirty();
        }
    }

    fn select_first(&mut self) {
        if let Some(idx) = nearest_link_row(&self.rows, 0) {
            self.selected = idx;
            self.list_state.select(Some(idx));
            self.mark_dirty();
        }
    }

    fn select_last(&mut self) {
        if let Some(idx) = self
            .rows
            .iter()
            .rposition(|row| matches!(row, Row::Link { .. }))
        {
            self.selected = idx;
            self.list_state.select(Some(idx));
            self.mark_dirty();
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.overlay.is_open() {
            match code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.overlay.close();
                    self.mark_dirty();
                }
                KeyCode::Char('o') => self.open_overlay_link(),
                _ => {}
            }
            return Ok(false);
        }

        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Char('g') | KeyCode::Home => self.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.select_last(),
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Char('c') => self.open_comments(),
            KeyCode::Char('r') => self.queue_refresh(),
            KeyCode::Char('n') => self.toggle_hide_nsfw(),
            KeyCode::Char('d') => self.toggle_dark_mode(),
            KeyCode::Char('w') => self.toggle_wide_content(),
            KeyCode::Char('u') => self.open_release_page(),
            _ => {}
        }
        Ok(false)
    }

    /// Only a click on the backdrop dismisses the overlay; clicks landing
    /// inside the content panel do not, mirroring the event-target check
    /// a modal backdrop click handler performs.
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(_)) {
            return;
        }
        if self.overlay.is_open() {
            let inside = self.overlay_area.is_some_and(|area| {
                mouse.column >= area.x
                    && mouse.column < area.x.saturating_add(area.width)
                    && mouse.row >= area.y
                    && mouse.row < area.y.saturating_add(area.height)
            });
            if !inside {
                self.overlay.close();
                self.mark_dirty();
            }
        }
    }

    fn activate_selected(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };
        match presenter::resolve_entry(&entry) {
            PresentationAction::OpenExternal { url } => self.open_in_browser(&url),
            action => {
                self.overlay.open(fragment_for(&action, &entry.title));
                self.mark_dirty();
            }
        }
    }

    fn open_comments(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };
        let Some(comment_url) = entry.comment_url.as_deref() else {
            self.status_message = "No discussion thread for this link.".to_string();
            self.mark_dirty();
            return;
        };
        let action = presenter::comment_action(comment_url);
        let mut fragment = fragment_for(&action, &entry.title);
        fragment.title = match entry.comment_number {
            Some(count) => format!("Comments ({count})"),
            None => "Comments".to_string(),
        };
        self.overlay.open(fragment);
        self.mark_dirty();
    }

    fn open_overlay_link(&mut self) {
        let link = self
            .overlay
            .content()
            .and_then(|fragment| fragment.link.clone());
        if let Some(url) = link {
            self.open_in_browser(&url);
        }
    }

    fn open_release_page(&mut self) {
        let url = self
            .update_notice
            .as_ref()
            .map(|info| info.release_url.clone());
        if let Some(url) = url {
            self.open_in_browser(&url);
        }
    }

    fn open_in_browser(&mut self, url: &str) {
        match webbrowser::open(url) {
            Ok(()) => self.status_message = format!("Opened {url} in browser."),
            Err(err) => self.status_message = format!("Failed to open {url}: {err}"),
        }
        self.mark_dirty();
    }

    /// Re-filters the cached feed synchronously; no fetch is issued.
    fn toggle_hide_nsfw(&mut self) {
        self.prefs.hide_nsfw = !self.prefs.hide_nsfw;
        self.persist_pref(prefs::KEY_HIDE_NSFW, self.prefs.hide_nsfw);
        self.rebuild_rows();
        self.status_message = if self.prefs.hide_nsfw {
            "Hiding NSFW links.".to_string()
        } else {
            "Showing NSFW links.".to_string()
        };
        self.mark_dirty();
    }

    fn toggle_dark_mode(&mut self) {
        self.prefs.dark_mode = !self.prefs.dark_mode;
        self.persist_pref(prefs::KEY_DARK_MODE, self.prefs.dark_mode);
        self.mark_dirty();
    }

    fn toggle_wide_content(&mut self) {
        self.prefs.wide_content = !self.prefs.wide_content;
        self.persist_pref(prefs::KEY_CONTENT_WIDTH, self.prefs.wide_content);
        self.mark_dirty();
    }

    fn persist_pref(&mut self, key: &str, value: bool) {
        let Some(port) = self.prefs_port.as_ref() else {
            return;
        };
        if let Err(err) = port.set(key, prefs::encode_bool(value)) {
            self.status_message = format!("Failed to save {key}: {err}");
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let palette = if self.prefs.dark_mode { &DARK } else { &LIGHT };
        let area = frame.size();

        let mut constraints = Vec::with_capacity(3);
        if self.update_notice.is_some() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut next = 0;
        if let Some(info) = &self.update_notice {
            let banner = Paragraph::new(format!(
                "Update available: {} → {} — press u to view the release",
                self.current_version, info.version
            ))
            .style(Style::default().fg(palette.header));
            frame.render_widget(banner, chunks[next]);
            next += 1;
        }

        self.draw_list(frame, chunks[next], palette);
        self.draw_status(frame, chunks[next + 1], palette);

        if self.overlay.is_open() {
            self.draw_overlay(frame, area, palette);
        } else {
            self.overlay_area = None;
        }
    }

    fn draw_list(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let inner_width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Header(group) => ListItem::new(Line::from(Span::styled(
                    self.groups[*group].date.clone(),
                    Style::default()
                        .fg(palette.header)
                        .add_modifier(Modifier::BOLD),
                ))),
                Row::Link { group, index } => {
                    let entry = &self.groups[*group].links[*index];
                    ListItem::new(link_line(entry, palette, inner_width))
                }
            })
            .collect();

        let title = if self.groups.is_empty() {
            " Links ".to_string()
        } else {
            let shown: usize = self.groups.iter().map(|g| g.links.len()).sum();
            format!(" Links ({shown}) ")
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.border))
                    .title(title),
            )
            .style(Style::default().fg(palette.text))
            .highlight_style(Style::default().bg(palette.selected_bg))
            .highlight_symbol("› ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_status(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let mut spans = Vec::new();
        if self.fetch_in_progress {
            spans.push(Span::styled(
                format!("{} ", self.spinner.glyph()),
                Style::default().fg(palette.header),
            ));
        }
        spans.push(Span::styled(
            self.status_message.clone(),
            Style::default().fg(palette.text),
        ));
        spans.push(Span::styled(
            format!("  {KEY_HINTS}"),
            Style::default().fg(palette.dim),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_overlay(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let Some(fragment) = self.overlay.content() else {
            self.overlay_area = None;
            return;
        };

        let width_pct = if self.prefs.wide_content { 80 } else { 50 };
        let overlay_area = centered_rect(width_pct, 60, area);

        let mut lines: Vec<Line> = fragment
            .body
            .iter()
            .map(|line| Line::from(line.clone()))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "o open in browser · Esc close",
            Style::default().fg(palette.dim),
        )));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.header))
            .style(Style::default().bg(palette.panel_bg))
            .title(format!(" {} ", fragment.title));

        frame.render_widget(Clear, overlay_area);
        frame.render_widget(
            Paragraph::new(lines)
                .style(Style::default().fg(palette.text))
                .wrap(Wrap { trim: false })
                .block(block),
            overlay_area,
        );
        self.overlay_area = Some(overlay_area);
    }
}

fn build_rows(groups: &[DateGroup]) -> Vec<Row> {
    let mut rows = Vec::new();
    for (g, group) in groups.iter().enumerate() {
        rows.push(Row::Header(g));
        for i in 0..group.links.len() {
            rows.push(Row::Link { group: g, index: i });
        }
    }
    rows
}

fn nearest_link_row(rows: &[Row], from: usize) -> Option<usize> {
    let from = from.min(rows.len());
    rows.iter()
        .skip(from)
        .position(|row| matches!(row, Row::Link { .. }))
        .map(|offset| from + offset)
        .or_else(|| {
            rows[..from]
                .iter()
                .rposition(|row| matches!(row, Row::Link { .. }))
        })
}

fn step_link_row(rows: &[Row], current: usize, forward: bool) -> Option<usize> {
    if forward {
        rows.iter()
            .enumerate()
            .skip(current + 1)
            .find(|(_, row)| matches!(row, Row::Link { .. }))
            .map(|(idx, _)| idx)
    } else {
        rows[..current.min(rows.len())]
            .iter()
            .rposition(|row| matches!(row, Row::Link { .. }))
    }
}

fn link_line(entry: &LinkEntry, palette: &Palette, max_width: usize) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    if !entry.icon.is_empty() {
        spans.push(Span::styled(
            format!("[{}] ", entry.icon),
            Style::default().fg(palette.dim),
        ));
    }
    spans.push(Span::raw(truncate_to_width(&entry.title, max_width)));
    if entry.nsfw {
        spans.push(Span::styled(
            " (NSFW)",
            Style::default().fg(palette.nsfw),
        ));
    }
    if let Some(count) = entry.comment_number {
        spans.push(Span::styled(
            format!("  {count} comments"),
            Style::default().fg(palette.dim),
        ));
    }
    Line::from(spans)
}

/// Materializes overlay content for an embed action. External opens never
/// reach this; they bypass the overlay entirely.
fn fragment_for(action: &PresentationAction, entry_title: &str) -> Fragment {
    let (label, url) = match action {
        PresentationAction::EmbedVideo { embed_url } => ("YouTube video", embed_url),
        PresentationAction::EmbedImage { url } => ("Image", url),
        PresentationAction::EmbedVideoFile { url } => ("Video file", url),
        PresentationAction::EmbedIframe { url } => ("Embedded page", url),
        PresentationAction::OpenExternal { url } => ("External link", url),
    };
    Fragment {
        title: label.to_string(),
        body: vec![entry_title.to_string(), String::new(), url.clone()],
        link: Some(url.clone()),
    }
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width + 1 > max_width {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::LinkType;

    fn model_with_feed(body: &str) -> Model {
        let mut model = Model::new(Options {
            status_message: String::new(),
            client: None,
            prefs: Preferences::default(),
            prefs_port: None,
            config_path: "~/.config/exz-tui/config.yaml".to_string(),
            fetch_on_start: false,
        });
        model.apply_feed_result(Ok(body.to_string()));
        model
    }

    fn sample_body() -> &'static str {
        r#"[
            {"date": "Idag", "links": [
                {"title": "Clip", "type": "youtube", "src": "dQw4w9WgXcQ", "icon": "Film", "nsfw": false},
                {"title": "Spicy", "type": "redirect", "src": "https://example.com/x", "icon": "Bild", "nsfw": true}
            ]},
            {"date": "Igår", "links": [
                {"title": "Racy", "type": "image", "src": "https://example.com/y.png", "icon": "Bild", "nsfw": true}
            ]}
        ]"#
    }

    #[test]
    fn rows_interleave_headers_and_links() {
        let mut model = model_with_feed(sample_body());
        model.prefs.hide_nsfw = false;
        model.rebuild_rows();
        assert_eq!(
            model.rows,
            vec![
                Row::Header(0),
                Row::Link { group: 0, index: 0 },
                Row::Link { group: 0, index: 1 },
                Row::Header(1),
                Row::Link { group: 1, index: 0 },
            ]
        );
    }

    #[test]
    fn filtered_out_group_keeps_header_row() {
        let model = model_with_feed(sample_body());
        // hide_nsfw defaults true, so the second group has no links left.
        assert_eq!(
            model.rows,
            vec![Row::Header(0), Row::Link { group: 0, index: 0 }, Row::Header(1)]
        );
    }

    #[test]
    fn selection_skips_headers() {
        let mut model = model_with_feed(sample_body());
        model.prefs.hide_nsfw = false;
        model.rebuild_rows();
        model.select_first();
        assert_eq!(model.selected, 1);
        model.move_selection(true);
        assert_eq!(model.selected, 2);
        model.move_selection(true);
        assert_eq!(model.selected, 4);
        model.move_selection(true);
        assert_eq!(model.selected, 4);
        model.move_selection(false);
        assert_eq!(model.selected, 2);
    }

    #[test]
    fn nsfw_toggle_refilters_cached_feed() {
        let mut model = model_with_feed(sample_body());
        let shown: usize = model.groups.iter().map(|g| g.links.len()).sum();
        assert_eq!(shown, 1);

        model.toggle_hide_nsfw();
        let shown: usize = model.groups.iter().map(|g| g.links.len()).sum();
        assert_eq!(shown, 3);

        model.toggle_hide_nsfw();
        let shown: usize = model.groups.iter().map(|g| g.links.len()).sum();
        assert_eq!(shown, 1);
    }

    #[test]
    fn malformed_fetch_keeps_rendered_rows() {
        let mut model = model_with_feed(sample_body());
        let rows_before = model.rows.clone();
        model.apply_feed_result(Ok(r#"{"oops": true}"#.to_string()));
        assert_eq!(model.rows, rows_before);
        assert!(model.status_message.contains("unchanged"));
    }

    #[test]
    fn failed_fetch_keeps_rendered_rows() {
        let mut model = model_with_feed(sample_body());
        let rows_before = model.rows.clone();
        model.apply_feed_result(Err(anyhow::anyhow!("connection refused")));
        assert_eq!(model.rows, rows_before);
        assert!(model.status_message.contains("keeping last feed"));
    }

    #[test]
    fn activating_embed_link_opens_overlay() {
        let mut model = model_with_feed(sample_body());
        model.select_first();
        model.activate_selected();
        assert!(model.overlay.is_open());
        let fragment = model.overlay.content().unwrap();
        assert_eq!(fragment.title, "YouTube video");
        assert_eq!(
            fragment.link.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        use crossterm::event::{KeyModifiers, MouseButton};
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::empty(),
        }
    }

    #[test]
    fn backdrop_click_dismisses_overlay_but_panel_click_does_not() {
        let mut model = model_with_feed(sample_body());
        model.select_first();
        model.activate_selected();
        assert!(model.overlay.is_open());
        model.overlay_area = Some(Rect::new(10, 5, 20, 10));

        model.handle_mouse(click(15, 8));
        assert!(model.overlay.is_open());

        model.handle_mouse(click(2, 2));
        assert!(!model.overlay.is_open());
        assert!(model.overlay.content().is_none());
    }

    #[test]
    fn click_on_panel_edge_counts_as_backdrop() {
        let mut model = model_with_feed(sample_body());
        model.select_first();
        model.activate_selected();
        model.overlay_area = Some(Rect::new(10, 5, 20, 10));

        // The rect bounds are exclusive on the right and bottom.
        model.handle_mouse(click(30, 8));
        assert!(!model.overlay.is_open());
    }

    #[test]
    fn clicks_without_an_overlay_are_ignored() {
        let mut model = model_with_feed(sample_body());
        model.handle_mouse(click(3, 3));
        assert!(!model.overlay.is_open());
    }

    #[test]
    fn comment_fragment_targets_discussion_site() {
        let fragment = fragment_for(&presenter::comment_action("t/123"), "Spicy");
        assert_eq!(fragment.link.as_deref(), Some("https://existenz.se/t/123"));
    }

    #[test]
    fn fragment_labels_match_action_kind() {
        let image = fragment_for(
            &presenter::resolve(LinkType::Image, "https://e.com/a.png"),
            "pic",
        );
        assert_eq!(image.title, "Image");
        let video = fragment_for(
            &presenter::resolve(LinkType::Plain, "https://e.com/a.mp4"),
            "clip",
        );
        assert_eq!(video.title, "Video file");
        let page = fragment_for(
            &presenter::resolve(LinkType::Iframe, "https://e.com/page"),
            "page",
        );
        assert_eq!(page.title, "Embedded page");
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        let truncated = truncate_to_width("a rather long link title", 10);
        assert!(truncated.ends_with('…'));
        assert!(UnicodeWidthStr::width(truncated.as_str()) <= 10);
        let wide = truncate_to_width("日本語のタイトル", 6);
        assert!(UnicodeWidthStr::width(wide.as_str()) <= 6);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(80, 60, area);
        assert!(rect.x >= area.x && rect.y >= area.y);
        assert!(rect.x + rect.width <= area.width);
        assert!(rect.y + rect.height <= area.height);
        let narrow = centered_rect(50, 60, area);
        assert!(narrow.width < rect.width);
    }
}
