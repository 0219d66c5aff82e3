//! StationList component: the main pane.
//!
//! Renders `AppState::rows` for the current view, followed by a "load more"
//! row while the search has unrevealed results.

use std::time::Instant;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use radiox_core::station::Station;

use crate::{
    action::Action,
    app_state::{AppState, ViewMode},
    component::Component,
    theme::{
        C_ACCENT, C_CONNECTING, C_ERROR, C_FAVORITE, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY,
        C_SELECTION_BG, C_TAG,
    },
    widgets::{
        list_cursor::ListCursor,
        pane_chrome::{pane_chrome, Badge},
        text,
    },
};

const SPINNER: &[&str] = &["◐", "◓", "◑", "◒"];

/// What a list row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Station(usize),
    LoadMore,
}

pub struct StationList {
    cursor: ListCursor,
    /// Track last click (row index, time) for double-click detection.
    last_click: Option<(usize, Instant)>,
}

impl StationList {
    pub fn new() -> Self {
        Self {
            cursor: ListCursor::new(),
            last_click: None,
        }
    }

    /// Re-read the row count after `AppState::rows` changed.  `reset` moves
    /// the cursor back to the top (new query, new view).
    pub fn sync_rows(&mut self, state: &AppState, reset: bool) {
        self.cursor.set_len(row_count(state));
        if reset {
            self.cursor.reset();
        }
    }

    pub fn selected_row(&self, state: &AppState) -> Option<Row> {
        let idx = self.cursor.selected()?;
        row_at(state, idx)
    }

    pub fn selected_station<'a>(&self, state: &'a AppState) -> Option<&'a Station> {
        match self.selected_row(state)? {
            Row::Station(i) => state.rows.get(i),
            Row::LoadMore => None,
        }
    }

    fn activate(&self, state: &AppState) -> Vec<Action> {
        match self.selected_row(state) {
            Some(Row::Station(i)) => state
                .rows
                .get(i)
                .map(|s| vec![Action::TogglePlay(s.clone())])
                .unwrap_or_default(),
            Some(Row::LoadMore) => vec![Action::LoadMore],
            None => vec![],
        }
    }

    fn render_station<'a>(
        &self,
        station: &'a Station,
        is_selected: bool,
        width: usize,
        state: &AppState,
    ) -> ListItem<'a> {
        let id = station.id();
        let is_playing = state.is_playing(id);
        let error = state.error_for(id);

        let (icon, icon_color): (&str, Color) = if state.is_connecting(id) {
            (SPINNER[(state.frame as usize) % SPINNER.len()], C_CONNECTING)
        } else if is_playing {
            ("▶", C_PLAYING)
        } else if error.is_some() {
            ("✗", C_ERROR)
        } else {
            (" ", C_MUTED)
        };

        let fav = if state.is_favorite(id) { "♥" } else { " " };

        let name_color = if is_playing {
            C_PLAYING
        } else if is_selected {
            C_PRIMARY
        } else {
            C_SECONDARY
        };
        let name_style = if is_playing || is_selected {
            Style::default().fg(name_color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(name_color)
        };

        let language = if station.language.is_empty() {
            "Unknown"
        } else {
            station.language.as_str()
        };
        let tags = if station.tags.is_empty() {
            "No tags".to_string()
        } else {
            station.tag_list().join(", ")
        };

        // " ♥ ▶  " prefix is 6 columns.
        let room = width.saturating_sub(6);
        let name = text::truncate(&station.name, room.min(40));
        let mut used = text::width(&name);

        let mut spans: Vec<Span> = vec![
            Span::raw(" "),
            Span::styled(fav, Style::default().fg(C_FAVORITE)),
            Span::raw(" "),
            Span::styled(icon.to_string(), Style::default().fg(icon_color)),
            Span::raw("  "),
            Span::styled(name, name_style),
        ];

        if let Some(msg) = error {
            let msg = text::truncate(msg, room.saturating_sub(used + 2));
            used += text::width(&msg) + 2;
            spans.push(Span::raw("  "));
            spans.push(Span::styled(msg, Style::default().fg(C_ERROR)));
        } else if is_playing {
            spans.push(Span::styled("  Playing", Style::default().fg(C_ACCENT)));
            used += 9;
        }

        let meta_room = room.saturating_sub(used + 2);
        if meta_room > 3 {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                text::truncate(language, meta_room),
                Style::default().fg(C_SECONDARY),
            ));
            let after_lang = meta_room.saturating_sub(text::width(language) + 3);
            if after_lang > 3 {
                spans.push(Span::styled(" • ", Style::default().fg(C_MUTED)));
                spans.push(Span::styled(
                    text::truncate(&tags, after_lang),
                    Style::default().fg(C_TAG),
                ));
            }
        }

        let bg = if is_selected {
            Style::default().bg(C_SELECTION_BG)
        } else {
            Style::default()
        };
        ListItem::new(Line::from(spans)).style(bg)
    }
}

fn row_count(state: &AppState) -> usize {
    state.rows.len() + usize::from(shows_load_more(state))
}

fn row_at(state: &AppState, idx: usize) -> Option<Row> {
    if idx < state.rows.len() {
        Some(Row::Station(idx))
    } else if idx == state.rows.len() && shows_load_more(state) {
        Some(Row::LoadMore)
    } else {
        None
    }
}

fn shows_load_more(state: &AppState) -> bool {
    state.view == ViewMode::All && state.has_more
}

fn empty_message(state: &AppState) -> &'static str {
    match state.view {
        _ if state.loading => "Loading stations…",
        ViewMode::Favorites => "No favorite stations yet. Add some stations to your favorites!",
        ViewMode::All => "No stations found matching your search.",
    }
}

impl Component for StationList {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.cursor.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.select_down(step),
            KeyCode::PageUp => self.cursor.select_up(10),
            KeyCode::PageDown => self.cursor.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.cursor.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.cursor.select_last(),

            KeyCode::Enter | KeyCode::Char(' ') => return self.activate(state),

            KeyCode::Char('f') => {
                if let Some(st) = self.selected_station(state) {
                    return vec![Action::ToggleFavorite(st.clone())];
                }
            }
            KeyCode::Char('n') if shows_load_more(state) => return vec![Action::LoadMore],

            KeyCode::Char('y') => {
                if let Some(st) = self.selected_station(state) {
                    let text = if st.homepage.is_empty() {
                        st.stream_url().to_string()
                    } else {
                        st.homepage.clone()
                    };
                    if !text.is_empty() {
                        return vec![Action::CopyToClipboard(text)];
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let rel_row = event.row.saturating_sub(area.y + 1) as usize; // +1 for border
        match event.kind {
            MouseEventKind::ScrollUp => self.cursor.select_up(1),
            MouseEventKind::ScrollDown => self.cursor.select_down(1),
            // The top border row is not a list row.
            MouseEventKind::Down(MouseButton::Left) if event.row <= area.y => {}
            MouseEventKind::Down(MouseButton::Left) => {
                let now = Instant::now();
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);

                if self.cursor.click(rel_row) && is_double {
                    self.last_click = None;
                    return self.activate(state);
                }
                self.last_click = Some((rel_row, now));
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if state.loading {
            Some(Badge {
                text: "LOADING".into(),
                color: C_CONNECTING,
            })
        } else if state.error.is_some() && state.view == ViewMode::All {
            Some(Badge {
                text: "ERR".into(),
                color: C_ERROR,
            })
        } else {
            None
        };
        let title = match state.view {
            ViewMode::All => "stations",
            ViewMode::Favorites => "favorites",
        };
        let block = pane_chrome(title, focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.cursor.set_len(row_count(state));
        if self.cursor.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  {}", empty_message(state)),
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        self.cursor.ensure_visible(height);
        let selected = self.cursor.selected();
        let width = inner.width as usize;

        let items: Vec<ListItem> = self
            .cursor
            .visible_range(height)
            .filter_map(|idx| {
                let is_selected = selected == Some(idx);
                match row_at(state, idx)? {
                    Row::Station(i) => {
                        Some(self.render_station(&state.rows[i], is_selected, width, state))
                    }
                    Row::LoadMore => {
                        let style = if is_selected {
                            Style::default()
                                .fg(C_ACCENT)
                                .bg(C_SELECTION_BG)
                                .add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(C_ACCENT)
                        };
                        Some(ListItem::new(Line::from(vec![
                            Span::styled("     ⤓ Load More Stations", style),
                            Span::styled(
                                format!("  ({} of {})", state.rows.len(), state.matching_stations),
                                Style::default().fg(C_MUTED),
                            ),
                        ])))
                    }
                }
            })
            .collect();

        frame.render_widget(List::new(items), inner);
    }
}
