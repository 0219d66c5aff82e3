//! Header component: 1-row top bar.
//!
//! Brand and tagline on the left; view, result counts and favorites count
//! on the right. Not focusable.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    app_state::{AppState, ViewMode},
    component::Component,
    theme::{style_accent, style_muted, style_secondary, C_CONNECTING, C_FAVORITE},
    widgets::text,
};

const TAGLINE: &str = "Listen to your favorite Indian radio stations from anywhere in the world";

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Header {
    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let right = right_summary(state);
        let right_w = text::width(&right) as u16 + 1;
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(right_w)])
            .split(area);

        let brand = " ◉ RadioX ";
        let tagline_room = (cols[0].width as usize).saturating_sub(text::width(brand) + 1);
        let left = Line::from(vec![
            Span::styled(brand, style_accent()),
            Span::styled(text::truncate(TAGLINE, tagline_room), style_muted()),
        ]);
        frame.render_widget(Paragraph::new(left), cols[0]);

        let mut spans = Vec::new();
        if state.loading {
            spans.push(Span::styled("loading… ", Style::default().fg(C_CONNECTING)));
        }
        spans.push(Span::styled(
            format!("♥ {} ", state.favorites_count),
            Style::default().fg(C_FAVORITE),
        ));
        spans.push(Span::styled(view_summary(state), style_secondary()));
        frame.render_widget(Paragraph::new(Line::from(spans)).right_aligned(), cols[1]);
    }
}

fn view_summary(state: &AppState) -> String {
    match state.view {
        ViewMode::All if state.query.is_empty() => {
            format!("{} · {}/{} ", state.view.label(), state.rows.len(), state.total_stations)
        }
        ViewMode::All => format!(
            "{} · \"{}\" {}/{} ",
            state.view.label(),
            text::truncate(&state.query, 16),
            state.rows.len(),
            state.matching_stations
        ),
        ViewMode::Favorites => format!("{} · {} ", state.view.label(), state.rows.len()),
    }
}

fn right_summary(state: &AppState) -> String {
    let loading = if state.loading { "loading… " } else { "" };
    format!("{}♥ {} {}", loading, state.favorites_count, view_summary(state))
}
