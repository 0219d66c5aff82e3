//! StationDetails component: side pane describing the selected station.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use radiox_core::station::Station;

use crate::{
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, C_ERROR, C_FAVORITE, C_LOCATION, C_PLAYING, C_PRIMARY, C_TAG},
    widgets::pane_chrome::pane_chrome,
};

pub struct StationDetails;

impl StationDetails {
    pub fn new() -> Self {
        Self
    }
}

impl Component for StationDetails {
    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("details", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = match state.selected.as_ref() {
            Some(station) => detail_lines(station, state),
            None => vec![Line::from(Span::styled("  no station selected", style_muted()))],
        };
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}

fn field<'a>(label: &'a str, value: String, style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<10}", label), style_muted()),
        Span::styled(value, style),
    ])
}

fn or_dash(s: &str) -> String {
    if s.is_empty() {
        "—".to_string()
    } else {
        s.to_string()
    }
}

fn detail_lines<'a>(station: &'a Station, state: &AppState) -> Vec<Line<'a>> {
    let id = station.id();
    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}", station.name),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Bitrate", format!("{}kbps", station.bitrate), style_secondary()),
        field("Codec", or_dash(&station.codec), style_secondary()),
        field("Country", or_dash(&station.country), Style::default().fg(C_LOCATION)),
        field("Language", or_dash(&station.language), style_secondary()),
        field("Tags", or_dash(&station.tag_list().join(", ")), Style::default().fg(C_TAG)),
        field(
            "Votes",
            format!("{}  ·  {} clicks", station.votes, station.clickcount),
            style_secondary(),
        ),
    ];
    if !station.homepage.is_empty() {
        lines.push(field(
            "Homepage",
            station.homepage.clone(),
            Style::default().fg(C_TAG).add_modifier(Modifier::UNDERLINED),
        ));
    }
    lines.push(field("Stream", or_dash(station.stream_url()), style_muted()));
    lines.push(Line::from(""));

    let transport = state.transport_for(id);
    let volume = if transport.is_muted() {
        "muted".to_string()
    } else {
        format!("{:.0}%", transport.volume() * 100.0)
    };
    lines.push(field("Volume", volume, style_secondary()));

    if let Some(added) = state.favorite_added_at(id) {
        let since = format_added(added)
            .map(|t| format!("♥ since {}", t))
            .unwrap_or_else(|| "♥ yes".into());
        lines.push(field("Favorite", since, Style::default().fg(C_FAVORITE)));
    }
    if state.is_playing(id) {
        lines.push(field("Status", "Now Playing".into(), Style::default().fg(C_PLAYING)));
    } else if state.is_connecting(id) {
        lines.push(field("Status", "connecting…".into(), style_secondary()));
    } else if let Some(err) = state.error_for(id) {
        lines.push(field("Status", err.to_string(), Style::default().fg(C_ERROR)));
    }
    lines
}

fn format_added(millis: i64) -> Option<String> {
    let ts = chrono::DateTime::from_timestamp_millis(millis)?;
    Some(ts.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_details_show_bitrate_codec_and_homepage() {
        let station = Station {
            changeuuid: "a".into(),
            name: "Radio City".into(),
            bitrate: 128,
            codec: "MP3".into(),
            homepage: "https://radiocity.in".into(),
            ..Station::default()
        };
        let state = AppState::new(0.5);
        let text = plain(&detail_lines(&station, &state));
        assert!(text.iter().any(|l| l.contains("128kbps")));
        assert!(text.iter().any(|l| l.contains("MP3")));
        assert!(text.iter().any(|l| l.contains("https://radiocity.in")));
        assert!(text.iter().any(|l| l.contains("50%")));
    }

    #[test]
    fn test_homepage_row_omitted_when_blank() {
        let station = Station {
            changeuuid: "a".into(),
            ..Station::default()
        };
        let state = AppState::new(1.0);
        let text = plain(&detail_lines(&station, &state));
        assert!(!text.iter().any(|l| l.contains("Homepage")));
    }

    #[test]
    fn test_favorite_shows_date_added() {
        let station = Station {
            changeuuid: "a".into(),
            ..Station::default()
        };
        let mut state = AppState::new(1.0);
        // 2024-06-15T12:00:00Z; local date may shift by a day.
        state.favorites_added.insert("a".into(), 1_718_452_800_000);
        let text = plain(&detail_lines(&station, &state));
        assert!(text.iter().any(|l| l.contains("♥ since 2024-06-1")));
    }
}
