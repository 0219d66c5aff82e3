//! NowPlaying component: persistent bottom bar.
//!
//! Left: animated wave, station name and "Now Playing". Right: volume gauge
//! for the playing station. Not focusable.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, C_ACCENT, C_ERROR, C_PANEL_BORDER, C_PRIMARY},
    transport::Transport,
    widgets::text,
};

const WAVE_LEVELS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇'];
const GAUGE_CELLS: usize = 10;

pub struct NowPlaying;

impl NowPlaying {
    pub fn new() -> Self {
        Self
    }
}

impl Component for NowPlaying {
    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(C_PANEL_BORDER));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(station) = state.playing.as_ref() else {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  Nothing playing. Select a station and press Enter.",
                    style_muted(),
                )),
                inner,
            );
            return;
        };

        let transport = state.transport_for(station.id());
        let gauge = gauge_line(&transport);
        let gauge_w = gauge
            .spans
            .iter()
            .map(|s| text::width(&s.content))
            .sum::<usize>() as u16
            + 1;
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(gauge_w)])
            .split(inner);

        let room = (cols[0].width as usize).saturating_sub(22);
        let left = Line::from(vec![
            Span::raw("  "),
            Span::styled(wave(state.frame), Style::default().fg(C_ACCENT)),
            Span::raw("  "),
            Span::styled(
                text::truncate(&station.name, room),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Now Playing", style_secondary()),
        ]);
        frame.render_widget(Paragraph::new(left), cols[0]);
        frame.render_widget(Paragraph::new(gauge), cols[1]);
    }
}

/// Four bars bouncing out of phase, one step per frame.
fn wave(frame: u64) -> String {
    let period = (WAVE_LEVELS.len() - 1) * 2;
    (0..4)
        .map(|i| {
            let t = (frame as usize + i * 2) % period;
            let level = if t < WAVE_LEVELS.len() { t } else { period - t };
            WAVE_LEVELS[level]
        })
        .collect()
}

fn gauge_line(transport: &Transport) -> Line<'static> {
    let filled = (transport.effective() * GAUGE_CELLS as f32).round() as usize;
    let bar: String = (0..GAUGE_CELLS)
        .map(|i| if i < filled { '▮' } else { '▯' })
        .collect();
    if transport.is_muted() {
        Line::from(vec![
            Span::styled("🔇 ", Style::default().fg(C_ERROR)),
            Span::styled(bar, style_muted()),
            Span::styled(" muted ", Style::default().fg(C_ERROR)),
        ])
    } else {
        Line::from(vec![
            Span::styled("🔊 ", style_secondary()),
            Span::styled(bar, Style::default().fg(C_ACCENT)),
            Span::styled(
                format!(" {:>3.0}% ", transport.volume() * 100.0),
                style_secondary(),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_animates() {
        assert_eq!(wave(0).chars().count(), 4);
        assert_ne!(wave(0), wave(1));
        // Period of the triangle wave.
        assert_eq!(wave(0), wave(12));
    }

    #[test]
    fn test_gauge_reflects_mute() {
        let mut t = Transport::new(0.5);
        let line = gauge_line(&t);
        assert!(line.spans[1].content.starts_with("▮▮▮▮▮▯"));
        t.toggle_mute();
        let line = gauge_line(&t);
        assert!(line.spans[1].content.chars().all(|c| c == '▯'));
        assert_eq!(line.spans[2].content, " muted ");
    }
}
