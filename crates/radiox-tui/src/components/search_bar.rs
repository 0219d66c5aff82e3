//! SearchBar component: one-row search box above the station list.

use ratatui::crossterm::event::{KeyEvent, KeyEventKind};
use ratatui::{layout::Rect, Frame};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    widgets::filter_input::{FilterAction, FilterInput},
};

pub const PLACEHOLDER: &str = "Search stations by name, language, or tags...";

pub struct SearchBar {
    input: FilterInput,
}

impl SearchBar {
    pub fn new() -> Self {
        Self {
            input: FilterInput::new(PLACEHOLDER),
        }
    }
}

#[cfg(test)]
impl SearchBar {
    pub fn is_active(&self) -> bool {
        self.input.is_active()
    }

    pub fn text(&self) -> &str {
        self.input.text()
    }
}

impl Component for SearchBar {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match self.input.handle_key(key) {
            FilterAction::Changed(q) => vec![Action::SearchEdited(q)],
            FilterAction::Confirmed(q) => vec![Action::SearchSubmitted(q), Action::CloseSearch],
            FilterAction::Cancelled => vec![Action::CloseSearch],
            FilterAction::None => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenSearch => self.input.activate(),
            Action::CloseSearch => self.input.deactivate(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        self.input.draw(frame, area);
    }
}
