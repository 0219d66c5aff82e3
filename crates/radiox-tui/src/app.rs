//! App: component-based event loop.
//!
//! Architecture:
//! - `App` owns the core state objects (search, favorites, playback), all
//!   components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks; stream players report on a second channel.
//! - The event loop draws each frame, then awaits the next message or tick.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use radiox_core::{
    config::Config,
    error::{DirectoryError, PlaybackError},
    platform,
    station::Station,
    storage::FileStore,
    Debouncer, DirectoryClient, DirectoryFeed, FavoritesStore, PlaybackCoordinator, RequestSlot,
    RequestTicket, SearchController,
};

use crate::{
    action::Action,
    app_state::{AppState, StationStatus, ViewMode},
    component::Component,
    components::{
        header::Header, help_overlay::HelpOverlay, now_playing::NowPlaying,
        search_bar::SearchBar, station_details::StationDetails, station_list::StationList,
    },
    player::{PlayerEvent, StreamPlayer},
    theme::{C_BG, C_ERROR, C_MUTED},
    transport::Transport,
    widgets::{
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

/// How long a playback failure stays next to its station.
const ERROR_DISPLAY: Duration = Duration::from_secs(5);
/// Below this width the details pane is hidden even when toggled on.
const DETAILS_MIN_WIDTH: u16 = 80;

/// Messages the event loop receives from background tasks.
enum AppMessage {
    Event(Event),
    StationsLoaded(RequestTicket, Result<Vec<Station>, DirectoryError>),
}

/// Last drawn rects, for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
struct PaneAreas {
    search_bar: Rect,
    station_list: Rect,
}

pub struct App {
    config: Config,

    // ── Core state ────────────────────────────────────────────────────────
    client: DirectoryClient,
    slot: RequestSlot,
    feed: DirectoryFeed,
    search: SearchController,
    debouncer: Debouncer,
    favorites: FavoritesStore<FileStore>,
    coordinator: PlaybackCoordinator,

    // ── Players ───────────────────────────────────────────────────────────
    players: HashMap<String, StreamPlayer>,
    mpv_binary: Option<PathBuf>,
    next_attempt: u64,
    stderr_log: PathBuf,

    // ── Channels ──────────────────────────────────────────────────────────
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    player_tx: mpsc::Sender<PlayerEvent>,
    player_rx: Option<mpsc::Receiver<PlayerEvent>>,

    // ── UI ────────────────────────────────────────────────────────────────
    state: AppState,
    toast: ToastManager,
    header: Header,
    search_bar: SearchBar,
    station_list: StationList,
    station_details: StationDetails,
    now_playing: NowPlaying,
    help_overlay: HelpOverlay,
    pane_areas: PaneAreas,

    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let data_dir = config.paths.data_dir.clone();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;

        let client = DirectoryClient::new(&config.directory)?;
        let favorites = FavoritesStore::load(FileStore::new(&data_dir));
        info!(
            "[app] {} favorites loaded from {}",
            favorites.len(),
            data_dir.display()
        );

        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let (player_tx, player_rx) = mpsc::channel::<PlayerEvent>(64);

        let mut app = Self {
            client,
            slot: RequestSlot::new(),
            feed: DirectoryFeed::default(),
            search: SearchController::new(config.browse.page_size),
            debouncer: Debouncer::new(Duration::from_millis(config.browse.search_debounce_ms)),
            favorites,
            coordinator: PlaybackCoordinator::new(),
            players: HashMap::new(),
            next_attempt: 0,
            mpv_binary: platform::find_mpv_binary(),
            stderr_log: data_dir.join("mpv-stderr.log"),
            tx,
            rx: Some(rx),
            player_tx,
            player_rx: Some(player_rx),
            state: AppState::new(config.player.default_volume),
            toast: ToastManager::new(),
            header: Header::new(),
            search_bar: SearchBar::new(),
            station_list: StationList::new(),
            station_details: StationDetails::new(),
            now_playing: NowPlaying::new(),
            help_overlay: HelpOverlay::new(),
            pane_areas: PaneAreas::default(),
            should_quit: false,
            config,
        };
        app.refresh_view(true);
        Ok(app)
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        self.shutdown();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut rx = self.rx.take().context("event loop already running")?;
        let mut player_rx = self
            .player_rx
            .take()
            .context("event loop already running")?;

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            if event_tx.is_closed() {
                break;
            }
            match event::poll(Duration::from_millis(250)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(_) => break,
            }
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Initial fetch ─────────────────────────────────────────────────────
        self.reload();

        // ── Periodic timers ───────────────────────────────────────────────────
        // Animation, toast expiry and per-station error expiry.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Search debounce resolution; finer than the quiet period.
        let mut search_tick = tokio::time::interval(Duration::from_millis(25));
        search_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        redraw |= self.handle_message(next);
                    }
                    needs_redraw = redraw;
                }

                Some(event) = player_rx.recv() => {
                    self.on_player_event(event);
                    self.refresh_view(false);
                    needs_redraw = true;
                }

                _ = search_tick.tick() => {
                    if self.debouncer.is_pending() {
                        if let Some(query) = self.debouncer.poll(Instant::now()) {
                            self.apply_query(&query);
                            needs_redraw = true;
                        }
                    }
                }

                _ = ui_tick.tick() => {
                    self.state.frame = self.state.frame.wrapping_add(1);
                    self.state.expire_status(Instant::now());
                    self.toast.tick();
                    needs_redraw = true;
                }
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a);
                    }
                    self.refresh_view(false);
                }
                Event::Mouse(mouse) => {
                    if matches!(mouse.kind, MouseEventKind::Moved) {
                        return false;
                    }
                    for a in self.handle_mouse(mouse) {
                        self.dispatch(a);
                    }
                    self.refresh_view(false);
                }
                Event::Resize(_, _) => {}
                _ => return false,
            },
            AppMessage::StationsLoaded(ticket, result) => {
                self.on_stations_loaded(ticket, result);
            }
        }
        true
    }

    // ── Directory ─────────────────────────────────────────────────────────────

    /// Start a fetch, superseding any request still in flight.
    fn reload(&mut self) {
        let ticket = self.slot.issue();
        debug!("[app] fetch #{} from {}", ticket.generation, self.client.url());
        self.feed.begin();
        self.toast.spinner("Loading stations…");

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_stations(&ticket.token).await;
            let _ = tx.send(AppMessage::StationsLoaded(ticket, result)).await;
        });
        self.refresh_view(false);
    }

    fn on_stations_loaded(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Station>, DirectoryError>,
    ) {
        if !self.slot.is_current(&ticket) {
            debug!("[app] dropping result of superseded fetch #{}", ticket.generation);
            return;
        }
        self.slot.complete(&ticket);
        self.toast.dismiss_spinner();

        match self.feed.finish(result) {
            Some(stations) => {
                info!("[app] {} stations loaded", stations.len());
                self.search.set_stations(stations);
            }
            None => {
                if let Some(err) = self.feed.error.clone() {
                    warn!("[app] fetch failed: {}", err);
                    self.toast.error(err);
                }
            }
        }
        self.refresh_view(true);
    }

    // ── View derivation ───────────────────────────────────────────────────────

    /// Recompute everything components read from the core state objects.
    /// `reset` moves the list cursor back to the top.
    fn refresh_view(&mut self, reset: bool) {
        let s = &mut self.state;
        s.rows = match s.view {
            ViewMode::All => self.search.visible().into_iter().cloned().collect(),
            ViewMode::Favorites => self
                .favorites
                .list()
                .iter()
                .map(|f| f.station.clone())
                .collect(),
        };
        s.has_more = self.search.has_more();
        s.total_stations = self.search.total_len();
        s.matching_stations = self.search.filtered_len();
        s.query = self.search.query().to_string();
        s.loading = self.feed.loading;
        s.error = self.feed.error.clone();
        s.favorites_added = self
            .favorites
            .list()
            .iter()
            .map(|f| (f.station.id().to_string(), f.added_at))
            .collect();
        s.favorites_count = self.favorites.len();
        s.playing = self.coordinator.current().cloned();

        self.station_list.sync_rows(&self.state, reset);
        self.state.selected = self.station_list.selected_station(&self.state).cloned();
    }

    fn apply_query(&mut self, query: &str) {
        if query == self.search.query() {
            return;
        }
        debug!("[app] search {:?}", query);
        self.search.set_query(query);
        self.refresh_view(true);
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        // Help overlay captures all keys when visible
        if self.state.show_help {
            return self.help_overlay.handle_key(key, &self.state);
        }

        if self.state.input_mode == InputMode::Search {
            return self.search_bar.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => {
                return vec![Action::Quit]
            }
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Char('/') => return vec![Action::OpenSearch],
            KeyCode::Char('v') => return vec![Action::ToggleView],
            KeyCode::Char('r') => return vec![Action::Reload],
            KeyCode::Char('d') => return vec![Action::ToggleDetails],
            KeyCode::Char('s') => return vec![Action::Stop],
            KeyCode::Char('m') => return vec![Action::Mute],
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                return vec![Action::VolumeUp]
            }
            KeyCode::Left | KeyCode::Char('-') => return vec![Action::VolumeDown],
            _ => {}
        }

        self.station_list.handle_key(key, &self.state)
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.state.show_help {
            return vec![];
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        if hit(areas.search_bar, event.column, event.row)
            && matches!(event.kind, MouseEventKind::Down(_))
            && self.state.input_mode == InputMode::Normal
        {
            return vec![Action::OpenSearch];
        }
        if hit(areas.station_list, event.column, event.row) {
            return self
                .station_list
                .handle_mouse(event, areas.station_list, &self.state);
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Broadcast to components first so they can react (search box open/close).
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.search_bar.on_action(&action, s));
            out.extend(self.station_list.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // Secondary actions are applied once, not re-broadcast.
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        debug!("apply_action: {:?}", action);
        match action {
            // ── Playback ──────────────────────────────────────────────────────
            Action::TogglePlay(station) => self.toggle_play(station),
            Action::Stop => self.stop_all(),
            Action::VolumeUp => self.adjust_transport(Transport::step_up),
            Action::VolumeDown => self.adjust_transport(Transport::step_down),
            Action::Mute => self.adjust_transport(Transport::toggle_mute),

            // ── Favorites ─────────────────────────────────────────────────────
            Action::ToggleFavorite(station) => match self.favorites.toggle(&station) {
                Ok(true) => self.toast.success("Added to favorites"),
                Ok(false) => self.toast.info("Removed from favorites"),
                Err(e) => {
                    warn!("[app] favorites not saved: {}", e);
                    self.toast.warning(format!("Could not save favorites: {}", e));
                }
            },
            Action::ToggleView => {
                self.state.view = self.state.view.toggled();
                self.refresh_view(true);
            }

            // ── Browse ────────────────────────────────────────────────────────
            Action::LoadMore => {
                if self.search.load_more() {
                    debug!("[app] page {}", self.search.page());
                    self.refresh_view(false);
                }
            }
            Action::Reload => self.reload(),

            // ── Search ────────────────────────────────────────────────────────
            Action::OpenSearch => self.state.input_mode = InputMode::Search,
            Action::CloseSearch => self.state.input_mode = InputMode::Normal,
            Action::SearchEdited(query) => self.debouncer.schedule(query, Instant::now()),
            Action::SearchSubmitted(query) => {
                self.debouncer.cancel();
                self.apply_query(&query);
            }

            // ── UI toggles ────────────────────────────────────────────────────
            Action::ToggleDetails => self.state.show_details = !self.state.show_details,
            Action::ToggleHelp => self.state.show_help = !self.state.show_help,
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        // Truncate for toast display
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Playback ──────────────────────────────────────────────────────────────

    fn toggle_play(&mut self, station: Station) {
        let id = station.id().to_string();
        if self.coordinator.is_playing(&id) {
            if let Some(stopped) = self.coordinator.stop() {
                self.stop_player(stopped.id());
                self.toast.info(format!("Stopped: {}", stopped.name));
            }
            return;
        }
        if self.state.is_connecting(&id) {
            debug!("[player] {} already connecting", id);
            return;
        }

        // Only one start in flight; the playing station keeps going until
        // this one is confirmed.
        self.cancel_pending_starts();

        // mpv may have been installed since startup.
        if self.mpv_binary.is_none() {
            self.mpv_binary = platform::find_mpv_binary();
        }
        let Some(binary) = self.mpv_binary.clone() else {
            self.on_play_failed(&id, PlaybackError::PlayerNotFound);
            return;
        };

        self.next_attempt += 1;
        let attempt = self.next_attempt;
        let volume = self.state.transport_for(&id).effective();
        let probe = Duration::from_millis(self.config.player.start_probe_ms);
        match StreamPlayer::start(
            &binary,
            station,
            volume,
            probe,
            attempt,
            &self.stderr_log,
            self.player_tx.clone(),
        ) {
            Ok(player) => {
                self.state.status.insert(id.clone(), StationStatus::Connecting);
                if let Some(old) = self.players.insert(id, player) {
                    old.stop();
                }
            }
            Err(e) => self.on_play_failed(&id, e),
        }
    }

    fn on_player_event(&mut self, event: PlayerEvent) {
        let current = self.players.get(event.id()).map(StreamPlayer::attempt);
        if current != Some(event.attempt()) {
            debug!(
                "[player] {} ignoring event from attempt {}",
                event.id(),
                event.attempt()
            );
            return;
        }

        match event {
            PlayerEvent::Started { id, .. } => {
                self.state.status.remove(&id);
                let volume = self.state.transport_for(&id).effective();
                let station = match self.players.get_mut(&id) {
                    Some(player) => {
                        player.mark_started();
                        player.set_volume(volume);
                        player.station().clone()
                    }
                    None => return,
                };
                if let Some(previous) = self.coordinator.play(station.clone()) {
                    self.stop_player(previous.id());
                }
                info!("[app] now playing {} ({})", station.name, id);
                self.toast.success(format!("Now playing: {}", station.name));
            }
            PlayerEvent::Failed { id, error, .. } => {
                self.stop_player(&id);
                self.on_play_failed(&id, error);
            }
        }
    }

    fn on_play_failed(&mut self, id: &str, error: PlaybackError) {
        warn!("[player] {} failed: {}", id, error);
        let message = error.user_message().to_string();
        self.state.status.insert(
            id.to_string(),
            StationStatus::Failed {
                message: message.clone(),
                until: Instant::now() + ERROR_DISPLAY,
            },
        );
        self.toast.error(message);
        self.coordinator.stop_if(id);
    }

    fn stop_player(&mut self, id: &str) {
        if let Some(player) = self.players.remove(id) {
            player.stop();
        }
    }

    fn cancel_pending_starts(&mut self) {
        let pending: Vec<String> = self
            .players
            .iter()
            .filter(|(_, p)| !p.is_started())
            .map(|(id, _)| id.clone())
            .collect();
        for id in pending {
            debug!("[player] {} start superseded", id);
            self.stop_player(&id);
            self.state.status.remove(&id);
        }
    }

    fn stop_all(&mut self) {
        self.cancel_pending_starts();
        if let Some(stopped) = self.coordinator.stop() {
            self.stop_player(stopped.id());
            self.toast.info(format!("Stopped: {}", stopped.name));
        }
        for (_, player) in self.players.drain() {
            player.stop();
        }
    }

    /// Apply `f` to the transport of the playing (else selected) station and
    /// push the result to its player, if any.
    fn adjust_transport(&mut self, f: impl FnOnce(&mut Transport)) {
        let Some(id) = self.state.transport_target().map(|s| s.id().to_string()) else {
            return;
        };
        let mut transport = self.state.transport_for(&id);
        let was_muted = transport.is_muted();
        f(&mut transport);
        self.state.transports.insert(id.clone(), transport);

        if let Some(player) = self.players.get(&id) {
            player.set_volume(transport.effective());
        }
        if transport.is_muted() != was_muted {
            self.toast
                .info(if transport.is_muted() { "Muted" } else { "Unmuted" });
        }
    }

    fn shutdown(&mut self) {
        info!("[app] shutting down");
        self.slot.cancel();
        self.coordinator.stop();
        for (_, player) in self.players.drain() {
            player.stop();
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let banner_h = if self.state.view == ViewMode::All && self.state.error.is_some() {
            1
        } else {
            0
        };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(banner_h),
                Constraint::Min(0),
                Constraint::Length(2),
                Constraint::Length(1),
            ])
            .split(area);

        self.header.draw(frame, outer[0], false, &self.state);

        let searching = self.state.input_mode == InputMode::Search;
        self.search_bar.draw(frame, outer[1], searching, &self.state);
        self.pane_areas.search_bar = outer[1];

        if let Some(err) = self.state.error.as_deref().filter(|_| banner_h > 0) {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(
                        format!(" ✗ {}", err),
                        Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("  press r to retry", Style::default().fg(C_MUTED)),
                ])),
                outer[2],
            );
        }

        let body = outer[3];
        let (list_area, details_area) =
            if self.state.show_details && body.width >= DETAILS_MIN_WIDTH {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .split(body);
                (cols[0], Some(cols[1]))
            } else {
                (body, None)
            };
        self.station_list
            .draw(frame, list_area, !searching, &self.state);
        self.pane_areas.station_list = list_area;
        if let Some(details) = details_area {
            self.station_details.draw(frame, details, false, &self.state);
        }

        self.now_playing.draw(frame, outer[4], false, &self.state);
        status_bar::draw_keys_bar(frame, outer[5], self.state.input_mode, self.state.view);

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::toast::Severity;

    fn station(id: &str, name: &str, tags: &str, votes: u64) -> Station {
        Station {
            changeuuid: id.to_string(),
            name: name.to_string(),
            tags: tags.to_string(),
            votes,
            url_resolved: format!("http://stream.example/{id}"),
            ..Station::default()
        }
    }

    fn stations(n: usize) -> Vec<Station> {
        (0..n)
            .map(|i| station(&format!("s{i}"), &format!("Station {i}"), "", (n - i) as u64))
            .collect()
    }

    fn app_in(dir: &std::path::Path) -> App {
        let mut config = Config::default();
        config.paths.data_dir = dir.to_path_buf();
        App::new(config).expect("app")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) {
        for a in app.handle_key(key(code)) {
            app.dispatch(a);
        }
        app.refresh_view(false);
    }

    /// Stand-in for a fetch: issue a ticket and deliver `result` under it.
    fn deliver(app: &mut App, result: Result<Vec<Station>, DirectoryError>) {
        let ticket = app.slot.issue();
        app.feed.begin();
        app.on_stations_loaded(ticket, result);
    }

    #[test]
    fn test_loaded_stations_fill_first_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        deliver(&mut app, Ok(stations(20)));

        assert!(!app.state.loading);
        assert_eq!(app.state.rows.len(), 12);
        assert!(app.state.has_more);
        assert_eq!(app.state.total_stations, 20);
        assert_eq!(app.state.selected.as_ref().map(|s| s.id()), Some("s0"));

        app.dispatch(Action::LoadMore);
        assert_eq!(app.state.rows.len(), 20);
        assert!(!app.state.has_more);
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let first = app.slot.issue();
        app.feed.begin();
        let second = app.slot.issue();

        app.on_stations_loaded(first, Ok(stations(3)));
        assert!(app.state.rows.is_empty());
        assert!(app.feed.loading);

        app.on_stations_loaded(second, Ok(stations(5)));
        assert_eq!(app.state.rows.len(), 5);
        assert!(!app.feed.loading);
    }

    #[test]
    fn test_fetch_error_sets_banner_and_toast() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        // A ticket this app's slot never issued is not current.
        let foreign = RequestSlot::new().issue();
        app.on_stations_loaded(foreign, Ok(stations(2)));
        assert!(app.state.rows.is_empty());

        deliver(
            &mut app,
            Err(DirectoryError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)),
        );
        let err = app.state.error.clone().expect("error banner");
        assert!(err.starts_with("Failed to fetch stations"));
        assert!(app.toast.messages().any(|(m, _)| m == err));
    }

    #[test]
    fn test_submitted_query_filters_and_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let mut list = stations(5);
        list.push(station("x", "Vividh Bharati", "Hindi,news", 0));
        deliver(&mut app, Ok(list));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.state.input_mode, InputMode::Search);
        for c in "hindi".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        // Typing only schedules the filter.
        assert_eq!(app.state.rows.len(), 6);
        assert!(app.debouncer.is_pending());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.input_mode, InputMode::Normal);
        assert!(!app.debouncer.is_pending());
        assert_eq!(app.state.query, "hindi");
        let ids: Vec<&str> = app.state.rows.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["x"]);
        assert_eq!(app.state.selected.as_ref().map(|s| s.id()), Some("x"));
    }

    #[test]
    fn test_favorites_view_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        deliver(&mut app, Ok(stations(4)));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('f'));
        assert!(app.state.is_favorite("s1"));
        assert_eq!(app.state.favorites_count, 1);

        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.state.view, ViewMode::Favorites);
        let ids: Vec<&str> = app.state.rows.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["s1"]);

        // A fresh app over the same data dir sees the saved favorite.
        let reopened = app_in(dir.path());
        assert!(reopened.state.is_favorite("s1"));

        press(&mut app, KeyCode::Char('f'));
        assert!(app.state.rows.is_empty());
        assert_eq!(app.state.favorites_count, 0);
    }

    #[test]
    fn test_unsaved_favorite_is_kept_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let mut app = app_in(&data_dir);
        deliver(&mut app, Ok(stations(2)));
        // A plain file where the data dir was makes every save fail.
        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, "").unwrap();

        press(&mut app, KeyCode::Char('f'));
        assert!(app.state.is_favorite("s0"));
        assert!(app
            .toast
            .messages()
            .any(|(m, sev)| m.starts_with("Could not save favorites")
                && matches!(sev, Severity::Warning)));
    }

    #[test]
    fn test_playback_failure_marks_station_and_reverts() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        deliver(&mut app, Ok(stations(2)));
        let s0 = app.state.rows[0].clone();
        let s1 = app.state.rows[1].clone();

        app.coordinator.play(s0.clone());
        app.on_play_failed(s1.id(), PlaybackError::Exited(Some(2)));
        app.refresh_view(false);
        // Another station's failure leaves the playing one alone.
        assert!(app.state.is_playing(s0.id()));
        assert_eq!(app.state.error_for(s1.id()), Some("Failed to play station"));

        app.on_play_failed(s0.id(), PlaybackError::PlayerNotFound);
        app.refresh_view(false);
        assert!(app.state.playing.is_none());
        assert_eq!(app.state.error_for(s0.id()), Some("Failed to play station"));
    }

    /// Shell stand-in for mpv: stays up, or exits 2 when the stream URL
    /// contains "fail".  Written once so no test forks while it is open.
    #[cfg(unix)]
    fn fake_mpv() -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::OnceLock;

        static FAKE_MPV: OnceLock<PathBuf> = OnceLock::new();
        FAKE_MPV
            .get_or_init(|| {
                let path = std::env::temp_dir()
                    .join(format!("radiox-fake-mpv-{}", std::process::id()));
                std::fs::write(
                    &path,
                    "#!/bin/sh\ncase \"$*\" in *fail*) exit 2 ;; esac\nexec sleep 30\n",
                )
                .unwrap();
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                    .unwrap();
                path
            })
            .clone()
    }

    #[cfg(unix)]
    async fn next_player_event(app: &mut App, rx: &mut mpsc::Receiver<PlayerEvent>) {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("player event in time")
            .expect("player channel open");
        app.on_player_event(event);
        app.refresh_view(false);
    }

    #[cfg(unix)]
    fn playing_id(app: &App) -> Option<&str> {
        app.state.playing.as_ref().map(|s| s.id())
    }

    #[cfg(unix)]
    fn player_ids(app: &App) -> Vec<&str> {
        let mut ids: Vec<&str> = app.players.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_started_station_replaces_the_playing_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.data_dir = dir.path().to_path_buf();
        config.player.start_probe_ms = 1_000;
        let mut app = App::new(config).unwrap();
        app.mpv_binary = Some(fake_mpv());
        let mut rx = app.player_rx.take().unwrap();

        let a = station("a", "Alpha", "", 3);
        let b = station("b", "Bravo", "", 2);
        let mut c = station("c", "Charlie", "", 1);
        c.url_resolved = "http://fail.example/c".into();

        app.toggle_play(a.clone());
        next_player_event(&mut app, &mut rx).await;
        assert_eq!(playing_id(&app), Some("a"));
        assert_eq!(player_ids(&app), vec!["a"]);

        // A keeps playing while B connects.
        app.toggle_play(b.clone());
        app.refresh_view(false);
        assert!(app.state.is_connecting("b"));
        assert_eq!(playing_id(&app), Some("a"));
        assert_eq!(player_ids(&app), vec!["a", "b"]);

        next_player_event(&mut app, &mut rx).await;
        assert_eq!(playing_id(&app), Some("b"));
        assert_eq!(player_ids(&app), vec!["b"]);
        assert!(!app.state.is_connecting("b"));

        // A failing start leaves the playing station alone.
        app.toggle_play(c.clone());
        next_player_event(&mut app, &mut rx).await;
        assert_eq!(playing_id(&app), Some("b"));
        assert_eq!(app.state.error_for("c"), Some("Failed to play station"));
        assert_eq!(player_ids(&app), vec!["b"]);

        app.dispatch(Action::Stop);
        app.refresh_view(false);
        assert!(playing_id(&app).is_none());
        assert!(app.players.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_start_supersedes_a_connecting_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.data_dir = dir.path().to_path_buf();
        config.player.start_probe_ms = 10_000;
        let mut app = App::new(config).unwrap();
        app.mpv_binary = Some(fake_mpv());

        app.toggle_play(station("d", "Delta", "", 2));
        app.toggle_play(station("e", "Echo", "", 1));
        app.refresh_view(false);
        assert_eq!(player_ids(&app), vec!["e"]);
        assert!(!app.state.is_connecting("d"));
        assert!(app.state.is_connecting("e"));

        // A second request for the connecting station is ignored.
        let attempt = app.players["e"].attempt();
        app.toggle_play(station("e", "Echo", "", 1));
        assert_eq!(app.players["e"].attempt(), attempt);

        app.dispatch(Action::Stop);
        app.refresh_view(false);
        assert!(app.players.is_empty());
        assert!(!app.state.is_connecting("e"));
    }

    #[tokio::test]
    async fn test_missing_player_binary_fails_the_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.mpv_binary = Some(dir.path().join("no-such-mpv"));
        app.toggle_play(station("z", "Zulu", "", 1));
        app.refresh_view(false);
        assert!(app.players.is_empty());
        assert_eq!(app.state.error_for("z"), Some("Failed to play station"));
    }

    #[test]
    fn test_events_from_unknown_attempts_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.on_player_event(PlayerEvent::Failed {
            id: "ghost".into(),
            attempt: 7,
            error: PlaybackError::Exited(None),
        });
        assert!(app.state.error_for("ghost").is_none());
    }

    #[test]
    fn test_volume_keys_target_selected_station() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.data_dir = dir.path().to_path_buf();
        config.player.default_volume = 0.5;
        let mut app = App::new(config).unwrap();
        deliver(&mut app, Ok(stations(2)));

        press(&mut app, KeyCode::Right);
        let t = app.state.transport_for("s0");
        assert!((t.volume() - 0.55).abs() < 1e-4);

        press(&mut app, KeyCode::Char('m'));
        assert!(app.state.transport_for("s0").is_muted());
        press(&mut app, KeyCode::Char('m'));
        let t = app.state.transport_for("s0");
        assert!(!t.is_muted());
        assert!((t.volume() - 0.55).abs() < 1e-4);

        // Untouched stations keep the default.
        assert!((app.state.transport_for("s1").volume() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_help_overlay_captures_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        deliver(&mut app, Ok(stations(2)));

        press(&mut app, KeyCode::Char('?'));
        assert!(app.state.show_help);
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.state.view, ViewMode::All);
        press(&mut app, KeyCode::Esc);
        assert!(!app.state.show_help);
    }

    #[test]
    fn test_quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = app_in(dir.path());
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for a in app.handle_key(ctrl_c) {
            app.dispatch(a);
        }
        assert!(app.should_quit);
    }
}
