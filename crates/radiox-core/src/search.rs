//! Client-side search and "load more" pagination over the station list.

use std::time::{Duration, Instant};

use crate::station::Station;

/// Number of stations revealed per page.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Quiet period before a search edit is applied.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(150);

/// True if `query` is a case-insensitive substring of the station's name, tags
/// and language joined by spaces.  An empty query matches everything.
pub fn station_matches(station: &Station, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    station.search_text().contains(&query.to_lowercase())
}

/// Derives the visible slice of the station list from (stations, query, page).
pub struct SearchController {
    stations: Vec<Station>,
    /// Indices into `stations` that match `query`, in list order.
    filtered: Vec<usize>,
    query: String,
    page: usize,
    page_size: usize,
}

impl SearchController {
    pub fn new(page_size: usize) -> Self {
        Self {
            stations: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replace the full list (e.g. after a fetch).  Keeps the query, resets
    /// the page.
    pub fn set_stations(&mut self, stations: Vec<Station>) {
        self.stations = stations;
        self.page = 1;
        self.rebuild();
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
        self.rebuild();
    }

    /// Reveal one more page.  No-op once everything is visible.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.page += 1;
        true
    }

    fn rebuild(&mut self) {
        let query = self.query.clone();
        self.filtered = self
            .stations
            .iter()
            .enumerate()
            .filter(|(_, s)| station_matches(s, &query))
            .map(|(i, _)| i)
            .collect();
    }

    fn visible_len(&self) -> usize {
        self.filtered
            .len()
            .min(self.page.saturating_mul(self.page_size))
    }

    /// The first `page × page_size` matching stations.
    pub fn visible(&self) -> Vec<&Station> {
        self.filtered[..self.visible_len()]
            .iter()
            .map(|&i| &self.stations[i])
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.visible_len() < self.filtered.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_len(&self) -> usize {
        self.stations.len()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id() == id)
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Collapses bursts of search edits into a single evaluation per quiet period.
///
/// `schedule` arms (or re-arms) the timer, `cancel` disarms it, and `poll`
/// hands back the pending query once the deadline has passed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn schedule(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some((query.into(), now + self.quiet));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(q, _)| q),
            _ => None,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, name: &str, tags: &str, language: &str) -> Station {
        Station {
            changeuuid: id.to_string(),
            name: name.to_string(),
            tags: tags.to_string(),
            language: language.to_string(),
            ..Station::default()
        }
    }

    fn numbered(n: usize) -> Vec<Station> {
        (0..n)
            .map(|i| station(&format!("s{i}"), &format!("Station {i}"), "", ""))
            .collect()
    }

    #[test]
    fn test_first_page_then_load_more() {
        let mut ctl = SearchController::new(12);
        ctl.set_stations(numbered(20));
        assert_eq!(ctl.visible().len(), 12);
        assert!(ctl.has_more());

        assert!(ctl.load_more());
        assert_eq!(ctl.visible().len(), 20);
        assert!(!ctl.has_more());
        assert!(!ctl.load_more());
        assert_eq!(ctl.page(), 2);
    }

    #[test]
    fn test_query_matches_tags_case_insensitively() {
        let mut ctl = SearchController::default();
        ctl.set_stations(vec![
            station("a", "Radio City", "pop,english", "english"),
            station("x", "Vividh Bharati", "Hindi,classic", "marathi"),
            station("b", "Big FM", "talk", "tamil"),
        ]);
        ctl.set_query("hindi");
        let ids: Vec<&str> = ctl.visible().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["x"]);

        ctl.set_query("HINDI");
        assert_eq!(ctl.filtered_len(), 1);
    }

    #[test]
    fn test_query_spans_joined_fields() {
        let s = station("a", "Radio One", "news", "tamil");
        assert!(station_matches(&s, "one news"));
        assert!(station_matches(&s, "news tamil"));
        assert!(!station_matches(&s, "onenews"));
    }

    #[test]
    fn test_empty_query_returns_full_list() {
        let mut ctl = SearchController::new(50);
        ctl.set_stations(numbered(7));
        ctl.set_query("");
        assert_eq!(ctl.filtered_len(), 7);
        assert_eq!(ctl.visible().len(), 7);
    }

    #[test]
    fn test_every_match_contains_query() {
        let mut ctl = SearchController::new(100);
        ctl.set_stations(vec![
            station("1", "Radio Mirchi", "bollywood", "hindi"),
            station("2", "AIR FM Gold", "news,retro", "english"),
            station("3", "Mirchi Love", "romance", "Hindi"),
            station("4", "Club FM", "malayalam", "malayalam"),
        ]);
        for q in ["mirchi", "FM", "hindi", "o", "zzz"] {
            ctl.set_query(q);
            for s in ctl.visible() {
                assert!(s.search_text().contains(&q.to_lowercase()));
            }
            assert!(ctl.filtered_len() <= ctl.total_len());
        }
    }

    #[test]
    fn test_new_query_resets_page() {
        let mut ctl = SearchController::new(5);
        ctl.set_stations(numbered(30));
        ctl.load_more();
        ctl.load_more();
        assert_eq!(ctl.page(), 3);
        ctl.set_query("station 1");
        assert_eq!(ctl.page(), 1);
        // "station 1", "station 10".."station 19"
        assert_eq!(ctl.filtered_len(), 11);
        assert_eq!(ctl.visible().len(), 5);
    }

    #[test]
    fn test_has_more_boundary() {
        let mut ctl = SearchController::new(4);
        ctl.set_stations(numbered(8));
        assert!(ctl.has_more());
        ctl.load_more();
        assert!(!ctl.has_more());

        ctl.set_stations(numbered(3));
        assert!(!ctl.has_more());
        assert_eq!(ctl.visible().len(), 3);
    }

    #[test]
    fn test_set_stations_keeps_query() {
        let mut ctl = SearchController::default();
        ctl.set_query("jazz");
        ctl.set_stations(vec![
            station("a", "Jazz 24", "", ""),
            station("b", "Rock Ant", "", ""),
        ]);
        assert_eq!(ctl.query(), "jazz");
        assert_eq!(ctl.filtered_len(), 1);
    }

    #[test]
    fn test_debouncer_emits_last_query_once() {
        let mut d = Debouncer::new(Duration::from_millis(150));
        let t0 = Instant::now();
        d.schedule("h", t0);
        d.schedule("hi", t0 + Duration::from_millis(50));
        d.schedule("hin", t0 + Duration::from_millis(100));

        assert_eq!(d.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(
            d.poll(t0 + Duration::from_millis(250)),
            Some("hin".to_string())
        );
        assert_eq!(d.poll(t0 + Duration::from_millis(400)), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_debouncer_cancel() {
        let mut d = Debouncer::default();
        let t0 = Instant::now();
        d.schedule("news", t0);
        d.cancel();
        assert_eq!(d.poll(t0 + Duration::from_secs(1)), None);
    }
}
