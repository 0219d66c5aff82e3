use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;

/// A single radio stream entry as published by the station directory.
///
/// Field names follow the directory's JSON payload so the same struct is used
/// on the wire and in the favorites slot.  Missing fields default to empty /
/// zero rather than failing the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Station {
    /// Opaque unique identifier.  Entries without one are dropped after decode.
    #[serde(default, deserialize_with = "null_as_default")]
    pub changeuuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_resolved: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub homepage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favicon: String,
    /// Comma separated free-text tags (e.g. "hindi,bollywood,news")
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub codec: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bitrate: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clickcount: u64,
}

/// The directory sends `null` for fields it has no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Station {
    pub fn id(&self) -> &str {
        &self.changeuuid
    }

    /// Ranking used for the default list order.
    pub fn popularity(&self) -> u64 {
        self.votes.saturating_add(self.clickcount)
    }

    /// URL handed to the audio device: the resolved stream, or the raw one
    /// when the directory could not resolve it.
    pub fn stream_url(&self) -> &str {
        if self.url_resolved.trim().is_empty() {
            &self.url
        } else {
            &self.url_resolved
        }
    }

    /// Text the search box matches against.
    pub fn search_text(&self) -> String {
        [
            self.name.as_str(),
            self.tags.as_str(),
            self.language.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Tags split on commas, trimmed, empties dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A station the user has marked as favorite, with the time it was added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteStation {
    #[serde(flatten)]
    pub station: Station,
    /// Epoch milliseconds.
    #[serde(rename = "addedAt")]
    pub added_at: i64,
}

impl FavoriteStation {
    pub fn new(station: Station) -> Self {
        Self {
            station,
            added_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn id(&self) -> &str {
        self.station.id()
    }
}

/// Sort by popularity, most popular first.  Stable: equal scores keep the
/// order the directory returned them in.
pub fn sort_by_popularity(stations: &mut [Station]) {
    stations.sort_by_key(|s| Reverse(s.popularity()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, votes: u64, clicks: u64) -> Station {
        Station {
            changeuuid: id.to_string(),
            name: id.to_uppercase(),
            votes,
            clickcount: clicks,
            ..Station::default()
        }
    }

    fn ids(stations: &[Station]) -> Vec<&str> {
        stations.iter().map(|s| s.id()).collect()
    }

    #[test]
    fn test_sort_orders_by_votes_plus_clicks() {
        let mut list = vec![
            station("a", 1, 1),
            station("b", 10, 0),
            station("c", 0, 5),
            station("d", 3, 3),
        ];
        sort_by_popularity(&mut list);
        assert_eq!(ids(&list), vec!["b", "d", "c", "a"]);
        assert!(list
            .windows(2)
            .all(|w| w[0].popularity() >= w[1].popularity()));
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let mut list = vec![
            station("first", 2, 2),
            station("top", 9, 9),
            station("second", 4, 0),
            station("third", 0, 4),
        ];
        sort_by_popularity(&mut list);
        assert_eq!(ids(&list), vec!["top", "first", "second", "third"]);

        let once = list.clone();
        sort_by_popularity(&mut list);
        assert_eq!(list, once);
    }

    #[test]
    fn test_popularity_saturates() {
        let s = station("x", u64::MAX, 10);
        assert_eq!(s.popularity(), u64::MAX);
    }

    #[test]
    fn test_stream_url_falls_back_to_url() {
        let mut s = Station {
            url: "http://raw.example/stream".into(),
            ..Station::default()
        };
        assert_eq!(s.stream_url(), "http://raw.example/stream");
        s.url_resolved = "http://resolved.example/live.mp3".into();
        assert_eq!(s.stream_url(), "http://resolved.example/live.mp3");
    }

    #[test]
    fn test_deserialize_tolerates_missing_and_extra_fields() {
        let json = r#"{
            "changeuuid": "9f3c",
            "name": "Radio Mirchi",
            "votes": 120,
            "stationuuid": "ignored",
            "geo_lat": 19.07
        }"#;
        let s: Station = serde_json::from_str(json).unwrap();
        assert_eq!(s.id(), "9f3c");
        assert_eq!(s.votes, 120);
        assert_eq!(s.clickcount, 0);
        assert!(s.tags.is_empty());
    }

    #[test]
    fn test_null_fields_and_missing_id_still_decode() {
        let json = r#"[
            {"changeuuid": "a", "name": "A", "homepage": null, "tags": null, "votes": null},
            {"name": "no id"}
        ]"#;
        let list: Vec<Station> = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id(), "a");
        assert!(list[0].homepage.is_empty());
        assert_eq!(list[0].search_text(), "a  ");
        assert_eq!(list[0].votes, 0);
        assert!(list[1].id().is_empty());
    }

    #[test]
    fn test_favorite_serializes_flat_with_added_at() {
        let fav = FavoriteStation {
            station: station("abc", 1, 2),
            added_at: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&fav).unwrap();
        assert_eq!(value["changeuuid"], "abc");
        assert_eq!(value["addedAt"], 1_700_000_000_000i64);
        let back: FavoriteStation = serde_json::from_value(value).unwrap();
        assert_eq!(back, fav);
    }

    #[test]
    fn test_tag_list_splits_and_trims() {
        let s = Station {
            tags: "hindi, bollywood,,news ".into(),
            ..Station::default()
        };
        assert_eq!(s.tag_list(), vec!["hindi", "bollywood", "news"]);
    }
}
