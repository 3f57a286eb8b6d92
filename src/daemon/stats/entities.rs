use std::{collections::HashMap, fmt};

use chrono::NaiveDate;
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Counters for the current calendar day. Exactly one instance is live at a
/// time; it is rolled into history when the day changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodayStats {
    pub key_strokes: u64,
    pub left_clicks: u64,
    pub right_clicks: u64,
    pub mouse_distance: f64,
    pub scroll_distance: f64,
    pub date: NaiveDate,
}

impl TodayStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            key_strokes: 0,
            left_clicks: 0,
            right_clicks: 0,
            mouse_distance: 0.0,
            scroll_distance: 0.0,
            date,
        }
    }

    pub fn has_activity(&self) -> bool {
        self.key_strokes > 0 || self.left_clicks > 0
    }

    /// Archive shape for the history list. The left/right distinction is
    /// not preserved historically, only the sum.
    pub fn to_day_stats(&self) -> DayStats {
        DayStats {
            date: self.date,
            key_strokes: self.key_strokes,
            clicks: self.left_clicks + self.right_clicks,
            mouse_distance: self.mouse_distance,
            scroll_distance: self.scroll_distance,
        }
    }
}

impl Default for TodayStats {
    fn default() -> Self {
        Self::empty(NaiveDate::default())
    }
}

/// Immutable snapshot of a past day. Insertion order in the history list is
/// chronological.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayStats {
    pub date: NaiveDate,
    pub key_strokes: u64,
    pub clicks: u64,
    pub mouse_distance: f64,
    pub scroll_distance: f64,
}

/// One ranked entry of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

/// Label → occurrence count table that remembers insertion order, so ranking
/// ties resolve to whichever label was seen first. Persists as a plain JSON
/// object; JSON object order round-trips through the custom serde below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyCounter {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl KeyCounter {
    pub fn increment(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&at) => self.entries[at].1 += 1,
            None => self.insert(label.to_owned(), 1),
        }
    }

    fn insert(&mut self, label: String, count: u64) {
        match self.index.get(&label) {
            Some(&at) => self.entries[at].1 = count,
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push((label, count));
            }
        }
    }

    pub fn get(&self, label: &str) -> u64 {
        self.index.get(label).map_or(0, |&at| self.entries[at].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// The `limit` most frequent labels, descending by count. The sort is
    /// stable, so equal counts keep insertion order.
    pub fn top(&self, limit: usize) -> Vec<KeyCount> {
        let mut ranked: Vec<&(String, u64)> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(key, count)| KeyCount {
                key: key.clone(),
                count: *count,
            })
            .collect()
    }
}

impl Serialize for KeyCounter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeyCounter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CounterVisitor;

        impl<'de> Visitor<'de> for CounterVisitor {
            type Value = KeyCounter;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map of key labels to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<KeyCounter, A::Error> {
                let mut counter = KeyCounter::default();
                while let Some((label, count)) = access.next_entry::<String, u64>()? {
                    counter.insert(label, count);
                }
                Ok(counter)
            }
        }

        deserializer.deserialize_map(CounterVisitor)
    }
}

/// The complete persisted state. All four parts are written together on
/// every save; a partially-structured document on disk is read best-effort
/// with per-field defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsDocument {
    pub today: TodayStats,
    pub history: Vec<DayStats>,
    pub key_stats: KeyCounter,
    pub total_key_stats: KeyCounter,
}

/// Read-only view handed to the UI/IPC layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub today_stats: TodayStats,
    pub history_data: Vec<DayStats>,
    pub key_stats: Vec<KeyCount>,
    pub total_key_stats: Vec<KeyCount>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn counter_ranks_by_count_with_insertion_order_ties() {
        let mut counter = KeyCounter::default();
        for _ in 0..5 {
            counter.increment("A");
        }
        for _ in 0..9 {
            counter.increment("B");
        }
        for _ in 0..9 {
            counter.increment("C");
        }

        let top = counter.top(15);
        let ranked: Vec<(&str, u64)> = top.iter().map(|v| (v.key.as_str(), v.count)).collect();
        assert_eq!(ranked, vec![("B", 9), ("C", 9), ("A", 5)]);
    }

    #[test]
    fn counter_truncates_to_limit() {
        let mut counter = KeyCounter::default();
        for i in 0..20 {
            counter.increment(&format!("K{i}"));
        }
        assert_eq!(counter.top(15).len(), 15);
    }

    #[test]
    fn counter_round_trips_through_json_preserving_order() {
        let mut counter = KeyCounter::default();
        counter.increment("Ctrl + C");
        counter.increment("A");
        counter.increment("Ctrl + C");

        let json = serde_json::to_string(&counter).unwrap();
        assert_eq!(json, r#"{"Ctrl + C":2,"A":1}"#);

        let restored: KeyCounter = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, counter);
    }

    #[test]
    fn document_fields_default_individually() {
        // Documents written by older versions may lack totalKeyStats.
        let document: StatsDocument = serde_json::from_str(
            r#"{
                "today": { "keyStrokes": 3, "date": "2025-06-01" },
                "keyStats": { "A": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(document.today.key_strokes, 3);
        assert_eq!(document.today.left_clicks, 0);
        assert_eq!(
            document.today.date,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(document.history.is_empty());
        assert_eq!(document.key_stats.get("A"), 3);
        assert!(document.total_key_stats.is_empty());
    }

    #[test]
    fn archived_day_sums_clicks() {
        let mut today = TodayStats::empty(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        today.left_clicks = 2;
        today.right_clicks = 3;
        assert_eq!(today.to_day_stats().clicks, 5);
    }
}
