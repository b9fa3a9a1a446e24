use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pick'em outcome brackets for a group stage: undefeated, winless, and the
/// two advancing win/loss records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BracketLabel {
    #[serde(rename = "3-0")]
    ThreeZero,
    #[serde(rename = "0-3")]
    ZeroThree,
    #[serde(rename = "3-1")]
    ThreeOne,
    #[serde(rename = "3-2")]
    ThreeTwo,
}

impl BracketLabel {
    pub const ALL: [BracketLabel; 4] = [
        BracketLabel::ThreeZero,
        BracketLabel::ZeroThree,
        BracketLabel::ThreeOne,
        BracketLabel::ThreeTwo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BracketLabel::ThreeZero => "3-0",
            BracketLabel::ZeroThree => "0-3",
            BracketLabel::ThreeOne => "3-1",
            BracketLabel::ThreeTwo => "3-2",
        }
    }
}

impl fmt::Display for BracketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    pub percentage: f64,
}

/// One complete set of pick'em statistics. The JSON shape is the external
/// contract: bracket labels are top-level keys, plus `totalParticipants` and
/// an ISO-8601 `lastUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickemSnapshot {
    #[serde(flatten)]
    pub brackets: BTreeMap<BracketLabel, Vec<TeamEntry>>,
    #[serde(rename = "totalParticipants")]
    pub total_participants: u64,
    #[serde(rename = "lastUpdate")]
    pub last_update: DateTime<Utc>,
}

impl PickemSnapshot {
    /// Orders every bracket descending by percentage. Every producer runs this
    /// before handing a snapshot out.
    pub fn sort_brackets(&mut self) {
        for entries in self.brackets.values_mut() {
            entries.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for label in BracketLabel::ALL {
            let Some(entries) = self.brackets.get(&label) else {
                anyhow::bail!("missing bracket {label}");
            };

            for entry in entries {
                ensure!(
                    !entry.name.trim().is_empty(),
                    "empty team name in bracket {label}"
                );
                ensure!(
                    (0.0..=100.0).contains(&entry.percentage),
                    "percentage out of range in bracket {label}: {}",
                    entry.percentage
                );
            }

            for pair in entries.windows(2) {
                ensure!(
                    pair[0].percentage >= pair[1].percentage,
                    "bracket {label} is not sorted descending by percentage"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_snapshot() -> PickemSnapshot {
        let mut brackets = BTreeMap::new();
        brackets.insert(
            BracketLabel::ThreeZero,
            vec![
                TeamEntry { name: "FaZe".to_string(), percentage: 28.5 },
                TeamEntry { name: "NAVI".to_string(), percentage: 24.3 },
            ],
        );
        brackets.insert(
            BracketLabel::ZeroThree,
            vec![TeamEntry { name: "FURIA".to_string(), percentage: 22.1 }],
        );
        brackets.insert(BracketLabel::ThreeOne, Vec::new());
        brackets.insert(
            BracketLabel::ThreeTwo,
            vec![TeamEntry { name: "Cloud9".to_string(), percentage: 25.7 }],
        );

        PickemSnapshot {
            brackets,
            total_participants: 147_832,
            last_update: Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn serializes_brackets_as_top_level_keys() {
        let v = serde_json::to_value(sample_snapshot()).unwrap();

        assert_eq!(v["3-0"][0]["name"], "FaZe");
        assert_eq!(v["3-0"][0]["percentage"], 28.5);
        assert_eq!(v["3-0"][1]["name"], "NAVI");
        assert_eq!(v["0-3"][0]["name"], "FURIA");
        assert_eq!(v["3-2"][0]["name"], "Cloud9");
        assert_eq!(v["totalParticipants"], 147_832);
        assert_eq!(v["lastUpdate"], "2026-08-06T12:00:00Z");
    }

    #[test]
    fn round_trips_through_json() {
        let snapshot = sample_snapshot();
        let text = serde_json::to_string(&snapshot).unwrap();
        let back: PickemSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn validate_accepts_sorted_snapshot() {
        sample_snapshot().validate().unwrap();
    }

    #[test]
    fn validate_rejects_unsorted_bracket() {
        let mut snapshot = sample_snapshot();
        snapshot
            .brackets
            .get_mut(&BracketLabel::ThreeZero)
            .unwrap()
            .reverse();
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_percentage() {
        let mut snapshot = sample_snapshot();
        snapshot
            .brackets
            .get_mut(&BracketLabel::ZeroThree)
            .unwrap()[0]
            .percentage = 101.0;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_bracket() {
        let mut snapshot = sample_snapshot();
        snapshot.brackets.remove(&BracketLabel::ThreeOne);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn sort_brackets_orders_descending() {
        let mut snapshot = sample_snapshot();
        snapshot
            .brackets
            .get_mut(&BracketLabel::ThreeZero)
            .unwrap()
            .reverse();
        snapshot.sort_brackets();
        snapshot.validate().unwrap();
    }
}
