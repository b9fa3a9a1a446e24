use crate::domain::pickem::{BracketLabel, PickemSnapshot, TeamEntry};
use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

pub const BASELINE_TOTAL_PARTICIPANTS: u64 = 147_832;

const PCT_JITTER: f64 = 2.0;
const PCT_FLOOR: f64 = 1.0;
const PCT_CEIL: f64 = 50.0;
const PARTICIPANT_JITTER: i64 = 5_000;

const SYNTH_PCT_MIN: f64 = 5.0;
const SYNTH_PCT_MAX: f64 = 35.0;
const SYNTH_TEAMS_PER_BRACKET: usize = 5;
const SYNTH_PARTICIPANTS_MIN: u64 = 100_000;
const SYNTH_PARTICIPANTS_MAX: u64 = 150_000;

// Plausible standings from a past major; only the invariants (ranges, sort
// order, counts) are promised, never these literal values.
const BASELINE: [(BracketLabel, [(&str, f64); 5]); 4] = [
    (
        BracketLabel::ThreeZero,
        [
            ("FaZe", 28.5),
            ("NAVI", 24.3),
            ("G2", 18.7),
            ("Vitality", 12.1),
            ("Astralis", 8.9),
        ],
    ),
    (
        BracketLabel::ZeroThree,
        [
            ("FURIA", 22.1),
            ("Complexity", 19.8),
            ("MOUZ", 16.4),
            ("Liquid", 14.2),
            ("BIG", 11.7),
        ],
    ),
    (
        BracketLabel::ThreeOne,
        [
            ("Spirit", 31.2),
            ("Heroic", 26.8),
            ("ENCE", 19.5),
            ("NIP", 13.9),
            ("Fnatic", 8.6),
        ],
    ),
    (
        BracketLabel::ThreeTwo,
        [
            ("Cloud9", 25.7),
            ("Outsiders", 21.3),
            ("Imperial", 18.9),
            ("Apeks", 16.1),
            ("Monte", 12.4),
        ],
    ),
];

/// Baseline table with a uniform perturbation per entry, clamped to
/// [PCT_FLOOR, PCT_CEIL] and rounded to one decimal.
pub fn jittered_baseline<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> PickemSnapshot {
    let mut brackets = BTreeMap::new();
    for (label, teams) in BASELINE {
        let entries = teams
            .iter()
            .map(|(name, pct)| TeamEntry {
                name: (*name).to_string(),
                percentage: round1(
                    (pct + rng.gen_range(-PCT_JITTER..=PCT_JITTER)).clamp(PCT_FLOOR, PCT_CEIL),
                ),
            })
            .collect();
        brackets.insert(label, entries);
    }

    let delta = rng.gen_range(-PARTICIPANT_JITTER..=PARTICIPANT_JITTER);
    let total_participants = (BASELINE_TOTAL_PARTICIPANTS as i64 + delta).max(0) as u64;

    let mut snapshot = PickemSnapshot {
        brackets,
        total_participants,
        last_update: now,
    };
    snapshot.sort_brackets();
    snapshot
}

/// Builds a snapshot from scraped team names alone: per bracket, a random
/// permutation of the list, up to five names, uniform percentages in
/// [SYNTH_PCT_MIN, SYNTH_PCT_MAX].
pub fn synthesize_from_names<R: Rng>(
    rng: &mut R,
    names: &[String],
    now: DateTime<Utc>,
) -> Result<PickemSnapshot> {
    ensure!(!names.is_empty(), "team name list must be non-empty");

    let mut brackets = BTreeMap::new();
    for label in BracketLabel::ALL {
        let mut shuffled: Vec<&String> = names.iter().collect();
        shuffled.shuffle(rng);

        let entries = shuffled
            .into_iter()
            .take(SYNTH_TEAMS_PER_BRACKET)
            .map(|name| TeamEntry {
                name: name.clone(),
                percentage: round1(rng.gen_range(SYNTH_PCT_MIN..=SYNTH_PCT_MAX)),
            })
            .collect();
        brackets.insert(label, entries);
    }

    let mut snapshot = PickemSnapshot {
        brackets,
        total_participants: rng.gen_range(SYNTH_PARTICIPANTS_MIN..SYNTH_PARTICIPANTS_MAX),
        last_update: now,
    };
    snapshot.sort_brackets();
    Ok(snapshot)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
