// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ownership timeline grouping.

use crate::models::TimelineEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Bucket key for a timeline group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TimelineYear {
    Known(i32),
    /// Entries whose year is missing or unparseable; always rendered last
    Unknown,
}

impl std::fmt::Display for TimelineYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimelineYear::Known(year) => write!(f, "{}", year),
            TimelineYear::Unknown => f.write_str("Undated"),
        }
    }
}

/// One year's worth of timeline entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineYearGroup {
    pub year: TimelineYear,
    pub entries: Vec<TimelineEntry>,
}

/// Group entries by their recorded `occurred_year`, newest year first.
///
/// Input is expected newest-first; entries keep their input order inside
/// each group. No entry is dropped: those without a year land in the
/// trailing `Unknown` group.
pub fn group_by_year(entries: &[TimelineEntry]) -> Vec<TimelineYearGroup> {
    let mut by_year: BTreeMap<i32, Vec<TimelineEntry>> = BTreeMap::new();
    let mut undated = Vec::new();

    for entry in entries {
        match entry.occurred_year {
            Some(year) => by_year.entry(year).or_default().push(entry.clone()),
            None => undated.push(entry.clone()),
        }
    }

    let mut groups: Vec<TimelineYearGroup> = by_year
        .into_iter()
        .rev()
        .map(|(year, entries)| TimelineYearGroup {
            year: TimelineYear::Known(year),
            entries,
        })
        .collect();

    if !undated.is_empty() {
        groups.push(TimelineYearGroup {
            year: TimelineYear::Unknown,
            entries: undated,
        });
    }

    groups
}

/// Flatten groups back into a single list, group order first.
pub fn flatten_groups(groups: &[TimelineYearGroup]) -> Vec<TimelineEntry> {
    groups
        .iter()
        .flat_map(|g| g.entries.iter().cloned())
        .collect()
}
