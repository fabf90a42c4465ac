//! Field population statistics used to rank candidate fields.

use crate::schema::FieldOrdering;
use crate::settings::ImportSettings;
use crate::types::{DecodedNote, FieldStat, FieldType, ImportFieldSelection};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Ranked field statistics over one set of decoded notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnalysis {
    pub total_notes: usize,
    /// Populated count a field needs to be useful.
    pub threshold: usize,
    pub stats: Vec<FieldStat>,
}

impl FieldAnalysis {
    pub fn get(&self, field_name: &str) -> Option<&FieldStat> {
        self.stats.iter().find(|s| s.field_name == field_name)
    }

    pub fn useful_fields(&self) -> impl Iterator<Item = &FieldStat> {
        self.stats.iter().filter(|s| s.is_useful)
    }

    /// Useful fields in ranked order, capped by `max_default_selected`.
    pub fn default_selection(&self, settings: &ImportSettings) -> ImportFieldSelection {
        let cap = settings.max_default_selected.unwrap_or(usize::MAX);
        self.useful_fields()
            .take(cap)
            .fold(ImportFieldSelection::new(), |selection, stat| {
                selection.with(stat.field_name.clone(), FieldType::Text)
            })
    }
}

#[derive(Default)]
struct Tally {
    populated: usize,
    sample: Option<String>,
    first_seen: usize,
}

/// Compute coverage for every field name across all notes.
///
/// Percentages are relative to the whole note population. Fields with a
/// canonical ordinal come first in ordinal order; the rest follow by name.
pub fn analyze(
    notes: &[DecodedNote],
    ordering: &FieldOrdering,
    settings: &ImportSettings,
) -> FieldAnalysis {
    let total_notes = notes.len();
    let mut tallies: HashMap<&str, Tally> = HashMap::new();

    for note in notes {
        let mut counted: Vec<&str> = Vec::with_capacity(note.fields.len());
        for field in &note.fields {
            let seen = tallies.len();
            let tally = tallies.entry(field.name.as_str()).or_insert_with(|| Tally {
                first_seen: seen,
                ..Default::default()
            });

            let text = field.text.trim();
            if text.is_empty() || counted.contains(&field.name.as_str()) {
                continue;
            }
            counted.push(field.name.as_str());
            tally.populated += 1;
            if tally.sample.is_none() {
                tally.sample = Some(text.chars().take(settings.sample_length).collect());
            }
        }
    }

    let threshold = settings.usefulness_threshold(total_notes);
    let mut stats: Vec<FieldStat> = tallies
        .into_iter()
        .map(|(name, tally)| FieldStat {
            field_name: name.to_string(),
            populated_count: tally.populated,
            percentage: percentage(tally.populated, total_notes),
            sample_text: tally.sample.unwrap_or_default(),
            original_order: ordering.get(name).copied().unwrap_or(tally.first_seen),
            is_useful: tally.populated >= threshold,
        })
        .collect();

    stats.sort_by(|a, b| compare_fields(a, b, ordering));

    FieldAnalysis {
        total_notes,
        threshold,
        stats,
    }
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

fn compare_fields(a: &FieldStat, b: &FieldStat, ordering: &FieldOrdering) -> Ordering {
    match (ordering.get(&a.field_name), ordering.get(&b.field_name)) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.field_name.cmp(&b.field_name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.field_name.cmp(&b.field_name),
    }
}
