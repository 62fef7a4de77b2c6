use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{ClipboardEntry, EntryKind};

// ============================================================================
// FILTERING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFilter {
    #[default]
    All,
    /// Plain and styled text.
    Text,
    Images,
    /// File lists, including single video files.
    Files,
    Urls,
    Pinned,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &ClipboardEntry) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Text => matches!(entry.kind, EntryKind::Text | EntryKind::RichText),
            HistoryFilter::Images => entry.kind == EntryKind::Image,
            HistoryFilter::Files => matches!(entry.kind, EntryKind::File | EntryKind::Video),
            HistoryFilter::Urls => entry.kind == EntryKind::Url,
            HistoryFilter::Pinned => entry.pinned,
        }
    }
}

/// Entries whose content contains `query` (case-insensitive) and that pass `filter`,
/// in history order. An empty query matches everything.
pub fn search<'a>(
    entries: &'a [ClipboardEntry],
    query: &str,
    filter: HistoryFilter,
) -> Vec<&'a ClipboardEntry> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| filter.matches(e))
        .filter(|e| needle.is_empty() || e.content.to_lowercase().contains(&needle))
        .collect()
}

// ============================================================================
// DATE SECTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateSection {
    Today,
    Yesterday,
    Past,
}

impl DateSection {
    pub fn label(&self) -> &'static str {
        match self {
            DateSection::Today => "Today",
            DateSection::Yesterday => "Yesterday",
            DateSection::Past => "Past",
        }
    }

    pub fn of(entry: &ClipboardEntry, today: NaiveDate) -> Self {
        let day = entry.created_at.with_timezone(&Local).date_naive();
        if day >= today {
            DateSection::Today
        } else if today.checked_sub_days(Days::new(1)) == Some(day) {
            DateSection::Yesterday
        } else {
            DateSection::Past
        }
    }
}

/// A run of entries shown under one heading. `section` is `None` for the pinned group.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub section: Option<DateSection>,
    pub entries: Vec<&'a ClipboardEntry>,
}

/// Splits entries into a leading pinned group followed by Today, Yesterday and Past.
/// Empty groups are left out; order inside a group follows the input.
pub fn group_by_section<'a>(entries: &[&'a ClipboardEntry], today: NaiveDate) -> Vec<Section<'a>> {
    let mut pinned = Vec::new();
    let mut dated: [Vec<&'a ClipboardEntry>; 3] = Default::default();

    for &entry in entries {
        if entry.pinned {
            pinned.push(entry);
            continue;
        }
        let slot = match DateSection::of(entry, today) {
            DateSection::Today => 0,
            DateSection::Yesterday => 1,
            DateSection::Past => 2,
        };
        dated[slot].push(entry);
    }

    let mut sections = Vec::new();
    if !pinned.is_empty() {
        sections.push(Section {
            section: None,
            entries: pinned,
        });
    }
    let order = [DateSection::Today, DateSection::Yesterday, DateSection::Past];
    for (section, entries) in order.into_iter().zip(dated) {
        if !entries.is_empty() {
            sections.push(Section {
                section: Some(section),
                entries,
            });
        }
    }
    sections
}

/// Groups relative to the local calendar date right now.
pub fn group_by_section_now<'a>(entries: &[&'a ClipboardEntry]) -> Vec<Section<'a>> {
    group_by_section(entries, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample() -> Vec<ClipboardEntry> {
        let mut pinned = ClipboardEntry::new_text("Pinned Note");
        pinned.pinned = true;
        vec![
            pinned,
            ClipboardEntry::new(EntryKind::Url, "https://rust-lang.org"),
            ClipboardEntry::new(EntryKind::File, "/home/me/notes.txt"),
            ClipboardEntry::new(EntryKind::Video, "/home/me/clip.mp4"),
            ClipboardEntry::new(EntryKind::Image, "Image.png"),
            ClipboardEntry::new(EntryKind::RichText, "styled notes"),
            ClipboardEntry::new_text("grocery list"),
        ]
    }

    fn contents(found: &[&ClipboardEntry]) -> Vec<String> {
        found.iter().map(|e| e.content.clone()).collect()
    }

    #[test]
    fn search_is_case_insensitive() {
        let entries = sample();
        let found = search(&entries, "NOTE", HistoryFilter::All);
        assert_eq!(
            contents(&found),
            vec!["Pinned Note", "/home/me/notes.txt", "styled notes"]
        );
    }

    #[test]
    fn empty_query_returns_filtered_history() {
        let entries = sample();
        assert_eq!(search(&entries, "  ", HistoryFilter::All).len(), entries.len());
        assert_eq!(
            contents(&search(&entries, "", HistoryFilter::Files)),
            vec!["/home/me/notes.txt", "/home/me/clip.mp4"]
        );
        assert_eq!(
            contents(&search(&entries, "", HistoryFilter::Text)),
            vec!["Pinned Note", "styled notes", "grocery list"]
        );
        assert_eq!(search(&entries, "", HistoryFilter::Images).len(), 1);
        assert_eq!(search(&entries, "", HistoryFilter::Urls).len(), 1);
    }

    #[test]
    fn filter_and_query_combine() {
        let entries = sample();
        assert_eq!(
            contents(&search(&entries, "note", HistoryFilter::Pinned)),
            vec!["Pinned Note"]
        );
        assert!(search(&entries, "grocery", HistoryFilter::Pinned).is_empty());
    }

    #[test]
    fn sections_follow_calendar_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let at = |y, m, d| {
            let local = Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
            let mut entry = ClipboardEntry::new_text(format!("{}-{}", m, d));
            entry.created_at = local.with_timezone(&Utc);
            entry
        };

        assert_eq!(DateSection::of(&at(2024, 3, 10), today), DateSection::Today);
        assert_eq!(DateSection::of(&at(2024, 3, 9), today), DateSection::Yesterday);
        assert_eq!(DateSection::of(&at(2024, 3, 1), today), DateSection::Past);
    }

    #[test]
    fn grouping_puts_pinned_first_and_skips_empty_sections() {
        let mut pinned = ClipboardEntry::new_text("pinned");
        pinned.pinned = true;
        pinned.created_at = Utc::now() - Duration::days(30);
        let fresh = ClipboardEntry::new_text("fresh");
        let mut old = ClipboardEntry::new_text("old");
        old.created_at = Utc::now() - Duration::days(10);

        let entries = [pinned, fresh, old];
        let refs: Vec<&ClipboardEntry> = entries.iter().collect();
        let sections = group_by_section_now(&refs);

        let shape: Vec<(Option<DateSection>, Vec<String>)> = sections
            .iter()
            .map(|s| (s.section, contents(&s.entries)))
            .collect();
        assert_eq!(
            shape,
            vec![
                (None, vec!["pinned".to_string()]),
                (Some(DateSection::Today), vec!["fresh".to_string()]),
                (Some(DateSection::Past), vec!["old".to_string()]),
            ]
        );
    }
}
