use crate::parser::FilenameParser;
use crate::scanner::RomEntry;
use std::collections::BTreeMap;
use tracing::debug;

/// ROM entries that represent the same game on one console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameGroup {
    pub console: String,
    /// Normalized title shared by every entry.
    pub title: String,
    /// Tag-stripped title of the first entry, for display.
    pub display_title: String,
    pub entries: Vec<RomEntry>,
}

impl GameGroup {
    pub fn has_duplicates(&self) -> bool {
        self.entries.len() > 1
    }
}

/// Group entries by `(console, normalized title)`.
///
/// Groups come back sorted by that key. Within a group entries keep input
/// order, which the ranker uses only to break exact ties.
pub fn group_entries(entries: &[RomEntry], parser: &FilenameParser) -> Vec<GameGroup> {
    let mut buckets: BTreeMap<(String, String), (String, Vec<RomEntry>)> = BTreeMap::new();

    for entry in entries {
        let metadata = entry.parse(parser);
        buckets
            .entry((entry.console.clone(), metadata.base_title_normalized))
            .or_insert_with(|| (metadata.base_title, Vec::new()))
            .1
            .push(entry.clone());
    }

    let groups: Vec<GameGroup> = buckets
        .into_iter()
        .map(|((console, title), (display_title, entries))| GameGroup {
            console,
            title,
            display_title,
            entries,
        })
        .collect();

    debug!(
        "Grouped {} entries into {} groups",
        entries.len(),
        groups.len()
    );
    groups
}
