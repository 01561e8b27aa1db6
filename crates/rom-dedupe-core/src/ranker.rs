//! Keeper selection for a group of same-game ROMs.
//!
//! Every entry is reduced to a [`ScoreKey`]; keys compare field by field, so a
//! later field only matters when all earlier ones are equal.

use crate::config::AppConfig;
use crate::grouper::GameGroup;
use crate::parser::{DumpQuality, FileMetadata, FilenameParser};
use crate::scanner::RomEntry;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Built-in region scores. Higher is better.
pub const DEFAULT_REGION_SCORES: &[(&str, i64)] = &[
    ("USA", 100),
    ("U", 100),
    ("World", 90),
    ("USA, Europe", 85),
    ("Japan, USA", 85),
    ("Europe", 70),
    ("E", 70),
    ("Australia", 65),
    ("Brazil", 60),
    ("Asia", 50),
    ("Japan", 40),
    ("J", 40),
    ("China", 30),
    ("Korea", 30),
    ("Hong Kong", 25),
];

/// Container and cartridge formats preferred over anything else.
pub const PREFERRED_EXTENSIONS: &[&str] = &["chd", "md", "zip", "sfc", "nes", "gb", "gba"];

const TRANSLATION_BONUS: i64 = 30;
const EUROPE_ENGLISH_BONUS: i64 = 10;

/// Sort key for one entry. Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScoreKey {
    pub region: i64,
    pub format: i64,
    pub quality: i64,
    pub version: i64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankResult {
    pub keeper: Option<RomEntry>,
    /// Entries to remove, best first. Never contains `.m3u` playlists.
    pub to_remove: Vec<RomEntry>,
    /// The keeper tied with the runner-up; the pick was arbitrary.
    pub uncertain: bool,
}

/// Region table and filename parser used to score entries.
///
/// Built once per run; configured overrides are merged into a copy of the
/// defaults rather than mutating shared state.
#[derive(Debug, Clone)]
pub struct RankPolicy {
    region_scores: HashMap<String, i64>,
    parser: FilenameParser,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self::new(None, &[])
    }
}

impl RankPolicy {
    /// `region_priority` lists codes best first: position 0 scores 100 and each
    /// following position 10 less. Listed codes replace their default score.
    pub fn new(region_priority: Option<&[String]>, translation_patterns: &[String]) -> Self {
        let mut region_scores: HashMap<String, i64> = DEFAULT_REGION_SCORES
            .iter()
            .map(|(code, score)| (code.to_string(), *score))
            .collect();
        if let Some(priority) = region_priority {
            for (position, code) in priority.iter().enumerate() {
                region_scores.insert(code.clone(), 100 - 10 * position as i64);
            }
        }
        Self {
            region_scores,
            parser: FilenameParser::new(translation_patterns),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.region_priority.as_deref(),
            config.translation_patterns.as_slice(),
        )
    }

    pub fn parser(&self) -> &FilenameParser {
        &self.parser
    }

    pub fn region_score(&self, metadata: &FileMetadata) -> i64 {
        let mut score = metadata
            .region
            .as_deref()
            .and_then(|code| self.region_scores.get(code))
            .copied()
            .unwrap_or(0);
        if metadata.is_japan_region() && metadata.has_translation {
            score += TRANSLATION_BONUS;
        }
        if metadata.is_europe_region() && metadata.has_english() {
            score += EUROPE_ENGLISH_BONUS;
        }
        score
    }

    pub fn score(&self, entry: &RomEntry) -> ScoreKey {
        let metadata = entry.parse(&self.parser);
        let key = ScoreKey {
            region: self.region_score(&metadata),
            format: format_score(entry.extension.as_deref()),
            quality: quality_score(metadata.quality),
            version: version_score(metadata.version.as_deref()),
            size: entry.size(),
        };
        trace!(path = %entry.path.display(), ?key, "Scored entry");
        key
    }

    /// Entries paired with their keys, best first. Equal keys keep group order.
    pub fn scored(&self, group: &GameGroup) -> Vec<(RomEntry, ScoreKey)> {
        let mut scored: Vec<(RomEntry, ScoreKey)> = group
            .entries
            .iter()
            .map(|entry| (entry.clone(), self.score(entry)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }

    /// Pick the keeper for a group.
    ///
    /// Playlists are only kept when the group holds nothing but playlists, and
    /// are never listed for removal.
    pub fn rank(&self, group: &GameGroup) -> RankResult {
        match group.entries.as_slice() {
            [] => return RankResult::default(),
            [only] => {
                return RankResult {
                    keeper: Some(only.clone()),
                    to_remove: Vec::new(),
                    uncertain: false,
                }
            }
            _ => {}
        }

        let (candidates, playlists): (Vec<_>, Vec<_>) = self
            .scored(group)
            .into_iter()
            .partition(|(entry, _)| !entry.is_playlist());
        let pool = if candidates.is_empty() {
            playlists
        } else {
            candidates
        };

        let uncertain = pool.len() > 1 && pool[0].1 == pool[1].1;
        let mut ranked = pool.into_iter().map(|(entry, _)| entry);
        let keeper = ranked.next();
        let to_remove: Vec<RomEntry> = ranked.filter(|entry| !entry.is_playlist()).collect();

        if uncertain {
            debug!(
                console = %group.console,
                title = %group.title,
                "Top candidates tied, keeper is arbitrary"
            );
        }

        RankResult {
            keeper,
            to_remove,
            uncertain,
        }
    }
}

pub fn format_score(extension: Option<&str>) -> i64 {
    match extension {
        Some(ext) if PREFERRED_EXTENSIONS.contains(&ext) => 100,
        Some("cue") => 80,
        Some("bin") => 50,
        _ => 70,
    }
}

pub fn quality_score(quality: Option<DumpQuality>) -> i64 {
    match quality {
        Some(DumpQuality::Verified) => 100,
        Some(DumpQuality::Bad) => 0,
        _ => 50,
    }
}

/// Leading numeric component of a version string; anything else scores 0.
pub fn version_score(version: Option<&str>) -> i64 {
    version
        .and_then(|v| v.split('.').next())
        .and_then(|major| major.trim().parse::<i64>().ok())
        .unwrap_or(0)
}
