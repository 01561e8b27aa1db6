//! Filename parser for No-Intro / GoodTools style ROM names.
//!
//! Parses filenames like:
//! - "ActRaiser (U) [!].zip"
//! - "Power Drive (Europe) (En,Fr,De,Es,Pt).md"
//! - "X-Files, The (USA) (Disc 2).chd"
//!
//! Extraction is an ordered pipeline. Each step takes the remaining text, claims
//! its tag and returns the text with that tag removed, so a later step can never
//! re-match text an earlier one consumed.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use tracing::{trace, warn};

/// Literal region markers and the code each one records. The first match wins.
pub const REGION_TAGS: &[(&str, &str)] = &[
    ("(USA)", "USA"),
    ("(U)", "U"),
    ("(Japan)", "Japan"),
    ("(J)", "J"),
    ("(Europe)", "Europe"),
    ("(E)", "E"),
    ("(World)", "World"),
    ("(Australia)", "Australia"),
    ("(Brazil)", "Brazil"),
    ("(Asia)", "Asia"),
    ("(USA, Europe)", "USA, Europe"),
    ("(Japan, USA)", "Japan, USA"),
    ("(China)", "China"),
    ("(Korea)", "Korea"),
    ("(Hong Kong)", "Hong Kong"),
];

const BUILTIN_TRANSLATION_PATTERNS: &[&str] = &[
    r"\(En\)",
    r"\(Translation\)",
    r"\(Translated\)",
    r"\(T-[^)]+\)",
];

lazy_static! {
    static ref DISC_RE: Regex = Regex::new(r"(?i)\(Disc\s+(\d+)\)").unwrap();
    static ref QUALITY_RE: Regex = Regex::new(r"\[([!bafho])\]").unwrap();
    static ref REGION_RES: Vec<(Regex, &'static str)> = REGION_TAGS
        .iter()
        .map(|(tag, code)| {
            let re = Regex::new(&format!("(?i){}", regex::escape(tag))).unwrap();
            (re, *code)
        })
        .collect();
    static ref LANGUAGE_RE: Regex = Regex::new(r"\(([A-Za-z]{2}(?:,[A-Za-z]{2})*)\)").unwrap();
    static ref VERSION_RE: Regex =
        Regex::new(r"(?i)\((?:v(\d+(?:\.\d+)*)|Rev\s+([0-9A-Za-z.]+))\)").unwrap();
    static ref TRANSLATION_RES: Vec<Regex> = BUILTIN_TRANSLATION_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();
    static ref DEFAULT_PARSER: FilenameParser = FilenameParser::default();
}

/// Dump verification flag from a GoodTools `[x]` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpQuality {
    /// `[!]` verified good dump
    Verified,
    /// `[b]` bad dump
    Bad,
    /// `[a]` alternate
    Alternate,
    /// `[f]` fixed
    Fixed,
    /// `[h]` hack
    Hack,
    /// `[o]` overdump
    Overdump,
}

impl DumpQuality {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '!' => Some(Self::Verified),
            'b' => Some(Self::Bad),
            'a' => Some(Self::Alternate),
            'f' => Some(Self::Fixed),
            'h' => Some(Self::Hack),
            'o' => Some(Self::Overdump),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Verified => '!',
            Self::Bad => 'b',
            Self::Alternate => 'a',
            Self::Fixed => 'f',
            Self::Hack => 'h',
            Self::Overdump => 'o',
        }
    }
}

impl fmt::Display for DumpQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.as_char())
    }
}

/// Metadata derived from a ROM filename. Nothing here touches the filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub base_title: String,
    /// Grouping key: lowercased, whitespace-collapsed, leading article folded.
    pub base_title_normalized: String,
    pub region: Option<String>,
    pub languages: Option<Vec<String>>,
    pub disc_number: Option<u32>,
    pub has_translation: bool,
    pub quality: Option<DumpQuality>,
    pub version: Option<String>,
}

impl FileMetadata {
    pub fn is_japan_region(&self) -> bool {
        matches!(self.region.as_deref(), Some("J") | Some("Japan"))
    }

    pub fn is_europe_region(&self) -> bool {
        matches!(self.region.as_deref(), Some("E") | Some("Europe"))
    }

    pub fn has_english(&self) -> bool {
        self.languages
            .as_ref()
            .is_some_and(|langs| langs.iter().any(|l| l.eq_ignore_ascii_case("en")))
    }
}

/// Parser with the built-in translation markers plus any configured extras.
#[derive(Debug, Clone, Default)]
pub struct FilenameParser {
    extra_translation: Vec<Regex>,
}

impl FilenameParser {
    /// Compile extra translation patterns. Invalid regexes are logged and skipped.
    pub fn new<S: AsRef<str>>(extra_translation_patterns: &[S]) -> Self {
        let extra_translation = extra_translation_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern.as_ref()) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Invalid translation pattern '{}': {}", pattern.as_ref(), e);
                    None
                }
            })
            .collect();
        Self { extra_translation }
    }

    /// Parse a filename, dropping the extension first.
    pub fn parse(&self, filename: &str) -> FileMetadata {
        self.parse_stem(strip_extension(filename))
    }

    /// Parse a name that carries no extension, such as a game folder.
    pub fn parse_stem(&self, stem: &str) -> FileMetadata {
        let (rest, disc_number) = extract_disc(stem.to_string());
        let (rest, quality) = extract_quality(rest);
        let (rest, region) = extract_region(rest);
        let (rest, languages) = extract_languages(rest);
        let (rest, version) = extract_version(rest);
        let has_translation = self.detect_translation(&rest, region.as_deref(), &languages);
        let base_title = clean_title(&rest);

        let metadata = FileMetadata {
            base_title_normalized: normalize_title(&base_title),
            base_title,
            region,
            languages,
            disc_number,
            has_translation,
            quality,
            version,
        };

        trace!(
            stem = stem,
            title = %metadata.base_title_normalized,
            region = ?metadata.region,
            languages = ?metadata.languages,
            disc = ?metadata.disc_number,
            "Parsed filename"
        );

        metadata
    }

    /// A translation is either an explicit marker left in the text, or an
    /// English language list on a Japanese release.
    fn detect_translation(
        &self,
        rest: &str,
        region: Option<&str>,
        languages: &Option<Vec<String>>,
    ) -> bool {
        let marked = TRANSLATION_RES
            .iter()
            .chain(self.extra_translation.iter())
            .any(|re| re.is_match(rest));
        if marked {
            return true;
        }
        let japanese = matches!(region, Some("J") | Some("Japan"));
        japanese
            && languages
                .as_ref()
                .is_some_and(|langs| langs.iter().any(|l| l.eq_ignore_ascii_case("en")))
    }
}

/// Parse with the built-in tables only.
pub fn parse_filename(filename: &str) -> FileMetadata {
    DEFAULT_PARSER.parse(filename)
}

/// Everything before the last `.`, or the whole name when there is none.
pub fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    }
}

fn trim_separators(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}

/// `(Disc N)`: every occurrence is removed, the first one is recorded.
fn extract_disc(stem: String) -> (String, Option<u32>) {
    if !DISC_RE.is_match(&stem) {
        return (stem, None);
    }
    let disc = DISC_RE
        .captures(&stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0);
    let rest = DISC_RE.replace_all(&stem, "").trim().to_string();
    (rest, disc)
}

/// `[!]`, `[b]`, ...: runs before region extraction so brackets glued to a
/// region tag don't disturb it.
fn extract_quality(stem: String) -> (String, Option<DumpQuality>) {
    let quality = QUALITY_RE
        .captures(&stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .and_then(DumpQuality::from_char);
    if quality.is_none() {
        return (stem, None);
    }
    let rest = QUALITY_RE.replace_all(&stem, "").trim().to_string();
    (rest, quality)
}

/// First region tag from [`REGION_TAGS`]; removes it and any dangling separators.
fn extract_region(stem: String) -> (String, Option<String>) {
    for (re, code) in REGION_RES.iter() {
        if re.is_match(&stem) {
            let rest = trim_separators(&re.replace_all(&stem, ""));
            return (rest, Some(code.to_string()));
        }
    }
    (stem, None)
}

/// `(En)` or `(En,Fr,De)`. A single code is only accepted at exactly two
/// letters, so a leftover region like `(USA)` is never read as a language.
fn extract_languages(stem: String) -> (String, Option<Vec<String>>) {
    let Some(caps) = LANGUAGE_RE.captures(&stem) else {
        return (stem, None);
    };
    let (Some(whole), Some(list)) = (caps.get(0), caps.get(1)) else {
        return (stem, None);
    };
    let content = list.as_str();
    let is_language_list = content.contains(',')
        || (content.len() == 2 && content.chars().all(|c| c.is_ascii_alphabetic()));
    if !is_language_list {
        return (stem, None);
    }

    let languages = content.split(',').map(|c| c.trim().to_string()).collect();
    let mut rest = String::with_capacity(stem.len());
    rest.push_str(&stem[..whole.start()]);
    rest.push_str(&stem[whole.end()..]);
    (trim_separators(&rest), Some(languages))
}

/// `(v1.1)`, `(Rev 2)`, `(Rev A)`.
fn extract_version(stem: String) -> (String, Option<String>) {
    let Some(caps) = VERSION_RE.captures(&stem) else {
        return (stem, None);
    };
    let version = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string());
    let rest = trim_separators(&VERSION_RE.replacen(&stem, 1, ""));
    (rest, version)
}

fn clean_title(rest: &str) -> String {
    rest.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ' ' || c == '-' || c == ',')
        .to_string()
}

/// Lowercase, collapse whitespace and fold a leading article to the end of the
/// main title: "The Legend of Zelda" and "Legend of Zelda, The" both become
/// "legend of zelda, the".
pub fn normalize_title(title: &str) -> String {
    let collapsed = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    fold_leading_article(&collapsed)
}

fn fold_leading_article(title: &str) -> String {
    for article in ["the", "an", "a"] {
        let Some(rest) = title
            .strip_prefix(article)
            .and_then(|r| r.strip_prefix(' '))
        else {
            continue;
        };
        return match rest.split_once(" - ") {
            Some((main, subtitle)) => format!("{main}, {article} - {subtitle}"),
            None => format!("{rest}, {article}"),
        };
    }
    title.to_string()
}
