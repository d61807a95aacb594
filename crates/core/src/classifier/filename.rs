use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use super::{CapSeasonPolicy, Category, Quality, TorrentMetadata};

/// Extensions stripped before classification.
const EXTENSIONS: &[&str] = &[
    "torrent", "mkv", "mp4", "avi", "m4v", "mov", "wmv", "webm", "ts", "iso",
];

/// Release, quality and language tags removed from titles.
const NOISE_TOKENS: &[&str] = &[
    "wolfmax4k.com", "wolfmax4k.net",
    "720esp", "1080esp", "2160esp", "4kesp", "blurayesp",
    "720p", "1080p", "2160p", "480p", "1080i", "720pesp", "1080pesp", "2160pesp", "4k",
    "uhd", "hdr", "hdr10", "10bit",
    "hdtv", "webrip", "web-dl", "webdl", "bluray", "br", "bdrip", "dvdrip", "hdrip", "remux",
    "x264", "x265", "h264", "h265", "hevc", "xvid", "aac", "dts", "ac3",
    "proper", "repack",
    "esp", "eng", "subesp", "lat", "latam", "multi", "castellano", "spanish", "english",
];

static NOISE_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = NOISE_TOKENS
        .iter()
        .map(|t| regex_lite::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("valid regex")
});

static ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\{[^}]*\}").expect("valid regex"));

/// `x264-GROUP` style suffix; the technical token is kept for NOISE_RE.
static RELEASE_GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(x26[45]|h\.?26[45]|hevc|xvid|aac|ac3|dts|bluray|webrip|web-?dl|hdtv|remux|\d{3,4}p)-[a-z0-9]+$",
    )
    .expect("valid regex")
});

static SMALL_PAREN_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*\d{1,3}\s*\)").expect("valid regex"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19\d{2}|20\d{2})\b").expect("valid regex"));

static SXXEYY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2})\s*e(\d{1,3})\b").expect("valid regex"));

static TEMPORADA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btemporada\s*(\d{1,2})(?:.*?\bcap[ií]tulo\s*(\d{1,3}))?").expect("valid regex")
});

static SEASON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bseason\s*(\d{1,2})(?:.*?\bepisode\s*(\d{1,3}))?").expect("valid regex")
});

static CAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcap(?:[ií]tulo)?\.?\s*(\d{1,4})\b").expect("valid regex"));

struct SeriesMarker {
    season: u32,
    episode: Option<u32>,
    start: usize,
    end: usize,
}

/// Classify a release filename (no directory part).
pub fn classify(file_name: &str, policy: CapSeasonPolicy) -> TorrentMetadata {
    let stem = strip_extension(file_name.trim());
    let quality = detect_quality(stem);

    let cleaned = ANNOTATION_RE.replace_all(stem, " ");
    let cleaned = RELEASE_GROUP_RE.replace(cleaned.trim(), "${1}");
    let cleaned = NOISE_RE.replace_all(&cleaned, " ");
    let cleaned = SMALL_PAREN_NUMBER_RE.replace_all(&cleaned, " ");
    let normalized = collapse_separators(&cleaned);

    let marker = detect_series(&normalized, policy);
    let title_source = match &marker {
        Some(m) => {
            let before = normalized[..m.start].trim();
            if before.is_empty() {
                format!("{} {}", &normalized[..m.start], &normalized[m.end..])
            } else {
                before.to_string()
            }
        }
        None => normalized.clone(),
    };

    let year = YEAR_RE
        .find_iter(&normalized)
        .last()
        .map(|m| m.as_str().to_string());

    let mut title = match &year {
        Some(y) => tidy_title(&remove_year(&title_source, y)),
        None => tidy_title(&title_source),
    };
    if title.is_empty() {
        // A bare year is a better title than nothing ("2012.mkv")
        title = tidy_title(&title_source);
    }

    let (category, season, episode) = match marker {
        Some(m) => (Category::Series, Some(m.season), m.episode),
        None => (Category::Movie, None, None),
    };

    TorrentMetadata {
        title,
        year,
        quality,
        category,
        season,
        episode,
    }
}

/// Key for a movie group in the nested catalog layout: `title||year`.
pub fn canonical_movie_key(title: &str, year: Option<&str>) -> String {
    format!("{}||{}", canonical_title(title), year.unwrap_or_default())
}

/// Key for a series season group in the nested catalog layout: `title||S<n>`.
pub fn canonical_series_key(title: &str, season: u32) -> String {
    format!("{}||S{}", canonical_title(title), season)
}

/// Lowercase, every non-word character becomes a space, ends trimmed.
/// Inner runs of spaces are kept.
fn canonical_title(title: &str) -> String {
    let replaced: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    replaced.trim().to_string()
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => name,
    }
}

fn detect_quality(stem: &str) -> Quality {
    let lower = stem.to_lowercase();
    if lower.contains("4k") || lower.contains("2160") {
        Quality::Uhd4k
    } else if lower.contains("1080") {
        Quality::Hd1080
    } else if lower.contains("720") {
        Quality::Hd720
    } else {
        Quality::Unknown
    }
}

fn collapse_separators(s: &str) -> String {
    s.replace(['.', '_', '[', ']', '{', '}'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Try each series pattern in order; the first match wins.
fn detect_series(s: &str, policy: CapSeasonPolicy) -> Option<SeriesMarker> {
    let explicit = [&*SXXEYY_RE, &*TEMPORADA_RE, &*SEASON_RE];
    for re in explicit {
        if let Some(caps) = re.captures(s) {
            if let Some(season) = capture_number(&caps, 1) {
                let whole = caps.get(0)?;
                return Some(SeriesMarker {
                    season,
                    episode: capture_number(&caps, 2),
                    start: whole.start(),
                    end: whole.end(),
                });
            }
        }
    }

    let caps = CAP_RE.captures(s)?;
    let whole = caps.get(0)?;
    let number = capture_number(&caps, 1)?;
    let (season, episode) = match policy {
        CapSeasonPolicy::Hundreds if number >= 100 => (number / 100, number % 100),
        CapSeasonPolicy::Hundreds | CapSeasonPolicy::AlwaysOne => (1, number),
    };
    Some(SeriesMarker {
        season,
        episode: Some(episode),
        start: whole.start(),
        end: whole.end(),
    })
}

fn capture_number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

/// Remove every standalone occurrence of `year`, with wrapping parentheses.
fn remove_year(s: &str, year: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for m in YEAR_RE.find_iter(s).filter(|m| m.as_str() == year) {
        let mut start = m.start();
        let mut end = m.end();
        if s[..start].ends_with('(') {
            start -= 1;
        }
        if s[end..].starts_with(')') {
            end += 1;
        }
        if start < last {
            continue;
        }
        out.push_str(&s[last..start]);
        out.push(' ');
        last = end;
    }
    out.push_str(&s[last..]);
    out
}

fn tidy_title(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || "-._[]()".contains(c))
        .to_string()
}
