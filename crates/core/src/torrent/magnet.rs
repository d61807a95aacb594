use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

static MAGNET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)magnet:\?xt=urn:btih:[a-z0-9]+\S*").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MagnetError {
    #[error("Not a magnet URI: missing 'magnet:?' prefix")]
    MissingPrefix,

    #[error("Magnet URI has no urn:btih exact topic")]
    MissingInfoHash,
}

/// A parsed magnet URI. Only the parameters the catalog uses are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetLink {
    /// btih value, lowercased.
    pub info_hash: String,
    pub display_name: Option<String>,
    pub trackers: Vec<String>,
}

/// Build `magnet:?xt=urn:btih:<hash>` with one `tr` parameter per tracker.
///
/// Trackers are emitted in the given order and are not deduplicated.
pub fn build_magnet(infohash: &str, trackers: &[String]) -> String {
    let mut uri = format!("magnet:?xt=urn:btih:{}", infohash);
    for tracker in trackers {
        uri.push_str("&tr=");
        uri.push_str(&encode_tracker(tracker));
    }
    uri
}

/// Percent-encode a tracker URL, leaving `:`, `/` and `?` readable.
pub fn encode_tracker(tracker: &str) -> String {
    urlencoding::encode(tracker)
        .replace("%3A", ":")
        .replace("%2F", "/")
        .replace("%3F", "?")
}

/// Every magnet URI found in free text, in order of appearance.
///
/// Sentence punctuation glued to the end of a link is not part of it.
pub fn find_magnets(text: &str) -> Vec<String> {
    MAGNET_RE
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .collect()
}

/// Strip trailing `.,;:!?'"` and closers without a matching opener.
fn trim_trailing_punctuation(uri: &str) -> &str {
    let mut end = uri;
    while let Some(last) = end.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '>' => true,
            ')' => end.matches('(').count() < end.matches(')').count(),
            ']' => end.matches('[').count() < end.matches(']').count(),
            '}' => end.matches('{').count() < end.matches('}').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        end = &end[..end.len() - last.len_utf8()];
    }
    end
}

pub fn parse_magnet(uri: &str) -> Result<MagnetLink, MagnetError> {
    let query = uri
        .strip_prefix("magnet:?")
        .ok_or(MagnetError::MissingPrefix)?;

    let mut info_hash = None;
    let mut display_name = None;
    let mut trackers = Vec::new();

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "xt" => {
                if let Some(hash) = value.strip_prefix("urn:btih:") {
                    info_hash = Some(hash.to_lowercase());
                }
            }
            "dn" => display_name = Some(decode_component(value)),
            "tr" => trackers.push(decode_component(value)),
            _ => {}
        }
    }

    Ok(MagnetLink {
        info_hash: info_hash
            .filter(|h| !h.is_empty())
            .ok_or(MagnetError::MissingInfoHash)?,
        display_name,
        trackers,
    })
}

fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|s| s.into_owned())
        .unwrap_or(value)
}
