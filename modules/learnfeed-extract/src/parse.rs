//! Tolerant JSON parsing of the LLM extraction response (§4.2 parsing policy).

use serde::Deserialize;
use tracing::debug;
use url::Url;

use learnfeed_common::{Candidate, ResourceKind};

const MAX_ITEMS: usize = 20;

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    resources: Vec<RawCandidate>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Locate the first `{` through the last `}` in `raw`, parse as JSON, and
/// build candidates. Malformed JSON is not fatal: returns an empty list.
/// Entries missing `title`/`url`, with an empty `url`, or whose `url` cannot
/// be resolved against `source_url` are dropped. The list is capped at 20.
pub fn parse_candidates(raw: &str, source_url: &str) -> Vec<Candidate> {
    let Some(json_slice) = extract_json_object(raw) else {
        debug!("no JSON object found in LLM extraction response");
        return Vec::new();
    };

    let parsed: RawResponse = match serde_json::from_str(json_slice) {
        Ok(p) => p,
        Err(err) => {
            debug!(%err, "LLM extraction response was not valid JSON");
            return Vec::new();
        }
    };

    let base = Url::parse(source_url).ok();

    let mut candidates = Vec::new();
    for raw_candidate in parsed.resources {
        let Some(title) = raw_candidate.title.filter(|t| !t.is_empty()) else {
            continue;
        };
        let Some(raw_url) = raw_candidate.url.filter(|u| !u.is_empty()) else {
            continue;
        };
        let Some(resolved) = resolve_url(&raw_url, base.as_ref()) else {
            continue;
        };
        if resolved == source_url {
            continue;
        }

        let kind = raw_candidate
            .kind
            .and_then(|k| k.parse::<ResourceKind>().ok());

        candidates.push(Candidate {
            title,
            url: resolved,
            description: raw_candidate.description.filter(|d| !d.is_empty()),
            kind,
        });

        if candidates.len() >= MAX_ITEMS {
            break;
        }
    }

    candidates
}

fn resolve_url(raw_url: &str, base: Option<&Url>) -> Option<String> {
    if let Ok(absolute) = Url::parse(raw_url) {
        return Some(absolute.to_string());
    }
    base.and_then(|b| b.join(raw_url).ok()).map(|u| u.to_string())
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
