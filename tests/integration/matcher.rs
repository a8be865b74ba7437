use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Include,
    NotInclude,
    Eq,
    Regex,
    IncludeAll,
    IncludeNone,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MatcherValue {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Deserialize)]
pub struct Matcher {
    pub kind: MatcherKind,
    pub value: MatcherValue,
}

impl Matcher {
    pub fn matches(&self, actual: &str) -> bool {
        let result = match (&self.kind, &self.value) {
            (MatcherKind::Include, MatcherValue::Single(s)) => actual.contains(s),
            (MatcherKind::NotInclude, MatcherValue::Single(s)) => !actual.contains(s),
            (MatcherKind::Eq, MatcherValue::Single(s)) => actual.trim() == s.trim(),
            (MatcherKind::Regex, MatcherValue::Single(s)) => match Regex::new(s) {
                Ok(re) => re.is_match(actual),
                Err(e) => {
                    error!(target: "test_runner", "Invalid regex: {}", e);
                    false
                }
            },
            (MatcherKind::IncludeAll, MatcherValue::Multiple(all)) => {
                all.iter().all(|frag| actual.contains(frag))
            }
            (MatcherKind::IncludeNone, MatcherValue::Multiple(none)) => {
                none.iter().all(|frag| !actual.contains(frag))
            }
            (kind, value) => {
                error!(target: "test_runner", ?kind, ?value, "Unsupported matcher combination");
                false
            }
        };
        debug!(target: "test_runner", ?self, result, "Matcher evaluated");
        result
    }
}
