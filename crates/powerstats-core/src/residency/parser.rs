//! Parsers for "prefix: value" counter dumps.
//!
//! These are pure functions over file contents, so every extraction rule can
//! be tested with string inputs.

use tracing::trace;

use crate::models::ResidencyRecord;
use crate::residency::config::{FieldRule, PowerEntityConfig, StateResidencyConfig};

/// Error type for field-level parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Returns the part of `content` that belongs to an entity.
///
/// An empty `header` selects the whole text. Otherwise the scope starts right
/// after the first occurrence of `header` and ends at the nearest following
/// occurrence of any other header in `sibling_headers`, or at end of text.
/// Occurrences that are part of a longer sibling header (`WIFI` inside
/// `WIFI-PCIE`) do not count. Returns `None` if `header` does not occur.
pub fn entity_scope<'a>(
    content: &'a str,
    header: &str,
    sibling_headers: &[&str],
) -> Option<&'a str> {
    if header.is_empty() {
        return Some(content);
    }

    let start = find_header(content, header, sibling_headers)? + header.len();
    let rest = &content[start..];

    let end = sibling_headers
        .iter()
        .filter(|h| !h.is_empty() && **h != header)
        .filter_map(|h| find_header(rest, h, sibling_headers))
        .min()
        .unwrap_or(rest.len());

    Some(&rest[..end])
}

/// Byte offset of the first occurrence of `header` that is not embedded in
/// a longer header from `headers`.
fn find_header(content: &str, header: &str, headers: &[&str]) -> Option<usize> {
    content
        .match_indices(header)
        .map(|(idx, _)| idx)
        .find(|&idx| !within_longer_header(content, idx, header, headers))
}

fn within_longer_header(content: &str, idx: usize, header: &str, headers: &[&str]) -> bool {
    headers
        .iter()
        .filter(|h| h.len() > header.len())
        .any(|longer| {
            longer.match_indices(header).any(|(offset, _)| {
                idx >= offset
                    && content
                        .get(idx - offset..)
                        .is_some_and(|text| text.starts_with(*longer))
            })
        })
}

/// Finds the first line containing `prefix` and returns the text after it.
pub fn find_field<'a>(scope: &'a str, prefix: &str) -> Option<&'a str> {
    scope
        .lines()
        .find_map(|line| line.find(prefix).map(|idx| &line[idx + prefix.len()..]))
}

/// Parses the leading digits of the first whitespace-delimited token as an
/// unsigned counter.
///
/// Trailing units or punctuation (`5000ns`, `12,`) are ignored; a token that
/// does not start with a digit is an error.
pub fn parse_value(text: &str) -> Result<u64, ParseError> {
    let token = text
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("missing value"))?;
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    token[..digits_end]
        .parse()
        .map_err(|_| ParseError::new(format!("invalid counter {:?}", token)))
}

/// Extracts and converts one field from scoped text.
pub fn extract_field(scope: &str, rule: &FieldRule) -> Result<u64, ParseError> {
    let rest = find_field(scope, &rule.prefix)
        .ok_or_else(|| ParseError::new(format!("prefix {:?} not found", rule.prefix)))?;
    let raw = parse_value(rest)?;
    rule.transform
        .apply(raw)
        .ok_or_else(|| ParseError::new(format!("transform rejected {}", raw)))
}

/// Applies one state rule to an entity's scoped text.
///
/// Always returns a record; fields that are unconfigured, missing or
/// unparsable are left as `None`.
pub fn parse_state_residency(
    entity_name: &str,
    scope: &str,
    config: &StateResidencyConfig,
) -> ResidencyRecord {
    let field = |rule: &Option<FieldRule>| -> Option<u64> {
        let rule = rule.as_ref()?;
        match extract_field(scope, rule) {
            Ok(value) => Some(value),
            Err(e) => {
                trace!(entity = entity_name, state = %config.name, error = %e, "field omitted");
                None
            }
        }
    };

    ResidencyRecord {
        entity_name: entity_name.to_string(),
        state_name: config.name.clone(),
        entry_count: field(&config.entry_count),
        total_time_ms: field(&config.total_time),
        last_entry_timestamp_ms: field(&config.last_entry),
    }
}

/// Applies every state rule of an entity to its scoped text.
pub fn parse_entity(scope: &str, entity: &PowerEntityConfig) -> Vec<ResidencyRecord> {
    entity
        .states
        .iter()
        .map(|state| parse_state_residency(&entity.name, scope, state))
        .collect()
}

/// Counters of one `<token> <entry_count> <time>` state line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCounters {
    pub entry_count: u64,
    /// Cumulative time in the source's unit.
    pub time: u64,
}

/// Parses one `<token> <entry_count> <time>` line.
pub fn parse_state_counters_line(line: &str) -> Result<(&str, StateCounters), ParseError> {
    let mut parts = line.split_whitespace();
    let token = parts
        .next()
        .ok_or_else(|| ParseError::new("empty line"))?;
    let entry_count = parse_value(parts.next().unwrap_or(""))?;
    let time = parse_value(parts.next().unwrap_or(""))?;
    Ok((token, StateCounters { entry_count, time }))
}

/// Parses a file of blocks, each headed by a line holding only the block
/// name, followed by `<state token> <entry_count> <time>` lines.
///
/// Lines of an unlisted block are ignored.
///
/// The outer vector follows `blocks`; `None` means the block is absent.
/// Inner vectors follow `states`; `None` means the state line is missing or
/// malformed.
pub fn parse_counter_blocks(
    content: &str,
    blocks: &[&str],
    states: &[&str],
) -> Vec<Option<Vec<Option<StateCounters>>>> {
    let mut parsed: Vec<Option<Vec<Option<StateCounters>>>> = vec![None; blocks.len()];
    let mut current = None;

    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        if tokens.next().is_none() {
            current = blocks.iter().position(|b| *b == first);
            if let Some(block) = current {
                parsed[block] = Some(vec![None; states.len()]);
            }
            continue;
        }

        let (Some(block), Some(state)) = (current, states.iter().position(|s| *s == first))
        else {
            continue;
        };
        match parse_state_counters_line(line) {
            Ok((_, counters)) => {
                if let Some(Some(slots)) = parsed.get_mut(block) {
                    slots[state] = Some(counters);
                }
            }
            Err(e) => trace!(block = blocks[block], error = %e, "skipping state line"),
        }
    }

    parsed
}
