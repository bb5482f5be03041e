use crate::ir::{StepEntry, StepId, StepMap};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static DEPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<step>[^:\s]+)\s*:\s*(?P<deps>.*)$").unwrap());
static ARROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-->\s*").unwrap());
static DEP_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid step map: {0}")]
    StepMap(String),
    #[error("invalid step list: {0}")]
    StepList(String),
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// Parses step dependencies from any supported input.
///
/// - a JSON (or JSON5) object mapping step ids to dependency lists,
/// - a JSON (or JSON5) workflow step list,
/// - text with one `step: deps` or `a --> b` statement per line.
pub fn parse_steps(input: &str) -> Result<StepMap, ParseError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') {
        parse_step_map(input)
    } else if trimmed.starts_with('[') {
        let entries = parse_step_list(input)?;
        Ok(dependencies_from_step_list(&entries))
    } else {
        parse_step_text(input)
    }
}

fn from_json_like<T: DeserializeOwned>(input: &str) -> Result<T, String> {
    match serde_json::from_str::<T>(input) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str::<T>(input).map_err(|_| json_err.to_string()),
    }
}

pub fn parse_step_map(input: &str) -> Result<StepMap, ParseError> {
    from_json_like(input).map_err(ParseError::StepMap)
}

pub fn parse_step_list(input: &str) -> Result<Vec<StepEntry>, ParseError> {
    from_json_like(input).map_err(ParseError::StepList)
}

/// Flattens a workflow step list into a dependency map.
///
/// Plain entries of a list run one after another. A nested list holds
/// parallel branches that all start after the preceding step; whatever
/// follows the branches depends on the last step of each of them.
pub fn dependencies_from_step_list(entries: &[StepEntry]) -> StepMap {
    let mut deps = StepMap::new();
    process_sequence(entries, None, &mut deps);
    deps
}

fn process_sequence(
    entries: &[StepEntry],
    mut predecessors: Option<Vec<StepId>>,
    deps: &mut StepMap,
) {
    for entry in entries {
        match entry {
            StepEntry::Step(step) => {
                add_step(*step, predecessors.as_deref(), deps);
                predecessors = Some(vec![*step]);
            }
            StepEntry::Group(branches) => {
                for branch in branches {
                    process_sequence(as_sequence(branch), predecessors.clone(), deps);
                }
                let mut last = Vec::new();
                for branch in branches {
                    collect_last_steps(branch, &mut last);
                }
                predecessors = Some(last);
            }
        }
    }
}

fn as_sequence(entry: &StepEntry) -> &[StepEntry] {
    match entry {
        StepEntry::Group(items) => items,
        StepEntry::Step(_) => std::slice::from_ref(entry),
    }
}

fn add_step(step: StepId, predecessors: Option<&[StepId]>, deps: &mut StepMap) {
    match predecessors {
        Some(predecessors) => deps.entry(step).or_default().extend_from_slice(predecessors),
        None => {
            deps.insert(step, Vec::new());
        }
    }
}

/// Last steps of a branch: the branch itself for a plain step, otherwise the
/// last entry of the sequence, descending into every branch of a trailing
/// group.
fn collect_last_steps(entry: &StepEntry, out: &mut Vec<StepId>) {
    match entry {
        StepEntry::Step(step) => out.push(*step),
        StepEntry::Group(items) => match items.last() {
            Some(StepEntry::Group(inner)) => {
                for item in inner {
                    collect_last_steps(item, out);
                }
            }
            Some(last) => collect_last_steps(last, out),
            None => {}
        },
    }
}

/// Parses the line based text form.
///
/// ```text
/// %% comments start with two percent signs
/// 1:
/// 2: 1
/// 4: 2, 3
/// 1 --> 3 --> 5
/// ```
pub fn parse_step_text(input: &str) -> Result<StepMap, ParseError> {
    let mut deps = StepMap::new();
    for (line_idx, raw) in input.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = match raw.find("%%") {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        if line.contains("-->") {
            let chain = ARROW_RE
                .split(line)
                .map(|token| parse_id(token, line_no))
                .collect::<Result<Vec<_>, _>>()?;
            for pair in chain.windows(2) {
                deps.entry(pair[0]).or_default();
                push_unique(deps.entry(pair[1]).or_default(), pair[0]);
            }
            continue;
        }

        if let Some(caps) = DEPS_RE.captures(line) {
            let step = parse_id(&caps["step"], line_no)?;
            let entry = deps.entry(step).or_default();
            for token in DEP_SPLIT_RE.split(caps["deps"].trim()) {
                if token.is_empty() {
                    continue;
                }
                push_unique(entry, parse_id(token, line_no)?);
            }
            continue;
        }

        let step = parse_id(line, line_no)?;
        deps.entry(step).or_default();
    }
    Ok(deps)
}

fn parse_id(token: &str, line: usize) -> Result<StepId, ParseError> {
    token.trim().parse().map_err(|_| ParseError::Syntax {
        line,
        message: format!("invalid step id '{}'", token.trim()),
    })
}

fn push_unique(list: &mut Vec<StepId>, id: StepId) {
    if !list.contains(&id) {
        list.push(id);
    }
}
