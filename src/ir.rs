use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a workflow step.
///
/// `0` is reserved for the synthetic start node every diagram is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StepId(pub u64);

impl StepId {
    pub const ROOT: StepId = StepId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for StepId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(StepId)
    }
}

// Step ids arrive both as JSON numbers and as numeric object keys/strings.
impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StepIdVisitor;

        impl Visitor<'_> for StepIdVisitor {
            type Value = StepId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer step id")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<StepId, E> {
                Ok(StepId(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<StepId, E> {
                u64::try_from(value)
                    .map(StepId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<StepId, E> {
                if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
                    Ok(StepId(value as u64))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(value), &self))
                }
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<StepId, E> {
                value
                    .parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(StepIdVisitor)
    }
}

/// Step id → ids of the steps it depends on (its parents).
///
/// Ordered by step id, which is also the order steps are added to the graph.
pub type StepMap = BTreeMap<StepId, Vec<StepId>>;

/// One entry of a workflow step list.
///
/// A list is a sequence; a nested list inside a sequence is a set of parallel
/// branches, each of which is again a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StepEntry {
    Step(StepId),
    Group(Vec<StepEntry>),
}
