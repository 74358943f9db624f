//! Ordered named checks and their report.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Outcome of a single named check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Ok,
    Failed(String),
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckOutcome::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::Ok => "OK",
            CheckOutcome::Failed(_) => "FAILED",
        }
    }
}

/// Check outcomes in execution order; serializes as a JSON object
/// `{name: "OK" | "FAILED"}` whose key order is the execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    entries: Vec<(&'static str, CheckOutcome)>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `name`, handing back the value on success
    pub fn record<T>(&mut self, name: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => {
                tracing::debug!("Check {} passed", name);
                self.entries.push((name, CheckOutcome::Ok));
                Some(value)
            }
            Err(message) => {
                tracing::warn!("Check {} failed: {}", name, message);
                self.entries.push((name, CheckOutcome::Failed(message)));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn all_ok(&self) -> bool {
        self.entries.iter().all(|(_, o)| o.is_ok())
    }

    /// Message of the first failed check, if any
    pub fn failure(&self) -> Option<(&'static str, &str)> {
        self.entries.iter().find_map(|(n, o)| match o {
            CheckOutcome::Failed(msg) => Some((*n, msg.as_str())),
            CheckOutcome::Ok => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CheckReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, outcome) in &self.entries {
            map.serialize_entry(name, outcome.as_str())?;
        }
        map.end()
    }
}
