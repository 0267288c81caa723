//! Gateway `errcode` to message mapping.
//!
//! Message tables are deployment-specific, so none ships with the crate.
//! Deployments supply their own through [`ErrorMapper::with_overrides`]; a
//! code with no entry is reported as the raw code.

use std::collections::HashMap;

/// Maps `errcode` values to human-readable messages.
///
/// Codes are compared numerically, so `"05"` and `"5"` are the same code.
/// A code with no entry maps to itself, never to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMapper {
    messages: HashMap<i64, String>,
}

impl ErrorMapper {
    /// Creates a mapper with no messages; every code maps to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper from deployment-specific `(code, message)` entries.
    ///
    /// Entries whose code is not an integer are ignored.
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let messages = overrides
            .into_iter()
            .filter_map(|(code, msg)| parse_code(code.as_ref()).map(|c| (c, msg.into())))
            .collect();
        Self { messages }
    }

    /// Returns the message for `code`.
    pub fn message(&self, code: &str) -> String {
        parse_code(code)
            .and_then(|numeric| self.messages.get(&numeric).cloned())
            .unwrap_or_else(|| code.to_string())
    }
}

fn parse_code(code: &str) -> Option<i64> {
    code.trim().parse().ok()
}
