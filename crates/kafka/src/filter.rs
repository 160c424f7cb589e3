//! Content filter for the filtered stream mode.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Filter criteria for a continuous stream.
///
/// Either set may be absent, but not both: a filter with no criteria passes
/// everything and is indistinguishable from the unfiltered stream, so it is
/// rejected at construction time, before any broker session is opened.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    symbols: Option<HashSet<String>>,
    msg_types: Option<HashSet<String>>,
}

impl FilterConfig {
    /// Parse comma-separated symbol and message-type lists.
    ///
    /// Entries are trimmed; membership checks are exact and case-sensitive.
    /// A list that is empty after trimming is rejected.
    pub fn parse(symbols: Option<&str>, msg_types: Option<&str>) -> Result<Self> {
        let symbols = symbols.map(parse_set).transpose()?;
        let msg_types = msg_types.map(parse_set).transpose()?;
        if symbols.is_none() && msg_types.is_none() {
            return Err(Error::InvalidFilter(
                "provide either symbols or msgtypes for filtering".to_string(),
            ));
        }
        Ok(Self { symbols, msg_types })
    }

    /// Whether a record with this schema name and symbol passes.
    ///
    /// When a symbol set is configured, a record without a symbol field can
    /// never match. When both sets are configured, both must match.
    pub fn passes(&self, schema_name: &str, symbol: Option<&str>) -> bool {
        let symbol_ok = match &self.symbols {
            None => true,
            Some(set) => symbol.map(str::trim).is_some_and(|s| set.contains(s)),
        };
        let type_ok = match &self.msg_types {
            None => true,
            Some(set) => set.contains(schema_name.trim()),
        };
        symbol_ok && type_ok
    }
}

fn parse_set(list: &str) -> Result<HashSet<String>> {
    let set: HashSet<String> = list
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect();
    if set.is_empty() {
        return Err(Error::InvalidFilter(format!(
            "no usable entries in filter list '{list}'"
        )));
    }
    Ok(set)
}
