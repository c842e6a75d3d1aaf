//! Xray routing document model
//!
//! Typed view of the router's routing file (`{"routing": {"rules": [...]}}`).
//! Fields this crate does not manage are kept in `extra` maps so a
//! read-modify-write cycle does not lose them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Root of the routing file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub routing: Routing,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// e.g. `domainStrategy`, `balancers`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One routing rule. Absent optional fields stay absent on output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(rename = "type", default)]
    pub rule_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_tag: Option<Vec<String>>,

    /// Domain match strings, in file order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Xray accepts both `"port": 443` and `"port": "80,443,1000-2000"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortFilter {
    Single(u16),
    List(String),
}

impl RoutingConfig {
    /// Parse the routing file
    ///
    /// # Errors
    ///
    /// Returns [`crate::RouterError::Json`] if the text is not a valid
    /// routing document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the whole document, pretty-printed. Struct fields keep
    /// their declared order and unknown fields are emitted sorted, so the
    /// same document always produces the same text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RouterError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The rule whose `outboundTag` equals `tag`, first match wins
    #[must_use]
    pub fn managed_rule(&self, tag: &str) -> Option<&Rule> {
        self.routing
            .rules
            .iter()
            .find(|rule| rule.outbound_tag.as_deref() == Some(tag))
    }

    #[must_use]
    pub fn managed_rule_mut(&mut self, tag: &str) -> Option<&mut Rule> {
        self.routing
            .rules
            .iter_mut()
            .find(|rule| rule.outbound_tag.as_deref() == Some(tag))
    }
}

/// A change to the managed rule's domain list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEdit {
    /// Append entries not yet present, skipping blanks and repeats
    Add(Vec<String>),
    /// Drop every occurrence of each entry
    Remove(Vec<String>),
}

impl DomainEdit {
    /// Apply the edit to `rule` and return how many entries were added or
    /// removed. A rule without a domain list only gains one when something
    /// is actually added.
    pub fn apply(&self, rule: &mut Rule) -> usize {
        let existed = rule.domain.is_some();
        let mut domains = rule.domain.take().unwrap_or_default();

        let changed = match self {
            Self::Add(new) => {
                let before = domains.len();
                for entry in new {
                    if !entry.trim().is_empty() && !domains.contains(entry) {
                        domains.push(entry.clone());
                    }
                }
                domains.len() - before
            }
            Self::Remove(gone) => {
                let gone: HashSet<&str> = gone.iter().map(String::as_str).collect();
                let before = domains.len();
                domains.retain(|entry| !gone.contains(entry.as_str()));
                before - domains.len()
            }
        };

        if existed || !domains.is_empty() {
            rule.domain = Some(domains);
        }
        changed
    }
}

/// Split user input such as `"a.com, b.com c.com"` into domain entries.
/// Commas and whitespace both separate; empty pieces are dropped.
#[must_use]
pub fn parse_domain_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
