//! The `ipv6` configuration block.
//!
//! Two switches, both off by default:
//!
//! ```text
//! forwarding on|off    # forward transit packets
//! disable on|off       # drop every IPv6 packet
//! ```
//!
//! The block is accepted either as YAML (`forwarding: on` or
//! `forwarding: true`) or in the keyword form above, one switch per line.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Ipv6Conf {
    #[serde(deserialize_with = "switch")]
    pub forwarding: bool,
    #[serde(deserialize_with = "switch")]
    pub disable: bool,
}

impl Ipv6Conf {
    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parse the keyword form. Unknown keywords and bad values are logged and
    /// skipped.
    pub fn from_keywords(s: &str) -> Self {
        let mut conf = Self::default();
        for line in s.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let key = tokens.next().unwrap_or("");
            let value = tokens.next().unwrap_or("");
            conf.set_keyword(key, value);
        }
        conf
    }

    /// Apply a single `key value` setting. Returns `false` if it was ignored.
    pub fn set_keyword(&mut self, key: &str, value: &str) -> bool {
        let field = match key {
            "forwarding" => &mut self.forwarding,
            "disable" => &mut self.disable,
            _ => {
                warn!("unknown ipv6 keyword {}", key);
                return false;
            }
        };
        match parse_switch(value) {
            Some(on) => {
                *field = on;
                true
            }
            None => {
                warn!("bad ipv6 config {} {}", key, value);
                false
            }
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("on") {
        Some(true)
    } else if value.eq_ignore_ascii_case("off") {
        Some(false)
    } else {
        None
    }
}

fn switch<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Switch {
        Bool(bool),
        Word(String),
    }

    match Switch::deserialize(deserializer)? {
        Switch::Bool(on) => Ok(on),
        Switch::Word(word) => parse_switch(&word)
            .ok_or_else(|| de::Error::custom(format!("expect on or off, got {}", word))),
    }
}
