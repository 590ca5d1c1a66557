//! Process-wide switch lookup.
//!
//! Components consult configuration switches through a plain key-value
//! holder rather than reading `std::env::args` directly, so tests can build
//! contexts against arbitrary switch sets.

use std::collections::HashMap;

/// Parsed `--switch[=value]` pairs.
///
/// Unknown arguments (anything without a `--` prefix) are ignored; a switch
/// given more than once keeps its last value.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    switches: HashMap<String, String>,
}

impl CommandLine {
    /// An empty switch set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from an argument iterator, skipping the program name.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cl = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some(stripped) = arg.strip_prefix("--") else {
                continue;
            };
            match stripped.split_once('=') {
                Some((name, value)) => cl.append_switch_with_value(name, value),
                None => cl.append_switch(stripped),
            }
        }
        cl
    }

    /// Parse from the current process arguments.
    pub fn from_current_process() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn append_switch(&mut self, name: &str) {
        self.switches.insert(name.to_string(), String::new());
    }

    pub fn append_switch_with_value(&mut self, name: &str, value: &str) {
        self.switches.insert(name.to_string(), value.to_string());
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.contains_key(name)
    }

    /// Value of a switch, or `""` when absent or valueless.
    pub fn switch_value(&self, name: &str) -> &str {
        self.switches.get(name).map(String::as_str).unwrap_or("")
    }
}
