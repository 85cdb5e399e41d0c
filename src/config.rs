//! Meta-section configuration, layered over built-in defaults.

use crate::error::{AssemblyError, ErrorKind, Result};
use crate::normalize::Line;
use crate::trace::Trace;
use serde_json::json;

/// String key/value configuration with stable insertion order. Setting
/// an existing key overwrites its value in place, so a key keeps its
/// original position in the emitted metadata even when redefined.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    entries: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            entries: vec![("mem_amt".to_owned(), "4".to_owned())],
        }
    }
}

impl Config {
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(known, _)| known == key) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.entries.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(known, _)| known == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Parse `key=value` lines, splitting on the first `=`. Unknown keys
/// are accepted and passed through to the metadata region.
pub fn parse_meta(lines: &[Line], trace: &mut Trace) -> Result<Config> {
    trace.checkpoint("start_proc_meta");
    let mut config = Config::default();

    for line in lines {
        trace.emit("read_meta_line", || json!([line.text]));
        let eq = line.text.find('=').ok_or_else(|| {
            AssemblyError::new(line.number, ErrorKind::MalformedMeta(line.text.clone()))
        })?;
        let key = line.text[..eq].trim();
        let value = line.text[eq + 1..].trim();
        trace.emit("ustd_meta_line", || {
            json!([
                format!("Config item {} has value {}", key, value),
                key,
                value
            ])
        });
        config.set(key, value);
    }

    Ok(config)
}
