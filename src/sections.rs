//! Sectioning: groups normalized lines under `section.` headers.

use crate::error::{AssemblyError, ErrorKind, Result};
use crate::normalize::Line;
use crate::trace::Trace;
use serde_json::json;

const SECTION_PREFIX: &str = "section.";
const REQUIRED: [&str; 3] = ["meta", "data", "text"];

/// The three mandatory section bodies. Other section names are
/// tolerated but their contents are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sections {
    pub meta: Vec<Line>,
    pub data: Vec<Line>,
    pub text: Vec<Line>,
}

pub fn split_sections(lines: &[Line], trace: &mut Trace) -> Result<Sections> {
    let mut sections = Sections::default();
    let mut seen: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in lines {
        if let Some(name) = line.text.strip_prefix(SECTION_PREFIX) {
            if seen.iter().any(|known| known == name) {
                return Err(AssemblyError::new(
                    line.number,
                    ErrorKind::DuplicateSection(name.to_owned()),
                ));
            }
            seen.push(name.to_owned());
            current = Some(name.to_owned());
            continue;
        }
        // Lines before the first header belong to no section.
        match current.as_deref() {
            Some("meta") => sections.meta.push(line.clone()),
            Some("data") => sections.data.push(line.clone()),
            Some("text") => sections.text.push(line.clone()),
            _ => {}
        }
    }

    for required in &REQUIRED {
        if !seen.iter().any(|known| known == required) {
            return Err(AssemblyError::global(ErrorKind::MissingSection(
                (*required).to_owned(),
            )));
        }
    }

    trace.emit("split", || {
        json!([
            body(&sections.meta),
            body(&sections.data),
            body(&sections.text)
        ])
    });
    Ok(sections)
}

fn body(lines: &[Line]) -> String {
    let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
    texts.join("\n")
}
