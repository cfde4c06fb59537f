//! Coverage report documents.
//!
//! The engine produces the report; this module only checks that what came
//! back is a well-formed XML tree, writes it out and sequences the call.

use crate::engine::CoverageEngine;
use crate::result::{ConvertError, ConvertResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Structured XML report built from a consolidated coverage artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    xml: String,
    root: String,
}

impl ReportDocument {
    /// Wrap report XML, checking that it is a single well-formed element tree
    pub fn from_xml(xml: impl Into<String>) -> ConvertResult<Self> {
        let xml = xml.into();
        let root = root_element(&xml)
            .map_err(|message| ConvertError::engine("build report", message))?;
        Ok(Self { xml, root })
    }

    /// Name of the document element
    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Report text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// Write the report, creating missing parent directories
    pub fn write_to(&self, path: &Path) -> ConvertResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConvertError::io(format!("create {}", parent.display()), e))?;
        }
        std::fs::write(path, &self.xml)
            .map_err(|e| ConvertError::io(format!("write report {}", path.display()), e))
    }
}

fn root_element(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut root: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| format!("invalid report XML: {e}"))?;
        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                if depth == 0 {
                    if root.is_some() {
                        return Err("invalid report XML: more than one root element".to_string());
                    }
                    root = Some(String::from_utf8_lossy(element.name().as_ref()).into_owned());
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err("invalid report XML: unexpected end of document".to_string());
    }
    root.ok_or_else(|| "invalid report XML: no root element".to_string())
}

/// Build the report for a consolidated artifact.
///
/// Symbol and binary directories are passed to the engine as one set.
pub fn build_report<E: CoverageEngine + ?Sized>(
    engine: &E,
    artifact: &Path,
    search_dirs: &BTreeSet<String>,
) -> ConvertResult<ReportDocument> {
    if !artifact.is_file() {
        return Err(ConvertError::io(
            format!("open consolidated artifact {}", artifact.display()),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }

    tracing::info!(
        artifact = %artifact.display(),
        search_dirs = search_dirs.len(),
        "building report"
    );
    let report = engine.load_report(artifact, search_dirs)?;
    tracing::debug!(root = report.root_name(), bytes = report.as_str().len(), "report built");
    Ok(report)
}

/// Report path used when none is given: `input` with its extension set to `xml`
#[must_use]
pub fn default_output_path(input: &str) -> PathBuf {
    Path::new(input).with_extension("xml")
}
