//! Test-session descriptor (`.trx`) reading.
//!
//! A descriptor is a test-run XML document bound to the Visual Studio
//! TeamTest 2010 namespace. Two places in it reference coverage artifacts:
//!
//! ```xml
//! <TestRun xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
//!   <TestSettings>
//!     <Deployment userDeploymentRoot="C:\runs" runDeploymentRoot="run_42" />
//!   </TestSettings>
//!   <ResultSummary>
//!     <ResultFiles>
//!       <ResultFile path="run_42\In\data.coverage" />
//!     </ResultFiles>
//!     <CollectorDataEntries>
//!       <Collector uri="datacollector://microsoft/CodeCoverage/2.0">
//!         <UriAttachments>
//!           <UriAttachment><A href="agent\vstest.coverage" /></UriAttachment>
//!         </UriAttachments>
//!       </Collector>
//!     </CollectorDataEntries>
//!   </ResultSummary>
//! </TestRun>
//! ```

use crate::result::{ConvertError, ConvertResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::path::{Path, PathBuf};

/// Namespace every element of a test-run descriptor must be bound to
pub const TEST_RUN_NAMESPACE: &str = "http://microsoft.com/schemas/VisualStudio/TeamTest/2010";

/// Collector whose attachments are coverage artifacts
pub const CODE_COVERAGE_COLLECTOR_URI: &str = "datacollector://microsoft/CodeCoverage/2.0";

/// Name of the required run-deployment-root attribute
pub const RUN_DEPLOYMENT_ROOT: &str = "runDeploymentRoot";

const DEPLOYMENT_PATH: &[&str] = &["TestRun", "TestSettings", "Deployment"];
const DESCRIPTION_PATH: &[&str] = &["TestRun", "TestSettings", "Description"];
const RESULT_FILE_PATH: &[&str] = &["TestRun", "ResultSummary", "ResultFiles", "ResultFile"];
const COLLECTOR_PATH: &[&str] = &["TestRun", "ResultSummary", "CollectorDataEntries", "Collector"];
const ATTACHMENT_PATH: &[&str] = &[
    "TestRun",
    "ResultSummary",
    "CollectorDataEntries",
    "Collector",
    "UriAttachments",
    "UriAttachment",
    "A",
];

/// What a descriptor contributes to a coverage set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorExtraction {
    /// Referenced coverage artifacts, document order, duplicates removed
    pub coverage_references: Vec<String>,
    /// `userDeploymentRoot` (or the descriptor's directory) joined with `runDeploymentRoot`
    pub deployment_root: PathBuf,
    /// Free-text test settings description, if any
    pub description: Option<String>,
}

/// One open element while walking the document
#[derive(Debug)]
struct Frame {
    /// Local name, or `None` when the element is outside the test-run namespace
    name: Option<String>,
    /// Element is a `Collector` with the code-coverage URI
    coverage_collector: bool,
}

/// Values collected during the walk
#[derive(Debug, Default)]
struct Collected {
    saw_root: bool,
    user_deployment_root: Option<String>,
    run_deployment_root: Option<String>,
    references: Vec<String>,
    description: Option<String>,
}

impl Collected {
    fn add_reference(&mut self, reference: String) {
        if !reference.trim().is_empty() && !self.references.contains(&reference) {
            self.references.push(reference);
        }
    }
}

/// Read a descriptor file and extract its coverage references and deployment root.
///
/// # Errors
///
/// - [`ConvertError::Io`] if the file cannot be read
/// - [`ConvertError::MalformedDescriptor`] if it is not well-formed XML or its
///   root is not a `TestRun` in [`TEST_RUN_NAMESPACE`]
/// - [`ConvertError::MissingRequiredField`] if `runDeploymentRoot` is absent
pub fn extract(descriptor_path: &Path) -> ConvertResult<DescriptorExtraction> {
    let content = std::fs::read(descriptor_path).map_err(|e| {
        ConvertError::io(format!("read descriptor {}", descriptor_path.display()), e)
    })?;
    let collected = walk(descriptor_path, &content)?;

    let run_root = collected
        .run_deployment_root
        .ok_or_else(|| ConvertError::MissingRequiredField {
            path: descriptor_path.to_path_buf(),
            field: RUN_DEPLOYMENT_ROOT,
        })?;

    let user_root = collected
        .user_deployment_root
        .map_or_else(|| containing_directory(descriptor_path), PathBuf::from);

    let extraction = DescriptorExtraction {
        coverage_references: collected.references,
        deployment_root: user_root.join(run_root),
        description: collected.description,
    };

    tracing::debug!(
        descriptor = %descriptor_path.display(),
        references = extraction.coverage_references.len(),
        deployment_root = %extraction.deployment_root.display(),
        description = extraction.description.as_deref().unwrap_or(""),
        "descriptor extracted"
    );

    Ok(extraction)
}

/// Directory holding the descriptor; `.` for a bare file name
fn containing_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn walk(path: &Path, content: &[u8]) -> ConvertResult<Collected> {
    let mut reader = NsReader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut collected = Collected::default();
    let mut buf = Vec::new();

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| ConvertError::malformed_descriptor(path, e.to_string()))?;
        let in_namespace = is_test_run_namespace(&ns);

        match event {
            Event::Start(element) => {
                let frame = open_element(path, in_namespace, &element, &stack, &mut collected)?;
                stack.push(frame);
            }
            Event::Empty(element) => {
                let frame = open_element(path, in_namespace, &element, &stack, &mut collected)?;
                stack.push(frame);
                stack.pop();
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                if path_is(&stack, DESCRIPTION_PATH) {
                    let value = text
                        .unescape()
                        .map_err(|e| ConvertError::malformed_descriptor(path, e.to_string()))?;
                    collected.description = Some(value.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ConvertError::malformed_descriptor(
            path,
            "unexpected end of document",
        ));
    }
    if !collected.saw_root {
        return Err(ConvertError::malformed_descriptor(
            path,
            format!("no TestRun element in namespace {TEST_RUN_NAMESPACE}"),
        ));
    }

    Ok(collected)
}

fn is_test_run_namespace(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == TEST_RUN_NAMESPACE.as_bytes())
}

fn open_element(
    path: &Path,
    in_namespace: bool,
    element: &BytesStart<'_>,
    stack: &[Frame],
    collected: &mut Collected,
) -> ConvertResult<Frame> {
    let local = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();

    if stack.is_empty() {
        if !in_namespace || local != "TestRun" {
            return Err(ConvertError::malformed_descriptor(
                path,
                format!("root element is not TestRun in namespace {TEST_RUN_NAMESPACE}"),
            ));
        }
        collected.saw_root = true;
    }

    let mut frame = Frame {
        name: in_namespace.then_some(local),
        coverage_collector: false,
    };

    let mut current: Vec<&str> = stack.iter().map(|f| f.name.as_deref().unwrap_or("")).collect();
    current.push(frame.name.as_deref().unwrap_or(""));

    if current == DEPLOYMENT_PATH {
        if let Some(value) = attribute(path, element, "userDeploymentRoot")? {
            collected.user_deployment_root = Some(value);
        }
        if let Some(value) = attribute(path, element, RUN_DEPLOYMENT_ROOT)? {
            collected.run_deployment_root = Some(value);
        }
    } else if current == RESULT_FILE_PATH {
        if let Some(value) = attribute(path, element, "path")? {
            collected.add_reference(value);
        }
    } else if current == COLLECTOR_PATH {
        frame.coverage_collector = attribute(path, element, "uri")?.as_deref()
            == Some(CODE_COVERAGE_COLLECTOR_URI);
    } else if current == ATTACHMENT_PATH && inside_coverage_collector(stack) {
        if let Some(value) = attribute(path, element, "href")? {
            collected.add_reference(value);
        }
    }

    Ok(frame)
}

fn inside_coverage_collector(stack: &[Frame]) -> bool {
    stack
        .get(COLLECTOR_PATH.len() - 1)
        .is_some_and(|frame| frame.coverage_collector)
}

fn path_is(stack: &[Frame], expected: &[&str]) -> bool {
    stack.len() == expected.len()
        && stack
            .iter()
            .zip(expected)
            .all(|(frame, name)| frame.name.as_deref() == Some(*name))
}

/// Value of an unprefixed attribute by local name
fn attribute(path: &Path, element: &BytesStart<'_>, name: &str) -> ConvertResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| ConvertError::malformed_descriptor(path, e.to_string()))?;
        if attr.key.prefix().is_none() && attr.key.local_name().as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| ConvertError::malformed_descriptor(path, e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
