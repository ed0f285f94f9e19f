//! JUnit report decoding
//!
//! Turns a JUnit-style XML document into a [`RawSuiteTree`]. This layer is
//! purely structural: counters and durations stay as the raw attribute strings
//! and are only interpreted by the aggregator.

use std::io::ErrorKind;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ReportError, ReportResult};

/// Root element of a multi-group report.
const RUN_ROOT: &str = "testsuites";
/// Root element of a single-group report.
const GROUP_ROOT: &str = "testsuite";

/// Decoded report: the run element and its groups, in document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSuiteTree {
    /// Run-level duration in seconds, as written by the test driver
    #[serde(rename = "@time", default)]
    pub time: Option<String>,
    #[serde(rename = "testsuite", default)]
    pub suites: Vec<RawSuite>,
}

/// A `<testsuite>` element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSuite {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@tests", default)]
    pub tests: Option<String>,
    #[serde(rename = "@failures", default)]
    pub failures: Option<String>,
    #[serde(rename = "@errors", default)]
    pub errors: Option<String>,
    #[serde(rename = "@time", default)]
    pub time: Option<String>,
    #[serde(rename = "testcase", default)]
    pub cases: Vec<RawCase>,
}

/// A `<testcase>` element with any failure/error children.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCase {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "failure", default)]
    pub failures: Vec<RawDetail>,
    #[serde(rename = "error", default)]
    pub errors: Vec<RawDetail>,
}

impl RawCase {
    /// True when the case carries at least one failure or error record.
    pub fn is_failing(&self) -> bool {
        !self.failures.is_empty() || !self.errors.is_empty()
    }
}

/// A `<failure>` or `<error>` element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDetail {
    #[serde(rename = "@message", default)]
    pub message: Option<String>,
    #[serde(rename = "@type", default)]
    pub kind: Option<String>,
    /// Body text, CDATA included
    #[serde(rename = "$text", default)]
    pub text: Option<String>,
}

/// Read and decode the report at `path`.
pub fn parse_file(path: &Path) -> ReportResult<RawSuiteTree> {
    let xml = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ReportError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ReportError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let tree = parse_str(&xml)?;
    debug!(
        path = %path.display(),
        suites = tree.suites.len(),
        "Decoded test report"
    );
    Ok(tree)
}

/// Decode a report held in memory.
///
/// Accepts a `<testsuites>` root, or a lone `<testsuite>` root which is
/// treated as a run of one group timed by that group.
pub fn parse_str(xml: &str) -> ReportResult<RawSuiteTree> {
    let (root, xml) = flatten_details(xml)?;
    match root.as_str() {
        RUN_ROOT => quick_xml::de::from_str::<RawSuiteTree>(&xml)
            .map_err(|e| ReportError::malformed(format!("invalid <{RUN_ROOT}> document: {e}"))),
        GROUP_ROOT => {
            let suite = quick_xml::de::from_str::<RawSuite>(&xml).map_err(|e| {
                ReportError::malformed(format!("invalid <{GROUP_ROOT}> document: {e}"))
            })?;
            Ok(RawSuiteTree {
                time: suite.time.clone(),
                suites: vec![suite],
            })
        }
        other => Err(ReportError::malformed(format!(
            "expected <{RUN_ROOT}> root element, found <{other}>"
        ))),
    }
}

/// Rewrite the document so every `<failure>`/`<error>` body is plain text.
///
/// Markup nested inside a detail element is unwrapped: its text is kept in
/// place and the tags themselves are dropped, so `a<b>x</b>c` reads `axc`.
/// Returns the local name of the root element with the rewritten document.
fn flatten_details(xml: &str) -> ReportResult<(String, String)> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut root: Option<String> = None;
    // 0 outside a detail element, 1 on the detail itself, >1 inside nested markup
    let mut detail_depth = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => event,
            Err(e) => {
                return Err(ReportError::malformed(format!(
                    "XML syntax error at byte {}: {e}",
                    reader.error_position()
                )))
            }
        };

        let keep = match &event {
            Event::Start(e) => {
                root.get_or_insert_with(|| local_name(e.local_name().as_ref()));
                if detail_depth > 0 {
                    detail_depth += 1;
                    false
                } else {
                    if is_detail(e.local_name().as_ref()) {
                        detail_depth = 1;
                    }
                    true
                }
            }
            Event::End(_) => match detail_depth {
                0 => true,
                1 => {
                    detail_depth = 0;
                    true
                }
                _ => {
                    detail_depth -= 1;
                    false
                }
            },
            Event::Empty(e) => {
                root.get_or_insert_with(|| local_name(e.local_name().as_ref()));
                detail_depth == 0
            }
            Event::Comment(_) | Event::PI(_) => detail_depth == 0,
            _ => true,
        };

        if keep {
            writer
                .write_event(event)
                .map_err(|e| ReportError::malformed(format!("failed to rewrite report: {e}")))?;
        }
    }

    let root = root.ok_or_else(|| ReportError::malformed("document has no root element"))?;
    let xml = String::from_utf8(writer.into_inner())
        .map_err(|e| ReportError::malformed(format!("report is not valid UTF-8: {e}")))?;
    Ok((root, xml))
}

fn is_detail(name: &[u8]) -> bool {
    name == b"failure" || name == b"error"
}

fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}
