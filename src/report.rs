//! JUnit XML rendering of result trees.
//!
//! Each spec produces one report file. A spec with a single top-level suite gets
//! that `<testsuite>` as the document root; several top-level suites are wrapped
//! in `<testsuites>` so the file stays well-formed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};

use crate::error::{Error, ReportError};
use crate::models::{Example, Outcome, Suite};
use crate::spec::strip_extension;

/// Render one suite (and everything beneath it) as a standalone document.
pub fn render_suite(suite: &Suite) -> Result<Vec<u8>, ReportError> {
    let mut writer = document()?;
    write_suite(&mut writer, suite)?;
    Ok(finish(writer))
}

/// Render the result root of one spec as the contents of its report file.
pub fn render_spec(root: &Suite) -> Result<Vec<u8>, ReportError> {
    let [only] = root.suites.as_slice() else {
        let mut writer = document()?;
        if root.suites.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("testsuites")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("testsuites")))?;
            for suite in &root.suites {
                write_suite(&mut writer, suite)?;
            }
            writer.write_event(Event::End(BytesEnd::new("testsuites")))?;
        }
        return Ok(finish(writer));
    };
    render_suite(only)
}

/// `SPEC-<path>.xml`, with the extension dropped and non-word characters replaced by `-`.
pub fn report_file_name(spec_path: &str) -> String {
    let name: String = strip_extension(spec_path)
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    format!("SPEC-{name}.xml")
}

/// Write the report for one spec into `dir`, creating the directory if needed.
pub fn write_report(dir: &Path, spec_path: &str, root: &Suite) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir).map_err(|e| Error::ReportWrite {
        path: dir.to_path_buf(),
        source: e.into(),
    })?;

    let path = dir.join(report_file_name(spec_path));
    let write = || -> Result<(), ReportError> {
        let xml = render_spec(root)?;
        fs::write(&path, xml)?;
        Ok(())
    };
    write().map_err(|source| Error::ReportWrite {
        path: path.clone(),
        source,
    })?;

    tracing::info!(spec = spec_path, path = %path.display(), "wrote report");
    Ok(path)
}

fn document() -> Result<Writer<Vec<u8>>, ReportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> Vec<u8> {
    let mut xml = writer.into_inner();
    xml.push(b'\n');
    xml
}

fn seconds(duration_ms: f64) -> String {
    (duration_ms / 1000.0).to_string()
}

fn write_suite<W: Write>(writer: &mut Writer<W>, suite: &Suite) -> Result<(), ReportError> {
    let time = seconds(suite.stats.duration_ms);
    let tests = suite.stats.tests.to_string();
    let failures = suite.stats.failures.to_string();
    let skipped = suite.stats.pending.to_string();

    let start = BytesStart::new("testsuite").with_attributes([
        ("name", suite.title.as_str()),
        ("time", time.as_str()),
        ("tests", tests.as_str()),
        ("failures", failures.as_str()),
        ("skipped", skipped.as_str()),
    ]);
    writer.write_event(Event::Start(start))?;
    for example in &suite.examples {
        write_example(writer, example)?;
    }
    for child in &suite.suites {
        write_suite(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_example<W: Write>(writer: &mut Writer<W>, example: &Example) -> Result<(), ReportError> {
    let time = seconds(example.duration_ms);
    let start = BytesStart::new("testcase").with_attributes([
        ("classname", example.classname.as_str()),
        ("name", example.title.as_str()),
        ("time", time.as_str()),
    ]);

    match &example.outcome {
        Outcome::Passed => {
            writer.write_event(Event::Empty(start))?;
        }
        Outcome::Pending => {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        Outcome::Failed(failure) => {
            writer.write_event(Event::Start(start))?;
            let element =
                BytesStart::new("failure").with_attributes([("message", failure.short_message())]);
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::CData(BytesCData::new(cdata_safe(
                &failure.full_message(),
            ))))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
    }
    Ok(())
}

/// Split any `]]>` across two adjacent CDATA sections.
fn cdata_safe(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}
