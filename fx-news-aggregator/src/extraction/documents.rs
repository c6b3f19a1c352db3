use crate::config::ExtractionConfig;
use crate::types::{AggregatorError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use url::Url;

/// Text layer of a PDF. Runs on the blocking pool.
pub async fn pdf_text(bytes: Vec<u8>) -> Result<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AggregatorError::Extraction(format!("pdf worker failed: {}", e)))?
        .map_err(|e| AggregatorError::Extraction(format!("pdf: {}", e)))
}

/// Text of a `.pptx` deck, one line per paragraph, slides in order.
pub fn slides_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AggregatorError::Extraction(format!("slides: {}", e)))?;

    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort();

    let mut paragraphs = Vec::new();
    for (_, name) in slides {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|e| AggregatorError::Extraction(format!("slides: {}", e)))?
            .read_to_string(&mut xml)?;

        let text = slide_xml_text(&xml)?;
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    Ok(paragraphs.join("\n"))
}

fn slide_number(name: &str) -> Option<usize> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Text runs (`a:t`) of one slide part, grouped by paragraph (`a:p`).
pub fn slide_xml_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut in_run = false;
    let mut current = String::new();
    let mut paragraphs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => in_run = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"a:t" => in_run = false,
            Ok(Event::End(e)) if e.name().as_ref() == b"a:p" => {
                let line = current.trim();
                if !line.is_empty() {
                    paragraphs.push(line.to_string());
                }
                current.clear();
            }
            Ok(Event::Text(t)) if in_run => {
                let text = t
                    .unescape()
                    .map_err(|e| AggregatorError::Extraction(format!("slide xml: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AggregatorError::Extraction(format!("slide xml: {}", e))),
            _ => {}
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }

    Ok(paragraphs.join("\n"))
}

/// Convert a spreadsheet to PDF with a headless office binary, then read
/// the PDF's text.
///
/// Everything is written below a temporary directory that is removed when
/// this function returns, on every path.
pub async fn spreadsheet_text(bytes: &[u8], extension: &str, config: &ExtractionConfig) -> Result<String> {
    let workdir = tempfile::tempdir()?;
    let input = workdir.path().join(format!("sheet.{}", extension));
    tokio::fs::write(&input, bytes).await?;

    // a private profile per conversion, so concurrent runs never share a lock
    let profile = Url::from_file_path(workdir.path().join("profile")).map_err(|_| {
        AggregatorError::Extraction(format!("no file url for {}", workdir.path().display()))
    })?;

    let mut command = Command::new(&config.office_binary);
    command
        .arg(format!("-env:UserInstallation={}", profile))
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(workdir.path())
        .arg(&input)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    debug!("Converting {} with {}", input.display(), config.office_binary.display());

    let status = match tokio::time::timeout(config.conversion_timeout, command.status()).await {
        Ok(status) => status?,
        Err(_) => {
            return Err(AggregatorError::Timeout {
                operation: "spreadsheet conversion".to_string(),
                seconds: config.conversion_timeout.as_secs(),
            })
        }
    };

    if !status.success() {
        return Err(AggregatorError::Extraction(format!("converter exited with {}", status)));
    }

    let pdf = tokio::fs::read(workdir.path().join("sheet.pdf")).await?;
    pdf_text(pdf).await
}
