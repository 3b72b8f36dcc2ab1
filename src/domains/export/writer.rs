use crate::domains::application::types::Application;
use crate::domains::export::format::{detail_rows, header_rows};
use crate::domains::export::types::{DetailRow, ExportError, ExportedDocument};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

/// Detail rows that fit below the header on the first page.
pub const FIRST_PAGE_ROWS: usize = 18;
/// Detail rows on every following page.
pub const PAGE_ROWS: usize = 26;

const TITLE: &str = "Insurance Application";
const SECTION_TITLE: &str = "Application Details";
const PAGE_WIDTH: usize = 72;
const PAGE_BREAK: char = '\u{000C}';

/// Produces a downloadable document for an application
#[async_trait]
pub trait DocumentExporter: Send + Sync {
    async fn export(&self, application: &Application) -> Result<ExportedDocument, ExportError>;
}

/// Writes paginated plain-text documents into a directory
pub struct TextDocumentExporter {
    output_dir: PathBuf,
}

impl TextDocumentExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn file_name_for(application_id: &str) -> String {
        format!("application-{}.txt", application_id)
    }
}

#[async_trait]
impl DocumentExporter for TextDocumentExporter {
    async fn export(&self, application: &Application) -> Result<ExportedDocument, ExportError> {
        if application.id.is_empty() || application.id.contains(['/', '\\']) {
            return Err(ExportError::Rendering(format!(
                "unusable application id '{}'",
                application.id
            )));
        }

        let generated_at = Utc::now();
        let rows = detail_rows(application);
        let pages = paginate(&rows);
        let contents = render_document(application, &pages, generated_at);

        let file_name = Self::file_name_for(&application.id);
        let dir = self.output_dir.clone();
        let path = dir.join(&file_name);
        let target = path.clone();

        let bytes_written = task::spawn_blocking(move || -> Result<u64, ExportError> {
            std::fs::create_dir_all(&dir)?;
            let mut temp = NamedTempFile::new_in(&dir)?;
            temp.write_all(contents.as_bytes())?;
            temp.flush()?;
            temp.persist(&target).map_err(|e| ExportError::Io(e.error.to_string()))?;
            Ok(contents.len() as u64)
        })
        .await
        .map_err(|e| ExportError::TaskFailed(e.to_string()))??;

        log::info!(
            "Exported application {} to {} ({} pages)",
            application.id,
            path.display(),
            pages.len()
        );

        Ok(ExportedDocument {
            application_id: application.id.clone(),
            file_name,
            path,
            page_count: pages.len(),
            bytes_written,
            generated_at,
        })
    }
}

/// Splits rows into pages. Always yields at least one page.
pub fn paginate(rows: &[DetailRow]) -> Vec<&[DetailRow]> {
    let split = rows.len().min(FIRST_PAGE_ROWS);
    let (first, rest) = rows.split_at(split);

    let mut pages = vec![first];
    pages.extend(rest.chunks(PAGE_ROWS));
    pages
}

fn centered(text: &str) -> String {
    let pad = PAGE_WIDTH.saturating_sub(text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn render_document(
    application: &Application,
    pages: &[&[DetailRow]],
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let page_count = pages.len();
    let generated = format!("Generated on {}", generated_at.format("%-m/%-d/%Y, %-I:%M:%S %p UTC"));

    for (index, rows) in pages.iter().enumerate() {
        if index == 0 {
            out.push_str(&centered(TITLE));
            out.push_str("\n\n");
            for row in header_rows(application) {
                out.push_str(&format!("{}: {}\n", row.label, row.value));
            }
            out.push_str(&"-".repeat(PAGE_WIDTH));
            out.push_str("\n\n");
            out.push_str(SECTION_TITLE);
            out.push_str("\n\n");
        } else {
            out.push(PAGE_BREAK);
            out.push('\n');
        }

        for row in rows.iter() {
            out.push_str(&format!("{}: {}\n", row.label, row.value));
        }

        out.push('\n');
        out.push_str(&centered(&format!("Page {} of {}", index + 1, page_count)));
        out.push('\n');
        out.push_str(&centered(&generated));
        out.push('\n');
    }

    out
}
