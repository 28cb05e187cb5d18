// src/export/sink.rs

//! A single export format writing to the local filesystem.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{AppError, Result};
use crate::export::ExportFormat;
use crate::models::Report;

/// Writes reports in one format under `{root}/{PREFIX}/`.
#[derive(Debug, Clone)]
pub struct ExportSink {
    format: ExportFormat,
    dir: PathBuf,
    renderer: String,
}

impl ExportSink {
    /// `renderer` is the HTML to PDF program, used by the PDF format only.
    pub fn new(format: ExportFormat, root: &Path, renderer: &str) -> Self {
        Self {
            format,
            dir: root.join(format.prefix()),
            renderer: renderer.to_string(),
        }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Destination of a report: `{dir}/YYYY/YYYY-MM-DD_HHMMSS.{ext}`.
    pub fn path_for(&self, report: &Report) -> PathBuf {
        self.dir
            .join(report.archive_year().to_string())
            .join(format!("{}.{}", report.file_stem(), self.format.extension()))
    }

    /// Write a report, replacing any previous export of it.
    pub fn export(&self, report: &Report) -> Result<PathBuf> {
        let path = self.path_for(report);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.format {
            ExportFormat::Html => write_bytes(&path, report.html.as_bytes())?,
            ExportFormat::Json => write_bytes(&path, &serde_json::to_vec_pretty(report)?)?,
            ExportFormat::Pdf => self.render_pdf(&report.html, &path)?,
        }

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Pipe the document through the renderer: `<renderer> --quiet --encoding UTF-8 - <path>`.
    fn render_pdf(&self, html: &str, path: &Path) -> Result<()> {
        let mut child = Command::new(&self.renderer)
            .args(["--quiet", "--encoding", "UTF-8", "-"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::export(&self.renderer, e))?;

        // stdin is dropped after writing so the renderer sees EOF.
        let written = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(html.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| AppError::export(&self.renderer, e))?;
        if !output.status.success() {
            return Err(AppError::export(
                &self.renderer,
                format!(
                    "{} ({})",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        written.map_err(|e| AppError::export(&self.renderer, e))
    }
}

/// Write bytes atomically (write to temp, then rename).
///
/// The temp file is removed if any step fails.
fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let result = write_then_rename(&tmp, path, bytes);
    if result.is_err() && tmp.exists() {
        if let Err(e) = fs::remove_file(&tmp) {
            log::warn!("Failed to remove {}: {}", tmp.display(), e);
        }
    }
    Ok(result?)
}

fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.flush()?;
    drop(file);

    fs::rename(tmp, path)
}
