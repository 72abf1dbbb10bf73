//! PDF rasterization.

use anyhow::{Context, Result, bail};
use std::future::Future;
use tokio::process::Command;

/// Renders a PDF document to one encoded image per page.
pub trait PdfRasterizer: Send + Sync {
    /// Encoded page images in page order.
    fn pages(&self, pdf: &[u8]) -> impl Future<Output = Result<Vec<Vec<u8>>>> + Send;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    program: String,
}

impl Pdftoppm {
    /// Use a specific `pdftoppm` executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdfRasterizer for Pdftoppm {
    async fn pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;

        let output = Command::new(&self.program)
            .arg("-png")
            .arg(&input)
            .arg(dir.path().join("page"))
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.program))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        // pdftoppm zero-pads page numbers, so name order is page order.
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("page") && name.ends_with(".png") {
                files.push((name, entry.path()));
            }
        }
        files.sort();

        let mut pages = Vec::with_capacity(files.len());
        for (_, path) in files {
            pages.push(tokio::fs::read(path).await?);
        }
        Ok(pages)
    }
}
