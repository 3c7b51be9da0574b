//! Export of generated documents to PDF through an external office suite.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Error;

/// Turns a saved `.docx` into a PDF at `pdf`.
pub trait Converter {
    fn convert(&self, docx: &Path, pdf: &Path) -> Result<(), Error>;
}

/// Headless LibreOffice (`soffice --headless --convert-to pdf`).
#[derive(Clone, Debug)]
pub struct OfficeConverter {
    program: PathBuf,
}

impl Default for OfficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl OfficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Converter for OfficeConverter {
    fn convert(&self, docx: &Path, pdf: &Path) -> Result<(), Error> {
        let out_dir = match pdf.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&out_dir)?;

        log::debug!(
            "Running {} on {}",
            self.program.display(),
            docx.display()
        );
        let output = Command::new(&self.program)
            .arg("--headless")
            .args(["--convert-to", "pdf", "--outdir"])
            .arg(&out_dir)
            .arg(docx)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::Conversion(format!("failed to run {}: {}", self.program.display(), e))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Conversion(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        // The office suite always names its output after the input file.
        let produced = out_dir.join(docx.with_extension("pdf").file_name().unwrap_or_default());
        if !produced.is_file() {
            return Err(Error::Conversion(format!(
                "{} produced no output for {}",
                self.program.display(),
                docx.display()
            )));
        }
        if produced != pdf {
            std::fs::rename(&produced, pdf)?;
        }
        Ok(())
    }
}
