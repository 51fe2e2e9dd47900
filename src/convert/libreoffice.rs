//! LibreOffice headless converter.

use std::fs::File;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

use super::{ConvertOptions, DocumentConverter};

const INPUT_NAME: &str = "document.docx";
const OUTPUT_NAME: &str = "document.pdf";
const LOG_NAME: &str = "convert.log";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts DOCX to PDF by running LibreOffice in headless mode.
///
/// Each conversion runs in its own scratch directory with its own user
/// profile, so concurrent conversions do not contend for the profile lock.
#[derive(Debug, Clone, Default)]
pub struct LibreOfficeConverter {
    options: ConvertOptions,
}

impl LibreOfficeConverter {
    /// Create a converter.
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    fn run(&self, workdir: &Path, docx: &[u8]) -> Result<Vec<u8>> {
        let input = workdir.join(INPUT_NAME);
        std::fs::write(&input, docx)?;

        let profile = workdir.join("profile");
        let log_path = workdir.join(LOG_NAME);
        let mut child = Command::new(&self.options.program)
            .args(&self.options.extra_args)
            .arg(format!("-env:UserInstallation=file://{}", profile.display()))
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(workdir)
            .arg(&input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(File::create(&log_path)?)
            .spawn()
            .map_err(|e| {
                Error::ConversionFailed(format!("cannot start {}: {}", self.options.program, e))
            })?;

        let status = match self.wait(&mut child)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::ConversionFailed(format!(
                    "{} timed out after {}s",
                    self.options.program,
                    self.options.timeout.as_secs_f64()
                )));
            }
        };

        if !status.success() {
            let stderr = std::fs::read_to_string(&log_path).unwrap_or_default();
            return Err(Error::ConversionFailed(format!(
                "{} exited with {}: {}",
                self.options.program,
                status,
                stderr.trim()
            )));
        }

        let pdf = workdir.join(OUTPUT_NAME);
        if !pdf.exists() {
            return Err(Error::ConversionFailed(format!(
                "{} produced no PDF",
                self.options.program
            )));
        }
        Ok(std::fs::read(pdf)?)
    }

    /// Wait for `child` within the configured timeout; `None` when it is
    /// still running at the deadline.
    fn wait(&self, child: &mut std::process::Child) -> Result<Option<ExitStatus>> {
        let deadline = Instant::now() + self.options.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl DocumentConverter for LibreOfficeConverter {
    fn name(&self) -> &str {
        "libreoffice"
    }

    fn convert_bytes(&self, docx: &[u8]) -> Result<Vec<u8>> {
        let workdir = tempfile::tempdir()
            .map_err(|e| Error::ConversionFailed(format!("cannot create scratch directory: {}", e)))?;

        log::debug!(
            "Converting {} bytes with {} in {}",
            docx.len(),
            self.options.program,
            workdir.path().display()
        );

        self.run(workdir.path(), docx).map_err(|e| match e {
            Error::ConversionFailed(_) => e,
            other => Error::ConversionFailed(other.to_string()),
        })
    }
}
