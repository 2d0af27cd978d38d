use std::io::Write;
use std::process::Command;
use std::process::Stdio;
use std::thread;

use anyhow::bail;
use anyhow::Result;

use super::DocumentDecoder;

/// Pipes the document through poppler's `pdftotext`.
pub struct PdfToText {
    pub(super) program: String,
}

impl Default for PdfToText {
    fn default() -> PdfToText {
        return PdfToText {
            program: "pdftotext".to_string(),
        };
    }
}

impl DocumentDecoder for PdfToText {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["-layout", "-enc", "UTF-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => bail!("{} stdin is not available", self.program),
        };
        let input = bytes.to_vec();
        let writer = thread::spawn(move || {
            return stdin.write_all(&input);
        });

        let output = child.wait_with_output()?;
        if let Ok(Err(err)) = writer.join() {
            tracing::debug!(error = ?err, "pdftotext closed stdin early");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} failed: {}", self.program, stderr.trim());
        }

        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }
}
