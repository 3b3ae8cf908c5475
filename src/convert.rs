use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::Instrument;
use crate::error::OzoneError;
use crate::retrieve::find_in_path;

pub const DEFAULT_CONVERTER: &str = "convert_ozone";

/// Captured converter output, kept for the log.
#[derive(Debug, Clone, Default)]
pub struct ConversionLog {
    pub stdout: String,
    pub stderr: String,
}

/// Turns one daily text file into the canonical per-day product.
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        source: Instrument,
    ) -> Result<ConversionLog, OzoneError>;
}

#[derive(Clone)]
pub struct SystemConverter {
    name: String,
    program: Option<PathBuf>,
}

impl SystemConverter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            program: find_in_path(name),
        }
    }

    pub fn is_available(&self) -> bool {
        self.program.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn require_program(&self) -> Result<&PathBuf, OzoneError> {
        self.program
            .as_ref()
            .ok_or_else(|| OzoneError::MissingTool(self.name.clone()))
    }
}

impl Default for SystemConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

impl Converter for SystemConverter {
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        source: Instrument,
    ) -> Result<ConversionLog, OzoneError> {
        let program = self.require_program()?;
        let result = Command::new(program)
            .arg(input)
            .arg(output)
            .arg(source.label())
            .output()
            .map_err(|err| OzoneError::Conversion(format!("{}: {err}", program.display())))?;
        let log = ConversionLog {
            stdout: String::from_utf8_lossy(&result.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        };
        if result.status.success() {
            return Ok(log);
        }
        let status = result
            .status
            .code()
            .map(|code| format!("exit status {code}"))
            .unwrap_or_else(|| "terminated by signal".to_string());
        let message = if log.stderr.is_empty() {
            format!("{} {status}", self.name)
        } else {
            format!("{} {status}: {}", self.name, log.stderr)
        };
        Err(OzoneError::Conversion(message))
    }
}
