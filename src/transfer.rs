use std::path::PathBuf;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::domain::{DownloadTarget, TransferProgram};
use crate::error::SraError;

pub trait Transfer: Send + Sync {
    /// Checked once before the first download.
    fn ensure_available(&self) -> Result<(), SraError>;

    /// Downloads one target into `out_dir` and returns the destination path.
    fn fetch(
        &self,
        target: &DownloadTarget,
        out_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, SraError>;
}

impl<T: Transfer + ?Sized> Transfer for &T {
    fn ensure_available(&self) -> Result<(), SraError> {
        (**self).ensure_available()
    }

    fn fetch(
        &self,
        target: &DownloadTarget,
        out_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, SraError> {
        (**self).fetch(target, out_dir)
    }
}

#[derive(Debug, Clone)]
pub struct SystemTransfer {
    program: TransferProgram,
    path: Option<PathBuf>,
}

impl SystemTransfer {
    pub fn new(program: TransferProgram) -> Self {
        Self {
            program,
            path: find_in_path(program.binary_name()),
        }
    }

    fn require_program(&self) -> Result<&PathBuf, SraError> {
        self.path
            .as_ref()
            .ok_or_else(|| SraError::MissingTool(self.program.binary_name().to_string()))
    }
}

impl Transfer for SystemTransfer {
    fn ensure_available(&self) -> Result<(), SraError> {
        self.require_program().map(|_| ())
    }

    fn fetch(
        &self,
        target: &DownloadTarget,
        out_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, SraError> {
        let program = self.require_program()?;
        let args = transfer_args(self.program, target, out_dir);
        info!(url = %target.url, program = %program.display(), "downloading");

        // stdout/stderr stay attached so the tool's own progress is visible.
        let status = Command::new(program)
            .args(&args)
            .status()
            .map_err(|err| SraError::Transfer {
                url: target.url.clone(),
                message: err.to_string(),
            })?;
        if !status.success() {
            return Err(SraError::Transfer {
                url: target.url.clone(),
                message: format!("{} exited with {status}", self.program.binary_name()),
            });
        }
        Ok(out_dir.join(&target.file_name))
    }
}

pub fn transfer_args(
    program: TransferProgram,
    target: &DownloadTarget,
    out_dir: &Utf8Path,
) -> Vec<String> {
    match program {
        TransferProgram::Wget => vec![
            "--directory-prefix".to_string(),
            out_dir.to_string(),
            target.url.clone(),
        ],
        TransferProgram::Curl => vec![
            "--fail".to_string(),
            "--location".to_string(),
            "--output".to_string(),
            out_dir.join(&target.file_name).to_string(),
            target.url.clone(),
        ],
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
