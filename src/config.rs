use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{Accession, TransferProgram, UrlSource};
use crate::error::SraError;
use crate::eutils::EUTILS_BASE;

pub const API_KEY_ENV: &str = "NCBI_API_KEY";

/// Raw values collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigInputs {
    pub accessions: Vec<String>,
    pub list_file: Option<Utf8PathBuf>,
    pub out_dir: Utf8PathBuf,
    pub no_prompt: bool,
    pub api_key: Option<String>,
    pub url_source: UrlSource,
    pub transfer: TransferProgram,
    pub dry_run: bool,
    pub eutils_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub accessions: Vec<Accession>,
    pub out_dir: Utf8PathBuf,
    pub api_key: Option<String>,
    pub prompt: bool,
    pub url_source: UrlSource,
    pub transfer: TransferProgram,
    pub dry_run: bool,
    pub eutils_url: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Validates the output directory first, then reads the list file and
    /// parses accessions. `env_api_key` is the value of [`API_KEY_ENV`], read
    /// by the caller.
    pub fn resolve(
        inputs: ConfigInputs,
        env_api_key: Option<String>,
    ) -> Result<ResolvedConfig, SraError> {
        validate_out_dir(&inputs.out_dir)?;

        let mut raw = match &inputs.list_file {
            Some(path) => read_accession_list(path)?,
            None => Vec::new(),
        };
        raw.extend(inputs.accessions);
        if raw.is_empty() {
            return Err(SraError::NoAccessions);
        }
        let accessions = raw
            .iter()
            .map(|value| value.parse())
            .collect::<Result<Vec<Accession>, SraError>>()?;

        Ok(ResolvedConfig {
            accessions,
            out_dir: inputs.out_dir,
            api_key: non_empty(inputs.api_key).or_else(|| non_empty(env_api_key)),
            prompt: !inputs.no_prompt && !inputs.dry_run,
            url_source: inputs.url_source,
            transfer: inputs.transfer,
            dry_run: inputs.dry_run,
            eutils_url: inputs
                .eutils_url
                .unwrap_or_else(|| EUTILS_BASE.to_string()),
        })
    }
}

pub fn validate_out_dir(path: &Utf8Path) -> Result<(), SraError> {
    if path.as_std_path().is_dir() {
        Ok(())
    } else {
        Err(SraError::InvalidOutDir(path.to_path_buf()))
    }
}

pub fn read_accession_list(path: &Utf8Path) -> Result<Vec<String>, SraError> {
    let content = fs::read_to_string(path).map_err(|err| SraError::ListFileRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(parse_accession_list(&content))
}

/// One accession per line; blank lines and `#` comments are skipped.
pub fn parse_accession_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
