use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SraError {
    #[error("invalid accession: {0}")]
    #[diagnostic(help(
        "expected a project (SRP/ERP/DRP/PRJNA/PRJEB/PRJDB), sample (SRS/ERS/DRS), experiment (SRX/ERX/DRX) or run (SRR/ERR/DRR) accession"
    ))]
    InvalidAccession(String),

    #[error("output directory does not exist or is not a directory: {0}")]
    InvalidOutDir(Utf8PathBuf),

    #[error("failed to read accession list at {path}: {message}")]
    ListFileRead { path: Utf8PathBuf, message: String },

    #[error("no accessions given")]
    #[diagnostic(help("pass accessions as arguments or with --list-file"))]
    NoAccessions,

    #[error("E-utilities request failed: {0}")]
    EutilsHttp(String),

    #[error("E-utilities returned status {status}: {message}")]
    EutilsStatus { status: u16, message: String },

    #[error("ENA request failed: {0}")]
    EnaHttp(String),

    #[error("ENA returned status {status}: {message}")]
    EnaStatus { status: u16, message: String },

    #[error("lookup failed for {term}: {message}")]
    Lookup { term: String, message: String },

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("transfer failed for {url}: {message}")]
    Transfer { url: String, message: String },

    #[error("download declined")]
    Declined,

    #[error("interrupted")]
    Interrupted,

    #[error("terminal error: {0}")]
    Terminal(String),
}

impl SraError {
    pub(crate) fn lookup(term: impl Into<String>, message: impl Into<String>) -> Self {
        SraError::Lookup {
            term: term.into(),
            message: message.into(),
        }
    }
}
