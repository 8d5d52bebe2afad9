use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessionKind {
    Project,
    Sample,
    Experiment,
    Run,
}

impl fmt::Display for AccessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessionKind::Project => write!(f, "project"),
            AccessionKind::Sample => write!(f, "sample"),
            AccessionKind::Experiment => write!(f, "experiment"),
            AccessionKind::Run => write!(f, "run"),
        }
    }
}

// Longer prefixes first so PRJNA is not shadowed by anything shorter.
const PREFIXES: &[(&str, AccessionKind)] = &[
    ("PRJNA", AccessionKind::Project),
    ("PRJEB", AccessionKind::Project),
    ("PRJDB", AccessionKind::Project),
    ("SRP", AccessionKind::Project),
    ("ERP", AccessionKind::Project),
    ("DRP", AccessionKind::Project),
    ("SRS", AccessionKind::Sample),
    ("ERS", AccessionKind::Sample),
    ("DRS", AccessionKind::Sample),
    ("SRX", AccessionKind::Experiment),
    ("ERX", AccessionKind::Experiment),
    ("DRX", AccessionKind::Experiment),
    ("SRR", AccessionKind::Run),
    ("ERR", AccessionKind::Run),
    ("DRR", AccessionKind::Run),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Accession {
    value: String,
    kind: AccessionKind,
}

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> AccessionKind {
        self.kind
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Accession {
    type Err = SraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let kind = PREFIXES.iter().find_map(|(prefix, kind)| {
            let digits = normalized.strip_prefix(prefix)?;
            let is_numeric = !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit());
            is_numeric.then_some(*kind)
        });
        match kind {
            Some(kind) => Ok(Self {
                value: normalized,
                kind,
            }),
            None => Err(SraError::InvalidAccession(value.to_string())),
        }
    }
}

/// Run-level accession (`SRR`, `ERR` or `DRR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunAccession(String);

impl RunAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunAccession {
    type Err = SraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let accession: Accession = value.parse()?;
        if accession.kind() != AccessionKind::Run {
            return Err(SraError::InvalidAccession(value.to_string()));
        }
        Ok(Self(accession.value))
    }
}

/// Numeric UID assigned by E-utilities to an SRA record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveId(u64);

impl ArchiveId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryLayout {
    Single,
    Paired,
}

impl LibraryLayout {
    pub fn is_paired(self) -> bool {
        matches!(self, LibraryLayout::Paired)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunDescriptor {
    pub accession: RunAccession,
    pub layout: LibraryLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTarget {
    pub run: RunAccession,
    pub url: String,
    pub file_name: String,
}

impl DownloadTarget {
    /// Builds a target whose file name is the last segment of the URL path.
    pub fn from_url(run: &RunAccession, url: &str) -> Result<Self, SraError> {
        let parsed = Url::parse(url)
            .map_err(|err| SraError::lookup(run.as_str(), format!("bad URL {url}: {err}")))?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| SraError::lookup(run.as_str(), format!("URL has no file name: {url}")))?
            .to_string();
        Ok(Self {
            run: run.clone(),
            url: url.to_string(),
            file_name,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UrlSource {
    /// Build ENA FTP paths locally from the run accession
    #[default]
    Template,
    /// Ask the ENA portal for the authoritative file list
    Ena,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransferProgram {
    #[default]
    Wget,
    Curl,
}

impl TransferProgram {
    pub fn binary_name(self) -> &'static str {
        match self {
            TransferProgram::Wget => "wget",
            TransferProgram::Curl => "curl",
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_accession_kinds() {
        let cases = [
            ("SRP012345", AccessionKind::Project),
            ("prjna257197", AccessionKind::Project),
            ("ERS000001", AccessionKind::Sample),
            ("DRX000123", AccessionKind::Experiment),
            ("srr014966", AccessionKind::Run),
        ];
        for (raw, kind) in cases {
            let acc: Accession = raw.parse().unwrap();
            assert_eq!(acc.kind(), kind, "{raw}");
            assert_eq!(acc.as_str(), raw.to_uppercase());
        }
    }

    #[test]
    fn parse_accession_rejects_unknown_prefix() {
        assert_matches!(
            "GSE102902".parse::<Accession>(),
            Err(SraError::InvalidAccession(_))
        );
        assert_matches!("SRR".parse::<Accession>(), Err(SraError::InvalidAccession(_)));
        assert_matches!(
            "SRR12x4".parse::<Accession>(),
            Err(SraError::InvalidAccession(_))
        );
    }

    #[test]
    fn run_accession_requires_run_kind() {
        assert!("ERR123456".parse::<RunAccession>().is_ok());
        assert_matches!(
            "SRX123456".parse::<RunAccession>(),
            Err(SraError::InvalidAccession(_))
        );
    }

    #[test]
    fn target_file_name_from_url() {
        let run: RunAccession = "SRR1234567".parse().unwrap();
        let target = DownloadTarget::from_url(
            &run,
            "ftp://ftp.sra.ebi.ac.uk/vol1/fastq/SRR123/007/SRR1234567/SRR1234567_1.fastq.gz",
        )
        .unwrap();
        assert_eq!(target.file_name, "SRR1234567_1.fastq.gz");
    }

    #[test]
    fn target_without_file_name_is_rejected() {
        let run: RunAccession = "SRR1234567".parse().unwrap();
        let err = DownloadTarget::from_url(&run, "ftp://ftp.sra.ebi.ac.uk/").unwrap_err();
        assert_matches!(err, SraError::Lookup { .. });
    }
}
