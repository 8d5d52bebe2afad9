use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{LibraryLayout, RunAccession, RunDescriptor};
use crate::error::SraError;

pub const ENA_FASTQ_ROOT: &str = "ftp://ftp.sra.ebi.ac.uk/vol1/fastq";
pub const ENA_PORTAL_BASE: &str = "https://www.ebi.ac.uk/ena/portal/api";

pub trait EnaClient: Send + Sync {
    /// Returns the FASTQ URLs ENA publishes for one run.
    fn fastq_urls(&self, run: &RunAccession) -> Result<Vec<String>, SraError>;
}

impl<T: EnaClient + ?Sized> EnaClient for &T {
    fn fastq_urls(&self, run: &RunAccession) -> Result<Vec<String>, SraError> {
        (**self).fastq_urls(run)
    }
}

#[derive(Debug, Deserialize)]
pub struct FileReportRow {
    #[serde(default)]
    pub run_accession: String,
    #[serde(default)]
    pub fastq_ftp: String,
}

#[derive(Clone)]
pub struct EnaHttpClient {
    client: Client,
    base_url: String,
}

impl EnaHttpClient {
    pub fn new() -> Result<Self, SraError> {
        Self::with_base_url(ENA_PORTAL_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, SraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("sra-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SraError::EnaHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| SraError::EnaHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl EnaClient for EnaHttpClient {
    fn fastq_urls(&self, run: &RunAccession) -> Result<Vec<String>, SraError> {
        let url = format!("{}/filereport", self.base_url);
        debug!(url = %url, run = %run, "ENA filereport request");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("accession", run.as_str()),
                ("result", "read_run"),
                ("fields", "run_accession,fastq_ftp"),
                ("format", "json"),
            ])
            .send()
            .map_err(|err| SraError::EnaHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "ENA request failed".to_string());
            return Err(SraError::EnaStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| SraError::EnaHttp(err.to_string()))?;
        parse_file_report(run, &body)
    }
}

/// Parses a `filereport` JSON body into absolute FTP URLs.
pub fn parse_file_report(run: &RunAccession, body: &str) -> Result<Vec<String>, SraError> {
    // ENA answers an unknown accession with an empty body rather than `[]`.
    if body.trim().is_empty() {
        return Err(SraError::lookup(run.as_str(), "ENA has no file report"));
    }
    let rows: Vec<FileReportRow> = serde_json::from_str(body)
        .map_err(|err| SraError::lookup(run.as_str(), format!("bad file report: {err}")))?;
    let urls: Vec<String> = rows
        .iter()
        .filter(|row| row.run_accession.is_empty() || row.run_accession == run.as_str())
        .flat_map(|row| row.fastq_ftp.split(';'))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(|path| {
            if path.contains("://") {
                path.to_string()
            } else {
                format!("ftp://{path}")
            }
        })
        .collect();
    if urls.is_empty() {
        return Err(SraError::lookup(run.as_str(), "ENA lists no FASTQ files"));
    }
    Ok(urls)
}

/// ENA directory holding a run's FASTQ files.
///
/// Runs are grouped by their first six characters; accessions longer than
/// nine characters get an extra level named after the trailing digits,
/// zero padded to three.
pub fn fastq_dir_url(run: &RunAccession) -> String {
    let acc = run.as_str();
    let mut url = format!("{ENA_FASTQ_ROOT}/{}", acc.get(..6).unwrap_or(acc));
    if acc.len() > 9 {
        let tail = &acc[9..];
        let padded = tail
            .parse::<u64>()
            .map(|value| format!("{value:03}"))
            .unwrap_or_else(|_| format!("{tail:0>3}"));
        url.push('/');
        url.push_str(&padded);
    }
    url.push('/');
    url.push_str(acc);
    url
}

/// FASTQ URLs for a run under the ENA naming convention.
pub fn template_urls(run: &RunDescriptor) -> Vec<String> {
    let dir = fastq_dir_url(&run.accession);
    let acc = run.accession.as_str();
    match run.layout {
        LibraryLayout::Single => vec![format!("{dir}/{acc}.fastq.gz")],
        LibraryLayout::Paired => vec![
            format!("{dir}/{acc}_1.fastq.gz"),
            format!("{dir}/{acc}_2.fastq.gz"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn run(acc: &str, layout: LibraryLayout) -> RunDescriptor {
        RunDescriptor {
            accession: acc.parse().unwrap(),
            layout,
        }
    }

    #[test]
    fn dir_for_short_accession() {
        let acc: RunAccession = "SRR014966".parse().unwrap();
        assert_eq!(
            fastq_dir_url(&acc),
            "ftp://ftp.sra.ebi.ac.uk/vol1/fastq/SRR014/SRR014966"
        );
    }

    #[test]
    fn dir_for_long_accessions() {
        let ten: RunAccession = "SRR1234567".parse().unwrap();
        assert_eq!(
            fastq_dir_url(&ten),
            "ftp://ftp.sra.ebi.ac.uk/vol1/fastq/SRR123/007/SRR1234567"
        );
        let eleven: RunAccession = "ERR12345678".parse().unwrap();
        assert_eq!(
            fastq_dir_url(&eleven),
            "ftp://ftp.sra.ebi.ac.uk/vol1/fastq/ERR123/078/ERR12345678"
        );
    }

    #[test]
    fn layout_controls_url_count() {
        assert_eq!(template_urls(&run("SRR014966", LibraryLayout::Single)).len(), 1);
        let paired = template_urls(&run("SRR014966", LibraryLayout::Paired));
        assert_eq!(paired.len(), 2);
        assert!(paired[0].ends_with("SRR014966_1.fastq.gz"));
        assert!(paired[1].ends_with("SRR014966_2.fastq.gz"));
    }

    #[test]
    fn file_report_paths_become_urls() {
        let acc: RunAccession = "SRR1234567".parse().unwrap();
        let body = r#"[{"run_accession":"SRR1234567","fastq_ftp":"ftp.sra.ebi.ac.uk/vol1/fastq/SRR123/007/SRR1234567/SRR1234567_1.fastq.gz;ftp.sra.ebi.ac.uk/vol1/fastq/SRR123/007/SRR1234567/SRR1234567_2.fastq.gz"}]"#;
        let urls = parse_file_report(&acc, body).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("ftp://ftp.sra.ebi.ac.uk/"));
    }

    #[test]
    fn empty_file_report_is_a_lookup_error() {
        let acc: RunAccession = "SRR1234567".parse().unwrap();
        assert_matches!(parse_file_report(&acc, ""), Err(SraError::Lookup { .. }));
        assert_matches!(
            parse_file_report(&acc, r#"[{"run_accession":"SRR1234567","fastq_ftp":""}]"#),
            Err(SraError::Lookup { .. })
        );
    }
}
