use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::config::{ResolvedConfig, validate_out_dir};
use crate::domain::{DownloadTarget, UrlSource};
use crate::ena::EnaClient;
use crate::error::SraError;
use crate::eutils::EutilsClient;
use crate::pipeline::{Pipeline, ResolvedAccession, flatten_targets};
use crate::prompt::Confirm;
use crate::rate_limit::RateLimiter;
use crate::transfer::Transfer;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub out_dir: String,
    pub dry_run: bool,
    pub accessions: Vec<ResolvedAccession>,
    pub targets: Vec<DownloadTarget>,
    pub downloaded: Vec<String>,
}

pub struct App<E: EutilsClient, N: EnaClient, L: RateLimiter, T: Transfer> {
    pipeline: Pipeline<E, N, L>,
    transfer: T,
}

impl<E: EutilsClient, N: EnaClient, L: RateLimiter, T: Transfer> App<E, N, L, T> {
    pub fn new(eutils: E, ena: N, limiter: L, transfer: T, url_source: UrlSource) -> Self {
        Self {
            pipeline: Pipeline::new(eutils, ena, limiter, url_source),
            transfer,
        }
    }

    /// Resolves every accession, then downloads all targets in order.
    ///
    /// Any failure aborts the whole run; nothing is downloaded unless every
    /// accession resolved and the prompt (if enabled) was accepted.
    pub fn run(
        &mut self,
        config: &ResolvedConfig,
        confirm: &mut dyn Confirm,
    ) -> Result<RunSummary, SraError> {
        let started_at = Utc::now().to_rfc3339();
        validate_out_dir(&config.out_dir)?;
        if !config.dry_run {
            self.transfer.ensure_available()?;
        }

        let accessions = self.pipeline.resolve(&config.accessions)?;
        let targets = flatten_targets(&accessions);
        info!(
            accessions = accessions.len(),
            files = targets.len(),
            "resolution finished"
        );

        let mut summary = RunSummary {
            started_at,
            out_dir: config.out_dir.to_string(),
            dry_run: config.dry_run,
            accessions,
            targets,
            downloaded: Vec::new(),
        };
        if config.dry_run || summary.targets.is_empty() {
            return Ok(summary);
        }

        if config.prompt && !confirm.confirm(&summary.targets)? {
            return Err(SraError::Declined);
        }

        for target in &summary.targets {
            let path = self.transfer.fetch(target, &config.out_dir)?;
            summary.downloaded.push(path.to_string());
        }
        Ok(summary)
    }
}
