use serde::Serialize;
use tracing::info;

use crate::domain::{
    Accession, AccessionKind, ArchiveId, DownloadTarget, RunDescriptor, UrlSource,
};
use crate::ena::{self, EnaClient};
use crate::error::SraError;
use crate::eutils::EutilsClient;
use crate::rate_limit::RateLimiter;

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAccession {
    pub accession: Accession,
    pub archive_ids: Vec<ArchiveId>,
    pub runs: Vec<RunDescriptor>,
    pub targets: Vec<DownloadTarget>,
}

/// Accession → UID → runs → URLs, strictly in input order.
pub struct Pipeline<E: EutilsClient, N: EnaClient, L: RateLimiter> {
    eutils: E,
    ena: N,
    limiter: L,
    url_source: UrlSource,
}

impl<E: EutilsClient, N: EnaClient, L: RateLimiter> Pipeline<E, N, L> {
    pub fn new(eutils: E, ena: N, limiter: L, url_source: UrlSource) -> Self {
        Self {
            eutils,
            ena,
            limiter,
            url_source,
        }
    }

    pub fn resolve(&mut self, accessions: &[Accession]) -> Result<Vec<ResolvedAccession>, SraError> {
        accessions
            .iter()
            .map(|accession| self.resolve_one(accession))
            .collect()
    }

    pub fn resolve_one(&mut self, accession: &Accession) -> Result<ResolvedAccession, SraError> {
        info!(accession = %accession, kind = %accession.kind(), "resolving");
        let archive_ids = self.lookup_ids(accession)?;

        let mut runs = Vec::new();
        for id in &archive_ids {
            runs.extend(self.expand(*id)?);
        }
        // A run's UID is its experiment's record, which lists sibling runs too.
        if accession.kind() == AccessionKind::Run {
            runs = select_requested_run(accession, runs)?;
        }
        info!(accession = %accession, runs = runs.len(), "expanded");

        let mut targets = Vec::new();
        for run in &runs {
            targets.extend(self.build_targets(run)?);
        }

        Ok(ResolvedAccession {
            accession: accession.clone(),
            archive_ids,
            runs,
            targets,
        })
    }

    pub fn lookup_ids(&mut self, accession: &Accession) -> Result<Vec<ArchiveId>, SraError> {
        self.limiter.pace();
        self.eutils.search(accession)
    }

    pub fn expand(&mut self, id: ArchiveId) -> Result<Vec<RunDescriptor>, SraError> {
        self.limiter.pace();
        self.eutils.summary(id)
    }

    pub fn build_targets(&mut self, run: &RunDescriptor) -> Result<Vec<DownloadTarget>, SraError> {
        let urls = match self.url_source {
            UrlSource::Template => ena::template_urls(run),
            UrlSource::Ena => {
                self.limiter.pace();
                self.ena.fastq_urls(&run.accession)?
            }
        };
        urls.iter()
            .map(|url| DownloadTarget::from_url(&run.accession, url))
            .collect()
    }
}

fn select_requested_run(
    accession: &Accession,
    runs: Vec<RunDescriptor>,
) -> Result<Vec<RunDescriptor>, SraError> {
    let run = runs
        .into_iter()
        .find(|run| run.accession.as_str() == accession.as_str())
        .ok_or_else(|| {
            SraError::lookup(accession.as_str(), "run is missing from its experiment summary")
        })?;
    Ok(vec![run])
}

pub fn flatten_targets(resolved: &[ResolvedAccession]) -> Vec<DownloadTarget> {
    resolved
        .iter()
        .flat_map(|item| item.targets.iter().cloned())
        .collect()
}
