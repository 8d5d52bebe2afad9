#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

use sra_fetch::domain::{
    Accession, ArchiveId, DownloadTarget, LibraryLayout, RunAccession, RunDescriptor,
};
use sra_fetch::ena::EnaClient;
use sra_fetch::error::SraError;
use sra_fetch::eutils::EutilsClient;
use sra_fetch::prompt::Confirm;
use sra_fetch::rate_limit::RateLimiter;
use sra_fetch::transfer::Transfer;

#[derive(Default)]
pub struct MockEutils {
    pub ids: HashMap<String, Vec<ArchiveId>>,
    pub runs: HashMap<u64, Vec<RunDescriptor>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockEutils {
    pub fn with_search(mut self, accession: &str, ids: &[u64]) -> Self {
        self.ids.insert(
            accession.to_string(),
            ids.iter().copied().map(ArchiveId::new).collect(),
        );
        self
    }

    pub fn with_runs(mut self, id: u64, runs: &[(&str, LibraryLayout)]) -> Self {
        self.runs.insert(
            id,
            runs.iter()
                .map(|(acc, layout)| RunDescriptor {
                    accession: acc.parse().unwrap(),
                    layout: *layout,
                })
                .collect(),
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl EutilsClient for MockEutils {
    fn search(&self, accession: &Accession) -> Result<Vec<ArchiveId>, SraError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("search:{accession}"));
        self.ids
            .get(accession.as_str())
            .cloned()
            .ok_or_else(|| SraError::Lookup {
                term: accession.to_string(),
                message: "no result for that search".to_string(),
            })
    }

    fn summary(&self, id: ArchiveId) -> Result<Vec<RunDescriptor>, SraError> {
        self.calls.lock().unwrap().push(format!("summary:{id}"));
        self.runs.get(&id.get()).cloned().ok_or_else(|| SraError::Lookup {
            term: id.to_string(),
            message: "no summary".to_string(),
        })
    }
}

#[derive(Default)]
pub struct MockEna {
    pub calls: Mutex<Vec<String>>,
}

impl EnaClient for MockEna {
    fn fastq_urls(&self, run: &RunAccession) -> Result<Vec<String>, SraError> {
        self.calls.lock().unwrap().push(run.to_string());
        Ok(vec![format!("ftp://mirror.example.org/fastq/{run}/{run}.fastq.gz")])
    }
}

#[derive(Clone, Default)]
pub struct CountingLimiter {
    pub count: Rc<Cell<usize>>,
}

impl RateLimiter for CountingLimiter {
    fn pace(&mut self) {
        self.count.set(self.count.get() + 1);
    }
}

#[derive(Default)]
pub struct MockTransfer {
    pub fetched: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
    pub missing: bool,
}

impl Transfer for MockTransfer {
    fn ensure_available(&self) -> Result<(), SraError> {
        if self.missing {
            return Err(SraError::MissingTool("wget".to_string()));
        }
        Ok(())
    }

    fn fetch(&self, target: &DownloadTarget, out_dir: &Utf8Path) -> Result<Utf8PathBuf, SraError> {
        if self.fail_on.as_deref() == Some(target.file_name.as_str()) {
            return Err(SraError::Transfer {
                url: target.url.clone(),
                message: "exit status: 8".to_string(),
            });
        }
        self.fetched.lock().unwrap().push(target.url.clone());
        Ok(out_dir.join(&target.file_name))
    }
}

pub struct FixedAnswer {
    pub answer: bool,
    pub asked: usize,
}

impl FixedAnswer {
    pub fn new(answer: bool) -> Self {
        Self { answer, asked: 0 }
    }
}

impl Confirm for FixedAnswer {
    fn confirm(&mut self, _targets: &[DownloadTarget]) -> Result<bool, SraError> {
        self.asked += 1;
        Ok(self.answer)
    }
}
