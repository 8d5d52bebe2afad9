use std::time::Duration;

use regex::{Captures, Regex};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::{
    Accession, AccessionKind, ArchiveId, LibraryLayout, RunAccession, RunDescriptor,
};
use crate::error::SraError;

pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

const SEARCH_RETMAX: &str = "10000";

pub trait EutilsClient: Send + Sync {
    /// Looks up the SRA UIDs matching an accession. Never returns an empty list.
    fn search(&self, accession: &Accession) -> Result<Vec<ArchiveId>, SraError>;

    /// Lists the runs recorded under one SRA UID. An empty list is valid.
    fn summary(&self, id: ArchiveId) -> Result<Vec<RunDescriptor>, SraError>;
}

impl<T: EutilsClient + ?Sized> EutilsClient for &T {
    fn search(&self, accession: &Accession) -> Result<Vec<ArchiveId>, SraError> {
        (**self).search(accession)
    }

    fn summary(&self, id: ArchiveId) -> Result<Vec<RunDescriptor>, SraError> {
        (**self).summary(id)
    }
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl EutilsHttpClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, SraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("sra-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SraError::EutilsHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| SraError::EutilsHttp(err.to_string()))?;
        let base_url = normalize_base(base_url)?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, tool: &str, params: &[(&str, &str)]) -> Result<Url, SraError> {
        let mut url = self
            .base_url
            .join(tool)
            .map_err(|err| SraError::EutilsHttp(err.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(params);
            if let Some(key) = &self.api_key {
                query.append_pair("api_key", key);
            }
        }
        Ok(url)
    }

    fn get_json(&self, url: Url) -> Result<Value, SraError> {
        debug!(url = %redact_api_key(&url), "E-utilities request");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| SraError::EutilsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "E-utilities request failed".to_string());
            return Err(SraError::EutilsStatus { status, message });
        }
        response
            .json()
            .map_err(|err| SraError::EutilsHttp(format!("bad JSON response: {err}")))
    }
}

impl EutilsClient for EutilsHttpClient {
    fn search(&self, accession: &Accession) -> Result<Vec<ArchiveId>, SraError> {
        let url = self.endpoint(
            "esearch.fcgi",
            &[
                ("db", "sra"),
                ("retmode", "json"),
                ("retmax", SEARCH_RETMAX),
                ("term", accession.as_str()),
            ],
        )?;
        let payload = self.get_json(url)?;
        parse_search(accession, &payload)
    }

    fn summary(&self, id: ArchiveId) -> Result<Vec<RunDescriptor>, SraError> {
        let id_text = id.to_string();
        let url = self.endpoint(
            "esummary.fcgi",
            &[("db", "sra"), ("retmode", "json"), ("id", id_text.as_str())],
        )?;
        let payload = self.get_json(url)?;
        parse_summary(id, &payload)
    }
}

fn normalize_base(base_url: &str) -> Result<Url, SraError> {
    // Url::join drops the last path segment unless the base ends with '/'.
    let with_slash = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&with_slash).map_err(|err| SraError::EutilsHttp(err.to_string()))
}

pub fn redact_api_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "api_key" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Extracts UIDs from an `esearch` JSON payload.
pub fn parse_search(accession: &Accession, payload: &Value) -> Result<Vec<ArchiveId>, SraError> {
    let term = accession.as_str();
    let list = payload["esearchresult"]["idlist"]
        .as_array()
        .ok_or_else(|| SraError::lookup(term, "response has no esearchresult.idlist"))?;

    let ids = list
        .iter()
        .map(|value| {
            value
                .as_str()
                .and_then(|text| text.parse::<u64>().ok())
                .map(ArchiveId::new)
                .ok_or_else(|| SraError::lookup(term, format!("non-numeric id {value}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
        return Err(SraError::lookup(term, "no result for that search"));
    }
    if accession.kind() == AccessionKind::Run && ids.len() > 1 {
        return Err(SraError::lookup(
            term,
            format!("multiple results for that search ({} ids)", ids.len()),
        ));
    }

    let count = payload["esearchresult"]["count"]
        .as_str()
        .and_then(|text| text.parse::<usize>().ok());
    if let Some(count) = count
        && count > ids.len()
    {
        warn!(
            accession = term,
            count,
            returned = ids.len(),
            "search result truncated"
        );
    }
    Ok(ids)
}

/// Extracts run descriptors from an `esummary` JSON payload.
pub fn parse_summary(id: ArchiveId, payload: &Value) -> Result<Vec<RunDescriptor>, SraError> {
    let key = id.to_string();
    let record = payload["result"]
        .get(&key)
        .ok_or_else(|| SraError::lookup(&key, "response has no summary for this id"))?;
    let runs_xml = record["runs"]
        .as_str()
        .ok_or_else(|| SraError::lookup(&key, "summary has no runs field"))?;

    let layout = match record["expxml"].as_str().and_then(parse_layout) {
        Some(layout) => layout,
        None => {
            warn!(id = %id, "library layout not reported, assuming single-end");
            LibraryLayout::Single
        }
    };

    extract_run_accessions(runs_xml)
        .into_iter()
        .map(|acc| -> Result<RunDescriptor, SraError> {
            let accession = acc
                .parse::<RunAccession>()
                .map_err(|_| SraError::lookup(&key, format!("unexpected run accession {acc}")))?;
            Ok(RunDescriptor { accession, layout })
        })
        .collect()
}

/// Returns the `acc` attribute of every `<Run>` element, in document order.
pub fn extract_run_accessions(runs_xml: &str) -> Vec<String> {
    let text = unescape_html(runs_xml);
    let run_re = Regex::new(r#"<Run\b[^>]*?\bacc="([^"]+)""#).unwrap();
    run_re
        .captures_iter(&text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn parse_layout(expxml: &str) -> Option<LibraryLayout> {
    let text = unescape_html(expxml);
    let layout_re = Regex::new(r"<LIBRARY_LAYOUT>\s*<(PAIRED|SINGLE)\b").unwrap();
    let cap = layout_re.captures(&text)?;
    match cap.get(1)?.as_str() {
        "PAIRED" => Some(LibraryLayout::Paired),
        _ => Some(LibraryLayout::Single),
    }
}

/// Decodes the entities E-utilities uses inside embedded XML, including
/// decimal and hex character references.
pub fn unescape_html(text: &str) -> String {
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");
    let numeric_re = Regex::new(r"&#(?:[xX]([0-9A-Fa-f]+)|([0-9]+));").unwrap();
    let text = numeric_re.replace_all(&text, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    // last, so "&amp;lt;" stays a literal "&lt;"
    text.replace("&amp;", "&")
}
