use std::io::{self, Write};

use serde::Serialize;

use crate::app::RunSummary;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub fn print_summary(self, summary: &RunSummary) -> io::Result<()> {
        match self {
            OutputMode::Text => TextOutput::print_summary(summary),
            OutputMode::Json => JsonOutput::print_summary(summary),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        let mut stdout = io::stdout();
        Self::write_summary(&mut stdout, summary)
    }

    pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
        if summary.dry_run {
            for target in &summary.targets {
                writeln!(out, "{}", target.url)?;
            }
            return Ok(());
        }
        for path in &summary.downloaded {
            writeln!(out, "{path}")?;
        }
        writeln!(
            out,
            "{} accession(s), {} file(s) downloaded to {}",
            summary.accessions.len(),
            summary.downloaded.len(),
            summary.out_dir
        )
    }
}
