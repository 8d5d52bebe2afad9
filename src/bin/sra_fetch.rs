use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sra_fetch::app::App;
use sra_fetch::config::{API_KEY_ENV, ConfigInputs, ConfigLoader};
use sra_fetch::domain::{TransferProgram, UrlSource};
use sra_fetch::ena::EnaHttpClient;
use sra_fetch::error::SraError;
use sra_fetch::eutils::EutilsHttpClient;
use sra_fetch::interrupt;
use sra_fetch::output::OutputMode;
use sra_fetch::prompt::TerminalConfirm;
use sra_fetch::rate_limit::FixedInterval;
use sra_fetch::transfer::SystemTransfer;

#[derive(Parser)]
#[command(name = "sra-fetch")]
#[command(about = "Download FASTQ files for SRA project, experiment and run accessions")]
#[command(version)]
struct Cli {
    /// Accessions to fetch (SRP/PRJNA/SRS/SRX/SRR and their ENA/DDBJ equivalents)
    accessions: Vec<String>,

    /// Existing directory to download into
    #[arg(short, long, value_name = "DIR")]
    out_dir: Utf8PathBuf,

    /// File with one accession per line, fetched before positional accessions
    #[arg(short, long, value_name = "FILE")]
    list_file: Option<Utf8PathBuf>,

    /// Do not ask for confirmation before downloading
    #[arg(short, long)]
    no_prompt: bool,

    /// NCBI API key (defaults to $NCBI_API_KEY); allows faster lookups
    #[arg(short = 'k', long, value_name = "KEY")]
    ncbi_api_key: Option<String>,

    /// Where download URLs come from
    #[arg(long, value_enum, default_value_t = UrlSource::Template)]
    url_source: UrlSource,

    /// External program used for downloads
    #[arg(long, value_enum, default_value_t = TransferProgram::Wget)]
    transfer: TransferProgram,

    /// Resolve and print URLs without downloading
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Override the E-utilities base URL
    #[arg(long, value_name = "URL", hide = true)]
    eutils_url: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SraError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SraError) -> u8 {
    match error {
        SraError::EutilsHttp(_)
        | SraError::EutilsStatus { .. }
        | SraError::EnaHttp(_)
        | SraError::EnaStatus { .. }
        | SraError::Lookup { .. } => 2,
        SraError::MissingTool(_) | SraError::Transfer { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let inputs = ConfigInputs {
        accessions: cli.accessions,
        list_file: cli.list_file,
        out_dir: cli.out_dir,
        no_prompt: cli.no_prompt,
        api_key: cli.ncbi_api_key,
        url_source: cli.url_source,
        transfer: cli.transfer,
        dry_run: cli.dry_run,
        eutils_url: cli.eutils_url,
    };
    let config = ConfigLoader::resolve(inputs, std::env::var(API_KEY_ENV).ok())?;

    interrupt::install_handler()?;

    let eutils = EutilsHttpClient::new(&config.eutils_url, config.api_key.clone())?;
    let ena = EnaHttpClient::new()?;
    let limiter = FixedInterval::for_credential(config.api_key.is_some());
    let transfer = SystemTransfer::new(config.transfer);
    let mut app = App::new(eutils, ena, limiter, transfer, config.url_source);

    let summary = app.run(&config, &mut TerminalConfirm)?;
    output_mode.print_summary(&summary).into_diagnostic()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_short_flags() {
        let cli = Cli::try_parse_from([
            "sra-fetch", "-o", "/tmp", "-l", "list.txt", "-n", "-k", "abc", "SRR1", "SRP2",
        ])
        .unwrap();
        assert_eq!(cli.out_dir, Utf8PathBuf::from("/tmp"));
        assert_eq!(cli.list_file, Some(Utf8PathBuf::from("list.txt")));
        assert!(cli.no_prompt);
        assert_eq!(cli.ncbi_api_key.as_deref(), Some("abc"));
        assert_eq!(cli.accessions, vec!["SRR1", "SRP2"]);
        assert_eq!(cli.url_source, UrlSource::Template);
    }

    #[test]
    fn exit_codes_by_error_class() {
        assert_eq!(map_exit_code(&SraError::Declined), 1);
        assert_eq!(map_exit_code(&SraError::InvalidOutDir("x".into())), 1);
        assert_eq!(map_exit_code(&SraError::Interrupted), 1);
        assert_eq!(
            map_exit_code(&SraError::Lookup {
                term: "SRR1".into(),
                message: "none".into()
            }),
            2
        );
        assert_eq!(map_exit_code(&SraError::MissingTool("wget".into())), 3);
    }
}
