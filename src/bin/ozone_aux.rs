use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ozone_aux::app::{App, CampaignOptions, YearSelection};
use ozone_aux::config::{ConfigLoader, ResolvedConfig};
use ozone_aux::convert::SystemConverter;
use ozone_aux::domain::{RetrieverKind, START_YEAR};
use ozone_aux::download::Downloader;
use ozone_aux::error::OzoneError;
use ozone_aux::output::{self, JsonOutput, TracingSink};
use ozone_aux::retrieve::{HttpRetriever, Retriever, WgetRetriever};
use ozone_aux::store::AuxStore;
use ozone_aux::urls::UrlBuilder;
use ozone_aux::year::YearProcessor;

#[derive(Parser)]
#[command(name = "ozone-aux")]
#[command(about = "Download daily TOMS/OMI ozone files and convert them into the LEDAPS ancillary archive")]
#[command(version)]
struct Cli {
    #[arg(short = 's', long, alias = "start_year", help = "first year to pull ozone data for")]
    start_year: Option<i32>,

    #[arg(short = 'e', long, alias = "end_year", help = "last year to pull ozone data for")]
    end_year: Option<i32>,

    #[arg(long, help = "process ozone data for the most recent year")]
    today: bool,

    #[arg(long, help = format!("reprocess all ozone data from today back to {START_YEAR}"))]
    quarterly: bool,

    #[arg(long, help = "JSON settings file [default: ./ozone-aux.json if present]")]
    config: Option<String>,

    #[arg(long, help = "override the retrieval tool from the config file")]
    retriever: Option<RetrieverKind>,

    #[arg(long, help = "remove a year's existing TOMS_*.hdf files before processing it")]
    clean_target: bool,

    #[arg(long, help = "print the campaign report as JSON on stdout")]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<OzoneError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &OzoneError) -> u8 {
    match error {
        OzoneError::MissingAuxDir
        | OzoneError::InvalidSelection(_)
        | OzoneError::ConfigRead(_)
        | OzoneError::ConfigParse(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let selection =
        YearSelection::from_flags(cli.start_year, cli.end_year, cli.today, cli.quarterly)?;
    let mut config = ConfigLoader::resolve(cli.config.as_deref(), |name| std::env::var(name).ok())?;
    if let Some(kind) = cli.retriever {
        config.retriever = kind;
    }
    let options = CampaignOptions {
        clean_target: cli.clean_target,
    };

    match config.retriever {
        RetrieverKind::Wget => {
            let wget = WgetRetriever::new(config.wget_tries);
            if !wget.is_available() {
                tracing::warn!("wget not found on PATH; every download will fail");
            }
            run_campaign(wget, &config, selection, options, cli.json)
        }
        RetrieverKind::Http => {
            let http = HttpRetriever::new()?;
            run_campaign(http, &config, selection, options, cli.json)
        }
    }
}

fn run_campaign<R: Retriever>(
    retriever: R,
    config: &ResolvedConfig,
    selection: YearSelection,
    options: CampaignOptions,
    json: bool,
) -> miette::Result<()> {
    let converter = SystemConverter::new(&config.converter);
    if !converter.is_available() {
        tracing::warn!(
            "{} not found on PATH; every day will fail to convert",
            converter.name()
        );
    }

    let store = AuxStore::new(config.aux_dir.clone(), config.staging_root.clone());
    let processor = YearProcessor::new(
        store,
        UrlBuilder::new(&config.server_url),
        Downloader::new(retriever, config.retry),
        converter,
    );
    let app = App::new(processor, options);

    let today = Local::now().date_naive();
    let report = app.run(selection, today, &TracingSink);

    if json {
        JsonOutput::print_campaign(&report).into_diagnostic()?;
    } else {
        output::print_summary(&report);
    }
    Ok(())
}
