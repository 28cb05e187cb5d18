//! orobnat CLI
//!
//! Lists the portal's regions, departments, communes and networks, or
//! downloads every analysis report of one network.

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, CommandFactory, Parser, error::ErrorKind};
use orobnat::{
    error::{AppError, Result},
    export::{ExportFormat, ReportExporter},
    models::{CascadeLevel, Config, SearchTarget, Selection},
    pipeline,
    services::{BlockReportParser, FormSession, validate_selection},
};

/// orobnat - drinking-water quality report downloader
#[derive(Parser, Debug)]
#[command(
    name = "orobnat",
    version,
    about = "Télécharge les résultats d'analyse d'eau potable depuis https://orobnat.sante.gouv.fr"
)]
#[command(group(ArgGroup::new("listing").multiple(false)))]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "orobnat.toml")]
    config: PathBuf,

    /// Show debug information
    #[arg(long)]
    debug: bool,

    /// Fetch and parse reports without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Export formats (default from configuration: pdf)
    #[arg(long, value_enum, num_args = 1..)]
    format: Vec<ExportFormat>,

    /// Region ID
    #[arg(long, value_name = "ID")]
    region: Option<String>,

    /// Department ID
    #[arg(long, value_name = "ID")]
    departement: Option<String>,

    /// Commune ID
    #[arg(long, value_name = "ID")]
    commune: Option<String>,

    /// Network ID
    #[arg(long, value_name = "ID")]
    reseau: Option<String>,

    /// List the available regions
    #[arg(long, group = "listing")]
    liste_regions: bool,

    /// List the departments of the selected region
    #[arg(long, group = "listing")]
    liste_departements: bool,

    /// List the communes of the selected department
    #[arg(long, group = "listing")]
    liste_communes: bool,

    /// List the networks of the selected commune
    #[arg(long, group = "listing")]
    liste_reseaux: bool,

    /// Export directory
    #[arg(value_name = "CHEMIN")]
    chemin: Option<PathBuf>,
}

impl Cli {
    fn selection(&self) -> Selection {
        Selection {
            region: self.region.clone(),
            department: self.departement.clone(),
            commune: self.commune.clone(),
            network: self.reseau.clone(),
        }
    }

    /// Level requested by a listing flag, if any.
    fn listing(&self) -> Option<CascadeLevel> {
        [
            (self.liste_regions, CascadeLevel::Region),
            (self.liste_departements, CascadeLevel::Department),
            (self.liste_communes, CascadeLevel::Commune),
            (self.liste_reseaux, CascadeLevel::Network),
        ]
        .into_iter()
        .find_map(|(flag, level)| flag.then_some(level))
    }
}

/// What the run does once the selection is validated.
enum Action {
    List(CascadeLevel),
    Download { target: SearchTarget, root: PathBuf },
}

/// Initialize logging based on the debug flag.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Format an error together with its sources.
fn diagnostic(error: &AppError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    message
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config);
    config.validate()?;
    log::debug!("Parsed args: {:?}", cli);

    let selection = cli.selection();

    // Reject incomplete selections before touching the network.
    let action = match cli.listing() {
        Some(level) => {
            selection.require_parents(level)?;
            Action::List(level)
        }
        None => Action::Download {
            target: selection.to_target()?,
            root: cli
                .chemin
                .clone()
                .ok_or_else(|| AppError::validation("CHEMIN is required to download reports"))?,
        },
    };

    let session = FormSession::open(&config.portal)?;
    validate_selection(&session, &selection)?;

    match action {
        Action::List(level) => {
            pipeline::run_listing(&session, level, &selection, &mut std::io::stdout().lock())?;
        }
        Action::Download { target, root } => {
            let formats = if cli.format.is_empty() {
                config.export.formats.clone()
            } else {
                cli.format.clone()
            };
            let exporter = if cli.dry_run {
                ReportExporter::dry_run()
            } else {
                ReportExporter::new(&root, &formats, &config.export.wkhtmltopdf)
            };
            let parser = BlockReportParser::new(&config.parser)?;
            pipeline::run_download(&session, &parser, &target, &exporter)?;
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_usage() => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
        Err(e) => {
            log::error!("{}", diagnostic(&e));
            ExitCode::FAILURE
        }
    }
}
