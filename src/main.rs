mod assertions;
mod checks;
mod cli;
mod config;
mod error;
mod logging;
mod model;
mod oracle;
mod output;
mod parsers;
mod rc_config;
mod report;
mod result;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::{control, Colorize};
use tracing::{info, warn};

use checks::CheckContext;
use cli::{Cli, Command};
use config::Settings;
use oracle::ssllabs::SslLabsClient;
use oracle::{CancelToken, TlsGradeOracle};
use rc_config::RcConfig;
use report::ReportAggregator;
use result::{CheckResult, RunSummary};

struct RunOutcome {
    results: Vec<CheckResult>,
    report_path: PathBuf,
    has_failures: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Some(Command::Completions { shell }) = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "spmetacheck", &mut std::io::stdout());
        return;
    }

    logging::init(cli.verbose);

    let cwd = std::env::current_dir().unwrap_or_default();
    let settings = Settings::resolve(&cli, RcConfig::load(&cwd));

    if settings.no_color {
        control::set_override(false);
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "cannot install Ctrl-C handler");
    }

    match run(&settings, cancel) {
        Ok(outcome) => {
            let metadata = settings.metadata.as_deref().unwrap_or(Path::new("-"));
            let summary = RunSummary::from_results(&outcome.results);
            output::terminal::print(&outcome.results, &summary, metadata, &outcome.report_path);
            if outcome.has_failures {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(2);
        }
    }
}

fn run(settings: &Settings, cancel: CancelToken) -> Result<RunOutcome> {
    let doc = parsers::metadata_xml::load_path(settings.metadata.as_deref())?;

    let oracle = if settings.checks.skip_tls {
        info!("TLS grade check disabled");
        None
    } else {
        let client = SslLabsClient::new(&settings.api_url, settings.http_timeout)?;
        info!(api = client.analyze_url(), "using SSL Labs");
        Some(TlsGradeOracle::new(Box::new(client), settings.poll, cancel))
    };

    let ctx = CheckContext {
        doc: &doc,
        oracle: oracle.as_ref(),
        settings: &settings.checks,
    };

    let mut aggregator = ReportAggregator::begin_run();
    let results = checks::run_all(&ctx, &mut aggregator).context("check run aborted")?;
    let report = aggregator.finalize();

    let report_path = output::json::write(&report, &settings.data_dir)?;

    Ok(RunOutcome {
        results,
        has_failures: report.has_failures(),
        report_path,
    })
}
