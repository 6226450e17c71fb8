#![forbid(unsafe_code)]

mod config;
mod feed;
mod report;

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    str::FromStr,
};

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tagflow_core::{check_unit, Issue};

use crate::report::{Checked, FindingsReport};

#[derive(Parser, Debug)]
#[command(name = "tagflow", version, about = "Semantic contract checker for annotated values")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// Rendered diagnostics on stdout
    Human,
    /// Machine-readable findings report
    Json,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check one or more slot feeds
    Check {
        #[arg(required = true)]
        feeds: Vec<PathBuf>,

        /// Explicit config file (default: nearest tagflow.toml above the first feed)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,

        /// Worker threads (default: one per core)
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        #[arg(long)]
        max_chain_depth: Option<usize>,

        /// Do not report sources whose declared range escapes the target range
        #[arg(long)]
        no_range_subsumption: bool,

        /// Reject color and mipmap resources where a drawable is expected
        #[arg(long)]
        no_color_promotion: bool,
    },

    /// Describe an issue
    Explain { issue: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAGFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> miette::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Check {
            feeds,
            config,
            format,
            jobs,
            max_chain_depth,
            no_range_subsumption,
            no_color_promotion,
        } => {
            let start = feeds
                .first()
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."));
            let mut resolved = config::load_config(config.as_deref(), &start)?;
            if let Some(depth) = max_chain_depth {
                resolved.options.max_chain_depth = depth;
            }
            if no_range_subsumption {
                resolved.options.range_subsumption = false;
            }
            if no_color_promotion {
                resolved.options.color_promotion = false;
            }

            let mut units = Vec::new();
            for path in &feeds {
                units.extend(feed::load_feed(path)?);
            }
            info!(feeds = feeds.len(), units = units.len(), "checking");

            let mut pool = rayon::ThreadPoolBuilder::new();
            if let Some(n) = jobs {
                pool = pool.num_threads(n);
            }
            let pool = pool.build().into_diagnostic()?;
            let options = &resolved.options;
            let checked: Vec<Checked> = pool.install(|| {
                units
                    .into_par_iter()
                    .map(|unit| {
                        let report = check_unit(&unit, options);
                        Checked { unit, report }
                    })
                    .collect()
            });

            let inputs = feeds.iter().map(|p| p.display().to_string()).collect();
            let summary = FindingsReport::build(inputs, &checked, &resolved);
            debug!(errors = summary.errors, warnings = summary.warnings, "done");

            let mut out = io::stdout().lock();
            match format {
                Format::Json => {
                    writeln!(out, "{}", summary.to_json()?).into_diagnostic()?;
                }
                Format::Human => {
                    write!(out, "{}", report::render_human(&checked, &resolved)).into_diagnostic()?;
                    writeln!(
                        out,
                        "{} error(s), {} warning(s) in {} unit(s)",
                        summary.errors,
                        summary.warnings,
                        summary.units.len()
                    )
                    .into_diagnostic()?;
                }
            }

            Ok(if summary.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Cmd::Explain { issue } => {
            let issue = Issue::from_str(&issue).map_err(|e| miette::miette!("{e}"))?;
            println!("{}: {}\n\n{}", issue.id(), issue.summary(), issue.explanation());
            Ok(ExitCode::SUCCESS)
        }
    }
}
