use std::fs::OpenOptions;
use std::io::{BufReader, ErrorKind};
use std::path::PathBuf;
use std::process;

use anyhow::{Error, bail};
use clap::{Parser, Subcommand};

mod cli;
mod csv;
mod logging;
mod predict;
mod search;

use crate::csv::ReaderBuilder;
use crate::predict::PredictArgs;
use crate::search::SearchArgs;

/// an imbalance aware k nearest neighbors classifier that loads a csv file
/// with a binary decision column, optimises its parameters on it and
/// classifies new datapoints.
#[derive(Debug, Parser)]
struct CliArgs {
    /// indicates that the csv contains no header row
    #[arg(long)]
    no_header: bool,

    /// path to the csv file to load
    #[arg(short, long)]
    file: PathBuf,

    /// increase log output. repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: RionidaCmd,
}

#[derive(Debug, Subcommand)]
enum RionidaCmd {
    /// optimises the classifier on the dataset and predicts the decision of
    /// the given datapoints
    Predict(PredictArgs),

    /// searches the parameter grid on a train split and reports the quality
    /// of the selected parameters on the held out split
    Search(SearchArgs),
}

fn main() {
    let args = CliArgs::parse();
    logging::init(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let result = OpenOptions::new().read(true).open(&args.file);

    let file = match result {
        Ok(f) => f,
        Err(err) => match err.kind() {
            ErrorKind::NotFound => bail!("the requested csv file was not found"),
            _ => return Err(Error::new(err).context("failed to load csv file")),
        },
    };

    let reader = ReaderBuilder::new()
        .has_headers(!args.no_header)
        .from_reader(BufReader::new(file));

    match args.cmd {
        RionidaCmd::Predict(arg) => predict::knn_predict(reader, arg),
        RionidaCmd::Search(arg) => search::knn_search(reader, arg),
    }
}
