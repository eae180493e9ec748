use anyhow::{Context, bail};
use clap::Args;
use rionida::{Classifier, RionidaClassifier};

use crate::cli::{Datapoint, EngineArgs, TableArgs};
use crate::csv::{Reader, load_table};

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    table: TableArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// a comma delimitered list of numbers to estimate the decision for.
    /// may be given multiple times
    #[arg(long, required = true)]
    datapoint: Vec<Datapoint>,

    /// print the decision at every grid point instead of the operating point
    #[arg(long)]
    grid: bool,
}

pub fn knn_predict<R>(reader: Reader<R>, arg: PredictArgs) -> anyhow::Result<()>
where
    R: std::io::Read,
{
    let table = load_table(reader, &arg.table)?;
    let config = arg.engine.to_config();

    for datapoint in &arg.datapoint {
        if datapoint.as_slice().len() != table.attributes() {
            bail!("number of datapoints does not match number of columns");
        }
    }

    let classifier = if config.auto_optimize() {
        let (classifier, result) = RionidaClassifier::train_and_optimize(&table, config)
            .context("failed to optimise classifier parameters")?;
        let point = classifier.point();
        let index = result.space().index_of(&point)?;

        println!(
            "k: {} p: {} s_min: {} s_maj: {} | {:?}: {:.4}",
            point.k,
            point.p,
            point.s_min,
            point.s_maj,
            classifier.config().measure(),
            result.quality(index, classifier.config().measure())
        );

        classifier
    } else {
        RionidaClassifier::new(&table, config).context("failed to build classifier")?
    };

    for datapoint in &arg.datapoint {
        print!("datapoint |");

        for v in datapoint.as_slice() {
            print!(" {v}");
        }

        println!();

        if arg.grid {
            let space = classifier.config().parameter_space()?;
            let decisions = classifier.classify_across_parameter_space(datapoint.as_slice())?;

            for (index, decision) in decisions.iter().enumerate() {
                let point = space.point_at(index);

                println!(
                    "  k: {} p: {} s_min: {} s_maj: {} -> {}",
                    point.k,
                    point.p,
                    point.s_min,
                    point.s_maj,
                    table.decision().global_code(*decision)
                );
            }
        } else {
            println!("  {}", classifier.classify_label(datapoint.as_slice())?);
        }
    }

    Ok(())
}
