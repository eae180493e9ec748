use anyhow::{Context, bail};
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rionida::{Classifier, ConfusionMatrix, QualityMeasure, RionidaClassifier, TrainingTable};

use crate::cli::{EngineArgs, TableArgs};
use crate::csv::{Reader, load_table};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    table: TableArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// the percent of data to test against
    #[arg(long, default_value = "0.25")]
    test: f64,

    /// seed for the train / test split
    #[arg(long, default_value = "0")]
    split_seed: u64,

    /// the number of best grid points to list
    #[arg(long, default_value = "5")]
    top: usize,
}

pub fn knn_search<R>(reader: Reader<R>, arg: SearchArgs) -> anyhow::Result<()>
where
    R: std::io::Read,
{
    if !(0.0..1.0).contains(&arg.test) {
        bail!("test split must be in [0, 1). given: {}", arg.test);
    }

    let records = load_table(reader, &arg.table)?;
    let (train, test) = split_dataset(&records, arg.test, arg.split_seed);

    let train_table = records.subset(&train)?;
    let config = arg.engine.to_config();
    let measure = config.measure();

    let (classifier, result) = RionidaClassifier::train_and_optimize(&train_table, config)
        .context("failed to optimise classifier parameters")?;

    println!(
        "train: {} test: {} grid points: {}",
        train.len(),
        test.len(),
        result.space().volume()
    );

    // list the best grid points, earliest index first on ties
    let mut ranked: Vec<(usize, f64)> = (0..result.space().volume())
        .map(|index| (index, result.quality(index, measure)))
        .collect();

    ranked.sort_by(|(a_index, a), (b_index, b)| b.total_cmp(a).then(a_index.cmp(b_index)));

    for (index, value) in ranked.iter().take(arg.top) {
        let point = result.space().point_at(*index);

        println!(
            "  k: {} p: {} s_min: {} s_maj: {} | {measure:?}: {value:.4}",
            point.k, point.p, point.s_min, point.s_maj
        );
    }

    let point = classifier.point();

    println!(
        "selected k: {} p: {} s_min: {} s_maj: {}",
        point.k, point.p, point.s_min, point.s_maj
    );

    if test.is_empty() {
        return Ok(());
    }

    let mut matrix = ConfusionMatrix::new();

    for index in &test {
        let record = records.record(*index);

        matrix.record(record.class, classifier.classify(&record.data)?);
    }

    print_matrix(&records, &matrix, classifier.minority());

    Ok(())
}

fn print_matrix(table: &TrainingTable, matrix: &ConfusionMatrix, minority: usize) {
    let decision = table.decision();

    println!("actual \\ predicted | {} | {}", decision.global_code(0), decision.global_code(1));

    for actual in 0..2 {
        println!(
            "{} | {} | {}",
            decision.global_code(actual),
            matrix.get(actual, 0),
            matrix.get(actual, 1)
        );
    }

    println!("minority: {}", decision.global_code(minority));
    println!("  accuracy: {:.4}", matrix.measure(QualityMeasure::Accuracy, minority));
    println!("  precision: {:.4}", matrix.precision(minority));
    println!("  recall: {:.4}", matrix.recall(minority));
    println!("  specificity: {:.4}", matrix.specificity(minority));
    println!("  fmeasure: {:.4}", matrix.measure(QualityMeasure::Fmeasure, minority));
    println!("  gmean: {:.4}", matrix.measure(QualityMeasure::Gmean, minority));
}

/// splits the object indices per class so both parts keep the class
/// proportions. returns `(train, test)`
fn split_dataset(records: &TrainingTable, split: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: [Vec<usize>; 2] = [Vec::new(), Vec::new()];

    for (index, record) in records.records().iter().enumerate() {
        groups[record.class].push(index);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();

    for mut group in groups {
        group.shuffle(&mut rng);

        let amount = (group.len() as f64 * split).floor() as usize;

        train.extend(group.split_off(amount));
        test.extend(group);
    }

    train.sort_unstable();
    test.sort_unstable();

    (train, test)
}
