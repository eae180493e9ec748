use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, bail};
pub use csv::{Reader, ReaderBuilder, StringRecord};
use rionida::TrainingTable;

use crate::cli::{ColumnType, TableArgs};

/// finds the index of a single column
fn resolve_column(
    headers: Option<&HashMap<&str, usize>>,
    column: &ColumnType,
    what: &str,
) -> anyhow::Result<usize> {
    match (column, headers) {
        (ColumnType::Name(name), Some(headers)) => {
            let Some(index) = headers.get(name.as_str()) else {
                bail!(
                    "unknown {what} header specified. column: {name}\navail: {:#?}",
                    headers
                );
            };

            Ok(*index)
        }
        (ColumnType::Name(name), None) => {
            bail!("no headers were specified in the csv but given a named {what}. column: {name}")
        }
        (ColumnType::Index(index), Some(headers)) => {
            if *index >= headers.len() {
                bail!("{what} index is out of range for known headers. column index: {index}");
            }

            Ok(*index)
        }
        (ColumnType::Index(index), None) => Ok(*index),
    }
}

/// attempts to retrieve the desired data columns and label from the csv file
pub fn get_columns_and_label<R>(
    reader: &mut Reader<R>,
    label: &ColumnType,
    retrieve: &[ColumnType],
) -> anyhow::Result<(usize, Vec<usize>)>
where
    R: std::io::Read,
{
    let headers = if reader.has_headers() {
        let known_headers = reader.headers().context("failed to retrieve csv headers")?;

        Some(
            known_headers
                .iter()
                .enumerate()
                .map(|(index, name)| (name, index))
                .collect::<HashMap<&str, usize>>(),
        )
    } else {
        None
    };

    let mut columns = Vec::with_capacity(retrieve.len());

    for to_get in retrieve {
        columns.push(resolve_column(headers.as_ref(), to_get, "column")?);
    }

    let found = resolve_column(headers.as_ref(), label, "label column")?;

    Ok((found, columns))
}

/// maps a csv record into the attribute values and the decision label
fn map_record(
    label: usize,
    columns: &[usize],
    index: usize,
    record: &StringRecord,
) -> anyhow::Result<(Vec<f64>, String)> {
    let mut rtn = Vec::with_capacity(columns.len());

    for col in columns {
        let Some(value) = record.get(*col) else {
            bail!("column data not found. column index: {}", col + 1);
        };

        let Ok(v) = f64::from_str(value.trim()) else {
            bail!(
                "failed to parse column data. row: {} column index: {}",
                index + 1,
                col + 1
            );
        };

        rtn.push(v);
    }

    let Some(found) = record.get(label) else {
        bail!("failed to find label. row: {}", index + 1);
    };

    Ok((rtn, found.trim().to_owned()))
}

/// reads every csv record into a training table
pub fn load_table<R>(mut reader: Reader<R>, args: &TableArgs) -> anyhow::Result<TrainingTable>
where
    R: std::io::Read,
{
    if args.columns.is_empty() {
        bail!("no columns specified to pull numeric data from");
    }

    // retrieve the label and datapoint columns from the csv reader
    let (label, columns) = get_columns_and_label(&mut reader, &args.label, &args.columns)?;
    let mut rows = Vec::new();

    for (index, maybe) in reader.records().enumerate() {
        let record = maybe.with_context(|| format!("failed to parse csv record. row: {index}"))?;

        rows.push(map_record(label, &columns, index, &record)?);
    }

    TrainingTable::from_labelled(rows).context("failed to build the training table")
}
