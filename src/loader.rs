//! CSV ingestion into a [`Table`].

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use tracing::{debug, info};

use crate::config::DEFAULT_UNKNOWN_MARKER;
use crate::error::{Error, Result};
use crate::table::{Column, Table};

/// Reads a headed CSV. Empty cells and `?` are missing; a column whose
/// present cells all parse as numbers is numeric.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect_vec();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(match cell {
                "" | DEFAULT_UNKNOWN_MARKER => None,
                value => Some(value.to_string()),
            });
        }
    }
    if cells.first().map_or(true, Vec::is_empty) {
        return Err(Error::EmptyInput);
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer(name, values))
        .collect_vec();
    let table = Table::new(columns)?;
    info!(
        "Loaded {} rows, {} columns ({} numeric)",
        table.num_rows(),
        table.num_columns(),
        table.numeric_columns().len()
    );
    Ok(table)
}

pub fn read_csv_path(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    debug!("Reading {}", path.display());
    read_csv(File::open(path)?)
}

fn infer(name: String, values: Vec<Option<String>>) -> Column {
    let parsed = values
        .iter()
        .map(|v| v.as_deref().map(str::parse::<f64>).transpose())
        .collect::<std::result::Result<Vec<_>, _>>();
    match parsed {
        Ok(numbers) if numbers.iter().any(Option::is_some) => Column::numeric(name, numbers),
        _ => Column::categorical(name, values),
    }
}
