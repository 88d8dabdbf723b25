use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::models::RawRecord;

/// Reads every data row of a headed CSV file into raw records.
pub fn read_records(path: &Path, delimiter: Option<u8>) -> anyhow::Result<Vec<RawRecord>> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let delimiter = match delimiter {
        Some(d) => d,
        None => {
            let mut header = String::new();
            BufReader::new(&mut file)
                .read_line(&mut header)
                .with_context(|| format!("failed to read header of {}", path.display()))?;
            file.rewind()?;
            sniff_delimiter(&header)
        }
    };

    let records = read_from(file, delimiter)
        .with_context(|| format!("failed to parse CSV {}", path.display()))?;
    info!(
        path = %path.display(),
        records = records.len(),
        delimiter = %char::from(delimiter),
        "read incident records"
    );
    Ok(records)
}

pub fn read_from<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!(?headers, "csv headers");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect(),
        );
    }

    Ok(records)
}

/// `;` when it outnumbers `,` in the header line, `,` otherwise.
pub fn sniff_delimiter(header: &str) -> u8 {
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}
