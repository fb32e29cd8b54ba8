use crate::domain::DatasetId;
use crate::error::GenevizError;
use crate::store::RecordStore;
use crate::upload;

/// Accepted names for the first (gene id) column, compared case-insensitively.
pub const GENE_COLUMNS: [&str; 4] = ["gene-id", "gene", "gene_name", "geneid"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvHeader {
    pub samples: Vec<String>,
}

impl TsvHeader {
    pub fn parse(line: &str) -> Result<Self, GenevizError> {
        let columns = line.split('\t').collect::<Vec<_>>();
        if columns.len() < 2 {
            return Err(GenevizError::InvalidHeader(
                "expected a gene column followed by at least one sample column".to_string(),
            ));
        }
        let first = columns[0].trim().to_lowercase();
        if !GENE_COLUMNS.contains(&first.as_str()) {
            return Err(GenevizError::InvalidHeader(format!(
                "first column must be gene-ID, found {:?}",
                columns[0]
            )));
        }
        Ok(Self {
            samples: columns[1..]
                .iter()
                .map(|sample| sample.trim().to_string())
                .collect(),
        })
    }
}

/// One non-blank data row. Cells are paired positionally with the header's
/// samples; surplus cells on either side are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct TsvRow<'a> {
    pub gene_name: &'a str,
    pub cells: Vec<Cell<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell<'a> {
    pub sample: &'a str,
    pub value: Result<f64, CellError>,
}

/// Why a cell carries no usable value. Such cells are skipped, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    NotNumeric,
    NotFinite,
}

impl<'a> TsvRow<'a> {
    /// `None` for blank rows and rows whose gene cell is empty.
    pub fn parse(header: &'a TsvHeader, line: &'a str) -> Option<Self> {
        if line.trim().is_empty() {
            return None;
        }
        let mut parts = line.split('\t');
        let gene_name = parts.next()?.trim();
        if gene_name.is_empty() {
            return None;
        }
        let cells = header
            .samples
            .iter()
            .zip(parts)
            .map(|(sample, raw)| Cell {
                sample: sample.as_str(),
                value: parse_value(raw),
            })
            .collect();
        Some(Self { gene_name, cells })
    }
}

fn parse_value(raw: &str) -> Result<f64, CellError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CellError::NotNumeric)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CellError::NotFinite)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TsvIngest {
    pub records: usize,
    pub values: usize,
    pub skipped_values: usize,
}

/// Upserts every (gene, sample, value) triple of `bytes` into `dataset`.
///
/// Genes are created with an empty sequence when absent; an existing sequence
/// is left untouched. Stored values for the same (gene, sample) are overwritten.
pub fn ingest_tsv<S: RecordStore + ?Sized>(
    store: &S,
    dataset: DatasetId,
    bytes: &[u8],
) -> Result<TsvIngest, GenevizError> {
    let plain = upload::decompress(bytes)?;
    let mut lines = upload::lines(&plain);
    let header = match lines.next() {
        Some(line) => TsvHeader::parse(line?)?,
        None => return Err(GenevizError::EmptyFile),
    };

    let mut stats = TsvIngest::default();
    for line in lines {
        let line = line?;
        let Some(row) = TsvRow::parse(&header, line) else {
            continue;
        };
        let gene = store.get_or_create_sequence(dataset, row.gene_name)?;
        stats.records += 1;
        for cell in row.cells {
            match cell.value {
                Ok(value) => {
                    store.upsert_expression(dataset, gene.id, cell.sample, value)?;
                    stats.values += 1;
                }
                Err(_) => stats.skipped_values += 1,
            }
        }
    }
    tracing::debug!(
        dataset = %dataset,
        samples = header.samples.len(),
        rows = stats.records,
        skipped = stats.skipped_values,
        "expression table ingested"
    );
    Ok(stats)
}
