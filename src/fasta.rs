use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{Dataset, DatasetId, NameList};
use crate::error::GenevizError;
use crate::store::RecordStore;
use crate::upload::{self, UploadLines};

/// Residues per line in exported FASTA.
pub const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub gene_name: String,
    pub sequence: String,
}

/// Streaming FASTA parser.
///
/// A record is emitted when the next `>` header (or the end of input) is
/// reached. Sequence lines are trimmed and joined without separators. Lines
/// seen before the first header belong to no record and are dropped. A bare
/// `>` yields a record named by the empty string.
#[derive(Debug, Clone)]
pub struct FastaReader<'a> {
    lines: UploadLines<'a>,
    pending: Option<FastaRecord>,
    failed: bool,
}

impl<'a> FastaReader<'a> {
    pub fn new(lines: UploadLines<'a>) -> Self {
        Self {
            lines,
            pending: None,
            failed: false,
        }
    }
}

impl Iterator for FastaReader<'_> {
    type Item = Result<FastaRecord, GenevizError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err));
                }
                None => return self.pending.take().map(Ok),
            };
            if let Some(header) = line.strip_prefix('>') {
                let next = FastaRecord {
                    gene_name: header.trim().to_string(),
                    sequence: String::new(),
                };
                if let Some(done) = self.pending.replace(next) {
                    return Some(Ok(done));
                }
            } else if let Some(record) = self.pending.as_mut() {
                record.sequence.push_str(line.trim());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FastaIngest {
    pub records: usize,
}

/// Upserts every record of `bytes` into `dataset`, replacing the sequence of
/// genes that already exist. Stops at the first failure; records flushed
/// before it remain stored.
pub fn ingest_fasta<S: RecordStore + ?Sized>(
    store: &S,
    dataset: DatasetId,
    bytes: &[u8],
) -> Result<FastaIngest, GenevizError> {
    let plain = upload::decompress(bytes)?;
    let mut stats = FastaIngest::default();
    for record in FastaReader::new(upload::lines(&plain)) {
        let record = record?;
        store.upsert_sequence(dataset, &record.gene_name, &record.sequence)?;
        stats.records += 1;
        tracing::debug!(
            dataset = %dataset,
            gene = %record.gene_name,
            length = record.sequence.len(),
            "sequence upserted"
        );
    }
    Ok(stats)
}

/// Renders the requested genes in caller order. Genes without a stored record
/// become a `; WARN:` comment line instead of failing the export.
pub fn export_fasta<S: RecordStore + ?Sized>(
    store: &S,
    dataset: &Dataset,
    genes: &NameList,
) -> Result<String, GenevizError> {
    let records = store.find_sequences(dataset.id, genes.as_slice())?;
    let by_name = records
        .iter()
        .map(|record| (record.gene_name.as_str(), record.sequence.as_str()))
        .collect::<HashMap<_, _>>();
    Ok(render_fasta(dataset.id, genes, &by_name))
}

pub fn render_fasta(
    dataset: DatasetId,
    genes: &NameList,
    sequences: &HashMap<&str, &str>,
) -> String {
    let mut lines = Vec::new();
    for gene in genes {
        match sequences.get(gene.as_str()) {
            Some(sequence) => {
                lines.push(format!(">{gene}"));
                lines.extend(wrap(sequence, LINE_WIDTH).map(str::to_string));
            }
            None => lines.push(format!("; WARN: {gene} not found in dataset {dataset}")),
        }
    }
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Suggested download name, e.g. `genes_7_20240131_235959.fasta`.
pub fn export_filename(dataset: DatasetId, now: DateTime<Utc>) -> String {
    format!("genes_{dataset}_{}.fasta", now.format("%Y%m%d_%H%M%S"))
}

fn wrap(sequence: &str, width: usize) -> impl Iterator<Item = &str> {
    let mut rest = sequence;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let split = rest
            .char_indices()
            .nth(width)
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let (line, tail) = rest.split_at(split);
        rest = tail;
        Some(line)
    })
}
