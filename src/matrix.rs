use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{Dataset, NameList};
use crate::error::GenevizError;
use crate::store::{ExpressionFilter, RecordStore};

/// Dense gene x sample table, serialized as `{gene: {sample: value}}`.
///
/// Rows and columns are exactly the genes and samples that occur in the
/// gathered values, both in lexicographic order. Combinations absent from the
/// sparse input hold `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpressionMatrix {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ExpressionMatrix {
    /// Pivots sparse `(gene, sample, value)` triples. Fails with
    /// [`GenevizError::NoData`] when there is nothing to pivot.
    pub fn pivot<I>(triples: I) -> Result<Self, GenevizError>
    where
        I: IntoIterator<Item = (String, String, f64)>,
    {
        let mut rows = BTreeMap::<String, BTreeMap<String, f64>>::new();
        let mut samples = BTreeSet::new();
        for (gene, sample, value) in triples {
            samples.insert(sample.clone());
            rows.entry(gene).or_default().insert(sample, value);
        }
        if rows.is_empty() {
            return Err(GenevizError::NoData);
        }
        for row in rows.values_mut() {
            for sample in &samples {
                row.entry(sample.clone()).or_insert(0.0);
            }
        }
        Ok(Self { rows })
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.rows
            .values()
            .next()
            .into_iter()
            .flat_map(|row| row.keys().map(String::as_str))
    }

    pub fn get(&self, gene: &str, sample: &str) -> Option<f64> {
        self.rows.get(gene)?.get(sample).copied()
    }

    /// Tab-separated rendering with a `gene_name` header, re-uploadable as TSV.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("gene_name");
        for sample in self.samples() {
            out.push('\t');
            out.push_str(sample);
        }
        out.push('\n');
        for (gene, row) in &self.rows {
            out.push_str(gene);
            for value in row.values() {
                out.push('\t');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        out
    }
}

/// Gathers the dataset's values for `genes` and pivots them.
pub fn assemble_matrix<S: RecordStore + ?Sized>(
    store: &S,
    dataset: &Dataset,
    genes: &NameList,
) -> Result<ExpressionMatrix, GenevizError> {
    let entries = store.find_expressions(&ExpressionFilter {
        dataset: dataset.id,
        genes: genes.as_slice(),
        samples: None,
    })?;
    tracing::debug!(dataset = %dataset.id, values = entries.len(), "pivoting expression values");
    ExpressionMatrix::pivot(
        entries
            .into_iter()
            .map(|entry| (entry.gene_name, entry.sample_id, entry.expression_value)),
    )
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn triple(gene: &str, sample: &str, value: f64) -> (String, String, f64) {
        (gene.to_string(), sample.to_string(), value)
    }

    #[test]
    fn fills_missing_cells_with_zero() {
        let matrix = ExpressionMatrix::pivot([
            triple("g1", "s1", 5.0),
            triple("g1", "s2", 3.0),
            triple("g2", "s1", 7.0),
        ])
        .unwrap();
        assert_eq!(matrix.get("g1", "s1"), Some(5.0));
        assert_eq!(matrix.get("g1", "s2"), Some(3.0));
        assert_eq!(matrix.get("g2", "s1"), Some(7.0));
        assert_eq!(matrix.get("g2", "s2"), Some(0.0));
        assert_eq!(matrix.genes().collect::<Vec<_>>(), ["g1", "g2"]);
        assert_eq!(matrix.samples().collect::<Vec<_>>(), ["s1", "s2"]);
    }

    #[test]
    fn empty_gather_is_no_data() {
        let err = ExpressionMatrix::pivot(Vec::new()).unwrap_err();
        assert_matches!(err, GenevizError::NoData);
    }

    #[test]
    fn serializes_as_nested_mapping() {
        let matrix =
            ExpressionMatrix::pivot([triple("g2", "s1", 7.0), triple("g1", "s2", 3.0)]).unwrap();
        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "g1": {"s1": 0.0, "s2": 3.0},
                "g2": {"s1": 7.0, "s2": 0.0},
            })
        );
    }

    #[test]
    fn tsv_rendering_has_header_and_sorted_rows() {
        let matrix =
            ExpressionMatrix::pivot([triple("g2", "s1", 7.0), triple("g1", "s2", 3.5)]).unwrap();
        assert_eq!(matrix.to_tsv(), "gene_name\ts1\ts2\ng1\t0\t3.5\ng2\t7\t0\n");
    }
}
