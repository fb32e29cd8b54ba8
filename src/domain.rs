use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GenevizError;

macro_rules! record_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = GenevizError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value.trim().parse::<i64>().map(Self).map_err(|_| {
                    GenevizError::InvalidRequest(format!("invalid {}: {value}", $label))
                })
            }
        }
    };
}

record_id!(ProjectId, "project id");
record_id!(DatasetId, "dataset id");
record_id!(SequenceId, "sequence id");
record_id!(ExpressionId, "expression id");

/// Authenticated caller identity, supplied by the transport and threaded
/// explicitly into every access decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Caller(String);

impl Caller {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Caller {
    type Err = GenevizError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(GenevizError::InvalidRequest(
                "caller identity required".to_string(),
            ));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner: Caller,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub project: ProjectId,
    #[serde(default)]
    pub owner: Option<Caller>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: String,
}

impl Dataset {
    /// Owned by `caller`, or flagged default and therefore readable by anyone.
    pub fn is_visible_to(&self, caller: &Caller) -> bool {
        self.is_default || self.owner.as_ref() == Some(caller)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: SequenceId,
    pub dataset: DatasetId,
    pub gene_name: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub id: ExpressionId,
    pub dataset: DatasetId,
    pub gene: SequenceId,
    pub sample_id: String,
    pub expression_value: f64,
}

/// Expression record joined with its gene name, as returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionEntry {
    pub id: ExpressionId,
    pub gene_name: String,
    pub sample_id: String,
    pub expression_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceEntry {
    pub id: SequenceId,
    pub gene_name: String,
    pub sequence: String,
}

impl From<SequenceRecord> for SequenceEntry {
    fn from(value: SequenceRecord) -> Self {
        Self {
            id: value.id,
            gene_name: value.gene_name,
            sequence: value.sequence,
        }
    }
}

static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\r\n]").unwrap());

/// Ordered list of names taken from a comma (or newline) separated parameter.
/// Order and duplicates are preserved; blank entries are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameList(Vec<String>);

impl NameList {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Parses a list that must contain at least one name.
    pub fn required(value: Option<&str>, parameter: &str) -> Result<Self, GenevizError> {
        let list = value.map(Self::parse).unwrap_or_default();
        if list.is_empty() {
            return Err(GenevizError::InvalidRequest(format!(
                "please provide {parameter}"
            )));
        }
        Ok(list)
    }

    pub fn parse(value: &str) -> Self {
        Self(
            LIST_SEPARATOR
                .split(value)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<Vec<String>> for NameList {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a NameList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_dataset_id() {
        let id: DatasetId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn parse_dataset_id_invalid() {
        let err = "abc".parse::<DatasetId>().unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
    }

    #[test]
    fn caller_must_not_be_blank() {
        let err = "  ".parse::<Caller>().unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
    }

    #[test]
    fn name_list_keeps_order_and_duplicates() {
        let list = NameList::parse("TP53, BRCA1,,\nTP53\r\n");
        assert_eq!(list.as_slice(), ["TP53", "BRCA1", "TP53"]);
    }

    #[test]
    fn required_name_list_rejects_blank() {
        let err = NameList::required(Some(" , "), "?genes=...").unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
        let err = NameList::required(None, "?genes=...").unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
    }
}
