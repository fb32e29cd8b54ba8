use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::domain::{
    Caller, Dataset, DatasetId, ExpressionEntry, ExpressionId, ExpressionRecord, Project,
    ProjectId, SequenceId, SequenceRecord,
};
use crate::error::GenevizError;

/// Record store collaborator. Every call is one atomic unit of work; there is
/// no transaction spanning several calls.
pub trait RecordStore: Send + Sync {
    fn get_or_create_project(&self, owner: &Caller, name: &str) -> Result<Project, GenevizError>;
    fn find_project(&self, id: ProjectId, owner: &Caller)
    -> Result<Option<Project>, GenevizError>;
    fn list_projects(&self, owner: &Caller) -> Result<Vec<Project>, GenevizError>;
    fn delete_project(&self, id: ProjectId) -> Result<bool, GenevizError>;

    /// Matching datasets ordered by (project, name).
    fn find_datasets(&self, filter: &DatasetFilter) -> Result<Vec<Dataset>, GenevizError>;
    /// Fails with [`GenevizError::Conflict`] when (project, name) is taken.
    fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset, GenevizError>;
    fn set_dataset_default(
        &self,
        id: DatasetId,
        is_default: bool,
    ) -> Result<Option<Dataset>, GenevizError>;
    /// Removes the dataset together with its sequences and expression values.
    fn delete_dataset(&self, id: DatasetId) -> Result<bool, GenevizError>;

    /// Insert or replace the sequence stored for (dataset, gene_name).
    fn upsert_sequence(
        &self,
        dataset: DatasetId,
        gene_name: &str,
        sequence: &str,
    ) -> Result<SequenceRecord, GenevizError>;
    /// Existing record for (dataset, gene_name), or a new one with an empty sequence.
    fn get_or_create_sequence(
        &self,
        dataset: DatasetId,
        gene_name: &str,
    ) -> Result<SequenceRecord, GenevizError>;
    fn find_sequences(
        &self,
        dataset: DatasetId,
        genes: &[String],
    ) -> Result<Vec<SequenceRecord>, GenevizError>;
    fn list_gene_names(
        &self,
        dataset: DatasetId,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, GenevizError>;

    /// Insert or overwrite the value stored for (dataset, gene, sample_id).
    fn upsert_expression(
        &self,
        dataset: DatasetId,
        gene: SequenceId,
        sample_id: &str,
        value: f64,
    ) -> Result<ExpressionRecord, GenevizError>;
    /// Matching values joined with their gene name, ordered by (gene, sample).
    fn find_expressions(
        &self,
        filter: &ExpressionFilter<'_>,
    ) -> Result<Vec<ExpressionEntry>, GenevizError>;
    fn list_sample_ids(&self, dataset: DatasetId) -> Result<Vec<String>, GenevizError>;
}

#[derive(Debug, Clone, Default)]
pub struct DatasetFilter {
    pub id: Option<DatasetId>,
    pub project: Option<ProjectId>,
    pub name: Option<String>,
    pub visible_to: Option<Caller>,
}

impl DatasetFilter {
    pub fn matches(&self, dataset: &Dataset) -> bool {
        self.id.is_none_or(|id| dataset.id == id)
            && self.project.is_none_or(|project| dataset.project == project)
            && self.name.as_ref().is_none_or(|name| &dataset.name == name)
            && self
                .visible_to
                .as_ref()
                .is_none_or(|caller| dataset.is_visible_to(caller))
    }
}

#[derive(Debug, Clone)]
pub struct NewDataset {
    pub project: ProjectId,
    pub name: String,
    pub owner: Option<Caller>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ExpressionFilter<'a> {
    pub dataset: DatasetId,
    pub genes: &'a [String],
    pub samples: Option<&'a [String]>,
}

pub fn default_store_path() -> Result<Utf8PathBuf, GenevizError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.data_dir().join("geneviz").join("store.json")).ok()
        })
        .ok_or_else(|| GenevizError::Filesystem("unable to resolve data directory".to_string()))
}

/// In-process record store guarded by a single mutex, with JSON snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    next: NextIds,
    projects: BTreeMap<ProjectId, Project>,
    project_keys: HashMap<(Caller, String), ProjectId>,
    datasets: BTreeMap<DatasetId, Dataset>,
    dataset_keys: HashMap<(ProjectId, String), DatasetId>,
    sequences: BTreeMap<SequenceId, SequenceRecord>,
    sequence_keys: HashMap<(DatasetId, String), SequenceId>,
    expressions: BTreeMap<ExpressionId, ExpressionRecord>,
    expression_keys: HashMap<(DatasetId, SequenceId, String), ExpressionId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct NextIds {
    project: i64,
    dataset: i64,
    sequence: i64,
    expression: i64,
}

impl Default for NextIds {
    fn default() -> Self {
        Self {
            project: 1,
            dataset: 1,
            sequence: 1,
            expression: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    next: NextIds,
    projects: Vec<Project>,
    datasets: Vec<Dataset>,
    sequences: Vec<SequenceRecord>,
    expressions: Vec<ExpressionRecord>,
}

const SNAPSHOT_VERSION: u32 = 1;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot written by [`MemoryStore::save`]; a missing file yields
    /// an empty store.
    pub fn open(path: &Utf8Path) -> Result<Self, GenevizError> {
        if !path.as_std_path().exists() {
            tracing::debug!(path = %path, "no store snapshot, starting empty");
            return Ok(Self::new());
        }
        let content =
            fs::read(path.as_std_path()).map_err(|err| GenevizError::Filesystem(err.to_string()))?;
        let snapshot: Snapshot = serde_json::from_slice(&content)
            .map_err(|err| GenevizError::Store(format!("corrupt snapshot {path}: {err}")))?;
        if snapshot.schema_version != SNAPSHOT_VERSION {
            return Err(GenevizError::Store(format!(
                "unsupported snapshot version {}",
                snapshot.schema_version
            )));
        }
        let tables = Tables::from_snapshot(snapshot);
        tracing::debug!(
            path = %path,
            datasets = tables.datasets.len(),
            sequences = tables.sequences.len(),
            expressions = tables.expressions.len(),
            "loaded store snapshot"
        );
        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    /// Writes the snapshot to a temp file next to `path`, then renames it over.
    pub fn save(&self, path: &Utf8Path) -> Result<(), GenevizError> {
        let content = {
            let tables = self.tables()?;
            serde_json::to_vec(&tables.to_snapshot())
                .map_err(|err| GenevizError::Store(err.to_string()))?
        };
        let parent = ensure_parent(path)?;
        let mut temp = Builder::new()
            .prefix("geneviz-store")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| GenevizError::Filesystem(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| GenevizError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| GenevizError::Filesystem(err.to_string()))?;
        Ok(())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, GenevizError> {
        self.tables
            .lock()
            .map_err(|_| GenevizError::Store("store lock poisoned".to_string()))
    }
}

/// Exclusive advisory lock on the `<store>.lock` file next to a snapshot.
///
/// Processes sharing a snapshot hold it across their whole open, mutate and
/// save cycle; otherwise the last `save` would overwrite rows another process
/// already committed. Released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    _file: fs::File,
}

impl StoreLock {
    /// Blocks until no other holder remains.
    pub fn acquire(store_path: &Utf8Path) -> Result<Self, GenevizError> {
        ensure_parent(store_path)?;
        let path = Utf8PathBuf::from(format!("{store_path}.lock"));
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path.as_std_path())
            .map_err(|err| GenevizError::Filesystem(format!("open {path}: {err}")))?;
        file.lock_exclusive()
            .map_err(|err| GenevizError::Filesystem(format!("lock {path}: {err}")))?;
        tracing::debug!(path = %path, "store lock acquired");
        Ok(Self { _file: file })
    }
}

fn ensure_parent(path: &Utf8Path) -> Result<&Utf8Path, GenevizError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| GenevizError::Filesystem(err.to_string()))?;
    Ok(parent)
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Tables {
            next: snapshot.next,
            ..Tables::default()
        };
        for project in snapshot.projects {
            tables
                .project_keys
                .insert((project.owner.clone(), project.name.clone()), project.id);
            tables.next.project = tables.next.project.max(project.id.get() + 1);
            tables.projects.insert(project.id, project);
        }
        for dataset in snapshot.datasets {
            tables
                .dataset_keys
                .insert((dataset.project, dataset.name.clone()), dataset.id);
            tables.next.dataset = tables.next.dataset.max(dataset.id.get() + 1);
            tables.datasets.insert(dataset.id, dataset);
        }
        for record in snapshot.sequences {
            tables
                .sequence_keys
                .insert((record.dataset, record.gene_name.clone()), record.id);
            tables.next.sequence = tables.next.sequence.max(record.id.get() + 1);
            tables.sequences.insert(record.id, record);
        }
        for record in snapshot.expressions {
            tables.expression_keys.insert(
                (record.dataset, record.gene, record.sample_id.clone()),
                record.id,
            );
            tables.next.expression = tables.next.expression.max(record.id.get() + 1);
            tables.expressions.insert(record.id, record);
        }
        tables
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            schema_version: SNAPSHOT_VERSION,
            next: self.next,
            projects: self.projects.values().cloned().collect(),
            datasets: self.datasets.values().cloned().collect(),
            sequences: self.sequences.values().cloned().collect(),
            expressions: self.expressions.values().cloned().collect(),
        }
    }

    fn remove_dataset(&mut self, id: DatasetId) -> bool {
        let Some(dataset) = self.datasets.remove(&id) else {
            return false;
        };
        self.dataset_keys.remove(&(dataset.project, dataset.name));
        self.sequences.retain(|_, record| record.dataset != id);
        self.sequence_keys.retain(|(dataset, _), _| *dataset != id);
        self.expressions.retain(|_, record| record.dataset != id);
        self.expression_keys.retain(|(dataset, _, _), _| *dataset != id);
        true
    }
}

impl RecordStore for MemoryStore {
    fn get_or_create_project(&self, owner: &Caller, name: &str) -> Result<Project, GenevizError> {
        let mut tables = self.tables()?;
        let key = (owner.clone(), name.to_string());
        if let Some(id) = tables.project_keys.get(&key) {
            if let Some(project) = tables.projects.get(id) {
                return Ok(project.clone());
            }
        }
        let id = ProjectId::new(tables.next.project);
        tables.next.project += 1;
        let project = Project {
            id,
            name: name.to_string(),
            owner: owner.clone(),
            created_at: timestamp(),
        };
        tables.project_keys.insert(key, id);
        tables.projects.insert(id, project.clone());
        Ok(project)
    }

    fn find_project(
        &self,
        id: ProjectId,
        owner: &Caller,
    ) -> Result<Option<Project>, GenevizError> {
        let tables = self.tables()?;
        Ok(tables
            .projects
            .get(&id)
            .filter(|project| &project.owner == owner)
            .cloned())
    }

    fn list_projects(&self, owner: &Caller) -> Result<Vec<Project>, GenevizError> {
        let tables = self.tables()?;
        Ok(tables
            .projects
            .values()
            .filter(|project| &project.owner == owner)
            .cloned()
            .collect())
    }

    fn delete_project(&self, id: ProjectId) -> Result<bool, GenevizError> {
        let mut tables = self.tables()?;
        let Some(project) = tables.projects.remove(&id) else {
            return Ok(false);
        };
        tables.project_keys.remove(&(project.owner, project.name));
        let children = tables
            .datasets
            .values()
            .filter(|dataset| dataset.project == id)
            .map(|dataset| dataset.id)
            .collect::<Vec<_>>();
        for dataset in children {
            tables.remove_dataset(dataset);
        }
        Ok(true)
    }

    fn find_datasets(&self, filter: &DatasetFilter) -> Result<Vec<Dataset>, GenevizError> {
        let tables = self.tables()?;
        let mut matches = match filter.id {
            Some(id) => tables.datasets.get(&id).into_iter().collect::<Vec<_>>(),
            None => tables.datasets.values().collect(),
        }
        .into_iter()
        .filter(|dataset| filter.matches(dataset))
        .cloned()
        .collect::<Vec<_>>();
        matches.sort_by(|a, b| (a.project, &a.name).cmp(&(b.project, &b.name)));
        Ok(matches)
    }

    fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset, GenevizError> {
        let mut tables = self.tables()?;
        if !tables.projects.contains_key(&dataset.project) {
            return Err(GenevizError::Store(format!(
                "project {} does not exist",
                dataset.project
            )));
        }
        let key = (dataset.project, dataset.name.clone());
        if tables.dataset_keys.contains_key(&key) {
            return Err(GenevizError::Conflict(format!(
                "dataset {:?} already exists in project {}",
                dataset.name, dataset.project
            )));
        }
        let id = DatasetId::new(tables.next.dataset);
        tables.next.dataset += 1;
        let created = Dataset {
            id,
            name: dataset.name,
            project: dataset.project,
            owner: dataset.owner,
            is_default: dataset.is_default,
            created_at: timestamp(),
        };
        tables.dataset_keys.insert(key, id);
        tables.datasets.insert(id, created.clone());
        Ok(created)
    }

    fn set_dataset_default(
        &self,
        id: DatasetId,
        is_default: bool,
    ) -> Result<Option<Dataset>, GenevizError> {
        let mut tables = self.tables()?;
        Ok(tables.datasets.get_mut(&id).map(|dataset| {
            dataset.is_default = is_default;
            dataset.clone()
        }))
    }

    fn delete_dataset(&self, id: DatasetId) -> Result<bool, GenevizError> {
        let mut tables = self.tables()?;
        Ok(tables.remove_dataset(id))
    }

    fn upsert_sequence(
        &self,
        dataset: DatasetId,
        gene_name: &str,
        sequence: &str,
    ) -> Result<SequenceRecord, GenevizError> {
        let mut tables = self.tables()?;
        ensure_dataset(&tables, dataset)?;
        let key = (dataset, gene_name.to_string());
        if let Some(id) = tables.sequence_keys.get(&key).copied() {
            if let Some(record) = tables.sequences.get_mut(&id) {
                record.sequence = sequence.to_string();
                return Ok(record.clone());
            }
        }
        let record = insert_sequence(&mut tables, dataset, gene_name, sequence);
        Ok(record)
    }

    fn get_or_create_sequence(
        &self,
        dataset: DatasetId,
        gene_name: &str,
    ) -> Result<SequenceRecord, GenevizError> {
        let mut tables = self.tables()?;
        ensure_dataset(&tables, dataset)?;
        let key = (dataset, gene_name.to_string());
        if let Some(id) = tables.sequence_keys.get(&key) {
            if let Some(record) = tables.sequences.get(id) {
                return Ok(record.clone());
            }
        }
        Ok(insert_sequence(&mut tables, dataset, gene_name, ""))
    }

    fn find_sequences(
        &self,
        dataset: DatasetId,
        genes: &[String],
    ) -> Result<Vec<SequenceRecord>, GenevizError> {
        let tables = self.tables()?;
        let wanted = genes.iter().collect::<BTreeSet<_>>();
        let mut records = wanted
            .into_iter()
            .filter_map(|gene| tables.sequence_keys.get(&(dataset, gene.to_string())))
            .filter_map(|id| tables.sequences.get(id))
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|a, b| a.gene_name.cmp(&b.gene_name));
        Ok(records)
    }

    fn list_gene_names(
        &self,
        dataset: DatasetId,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, GenevizError> {
        let tables = self.tables()?;
        let needle = contains.map(str::to_lowercase);
        let names = tables
            .sequences
            .values()
            .filter(|record| record.dataset == dataset)
            .filter(|record| {
                needle
                    .as_deref()
                    .is_none_or(|needle| record.gene_name.to_lowercase().contains(needle))
            })
            .map(|record| record.gene_name.clone())
            .collect::<BTreeSet<_>>();
        Ok(names.into_iter().take(limit).collect())
    }

    fn upsert_expression(
        &self,
        dataset: DatasetId,
        gene: SequenceId,
        sample_id: &str,
        value: f64,
    ) -> Result<ExpressionRecord, GenevizError> {
        let mut tables = self.tables()?;
        ensure_dataset(&tables, dataset)?;
        if !tables.sequences.contains_key(&gene) {
            return Err(GenevizError::Store(format!("gene {gene} does not exist")));
        }
        let key = (dataset, gene, sample_id.to_string());
        if let Some(id) = tables.expression_keys.get(&key).copied() {
            if let Some(record) = tables.expressions.get_mut(&id) {
                record.expression_value = value;
                return Ok(record.clone());
            }
        }
        let id = ExpressionId::new(tables.next.expression);
        tables.next.expression += 1;
        let record = ExpressionRecord {
            id,
            dataset,
            gene,
            sample_id: sample_id.to_string(),
            expression_value: value,
        };
        tables.expression_keys.insert(key, id);
        tables.expressions.insert(id, record.clone());
        Ok(record)
    }

    fn find_expressions(
        &self,
        filter: &ExpressionFilter<'_>,
    ) -> Result<Vec<ExpressionEntry>, GenevizError> {
        let tables = self.tables()?;
        let genes = filter.genes.iter().collect::<BTreeSet<_>>();
        let samples = filter
            .samples
            .map(|samples| samples.iter().collect::<BTreeSet<_>>());
        let mut entries = tables
            .expressions
            .values()
            .filter(|record| record.dataset == filter.dataset)
            .filter(|record| {
                samples
                    .as_ref()
                    .is_none_or(|samples| samples.contains(&record.sample_id))
            })
            .filter_map(|record| {
                let gene = tables.sequences.get(&record.gene)?;
                genes.contains(&gene.gene_name).then(|| ExpressionEntry {
                    id: record.id,
                    gene_name: gene.gene_name.clone(),
                    sample_id: record.sample_id.clone(),
                    expression_value: record.expression_value,
                })
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| (&a.gene_name, &a.sample_id).cmp(&(&b.gene_name, &b.sample_id)));
        Ok(entries)
    }

    fn list_sample_ids(&self, dataset: DatasetId) -> Result<Vec<String>, GenevizError> {
        let tables = self.tables()?;
        let samples = tables
            .expressions
            .values()
            .filter(|record| record.dataset == dataset)
            .map(|record| record.sample_id.clone())
            .collect::<BTreeSet<_>>();
        Ok(samples.into_iter().collect())
    }
}

fn ensure_dataset(tables: &Tables, dataset: DatasetId) -> Result<(), GenevizError> {
    if tables.datasets.contains_key(&dataset) {
        Ok(())
    } else {
        Err(GenevizError::Store(format!(
            "dataset {dataset} does not exist"
        )))
    }
}

fn insert_sequence(
    tables: &mut Tables,
    dataset: DatasetId,
    gene_name: &str,
    sequence: &str,
) -> SequenceRecord {
    let id = SequenceId::new(tables.next.sequence);
    tables.next.sequence += 1;
    let record = SequenceRecord {
        id,
        dataset,
        gene_name: gene_name.to_string(),
        sequence: sequence.to_string(),
    };
    tables
        .sequence_keys
        .insert((dataset, gene_name.to_string()), id);
    tables.sequences.insert(id, record.clone());
    record
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn caller(name: &str) -> Caller {
        name.parse().unwrap()
    }

    fn seeded() -> (MemoryStore, Dataset) {
        let store = MemoryStore::new();
        let project = store
            .get_or_create_project(&caller("alice"), "atlas")
            .unwrap();
        let dataset = store
            .create_dataset(NewDataset {
                project: project.id,
                name: "rna".to_string(),
                owner: Some(caller("alice")),
                is_default: false,
            })
            .unwrap();
        (store, dataset)
    }

    #[test]
    fn project_name_is_unique_per_owner() {
        let store = MemoryStore::new();
        let first = store.get_or_create_project(&caller("alice"), "atlas").unwrap();
        let again = store.get_or_create_project(&caller("alice"), "atlas").unwrap();
        let other = store.get_or_create_project(&caller("bob"), "atlas").unwrap();
        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn dataset_name_conflict_is_reported() {
        let (store, dataset) = seeded();
        let err = store
            .create_dataset(NewDataset {
                project: dataset.project,
                name: "rna".to_string(),
                owner: None,
                is_default: false,
            })
            .unwrap_err();
        assert_matches!(err, GenevizError::Conflict(_));
    }

    #[test]
    fn upsert_sequence_replaces_in_place() {
        let (store, dataset) = seeded();
        let first = store.upsert_sequence(dataset.id, "TP53", "MEEP").unwrap();
        let second = store.upsert_sequence(dataset.id, "TP53", "MEEPQ").unwrap();
        assert_eq!(first.id, second.id);
        let found = store
            .find_sequences(dataset.id, &["TP53".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sequence, "MEEPQ");
    }

    #[test]
    fn get_or_create_sequence_preserves_existing() {
        let (store, dataset) = seeded();
        store.upsert_sequence(dataset.id, "TP53", "MEEP").unwrap();
        let record = store.get_or_create_sequence(dataset.id, "TP53").unwrap();
        assert_eq!(record.sequence, "MEEP");
        let created = store.get_or_create_sequence(dataset.id, "BRCA1").unwrap();
        assert_eq!(created.sequence, "");
    }

    #[test]
    fn delete_dataset_cascades() {
        let (store, dataset) = seeded();
        let gene = store.upsert_sequence(dataset.id, "TP53", "MEEP").unwrap();
        store
            .upsert_expression(dataset.id, gene.id, "S1", 1.0)
            .unwrap();
        assert!(store.delete_dataset(dataset.id).unwrap());
        assert!(store.list_sample_ids(dataset.id).unwrap().is_empty());
        assert!(
            store
                .list_gene_names(dataset.id, None, 50)
                .unwrap()
                .is_empty()
        );
        let err = store.upsert_sequence(dataset.id, "TP53", "M").unwrap_err();
        assert_matches!(err, GenevizError::Store(_));
    }

    #[test]
    fn delete_project_cascades_to_datasets() {
        let (store, dataset) = seeded();
        store.upsert_sequence(dataset.id, "TP53", "MEEP").unwrap();
        assert!(store.delete_project(dataset.project).unwrap());
        let remaining = store
            .find_datasets(&DatasetFilter {
                id: Some(dataset.id),
                ..DatasetFilter::default()
            })
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn gene_names_are_filtered_case_insensitively() {
        let (store, dataset) = seeded();
        for gene in ["BRCA1", "BRCA2", "TP53"] {
            store.upsert_sequence(dataset.id, gene, "").unwrap();
        }
        let names = store.list_gene_names(dataset.id, Some("brc"), 50).unwrap();
        assert_eq!(names, ["BRCA1", "BRCA2"]);
        let limited = store.list_gene_names(dataset.id, None, 2).unwrap();
        assert_eq!(limited, ["BRCA1", "BRCA2"]);
    }
}
