use chrono::Utc;
use serde::Serialize;

use crate::access::{self, UploadTarget};
use crate::domain::{
    Caller, Dataset, DatasetId, ExpressionEntry, NameList, Project, ProjectId, SequenceEntry,
};
use crate::error::GenevizError;
use crate::fasta;
use crate::matrix::{self, ExpressionMatrix};
use crate::store::{DatasetFilter, ExpressionFilter, RecordStore};
use crate::tsv;

pub const DEFAULT_GENE_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

impl From<Project> for ProjectSummary {
    fn from(value: Project) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    pub is_default: bool,
    pub project: ProjectId,
}

impl From<Dataset> for DatasetSummary {
    fn from(value: Dataset) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_default: value.is_default,
            project: value.project,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub status: String,
    pub dataset_id: DatasetId,
    pub records: usize,
    pub values: usize,
    pub skipped_values: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaExport {
    pub filename: String,
    pub content: String,
}

/// Caller-scoped operations over a record store.
///
/// Every read goes through [`access::resolve_dataset`]; every upload through
/// [`access::provision_for_upload`].
#[derive(Debug, Clone)]
pub struct App<S: RecordStore> {
    store: S,
    gene_list_limit: usize,
}

impl<S: RecordStore> App<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            gene_list_limit: DEFAULT_GENE_LIST_LIMIT,
        }
    }

    pub fn with_gene_list_limit(mut self, limit: usize) -> Self {
        self.gene_list_limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list_projects(&self, caller: &Caller) -> Result<Vec<ProjectSummary>, GenevizError> {
        Ok(self
            .store
            .list_projects(caller)?
            .into_iter()
            .map(ProjectSummary::from)
            .collect())
    }

    pub fn create_project(
        &self,
        caller: &Caller,
        name: &str,
    ) -> Result<ProjectSummary, GenevizError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GenevizError::InvalidRequest("name required".to_string()));
        }
        let project = self.store.get_or_create_project(caller, name)?;
        Ok(project.into())
    }

    /// Datasets the caller owns plus every default dataset, ordered by
    /// (project, name).
    pub fn list_datasets(
        &self,
        caller: &Caller,
        project: Option<ProjectId>,
    ) -> Result<Vec<DatasetSummary>, GenevizError> {
        let filter = DatasetFilter {
            project,
            visible_to: Some(caller.clone()),
            ..DatasetFilter::default()
        };
        Ok(self
            .store
            .find_datasets(&filter)?
            .into_iter()
            .map(DatasetSummary::from)
            .collect())
    }

    pub fn create_dataset(
        &self,
        caller: &Caller,
        project: ProjectId,
        name: &str,
    ) -> Result<DatasetSummary, GenevizError> {
        let target = UploadTarget::named(project, name);
        Ok(access::provision_for_upload(&self.store, caller, &target)?.into())
    }

    /// Administrative: flags a dataset as readable by every caller (or not).
    pub fn mark_default(
        &self,
        dataset: DatasetId,
        is_default: bool,
    ) -> Result<DatasetSummary, GenevizError> {
        let updated = self
            .store
            .set_dataset_default(dataset, is_default)?
            .ok_or(GenevizError::NotFoundOrUnauthorized)?;
        tracing::info!(dataset = %dataset, is_default, "dataset visibility changed");
        Ok(updated.into())
    }

    /// Administrative: deletes a dataset and everything stored under it.
    pub fn delete_dataset(&self, dataset: DatasetId) -> Result<(), GenevizError> {
        if !self.store.delete_dataset(dataset)? {
            return Err(GenevizError::NotFoundOrUnauthorized);
        }
        tracing::info!(dataset = %dataset, "dataset deleted");
        Ok(())
    }

    pub fn sequences(
        &self,
        caller: &Caller,
        dataset: DatasetId,
        project: Option<ProjectId>,
        genes: &NameList,
    ) -> Result<Vec<SequenceEntry>, GenevizError> {
        let dataset = access::resolve_dataset(&self.store, caller, dataset, project)?;
        Ok(self
            .store
            .find_sequences(dataset.id, genes.as_slice())?
            .into_iter()
            .map(SequenceEntry::from)
            .collect())
    }

    pub fn expression(
        &self,
        caller: &Caller,
        dataset: DatasetId,
        project: Option<ProjectId>,
        genes: &NameList,
        samples: Option<&NameList>,
    ) -> Result<Vec<ExpressionEntry>, GenevizError> {
        let dataset = access::resolve_dataset(&self.store, caller, dataset, project)?;
        self.store.find_expressions(&ExpressionFilter {
            dataset: dataset.id,
            genes: genes.as_slice(),
            samples: samples.map(NameList::as_slice),
        })
    }

    /// Sorted gene names, optionally filtered by a case-insensitive substring.
    pub fn genes(
        &self,
        caller: &Caller,
        dataset: DatasetId,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<String>, GenevizError> {
        let dataset = access::resolve_dataset(&self.store, caller, dataset, None)?;
        let query = query.map(str::trim).filter(|query| !query.is_empty());
        self.store.list_gene_names(
            dataset.id,
            query,
            limit.unwrap_or(self.gene_list_limit),
        )
    }

    pub fn samples(
        &self,
        caller: &Caller,
        dataset: DatasetId,
        project: Option<ProjectId>,
    ) -> Result<Vec<String>, GenevizError> {
        let dataset = access::resolve_dataset(&self.store, caller, dataset, project)?;
        self.store.list_sample_ids(dataset.id)
    }

    pub fn matrix(
        &self,
        caller: &Caller,
        dataset: DatasetId,
        project: Option<ProjectId>,
        genes: &NameList,
    ) -> Result<ExpressionMatrix, GenevizError> {
        let dataset = access::resolve_dataset(&self.store, caller, dataset, project)?;
        matrix::assemble_matrix(&self.store, &dataset, genes)
    }

    pub fn export_fasta(
        &self,
        caller: &Caller,
        dataset: DatasetId,
        project: Option<ProjectId>,
        genes: &NameList,
    ) -> Result<FastaExport, GenevizError> {
        let dataset = access::resolve_dataset(&self.store, caller, dataset, project)?;
        let content = fasta::export_fasta(&self.store, &dataset, genes)?;
        tracing::info!(dataset = %dataset.id, genes = genes.len(), "fasta exported");
        Ok(FastaExport {
            filename: fasta::export_filename(dataset.id, Utc::now()),
            content,
        })
    }

    pub fn upload_fasta(
        &self,
        caller: &Caller,
        target: &UploadTarget,
        bytes: &[u8],
    ) -> Result<UploadSummary, GenevizError> {
        let dataset = access::provision_for_upload(&self.store, caller, target)?;
        let stats = fasta::ingest_fasta(&self.store, dataset.id, bytes)?;
        tracing::info!(dataset = %dataset.id, records = stats.records, "fasta imported");
        Ok(UploadSummary {
            status: format!("FASTA imported into dataset {}", dataset.id),
            dataset_id: dataset.id,
            records: stats.records,
            values: 0,
            skipped_values: 0,
        })
    }

    pub fn upload_tsv(
        &self,
        caller: &Caller,
        target: &UploadTarget,
        bytes: &[u8],
    ) -> Result<UploadSummary, GenevizError> {
        let dataset = access::provision_for_upload(&self.store, caller, target)?;
        let stats = tsv::ingest_tsv(&self.store, dataset.id, bytes)?;
        tracing::info!(
            dataset = %dataset.id,
            records = stats.records,
            values = stats.values,
            skipped = stats.skipped_values,
            "tsv imported"
        );
        Ok(UploadSummary {
            status: format!("TSV imported into dataset {}", dataset.id),
            dataset_id: dataset.id,
            records: stats.records,
            values: stats.values,
            skipped_values: stats.skipped_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn create_project_requires_name() {
        let app = App::new(MemoryStore::new());
        let alice: Caller = "alice".parse().unwrap();
        let err = app.create_project(&alice, "  ").unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
    }

    #[test]
    fn upload_into_new_dataset_reports_status() {
        let app = App::new(MemoryStore::new());
        let alice: Caller = "alice".parse().unwrap();
        let project = app.create_project(&alice, "atlas").unwrap();
        let summary = app
            .upload_fasta(
                &alice,
                &UploadTarget::named(project.id, "proteins"),
                b">TP53\nMEEP\n",
            )
            .unwrap();
        assert_eq!(
            summary.status,
            format!("FASTA imported into dataset {}", summary.dataset_id)
        );
        assert_eq!(summary.records, 1);
    }
}
