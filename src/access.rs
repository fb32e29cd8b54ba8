//! Which dataset a caller may read or write.
//!
//! A dataset is accessible when the caller owns it or it is flagged default.
//! Every resolution failure, whether the row is absent or merely hidden, is
//! the same [`GenevizError::NotFoundOrUnauthorized`].

use serde::Deserialize;

use crate::domain::{Caller, Dataset, DatasetId, Project, ProjectId};
use crate::error::GenevizError;
use crate::store::{DatasetFilter, NewDataset, RecordStore};

pub fn resolve_dataset<S: RecordStore + ?Sized>(
    store: &S,
    caller: &Caller,
    dataset: DatasetId,
    project: Option<ProjectId>,
) -> Result<Dataset, GenevizError> {
    let filter = DatasetFilter {
        id: Some(dataset),
        project,
        name: None,
        visible_to: Some(caller.clone()),
    };
    store
        .find_datasets(&filter)?
        .into_iter()
        .next()
        .ok_or(GenevizError::NotFoundOrUnauthorized)
}

/// Project owned by `caller`; anything else is reported as not found.
pub fn resolve_owned_project<S: RecordStore + ?Sized>(
    store: &S,
    caller: &Caller,
    project: ProjectId,
) -> Result<Project, GenevizError> {
    store
        .find_project(project, caller)?
        .ok_or(GenevizError::NotFoundOrUnauthorized)
}

/// Upload request fields naming the target dataset: either `dataset_id`, or
/// `project_id` together with `dataset_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadTarget {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
    #[serde(default)]
    pub dataset_name: Option<String>,
}

impl UploadTarget {
    pub fn dataset(id: DatasetId) -> Self {
        Self {
            dataset_id: Some(id),
            ..Self::default()
        }
    }

    pub fn named(project: ProjectId, name: impl Into<String>) -> Self {
        Self {
            project_id: Some(project),
            dataset_name: Some(name.into()),
            ..Self::default()
        }
    }
}

pub fn provision_for_upload<S: RecordStore + ?Sized>(
    store: &S,
    caller: &Caller,
    target: &UploadTarget,
) -> Result<Dataset, GenevizError> {
    if let Some(dataset) = target.dataset_id {
        return resolve_dataset(store, caller, dataset, target.project_id);
    }

    let name = target
        .dataset_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let (Some(project), Some(name)) = (target.project_id, name) else {
        return Err(GenevizError::InvalidRequest(
            "provide dataset_id or (project_id and dataset_name)".to_string(),
        ));
    };

    let project = resolve_owned_project(store, caller, project)?;
    get_or_create_dataset(store, caller, &project, name)
}

/// Creates `name` under `project` owned by `caller`, or returns the dataset
/// that already holds that name. A unique-key conflict from a concurrent
/// identical request resolves to the row that request created.
pub fn get_or_create_dataset<S: RecordStore + ?Sized>(
    store: &S,
    caller: &Caller,
    project: &Project,
    name: &str,
) -> Result<Dataset, GenevizError> {
    let created = store.create_dataset(NewDataset {
        project: project.id,
        name: name.to_string(),
        owner: Some(caller.clone()),
        is_default: false,
    });
    match created {
        Ok(dataset) => {
            tracing::info!(dataset = %dataset.id, project = %project.id, name, "dataset created");
            Ok(dataset)
        }
        Err(GenevizError::Conflict(_)) => {
            let filter = DatasetFilter {
                project: Some(project.id),
                name: Some(name.to_string()),
                ..DatasetFilter::default()
            };
            store
                .find_datasets(&filter)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    GenevizError::Store(format!(
                        "dataset {name:?} conflicted but could not be read back"
                    ))
                })
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::store::MemoryStore;

    fn caller(name: &str) -> Caller {
        name.parse().unwrap()
    }

    #[test]
    fn blank_dataset_name_is_invalid() {
        let store = MemoryStore::new();
        let project = store.get_or_create_project(&caller("alice"), "p").unwrap();
        let err = provision_for_upload(
            &store,
            &caller("alice"),
            &UploadTarget::named(project.id, "   "),
        )
        .unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
    }

    #[test]
    fn missing_project_is_invalid() {
        let store = MemoryStore::new();
        let target = UploadTarget {
            dataset_name: Some("rna".to_string()),
            ..UploadTarget::default()
        };
        let err = provision_for_upload(&store, &caller("alice"), &target).unwrap_err();
        assert_matches!(err, GenevizError::InvalidRequest(_));
    }

    #[test]
    fn existing_name_resolves_to_existing_dataset() {
        let store = MemoryStore::new();
        let alice = caller("alice");
        let project = store.get_or_create_project(&alice, "p").unwrap();
        let first = get_or_create_dataset(&store, &alice, &project, "rna").unwrap();
        let second = get_or_create_dataset(&store, &alice, &project, "rna").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.owner, Some(alice));
    }
}
