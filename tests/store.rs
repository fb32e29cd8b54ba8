use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use geneviz::access::UploadTarget;
use geneviz::app::App;
use geneviz::domain::{Caller, NameList};
use geneviz::error::GenevizError;
use geneviz::store::{
    DatasetFilter, ExpressionFilter, MemoryStore, NewDataset, RecordStore, StoreLock,
};

fn temp_store_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("nested").join("store.json")).unwrap()
}

#[test]
fn snapshot_round_trip_keeps_rows_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_store_path(&dir);
    let alice: Caller = "alice".parse().unwrap();

    let store = MemoryStore::new();
    let project = store.get_or_create_project(&alice, "atlas").unwrap();
    let dataset = store
        .create_dataset(NewDataset {
            project: project.id,
            name: "rnaseq".to_string(),
            owner: Some(alice.clone()),
            is_default: false,
        })
        .unwrap();
    let gene = store.upsert_sequence(dataset.id, "TP53", "MEEP").unwrap();
    store
        .upsert_expression(dataset.id, gene.id, "S1", 4.5)
        .unwrap();
    store.save(&path).unwrap();

    let reopened = MemoryStore::open(&path).unwrap();
    let datasets = reopened.find_datasets(&DatasetFilter::default()).unwrap();
    assert_eq!(datasets, [dataset.clone()]);

    let genes = NameList::parse("TP53");
    let entries = reopened
        .find_expressions(&ExpressionFilter {
            dataset: dataset.id,
            genes: genes.as_slice(),
            samples: None,
        })
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].expression_value, 4.5);

    let next = reopened.upsert_sequence(dataset.id, "MYC", "MPL").unwrap();
    assert!(next.id > gene.id);

    let conflict = reopened
        .create_dataset(NewDataset {
            project: project.id,
            name: "rnaseq".to_string(),
            owner: Some(alice),
            is_default: false,
        })
        .unwrap_err();
    assert_matches!(conflict, GenevizError::Conflict(_));
}

#[test]
fn missing_snapshot_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::open(&temp_store_path(&dir)).unwrap();
    assert!(
        store
            .find_datasets(&DatasetFilter::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn corrupt_snapshot_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("store.json")).unwrap();
    std::fs::write(path.as_std_path(), b"{not json").unwrap();

    let err = MemoryStore::open(&path).unwrap_err();
    assert_matches!(err, GenevizError::Store(_));
    assert_eq!(err.category(), "store_error");
}

#[test]
fn save_leaves_no_temp_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("store.json")).unwrap();
    let store = MemoryStore::new();
    store.save(&path).unwrap();
    store.save(&path).unwrap();

    let entries = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(entries, ["store.json"]);
}

#[test]
fn locked_cycles_on_one_snapshot_keep_both_writers() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_store_path(&dir);
    let alice: Caller = "alice".parse().unwrap();
    let seed = MemoryStore::new();
    let project = seed.get_or_create_project(&alice, "atlas").unwrap().id;
    seed.save(&path).unwrap();

    let (path_ref, alice_ref) = (&path, &alice);
    std::thread::scope(|scope| {
        for (name, gene) in [("one", "A"), ("two", "B")] {
            scope.spawn(move || {
                let _lock = StoreLock::acquire(path_ref).unwrap();
                let app = App::new(MemoryStore::open(path_ref).unwrap());
                let upload = format!(">{gene}\nMK\n");
                app.upload_fasta(
                    alice_ref,
                    &UploadTarget::named(project, name),
                    upload.as_bytes(),
                )
                .unwrap();
                app.store().save(path_ref).unwrap();
            });
        }
    });

    let reopened = MemoryStore::open(&path).unwrap();
    let datasets = reopened.find_datasets(&DatasetFilter::default()).unwrap();
    let names = datasets
        .iter()
        .map(|dataset| dataset.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["one", "two"]);
    for (dataset, gene) in datasets.iter().zip(["A", "B"]) {
        let genes = vec![gene.to_string()];
        assert_eq!(reopened.find_sequences(dataset.id, &genes).unwrap().len(), 1);
    }
}

#[test]
fn store_lock_is_exclusive_until_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_store_path(&dir);
    let first = StoreLock::acquire(&path).unwrap();

    let (sender, receiver) = std::sync::mpsc::channel();
    let path_ref = &path;
    std::thread::scope(|scope| {
        scope.spawn(move || {
            let _second = StoreLock::acquire(path_ref).unwrap();
            sender.send(()).unwrap();
        });
        let waited = receiver.recv_timeout(std::time::Duration::from_millis(200));
        assert!(waited.is_err());
        drop(first);
        receiver
            .recv_timeout(std::time::Duration::from_secs(10))
            .unwrap();
    });
}
