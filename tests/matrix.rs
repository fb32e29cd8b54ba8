use assert_matches::assert_matches;

use geneviz::access::UploadTarget;
use geneviz::app::App;
use geneviz::domain::{Caller, DatasetId, NameList};
use geneviz::error::GenevizError;
use geneviz::store::MemoryStore;

fn seeded() -> (App<MemoryStore>, Caller, DatasetId) {
    let app = App::new(MemoryStore::new());
    let alice: Caller = "alice".parse().unwrap();
    let project = app.create_project(&alice, "atlas").unwrap();
    let summary = app
        .upload_tsv(
            &alice,
            &UploadTarget::named(project.id, "rnaseq"),
            b"gene\ts1\ts2\ng1\t5\t3\ng2\t7\t\n",
        )
        .unwrap();
    (app, alice, summary.dataset_id)
}

#[test]
fn missing_cells_are_zero_filled() {
    let (app, alice, dataset) = seeded();
    let matrix = app
        .matrix(&alice, dataset, None, &NameList::parse("g2,g1"))
        .unwrap();

    assert_eq!(matrix.genes().collect::<Vec<_>>(), ["g1", "g2"]);
    assert_eq!(matrix.samples().collect::<Vec<_>>(), ["s1", "s2"]);
    assert_eq!(matrix.get("g2", "s2"), Some(0.0));
    assert_eq!(matrix.to_tsv(), "gene_name\ts1\ts2\ng1\t5\t3\ng2\t7\t0\n");

    let json = serde_json::to_value(&matrix).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "g1": { "s1": 5.0, "s2": 3.0 },
            "g2": { "s1": 7.0, "s2": 0.0 },
        })
    );
}

#[test]
fn genes_without_values_are_no_data() {
    let (app, alice, dataset) = seeded();
    let err = app
        .matrix(&alice, dataset, None, &NameList::parse("unknown"))
        .unwrap_err();
    assert_matches!(err, GenevizError::NoData);
    assert_eq!(err.category(), "no_data");
}

#[test]
fn matrix_requires_access() {
    let (app, _alice, dataset) = seeded();
    let bob: Caller = "bob".parse().unwrap();
    let err = app
        .matrix(&bob, dataset, None, &NameList::parse("g1"))
        .unwrap_err();
    assert_matches!(err, GenevizError::NotFoundOrUnauthorized);
}

#[test]
fn default_dataset_matrix_is_shared() {
    let (app, _alice, dataset) = seeded();
    app.mark_default(dataset, true).unwrap();
    let bob: Caller = "bob".parse().unwrap();
    let matrix = app
        .matrix(&bob, dataset, None, &NameList::parse("g1"))
        .unwrap();
    assert_eq!(matrix.get("g1", "s1"), Some(5.0));
}
