mod common;

use std::cell::RefCell;
use std::rc::Rc;

use credibility_report::store::{AssessmentStore, FileStorage, MemoryStorage, Storage};
use credibility_report::{Comment, Error, MatrixDefinition, source_id};
use proptest::prelude::*;

fn memory_store() -> AssessmentStore<MemoryStorage> {
    AssessmentStore::open(MemoryStorage::new(), MatrixDefinition::default()).unwrap()
}

fn note(text: &str) -> (String, String) {
    (String::new(), text.to_string())
}

#[test]
fn deleting_first_of_two_sources_drops_old_second_comments() {
    let mut store = memory_store();
    store.add_source("First", common::created_at(1)).unwrap();
    store.add_source("Second", common::created_at(2)).unwrap();
    for key in ["004.1.1", "004.2.1", "004.2.3"] {
        let (title, content) = note(key);
        store.set_text(key, &title, &content).unwrap();
    }

    let removed = store.delete_source("004.1").unwrap();
    assert_eq!(removed.title, "First");

    assert_eq!(store.sources().len(), 1);
    assert_eq!(store.sources()[0].id, "004.1");
    assert_eq!(store.sources()[0].title, "Second");
    assert!(store.comments().keys().all(|k| !k.starts_with("004.")));
}

#[test]
fn deleting_middle_source_keeps_lower_keys_in_place() {
    let mut store = memory_store();
    for title in ["A", "B", "C"] {
        store.add_source(title, common::created_at(3)).unwrap();
    }
    store.set_text("004.1.1", "", "a").unwrap();
    store.set_text("004.2.1", "", "b").unwrap();
    store.set_text("004.3.4", "", "c").unwrap();
    store.set_text("L1-001.1", "", "fixed").unwrap();

    store.delete_source("004.2").unwrap();

    let ids: Vec<&str> = store.sources().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["004.1", "004.2"]);
    let titles: Vec<&str> = store.sources().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["A", "C"]);

    let keys: Vec<&str> = store.comments().keys().map(String::as_str).collect();
    assert_eq!(keys, ["004.1.1", "L1-001.1"]);
}

#[test]
fn deleting_first_of_three_never_shifts_comments_onto_another_source() {
    let mut store = memory_store();
    for title in ["A", "B", "C"] {
        store.add_source(title, common::created_at(2)).unwrap();
    }
    store.set_text("004.2.1", "", "about B").unwrap();
    store.set_text("004.3.2", "", "about C").unwrap();

    store.delete_source("004.1").unwrap();

    let titles: Vec<&str> = store.sources().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["B", "C"]);
    // B is now 004.1 and C is 004.2; neither may show the other's note.
    assert!(store.comment("004.2.1").is_none());
    assert!(store.comments().is_empty());
}

#[test]
fn unknown_source_is_reported() {
    let mut store = memory_store();
    assert!(matches!(
        store.delete_source("004.1"),
        Err(Error::UnknownSource(_))
    ));
    assert!(matches!(
        store.rename_source("004.7", "x"),
        Err(Error::UnknownSource(_))
    ));
}

#[test]
fn quota_failure_keeps_in_memory_change() {
    let storage = MemoryStorage::with_quota(120);
    let mut store = AssessmentStore::open(storage, MatrixDefinition::default()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(move |state| sink.borrow_mut().push(state.comments.len()));

    store.set_rating("L1-001.1", Some(3)).unwrap();
    let long = "x".repeat(500);
    let err = store.set_text("L1-001.2", "", &long).unwrap_err();
    assert!(matches!(err, Error::StorageQuota { limit: 120, .. }));

    assert_eq!(store.comment("L1-001.2").unwrap().content, long);
    assert_eq!(*seen.borrow(), [1, 2]);
    // The last successful write still holds only the first comment.
    let persisted = store.storage().load().unwrap().unwrap();
    assert_eq!(persisted.comments.len(), 1);
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut store =
            AssessmentStore::open(FileStorage::new(&path), MatrixDefinition::default()).unwrap();
        store.add_source("Wire service", common::created_at(4)).unwrap();
        store.set_rating("004.1.3", Some(5)).unwrap();
        store.add_image("L2-003.1", common::png_attachment("p.png", 4, 4)).unwrap();
    }

    let store = AssessmentStore::open(FileStorage::new(&path), MatrixDefinition::default()).unwrap();
    assert_eq!(store.sources()[0].title, "Wire service");
    assert_eq!(store.sources()[0].created_at, common::created_at(4));
    assert_eq!(store.comment("004.1.3").unwrap().rating, Some(5));
    assert_eq!(store.comment("L2-003.1").unwrap().images.len(), 1);
}

#[test]
fn failed_import_leaves_state_untouched() {
    let mut store = memory_store();
    store.set_text("L1-001.1", "kept", "").unwrap();
    assert!(matches!(
        store.import(r#"{"version":"9.9"}"#),
        Err(Error::InvalidImport(_))
    ));
    assert_eq!(store.comment("L1-001.1").unwrap().title, "kept");

    store.import(r#"{"L1-002.1":{"title":"legacy"}}"#).unwrap();
    assert!(store.comment("L1-001.1").is_none());
    assert_eq!(store.comment("L1-002.1").unwrap().title, "legacy");
    assert!(store.sources().is_empty());
}

#[test]
fn removing_last_image_of_image_only_comment_deletes_it() {
    let mut store = memory_store();
    store.add_image("L1-002.2", common::png_attachment("a.png", 2, 2)).unwrap();
    let removed = store.remove_image("L1-002.2", 0).unwrap().unwrap();
    assert_eq!(removed.name, "a.png");
    assert!(store.comment("L1-002.2").is_none());
}

#[test]
fn report_context_is_a_snapshot() {
    let mut store = memory_store();
    store.set_text("L1-001.1", "before", "").unwrap();
    let ctx = store.report_context();
    store.set_text("L1-001.1", "after", "").unwrap();
    assert_eq!(
        ctx.comments["L1-001.1"],
        Comment {
            title: "before".into(),
            ..Default::default()
        }
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn source_ids_stay_contiguous(
        count in 1usize..8,
        deletions in proptest::collection::vec(0usize..8, 0..8),
    ) {
        let mut store = memory_store();
        for i in 0..count {
            store.add_source(&format!("S{i}"), common::created_at(1)).unwrap();
            store.set_text(&format!("{}.1", source_id(i + 1)), "", &format!("S{i}")).unwrap();
        }
        let mut expected: Vec<String> = (0..count).map(|i| format!("S{i}")).collect();

        for pick in deletions {
            if expected.is_empty() {
                break;
            }
            let index = pick % expected.len();
            store.delete_source(&source_id(index + 1)).unwrap();
            expected.remove(index);

            let ids: Vec<String> = store.sources().iter().map(|s| s.id.clone()).collect();
            let want: Vec<String> = (1..=expected.len()).map(source_id).collect();
            prop_assert_eq!(ids, want);
            let titles: Vec<String> = store.sources().iter().map(|s| s.title.clone()).collect();
            prop_assert_eq!(&titles, &expected);

            for (key, comment) in store.comments() {
                let (ordinal, _) = credibility_report::parse_source_cell(key).unwrap();
                prop_assert!(ordinal <= expected.len(), "orphaned key {}", key);
                // A surviving comment still belongs to the source it was written for.
                prop_assert_eq!(&comment.content, &expected[ordinal - 1]);
            }
        }
    }
}
