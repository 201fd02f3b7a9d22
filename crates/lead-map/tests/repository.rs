use std::fs;

use chrono::DateTime;
use lead_map::{MappingRepository, StoredMapping};
use lead_model::{Category, ColumnMapping, Field};

fn sample_mapping() -> ColumnMapping {
    [
        ("Email Address".to_string(), Field::Email),
        ("Purchase Date".to_string(), Field::OrderDate),
        ("Total $".to_string(), Field::Revenue),
    ]
    .into_iter()
    .collect()
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");

    let path = repo
        .save("42", Category::Buyers, &sample_mapping())
        .expect("save mapping");
    assert!(path.ends_with("42_buyers.json"));
    assert!(repo.exists("42", Category::Buyers));
    assert!(!repo.exists("42", Category::Visitors));

    let loaded = repo
        .load("42", Category::Buyers)
        .expect("load mapping")
        .expect("mapping should exist");
    assert_eq!(loaded, sample_mapping());
    assert_eq!(
        loaded.columns().collect::<Vec<_>>(),
        vec!["Email Address", "Purchase Date", "Total $"]
    );
}

#[test]
fn stored_mapping_carries_timestamp_and_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    repo.save("acme", Category::Visitors, &sample_mapping())
        .expect("save mapping");

    let stored = repo
        .load_stored("acme", Category::Visitors)
        .expect("load stored")
        .expect("stored should exist");
    assert_eq!(stored.version, "1.0");
    assert_eq!(stored.category, Category::Visitors);
    let saved_at = stored.saved_at.expect("timestamp");
    assert!(DateTime::parse_from_rfc3339(&saved_at).is_ok());
}

#[test]
fn save_replaces_previous_mapping() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    repo.save("7", Category::Buyers, &sample_mapping())
        .expect("first save");

    let replacement: ColumnMapping = [("mail".to_string(), Field::Email)].into_iter().collect();
    repo.save("7", Category::Buyers, &replacement)
        .expect("second save");

    let loaded = repo.load("7", Category::Buyers).unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get("mail"), Some(Field::Email));
    assert_eq!(loaded.get("Email Address"), None);
}

#[test]
fn missing_mapping_loads_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    assert!(repo.load("nobody", Category::Buyers).unwrap().is_none());
    assert!(!repo.delete("nobody", Category::Buyers).unwrap());
}

#[test]
fn list_is_sorted_and_skips_foreign_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    repo.save("b", Category::Visitors, &sample_mapping()).unwrap();
    repo.save("a", Category::Visitors, &sample_mapping()).unwrap();
    repo.save("a", Category::Buyers, &sample_mapping()).unwrap();
    fs::write(dir.path().join("notes.json"), "{\"hello\": 1}").unwrap();
    fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

    let listed = repo.list().expect("list");
    let keys: Vec<(String, Category)> = listed
        .iter()
        .map(|meta| (meta.workspace_id.clone(), meta.category))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("a".to_string(), Category::Buyers),
            ("a".to_string(), Category::Visitors),
            ("b".to_string(), Category::Visitors),
        ]
    );
    assert!(listed.iter().all(|meta| meta.column_count == 3));
}

#[test]
fn delete_and_load_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    repo.save("w", Category::Buyers, &sample_mapping()).unwrap();
    repo.save("w", Category::Visitors, &sample_mapping()).unwrap();

    assert_eq!(repo.load_workspace("w").unwrap().len(), 2);
    assert!(repo.delete("w", Category::Visitors).unwrap());
    let remaining = repo.load_workspace("w").unwrap();
    assert_eq!(remaining.keys().copied().collect::<Vec<_>>(), vec![Category::Buyers]);
}

#[test]
fn stored_json_is_readable_by_hand() {
    let stored = StoredMapping {
        workspace_id: "w".into(),
        category: Category::Buyers,
        mapping: sample_mapping(),
        saved_at: None,
        version: "1.0".into(),
    };
    insta::assert_json_snapshot!(stored, @r#"
    {
      "workspace_id": "w",
      "category": "buyers",
      "mapping": {
        "Email Address": "email",
        "Purchase Date": "order_date",
        "Total $": "revenue"
      },
      "saved_at": null,
      "version": "1.0"
    }
    "#);
}

#[test]
fn workspaces_with_similar_ids_stay_separate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    let acme: ColumnMapping = [("Email".to_string(), Field::Email)].into_iter().collect();
    let other: ColumnMapping = [("Phone".to_string(), Field::Phone)].into_iter().collect();

    let first = repo.save("Acme Co", Category::Buyers, &acme).unwrap();
    let second = repo.save("acme-co", Category::Buyers, &other).unwrap();
    assert_ne!(first, second);

    let stored = repo
        .load_stored("Acme Co", Category::Buyers)
        .unwrap()
        .expect("Acme Co mapping");
    assert_eq!(stored.workspace_id, "Acme Co");
    assert_eq!(stored.mapping, acme);
    assert_eq!(repo.load("acme-co", Category::Buyers).unwrap(), Some(other));
    assert_eq!(repo.list().unwrap().len(), 2);

    assert!(repo.delete("acme-co", Category::Buyers).unwrap());
    assert_eq!(repo.load("Acme Co", Category::Buyers).unwrap(), Some(acme));
}

#[test]
fn file_recorded_for_another_workspace_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("create repo");
    let path = repo.save("w", Category::Buyers, &sample_mapping()).unwrap();

    let mut stored = repo.load_stored("w", Category::Buyers).unwrap().unwrap();
    stored.workspace_id = "intruder".into();
    fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();

    assert!(repo.load_stored("w", Category::Buyers).unwrap().is_none());
}
