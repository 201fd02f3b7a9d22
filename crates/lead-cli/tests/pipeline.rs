//! Integration tests for the read-map-save pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use lead_cli::pipeline::{
    build_context, build_engine, load_saved_mapping, load_upload, locate_columns, map_upload,
    save_report, summarize_upload,
};
use lead_cli::types::{LocatedColumn, MappingSource};
use lead_ingest::{InMemorySummaryStore, NO_DATA_CONTEXT, ReadOptions, SummaryStore};
use lead_map::{ColumnRole, MappingOrigin, MappingRepository, MatchStage, SuggestionOptions};
use lead_model::{Category, ColumnMapping, Field};

const BUYERS_CSV: &str = "\
Email Address,Purchase Date,Order Total,Customer Name,state,Phone
a@x.com,2024-01-05,$120.50,Ann Lee,CA,555-123-4567
b@x.com,2024-01-06,$80,Bo Chan,NY,555-222-3333
c@x.com,2024-02-10,$42,Cy Diaz,CA,555-987-6543
";

fn write_upload(dir: &Path) -> PathBuf {
    let path = dir.join("buyers.csv");
    fs::write(&path, BUYERS_CSV).expect("write upload");
    path
}

#[test]
fn maps_buyers_upload_with_matcher_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_upload(dir.path());
    let upload = load_upload(&path, Category::Buyers, &ReadOptions::default()).expect("load");
    let engine = build_engine(Category::Buyers, None);
    assert!(!engine.has_provider());

    let report = map_upload(&upload, &engine);
    assert_eq!(report.rows, 3);
    assert_eq!(report.confidence, 0.0);
    assert!(report.missing_required.is_empty());
    assert!(report.result.provider.is_none());
    insta::assert_json_snapshot!(report.result.mapping, @r#"
    {
      "Email Address": "email",
      "Purchase Date": "order_date",
      "Order Total": "revenue",
      "Customer Name": "name",
      "state": "state",
      "Phone": "phone"
    }
    "#);
    assert_eq!(
        report.result.origin("Order Total"),
        Some(MappingOrigin::Fallback(MatchStage::Content))
    );
    assert_eq!(
        report.result.origin("Customer Name"),
        Some(MappingOrigin::Fallback(MatchStage::Keyword))
    );
    assert_eq!(
        report.result.origin("state"),
        Some(MappingOrigin::Fallback(MatchStage::Fuzzy))
    );
}

#[test]
fn missing_key_means_no_provider() {
    let options = SuggestionOptions::default().with_api_key(Some("   ".to_string()));
    let engine = build_engine(Category::Visitors, Some(&options));
    assert!(!engine.has_provider());
}

#[test]
fn missing_required_fields_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("visitors.csv");
    fs::write(&path, "email\na@x.com\n").expect("write upload");
    let upload = load_upload(&path, Category::Visitors, &ReadOptions::default()).expect("load");
    let report = map_upload(&upload, &build_engine(Category::Visitors, None));
    assert_eq!(report.missing_required, vec![Field::VisitDate]);
}

#[test]
fn saved_report_can_be_loaded_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_upload(dir.path());
    let upload = load_upload(&path, Category::Buyers, &ReadOptions::default()).expect("load");
    let mut report = map_upload(&upload, &build_engine(Category::Buyers, None));

    let repository = MappingRepository::new(dir.path().join("mappings")).expect("repository");
    let saved = save_report(&repository, "Acme Corp", &mut report).expect("save");
    assert_eq!(report.saved_to.as_deref(), Some(saved.as_path()));
    assert!(saved.ends_with("Acme%20Corp_buyers.json"));

    let loaded = repository
        .load("Acme Corp", Category::Buyers)
        .expect("load")
        .expect("stored mapping");
    assert_eq!(loaded, report.result.mapping);
}

#[test]
fn summaries_are_kept_per_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_upload(dir.path());
    let upload = load_upload(&path, Category::Buyers, &ReadOptions::default()).expect("load");
    let store = InMemorySummaryStore::default();

    let report = summarize_upload(&upload, "acme", &store, None);
    assert_eq!(report.summary.total_rows, 3);
    assert_eq!(report.summary.total_columns, 6);
    assert_eq!(store.get("acme", Category::Buyers), Some(report.summary));
    assert!(store.get("acme", Category::Visitors).is_none());
}

#[test]
fn report_roles_come_from_the_mapping() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_upload(dir.path());
    let upload = load_upload(&path, Category::Buyers, &ReadOptions::default()).expect("load");

    let located = locate_columns(&upload, None);
    assert_eq!(column_for(&located, ColumnRole::Email), Some("Email Address"));
    assert_eq!(column_for(&located, ColumnRole::Revenue), Some("Order Total"));
    assert_eq!(column_for(&located, ColumnRole::State), Some("state"));

    let report = summarize_upload(&upload, "acme", &InMemorySummaryStore::default(), None);
    assert_eq!(report.mapping_source, MappingSource::Matcher);
    assert_eq!(report.date_column.as_deref(), Some("Purchase Date"));
    assert_eq!(report.located, located);
}

#[test]
fn saved_mapping_drives_report_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_upload(dir.path());
    let upload = load_upload(&path, Category::Buyers, &ReadOptions::default()).expect("load");

    let repo_dir = dir.path().join("mappings");
    let confirmed: ColumnMapping = [
        ("Email Address".to_string(), Field::Email),
        ("Phone".to_string(), Field::Revenue),
    ]
    .into_iter()
    .collect();
    MappingRepository::new(&repo_dir)
        .expect("repository")
        .save("acme", Category::Buyers, &confirmed)
        .expect("save");

    let saved = load_saved_mapping(&repo_dir, "acme", Category::Buyers).expect("load saved");
    assert_eq!(saved.as_ref(), Some(&confirmed));
    let report = summarize_upload(
        &upload,
        "acme",
        &InMemorySummaryStore::default(),
        saved.as_ref(),
    );
    assert_eq!(report.mapping_source, MappingSource::Saved);
    assert_eq!(column_for(&report.located, ColumnRole::Revenue), Some("Phone"));
    assert_eq!(
        column_for(&report.located, ColumnRole::Email),
        Some("Email Address")
    );

    let other = load_saved_mapping(&repo_dir, "globex", Category::Buyers).expect("load other");
    assert!(other.is_none());
}

#[test]
fn missing_repository_is_not_created() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo_dir = dir.path().join("never-saved");
    let saved = load_saved_mapping(&repo_dir, "acme", Category::Buyers).expect("load saved");
    assert!(saved.is_none());
    assert!(!repo_dir.exists());
}

#[test]
fn question_context_covers_each_upload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let buyers_path = write_upload(dir.path());
    let visitors_path = dir.path().join("visitors.csv");
    fs::write(
        &visitors_path,
        "email,visit_date,source\na@x.com,2024-03-01,google\nb@x.com,2024-03-02,facebook\n",
    )
    .expect("write upload");
    let uploads = vec![
        load_upload(&visitors_path, Category::Visitors, &ReadOptions::default()).expect("load"),
        load_upload(&buyers_path, Category::Buyers, &ReadOptions::default()).expect("load"),
    ];

    let store = InMemorySummaryStore::default();
    assert_eq!(build_context(&[], "acme", &store), NO_DATA_CONTEXT);

    let context = build_context(&uploads, "acme", &store);
    assert!(context.starts_with("=== Buyers Data ===\nTotal Records: 3\nTotal Columns: 6\n"));
    assert!(context.contains("\n\n=== Visitors Data ===\nTotal Records: 2\n"));
    assert!(context.contains("Columns: email, visit_date, source\n"));
    assert!(store.get("acme", Category::Visitors).is_some());
}

fn column_for(located: &[LocatedColumn], role: ColumnRole) -> Option<&str> {
    located
        .iter()
        .find(|entry| entry.role == role)
        .map(|entry| entry.column.as_str())
}

#[test]
fn unreadable_upload_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.csv");
    let err = load_upload(&missing, Category::Buyers, &ReadOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("nope.csv"));
}
