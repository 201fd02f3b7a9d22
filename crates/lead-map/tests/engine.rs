use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lead_map::{
    MapError, MappingEngine, MappingOrigin, MatchStage, Matcher, SuggestionProvider, Unavailable,
    best_match, suggest_mapping,
};
use lead_model::{Category, Field, Table};
use proptest::prelude::*;

struct FixedProvider {
    reply: String,
    calls: Arc<AtomicUsize>,
}

impl FixedProvider {
    fn boxed(reply: &str) -> Box<dyn SuggestionProvider> {
        Box::new(Self {
            reply: reply.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

impl SuggestionProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn complete(&self, _prompt: &str) -> Result<String, Unavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

struct FailingProvider(Unavailable);

impl SuggestionProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn complete(&self, _prompt: &str) -> Result<String, Unavailable> {
        Err(self.0.clone())
    }
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
    let mut table = Table::new(cols(headers));
    for row in rows {
        table.push_row(cols(row));
    }
    table
}

#[test]
fn buyers_upload_without_provider() {
    let mapping = suggest_mapping(
        &cols(&["Email Address", "Purchase Date", "Total $"]),
        Category::Buyers,
        None,
    );
    insta::assert_json_snapshot!(mapping, @r#"
    {
      "Email Address": "email",
      "Purchase Date": "order_date",
      "Total $": "tax"
    }
    "#);
}

#[test]
fn invalid_and_null_suggestions_fall_back() {
    let engine = MappingEngine::new(Category::Buyers)
        .with_provider(FixedProvider::boxed(r#"{"A": "not_a_real_field", "B": null}"#));
    let result = engine.suggest(&cols(&["A", "B"]), None);

    assert_eq!(result.mapping.get("A"), Some(Field::Tax));
    assert_eq!(result.mapping.get("B"), Some(Field::JobTitle));
    assert_eq!(
        result.origin("A"),
        Some(MappingOrigin::Fallback(MatchStage::Default))
    );
    assert_eq!(result.confidence(), 0.0);
    assert_eq!(result.provider.as_deref(), Some("fixed"));
}

#[test]
fn valid_suggestions_are_kept_and_gaps_filled() {
    let reply = "Sure!\n```json\n{\"Email Address\": \"email\", \"Purchase Date\": \"visit_date\"}\n```";
    let engine = MappingEngine::new(Category::Buyers).with_provider(FixedProvider::boxed(reply));
    let result = engine.suggest(&cols(&["Email Address", "Purchase Date", "Total $"]), None);

    assert_eq!(result.origin("Email Address"), Some(MappingOrigin::Suggested));
    // visit_date is not a buyers field.
    assert_eq!(result.mapping.get("Purchase Date"), Some(Field::OrderDate));
    assert!(!result.origin("Purchase Date").unwrap().is_suggested());
    assert_eq!(result.mapping.get("Total $"), Some(Field::Tax));
    assert_eq!(result.confidence(), 33.3);
}

#[test]
fn full_suggestion_gives_full_confidence() {
    let engine = MappingEngine::new(Category::Visitors).with_provider(FixedProvider::boxed(
        r#"{"mail": "email", "seen": "visit_date"}"#,
    ));
    let result = engine.suggest(&cols(&["mail", "seen"]), None);
    assert_eq!(result.mapping.get("seen"), Some(Field::VisitDate));
    assert_eq!(result.confidence(), 100.0);
    assert_eq!(result.stage_counts().get(&MappingOrigin::Suggested), Some(&2));
}

#[test]
fn provider_failure_degrades_to_matcher() {
    for failure in [
        Unavailable::Timeout(std::time::Duration::from_secs(30)),
        Unavailable::Status {
            status: 503,
            body: "overloaded".into(),
        },
        Unavailable::EmptyResponse,
    ] {
        let engine =
            MappingEngine::new(Category::Buyers).with_provider(Box::new(FailingProvider(failure)));
        let result = engine.suggest(&cols(&["Email Address", "cell_no"]), None);
        assert_eq!(result.mapping.get("Email Address"), Some(Field::Email));
        assert_eq!(result.mapping.get("cell_no"), Some(Field::Phone));
        assert_eq!(result.suggested_count(), 0);
    }
}

#[test]
fn unparseable_reply_degrades_to_matcher() {
    let engine = MappingEngine::new(Category::Buyers)
        .with_provider(FixedProvider::boxed("I am unable to help with that."));
    let result = engine.suggest(&cols(&["email"]), None);
    assert_eq!(result.mapping.get("email"), Some(Field::Email));
    assert_eq!(
        result.origin("email"),
        Some(MappingOrigin::Fallback(MatchStage::Fuzzy))
    );
}

#[test]
fn empty_columns_skip_the_provider() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = FixedProvider {
        reply: "{}".into(),
        calls: Arc::clone(&calls),
    };
    let engine = MappingEngine::new(Category::Buyers).with_provider(Box::new(provider));
    let result = engine.suggest(&[], None);
    assert!(result.mapping.is_empty());
    assert_eq!(result.confidence(), 0.0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn provider_is_called_once_per_upload() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = FixedProvider {
        reply: "{}".into(),
        calls: Arc::clone(&calls),
    };
    let engine = MappingEngine::new(Category::Buyers).with_provider(Box::new(provider));
    engine.suggest(&cols(&["a", "b", "c"]), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn sample_rows_drive_content_sniffing() {
    let rows = table(
        &["contact_info", "notes"],
        &[
            &["user@domain.com", "555-123-4567"],
            &["", "555-987-6543"],
            &["other@domain.com", ""],
        ],
    );
    let columns = cols(&["contact_info", "notes", "missing_from_sample"]);

    let without = suggest_mapping(&columns, Category::Buyers, None);
    assert_eq!(without.get("contact_info"), Some(Field::Country));

    let result = MappingEngine::new(Category::Buyers).suggest(&columns, Some(&rows));
    assert_eq!(result.mapping.get("contact_info"), Some(Field::Email));
    assert_eq!(result.mapping.get("notes"), Some(Field::Phone));
    assert_eq!(
        result.origin("notes"),
        Some(MappingOrigin::Fallback(MatchStage::Content))
    );
    assert!(result.mapping.get("missing_from_sample").is_some());
}

#[test]
fn visitors_upload_maps_tracking_columns() {
    let mapping = suggest_mapping(
        &cols(&["utm_src", "Referrer URL", "Page URL", "Visit Date", "SHA256_PERSONAL_EMAIL"]),
        Category::Visitors,
        None,
    );
    insta::assert_json_snapshot!(mapping, @r#"
    {
      "utm_src": "utm_source",
      "Referrer URL": "referrer",
      "Page URL": "page_url",
      "Visit Date": "visit_date",
      "SHA256_PERSONAL_EMAIL": "email"
    }
    "#);
}

#[test]
fn duplicate_columns_keep_first_decision() {
    let result =
        MappingEngine::new(Category::Buyers).suggest(&cols(&["email", "State", "email"]), None);
    assert_eq!(result.mapping.len(), 2);
    assert_eq!(result.decisions.len(), 2);
    assert_eq!(
        result.mapping.columns().collect::<Vec<_>>(),
        vec!["email", "State"]
    );
}

#[test]
fn missing_required_lists_unmapped_required_fields() {
    let result = MappingEngine::new(Category::Buyers)
        .suggest(&cols(&["Email Address", "First Name"]), None);
    assert_eq!(
        result.missing_required(),
        vec![Field::OrderDate, Field::Revenue]
    );
}

#[test]
fn free_best_match_rejects_empty_candidates() {
    assert_eq!(best_match("x", &[], None), Err(MapError::NoCandidateFields));
    assert_eq!(
        best_match("cell_no", &[Field::Email, Field::Phone], None),
        Ok(Field::Phone)
    );
}

fn category() -> impl Strategy<Value = Category> {
    prop_oneof![Just(Category::Buyers), Just(Category::Visitors)]
}

proptest! {
    #[test]
    fn every_column_gets_a_field_of_its_category(
        columns in prop::collection::vec("[ -~]{0,24}", 0..12),
        category in category(),
    ) {
        let mapping = suggest_mapping(&columns, category, None);
        let mut distinct = columns.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(mapping.len(), distinct.len());
        for column in &columns {
            let field = mapping.get(column);
            prop_assert!(field.is_some_and(|field| category.fields().contains(field)));
        }
    }

    #[test]
    fn best_match_stays_within_candidates(
        column in "[ -~]{0,24}",
        picks in prop::collection::vec(0..Field::ALL.len(), 1..8),
        samples in prop::option::of(prop::collection::vec("[ -~]{0,16}", 0..6)),
    ) {
        let candidates: Vec<Field> = picks.iter().map(|idx| Field::ALL[*idx]).collect();
        let matcher = Matcher::new(&candidates).unwrap();
        let first = matcher.best_match(&column, samples.as_deref());
        let second = matcher.best_match(&column, samples.as_deref());
        prop_assert!(candidates.contains(&first));
        prop_assert_eq!(first, second);
    }
}

#[test]
fn exact_field_names_match_themselves() {
    for category in Category::ALL {
        let matcher = Matcher::for_category(category);
        for field in category.fields().candidates() {
            let outcome = matcher.explain(field.as_str(), None);
            assert_eq!(outcome.stage, MatchStage::Fuzzy);
            if field == Field::UtmCampaign {
                // "campaign" is enumerated first and already crosses the threshold.
                assert_eq!(outcome.field, Field::Campaign);
            } else {
                assert_eq!(outcome.field, field);
            }
        }
    }
}
