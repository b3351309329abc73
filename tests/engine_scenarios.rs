// Integration tests for the listing view-state engine.
// Covers the filter/sort/paginate pipeline end to end through the public API.

use housing_board::engine::{derive, matches, ViewState};
use housing_board::validation::is_valid_contact;
use housing_board::{
    search_highlight, CountPolicy, FilterPatch, ListingEngine, ListingId, ListingRecord,
    OwnerScope, SortKey,
};

fn listing(id: i64, title: &str, location: &str, price: f64, bedrooms: Option<u32>) -> ListingRecord {
    ListingRecord {
        id: ListingId::Number(id),
        title: title.to_string(),
        location: location.to_string(),
        contact: "555-1234".to_string(),
        price: Some(price),
        bedrooms,
        bathrooms: Some(1.0),
        description: String::new(),
        image_url: None,
        owner_id: None,
        created_at: None,
    }
}

/// Ten listings, two of which mention "playa"
fn ten_listings() -> Vec<ListingRecord> {
    let mut records: Vec<ListingRecord> = (1..=10)
        .map(|i| listing(i, &format!("Depto {}", i), "Centro", 100.0 * i as f64, Some((i % 4) as u32 + 1)))
        .collect();
    records[2].title = "Frente a la Playa".to_string();
    records[7].description = "A metros de la playa".to_string();
    records
}

fn ids<'a>(records: impl Iterator<Item = &'a ListingRecord>) -> Vec<i64> {
    records
        .map(|r| match r.id {
            ListingId::Number(n) => n,
            ListingId::Text(_) => panic!("unexpected text id"),
        })
        .collect()
}

#[test]
fn test_first_page_of_ten_without_filters() {
    let mut engine = ListingEngine::new(6);
    engine.load_all(ten_listings());

    let view = engine.view();
    assert_eq!(ids(view.records()), vec![1, 2, 3, 4, 5, 6]);
    assert!(view.pagination.has_next);
    assert!(!view.pagination.has_prev);
    assert_eq!(view.pagination.total_pages, 2);
    assert_eq!(view.pagination.page_numbers, vec![1, 2]);
}

#[test]
fn test_search_with_raw_count_keeps_unfiltered_pagination() {
    let mut engine = ListingEngine::with_count_policy(6, CountPolicy::Raw);
    engine.load_all(ten_listings());
    engine.set_filters(FilterPatch::default().search("PLAYA"));

    let view = engine.view();
    assert_eq!(ids(view.records()), vec![3, 8]);
    assert_eq!(view.pagination.total_count, 10);
    assert_eq!(view.pagination.total_pages, 2);
    assert_eq!(view.matched_count, 2);
}

#[test]
fn test_search_with_filtered_count() {
    let mut engine = ListingEngine::new(6);
    engine.load_all(ten_listings());
    engine.set_filters(FilterPatch::default().search("playa"));

    let view = engine.view();
    assert_eq!(ids(view.records()), vec![3, 8]);
    assert_eq!(view.pagination.total_count, 2);
    assert_eq!(view.pagination.total_pages, 1);
    assert!(!view.pagination.has_next);
}

#[test]
fn test_price_descending_keeps_ties_in_order() {
    let prices = [100.0, 300.0, 100.0, 50.0, 200.0];
    let records: Vec<ListingRecord> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| listing(i as i64 + 1, "Depto", "Centro", *p, Some(1)))
        .collect();

    let mut engine = ListingEngine::new(6);
    engine.load_all(records);
    engine.set_sort(SortKey::PriceDesc);

    let view = engine.view();
    let sorted: Vec<f64> = view.records().map(|r| r.price.unwrap()).collect();
    assert_eq!(sorted, vec![300.0, 200.0, 100.0, 100.0, 50.0]);
    assert_eq!(ids(view.records()), vec![2, 5, 1, 3, 4]);
}

#[test]
fn test_mine_without_user_shows_nothing() {
    let mut records = ten_listings();
    for record in &mut records {
        record.owner_id = Some("someone".to_string());
    }

    let mut engine = ListingEngine::new(6);
    engine.load_all(records);
    engine.set_filters(FilterPatch::default().scope(OwnerScope::Mine));

    assert!(engine.view().is_empty());
    assert_eq!(engine.view().pagination.total_pages, 0);
}

#[test]
fn test_absent_bedrooms_fail_minimum() {
    let records = vec![
        listing(1, "Sin datos", "Centro", 100.0, None),
        listing(2, "Tres ambientes", "Centro", 100.0, Some(3)),
        listing(3, "Monoambiente", "Centro", 100.0, Some(1)),
    ];

    let mut engine = ListingEngine::new(6);
    engine.load_all(records);
    engine.set_filters(FilterPatch::default().min_bedrooms(3));

    assert_eq!(ids(engine.view().records()), vec![2]);
}

#[test]
fn test_contact_validator_shapes() {
    assert!(!is_valid_contact("abc"));
    assert!(is_valid_contact("555-1234"));
    assert!(is_valid_contact("a@b.com"));
}

#[test]
fn test_visible_page_is_exactly_the_passing_subset() {
    let records = ten_listings();
    let mut state = ViewState::new(100, CountPolicy::Filtered);
    state.filters.min_price = Some(250.0);
    state.filters.max_price = Some(800.0);
    state.filters.min_bedrooms = 2;

    let view = derive(&records, &state);
    let term = state.filters.normalized_term();
    let expected: Vec<i64> = ids(
        records
            .iter()
            .filter(|r| matches(r, &state.filters, &term, None)),
    );

    assert_eq!(ids(view.records()), expected);
    for record in view.records() {
        let price = record.price.unwrap();
        assert!((250.0..=800.0).contains(&price));
        assert!(record.bedrooms.unwrap() >= 2);
    }
}

#[test]
fn test_same_filters_twice_give_same_page() {
    let mut engine = ListingEngine::new(6);
    engine.load_all(ten_listings());

    let patch = FilterPatch::default().search("depto").min_price(Some(200.0));
    engine.set_filters(patch.clone());
    let first = engine.view().clone();
    engine.set_filters(patch);

    assert_eq!(&first, engine.view());
}

#[test]
fn test_set_page_clamps_out_of_range() {
    let mut engine = ListingEngine::new(6);
    engine.load_all(ten_listings());

    engine.set_page(0);
    assert_eq!(engine.current_page(), 1);
    assert!(!engine.view().is_empty());

    engine.set_page(3);
    assert_eq!(engine.current_page(), 2);
    assert_eq!(ids(engine.view().records()), vec![7, 8, 9, 10]);
}

#[test]
fn test_set_page_on_empty_set_stays_on_first() {
    let mut engine = ListingEngine::new(6);
    engine.load_all(Vec::new());
    engine.set_page(5);

    assert_eq!(engine.current_page(), 1);
    assert!(!engine.view().pagination.has_next);
    assert!(engine.view().pagination.page_numbers.is_empty());
}

#[test]
fn test_no_empty_page_in_range_with_filtered_count() {
    let mut engine = ListingEngine::new(3);
    engine.load_all(ten_listings());
    engine.set_filters(FilterPatch::default().min_bedrooms(2));

    let total_pages = engine.view().pagination.total_pages;
    for page in 1..=total_pages {
        engine.set_page(page);
        assert!(!engine.view().is_empty(), "page {} was empty", page);
    }
}

#[test]
fn test_highlight_is_threaded_through_visible_listings() {
    let mut engine = ListingEngine::new(6);
    engine.load_all(ten_listings());
    engine.set_filters(FilterPatch::default().search("playa"));

    let view = engine.view();
    assert_eq!(view.search_term, "playa");
    assert!(view.listings[0].title.is_annotated());
    assert!(!view.listings[0].location.is_annotated());
    assert!(view.listings[1].description.is_annotated());
}

#[test]
fn test_highlight_regex_metacharacters() {
    let highlighted = search_highlight("Ambientes 2+1, 2 + 1", "2+1");
    assert_eq!(highlighted.to_markup("<b>", "</b>"), "Ambientes <b>2+1</b>, 2 + 1");

    let untouched = search_highlight("Ambientes", "[");
    assert!(!untouched.is_annotated());
}
