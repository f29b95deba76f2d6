// libs/therapist-cell/tests/roster_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use geocoding_cell::{GeoCache, NominatimGeocoder};
use shared_database::{MemoryBackend, Store};
use shared_models::{AddressParts, AppError, GeoPoint, Increment, ToggleOutcome};
use shared_utils::test_utils::{
    block, init_test_tracing, slot, test_referral, MockNominatimResponses, TestCase, TestConfig,
    TestTherapist,
};
use therapist_cell::{toggle_case_cell, NewCase, NewTherapist, TherapistPatch, TherapistService};

async fn service_for(mock_server: &MockServer) -> TherapistService {
    init_test_tracing();
    let dir = tempdir().unwrap();
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config(dir.path());
    TherapistService::with_geocoder(Arc::new(NominatimGeocoder::with_cache(
        &config,
        GeoCache::in_memory(),
    )))
}

fn offline_service() -> TherapistService {
    init_test_tracing();
    let dir = tempdir().unwrap();
    let config = TestConfig::default().to_app_config(dir.path());
    TherapistService::new(&config)
}

fn new_case(first: &str, last: &str, patient_id: &str) -> NewCase {
    NewCase {
        first_name: first.to_string(),
        last_name: last.to_string(),
        patient_id: patient_id.to_string(),
        address: AddressParts {
            cross_streets: "Queens Blvd & 63rd Dr".to_string(),
            city: "Rego Park".to_string(),
            state: "NY".to_string(),
            zip: "11374".to_string(),
            ..Default::default()
        },
    }
}

// ==============================================================================
// THERAPISTS
// ==============================================================================

#[test]
fn test_add_therapist_slugs_unique_ids() {
    let service = offline_service();
    let mut store = Store::in_memory();

    let request = NewTherapist {
        first_name: " Maya ".to_string(),
        last_name: "Singh".to_string(),
        required_hours: 25.0,
        borough_prefs: vec!["Queens".to_string()],
        ..Default::default()
    };
    let first = service.add_therapist(&mut store, request.clone()).unwrap();
    let second = service.add_therapist(&mut store, request).unwrap();

    assert_eq!(first.id, "maya-singh");
    assert_eq!(first.first_name, "Maya");
    assert_eq!(first.total_hours, 0.0);
    assert_eq!(second.id, "maya-singh-1");
    assert_eq!(store.therapists().len(), 2);
}

#[test]
fn test_add_therapist_requires_names() {
    let service = offline_service();
    let mut store = Store::in_memory();

    let result = service.add_therapist(
        &mut store,
        NewTherapist {
            first_name: "Maya".to_string(),
            last_name: "  ".to_string(),
            ..Default::default()
        },
    );

    assert_matches!(result, Err(AppError::Validation(_)));
    assert!(store.therapists().is_empty());
}

#[test]
fn test_update_therapist_applies_patch() {
    let service = offline_service();
    let mut store = Store::in_memory();
    store
        .set_therapists(|all| all.push(TestTherapist::new("Maya", "Singh").build()))
        .unwrap();

    let updated = service
        .update_therapist(
            &mut store,
            "maya-singh",
            TherapistPatch {
                required_hours: Some(30.0),
                borough_prefs: Some(vec!["Bronx".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.required_hours, 30.0);
    assert_eq!(store.therapist("maya-singh").unwrap().borough_prefs, vec!["Bronx"]);

    let blank = service.update_therapist(
        &mut store,
        "maya-singh",
        TherapistPatch {
            first_name: Some(String::new()),
            ..Default::default()
        },
    );
    assert_matches!(blank, Err(AppError::Validation(_)));
    assert_eq!(store.therapist("maya-singh").unwrap().first_name, "Maya");

    let missing = service.update_therapist(&mut store, "nobody", TherapistPatch::default());
    assert_matches!(missing, Err(AppError::NotFound(_)));
}

// ==============================================================================
// CASES
// ==============================================================================

#[tokio::test]
async fn test_add_case_geocodes_and_assigns_next_color() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockNominatimResponses::place(40.7263, -73.8616)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let mut store = Store::in_memory();
    store
        .set_therapists(|all| {
            all.push(
                TestTherapist::new("Emily", "Chen")
                    .case(TestCase::new("existing").color(2).build())
                    .build(),
            )
        })
        .unwrap();

    let case = service
        .add_case(&mut store, "emily-chen", new_case("Liam", "Brooks", "Q4001"))
        .await
        .unwrap();

    assert_eq!(case.id, "liam-brooks-q4001");
    assert_eq!(case.name, "Liam Brooks");
    assert_eq!(case.color_index, 3);
    assert_eq!(case.coordinate(), Some(GeoPoint::new(40.7263, -73.8616)));
    assert!(case.schedule.is_empty());
    assert_eq!(store.therapist("emily-chen").unwrap().cases.len(), 2);
}

#[tokio::test]
async fn test_add_case_geocode_failure_saves_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockNominatimResponses::empty()))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let backend = Arc::new(MemoryBackend::new());
    let mut store = Store::open(backend.clone()).unwrap();
    store
        .set_therapists(|all| all.push(TestTherapist::new("Emily", "Chen").build()))
        .unwrap();
    let writes_before = backend.save_count();

    let result = service
        .add_case(&mut store, "emily-chen", new_case("Liam", "Brooks", "Q4001"))
        .await;

    assert_matches!(result, Err(AppError::Geocode(code)) if code == "GEOCODE_NOT_FOUND");
    assert!(store.therapist("emily-chen").unwrap().cases.is_empty());
    assert_eq!(backend.save_count(), writes_before);
}

#[tokio::test]
async fn test_add_case_validates_before_geocoding() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockNominatimResponses::empty()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let mut store = Store::in_memory();
    store
        .set_therapists(|all| all.push(TestTherapist::new("Emily", "Chen").build()))
        .unwrap();

    let mut request = new_case("Liam", "Brooks", "Q4001");
    request.address.zip = String::new();
    let result = service.add_case(&mut store, "emily-chen", request).await;
    assert_matches!(result, Err(AppError::Validation(_)));

    let unknown = service
        .add_case(&mut store, "nobody", new_case("Liam", "Brooks", "Q4001"))
        .await;
    assert_matches!(unknown, Err(AppError::NotFound(_)));
}

// ==============================================================================
// REFERRAL ASSIGNMENT
// ==============================================================================

#[test]
fn test_assign_referral_creates_case_without_schedule() {
    let service = offline_service();
    let mut store = Store::in_memory();
    store
        .set_therapists(|all| {
            all.push(
                TestTherapist::new("Sophia", "Patel")
                    .case(TestCase::new("existing").color(9).build())
                    .build(),
            )
        })
        .unwrap();

    let mut referral = test_referral("ref-1", "Ava Thompson", "Q1001");
    referral.set_coordinate(GeoPoint::new(40.7644, -73.9235));
    referral.preferred_availability = block(&[1], "15:00", "17:00");
    store.add_referral(referral).unwrap();

    let case = service.assign_referral(&mut store, "sophia-patel", "ref-1").unwrap();

    assert_eq!(case.id, "ava-thompson-q1001");
    assert_eq!(case.patient_id, "Q1001");
    assert_eq!(case.color_index, 0);
    assert_eq!(case.address.city, "Astoria");
    assert_eq!(case.coordinate(), Some(GeoPoint::new(40.7644, -73.9235)));
    assert!(case.schedule.is_empty());

    // A second assignment reuses the same case.
    let again = service.assign_referral(&mut store, "sophia-patel", "ref-1").unwrap();
    assert_eq!(again.id, case.id);
    assert_eq!(store.therapist("sophia-patel").unwrap().cases.len(), 2);
}

#[test]
fn test_assign_referral_after_import_with_out_of_palette_color() {
    let service = offline_service();
    let mut store = Store::in_memory();
    store
        .import_json(
            r#"{"therapists":[{"id":"emily-chen","firstName":"Emily","lastName":"Chen",
                "cases":[{"id":"c","name":"Kid","colorIndex":255}]}]}"#,
        )
        .unwrap();
    store.add_referral(test_referral("ref-1", "Ava Thompson", "Q1001")).unwrap();

    let case = service.assign_referral(&mut store, "emily-chen", "ref-1").unwrap();

    assert_eq!(case.color_index, 6);
    assert_eq!(store.therapist("emily-chen").unwrap().cases.len(), 2);
}

#[test]
fn test_assign_referral_unknown_ids() {
    let service = offline_service();
    let mut store = Store::in_memory();
    store.add_referral(test_referral("ref-1", "Ava Thompson", "Q1001")).unwrap();

    assert_matches!(
        service.assign_referral(&mut store, "nobody", "ref-1"),
        Err(AppError::NotFound(_))
    );
    assert_matches!(
        service.assign_referral(&mut store, "nobody", "ref-missing"),
        Err(AppError::NotFound(_))
    );
}

// ==============================================================================
// SCHEDULING THROUGH THE STORE
// ==============================================================================

#[test]
fn test_toggle_persists_and_overlap_writes_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let mut store = Store::open(backend.clone()).unwrap();
    store
        .set_therapists(|all| {
            all.push(
                TestTherapist::new("Emily", "Chen")
                    .case(TestCase::new("case1").booked(block(&[2], "10:00", "10:45")).build())
                    .case(TestCase::new("case2").color(1).build())
                    .build(),
            )
        })
        .unwrap();
    let writes_before = backend.save_count();

    let conflict = toggle_case_cell(&mut store, "emily-chen", "case2", slot("2-10:30"), Increment::Fifteen);
    assert_matches!(conflict, Err(AppError::Overlap { .. }));
    assert_eq!(backend.save_count(), writes_before);
    assert!(store.therapist("emily-chen").unwrap().case("case2").unwrap().schedule.is_empty());

    let outcome = toggle_case_cell(&mut store, "emily-chen", "case2", slot("2-11:00"), Increment::Thirty).unwrap();
    assert_eq!(outcome, ToggleOutcome::Added(vec![slot("2-11:00"), slot("2-11:15")]));
    assert_eq!(backend.save_count(), writes_before + 1);

    let therapist = store.therapist("emily-chen").unwrap();
    assert_eq!(therapist.total_hours, 1.25);
    assert_eq!(backend.saved().unwrap().therapists[0].total_hours, 1.25);
}
