// libs/referral-cell/tests/shared_geocoder_test.rs

use std::time::{Duration, Instant};

use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use referral_cell::{NewReferral, ReferralService};
use shared_database::Store;
use shared_models::{AddressParts, GeoPoint, ReferralPatch};
use shared_utils::test_utils::{init_test_tracing, MockNominatimResponses, TestConfig, TestTherapist};
use therapist_cell::{MatchEngine, NewCase, SearchCriteria, TherapistService};

fn rego_park() -> AddressParts {
    AddressParts {
        cross_streets: "Queens Blvd & 63rd Dr".to_string(),
        city: "Rego Park".to_string(),
        state: "NY".to_string(),
        zip: "11374".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_services_from_one_config_share_cache_and_spacing() {
    init_test_tracing();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockNominatimResponses::place(40.7263, -73.8616)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = TestConfig {
        geocode_min_interval_ms: 150,
        ..TestConfig::with_mock_server(&mock_server.uri())
    }
    .to_app_config(dir.path());

    let therapists = TherapistService::new(&config);
    let referrals = ReferralService::new(&config);
    let engine = MatchEngine::new(&config);

    let mut store = Store::in_memory();
    store
        .set_therapists(|all| all.push(TestTherapist::new("Emily", "Chen").build()))
        .unwrap();

    let started = Instant::now();
    therapists
        .add_case(
            &mut store,
            "emily-chen",
            NewCase {
                first_name: "Liam".to_string(),
                last_name: "Brooks".to_string(),
                patient_id: "Q4001".to_string(),
                address: rego_park(),
            },
        )
        .await
        .unwrap();

    // Same address through another service: answered from the shared cache.
    let referral = referrals
        .create_referral(
            &mut store,
            NewReferral {
                child_name: "Ava Thompson".to_string(),
                child_id: "Q1001".to_string(),
                total_referred_hours: 5.0,
                address: rego_park(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(referral.coordinate(), Some(GeoPoint::new(40.7263, -73.8616)));

    // A new address through a third service waits out the shared interval.
    let astoria = AddressParts {
        cross_streets: "Steinway St & 30th Ave".to_string(),
        city: "Astoria".to_string(),
        ..rego_park()
    };
    let criteria = SearchCriteria {
        max_miles: 25.0,
        referral_address: astoria.clone(),
        ..Default::default()
    };
    engine.search(&mut store, &criteria).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(150));

    // And the referral service finds that lookup cached.
    let moved = referrals
        .update_referral(
            &mut store,
            &referral.id,
            ReferralPatch {
                address: Some(astoria),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.coordinate(), Some(GeoPoint::new(40.7263, -73.8616)));
}
