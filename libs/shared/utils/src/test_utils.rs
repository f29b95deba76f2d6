//! Fixtures shared by the cell test suites.

use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared_config::AppConfig;
use shared_models::slot::day_block;
use shared_models::{AddressParts, Case, GeoPoint, Referral, ReferralStatus, Slot, SlotSet, Therapist};

pub struct TestConfig {
    pub geocoder_base_url: String,
    pub geocoder_contact_email: String,
    pub geocode_min_interval_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            geocoder_base_url: "http://localhost:54321/search".to_string(),
            geocoder_contact_email: "tests@example.com".to_string(),
            geocode_min_interval_ms: 0,
        }
    }
}

impl TestConfig {
    /// Points the geocoder at a mock server's `/search` endpoint.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            geocoder_base_url: format!("{}/search", uri),
            ..Default::default()
        }
    }

    pub fn to_app_config(&self, data_dir: &Path) -> AppConfig {
        AppConfig {
            geocoder_base_url: self.geocoder_base_url.clone(),
            geocoder_contact_email: self.geocoder_contact_email.clone(),
            geocode_min_interval_ms: self.geocode_min_interval_ms,
            data_path: data_dir.join("state.json"),
            geo_cache_path: data_dir.join("geo_cache.json"),
        }
    }
}

/// Routes service logs to the test harness. `RUST_LOG` overrides the
/// default filter; repeated calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub fn slot(key: &str) -> Slot {
    key.parse().expect("test slot key is valid")
}

pub fn slots(keys: &[&str]) -> SlotSet {
    keys.iter().map(|key| slot(key)).collect()
}

/// `[start, end)` on each listed day.
pub fn block(days: &[u8], start: &str, end: &str) -> SlotSet {
    days.iter()
        .flat_map(|day| day_block(*day, start, end).expect("test block is valid"))
        .collect()
}

pub struct TestCase {
    case: Case,
}

impl TestCase {
    pub fn new(id: &str) -> Self {
        Self {
            case: Case {
                id: id.to_string(),
                name: format!("Child {}", id),
                patient_id: id.to_uppercase(),
                address: AddressParts {
                    cross_streets: "Queens Blvd & 63rd Dr".to_string(),
                    city: "Rego Park".to_string(),
                    state: "NY".to_string(),
                    zip: "11374".to_string(),
                    ..Default::default()
                },
                lat: None,
                lon: None,
                schedule: vec![],
                color_index: 0,
            },
        }
    }

    pub fn color(mut self, color_index: u8) -> Self {
        self.case.color_index = color_index;
        self
    }

    pub fn patient_id(mut self, patient_id: &str) -> Self {
        self.case.patient_id = patient_id.to_string();
        self
    }

    pub fn address(mut self, cross_streets: &str, city: &str, zip: &str) -> Self {
        self.case.address.cross_streets = cross_streets.to_string();
        self.case.address.city = city.to_string();
        self.case.address.zip = zip.to_string();
        self
    }

    pub fn at(mut self, point: GeoPoint) -> Self {
        self.case.set_coordinate(point);
        self
    }

    pub fn booked<I: IntoIterator<Item = Slot>>(mut self, booked: I) -> Self {
        let entries: Vec<_> = booked.into_iter().map(|s| self.case.entry_for(s)).collect();
        self.case.schedule.extend(entries);
        self
    }

    pub fn build(self) -> Case {
        self.case
    }
}

pub struct TestTherapist {
    therapist: Therapist,
}

impl TestTherapist {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            therapist: Therapist {
                id: format!("{}-{}", first_name, last_name).to_lowercase(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                phone: "(718) 555-0100".to_string(),
                email: format!("{}@example.com", first_name.to_lowercase()),
                borough_prefs: vec![],
                required_hours: 25.0,
                total_hours: 0.0,
                cases: vec![],
            },
        }
    }

    pub fn boroughs(mut self, boroughs: &[&str]) -> Self {
        self.therapist.borough_prefs = boroughs.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn required_hours(mut self, hours: f64) -> Self {
        self.therapist.required_hours = hours;
        self
    }

    pub fn case(mut self, case: Case) -> Self {
        self.therapist.cases.push(case);
        self
    }

    pub fn build(mut self) -> Therapist {
        self.therapist.recompute_total_hours();
        self.therapist
    }
}

pub fn test_referral(id: &str, child_name: &str, child_id: &str) -> Referral {
    Referral {
        id: id.to_string(),
        child_name: child_name.to_string(),
        child_id: child_id.to_string(),
        total_referred_hours: 5.0,
        max_desired_per_day: 1.0,
        max_desired_per_day_pinned: false,
        status: ReferralStatus::Referred,
        address: AddressParts {
            cross_streets: "Steinway St & 30th Ave".to_string(),
            city: "Astoria".to_string(),
            state: "NY".to_string(),
            zip: "11103".to_string(),
            ..Default::default()
        },
        lat: None,
        lon: None,
        preferred_availability: SlotSet::new(),
        created_at: None,
        updated_at: None,
    }
}

pub struct MockNominatimResponses;

impl MockNominatimResponses {
    pub fn place(lat: f64, lon: f64) -> serde_json::Value {
        serde_json::json!([{
            "place_id": 1234,
            "lat": lat.to_string(),
            "lon": lon.to_string(),
            "display_name": "Queens, New York, United States",
            "category": "place",
            "type": "suburb"
        }])
    }

    pub fn empty() -> serde_json::Value {
        serde_json::json!([])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_mock_server("http://127.0.0.1:9000");
        let app_config = config.to_app_config(Path::new("/tmp/tms"));

        assert_eq!(app_config.geocoder_base_url, "http://127.0.0.1:9000/search");
        assert!(app_config.is_geocoder_configured());
        assert_eq!(app_config.data_path, Path::new("/tmp/tms/state.json"));
    }

    #[test]
    fn test_therapist_builder_hydrates_totals() {
        let therapist = TestTherapist::new("Maya", "Singh")
            .case(TestCase::new("a").booked(block(&[1, 2], "15:00", "17:00")).build())
            .build();

        assert_eq!(therapist.id, "maya-singh");
        assert_eq!(therapist.total_hours, 4.0);
        assert_eq!(therapist.cases[0].schedule[0].case_id, "a");
    }
}
