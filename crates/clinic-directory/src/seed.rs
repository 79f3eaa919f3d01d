//! 医生目录种子数据

use crate::provider::{AppointmentSlot, Provider};
use chrono::NaiveDate;

fn slot(date: &str, start_time: &str, length_minutes: i32) -> AppointmentSlot {
    AppointmentSlot {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("invalid seed date"),
        start_time: start_time.to_string(),
        length_minutes,
    }
}

fn provider(
    provider_id: &str,
    first_name: &str,
    last_name: &str,
    specialty: &str,
    city: &str,
    state: &str,
    zip: &str,
    education: &str,
    practice_name: &str,
    languages: &[&str],
    rating: f32,
    appointments: Vec<AppointmentSlot>,
) -> Provider {
    Provider {
        provider_id: provider_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        specialty: specialty.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        zip: zip.to_string(),
        education: education.to_string(),
        practice_name: practice_name.to_string(),
        languages_spoken: languages.iter().map(|l| l.to_string()).collect(),
        rating,
        appointments,
    }
}

/// 内置的医生目录
pub fn seed_providers() -> Vec<Provider> {
    vec![
        provider(
            "PRV-001",
            "Emily",
            "Chen",
            "Family Medicine",
            "Oakland",
            "CA",
            "94607",
            "UCSF School of Medicine",
            "Lakeside Family Health",
            &["English", "Mandarin"],
            4.8,
            vec![
                slot("2026-09-01", "09:00", 30),
                slot("2026-09-01", "10:30", 30),
            ],
        ),
        provider(
            "PRV-002",
            "Marcus",
            "Patel",
            "Cardiology",
            "San Jose",
            "CA",
            "95112",
            "Stanford University School of Medicine",
            "Bay Heart Institute",
            &["English", "Hindi", "Gujarati"],
            4.9,
            vec![slot("2026-09-02", "14:00", 45)],
        ),
        provider(
            "PRV-003",
            "Sofia",
            "Ramirez",
            "Pediatrics",
            "Fremont",
            "CA",
            "94538",
            "UC Davis School of Medicine",
            "Little Sprouts Pediatrics",
            &["English", "Spanish"],
            4.7,
            vec![
                slot("2026-09-01", "08:30", 20),
                slot("2026-09-03", "11:00", 20),
            ],
        ),
        provider(
            "PRV-004",
            "David",
            "Nguyen",
            "Dermatology",
            "San Francisco",
            "CA",
            "94110",
            "Johns Hopkins School of Medicine",
            "Mission Skin Clinic",
            &["English", "Vietnamese"],
            4.6,
            vec![slot("2026-09-04", "13:15", 30)],
        ),
        provider(
            "PRV-005",
            "Aisha",
            "Okafor",
            "Internal Medicine",
            "Berkeley",
            "CA",
            "94704",
            "Yale School of Medicine",
            "East Bay Internal Medicine",
            &["English"],
            4.8,
            vec![slot("2026-09-02", "09:45", 30)],
        ),
        provider(
            "PRV-006",
            "Robert",
            "Chenoweth",
            "Orthopedics",
            "Walnut Creek",
            "CA",
            "94596",
            "University of Michigan Medical School",
            "Diablo Valley Orthopedics",
            &["English"],
            4.5,
            vec![slot("2026-09-05", "15:30", 60)],
        ),
        provider(
            "PRV-007",
            "Hannah",
            "Goldberg",
            "Obstetrics and Gynecology",
            "Oakland",
            "CA",
            "94611",
            "Columbia University College of Physicians",
            "Grand Lake Women's Health",
            &["English", "Hebrew"],
            4.9,
            vec![slot("2026-09-03", "10:00", 30)],
        ),
        provider(
            "PRV-008",
            "James",
            "Whitfield",
            "Psychiatry",
            "San Leandro",
            "CA",
            "94577",
            "Duke University School of Medicine",
            "Harbor Behavioral Health",
            &["English"],
            4.4,
            vec![slot("2026-09-02", "16:00", 50)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_nonempty_and_well_formed() {
        let providers = seed_providers();
        assert!(providers.len() >= 8);
        for p in &providers {
            assert!(!p.provider_id.is_empty());
            assert!(!p.first_name.is_empty());
            assert!(!p.specialty.is_empty());
            assert!(p.rating > 0.0 && p.rating <= 5.0);
        }
    }
}
