//! Static airport-code -> (province, lat, lon) and multi-airport city
//! alias table, backing location resolution, the weather ingestion
//! province list, and the neutral-weather fallback for unmapped codes.

/// (airport code, province name, latitude, longitude).
const AIRPORT_PROVINCES: &[(&str, &str, f64, f64)] = &[
    ("BKK", "Bangkok", 13.6900, 100.7501),
    ("DMK", "Bangkok", 13.9126, 100.6068),
    ("HKT", "Phuket", 8.1132, 98.3169),
    ("CNX", "Chiang Mai", 18.7669, 98.9625),
    ("USM", "Surat Thani", 9.5479, 100.0625),
    ("KBV", "Krabi", 8.0956, 98.9863),
    ("UTH", "Udon Thani", 17.3864, 102.7883),
    ("HDY", "Songkhla", 6.9331, 100.3931),
    ("UTP", "Rayong", 12.6799, 101.0052),
    ("CEI", "Chiang Rai", 19.9523, 99.8828),
];

/// Multi-airport city name -> its member airport codes. Kept to a
/// single hardcoded Bangkok alias for now.
const CITY_ALIASES: &[(&str, &[&str])] = &[("bangkok", &["BKK", "DMK"])];

pub fn province_for_airport(code: &str) -> Option<&'static str> {
    AIRPORT_PROVINCES
        .iter()
        .find(|(c, _, _, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, province, _, _)| *province)
}

pub fn coordinates_for_airport(code: &str) -> Option<(f64, f64)> {
    AIRPORT_PROVINCES
        .iter()
        .find(|(c, _, _, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, _, lat, lon)| (*lat, *lon))
}

pub fn all_provinces() -> impl Iterator<Item = &'static str> {
    AIRPORT_PROVINCES.iter().map(|(_, province, _, _)| *province)
}

/// Deduplicated (province, lat, lon) list for the weather ingestion
/// flow's "configured list of provinces". Bangkok's two
/// airports collapse to one province entry.
pub fn provinces_with_coordinates() -> Vec<(&'static str, f64, f64)> {
    let mut seen = std::collections::HashSet::new();
    AIRPORT_PROVINCES
        .iter()
        .filter(|(_, province, _, _)| seen.insert(*province))
        .map(|(_, province, lat, lon)| (*province, *lat, *lon))
        .collect()
}

/// Resolves free-text location input to the set of airport codes it
/// stands for. A plain 3-letter code matching the table resolves to
/// itself; a known city name expands to its member airports.
pub fn resolve_location(input: &str) -> Option<Vec<String>> {
    let trimmed = input.trim();

    if trimmed.len() == 3 {
        if let Some((code, _, _, _)) = AIRPORT_PROVINCES.iter().find(|(c, _, _, _)| c.eq_ignore_ascii_case(trimmed)) {
            return Some(vec![code.to_string()]);
        }
    }

    let lower = trimmed.to_lowercase();
    CITY_ALIASES
        .iter()
        .find(|(city, _)| *city == lower)
        .map(|(_, codes)| codes.iter().map(|c| c.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_airport_code() {
        assert_eq!(resolve_location("HKT"), Some(vec!["HKT".to_string()]));
    }

    #[test]
    fn resolves_bangkok_city_alias_to_both_airports() {
        assert_eq!(resolve_location("Bangkok"), Some(vec!["BKK".to_string(), "DMK".to_string()]));
    }

    #[test]
    fn unknown_location_resolves_to_none() {
        assert_eq!(resolve_location("Atlantis"), None);
    }

    #[test]
    fn unmapped_airport_has_no_province() {
        assert_eq!(province_for_airport("ZZZ"), None);
    }
}
