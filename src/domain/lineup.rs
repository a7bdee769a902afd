//! Gracenote lineup identifier classification.
//!
//! Lineup ids look like `USA-DITV501-X` (provider lineup with device
//! suffix), `USA-OTA12345` (over-the-air) or `USA-YTTV-DEFAULT`
//! (streaming service).

use std::sync::LazyLock;

use regex::Regex;

/// Streaming services whose lineups are keyed by postal code.
pub const STREAMING_HEADENDS: &[&str] =
    &["HULUTV", "YTTV", "FUBOTV", "SLING", "DIRECTVSTR", "VIDGO", "FRNDLYTV", "PHILO"];

static HEADEND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}-([^-]+)-").expect("static headend regex"));

static DEVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([A-Z])$").expect("static device regex"));

/// Over-the-air / local broadcast lineup.
pub fn is_ota(lineup_id: &str) -> bool {
    let upper = lineup_id.to_uppercase();
    upper.contains("OTA") || upper.contains("LOCALBROADCAST")
}

pub fn is_streaming(lineup_id: &str) -> bool {
    let upper = lineup_id.to_uppercase();
    HEADEND_RE
        .captures(&upper)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| STREAMING_HEADENDS.contains(&m.as_str()))
}

pub fn needs_postal(lineup_id: &str) -> bool {
    is_ota(lineup_id) || is_streaming(lineup_id)
}

/// Human label used in the postal-code error.
pub fn kind_label(lineup_id: &str) -> &'static str {
    if is_ota(lineup_id) { "OTA/LocalBroadcast" } else { "streaming service" }
}

pub fn headend(lineup_id: &str) -> String {
    if is_ota(lineup_id) {
        return "lineupId".to_string();
    }
    HEADEND_RE
        .captures(lineup_id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "lineup".to_string())
}

/// Device letter for provider lineups, `-` otherwise.
pub fn device(lineup_id: &str) -> String {
    let upper = lineup_id.trim().to_uppercase();
    if is_ota(&upper) || is_streaming(&upper) || upper.ends_with("-DEFAULT") {
        return "-".to_string();
    }
    DEVICE_RE
        .captures(&upper)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Map two-letter country codes to the three-letter form the API expects.
pub fn country3(country: &str) -> String {
    let upper = country.trim().to_uppercase();
    match upper.as_str() {
        "US" => "USA".to_string(),
        "CA" => "CAN".to_string(),
        _ => upper,
    }
}

/// Lineup and headend as sent to the grid API.
///
/// OTA lineups are requested through the country's default lineup and the
/// postal code selects the broadcast market.
pub fn api_lineup(lineup_id: &str, country3: &str) -> (String, String) {
    if is_ota(lineup_id) {
        (format!("{}-lineupId-DEFAULT", country3), "lineupId".to_string())
    } else {
        (lineup_id.to_string(), headend(lineup_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_ota_lineups() {
        assert!(is_ota("USA-OTA12345"));
        assert!(is_ota("usa-localbroadcast-x"));
        assert!(!is_ota("USA-DITV501-X"));
        assert!(needs_postal("USA-OTA12345"));
        assert_eq!(kind_label("USA-OTA12345"), "OTA/LocalBroadcast");
    }

    #[test]
    fn classifies_streaming_lineups() {
        assert!(is_streaming("USA-YTTV-DEFAULT"));
        assert!(is_streaming("usa-sling-default"));
        assert!(!is_streaming("USA-DITV501-X"));
        assert!(needs_postal("USA-HULUTV-DEFAULT"));
        assert_eq!(kind_label("USA-HULUTV-DEFAULT"), "streaming service");
    }

    #[test]
    fn headend_extraction() {
        assert_eq!(headend("USA-OTA12345"), "lineupId");
        assert_eq!(headend("USA-DITV501-X"), "DITV501");
        assert_eq!(headend("weird"), "lineup");
    }

    #[test]
    fn device_extraction() {
        assert_eq!(device("USA-DITV501-X"), "X");
        assert_eq!(device("USA-DISH508-DEFAULT"), "-");
        assert_eq!(device("USA-YTTV-DEFAULT"), "-");
        assert_eq!(device("USA-OTA12345"), "-");
        assert_eq!(device("USA-CABLE01"), "-");
    }

    #[test]
    fn country_codes_expand() {
        assert_eq!(country3("us"), "USA");
        assert_eq!(country3("CA"), "CAN");
        assert_eq!(country3("gbr"), "GBR");
    }

    #[test]
    fn ota_lineups_use_country_default() {
        assert_eq!(
            api_lineup("USA-OTA12345", "USA"),
            ("USA-lineupId-DEFAULT".to_string(), "lineupId".to_string())
        );
        assert_eq!(
            api_lineup("USA-DITV501-X", "USA"),
            ("USA-DITV501-X".to_string(), "DITV501".to_string())
        );
    }
}
