use crate::utils::constants::DEFAULT_OUTPUT_DIR;
use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Lowercase, dash-separated form of a place name: "Bangalore, India" -> "bangalore-india"
pub fn place_slug(place: &str) -> String {
    let mut slug = String::with_capacity(place.len());
    let mut pending_dash = false;

    for c in place.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "network".to_string()
    } else {
        slug
    }
}

/// Generate default network cache filename: network-{place}-{YYMMDD}.json
pub fn generate_default_network_filename(place: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "network-{}-{:02}{:02}{:02}.json",
        place_slug(place),
        year,
        month,
        day
    );
    PathBuf::from(DEFAULT_OUTPUT_DIR).join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_slug() {
        assert_eq!(place_slug("Bangalore, India"), "bangalore-india");
        assert_eq!(place_slug("  Pune  "), "pune");
        assert_eq!(place_slug("São Paulo, Brazil"), "são-paulo-brazil");
        assert_eq!(place_slug(",,,"), "network");
    }

    #[test]
    fn test_generate_default_network_filename() {
        let filename = generate_default_network_filename("Bangalore, India");
        let filename_str = filename.to_string_lossy();

        assert!(filename_str.starts_with("data/"));
        assert!(filename_str.ends_with(".json"));

        let parts: Vec<&str> = filename_str.split('/').collect();
        assert_eq!(parts.len(), 2);

        let file_part = parts[1];
        assert!(file_part.starts_with("network-bangalore-india-"));
        // network-bangalore-india-YYMMDD.json
        assert_eq!(file_part.len(), "network-bangalore-india-".len() + 6 + ".json".len());
    }
}
