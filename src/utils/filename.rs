use chrono::{Datelike, Local};
use std::path::PathBuf;

use crate::models::SiteId;

/// Default output path: output/{kind}-{state}-{county}-{site}-{YYMMDD}.{ext}
pub fn generate_default_output_filename(kind: &str, site: &SiteId, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "{}-{}-{:02}{:02}{:02}.{}",
        kind, site, year, month, day, extension
    );
    PathBuf::from("output").join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_output_filename() {
        let site = SiteId::new("06", "037", "1103");
        let filename = generate_default_output_filename("core", &site, "csv");
        let filename_str = filename.to_string_lossy();

        assert!(filename_str.starts_with("output/"));
        assert!(filename_str.ends_with(".csv"));

        let parts: Vec<&str> = filename_str.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[1].starts_with("core-06-037-1103-"));
    }
}
