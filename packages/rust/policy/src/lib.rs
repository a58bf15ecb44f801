//! Policy validation for brand profiles and content requests.
//!
//! Validation is the hard gate in front of everything else: no fetch, no
//! routing, and no generation runs until the brand document and the request
//! document pass. Every rule is hard-fail and every check runs — a report
//! carries the *complete* violation set so an operator sees all problems
//! in one pass instead of fixing them one re-run at a time.

mod rules;

use std::path::Path;

use contentforge_shared::{BrandProfile, ContentForgeError, ContentRequest, Result};

pub use rules::{ValidationReport, Violation, validate_brand, validate_request};

// ---------------------------------------------------------------------------
// Document loading
// ---------------------------------------------------------------------------

/// Load and schema-parse a brand profile document (TOML).
///
/// Enum fields reject unknown values here, at the boundary. Policy rules
/// (source requirements, disclaimer completeness) are checked separately
/// via [`validate_brand`].
pub fn load_brand_profile(path: &Path) -> Result<BrandProfile> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentForgeError::io(path, e))?;
    toml::from_str(&content).map_err(|e| ContentForgeError::Validation {
        violations: vec![format!("{}: {e}", path.display())],
    })
}

/// Load and schema-parse a content request document (TOML).
pub fn load_content_request(path: &Path) -> Result<ContentRequest> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentForgeError::io(path, e))?;
    toml::from_str(&content).map_err(|e| ContentForgeError::Validation {
        violations: vec![format!("{}: {e}", path.display())],
    })
}

/// Load a brand profile and run full policy validation on it.
pub fn load_validated_brand_profile(path: &Path) -> Result<BrandProfile> {
    let brand = load_brand_profile(path)?;
    validate_brand(&brand).into_result()?;
    Ok(brand)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cf-policy-{}", uuid_suffix()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write temp file");
        path
    }

    fn uuid_suffix() -> u128 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    }

    #[test]
    fn load_brand_profile_rejects_unknown_field_values() {
        let path = write_temp(
            "brand.toml",
            r#"
brand_id = "b"
domains_supported = ["underwater_basketweaving"]
voice_persona = "calm_authoritative"

[topic_policy]
allowlist = ["x"]

[delivery_policy]
channels = ["blog_article"]
destinations = ["client_website"]

[brand_sources]
sources = []
"#,
        );
        let err = load_brand_profile(&path).unwrap_err();
        assert!(matches!(err, ContentForgeError::Validation { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_content_request(Path::new("/nonexistent/request.toml")).unwrap_err();
        assert!(matches!(err, ContentForgeError::Io { .. }));
    }
}
