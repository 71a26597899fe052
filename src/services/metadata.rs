//! Claim id and date extraction from source object names.

use crate::types::SourceMetadata;
use regex::Regex;

pub const DEFAULT_UNKNOWN_CLAIM_ID: &str = "UNKNOWN";
pub const DEFAULT_FALLBACK_DATE: &str = "12/12/2019";
const DATE_TOKEN_LEN: usize = 8;

pub trait MetadataExtractor {
    fn extract(&self, object_name: &str) -> SourceMetadata;
}

/// Last path segment of an object name.
pub fn short_file_name(object_name: &str) -> &str {
    object_name.rsplit('/').next().unwrap_or(object_name)
}

/// Reads `<claim>-<yyyymmdd...>_<rest>` file names, e.g.
/// `claims/CLM123-20230601_report.pdf`.
#[derive(Debug, Clone)]
pub struct ClaimFileNameExtractor {
    pub unknown_claim_id: String,
    pub fallback_date: String,
}

impl Default for ClaimFileNameExtractor {
    fn default() -> Self {
        Self {
            unknown_claim_id: DEFAULT_UNKNOWN_CLAIM_ID.to_string(),
            fallback_date: DEFAULT_FALLBACK_DATE.to_string(),
        }
    }
}

impl ClaimFileNameExtractor {
    pub fn new(unknown_claim_id: impl Into<String>, fallback_date: impl Into<String>) -> Self {
        Self {
            unknown_claim_id: unknown_claim_id.into(),
            fallback_date: fallback_date.into(),
        }
    }
}

impl MetadataExtractor for ClaimFileNameExtractor {
    fn extract(&self, object_name: &str) -> SourceMetadata {
        let file_name = short_file_name(object_name);
        let Some((prefix, _)) = file_name.split_once('_') else {
            return SourceMetadata {
                claim_id: self.unknown_claim_id.clone(),
                date: self.fallback_date.clone(),
            };
        };

        let (claim_id, remainder) = match prefix.split_once('-') {
            Some((claim, rest)) => (claim, rest),
            None => (prefix, ""),
        };
        let date = remainder
            .get(..DATE_TOKEN_LEN)
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback_date.clone());

        SourceMetadata {
            claim_id: claim_id.to_string(),
            date,
        }
    }
}

/// Regex-driven extractor; the pattern must define named groups `claim`
/// and `date`, matched against the short file name.
#[derive(Debug, Clone)]
pub struct PatternMetadataExtractor {
    pattern: Regex,
    unknown_claim_id: String,
    fallback_date: String,
}

impl PatternMetadataExtractor {
    pub fn new(
        pattern: &str,
        unknown_claim_id: impl Into<String>,
        fallback_date: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let pattern = Regex::new(pattern)?;
        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        if !names.contains(&"claim") || !names.contains(&"date") {
            return Err(regex::Error::Syntax(
                "pattern must define named groups `claim` and `date`".to_string(),
            ));
        }
        Ok(Self {
            pattern,
            unknown_claim_id: unknown_claim_id.into(),
            fallback_date: fallback_date.into(),
        })
    }
}

impl MetadataExtractor for PatternMetadataExtractor {
    fn extract(&self, object_name: &str) -> SourceMetadata {
        let caps = self.pattern.captures(short_file_name(object_name));
        let group = |name: &str| {
            caps.as_ref()
                .and_then(|c| c.name(name))
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
        };
        SourceMetadata {
            claim_id: group("claim").unwrap_or_else(|| self.unknown_claim_id.clone()),
            date: group("date").unwrap_or_else(|| self.fallback_date.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_and_date_from_prefixed_name() {
        let meta = ClaimFileNameExtractor::default().extract("claims/CLM123-20230601_report.pdf");
        assert_eq!(meta.claim_id, "CLM123");
        assert_eq!(meta.date, "20230601");
    }

    #[test]
    fn short_date_token_uses_fallback() {
        let meta = ClaimFileNameExtractor::default().extract("CLM9-2023_scan.png");
        assert_eq!(meta.claim_id, "CLM9");
        assert_eq!(meta.date, DEFAULT_FALLBACK_DATE);
    }

    #[test]
    fn prefix_without_hyphen_is_claim_id() {
        let meta = ClaimFileNameExtractor::default().extract("inbox/CLM77_photo.jpg");
        assert_eq!(meta.claim_id, "CLM77");
        assert_eq!(meta.date, DEFAULT_FALLBACK_DATE);
    }

    #[test]
    fn name_without_underscore_is_unknown() {
        let extractor = ClaimFileNameExtractor::new("n/a", "1970-01-01");
        let meta = extractor.extract("uploads/scan.pdf");
        assert_eq!(meta.claim_id, "n/a");
        assert_eq!(meta.date, "1970-01-01");
    }

    #[test]
    fn underscore_in_directory_is_ignored() {
        let meta = ClaimFileNameExtractor::default().extract("my_claims/report.pdf");
        assert_eq!(meta.claim_id, DEFAULT_UNKNOWN_CLAIM_ID);
    }

    #[test]
    fn pattern_extractor_reads_named_groups() {
        let extractor = PatternMetadataExtractor::new(
            r"^(?P<date>\d{8})-(?P<claim>[A-Z]+\d+)",
            DEFAULT_UNKNOWN_CLAIM_ID,
            DEFAULT_FALLBACK_DATE,
        )
        .unwrap();
        let meta = extractor.extract("in/20240102-ABC42.pdf");
        assert_eq!(meta.claim_id, "ABC42");
        assert_eq!(meta.date, "20240102");

        let meta = extractor.extract("in/nomatch.pdf");
        assert_eq!(meta.claim_id, DEFAULT_UNKNOWN_CLAIM_ID);
        assert_eq!(meta.date, DEFAULT_FALLBACK_DATE);
    }

    #[test]
    fn pattern_without_groups_is_rejected() {
        assert!(PatternMetadataExtractor::new(r"\d+", "u", "d").is_err());
    }

    #[test]
    fn short_name_strips_directories() {
        assert_eq!(short_file_name("a/b/c.pdf"), "c.pdf");
        assert_eq!(short_file_name("c.pdf"), "c.pdf");
    }
}
