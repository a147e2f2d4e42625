use once_cell::sync::Lazy;
use regex::Regex;

pub mod path_resolution;

pub use path_resolution::{build_path, decode_uri_segment, encode_path_segment};

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([\w\-\.=:/+]+)",
        r"(?i)(api-key: )([^\s,]+)",
        r"(?i)(api_key=)([^\s&]+)",
        r"(?i)([A-Z0-9_]*?(KEY|TOKEN|SECRET|PASSWORD)=)([^\s&]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_credential_header_and_env_assignments() {
        assert_eq!(redact_sensitive("api-key: abc123"), "api-key: <redacted>");
        assert_eq!(redact_sensitive("NCBI_API_KEY=abc123 other"), "NCBI_API_KEY=<redacted> other");
        assert_eq!(redact_sensitive("GET /gene?api_key=abc&page_size=5"), "GET /gene?api_key=<redacted>&page_size=5");
    }

    #[test]
    fn redaction_stops_at_the_query_parameter_boundary() {
        assert_eq!(
            redact_sensitive("error sending request for url (https://localhost/genome?page_token=abc%3D&page_size=5&q=x)"),
            "error sending request for url (https://localhost/genome?page_token=<redacted>&page_size=5&q=x)"
        );
        assert_eq!(redact_sensitive("SECRET=a&b=c"), "SECRET=<redacted>&b=c");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        assert_eq!(redact_sensitive("GET /genome/accession/GCF_1/dataset_report"), "GET /genome/accession/GCF_1/dataset_report");
    }
}
