use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters escaped when a value is substituted into a path segment.
///
/// Unreserved characters stay literal, as does `,` so comma-joined identifier
/// lists read naturally in the final URL.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~').remove(b',');

/// Resolves a path template by replacing `{key}` placeholders with encoded values.
///
/// # Examples
/// ```
/// use datasets_util::build_path;
///
/// let path = build_path("/genome/taxon/{taxon}/dataset_report", &[("taxon", "Homo sapiens")]);
/// assert_eq!(path, "/genome/taxon/Homo%20sapiens/dataset_report");
///
/// // Unknown placeholders remain untouched.
/// let path = build_path("/gene/id/{gene_id}/{missing}", &[("gene_id", "672")]);
/// assert_eq!(path, "/gene/id/672/{missing}");
/// ```
pub fn build_path(template: &str, variables: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (key, value) in variables {
        path = path.replace(&format!("{{{key}}}"), &encode_path_segment(value));
    }
    path
}

/// Percent-encodes a single path segment, including any `/`.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Decodes a percent-encoded URI segment, e.g. `BRCA1%20homo` into `BRCA1 homo`.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_uri_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
