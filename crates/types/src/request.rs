use serde::Serialize;
use serde_json::Value;

/// HTTP method used for an upstream call. Fixed per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpstreamMethod {
    Get,
    Post,
}

impl UpstreamMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamMethod::Get => "GET",
            UpstreamMethod::Post => "POST",
        }
    }
}

/// Description of one request against the upstream data service.
///
/// The path is relative to the configured base address and already has its
/// identifiers substituted and percent-encoded. Query values are forwarded
/// exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    pub method: UpstreamMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: UpstreamMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: UpstreamMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Append a flag parameter (`key=true`) only when `enabled`.
    pub fn query_flag(self, key: &str, enabled: bool) -> Self {
        if enabled { self.query(key, true) } else { self }
    }

    /// Append a comma-joined list parameter when the list is non-empty.
    pub fn query_list<V: ToString>(self, key: &str, values: &[V]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values.iter().map(ToString::to_string).collect::<Vec<String>>().join(",");
        self.query(key, joined)
    }

    /// First value stored for a query key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_and_list_parameters_are_skipped_when_empty() {
        let request = UpstreamRequest::get("/genome/taxon/9606/dataset_report")
            .query_opt::<String>("page_token", None)
            .query_list::<String>("chromosomes", &[])
            .query_flag("filters.exclude_atypical", false)
            .query("page_size", 50);

        assert_eq!(request.query, vec![("page_size".to_string(), "50".to_string())]);
    }

    #[test]
    fn list_parameters_are_comma_joined() {
        let request = UpstreamRequest::get("/gene/id/672/orthologs").query_list("taxon_filter", &["9606", "10090"]);
        assert_eq!(request.query_value("taxon_filter"), Some("9606,10090"));
    }
}
