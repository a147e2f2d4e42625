use datasets_types::{OperationSchema, UpstreamRequest};
use serde::Deserialize;

use super::{OperationArgs, from_args};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetDatabaseStatsArgs {}

impl GetDatabaseStatsArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::get("/version")
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![OperationDescriptor {
        name: "get_database_stats",
        title: "Get database statistics",
        description: "Version and build information of the upstream Datasets service.",
        schema: OperationSchema::default(),
        envelope: EnvelopeShape::passthrough(),
        parser: |arguments| from_args(arguments).map(OperationArgs::GetDatabaseStats),
    }]
}

#[cfg(test)]
mod tests {
    use super::super::test_support::request_for;
    use serde_json::json;

    #[test]
    fn stats_ignore_stray_arguments() {
        let request = request_for("get_database_stats", json!({"verbose": true}));
        assert_eq!(request.path, "/version");
        assert!(request.query.is_empty());
    }
}
