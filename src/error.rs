use std::fmt;

/// Step of the destroy/recreate protocol that failed. The steps run in
/// declaration order; a failure aborts the remaining steps for that workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeployStep {
    ReadScale,
    ScaleDown,
    Delete,
    Recreate,
}

impl fmt::Display for RedeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeployStep::ReadScale => write!(f, "reading scale subresource"),
            RedeployStep::ScaleDown => write!(f, "scaling down to zero replicas"),
            RedeployStep::Delete => write!(f, "deleting workload"),
            RedeployStep::Recreate => write!(f, "recreating workload"),
        }
    }
}

/// Listing workloads of one kind failed. The whole batch for that kind is
/// skipped; the event is still acknowledged.
#[derive(Debug)]
pub struct QueryError {
    pub kind: &'static str,
    pub source: kube::Error,
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to list {} workloads: {}", self.kind, self.source)
    }
}

/// One workload's redeploy failed at a specific protocol step. Siblings in
/// the same batch are unaffected.
#[derive(Debug)]
pub struct RedeployError {
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
    pub step: RedeployStep,
    pub source: kube::Error,
}

impl RedeployError {
    pub fn new(
        kind: &'static str,
        namespace: &str,
        name: &str,
        step: RedeployStep,
        source: kube::Error,
    ) -> Self {
        RedeployError {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            step,
            source,
        }
    }
}

impl std::error::Error for RedeployError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for RedeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed redeploying {} {}/{} while {}: {}",
            self.kind, self.namespace, self.name, self.step, self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn not_found() -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "deployments.apps \"app-deploy\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        })
    }

    #[test]
    fn test_redeploy_error_names_workload_and_step() {
        let err = RedeployError::new(
            "Deployment",
            "default",
            "app-deploy",
            RedeployStep::Delete,
            not_found(),
        );
        let msg = err.to_string();
        assert!(msg.contains("Deployment default/app-deploy"));
        assert!(msg.contains("deleting workload"));
    }

    #[test]
    fn test_query_error_names_kind() {
        let err = QueryError {
            kind: "ReplicationController",
            source: not_found(),
        };
        assert!(err.to_string().contains("ReplicationController"));
    }
}
