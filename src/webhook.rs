use crate::state::AppState;
use crate::workload::Redeploy;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::DateTime;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ReplicationController;
use kube::Api;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

/// Request body shape Docker Hub sends when a build trigger fires.
/// https://docs.docker.com/docker-hub/webhooks/
#[derive(Debug, Deserialize)]
pub struct DockerHubPayload {
    pub push_data: DockerHubPushData,
    #[serde(default)]
    pub callback_url: String,
    pub repository: DockerHubRepository,
}

#[derive(Debug, Deserialize)]
pub struct DockerHubPushData {
    pub tag: String,
    #[serde(default)]
    pub pusher: String,
    #[serde(default)]
    pub pushed_at: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DockerHubRepository {
    pub repo_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub star_count: i64,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub is_private: bool,
}

impl DockerHubPayload {
    /// The image reference the push concerns, of the form `vendor/repo:tag`.
    pub fn target_image(&self) -> String {
        format!("{}:{}", self.repository.repo_name, self.push_data.tag)
    }
}

/// Handles `POST /auto-deploy/docker-hub`.
///
/// Decodes the push event, selects labeled Deployments and
/// ReplicationControllers running the pushed image, and redeploys every match
/// sequentially. Redeploy failures are logged and never surface to the
/// registry: once the payload decodes, the response is `200` with `{}` no
/// matter what happens cluster-side, so Docker Hub has no reason to retry.
/// A payload that fails to decode is acknowledged with an empty `200` as
/// well, keeping cluster details out of the response.
pub async fn auto_deploy_docker_hub(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: DockerHubPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            error!("Discarding webhook payload that failed to decode: {}", err);
            return StatusCode::OK.into_response();
        }
    };

    let target_image = payload.target_image();
    info!(
        "Received push event for image {} by {} at {}",
        target_image,
        payload.push_data.pusher,
        DateTime::from_timestamp(payload.push_data.pushed_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| payload.push_data.pushed_at.to_string())
    );

    let namespace = state.config.kubernetes.namespace.as_str();
    let label = state.config.kubernetes.auto_deploy_label.as_str();

    let deployments: Api<Deployment> = Api::namespaced(state.kube_client.clone(), namespace);
    let rcs: Api<ReplicationController> = Api::namespaced(state.kube_client.clone(), namespace);

    let matched_deployments = match Deployment::select(&deployments, &target_image, label).await {
        Ok(matched) => matched,
        Err(err) => {
            error!("Skipping push event: {}", err);
            return StatusCode::OK.into_response();
        }
    };
    let matched_rcs = match ReplicationController::select(&rcs, &target_image, label).await {
        Ok(matched) => matched,
        Err(err) => {
            error!("Skipping push event: {}", err);
            return StatusCode::OK.into_response();
        }
    };

    info!(
        "Image {} matched {} deployments and {} replication controllers in namespace {}",
        target_image,
        matched_deployments.len(),
        matched_rcs.len(),
        namespace
    );

    redeploy_batch(&state, &deployments, namespace, matched_deployments).await;
    redeploy_batch(&state, &rcs, namespace, matched_rcs).await;

    (StatusCode::OK, Json(json!({}))).into_response()
}

/// Redeploys the matched workloads of one kind in list order. Each workload
/// holds its advisory lock across the destroy/recreate window so overlapping
/// push events cannot interleave deletes and creates on the same object. A
/// failed workload is logged and its siblings still get processed.
async fn redeploy_batch<W: Redeploy>(
    state: &AppState,
    api: &Api<W>,
    namespace: &str,
    workloads: Vec<W>,
) {
    for workload in workloads {
        let name = workload.meta().name.clone().unwrap_or_default();
        let _guard = state.locks.acquire(W::kind_name(), namespace, &name).await;
        if let Err(err) = W::redeploy(api, namespace, workload).await {
            error!("Continuing with remaining workloads: {}", err);
        }
    }
}
