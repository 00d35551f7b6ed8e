use crate::error::{QueryError, RedeployError, RedeployStep};
use crate::image_match::uses_image;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::ScaleSpec;
use k8s_openapi::api::core::v1::{Container, ReplicationController};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info};

/// Workload kinds that can be auto-redeployed. Deployments and
/// ReplicationControllers share the same orchestration protocol, so the
/// selection and destroy/recreate logic lives here as default methods and the
/// impls only provide access to the kind-specific spec layout.
pub trait Redeploy
where
    Self: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + 'static,
{
    fn kind_name() -> &'static str {
        std::any::type_name::<Self>().split("::").last().unwrap()
    }

    /// Containers of the workload's current pod template, empty when the
    /// template is not populated.
    fn containers(&self) -> &[Container];

    /// Lists workloads of this kind carrying the auto-deploy label and keeps
    /// those with at least one container running the target image. Result
    /// order follows the list response. A single list call is issued; there
    /// is no continue-token handling.
    async fn select(
        api: &Api<Self>,
        target_image: &str,
        auto_deploy_label: &str,
    ) -> Result<Vec<Self>, QueryError> {
        let lp = ListParams::default().labels(auto_deploy_label);
        let list = api.list(&lp).await.map_err(|source| QueryError {
            kind: Self::kind_name(),
            source,
        })?;

        debug!(
            "Found {} {} workloads with label {}",
            list.items.len(),
            Self::kind_name(),
            auto_deploy_label
        );

        Ok(list
            .items
            .into_iter()
            .filter(|workload| uses_image(target_image, workload.containers()))
            .collect())
    }

    /// Destroys and recreates the workload so its pods restart on the freshly
    /// pushed image. Steps run in a fixed order and the first failure aborts
    /// the remainder for this workload: read the scale subresource, scale to
    /// zero replicas to drain the pods, delete the object, then recreate it
    /// from the retained snapshot.
    async fn redeploy(
        api: &Api<Self>,
        namespace: &str,
        mut workload: Self,
    ) -> Result<(), RedeployError> {
        let kind = Self::kind_name();
        let name = workload
            .meta()
            .name
            .clone()
            .unwrap_or_default();

        info!("Redeploying {} {}/{}", kind, namespace, name);

        let mut scale = api
            .get_scale(&name)
            .await
            .map_err(|e| RedeployError::new(kind, namespace, &name, RedeployStep::ReadScale, e))?;

        // The scale object keeps its own resourceVersion, so a concurrent
        // scale update loses the race here instead of being overwritten.
        scale.spec = Some(ScaleSpec { replicas: Some(0) });
        let scale_body = serde_json::to_vec(&scale)
            .map_err(kube::Error::SerdeError)
            .map_err(|e| RedeployError::new(kind, namespace, &name, RedeployStep::ScaleDown, e))?;
        api.replace_scale(&name, &PostParams::default(), scale_body)
            .await
            .map_err(|e| RedeployError::new(kind, namespace, &name, RedeployStep::ScaleDown, e))?;

        api.delete(&name, &DeleteParams::default())
            .await
            .map_err(|e| RedeployError::new(kind, namespace, &name, RedeployStep::Delete, e))?;

        // The API server must assign a fresh resourceVersion on create;
        // resubmitting the pre-delete token would be rejected as stale.
        workload.meta_mut().resource_version = None;
        api.create(&PostParams::default(), &workload)
            .await
            .map_err(|e| RedeployError::new(kind, namespace, &name, RedeployStep::Recreate, e))?;

        info!("Successfully redeployed {} {}/{}", kind, namespace, name);
        Ok(())
    }
}

impl Redeploy for Deployment {
    fn containers(&self) -> &[Container] {
        self.spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .map(|ps| ps.containers.as_slice())
            .unwrap_or(&[])
    }
}

impl Redeploy for ReplicationController {
    fn containers(&self) -> &[Container] {
        self.spec
            .as_ref()
            .and_then(|s| s.template.as_ref())
            .and_then(|t| t.spec.as_ref())
            .map(|ps| ps.containers.as_slice())
            .unwrap_or(&[])
    }
}
