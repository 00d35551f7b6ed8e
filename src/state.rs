use crate::config::Config;
use crate::locks::WorkloadLocks;

/// Shared state threaded into every webhook request. Settings are carried
/// here explicitly rather than read from ambient process state, so handlers
/// stay testable against a mocked client.
#[derive(Clone)]
pub struct AppState {
    pub(crate) kube_client: kube::Client,
    pub(crate) config: Config,
    pub(crate) locks: WorkloadLocks,
}

impl AppState {
    pub fn new(kube_client: kube::Client, config: Config) -> Self {
        AppState {
            kube_client,
            config,
            locks: WorkloadLocks::new(),
        }
    }
}
