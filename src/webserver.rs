use crate::auth::require_api_key;
use crate::state::AppState;
use crate::webhook::auto_deploy_docker_hub;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Router, http::StatusCode, middleware};

pub async fn readiness_probe() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn liveness_probe() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Builds the application router. The webhook route sits behind the API key
/// gate; the health probes stay open so the kubelet can always reach them.
pub fn create_app(state: AppState) -> Router {
    let webhook = Router::new()
        .route("/auto-deploy/docker-hub", post(auto_deploy_docker_hub))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .merge(webhook)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Auth, Config, Kubernetes, Webserver};
    use crate::secret_string::SecretString;
    use crate::workload::tests::mock_client;
    use axum::body::Body;
    use http::Request;
    use tower::ServiceExt;

    fn test_state(api_key: Option<&str>) -> AppState {
        let (client, handle) = mock_client();
        // The mock apiserver is never reached in these tests; leak the handle
        // so in-flight requests would hang instead of erroring.
        std::mem::forget(handle);
        AppState::new(
            client,
            Config {
                webserver: Webserver { port: 0 },
                kubernetes: Kubernetes::default(),
                auth: api_key.map(|key| Auth {
                    api_key: SecretString::new(key.to_string()),
                    api_key_param_name: "apikey".to_string(),
                }),
            },
        )
    }

    #[tokio::test]
    async fn test_health_probes_respond_without_api_key() {
        let app = create_app(test_state(Some("s3cret")));

        for path in ["/health/live", "/health/ready"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
    }

    #[tokio::test]
    async fn test_webhook_rejects_missing_or_wrong_api_key() {
        let app = create_app(test_state(Some("s3cret")));

        for uri in [
            "/auto-deploy/docker-hub",
            "/auto-deploy/docker-hub?apikey=wrong",
            "/auto-deploy/docker-hub?other=s3cret",
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_webhook_admits_correct_api_key() {
        let app = create_app(test_state(Some("s3cret")));

        // An unparseable body proves the request reached the handler: it is
        // acknowledged with an empty 200 before any cluster access.
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auto-deploy/docker-hub?apikey=s3cret")
                    .body(Body::from("not json {"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_admits_percent_encoded_api_key() {
        // Reserved characters in the key arrive percent-encoded (and spaces
        // as '+') in the query string and must compare decoded.
        let cases = [
            ("s3cret/key", "apikey=s3cret%2Fkey"),
            ("s3cret key", "apikey=s3cret+key"),
        ];
        for (key, query) in cases {
            let app = create_app(test_state(Some(key)));
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(format!("/auto-deploy/docker-hub?{query}"))
                        .body(Body::from("not json {"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "key {key:?} rejected");
        }
    }

    #[tokio::test]
    async fn test_webhook_is_open_without_configured_auth() {
        let app = create_app(test_state(None));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auto-deploy/docker-hub")
                    .body(Body::from("not json {"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
