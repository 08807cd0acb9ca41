//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has already passed `Validate::validate`.
///
/// Malformed JSON and validation failures both answer 400 with the shared
/// error envelope; validation failures list the offending fields in `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateStatus {
///     #[validate(length(min = 1, max = 50))]
///     name: String,
/// }
///
/// async fn create(ValidatedJson(input): ValidatedJson<CreateStatus>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::{Request, StatusCode, header}, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3))]
        title: String,
    }

    async fn accept(ValidatedJson(p): ValidatedJson<Payload>) -> String {
        p.title
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_payload_passes() {
        let app = Router::new().route("/", post(accept));
        let response = app.oneshot(post_json(r#"{"title":"abc"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_payload_lists_fields() {
        let app = Router::new().route("/", post(accept));
        let response = app.oneshot(post_json(r#"{"title":"a"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["details"]["title"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_client_error() {
        let app = Router::new().route("/", post(accept));
        let response = app.oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
