//! Body and query extractors whose rejections use the API error shape

use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
};
use serde::de::DeserializeOwned;

/// `axum::Json` with rejections rendered as [`AppError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with rejections rendered as [`AppError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Raw request body, decoded as JSON only when the handler asks for it
///
/// Update handlers resolve the target and check ownership before looking at
/// the payload, so a malformed body never masks a 404 or 403.
#[derive(Debug)]
pub struct DeferredJson(Bytes);

impl DeferredJson {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.0)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for DeferredJson
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Patch {
        content: Option<String>,
    }

    #[test]
    fn test_decode_valid_body() {
        let body = DeferredJson(Bytes::from_static(br#"{"content":"hi"}"#));
        let patch: Patch = body.decode().unwrap();
        assert_eq!(patch.content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_decode_type_mismatch_is_validation_error() {
        let body = DeferredJson(Bytes::from_static(br#"{"content":5}"#));
        let err = body.decode::<Patch>().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Invalid JSON body")));
    }

    #[test]
    fn test_decode_empty_body_is_validation_error() {
        let body = DeferredJson(Bytes::new());
        assert!(matches!(body.decode::<Patch>(), Err(AppError::Validation(_))));
    }
}
