//! POST /api/upload
//!
//! Placeholder for legal document ingestion. Protected by the gate; the body
//! is read within the usual size limit and discarded.

use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use tracing::info;

use crate::routes::response::{json_response, read_body, BoxBody};

pub const UPLOAD_PLACEHOLDER_MESSAGE: &str = "Document upload endpoint - to be implemented";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
}

pub async fn handle_upload<B>(req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = match read_body(req).await {
        Ok(bytes) => bytes,
        Err(e) => return e.into(),
    };

    info!(bytes = bytes.len(), "Document upload received (not stored)");
    json_response(
        StatusCode::OK,
        &UploadResponse {
            message: UPLOAD_PLACEHOLDER_MESSAGE,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::response::test_support::body_json;
    use crate::routes::response::MAX_BODY_BYTES;
    use bytes::Bytes;
    use http_body_util::Full;

    fn upload(body: Vec<u8>) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-type", "application/pdf")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_placeholder() {
        let response = handle_upload(upload(b"%PDF-1.7".to_vec())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], UPLOAD_PLACEHOLDER_MESSAGE);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let response = handle_upload(upload(vec![0u8; MAX_BODY_BYTES + 1])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
