use axum::{
    body::Body,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::proxy::JobResult;

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub cursor: Option<String>,
}

/// 将核心结果原样写回客户端：状态码、Content-Type 与响应体字节
pub struct ProxyResponse(pub JobResult);

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let JobResult {
            status,
            content_type,
            data,
        } = self.0;
        let status = StatusCode::from_u16(status).unwrap_or_else(|_| {
            tracing::warn!("Upstream returned invalid status {}", status);
            StatusCode::INTERNAL_SERVER_ERROR
        });

        let body = data.map(Body::from).unwrap_or_else(Body::empty);
        let mut response = (status, body).into_response();
        if let Some(value) = content_type.and_then(|ct| ct.parse().ok()) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }
}
