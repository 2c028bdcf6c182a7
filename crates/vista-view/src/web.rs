//! Glue between the renderer and `http` request/response types

use crate::context::RenderContext;
use crate::error::{Result, ViewError};
use crate::renderer::{RenderOutput, Renderer};
use crate::request::RequestInfo;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body_util::Full;

/// Header set by `XMLHttpRequest` clients
pub const X_REQUESTED_WITH: &str = "x-requested-with";

const HTML: &str = "text/html; charset=utf-8";

/// Whether the headers mark an Ajax request
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get(X_REQUESTED_WITH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Build [`RequestInfo`] from an HTTP request and the routed controller/method
pub fn request_info<B>(
    req: &Request<B>,
    controller: impl Into<String>,
    method: impl Into<String>,
) -> RequestInfo {
    let mut info = RequestInfo::new(controller, method)
        .uri(req.uri().path())
        .ajax(is_ajax(req.headers()));

    if let Some(agent) = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        info = info.user_agent(agent);
    }
    info
}

fn html_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML));
    response
}

impl RenderOutput {
    /// Convert into a `200 OK` HTML response carrying the extra headers
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = html_response(StatusCode::OK, self.body);
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Error page for a failed render: 404 for a missing view, 500 otherwise
pub fn error_response(err: &ViewError) -> Response<Full<Bytes>> {
    let status = err.status_code();
    let body = if status == StatusCode::NOT_FOUND {
        tracing::debug!(error = %err, "View not found");
        "<!DOCTYPE html><html><head><title>Not Found</title></head>\
        <body><h1>404 Not Found</h1>\
        <p>The requested page could not be found</p></body></html>"
    } else {
        tracing::error!("Template rendering failed: {}", err);
        "<!DOCTYPE html><html><head><title>Error</title></head>\
        <body><h1>500 Internal Server Error</h1>\
        <p>Template rendering failed</p></body></html>"
    };
    html_response(status, body.to_string())
}

/// Render the request and convert the outcome into a response
pub fn render_response(renderer: &Renderer, ctx: &mut RenderContext) -> Response<Full<Bytes>> {
    into_response(renderer.render(ctx))
}

/// Convert a render result into a response
pub fn into_response(result: Result<RenderOutput>) -> Response<Full<Bytes>> {
    match result {
        Ok(output) => output.into_response(),
        Err(err) => error_response(&err),
    }
}
