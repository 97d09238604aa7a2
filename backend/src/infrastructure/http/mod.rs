//! Axum front end: every path the router doesn't serve itself goes to the
//! page dispatcher.
mod language;

pub use language::negotiate_language;

use crate::application::dto::{DispatchOutcome, HttpMethod, PageRequest, PageResponse};
use crate::application::services::{DispatchError, PageDispatcher, StaticRoutes};
use crate::infrastructure::persistence::SqlitePageRepository;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub const HEALTH_PATH: &str = "/healthz/";

/// Bytes escaped in a `Location` header; non-ASCII is always escaped
const LOCATION_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>');

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<PageDispatcher>,
    pub repository: Arc<Mutex<SqlitePageRepository>>,
}

impl AppState {
    pub fn new(dispatcher: PageDispatcher, repository: SqlitePageRepository) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            repository: Arc::new(Mutex::new(repository)),
        }
    }
}

/// Routes the router answers before the page tree is consulted
pub fn static_routes() -> Result<StaticRoutes, regex::Error> {
    StaticRoutes::new().route(r"^/healthz/$", Some("health"), Some("healthz"))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(healthz))
        .fallback(dispatch_page)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn dispatch_page(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let language = negotiate_language(accept_language, state.dispatcher.languages());

    // Slugs are stored decoded, so `/%C3%BCber/` has to match `/über/`
    let path = match percent_decode_str(uri.path()).decode_utf8() {
        Ok(path) => path,
        Err(_) => {
            warn!("Request path '{}' is not valid UTF-8", uri.path());
            return page_response(
                PageResponse::text("Invalid path encoding")
                    .with_status(StatusCode::BAD_REQUEST.as_u16()),
            );
        }
    };

    let mut request =
        PageRequest::new(path.into_owned(), language).with_method(HttpMethod::from_name(method.as_str()));
    if let Some(query) = uri.query() {
        request = request.with_query_string(query);
    }

    let result = {
        let repository = state.repository.lock().await;
        state.dispatcher.dispatch(&*repository, &request)
    };

    match result {
        Ok(DispatchOutcome::Rendered { response, language, .. }) => {
            let mut response = page_response(response);
            if let Ok(value) = HeaderValue::from_str(language.as_str()) {
                response.headers_mut().insert(header::CONTENT_LANGUAGE, value);
            }
            response
        }
        Ok(DispatchOutcome::Redirect { location, status }) => {
            page_response(PageResponse::redirect(location, status))
        }
        Err(e) => error_response(&e, state.dispatcher.options().debug),
    }
}

fn page_response(page: PageResponse) -> Response {
    let status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, page.body).into_response();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&page.content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    for (name, value) in &page.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes());
        let header_value = match &header_name {
            Ok(header_name) if *header_name == header::LOCATION => {
                HeaderValue::from_str(&utf8_percent_encode(value, LOCATION_ESCAPES).to_string())
            }
            _ => HeaderValue::from_str(value),
        };
        match (header_name, header_value) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!("Dropping invalid response header '{}'", name),
        }
    }
    response
}

/// Server errors only show their message in debug mode
fn error_response(e: &DispatchError, debug: bool) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if status.is_server_error() {
        error!("Dispatch failed: {}", e);
        if debug {
            e.to_string()
        } else {
            "Internal Server Error".to_string()
        }
    } else {
        e.to_string()
    };

    let mut response = page_response(PageResponse::text(body).with_status(status.as_u16()));
    if let DispatchError::MethodNotAllowed(_) = e {
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET, POST"));
    }
    response
}
