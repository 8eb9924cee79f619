//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one task per connection. Every request runs
//! under the configured deadline, and a client that hangs up drops the handler
//! future along with any store call it was waiting on.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Body, Incoming};
use hyper::header::AUTHORIZATION;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{AccessGate, SessionCodec};
use crate::routes::{self, contacts, users, HttpResponse};
use crate::store::UserStore;
use crate::types::Result;

/// Prefix the routes are also mounted under
pub const API_PREFIX: &str = "/api/v1";

/// Shared application state, built once at startup
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub gate: AccessGate,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, codec: SessionCodec, request_timeout: Duration) -> Self {
        let gate = AccessGate::new(codec, Arc::clone(&store));
        Self {
            store,
            gate,
            request_timeout,
        }
    }
}

/// Accept connections on `listen` until the task is dropped
pub async fn run(state: Arc<AppState>, listen: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!("Address book listening on {}", listener.local_addr()?);

    serve(state, listener).await
}

/// Serve an already bound listener
pub async fn serve(state: Arc<AppState>, listener: TcpListener) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route one request, bounded by the request deadline
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> std::result::Result<HttpResponse, Infallible>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match tokio::time::timeout(state.request_timeout, dispatch(&state, req)).await
    {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => routes::from_error(&e),
        Err(_) => {
            warn!(
                "[{}] {} {} exceeded {:?}",
                addr, method, path, state.request_timeout
            );
            routes::error_response(StatusCode::SERVICE_UNAVAILABLE, "request timed out")
        }
    };

    Ok(response)
}

/// Strip the optional API prefix and split the rest into path segments
fn segments(path: &str) -> Vec<&str> {
    let route = match path.strip_prefix(API_PREFIX) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };

    route.split('/').filter(|s| !s.is_empty()).collect()
}

async fn dispatch<B>(state: &AppState, req: Request<B>) -> Result<HttpResponse>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let authorization = req.headers().get(AUTHORIZATION).cloned();

    let store = state.store.as_ref();
    let gate = &state.gate;
    let auth = authorization.as_ref();

    let response = match (&method, segments(&path).as_slice()) {
        (&Method::OPTIONS, _) => routes::preflight_response(),

        (&Method::GET, ["health"]) => routes::health_check(),

        // Accounts
        (&Method::POST, ["users"]) => {
            let body = routes::read_body(req.into_body(), routes::JSON_BODY_LIMIT).await?;
            users::create_user(store, &body).await?
        }
        (&Method::POST, ["users", "login"]) => {
            let body = routes::read_body(req.into_body(), routes::JSON_BODY_LIMIT).await?;
            users::login(store, gate.codec(), &body).await?
        }
        (&Method::GET, ["users", "me"]) => {
            let session = gate.admit(auth).await?;
            users::me(&session)
        }
        (&Method::GET, ["users", username]) => users::get_user(store, username).await?,

        // Contacts
        (&Method::GET, ["contacts"]) => contacts::list(store, &gate.admit(auth).await?).await?,
        (&Method::POST, ["contacts"]) => {
            let session = gate.admit(auth).await?;
            let body = routes::read_body(req.into_body(), routes::JSON_BODY_LIMIT).await?;
            contacts::create(store, &session, &body).await?
        }
        (&Method::GET, ["contacts", "export"]) => {
            contacts::export(store, &gate.admit(auth).await?).await?
        }
        (&Method::POST, ["contacts", "import"]) => {
            let session = gate.admit(auth).await?;
            let body = routes::read_body(req.into_body(), routes::IMPORT_BODY_LIMIT).await?;
            contacts::import(store, &session, &body).await?
        }
        (&Method::GET, ["contacts", id]) => contacts::find(store, &gate.admit(auth).await?, id).await?,
        (&Method::POST, ["contacts", id]) => {
            let session = gate.admit(auth).await?;
            let body = routes::read_body(req.into_body(), routes::JSON_BODY_LIMIT).await?;
            contacts::update(store, &session, id, &body).await?
        }
        (&Method::DELETE, ["contacts", id]) => {
            contacts::delete(store, &gate.admit(auth).await?, id).await?
        }

        (_, ["health"] | ["users"] | ["users", _] | ["contacts"] | ["contacts", _]) => {
            routes::method_not_allowed_response()
        }

        _ => routes::not_found_response(),
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_strip_api_prefix() {
        assert_eq!(segments("/users/login"), vec!["users", "login"]);
        assert_eq!(segments("/api/v1/users/login"), vec!["users", "login"]);
        assert_eq!(segments("/api/v1"), Vec::<&str>::new());
        assert_eq!(segments("/contacts/"), vec!["contacts"]);
        // Only a whole-segment prefix is stripped
        assert_eq!(segments("/api/v10/users"), vec!["api", "v10", "users"]);
    }
}
