use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::encode_metrics;
use crate::BusError;
use crate::ChangeEvent;
use crate::ConfigKey;
use crate::ConfigStore;
use crate::Error;
use crate::LocalBus;
use crate::REGISTRY;

/// Body of `POST /bus/refresh`; an empty body refreshes everything
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub keys: BTreeSet<ConfigKey>,
    #[serde(default)]
    pub version: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RefreshAccepted {
    pub id: String,
    pub subscribers: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key: Option<String>,
}

fn error_reply(
    status: StatusCode,
    error: impl Into<String>,
    key: Option<&str>,
) -> Response {
    let body = ErrorBody {
        error: error.into(),
        key: key.map(str::to_string),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

pub fn read_value(
    store: &ConfigStore,
    key: &str,
) -> Response {
    match store.get(key) {
        Ok(value) => warp::reply::with_status(value, StatusCode::OK).into_response(),
        Err(Error::NotFound { key }) => {
            debug!(%key, "read of unconfigured key");
            error_reply(StatusCode::NOT_FOUND, "not configured", Some(key.as_str()))
        }
        Err(e) => {
            error!(key, error = %e, "read failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Some(key))
        }
    }
}

pub fn publish_refresh(
    bus: &LocalBus,
    body: &[u8],
) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        match serde_json::from_slice::<RefreshRequest>(body) {
            Ok(request) => request,
            Err(e) => {
                return error_reply(
                    StatusCode::BAD_REQUEST,
                    format!("malformed refresh request: {e}"),
                    None,
                )
            }
        }
    };

    let mut event = ChangeEvent::new(request.keys).with_origin("http");
    if let Some(version) = request.version {
        event = event.with_version(version);
    }
    let id = event.id.clone();

    match bus.publish(event) {
        Ok(subscribers) => {
            let accepted = RefreshAccepted { id, subscribers };
            warp::reply::with_status(warp::reply::json(&accepted), StatusCode::ACCEPTED)
                .into_response()
        }
        Err(Error::Bus(BusError::NoSubscribers)) => {
            warn!(event_id = %id, "refresh requested but no instance is subscribed");
            error_reply(StatusCode::SERVICE_UNAVAILABLE, "no subscribers", None)
        }
        Err(e) => error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
    }
}

pub fn metrics_reply() -> Response {
    warp::reply::with_header(
        encode_metrics(&REGISTRY),
        "content-type",
        "text/plain; version=0.0.4",
    )
    .into_response()
}
