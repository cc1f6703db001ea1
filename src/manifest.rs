//! Remote update manifest document

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DEGRADED_UPDATE_LOG;
use crate::http::Response;

/// The JSON document published at the manifest endpoint.
///
/// Only `latestVersion` is required; `updateLog` defaults to empty and any
/// additional fields are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub latest_version: String,

    #[serde(default)]
    pub update_log: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    pub fn new(latest_version: impl Into<String>, update_log: impl Into<String>) -> Self {
        Self {
            latest_version: latest_version.into(),
            update_log: update_log.into(),
            extra: Map::new(),
        }
    }

    /// Degraded-mode stand-in served when the manifest origin is unreachable.
    /// Semantically "no update known": it echoes the version already running.
    pub fn fallback(current_version: &str) -> Self {
        Self::new(current_version, DEGRADED_UPDATE_LOG)
    }

    /// Render as a status-200 JSON response body.
    pub fn to_response(&self) -> Response {
        let body = serde_json::to_vec(self).expect("manifest document serializes to JSON");
        Response::new(200, body).with_header("content-type", "application/json")
    }
}
