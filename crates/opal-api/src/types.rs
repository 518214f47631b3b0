//! Control-plane API response types.

use serde::Deserialize;

/// Application record: metadata describing one provisioned hosting slot.
///
/// Created by the platform before the installer runs. Immutable from the
/// installer's perspective except for the final installed flip.
#[derive(Debug, Clone, Deserialize)]
pub struct AppRecord {
    /// Application UUID.
    pub id: String,
    /// Application name; also the directory name under `~/apps/`.
    pub name: String,
    /// Assigned TCP port.
    pub port: u16,
    /// Owning OS user.
    pub osuser_name: String,
    /// Owning server identifier.
    #[serde(default)]
    pub server: String,
}

/// Database or database-user record, as returned by the `*/list/` endpoints.
///
/// The `ready` flag flips to true once the control plane has finished the
/// asynchronous provisioning; the record is unusable before that.
#[derive(Debug, Clone, Deserialize)]
pub struct DbRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub server: String,
}

/// Response of `POST /login/`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}
