//! Database provisioning via the control plane.
//!
//! Databases and database users are created asynchronously: the create call
//! returns immediately and the record only becomes usable once a list call
//! observes its `ready` flag. This module owns the only retry loop in the
//! installer; everything else is fire-and-forget by contract.

use std::time::Duration;

use anyhow::Result;

use opal_api::{ApiClient, AppRecord, DbKind, DbRecord};
use opal_core::{Error, secrets};

/// Bounds for the readiness poll: fixed sleep, bounded attempts.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_secs(5),
        }
    }
}

/// Credentials of a provisioned database, as embedded into generated config.
///
/// The password here is byte-identical to the one sent in the create
/// payload; recipes must write it into config files verbatim.
#[derive(Debug, Clone)]
pub struct DbCredentials {
    pub db_name: String,
    pub user: String,
    pub password: String,
}

/// Which list endpoint a readiness poll watches.
#[derive(Debug, Clone, Copy)]
enum Target {
    User,
    Db,
}

fn is_ready(records: &[DbRecord], id: &str) -> bool {
    records.iter().any(|r| r.id == id && r.ready)
}

/// Poll the list endpoint until the record is ready, or fail after the
/// bounded attempt count. Never loops forever.
async fn wait_ready(
    api: &ApiClient,
    kind: DbKind,
    target: Target,
    id: &str,
    resource: &str,
    poll: &PollConfig,
) -> Result<()> {
    for attempt in 1..=poll.attempts {
        let records = match target {
            Target::User => api.dbuser_list(kind).await?,
            Target::Db => api.db_list(kind).await?,
        };
        if is_ready(&records, id) {
            tracing::debug!("{resource} ready after {attempt} attempt(s)");
            return Ok(());
        }
        tracing::debug!("{resource} not ready (attempt {attempt}/{})", poll.attempts);
        if attempt < poll.attempts {
            tokio::time::sleep(poll.interval).await;
        }
    }
    Err(Error::RetriesExhausted {
        resource: resource.to_string(),
        attempts: poll.attempts,
    }
    .into())
}

/// Provision a database user and a database named after the application.
///
/// Create user → poll until ready → create database bound to the user →
/// poll until ready. Exhausting either poll aborts the whole install.
pub async fn provision(
    api: &ApiClient,
    app: &AppRecord,
    kind: DbKind,
    poll: &PollConfig,
) -> Result<DbCredentials> {
    let password = secrets::random_token(20);

    tracing::info!("creating database user {}", app.name);
    let user = api
        .dbuser_create(kind, &app.name, &app.server, &password)
        .await?;
    wait_ready(api, kind, Target::User, &user.id, "database user", poll).await?;

    tracing::info!("creating database {}", app.name);
    let db = api.db_create(kind, &app.name, &app.server, &user.id).await?;
    wait_ready(api, kind, Target::Db, &db.id, "database", poll).await?;

    Ok(DbCredentials {
        db_name: db.name,
        user: user.name,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ready: bool) -> DbRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "testapp",
            "ready": ready,
            "server": "srv-1",
        }))
        .unwrap()
    }

    #[test]
    fn ready_requires_matching_id() {
        let records = vec![record("a", true), record("b", false)];
        assert!(is_ready(&records, "a"));
        assert!(!is_ready(&records, "b"));
        assert!(!is_ready(&records, "c"));
    }

    #[test]
    fn default_poll_is_bounded() {
        let poll = PollConfig::default();
        assert_eq!(poll.attempts, 10);
        assert_eq!(poll.interval, Duration::from_secs(5));
    }
}
