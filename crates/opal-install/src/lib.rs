//! Provisioning toolkit and per-application recipes for the Opal installers.
//!
//! Each recipe drives the same sequence: resolve the application record,
//! optionally provision a database via the control plane, install the
//! software, generate config and lifecycle scripts, register the cron
//! keepalive, start the service once, and report completion.

pub mod cmd;
pub mod context;
pub mod cron;
pub mod db;
pub mod files;
pub mod recipes;
pub mod scripts;
