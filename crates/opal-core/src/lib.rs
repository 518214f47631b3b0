//! Core library shared by the Opal installers.
//!
//! Holds the pieces every installer needs regardless of which application it
//! provisions: the error taxonomy, secret/token generation, and tracing
//! initialization.

pub mod error;
pub mod secrets;
pub mod tracing_init;

pub use error::{Error, Result};
