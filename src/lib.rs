//! twiml-reminder: spoken medication reminders for telephony call legs.
//!
//! - `twiml`: renders the Tamil reminder voice document
//! - `api`: axum webhook the telephony platform fetches the document from
//! - `call`: places outbound calls that play a rendered document inline
//! - `email`: sends the same reminder as a plain-text email
//! - `config`: YAML + environment configuration

pub mod api;
pub mod call;
pub mod config;
pub mod email;
pub mod twiml;

use tracing_subscriber::EnvFilter;

/// Initialize logging. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,hyper=info,reqwest=info")
        } else {
            EnvFilter::new("info,hyper=warn,reqwest=warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
