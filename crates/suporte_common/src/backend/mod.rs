//! Ticketing backend client.
//!
//! All backend calls run inside a session: `initSession` issues a token,
//! the operation runs with it, `killSession` releases it. `TicketingClient`
//! owns that lifecycle so callers never see an open session escape.

mod client;
mod credentials;
mod session;

pub use client::{CategoryCreation, TicketingClient};
pub use credentials::CredentialProvider;
pub use session::{PhaseTrace, Session, SessionPhase};

/// Mask a secret for logging (first 8 chars only)
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 8 {
        let head: String = secret.chars().take(8).collect();
        format!("{}...", head)
    } else {
        "***".to_string()
    }
}
