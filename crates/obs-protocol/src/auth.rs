//! Handshake authentication
//!
//! When the server's `Hello` carries a challenge, the client proves knowledge
//! of the password without sending it:
//!
//! ```text
//! secret = base64(sha256(password + salt))
//! auth   = base64(sha256(secret + challenge))
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::message::AuthChallenge;

/// Compute the `authentication` string sent in `Identify`.
pub fn authentication_string(password: &str, challenge: &AuthChallenge) -> String {
    let secret = STANDARD.encode(Sha256::digest(
        format!("{}{}", password, challenge.salt).as_bytes(),
    ));
    STANDARD.encode(Sha256::digest(
        format!("{}{}", secret, challenge.challenge).as_bytes(),
    ))
}
