// Refresh-token value objects. Immutable and Send + Sync so they can cross
// the async store ports freely.

mod refresh_token;
mod revocation_reason;

pub(crate) use refresh_token::digest_token;
pub use refresh_token::{RefreshToken, RefreshTokenError};
pub use revocation_reason::RevocationReason;
