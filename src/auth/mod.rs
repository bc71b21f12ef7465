//! Access to Vault-managed storage.
//!
//! Some Databus files live behind a redirect to a protected host. Fetching
//! them needs a Bearer token scoped to that host, obtained by exchanging the
//! user's refresh token at an OpenID Connect endpoint.

mod error;
mod refresh_token;
mod token;

pub use error::{AuthError, TokenStep};
pub use refresh_token::{REFRESH_TOKEN_ENV, RefreshTokenSource};
pub use token::{DEFAULT_AUTH_URL, DEFAULT_CLIENT_ID, TokenExchangeClient, TokenSet};
