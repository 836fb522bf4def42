pub mod grant;

pub use grant::{GrantClaims, GrantError, IssuedToken, TokenIssuer};
