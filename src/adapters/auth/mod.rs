//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 validation of marketplace-issued tokens
//! - `mock` - test implementation that needs no signing key

mod jwt;
mod mock;

pub use jwt::HsSessionValidator;
pub use mock::MockSessionValidator;
