//! Authentication state.
//!
//! - [`claims`]: unverified access-token decoding (display hints only)
//! - [`profile_image`]: profile image normalization
//! - [`session`]: session restore, sign-in flavours, logout

pub mod claims;
pub mod profile_image;
pub mod session;

pub use claims::{TokenClaims, decode_unverified};
pub use profile_image::{normalize_profile_image, resolve_profile_image};
pub use session::{Session, SessionManager};
