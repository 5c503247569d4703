//! Authentication domain.
//!
//! - [`token::SessionToken`]: the opaque bearer credential issued on login
//! - [`credentials::Credentials`] / [`credentials::SignupForm`]: validated form input
//! - [`user::User`]: the signed-in user's profile

pub mod credentials;
pub mod token;
pub mod user;
