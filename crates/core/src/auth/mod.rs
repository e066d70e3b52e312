//! Authentication primitives.
//!
//! Only password hashing lives here; token handling is in `tala-shared`.

mod password;

pub use password::{PasswordError, hash_password, verify_password};
