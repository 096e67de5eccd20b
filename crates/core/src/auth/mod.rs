//! Credential hashing.
//!
//! Plaintext passwords never leave this module in any form other than a
//! salted Argon2id PHC string.

mod password;

pub use password::{PasswordError, hash_password, verify_password};

/// Returns true if a submitted password should be treated as "not supplied".
#[must_use]
pub fn is_blank(password: Option<&str>) -> bool {
    password.is_none_or(|p| p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("secret1")));
    }
}
