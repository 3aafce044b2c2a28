//! Credential material and password substitutes.
//!
//! The password level negotiated during signon decides both the text
//! encodings and the substitute algorithm:
//!
//! | Level | User id                       | Password  | Substitute      |
//! |-------|-------------------------------|-----------|-----------------|
//! | 0, 1  | EBCDIC, 10 bytes, uppercased  | EBCDIC    | DES, 8 bytes    |
//! | 2, 3  | UTF-16BE, 10 chars, uppercased| UTF-16BE  | SHA-1, 20 bytes |
//!
//! Plaintext password bytes live in a [`Zeroizing`] buffer for exactly
//! the substitute computation and are wiped on drop. Nothing in this
//! module logs or formats the plaintext.

pub mod des;
pub mod sha;

use zeroize::Zeroizing;

use crate::ebcdic;
use crate::error::{DbHostError, Result};

/// Password level at which the SHA-1 scheme replaces DES.
pub const SHA_PASSWORD_LEVEL: u8 = 2;

/// Encode a user id per the negotiated password level.
pub fn user_bytes(user: &str, password_level: u8) -> Result<Vec<u8>> {
    let upper = user.trim().to_uppercase();
    if upper.is_empty() || upper.chars().count() > 10 {
        return Err(DbHostError::Protocol(
            "user id must be 1 to 10 characters".to_string(),
        ));
    }
    if password_level < SHA_PASSWORD_LEVEL {
        ebcdic::from_str_padded(&upper, 10)
    } else {
        Ok(utf16_be(&format!("{upper:<10}")))
    }
}

/// Encode a password per the negotiated password level.
///
/// The result is zeroized on drop; callers hold it only across the
/// substitute computation.
pub fn password_bytes(password: &str, password_level: u8) -> Result<Zeroizing<Vec<u8>>> {
    if password.is_empty() {
        return Err(DbHostError::Protocol("password must not be empty".to_string()));
    }
    if password_level < SHA_PASSWORD_LEVEL {
        let upper = Zeroizing::new(password.to_uppercase());
        Ok(Zeroizing::new(ebcdic::from_str_padded(&upper, 10)?))
    } else {
        Ok(Zeroizing::new(utf16_be(password)))
    }
}

/// Compute the encrypted password substitute for the start-server round.
pub fn encrypted_password(
    user_bytes: &[u8],
    password_bytes: &[u8],
    client_seed: &[u8; 8],
    server_seed: &[u8; 8],
    password_level: u8,
) -> Result<Vec<u8>> {
    if password_level < SHA_PASSWORD_LEVEL {
        self::des::substitute(user_bytes, password_bytes, client_seed, server_seed)
    } else {
        Ok(self::sha::substitute(
            user_bytes,
            password_bytes,
            client_seed,
            server_seed,
        ))
    }
}

/// Encryption-scheme selector byte for the start-server template.
pub fn encryption_type(substitute_len: usize) -> u8 {
    if substitute_len == 8 {
        1
    } else {
        3
    }
}

fn utf16_be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_bytes_des_level() {
        let bytes = user_bytes("quser", 0).unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(&bytes[..5], &[0xD8, 0xE4, 0xE2, 0xC5, 0xD9]); // QUSER
        assert_eq!(&bytes[5..], &[0x40; 5]);
    }

    #[test]
    fn test_user_bytes_sha_level() {
        let bytes = user_bytes("quser", 2).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..4], &[0x00, b'Q', 0x00, b'U']);
        assert_eq!(&bytes[18..], &[0x00, b' ']);
    }

    #[test]
    fn test_user_bytes_rejects_bad_lengths() {
        assert!(user_bytes("", 0).is_err());
        assert!(user_bytes("ELEVENCHARS", 0).is_err());
    }

    #[test]
    fn test_password_bytes_case_handling() {
        // DES passwords are case-insensitive on the host; SHA passwords
        // are sent as typed.
        let des = password_bytes("secret", 0).unwrap();
        assert_eq!(des.len(), 10);
        assert_eq!(des[0], 0xE2); // S

        let sha = password_bytes("secret", 2).unwrap();
        assert_eq!(sha.len(), 12);
        assert_eq!(sha[1], b's');
    }

    #[test]
    fn test_encryption_type_selector() {
        assert_eq!(encryption_type(8), 1);
        assert_eq!(encryption_type(20), 3);
    }

    #[test]
    fn test_substitute_lengths_per_level() {
        let client_seed = [0x01; 8];
        let server_seed = [0x02; 8];

        let user = user_bytes("QUSER", 0).unwrap();
        let password = password_bytes("PASS", 0).unwrap();
        let des = encrypted_password(&user, &password, &client_seed, &server_seed, 0).unwrap();
        assert_eq!(des.len(), 8);

        let user = user_bytes("QUSER", 2).unwrap();
        let password = password_bytes("pass", 2).unwrap();
        let sha = encrypted_password(&user, &password, &client_seed, &server_seed, 2).unwrap();
        assert_eq!(sha.len(), 20);
    }
}
