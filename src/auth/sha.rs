//! SHA-1 password substitute, used at password levels 2 and 3.

use sha1::{Digest, Sha1};

/// Byte length of a SHA-1 substitute.
pub const SUBSTITUTE_LEN: usize = 20;

/// Request sequence number mixed into the substitute; the start-server
/// request is always the first authenticated request on a connection.
const SEQUENCE: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

/// Compute the 20-byte SHA-1 substitute.
///
/// `user` and `password` are the UTF-16BE encodings produced by
/// [`super::user_bytes`] and [`super::password_bytes`] at level 2/3.
pub(crate) fn substitute(
    user: &[u8],
    password: &[u8],
    client_seed: &[u8; 8],
    server_seed: &[u8; 8],
) -> Vec<u8> {
    let token = token(user, password);
    let mut hasher = Sha1::new();
    hasher.update(token);
    hasher.update(server_seed);
    hasher.update(client_seed);
    hasher.update(user);
    hasher.update(SEQUENCE);
    hasher.finalize().to_vec()
}

/// Password token: SHA-1 over the concatenated user id and password.
fn token(user: &[u8], password: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(user);
    hasher.update(password);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password_bytes, user_bytes};

    fn creds(user: &str, password: &str) -> (Vec<u8>, Vec<u8>) {
        (
            user_bytes(user, 2).unwrap(),
            password_bytes(password, 2).unwrap().to_vec(),
        )
    }

    #[test]
    fn test_substitute_shape() {
        let (user, password) = creds("QUSER", "secret");
        let sub = substitute(&user, &password, &[1; 8], &[2; 8]);
        assert_eq!(sub.len(), SUBSTITUTE_LEN);

        // Deterministic for fixed inputs.
        assert_eq!(sub, substitute(&user, &password, &[1; 8], &[2; 8]));
    }

    #[test]
    fn test_substitute_depends_on_every_input() {
        let (user, password) = creds("QUSER", "secret");
        let base = substitute(&user, &password, &[1; 8], &[2; 8]);

        let (other_user, _) = creds("QPGMR", "secret");
        let (_, other_password) = creds("QUSER", "Secret");

        assert_ne!(base, substitute(&other_user, &password, &[1; 8], &[2; 8]));
        assert_ne!(base, substitute(&user, &other_password, &[1; 8], &[2; 8]));
        assert_ne!(base, substitute(&user, &password, &[9; 8], &[2; 8]));
        assert_ne!(base, substitute(&user, &password, &[1; 8], &[9; 8]));
    }

    #[test]
    fn test_token_is_order_sensitive() {
        let a = token(b"AB", b"CD");
        let b = token(b"CD", b"AB");
        assert_ne!(a, b);
    }
}
