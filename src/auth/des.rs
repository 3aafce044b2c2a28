//! DES password substitute, used at password levels 0 and 1.
//!
//! The host never sees the password: the client derives a DES key from
//! the password, encrypts the folded user id into a token, and proves
//! possession by encrypting the seed sum under that token.

use des::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use des::Des;

use crate::ebcdic::EBCDIC_SPACE;
use crate::error::{DbHostError, Result};

/// Compute the 8-byte DES substitute.
///
/// `user` and `password` must be the 10-byte EBCDIC encodings produced
/// by [`super::user_bytes`] and [`super::password_bytes`] at level 0/1.
pub(crate) fn substitute(
    user: &[u8],
    password: &[u8],
    client_seed: &[u8; 8],
    server_seed: &[u8; 8],
) -> Result<Vec<u8>> {
    if user.len() != 10 || password.len() != 10 {
        return Err(DbHostError::Protocol(
            "DES substitute requires 10-byte EBCDIC credential encodings".to_string(),
        ));
    }
    let id8 = fold_user_id(user);

    // Nine- and ten-character passwords produce one token per half,
    // XORed together.
    let token = if password[8] != EBCDIC_SPACE || password[9] != EBCDIC_SPACE {
        let first = token_for(password[0..8].try_into().unwrap(), &id8);
        let mut second_half = [EBCDIC_SPACE; 8];
        second_half[0] = password[8];
        second_half[1] = password[9];
        let second = token_for(&second_half, &id8);
        xor8(first, second)
    } else {
        token_for(password[0..8].try_into().unwrap(), &id8)
    };

    // The proof block is the 64-bit seed sum masked with the user id,
    // encrypted under the token.
    let seed_sum =
        u64::from_be_bytes(*client_seed).wrapping_add(u64::from_be_bytes(*server_seed));
    let mut block = seed_sum.to_be_bytes();
    for (b, id) in block.iter_mut().zip(id8.iter()) {
        *b ^= id;
    }
    Ok(encrypt_block(&token, &block).to_vec())
}

/// Fold the 10-byte user id into a DES block. Trailing characters of a
/// 9- or 10-character id are XORed into the leading bytes.
fn fold_user_id(user: &[u8]) -> [u8; 8] {
    let mut id8: [u8; 8] = user[0..8].try_into().unwrap();
    if user[8] != EBCDIC_SPACE {
        id8[0] ^= user[8];
        id8[1] ^= user[9];
    }
    id8
}

/// Token generation: the password bytes become the DES key (each byte
/// XOR 0x55, whole value shifted left one bit) and the user id is the
/// plaintext block.
fn token_for(password8: &[u8; 8], id8: &[u8; 8]) -> [u8; 8] {
    let mut key = [0u8; 8];
    for (k, p) in key.iter_mut().zip(password8.iter()) {
        *k = p ^ 0x55;
    }
    let key = (u64::from_be_bytes(key) << 1).to_be_bytes();
    encrypt_block(&key, id8)
}

fn xor8(a: [u8; 8], b: [u8; 8]) -> [u8; 8] {
    std::array::from_fn(|i| a[i] ^ b[i])
}

fn encrypt_block(key: &[u8; 8], block: &[u8; 8]) -> [u8; 8] {
    let cipher = Des::new(GenericArray::from_slice(key));
    let mut out = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut out);
    out.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password_bytes, user_bytes};

    fn creds(user: &str, password: &str) -> (Vec<u8>, Vec<u8>) {
        (
            user_bytes(user, 0).unwrap(),
            password_bytes(password, 0).unwrap().to_vec(),
        )
    }

    #[test]
    fn test_substitute_is_deterministic() {
        let (user, password) = creds("QUSER", "PASSWORD");
        let a = substitute(&user, &password, &[1; 8], &[2; 8]).unwrap();
        let b = substitute(&user, &password, &[1; 8], &[2; 8]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_substitute_depends_on_seeds() {
        let (user, password) = creds("QUSER", "PASSWORD");
        let a = substitute(&user, &password, &[1; 8], &[2; 8]).unwrap();
        let b = substitute(&user, &password, &[3; 8], &[2; 8]).unwrap();
        let c = substitute(&user, &password, &[1; 8], &[4; 8]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_substitute_depends_on_password() {
        let (user, password) = creds("QUSER", "PASSWORD");
        let (_, other) = creds("QUSER", "DIFFERENT");
        let a = substitute(&user, &password, &[1; 8], &[2; 8]).unwrap();
        let b = substitute(&user, &other, &[1; 8], &[2; 8]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_long_password_two_token_path() {
        let (user, password) = creds("QUSER", "LONGPASSWD"); // ten characters
        let sub = substitute(&user, &password, &[1; 8], &[2; 8]).unwrap();
        assert_eq!(sub.len(), 8);

        let (_, short) = creds("QUSER", "LONGPASS");
        let other = substitute(&user, &short, &[1; 8], &[2; 8]).unwrap();
        assert_ne!(sub, other);
    }

    #[test]
    fn test_rejects_wrong_encoding_lengths() {
        assert!(substitute(&[0x40; 4], &[0x40; 10], &[0; 8], &[0; 8]).is_err());
        assert!(substitute(&[0x40; 10], &[0x40; 20], &[0; 8], &[0; 8]).is_err());
    }
}
