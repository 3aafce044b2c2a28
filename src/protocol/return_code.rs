//! Authentication return-code catalog.
//!
//! Start-server and signon replies carry a 32-bit return code. Zero is
//! success. The high half groups codes into categories; a handful of
//! exact values have specific meanings worth surfacing to users.

/// Describe a nonzero return code, if the catalog knows it.
///
/// Category matches on the high 16 bits win regardless of the low half;
/// otherwise the exact value is looked up. `None` means the code is
/// unknown to this client.
pub fn describe(code: u32) -> Option<&'static str> {
    match code & 0xFFFF_0000 {
        0x0001_0000 => return Some("Error on request data"),
        0x0004_0000 => return Some("General security error, function not performed"),
        0x0006_0000 => return Some("Authentication Token error"),
        _ => {}
    }
    match code {
        0x0002_0001 => Some("Userid error: User Id unknown"),
        0x0002_0002 => Some("Userid error: User Id valid, but revoked"),
        0x0002_0003 => Some("Userid error: User Id mismatch with authentication token"),
        0x0003_000B => Some("Password error: Password or Passphrase incorrect"),
        0x0003_000C => Some(
            "Password error: User profile will be revoked on next invalid password or passphrase",
        ),
        0x0003_000D => Some("Password error: Password or Passphrase correct, but expired"),
        0x0003_000E => Some("Password error: Pre-V2R2 encrypted password"),
        0x0003_0010 => Some("Password error: Password is *NONE"),
        _ => None,
    }
}
