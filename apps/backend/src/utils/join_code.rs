//! Join code generation for rooms.
//!
//! Room codes are 6-character strings over Crockford's Base32 alphabet,
//! which drops the visually confusable I, L, O and U. Uniqueness among
//! live rooms is enforced by the database; on a collision the caller
//! simply generates again.

use rand::Rng;

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U

pub const JOIN_CODE_LEN: usize = 6;

/// Generate a random room join code.
pub fn generate_join_code() -> String {
    let mut rng = rand::rng();

    let mut s = String::with_capacity(JOIN_CODE_LEN);
    for _ in 0..JOIN_CODE_LEN {
        s.push(CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char);
    }
    s
}
