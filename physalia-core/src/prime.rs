//! Prime search for the fingerprint hash prime.
//!
//! Folding canonical-code hashes with the largest prime ≤ the fingerprint
//! width avoids the clustering a power-of-two modulus would produce.

use crate::{PhysaliaError, Result};

/// Primality test by trial division.
///
/// Fingerprint widths are small (≤ a few thousand bits), so trial division
/// up to √n is plenty.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// The largest prime less than or equal to `n`.
///
/// # Errors
///
/// Returns `InvalidInput` if `n < 2` (there is no such prime).
pub fn previous_prime(n: u64) -> Result<u64> {
    if n < 2 {
        return Err(PhysaliaError::InvalidInput(format!(
            "no prime less than or equal to {n}"
        )));
    }
    let mut p = n;
    while !is_prime(p) {
        p -= 1;
    }
    Ok(p)
}
