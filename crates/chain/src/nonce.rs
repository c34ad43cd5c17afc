//! Random nonces that keep record codes unique on the service.

use rand::Rng;

/// Returns `size` random bytes as a lowercase hex string.
///
/// Only collision avoidance matters here, so the thread-local RNG is enough.
pub fn generate(size: usize) -> String {
    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill(bytes.as_mut_slice());
    hex::encode(bytes)
}
