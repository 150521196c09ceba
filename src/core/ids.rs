use sha2::{Digest, Sha256};

const SHORT_ID_LEN: usize = 12;

/// First 12 hex chars of the SHA-256 digest of `data`.
pub fn short_hash(data: &str) -> String {
    let hash = Sha256::digest(data.as_bytes());
    let mut hex = format!("{hash:x}");
    hex.truncate(SHORT_ID_LEN);
    hex
}
