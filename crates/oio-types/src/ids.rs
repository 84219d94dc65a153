// Path: crates/oio-types/src/ids.rs
use rand::RngCore;
use std::fmt;

/// A 32-byte content identifier, generated at write time and rendered as
/// uppercase hex in every REST response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub [u8; 32]);

impl ContentId {
    /// Generates a fresh random content id.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_hex_upper(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let raw = hex::decode(s)?;
        let mut out = [0u8; 32];
        if raw.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        out.copy_from_slice(&raw);
        Ok(Self(out))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_upper())
    }
}

/// A 16-byte chunk hash, filled in by the upload engine once the chunk has
/// actually been streamed to its RAWX destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkHash(pub [u8; 16]);

impl ChunkHash {
    pub fn to_hex_lower(&self) -> String {
        hex::encode(self.0)
    }
}

/// Generates a random 32-hex-char chunk suffix, used to build chunk URLs of
/// the form `http://<rawx_addr>/<random_32hex>`.
pub fn random_chunk_suffix() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Current Unix time in seconds, used for `ctime`/`atime`/TTL bookkeeping
/// throughout the resolver cache and conscience registry.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_roundtrips_through_hex() {
        let id = ContentId::random();
        let hex = id.to_hex_upper();
        let parsed = ContentId::from_hex(&hex).expect("valid hex");
        assert_eq!(id, parsed);
    }

    #[test]
    fn content_id_rejects_wrong_length() {
        assert!(ContentId::from_hex("ABCD").is_err());
    }
}
