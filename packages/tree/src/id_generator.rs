use crc32fast::Hasher;

/// Derive a stable store ID from its location using CRC32
pub fn get_store_id(location: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(location.as_bytes());
    format!("{:08x}", hasher.finalize())
}

/// CRC32 checksum of raw bytes, used to detect out-of-band changes
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Sequential ID generator for publication units of one store
#[derive(Debug, Clone)]
pub struct UnitIdGenerator {
    seed: String,
    count: u64,
}

impl UnitIdGenerator {
    pub fn new(location: &str) -> Self {
        Self {
            seed: get_store_id(location),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }
}
