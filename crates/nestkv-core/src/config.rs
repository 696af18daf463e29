//! Configuration management for NestKV
//!
//! Provides memory tier presets for different hardware classes. The limits
//! bound every string the store duplicates; exceeding one is reported as an
//! allocation failure (`MEM`).

/// NestKV configuration with memory tier presets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Total bytes of owned strings (names, keys, values) the store may hold
    pub max_memory_bytes: u64,
    /// Maximum namespace / sub-namespace name size in bytes
    pub max_name_size: usize,
    /// Maximum key size in bytes
    pub max_key_size: usize,
    /// Maximum value size in bytes
    pub max_value_size: usize,
}

impl Config {
    /// Server-class: 64GB machine, 8GB for NestKV
    pub fn server() -> Self {
        Self {
            max_memory_bytes: 8 * 1024 * 1024 * 1024,
            max_name_size: 256,
            max_key_size: 1024,
            max_value_size: 32 * 1024 * 1024,
        }
    }

    /// Phone-class: 16GB device, 512MB for NestKV
    pub fn phone() -> Self {
        Self {
            max_memory_bytes: 512 * 1024 * 1024,
            max_name_size: 128,
            max_key_size: 512,
            max_value_size: 16 * 1024 * 1024,
        }
    }

    /// Budget-class: 4GB device, 64MB for NestKV
    pub fn budget() -> Self {
        Self {
            max_memory_bytes: 64 * 1024 * 1024,
            max_name_size: 64,
            max_key_size: 128,
            max_value_size: 1024 * 1024,
        }
    }

    /// No limits beyond what the allocator itself can satisfy.
    pub fn unbounded() -> Self {
        Self {
            max_memory_bytes: u64::MAX,
            max_name_size: usize::MAX,
            max_key_size: usize::MAX,
            max_value_size: usize::MAX,
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_memory_bytes == 0 {
            return Err("max_memory_bytes must be > 0".into());
        }
        if self.max_name_size == 0 {
            return Err("max_name_size must be > 0".into());
        }
        if self.max_key_size == 0 {
            return Err("max_key_size must be > 0".into());
        }
        if self.max_value_size == 0 {
            return Err("max_value_size must be > 0".into());
        }
        let largest = self.max_name_size.max(self.max_key_size).max(self.max_value_size);
        if self.max_memory_bytes != u64::MAX && largest as u64 > self.max_memory_bytes {
            return Err("per-string limits must not exceed max_memory_bytes".into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self { Self::server() }
}
