//! Machine configuration.

/// NES configuration.
pub struct NesConfig {
    /// iNES file contents.
    pub rom_data: Vec<u8>,
}
