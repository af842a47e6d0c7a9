//! In-memory EEPROM.

use crate::{HardwareError, Result, traits::ByteStorage};

/// Value of an erased EEPROM cell.
pub const ERASED: u8 = 0xFF;

/// Byte storage backed by a `Vec<u8>`.
///
/// A new device reads `0xFF` everywhere, like factory-fresh EEPROM, so the
/// audit log sees a garbage cursor and ten invalid slots on first boot.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MemoryStorage;
/// use doorlock_hardware::traits::ByteStorage;
///
/// let mut eeprom = MemoryStorage::new(512);
/// assert_eq!(eeprom.read(0).unwrap(), 0xFF);
///
/// eeprom.write(0, 3).unwrap();
/// assert_eq!(eeprom.read(0).unwrap(), 3);
/// assert!(eeprom.read(512).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStorage {
    bytes: Vec<u8>,
    writes: usize,
}

impl MemoryStorage {
    /// Erased device of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::from_bytes(vec![ERASED; capacity])
    }

    /// Device holding an existing image, e.g. to simulate a reboot.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, writes: 0 }
    }

    /// Raw device contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the device, returning its image.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of byte writes since creation (EEPROM wear indicator).
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl ByteStorage for MemoryStorage {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, address: usize) -> Result<u8> {
        self.bytes
            .get(address)
            .copied()
            .ok_or_else(|| HardwareError::address_out_of_range(address, self.bytes.len()))
    }

    fn write(&mut self, address: usize, byte: u8) -> Result<()> {
        let capacity = self.bytes.len();
        let cell = self
            .bytes
            .get_mut(address)
            .ok_or_else(|| HardwareError::address_out_of_range(address, capacity))?;
        *cell = byte;
        self.writes += 1;
        Ok(())
    }
}
