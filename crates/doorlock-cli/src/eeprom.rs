//! EEPROM image backed by a file on the host.
//!
//! The whole image is read once at open and kept in memory. Every write
//! goes straight through to the file, so the image on disk is always what
//! a real part would hold after the same sequence of byte writes.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use doorlock_hardware::{ByteStorage, HardwareError, Result};
use tracing::debug;

/// Value of an unprogrammed EEPROM cell.
pub const ERASED: u8 = 0xFF;

/// [`ByteStorage`] over a file.
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    file: File,
    bytes: Vec<u8>,
}

impl FileEeprom {
    /// Open (or create) the image at `path`.
    ///
    /// An image shorter than `capacity` is extended with erased cells, so a
    /// missing file behaves like a factory-fresh part.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Io` if the file cannot be opened, read or
    /// extended.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes)?;

        let found = bytes.len();
        if found < capacity {
            bytes.resize(capacity, ERASED);
            file.seek(SeekFrom::Start(found as u64))?;
            file.write_all(&bytes[found..])?;
            file.sync_data()?;
        }

        debug!(path = %path.display(), found, capacity = bytes.len(), "EEPROM image opened");

        Ok(Self { path, file, bytes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStorage for FileEeprom {
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

        self.file.seek(SeekFrom::Start(address as u64))?;
        self.file.write_all(&[byte])?;
        Ok(())
    }
}
