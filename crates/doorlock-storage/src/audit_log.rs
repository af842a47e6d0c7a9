//! Circular audit log persisted in byte-addressable storage.
//!
//! # Layout
//!
//! | Address            | Content                          |
//! |--------------------|----------------------------------|
//! | 0                  | cursor (next slot to overwrite)  |
//! | 1 + 28*i .. +28    | slot `i`, `i` in `0..10`         |
//!
//! # Crash behaviour
//!
//! An append writes the record first and the cursor second. A power cut
//! between the two leaves the new record in place with the old cursor; on
//! reload the cursor is authoritative, so the next append overwrites that
//! same slot again. Nothing is lost that had been fully committed.

use std::iter::FusedIterator;

use doorlock_core::{
    Timestamp,
    constants::{CURSOR_ADDRESS, LOG_BASE_ADDRESS, LOG_CAPACITY, LOG_FOOTPRINT, RECORD_SIZE},
};
use doorlock_hardware::ByteStorage;
use tracing::{debug, info, warn};

use crate::{LogRecord, StorageError, StorageResult};

/// Audit log of the last [`LOG_CAPACITY`] access events.
///
/// Unwritten and cleared slots are `None`. The in-memory copy always
/// mirrors the device: every mutation is written through before returning.
///
/// # Examples
///
/// ```
/// use doorlock_core::Timestamp;
/// use doorlock_hardware::mock::MemoryStorage;
/// use doorlock_storage::AuditLog;
///
/// let mut log = AuditLog::load(MemoryStorage::new(281)).unwrap();
/// assert!(log.is_empty());
///
/// log.append("Father", Timestamp::parse("2024/03/15 08:30:00").unwrap()).unwrap();
/// log.append("Son", Timestamp::parse("2024/03/15 08:31:00").unwrap()).unwrap();
///
/// let labels: Vec<&str> = log.list_recent().map(|r| r.label()).collect();
/// assert_eq!(labels, ["Son", "Father"]);
///
/// // Rehydrate from the same bytes, as after a power cycle
/// let log = AuditLog::load(log.into_inner()).unwrap();
/// assert_eq!(log.len(), 2);
/// ```
#[derive(Debug)]
pub struct AuditLog<S> {
    storage: S,
    slots: [Option<LogRecord>; LOG_CAPACITY],
    cursor: usize,
}

impl<S: ByteStorage> AuditLog<S> {
    /// Rehydrate the log from `storage`.
    ///
    /// A cursor outside `0..10` is treated as 0 and malformed slots as
    /// empty; both are reported as warnings, never as errors.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientCapacity` if the device cannot hold the log
    /// region, or a device error if a read fails.
    pub fn load(storage: S) -> StorageResult<Self> {
        let available = storage.capacity();
        if available < LOG_FOOTPRINT {
            return Err(StorageError::InsufficientCapacity {
                required: LOG_FOOTPRINT,
                available,
            });
        }

        let stored_cursor = usize::from(storage.read(CURSOR_ADDRESS)?);
        let cursor = if stored_cursor < LOG_CAPACITY {
            stored_cursor
        } else {
            warn!(stored_cursor, "Audit log cursor out of range, resetting to 0");
            0
        };

        let mut slots: [Option<LogRecord>; LOG_CAPACITY] = Default::default();
        let mut region = [0u8; RECORD_SIZE];
        for (index, slot) in slots.iter_mut().enumerate() {
            let base = slot_address(index);
            for (offset, byte) in region.iter_mut().enumerate() {
                *byte = storage.read(base + offset)?;
            }

            *slot = LogRecord::decode(&region);
            if slot.is_none() && region.iter().any(|b| *b != 0) {
                warn!(slot = index, "Malformed audit log slot treated as empty");
            }
        }

        let log = Self {
            storage,
            slots,
            cursor,
        };
        debug!(cursor, entries = log.len(), "Audit log loaded");
        Ok(log)
    }

    /// Append a record at the cursor and advance it.
    ///
    /// The oldest record is overwritten once all slots are in use.
    ///
    /// # Errors
    ///
    /// Returns a device error if a write fails. The in-memory copy is only
    /// updated once the record has been written.
    pub fn append(&mut self, label: &str, timestamp: Timestamp) -> StorageResult<()> {
        let record = LogRecord::new(label, timestamp);
        let base = slot_address(self.cursor);

        for (offset, byte) in record.encode().into_iter().enumerate() {
            self.storage.write(base + offset, byte)?;
        }
        self.slots[self.cursor] = Some(record);

        let next = (self.cursor + 1) % LOG_CAPACITY;
        // LOG_CAPACITY fits in one byte
        self.storage.write(CURSOR_ADDRESS, next as u8)?;
        debug!(slot = self.cursor, label, "Audit record written");
        self.cursor = next;

        Ok(())
    }

    /// Records from most recent to oldest, skipping empty slots.
    ///
    /// The iterator borrows the log; calling this again starts over.
    pub fn list_recent(&self) -> RecentEntries<'_> {
        RecentEntries {
            slots: &self.slots,
            next: self.cursor,
            remaining: LOG_CAPACITY,
        }
    }

    /// Zero the cursor and every slot on the device.
    ///
    /// # Errors
    ///
    /// Returns a device error if a write fails; the in-memory copy is then
    /// left as it was and the device may be partially cleared.
    pub fn clear_all(&mut self) -> StorageResult<()> {
        for address in CURSOR_ADDRESS..LOG_FOOTPRINT {
            self.storage.write(address, 0)?;
        }
        self.slots = Default::default();
        self.cursor = 0;
        info!("Audit log cleared");
        Ok(())
    }

    /// Index of the next slot to be overwritten.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Content of slot `index`, `None` when empty or out of range.
    pub fn slot(&self, index: usize) -> Option<&LogRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Number of non-empty slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the underlying device.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Release the underlying device.
    pub fn into_inner(self) -> S {
        self.storage
    }
}

fn slot_address(index: usize) -> usize {
    LOG_BASE_ADDRESS + index * RECORD_SIZE
}

/// Iterator over the log, newest first. See [`AuditLog::list_recent`].
#[derive(Debug, Clone)]
pub struct RecentEntries<'a> {
    slots: &'a [Option<LogRecord>; LOG_CAPACITY],
    /// Slot after the one yielded next, walking backward.
    next: usize,
    /// Slots not yet visited.
    remaining: usize,
}

impl<'a> Iterator for RecentEntries<'a> {
    type Item = &'a LogRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            self.remaining -= 1;
            self.next = (self.next + LOG_CAPACITY - 1) % LOG_CAPACITY;
            if let Some(record) = &self.slots[self.next] {
                return Some(record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for RecentEntries<'_> {}
