//! LC-3 memory subsystem.
//!
//! A flat store of 65536 sixteen-bit words. Every access is bounds
//! checked; an out-of-range address is reported, never clamped.

use super::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable memory cells.
pub const MEMORY_SIZE: usize = 1 << 16;

/// LC-3 memory: 65536 sixteen-bit cells.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read the cell at `addr`.
    #[inline]
    pub fn read(&self, addr: i32) -> Result<Word, MemoryError> {
        let index = Self::index(addr)?;
        Ok(self.cells[index])
    }

    /// Write `value` to the cell at `addr`.
    #[inline]
    pub fn write(&mut self, addr: i32, value: Word) -> Result<(), MemoryError> {
        let index = Self::index(addr)?;
        self.cells[index] = value;
        Ok(())
    }

    /// Read through a pointer: `read(read(addr))`.
    pub fn read_indirect(&self, addr: i32) -> Result<Word, MemoryError> {
        let pointer = self.read(addr)?;
        self.read(i32::from(pointer))
    }

    fn index(addr: i32) -> Result<usize, MemoryError> {
        if addr < 0 || addr as usize >= MEMORY_SIZE {
            return Err(MemoryError::OutOfBounds(addr));
        }
        Ok(addr as usize)
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Place an image at consecutive addresses starting at `start`.
    ///
    /// Nothing is written if the image would run past the last cell.
    pub fn load_image(&mut self, start: Word, image: &[Word]) -> Result<(), MemoryError> {
        let start = usize::from(start);
        let available = MEMORY_SIZE - start;
        if image.len() > available {
            return Err(MemoryError::ImageTooLarge {
                size: image.len(),
                available,
            });
        }

        self.cells[start..start + image.len()].copy_from_slice(image);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, Word)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside `0..65536`.
    #[error("memory address {0} out of bounds (0 to 65535)")]
    OutOfBounds(i32),

    /// Image does not fit between its start address and the end of memory.
    #[error("image of {size} words exceeds available space {available}")]
    ImageTooLarge { size: usize, available: usize },
}
