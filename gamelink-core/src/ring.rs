//! Growable circular byte buffer
//!
//! A FIFO byte ring backed by a table of fixed-size heap blocks. The table
//! doubles when a write would overflow and halves while occupancy stays
//! under a quarter, so repeated writes stay amortized O(1) per byte even
//! though each resize re-linearizes the buffered region.

use thiserror::Error;

/// Buffer errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    #[error("zero-length transfer")]
    ZeroLength,

    #[error("write of {requested} bytes exceeds free capacity ({available} free)")]
    WouldOverflow { requested: usize, available: usize },

    #[error("read of {requested} bytes exceeds buffered data ({available} buffered)")]
    Underrun { requested: usize, available: usize },
}

/// Position inside the block table: block index plus offset within it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    block: usize,
    offset: usize,
}

/// Circular byte buffer over a dynamic table of fixed-size blocks
///
/// The table length is always a power of two, starting at one block.
/// `head` is the next write position, `tail` the oldest buffered byte; both
/// are {block, offset} pairs taken modulo the current table length.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    /// Size of every block, fixed at construction
    block_size: usize,
    /// Whether the table may grow past its initial single block
    growable: bool,
    /// Bytes currently buffered
    total_size: usize,
    head: Cursor,
    tail: Cursor,
    /// Block table; capacity is `block_size * blocks.len()`
    blocks: Vec<Box<[u8]>>,
}

/// Default block size in bytes
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

impl Default for CircularBuffer {
    fn default() -> Self {
        CircularBuffer::new(DEFAULT_BLOCK_SIZE, true)
    }
}

impl CircularBuffer {
    /// Create a new buffer of one `block_size` block
    ///
    /// # Panics
    /// Panics if `block_size` is zero.
    pub fn new(block_size: usize, growable: bool) -> Self {
        assert!(block_size > 0, "block size must be non-zero");

        CircularBuffer {
            block_size,
            growable,
            total_size: 0,
            head: Cursor::default(),
            tail: Cursor::default(),
            blocks: vec![vec![0u8; block_size].into_boxed_slice()],
        }
    }

    /// Append `src` to the buffer
    ///
    /// Grows the block table as needed when the buffer is growable.
    /// Zero-length writes signal a caller error and are rejected.
    pub fn write(&mut self, src: &[u8]) -> Result<(), RingError> {
        if src.is_empty() {
            return Err(RingError::ZeroLength);
        }

        if src.len() > self.free() {
            if !self.growable {
                return Err(RingError::WouldOverflow {
                    requested: src.len(),
                    available: self.free(),
                });
            }

            while src.len() > self.free() {
                self.resize_table(self.blocks.len() << 1);
            }
        }

        let mut copied = 0;
        while copied < src.len() {
            let Cursor { block, offset } = self.head;
            let n = (self.block_size - offset).min(src.len() - copied);

            self.blocks[block][offset..offset + n].copy_from_slice(&src[copied..copied + n]);

            copied += n;
            self.head = self.advance(self.head, n);
        }

        self.total_size += src.len();
        Ok(())
    }

    /// Remove the oldest `dst.len()` bytes and copy them into `dst`
    ///
    /// After a successful read the table is halved while occupancy stays
    /// under a quarter and more than one block remains.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<(), RingError> {
        if dst.is_empty() {
            return Err(RingError::ZeroLength);
        }
        if self.total_size < dst.len() {
            return Err(RingError::Underrun {
                requested: dst.len(),
                available: self.total_size,
            });
        }

        let mut copied = 0;
        while copied < dst.len() {
            let Cursor { block, offset } = self.tail;
            let n = (self.block_size - offset).min(dst.len() - copied);

            dst[copied..copied + n].copy_from_slice(&self.blocks[block][offset..offset + n]);

            copied += n;
            self.tail = self.advance(self.tail, n);
        }

        self.total_size -= dst.len();

        while self.blocks.len() > 1 && (self.total_size * 4) < self.capacity() {
            self.resize_table(self.blocks.len() >> 1);
        }

        Ok(())
    }

    /// Copy the oldest `dst.len()` bytes into `dst` without consuming them
    pub fn peek(&self, dst: &mut [u8]) -> Result<(), RingError> {
        if dst.is_empty() {
            return Err(RingError::ZeroLength);
        }
        if self.total_size < dst.len() {
            return Err(RingError::Underrun {
                requested: dst.len(),
                available: self.total_size,
            });
        }

        let mut cursor = self.tail;
        let mut copied = 0;
        while copied < dst.len() {
            let Cursor { block, offset } = cursor;
            let n = (self.block_size - offset).min(dst.len() - copied);

            dst[copied..copied + n].copy_from_slice(&self.blocks[block][offset..offset + n]);

            copied += n;
            cursor = self.advance(cursor, n);
        }

        Ok(())
    }

    /// Bytes currently buffered
    #[inline]
    pub fn len(&self) -> usize {
        self.total_size
    }

    /// Whether the buffer holds no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }

    /// Total capacity in bytes (`block_size * table length`)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.block_size * self.blocks.len()
    }

    /// Block size fixed at construction
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    fn free(&self) -> usize {
        self.capacity() - self.total_size
    }

    #[inline]
    fn advance(&self, cursor: Cursor, by: usize) -> Cursor {
        Self::advance_in(self.block_size, self.blocks.len(), cursor, by)
    }

    fn advance_in(block_size: usize, table_len: usize, cursor: Cursor, by: usize) -> Cursor {
        let linear = cursor.offset + by;
        Cursor {
            block: (cursor.block + linear / block_size) % table_len,
            offset: linear % block_size,
        }
    }

    /// Replace the block table with one of `new_len` blocks, re-linearizing
    /// the buffered region to start at block 0, offset 0.
    fn resize_table(&mut self, new_len: usize) {
        let mut new_blocks: Vec<Box<[u8]>> = (0..new_len)
            .map(|_| vec![0u8; self.block_size].into_boxed_slice())
            .collect();

        let mut src = self.tail;
        let mut dst = Cursor::default();
        let mut copied = 0;
        while copied < self.total_size {
            // Bounded by both the source and destination block boundaries.
            let n = (self.block_size - src.offset)
                .min(self.block_size - dst.offset)
                .min(self.total_size - copied);

            new_blocks[dst.block][dst.offset..dst.offset + n]
                .copy_from_slice(&self.blocks[src.block][src.offset..src.offset + n]);

            copied += n;
            src = self.advance(src, n);
            dst = Self::advance_in(self.block_size, new_len, dst, n);
        }

        self.blocks = new_blocks;
        self.tail = Cursor::default();
        self.head = dst;
    }
}
