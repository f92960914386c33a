// field/buffer.rs
// Append-only point storage shared between one line worker and the render boundary

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use ultraviolet::Vec2;

/// Pre-sized, append-only polyline.
///
/// Exactly one [`LineWriter`] exists per buffer. Slots below the published
/// length are never written again, so readers copy the prefix without locking
/// while the writer fills the next slot.
pub struct PointBuffer {
    slots: Box<[UnsafeCell<Vec2>]>,
    len: AtomicUsize,
    absorbed: AtomicBool,
}

// Only the unique LineWriter writes, and only to the slot at `len`; readers stay below `len`.
unsafe impl Sync for PointBuffer {}

impl PointBuffer {
    /// Allocate `capacity` slots, publish `seed` (truncated to capacity) and
    /// return the shared buffer together with its only writer.
    pub fn with_seed(capacity: usize, seed: &[Vec2]) -> (Arc<Self>, LineWriter) {
        let slots: Box<[UnsafeCell<Vec2>]> = (0..capacity)
            .map(|i| UnsafeCell::new(seed.get(i).copied().unwrap_or_else(Vec2::zero)))
            .collect();
        let buffer = Arc::new(Self {
            slots,
            len: AtomicUsize::new(seed.len().min(capacity)),
            absorbed: AtomicBool::new(false),
        });
        let writer = LineWriter {
            buffer: Arc::clone(&buffer),
        };
        (buffer, writer)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// True once the line ended inside a negative charge.
    pub fn is_absorbed(&self) -> bool {
        self.absorbed.load(Ordering::Acquire)
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        if index < self.len() {
            // SAFETY: published slots are immutable.
            Some(unsafe { *self.slots[index].get() })
        } else {
            None
        }
    }

    pub fn last(&self) -> Option<Vec2> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Copy of the currently published prefix.
    pub fn snapshot(&self) -> Vec<Vec2> {
        let len = self.len();
        // SAFETY: every slot below `len` has been published and is never written again.
        self.slots[..len]
            .iter()
            .map(|slot| unsafe { *slot.get() })
            .collect()
    }
}

impl std::fmt::Debug for PointBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("absorbed", &self.is_absorbed())
            .finish()
    }
}

/// Unique write handle of a [`PointBuffer`]. Not `Clone`.
pub struct LineWriter {
    buffer: Arc<PointBuffer>,
}

impl LineWriter {
    /// Append one point. Returns false (dropping the point) when the buffer is full.
    pub fn push(&mut self, point: Vec2) -> bool {
        // Single writer: nobody else moves `len`.
        let len = self.buffer.len.load(Ordering::Relaxed);
        if len >= self.buffer.capacity() {
            return false;
        }
        // SAFETY: slot `len` is unpublished, readers never touch it, and this is the only writer.
        unsafe {
            *self.buffer.slots[len].get() = point;
        }
        self.buffer.len.store(len + 1, Ordering::Release);
        true
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len.load(Ordering::Relaxed) >= self.buffer.capacity()
    }

    pub fn mark_absorbed(&mut self) {
        self.buffer.absorbed.store(true, Ordering::Release);
    }

    pub fn buffer(&self) -> &Arc<PointBuffer> {
        &self.buffer
    }
}
