//! Lock-Free Capture FIFO
//!
//! Fixed-capacity single-producer/single-consumer queue used to hand
//! completed audio blocks from the audio thread to a visualizer.
//!
//! # Architecture
//!
//! All slots are allocated up front by cloning a prototype value. `push`
//! and `pull` copy with `Clone::clone_from`, which reuses the destination's
//! storage, so equally sized `Vec` blocks move through the queue without
//! touching the allocator.
//!
//! Two cursors live in `[0, 2 * CAPACITY)`; the slot index is the cursor
//! modulo `CAPACITY`, and the doubled range tells a full queue apart from an
//! empty one without sacrificing a slot. Each side stores only its own
//! cursor (Release) and reads the other side's cursor (Acquire).

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

/// Number of blocks the FIFO can hold
pub const CAPTURE_FIFO_CAPACITY: usize = 30;

const CURSOR_RANGE: usize = 2 * CAPTURE_FIFO_CAPACITY;

struct Shared<T> {
    slots: [UnsafeCell<T>; CAPTURE_FIFO_CAPACITY],
    /// Next slot the producer will fill (written by the producer only)
    write: CachePadded<AtomicUsize>,
    /// Next slot the consumer will read (written by the consumer only)
    read: CachePadded<AtomicUsize>,
    /// Blocks rejected because the queue was full
    dropped: AtomicUsize,
}

// Safety: a slot is only ever accessed by the side that currently owns it
// according to the cursors. The producer only writes the slot at `write`,
// which lies outside [read, write) while the queue is not full, and then
// publishes it with a Release store on `write`. The consumer only reads
// slots in [read, write) as of its Acquire load and hands them back with a
// Release store on `read`. `FifoProducer`/`FifoConsumer` are not Clone, so
// there is exactly one of each.
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    #[inline]
    fn len(write: usize, read: usize) -> usize {
        (write + CURSOR_RANGE - read) % CURSOR_RANGE
    }

    #[inline]
    fn advance(cursor: usize) -> usize {
        (cursor + 1) % CURSOR_RANGE
    }

    fn available(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        Self::len(write, read)
    }
}

/// Bounded SPSC queue of preallocated `T` slots
///
/// Construct it, then [`split`](CaptureFifo::split) it into the producer
/// half (audio thread) and the consumer half (visualizer thread).
pub struct CaptureFifo<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send> CaptureFifo<T> {
    /// Allocate every slot as a clone of `prototype`
    ///
    /// Note: This allocates. Only call during setup, not in audio callback.
    pub fn new(prototype: T) -> Self {
        let shared = Shared {
            slots: core::array::from_fn(|_| UnsafeCell::new(prototype.clone())),
            write: CachePadded::new(AtomicUsize::new(0)),
            read: CachePadded::new(AtomicUsize::new(0)),
            dropped: AtomicUsize::new(0),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Separate the producing and consuming ends
    pub fn split(self) -> (FifoProducer<T>, FifoConsumer<T>) {
        (
            FifoProducer {
                shared: Arc::clone(&self.shared),
            },
            FifoConsumer {
                shared: self.shared,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        CAPTURE_FIFO_CAPACITY
    }
}

/// Writing end of a [`CaptureFifo`]
pub struct FifoProducer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> FifoProducer<T> {
    /// Copy `item` into the next free slot
    ///
    /// Returns false, leaving the queued items untouched, when the queue is
    /// full. The rejected item is counted in [`dropped`](Self::dropped).
    ///
    /// # Real-time Safety
    /// Never blocks. Allocation-free whenever `T::clone_from` reuses the
    /// slot's storage (true for equally sized `Vec`s).
    pub fn push(&mut self, item: &T) -> bool {
        let write = self.shared.write.load(Ordering::Relaxed);
        let read = self.shared.read.load(Ordering::Acquire);

        if Shared::<T>::len(write, read) == CAPTURE_FIFO_CAPACITY {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // Safety: the slot is outside [read, write), so the consumer cannot
        // be looking at it until the store below publishes it.
        unsafe {
            (*self.shared.slots[write % CAPTURE_FIFO_CAPACITY].get()).clone_from(item);
        }

        self.shared
            .write
            .store(Shared::<T>::advance(write), Ordering::Release);
        true
    }

    /// Free slots left
    pub fn available_for_writing(&self) -> usize {
        CAPTURE_FIFO_CAPACITY - self.shared.available()
    }

    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

/// Reading end of a [`CaptureFifo`]
pub struct FifoConsumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> FifoConsumer<T> {
    /// Copy the oldest item into `out`
    ///
    /// Returns false and leaves `out` untouched when the queue is empty.
    pub fn pull(&mut self, out: &mut T) -> bool {
        let read = self.shared.read.load(Ordering::Relaxed);
        let write = self.shared.write.load(Ordering::Acquire);

        if read == write {
            return false;
        }

        // Safety: the slot lies in [read, write), published by the
        // producer's Release store; it won't be reused until `read` moves.
        unsafe {
            out.clone_from(&*self.shared.slots[read % CAPTURE_FIFO_CAPACITY].get());
        }

        self.shared
            .read
            .store(Shared::<T>::advance(read), Ordering::Release);
        true
    }

    /// Items ready to be pulled
    pub fn available_for_reading(&self) -> usize {
        self.shared.available()
    }

    /// Items the producer had to reject so far
    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}
