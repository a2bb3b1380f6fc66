//! Per-Channel Block Accumulator
//!
//! Collects post-filter samples of one channel into fixed-size blocks and
//! publishes each completed block through a [`CaptureFifo`]. The audio
//! thread owns the [`ChannelBlockAccumulator`]; the visualizer owns the
//! matching [`BlockDrain`].

use crate::capture::{CaptureFifo, FifoConsumer, FifoProducer};
use crate::error::DspError;

/// Which side of the stereo pair a tap observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

/// Producer side: staging block plus the FIFO's writing end
pub struct ChannelBlockAccumulator {
    channel: Channel,
    staging: Vec<f32>,
    write_index: usize,
    producer: FifoProducer<Vec<f32>>,
}

impl ChannelBlockAccumulator {
    /// Create an accumulator for blocks of `block_size` samples
    ///
    /// Allocates the staging block and every FIFO slot up front; nothing
    /// on the feeding path allocates afterwards.
    pub fn new(channel: Channel, block_size: usize) -> Result<(Self, BlockDrain), DspError> {
        if block_size == 0 {
            return Err(DspError::InvalidBlockSize(block_size));
        }

        let (producer, consumer) = CaptureFifo::new(vec![0.0; block_size]).split();

        let accumulator = Self {
            channel,
            staging: vec![0.0; block_size],
            write_index: 0,
            producer,
        };
        let drain = BlockDrain {
            channel,
            block_size,
            consumer,
        };
        Ok((accumulator, drain))
    }

    /// Append one sample, publishing the block when it fills
    ///
    /// A full FIFO rejects the new block (drop-newest); already queued
    /// blocks stay in place. Either way the staging block starts over.
    ///
    /// # Real-time Safety
    /// No allocations, no locks, O(1) time (one block copy per completed block).
    #[inline]
    pub fn feed(&mut self, sample: f32) {
        self.staging[self.write_index] = sample;
        self.write_index += 1;

        if self.write_index == self.staging.len() {
            // Overflow is reported through the drop counter only
            let _published = self.producer.push(&self.staging);
            self.write_index = 0;
        }
    }

    /// Append a run of samples in order
    #[inline]
    pub fn feed_slice(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.feed(sample);
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn block_size(&self) -> usize {
        self.staging.len()
    }

    /// Samples waiting in the partially filled staging block
    pub fn pending_samples(&self) -> usize {
        self.write_index
    }
}

/// Consumer side: pulls completed blocks for one channel
pub struct BlockDrain {
    channel: Channel,
    block_size: usize,
    consumer: FifoConsumer<Vec<f32>>,
}

impl BlockDrain {
    /// Copy the oldest completed block into `out`
    ///
    /// `out` is resized to the block size if needed; keep reusing the same
    /// buffer to avoid reallocations. Returns false when nothing is queued.
    pub fn drain(&mut self, out: &mut Vec<f32>) -> bool {
        self.consumer.pull(out)
    }

    pub fn complete_blocks_available(&self) -> usize {
        self.consumer.available_for_reading()
    }

    /// Completed blocks discarded because the consumer fell behind
    pub fn dropped_blocks(&self) -> usize {
        self.consumer.dropped()
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
