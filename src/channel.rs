//! Bounded hand-off of audio blocks from the generation thread to the
//! playback callback.
//!
//! The producer side blocks when the channel is full, which is the only
//! flow control between the two contexts. The consumer side never blocks.

use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TryRecvError};

use crate::audio::AudioBlock;
use crate::constants::PUT_POLL_INTERVAL_MS;
use crate::error::ChannelClosed;
use crate::shutdown::ShutdownToken;

/// Create a transfer channel holding at most `capacity` blocks
///
/// # Panics
/// If `capacity` is zero; a rendezvous channel would make every hand-off
/// wait for the callback.
pub fn block_channel(capacity: usize) -> (BlockSender, BlockReceiver) {
    assert!(capacity > 0, "transfer channel capacity must be positive");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        BlockSender { tx, capacity },
        BlockReceiver { rx, capacity },
    )
}

/// Why a cancellable put gave up
#[derive(Debug)]
pub enum PutError {
    /// Shutdown was requested while waiting for a free slot
    Cancelled(AudioBlock),
    /// The receiving side was dropped
    Closed(AudioBlock),
}

/// Producer side of the transfer channel
#[derive(Clone)]
pub struct BlockSender {
    tx: Sender<AudioBlock>,
    capacity: usize,
}

impl BlockSender {
    /// Hand over a block, waiting for a free slot if the channel is full
    pub fn put(&self, block: AudioBlock) -> Result<(), ChannelClosed> {
        self.tx.send(block).map_err(|_| ChannelClosed)
    }

    /// Like `put`, but gives the block back if `shutdown` fires while waiting
    pub fn put_until(&self, block: AudioBlock, shutdown: &ShutdownToken) -> Result<(), PutError> {
        let poll = Duration::from_millis(PUT_POLL_INTERVAL_MS);
        let mut block = block;
        loop {
            if shutdown.is_cancelled() {
                return Err(PutError::Cancelled(block));
            }
            match self.tx.send_timeout(block, poll) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(b)) => block = b,
                Err(SendTimeoutError::Disconnected(b)) => return Err(PutError::Closed(b)),
            }
        }
    }

    /// Blocks currently waiting to be taken
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer side of the transfer channel
pub struct BlockReceiver {
    rx: Receiver<AudioBlock>,
    capacity: usize,
}

impl BlockReceiver {
    /// Next block if one is ready; never waits
    ///
    /// A disconnected producer looks the same as an empty channel.
    pub fn try_take(&self) -> Option<AudioBlock> {
        match self.rx.try_recv() {
            Ok(block) => Some(block),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
