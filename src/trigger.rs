// Copyright (C) 2026 The sampad authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The trigger queue: a bounded lock-free MPSC ring between event producers
//! and the render callback.
//!
//! Producers (key dispatch, MIDI input thread) push from arbitrary threads;
//! the render callback is the single consumer. Neither side ever blocks or
//! allocates. A full queue drops the trigger: during overload a dropped
//! trigger is acceptable, a glitched audio block is not.
//!
//! The ring is a bounded queue with per-slot sequence numbers: producers
//! claim a slot by CAS on the enqueue index, then publish the slot with a
//! release store of its sequence; the consumer observes publication with an
//! acquire load. Capacity is fixed at construction and never resized.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::samples::SampleId;

/// Default trigger queue capacity, sized for worst-case simultaneous
/// triggers well beyond what sixteen pads can produce at once.
pub const DEFAULT_CAPACITY: usize = 64;

/// A request to start playback of a sample at a given gain.
#[derive(Clone, Copy, Debug)]
pub struct TriggerMessage {
    /// The sample to play.
    pub sample: SampleId,
    /// Gain scalar applied to every frame of the voice.
    pub gain: f32,
    /// When the trigger was enqueued. Diagnostics only.
    pub enqueued_at: Instant,
}

impl TriggerMessage {
    /// Creates a message stamped with the current time.
    pub fn new(sample: SampleId, gain: f32) -> Self {
        Self {
            sample,
            gain,
            enqueued_at: Instant::now(),
        }
    }
}

/// One ring slot. `sequence` encodes the slot state: equal to the enqueue
/// position means free to write, position + 1 means published, anything
/// lower means the slot is still occupied from the previous lap.
struct Slot {
    sequence: AtomicUsize,
    message: UnsafeCell<MaybeUninit<TriggerMessage>>,
}

struct Ring {
    slots: Box<[Slot]>,
    mask: usize,
    enqueue_pos: AtomicUsize,
    dequeue_pos: AtomicUsize,
    dropped: AtomicU64,
}

// The sequence protocol guarantees exclusive access to `message` between the
// claiming producer and the consumer.
unsafe impl Send for Ring {}
unsafe impl Sync for Ring {}

/// Creates a trigger queue, returning the producer and consumer halves.
/// Capacity is rounded up to a power of two.
pub fn trigger_queue(capacity: usize) -> (TriggerSender, TriggerReceiver) {
    let capacity = capacity.max(2).next_power_of_two();
    let slots = (0..capacity)
        .map(|i| Slot {
            sequence: AtomicUsize::new(i),
            message: UnsafeCell::new(MaybeUninit::uninit()),
        })
        .collect::<Vec<Slot>>()
        .into_boxed_slice();

    let ring = Arc::new(Ring {
        slots,
        mask: capacity - 1,
        enqueue_pos: AtomicUsize::new(0),
        dequeue_pos: AtomicUsize::new(0),
        dropped: AtomicU64::new(0),
    });

    (
        TriggerSender { ring: ring.clone() },
        TriggerReceiver { ring },
    )
}

/// The producer half. Cheap to clone; safe to share across any number of
/// event threads.
#[derive(Clone)]
pub struct TriggerSender {
    ring: Arc<Ring>,
}

impl TriggerSender {
    /// Pushes a trigger. Never blocks and never allocates; returns false and
    /// drops the message if the queue is full.
    pub fn push(&self, message: TriggerMessage) -> bool {
        let ring = &*self.ring;
        let mut pos = ring.enqueue_pos.load(Ordering::Relaxed);

        loop {
            let slot = &ring.slots[pos & ring.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                // Slot is free at this position; try to claim it.
                match ring.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*slot.message.get()).write(message) };
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return true;
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // The consumer hasn't freed this slot yet: the ring is full.
                ring.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            } else {
                // Another producer claimed this position; catch up.
                pos = ring.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Total triggers dropped because the queue was full. For periodic
    /// logging outside the render path.
    pub fn dropped(&self) -> u64 {
        self.ring.dropped.load(Ordering::Relaxed)
    }
}

/// The consumer half. Not cloneable: the render callback is the only
/// consumer, enforced by `&mut self` on the pop path.
pub struct TriggerReceiver {
    ring: Arc<Ring>,
}

impl TriggerReceiver {
    /// Pops the oldest message, if any. Never blocks and never allocates.
    pub fn pop(&mut self) -> Option<TriggerMessage> {
        let ring = &*self.ring;
        let pos = ring.dequeue_pos.load(Ordering::Relaxed);
        let slot = &ring.slots[pos & ring.mask];

        let seq = slot.sequence.load(Ordering::Acquire);
        if seq != pos.wrapping_add(1) {
            // Empty, or a producer claimed the slot but hasn't published.
            return None;
        }

        let message = unsafe { (*slot.message.get()).assume_init_read() };
        // Free the slot for the producers' next lap.
        slot.sequence
            .store(pos.wrapping_add(ring.mask).wrapping_add(1), Ordering::Release);
        ring.dequeue_pos.store(pos.wrapping_add(1), Ordering::Relaxed);

        Some(message)
    }

    /// Drains up to `max` messages in FIFO order into the callback.
    /// Returns the number of messages delivered.
    pub fn drain(&mut self, max: usize, mut f: impl FnMut(TriggerMessage)) -> usize {
        let mut count = 0;
        while count < max {
            match self.pop() {
                Some(message) => {
                    f(message);
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// The queue capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.ring.mask + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn id(n: u32) -> SampleId {
        crate::samples::SampleId::from_index(n)
    }

    #[test]
    fn test_fifo_single_producer() {
        let (tx, mut rx) = trigger_queue(8);

        for i in 0..5 {
            assert!(tx.push(TriggerMessage::new(id(0), i as f32)));
        }

        let mut gains = Vec::new();
        let drained = rx.drain(usize::MAX, |m| gains.push(m.gain));
        assert_eq!(drained, 5);
        assert_eq!(gains, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(rx.pop().is_none());
    }

    #[test]
    fn test_overflow_returns_false_without_blocking() {
        let (tx, mut rx) = trigger_queue(4);

        for i in 0..4 {
            assert!(tx.push(TriggerMessage::new(id(0), i as f32)));
        }
        assert!(!tx.push(TriggerMessage::new(id(0), 99.0)));
        assert!(!tx.push(TriggerMessage::new(id(0), 100.0)));
        assert_eq!(tx.dropped(), 2);

        // The accepted messages are intact.
        let mut gains = Vec::new();
        rx.drain(usize::MAX, |m| gains.push(m.gain));
        assert_eq!(gains, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_drain_respects_bound() {
        let (tx, mut rx) = trigger_queue(16);
        for i in 0..10 {
            assert!(tx.push(TriggerMessage::new(id(0), i as f32)));
        }

        assert_eq!(rx.drain(4, |_| {}), 4);
        // The remainder arrives in order on the next drain.
        let mut gains = Vec::new();
        assert_eq!(rx.drain(usize::MAX, |m| gains.push(m.gain)), 6);
        assert_eq!(gains, vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_concurrent_producers_per_producer_fifo() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 16;

        let (tx, mut rx) = trigger_queue(PRODUCERS * PER_PRODUCER);

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        // Encode (producer, sequence) into the gain.
                        let gain = (p * 1000 + i) as f32;
                        assert!(tx.push(TriggerMessage::new(id(p as u32), gain)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("producer thread");
        }

        let mut received: Vec<(usize, usize)> = Vec::new();
        let drained = rx.drain(usize::MAX, |m| {
            let encoded = m.gain as usize;
            received.push((encoded / 1000, encoded % 1000));
        });
        assert_eq!(drained, PRODUCERS * PER_PRODUCER);

        // Every producer's own messages arrive in submission order.
        for p in 0..PRODUCERS {
            let seqs: Vec<usize> = received
                .iter()
                .filter(|(producer, _)| *producer == p)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(seqs.len(), PER_PRODUCER);
            assert!(seqs.windows(2).all(|w| w[0] < w[1]), "producer {} out of order", p);
        }
    }

    #[test]
    fn test_wraparound_many_laps() {
        let (tx, mut rx) = trigger_queue(4);

        for lap in 0..100 {
            for i in 0..3 {
                assert!(tx.push(TriggerMessage::new(id(0), (lap * 3 + i) as f32)));
            }
            let mut gains = Vec::new();
            rx.drain(usize::MAX, |m| gains.push(m.gain as usize));
            assert_eq!(gains, vec![lap * 3, lap * 3 + 1, lap * 3 + 2]);
        }
    }
}
