//! # Series Buffer
//!
//! Rolling in-memory store of every sample accepted during the session.
//!
//! The buffer is owned by the collector loop, which is the only writer; the
//! render path reads through [`SeriesBuffer::snapshot`], which hands out an
//! owned copy so a renderer on another thread can never observe a
//! partially-appended element. Capacity is fixed at the session's sample cap
//! and the collector terminates the session before the cap is exceeded, so
//! the buffer itself never evicts or rejects writes.

use crate::frame::Sample;

/// Ordered store of accepted samples, indexed by sequence number.
#[derive(Debug)]
pub struct SeriesBuffer {
    samples: Vec<Sample>,
}

impl SeriesBuffer {
    /// Create a buffer pre-sized to the session's maximum sample count.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append one accepted sample. Insertion order is sequence order.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Consistent point-in-time copy of the series, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.clone()
    }

    /// Number of samples accepted so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no sample has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recently accepted sample, if any.
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Reading;

    fn sample(sequence: u64) -> Sample {
        Sample::from_reading(sequence, Reading::new(40, 38, 50.0, 10.0, 5.0))
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = SeriesBuffer::new(1000);
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert!(buffer.last().is_none());
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut buffer = SeriesBuffer::new(10);
        for sequence in 1..=5 {
            buffer.append(sample(sequence));
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.last().unwrap().sequence, 5);

        let snapshot = buffer.snapshot();
        let sequences: Vec<u64> = snapshot.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut buffer = SeriesBuffer::new(10);
        buffer.append(sample(1));

        let snapshot = buffer.snapshot();
        buffer.append(sample(2));

        // The earlier snapshot must not see the later append
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_capacity_is_preallocated() {
        let buffer = SeriesBuffer::new(1000);
        assert!(buffer.samples.capacity() >= 1000);
    }
}
