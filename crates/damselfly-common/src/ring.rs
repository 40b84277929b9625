//! Fixed-capacity FIFO with overwrite-on-full semantics.
//!
//! This is an observability tail, not a delivery queue: pushing into a full
//! ring evicts the oldest element rather than blocking or erroring, so the
//! newest `capacity` entries always survive.

use serde::{Serialize, Serializer};
use std::fmt;

pub struct Ring<T> {
    buf: Vec<T>,
    cap: usize,
    head: usize,
}

impl<T> Ring<T> {
    /// Create a ring holding at most `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; that is a programmer error, not a
    /// runtime condition.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Ring {
            buf: Vec::with_capacity(capacity),
            cap: capacity,
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append `value`; when full, the oldest element is overwritten.
    pub fn push(&mut self, value: T) {
        if self.buf.len() < self.cap {
            self.buf.push(value);
            return;
        }
        self.buf[self.head] = value;
        self.head += 1;
        if self.head == self.cap {
            self.head = 0;
        }
    }

    /// The `index`-th element in logical order: 0 is the oldest live
    /// element, `len() - 1` the newest.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn at(&self, index: usize) -> &T {
        assert!(
            index < self.buf.len(),
            "ring index {index} out of range for length {}",
            self.buf.len()
        );
        &self.buf[(self.head + index) % self.cap]
    }

    /// Zero-copy view of the contents as two slices whose concatenation is
    /// the logical order. The second slice is empty until the ring wraps.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.buf.len() < self.cap {
            (&self.buf, &[])
        } else {
            (&self.buf[self.head..], &self.buf[..self.head])
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (a, b) = self.as_slices();
        a.iter().chain(b.iter())
    }

    /// Freshly-allocated contiguous copy in logical order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let (a, b) = self.as_slices();
        let mut out = Vec::with_capacity(self.buf.len());
        out.extend_from_slice(a);
        out.extend_from_slice(b);
        out
    }
}

impl<T: Serialize> Serialize for Ring<T> {
    /// JSON array of the elements in logical order.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_insertion_order_below_capacity() {
        let mut ring = Ring::new(5);
        for x in [1, 2, 3] {
            ring.push(x);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.to_vec(), vec![1, 2, 3]);
        assert_eq!(*ring.at(0), 1);
        assert_eq!(*ring.at(2), 3);
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut ring = Ring::new(3);
        for x in 1..=7 {
            ring.push(x);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.to_vec(), vec![5, 6, 7]);
        assert_eq!(*ring.at(0), 5);
        assert_eq!(*ring.at(1), 6);
        assert_eq!(*ring.at(2), 7);
    }

    #[test]
    fn test_exactly_full_is_not_wrapped() {
        let mut ring = Ring::new(3);
        for x in [1, 2, 3] {
            ring.push(x);
        }
        assert_eq!(ring.to_vec(), vec![1, 2, 3]);
        let (a, b) = ring.as_slices();
        assert_eq!(a, &[1, 2, 3]);
        assert!(b.is_empty());
    }

    #[test]
    fn test_slices_join_across_wrap() {
        let mut ring = Ring::new(3);
        for x in [1, 2, 3, 4] {
            ring.push(x);
        }
        let (a, b) = ring.as_slices();
        assert_eq!(a, &[2, 3]);
        assert_eq!(b, &[4]);
        assert_eq!(ring.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_empty_ring() {
        let ring: Ring<i32> = Ring::new(4);
        assert!(ring.is_empty());
        assert_eq!(ring.to_vec(), Vec::<i32>::new());
        let (a, b) = ring.as_slices();
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn test_zero_capacity_panics() {
        let _ = Ring::<i32>::new(0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_past_length_panics() {
        let mut ring = Ring::new(3);
        ring.push(1);
        let _ = ring.at(1);
    }

    #[test]
    fn test_json_in_logical_order() {
        let mut ring = Ring::new(3);
        assert_eq!(serde_json::to_string(&ring).unwrap(), "[]");

        ring.push(1);
        ring.push(2);
        assert_eq!(serde_json::to_string(&ring).unwrap(), "[1,2]");

        ring.push(3);
        ring.push(4);
        assert_eq!(serde_json::to_string(&ring).unwrap(), "[2,3,4]");
    }
}
