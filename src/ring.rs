//! Fixed-size FIFO storage used behind the queue's lock.
//!
//! All cursor arithmetic lives here. `head` and `tail` are always kept in
//! `0..N`; `len` disambiguates the empty and full states, which share
//! `head == tail`.

pub(crate) struct Ring<T, const N: usize> {
    slots: [Option<T>; N],
    /// Next slot to read.
    head: usize,
    /// Next slot to write.
    tail: usize,
    len: usize,
}

impl<T, const N: usize> Ring<T, N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    #[inline]
    fn advance(index: usize) -> usize {
        (index + 1) % N
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == N
    }

    /// Appends at the tail, or hands the value back when every slot is taken.
    pub(crate) fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        debug_assert!(self.slots[self.tail].is_none(), "tail slot still occupied");
        self.slots[self.tail] = Some(value);
        self.tail = Self::advance(self.tail);
        self.len += 1;
        Ok(())
    }

    /// Removes the oldest value.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head].take();
        debug_assert!(value.is_some(), "head slot empty while len > 0");
        self.head = Self::advance(self.head);
        self.len -= 1;
        value
    }

    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len);
        while let Some(value) = self.pop() {
            items.push(value);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut ring = Ring::<u32, 3>::new();
        assert!(ring.is_empty());
        for i in 0..3 {
            ring.push(i).unwrap();
        }
        assert!(ring.is_full());
        assert_eq!(ring.push(99), Err(99));
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_pop_empty() {
        let mut ring = Ring::<u32, 2>::new();
        assert_eq!(ring.pop(), None);
        assert_eq!(ring.len(), 0);
    }

    #[test]
    fn test_wraparound_keeps_fifo() {
        // Drives the cursors around the ring many times with varying fill
        // levels; every pop must return the oldest outstanding value.
        let mut ring = Ring::<u64, 4>::new();
        let mut next_in = 0u64;
        let mut next_out = 0u64;
        for round in 0..50 {
            let fill = round % 4 + 1;
            for _ in 0..fill {
                ring.push(next_in).unwrap();
                next_in += 1;
            }
            for _ in 0..fill {
                assert_eq!(ring.pop(), Some(next_out));
                next_out += 1;
            }
            assert!(ring.is_empty());
        }
    }

    #[test]
    fn test_interleaved_partial_drain() {
        let mut ring = Ring::<char, 3>::new();
        ring.push('a').unwrap();
        ring.push('b').unwrap();
        assert_eq!(ring.pop(), Some('a'));
        ring.push('c').unwrap();
        ring.push('d').unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.drain(), vec!['b', 'c', 'd']);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_single_slot() {
        let mut ring = Ring::<&str, 1>::new();
        ring.push("x").unwrap();
        assert_eq!(ring.push("y"), Err("y"));
        assert_eq!(ring.pop(), Some("x"));
        ring.push("y").unwrap();
        assert_eq!(ring.pop(), Some("y"));
    }
}
