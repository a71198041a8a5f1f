use std::ops::{Index, IndexMut};

/// Fixed capacity storage addressed by an ever growing position, wrapping modulo the capacity.
///
/// Writing to position `i` overwrites whatever was stored at `i - capacity`.
#[derive(Debug, Clone)]
pub struct Ring<T> {
    slots: Vec<T>,
}

impl<T: Default + Clone> Ring<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a ring needs at least one slot");
        Self {
            slots: vec![T::default(); capacity],
        }
    }
}

impl<T> Ring<T> {
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots in storage order, not in time order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

impl<T> Index<usize> for Ring<T> {
    type Output = T;

    fn index(&self, position: usize) -> &T {
        &self.slots[position % self.slots.len()]
    }
}

impl<T> IndexMut<usize> for Ring<T> {
    fn index_mut(&mut self, position: usize) -> &mut T {
        let capacity = self.slots.len();
        &mut self.slots[position % capacity]
    }
}
