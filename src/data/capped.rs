//! Newest-first list with a fixed capacity.

use std::collections::VecDeque;

/// An ordered list that keeps at most `capacity` items.
///
/// Items are inserted at the head; once the bound is exceeded the oldest
/// item is dropped from the tail.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedList<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> CappedList<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the head, evicting from the tail if full.
    pub fn push(&mut self, item: T) {
        self.items.push_front(item);
        self.items.truncate(self.capacity);
    }

    /// Replace the contents with `items`, given newest first.
    ///
    /// Anything past the capacity is discarded.
    pub fn replace(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.clear();
        self.items.extend(items.into_iter().take(self.capacity));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The most recent item.
    pub fn latest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, T> IntoIterator for &'a CappedList<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_inserts_at_head() {
        let mut list = CappedList::new(3);
        list.push(1);
        list.push(2);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(list.latest(), Some(&2));
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut list = CappedList::new(3);
        for i in 0..10 {
            list.push(i);
            assert!(list.len() <= 3);
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![9, 8, 7]);
    }

    #[test]
    fn test_replace_truncates_tail() {
        let mut list = CappedList::new(2);
        list.push(100);
        list.replace(vec![5, 4, 3]);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![5, 4]);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut list = CappedList::new(0);
        list.push("x");
        assert!(list.is_empty());
    }
}
