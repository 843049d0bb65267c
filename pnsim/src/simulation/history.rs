//! Bounded linear undo/redo history
//!
//! One logical stack split around a current "middle" entry:
//! - `constant`: older entries, reachable with undo (front = oldest)
//! - `fallback`: newer entries, reachable with redo (top = next redo)
//!
//! Pushing discards the fallback side, so there is never more than one
//! timeline. Total size (constant + middle + fallback) stays within `cap`;
//! the oldest constant entries are evicted first.

use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_CAP: usize = 20;

#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    constant: VecDeque<T>,
    middle: Option<T>,
    fallback: Vec<T>,
    cap: usize,
}

impl<T> Default for EditHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAP)
    }
}

impl<T> EditHistory<T> {
    /// A cap of zero is raised to one so the middle entry always fits
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            constant: VecDeque::with_capacity(cap),
            middle: None,
            fallback: Vec::new(),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.constant.len() + usize::from(self.middle.is_some()) + self.fallback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_none()
    }

    pub fn can_undo(&self) -> bool {
        !self.constant.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.fallback.is_empty()
    }

    /// Install `item` as the current entry, invalidating any redo branch
    pub fn push(&mut self, item: T) {
        if let Some(prev) = self.middle.take() {
            self.constant.push_back(prev);
        }
        self.fallback.clear();
        self.middle = Some(item);

        while self.len() > self.cap {
            if self.constant.pop_front().is_none() {
                break;
            }
        }
    }

    /// Step back one entry; false when there is nothing older
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.constant.pop_back() else {
            return false;
        };
        if let Some(current) = self.middle.replace(prev) {
            self.fallback.push(current);
        }
        true
    }

    /// Step forward one entry; false when there is nothing newer
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.fallback.pop() else {
            return false;
        };
        if let Some(current) = self.middle.replace(next) {
            self.constant.push_back(current);
        }
        true
    }

    /// Current entry, if any
    pub fn read(&self) -> Option<&T> {
        self.middle.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_redo_walk_the_internal_split() {
        let mut h = EditHistory::new(5);
        for i in 0..3 {
            h.push(i);
        }
        assert!(h.undo());
        assert_eq!(h.constant.len(), 1);
        assert_eq!(h.fallback, vec![2]);
        assert!(h.redo());
        assert!(h.fallback.is_empty());
        assert_eq!(h.constant.len(), 2);
    }

    #[test]
    fn zero_cap_still_holds_the_middle() {
        let mut h = EditHistory::new(0);
        h.push(1);
        h.push(2);
        assert_eq!(h.len(), 1);
        assert_eq!(h.read(), Some(&2));
        assert!(!h.undo());
    }
}
