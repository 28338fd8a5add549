//! Growable entity lists.
//!
//! # Responsibilities
//! - Back every entity kind of a configuration generation
//! - Grow geometrically (initial capacity 10, doubled when full)
//! - Hand out positional indices that stay valid while the list grows
//!
//! # Design Decisions
//! - Elements are never reordered by growth, only relocated; cross references are
//!   stored as indices, never as references into the backing buffer
//! - Read access goes through `Deref<Target = [T]>`

use std::ops::Deref;

/// Capacity every list starts with.
pub const INITIAL_CAPACITY: usize = 10;

/// An append-only list with doubling growth.
#[derive(Debug)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> EntityList<T> {
    /// Create an empty list with the initial capacity.
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append an element and return its index.
    pub fn push(&mut self, item: T) -> usize {
        if self.items.len() == self.items.capacity() {
            let grow_by = self.items.capacity().max(INITIAL_CAPACITY);
            self.items.reserve_exact(grow_by);
        }
        let index = self.items.len();
        self.items.push(item);
        index
    }

    /// Current capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Reorder the elements. Only valid while no index into the list has been handed out.
    pub(crate) fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        self.items.sort_by(compare);
    }
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for EntityList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
