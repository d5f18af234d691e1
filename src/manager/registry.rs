use std::fmt;

use super::frame::FramePacer;
use crate::utils::Size;

/// Identifier of an open window.
///
/// Ids are dense: with `n` open windows the valid ids are `0..n`. Removing a window
/// shifts every later window down by one, so an id is only meaningful until the next
/// removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(usize);

impl WindowId {
    /// Create an id from its index
    #[inline]
    pub const fn new(index: usize) -> WindowId {
        WindowId(index)
    }

    /// Index of the window in creation order
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window {}", self.0)
    }
}

impl From<usize> for WindowId {
    #[inline]
    fn from(index: usize) -> WindowId {
        WindowId(index)
    }
}

/// Everything the window manager keeps for one open window
#[derive(Debug)]
pub(crate) struct WindowEntry<W, S> {
    pub native: W,
    pub surface: Option<S>,
    pub title: String,
    pub size: Size<u32>,
    pub pacer: FramePacer,
}

impl<W, S> WindowEntry<W, S> {
    pub fn new(native: W, surface: Option<S>, title: &str, size: Size<u32>) -> Self {
        WindowEntry {
            native,
            surface,
            title: title.to_owned(),
            size,
            pacer: FramePacer::default(),
        }
    }
}

/// Bounded, densely indexed collection of open windows
#[derive(Debug)]
pub(crate) struct WindowRegistry<W, S> {
    entries: Vec<WindowEntry<W, S>>,
    capacity: usize,
}

impl<W: Copy + Eq, S> WindowRegistry<W, S> {
    pub fn new(capacity: usize) -> Self {
        WindowRegistry {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Append an entry, returning its id.
    ///
    /// Returns the entry back if the registry is full.
    pub fn insert(&mut self, entry: WindowEntry<W, S>) -> Result<WindowId, WindowEntry<W, S>> {
        if self.is_full() {
            return Err(entry);
        }
        self.entries.push(entry);
        Ok(WindowId(self.entries.len() - 1))
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowEntry<W, S>> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut WindowEntry<W, S>> {
        self.entries.get_mut(id.0)
    }

    /// Find the id of a native window
    pub fn position(&self, native: W) -> Option<WindowId> {
        self.entries
            .iter()
            .position(|entry| entry.native == native)
            .map(WindowId)
    }

    /// Remove an entry, shifting every later entry down by one
    pub fn remove(&mut self, id: WindowId) -> Option<WindowEntry<W, S>> {
        (id.0 < self.entries.len()).then(|| self.entries.remove(id.0))
    }

    /// Remove every entry, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = WindowEntry<W, S>> + '_ {
        self.entries.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WindowId, &WindowEntry<W, S>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (WindowId(index), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(native: u32) -> WindowEntry<u32, ()> {
        WindowEntry::new(native, None, "test", Size::new(1, 1))
    }

    #[test]
    fn removal_shifts_later_ids() {
        let mut registry = WindowRegistry::new(4);
        for native in 100..103 {
            registry.insert(entry(native)).unwrap();
        }

        let removed = registry.remove(WindowId::new(0)).unwrap();
        assert_eq!(removed.native, 100);
        assert_eq!(registry.position(101), Some(WindowId::new(0)));
        assert_eq!(registry.position(102), Some(WindowId::new(1)));
        assert_eq!(registry.position(100), None);
        assert!(registry.get(WindowId::new(2)).is_none());
    }

    #[test]
    fn insert_respects_capacity() {
        let mut registry = WindowRegistry::new(2);
        assert_eq!(registry.insert(entry(1)).ok(), Some(WindowId::new(0)));
        assert_eq!(registry.insert(entry(2)).ok(), Some(WindowId::new(1)));
        assert!(registry.is_full());
        let rejected = registry.insert(entry(3)).unwrap_err();
        assert_eq!(rejected.native, 3);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_out_of_range() {
        let mut registry = WindowRegistry::new(2);
        registry.insert(entry(1)).unwrap();
        assert!(registry.remove(WindowId::new(1)).is_none());
        assert_eq!(registry.len(), 1);
    }
}
