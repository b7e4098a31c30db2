//! Single-entry cache for resources bound to one graphics context.

/// Where a slot stands relative to the key it is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Current,
    /// Holds a value built for a different key.
    Stale,
}

/// Holds at most one value, tagged with the key it was built for.
///
/// Asking for a different key drops the old value before building the new
/// one; a value is never handed out under a key it was not built for.
#[derive(Debug)]
pub struct KeyedSlot<K, V> {
    entry: Option<(K, V)>,
}

impl<K, V> Default for KeyedSlot<K, V> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<K: Copy + PartialEq, V> KeyedSlot<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<K> {
        self.entry.as_ref().map(|(k, _)| *k)
    }

    pub fn state(&self, key: K) -> SlotState {
        match self.key() {
            None => SlotState::Empty,
            Some(k) if k == key => SlotState::Current,
            Some(_) => SlotState::Stale,
        }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        match &self.entry {
            Some((k, v)) if *k == key => Some(v),
            _ => None,
        }
    }

    /// Returns the value for `key`, building it if the slot is empty or stale.
    /// A failed build leaves the slot empty.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<&mut V, E> {
        let entry = match self.entry.take() {
            Some((k, v)) if k == key => (k, v),
            stale => {
                drop(stale);
                (key, build()?)
            }
        };
        Ok(&mut self.entry.insert(entry).1)
    }

    pub fn get_or_insert_with(&mut self, key: K, build: impl FnOnce() -> V) -> &mut V {
        let entry = match self.entry.take() {
            Some((k, v)) if k == key => (k, v),
            stale => {
                drop(stale);
                (key, build())
            }
        };
        &mut self.entry.insert(entry).1
    }

    /// Drops the value if it was built for another key.
    pub fn evict_unless(&mut self, key: K) -> bool {
        if self.state(key) == SlotState::Stale {
            self.entry = None;
            true
        } else {
            false
        }
    }

    /// Drops the value if its key matches `stale`.
    pub fn evict_if(&mut self, stale: impl FnOnce(&K) -> bool) -> bool {
        if self.entry.as_ref().is_some_and(|(k, _)| stale(k)) {
            self.entry = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
