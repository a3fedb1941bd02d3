/// `SlotCache` is a fixed-capacity array of slots. Every slot remembers the id of its
/// last use, taken from a single monotonically increasing counter. It never grows:
/// when no slot is free the one with the smallest id (the least recently used one)
/// is handed out for replacement.
pub struct SlotCache<const N: usize, T> {
    next_id: u64,
    slots: Vec<Option<Entry<T>>>,
}

struct Entry<T> {
    id: u64,
    value: T,
}

/// Outcome of [`SlotCache::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// A slot matched. Its id has already been refreshed.
    Hit(usize),
    /// Nothing matched. The index is the first empty slot, or the oldest one when
    /// the cache is full.
    Miss(usize),
}

impl<const N: usize, T> Default for SlotCache<N, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, T> SlotCache<N, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            slots: (0..N).map(|_| None).collect(),
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The last id handed out.
    #[must_use]
    pub const fn last_id(&self) -> u64 {
        self.next_id
    }

    /// Walks the slots looking for a value accepted by `matches`.
    ///
    /// On a hit the slot is stamped with a fresh id. On a miss the returned index is
    /// where the caller should [`put`](Self::put) the new value.
    pub fn search<F>(&mut self, mut matches: F) -> Lookup
    where
        F: FnMut(&T) -> bool,
    {
        let mut first_empty = None;
        let mut oldest: Option<(usize, u64)> = None;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                None => {
                    if first_empty.is_none() {
                        first_empty = Some(index);
                    }
                }
                Some(entry) if matches(&entry.value) => {
                    self.next_id += 1;
                    entry.id = self.next_id;
                    return Lookup::Hit(index);
                }
                Some(entry) => {
                    if oldest.is_none_or(|(_, id)| entry.id < id) {
                        oldest = Some((index, entry.id));
                    }
                }
            }
        }

        Lookup::Miss(first_empty.or(oldest.map(|(index, _)| index)).unwrap_or(0))
    }

    /// Stores `value` at `index`, replacing whatever was there, and stamps it with a
    /// fresh id. Returns the evicted value, if any.
    ///
    /// # Errors
    ///
    /// Returns the offending index when it is out of range; `value` is dropped.
    pub fn put(&mut self, index: usize, value: T) -> Result<Option<T>, usize> {
        let slot = self.slots.get_mut(index).ok_or(index)?;
        self.next_id += 1;
        let previous = slot.replace(Entry {
            id: self.next_id,
            value,
        });

        Ok(previous.map(|entry| entry.value))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref().map(|entry| &entry.value)
    }

    /// Id of the last use of slot `index`.
    #[must_use]
    pub fn id_of(&self, index: usize) -> Option<u64> {
        self.slots.get(index)?.as_ref().map(|entry| entry.id)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new() {
        let cache: SlotCache<10, u8> = SlotCache::new();
        assert_eq!(cache.capacity(), 10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.last_id(), 0);
    }

    #[test]
    fn miss_uses_first_empty_slot() {
        let mut cache: SlotCache<3, u8> = SlotCache::new();
        assert_eq!(cache.search(|v| *v == 1), Lookup::Miss(0));

        cache.put(0, 1).unwrap();
        assert_eq!(cache.search(|v| *v == 2), Lookup::Miss(1));

        cache.put(1, 2).unwrap();
        assert_eq!(cache.search(|v| *v == 2), Lookup::Hit(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn full_cache_replaces_oldest() {
        let mut cache: SlotCache<3, u8> = SlotCache::new();
        cache.put(0, 10).unwrap();
        cache.put(1, 11).unwrap();
        cache.put(2, 12).unwrap();

        // Touch slot 0 so slot 1 becomes the oldest.
        assert_eq!(cache.search(|v| *v == 10), Lookup::Hit(0));
        assert_eq!(cache.search(|v| *v == 99), Lookup::Miss(1));

        let evicted = cache.put(1, 99).unwrap();
        assert_eq!(evicted, Some(11));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.search(|v| *v == 12), Lookup::Hit(2));
        assert_eq!(cache.search(|v| *v == 7), Lookup::Miss(0));
    }

    #[test]
    fn ids_are_monotonic() {
        let mut cache: SlotCache<2, u8> = SlotCache::new();
        cache.put(0, 1).unwrap();
        let first = cache.id_of(0).unwrap();
        cache.put(1, 2).unwrap();
        assert!(cache.id_of(1).unwrap() > first);

        cache.search(|v| *v == 1);
        assert!(cache.id_of(0).unwrap() > cache.id_of(1).unwrap());
    }

    #[test]
    fn put_out_of_range() {
        let mut cache: SlotCache<2, u8> = SlotCache::new();
        assert_eq!(cache.put(2, 1), Err(2));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear() {
        let mut cache: SlotCache<2, u8> = SlotCache::new();
        cache.put(0, 1).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(0), None);
    }
}
