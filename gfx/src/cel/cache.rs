use slotcache::{Lookup, SlotCache};

use crate::error::CelError;

use super::{CelInfo, CelObj, CelType};

/// Number of parsed cels kept around.
pub const CEL_CACHE_SIZE: usize = 100;

struct CachedCel {
    /// The info the cel was requested with. Parsing may clamp the cel's own info, so
    /// lookups compare against this one.
    key: CelInfo,
    cel: CelObj,
}

/// Fixed-size cache of parsed view and pic cels.
///
/// Lookups hand out copies: a cached cel shares its resource bytes with every copy,
/// only the metadata is duplicated.
#[derive(Default)]
pub struct CelCache {
    slots: SlotCache<CEL_CACHE_SIZE, CachedCel>,
}

impl CelCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks `info` up. A hit refreshes the slot; a miss names the slot the new cel
    /// should go to.
    pub fn search(&mut self, info: &CelInfo) -> Lookup {
        let lookup = self.slots.search(|cached| cached.key == *info);
        tracing::trace!("cel cache lookup {info:?}: {lookup:?}");
        lookup
    }

    /// A copy of the cel in slot `index`, which must hold a cel of type `expected`.
    ///
    /// # Errors
    ///
    /// Fails for empty or out-of-range slots and for slots holding another type.
    pub fn get(&self, index: usize, expected: CelType) -> Result<CelObj, CelError> {
        let cached = self
            .slots
            .get(index)
            .ok_or(CelError::InvalidCacheIndex(index))?;

        if cached.cel.info.kind != expected {
            return Err(CelError::CacheTypeMismatch {
                slot: index,
                expected,
            });
        }
        Ok(cached.cel.clone())
    }

    /// Stores a copy of `cel` under `key` in slot `index`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is past the end of the cache.
    pub fn insert(&mut self, index: usize, key: CelInfo, cel: &CelObj) -> Result<(), CelError> {
        let evicted = self
            .slots
            .put(
                index,
                CachedCel {
                    key,
                    cel: cel.clone(),
                },
            )
            .map_err(CelError::InvalidCacheIndex)?;

        if let Some(evicted) = evicted {
            tracing::debug!("cel cache slot {index}: {:?} replaces {:?}", key, evicted.key);
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Key held by slot `index`.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<CelInfo> {
        self.slots.get(index).map(|cached| cached.key)
    }

    /// Id of the last use of slot `index`; larger is more recent.
    #[must_use]
    pub fn id_of(&self, index: usize) -> Option<u64> {
        self.slots.id_of(index)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cel(info: CelInfo) -> CelObj {
        let mut cel = CelObj::color(0, 1, 1, 320, 200);
        cel.info = info;
        cel
    }

    fn fetch(cache: &mut CelCache, info: CelInfo) -> usize {
        match cache.search(&info) {
            Lookup::Hit(index) => index,
            Lookup::Miss(index) => {
                cache.insert(index, info, &cel(info)).unwrap();
                index
            }
        }
    }

    #[test]
    fn hits_return_the_same_slot() {
        let mut cache = CelCache::new();
        let first = fetch(&mut cache, CelInfo::view(1, 0, 0));
        let second = fetch(&mut cache, CelInfo::view(1, 0, 1));
        assert_ne!(first, second);

        assert_eq!(cache.search(&CelInfo::view(1, 0, 0)), Lookup::Hit(first));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn slot_type_is_checked() {
        let mut cache = CelCache::new();
        let index = fetch(&mut cache, CelInfo::pic(4, 0));

        assert_eq!(cache.get(index, CelType::Pic).unwrap().info, CelInfo::pic(4, 0));
        assert_eq!(
            cache.get(index, CelType::View).err(),
            Some(CelError::CacheTypeMismatch {
                slot: index,
                expected: CelType::View
            })
        );
        assert_eq!(
            cache.get(index + 1, CelType::Pic).err(),
            Some(CelError::InvalidCacheIndex(index + 1))
        );
        assert_eq!(
            cache.insert(CEL_CACHE_SIZE, CelInfo::pic(4, 0), &cel(CelInfo::pic(4, 0))),
            Err(CelError::InvalidCacheIndex(CEL_CACHE_SIZE))
        );
    }

    #[test]
    fn a_full_cache_evicts_the_least_recently_used_cel() {
        let mut cache = CelCache::new();
        let keys: Vec<_> = (0..CEL_CACHE_SIZE)
            .map(|n| CelInfo::view(u16::try_from(n).unwrap(), 0, 0))
            .collect();
        for key in &keys {
            fetch(&mut cache, *key);
        }
        assert_eq!(cache.len(), CEL_CACHE_SIZE);

        // Touch the first one so the second becomes the oldest.
        fetch(&mut cache, keys[0]);
        let index = fetch(&mut cache, CelInfo::view(500, 0, 0));
        assert_eq!(cache.key(index), Some(CelInfo::view(500, 0, 0)));
        assert!(matches!(cache.search(&keys[1]), Lookup::Miss(_)));
        assert!(matches!(cache.search(&keys[0]), Lookup::Hit(_)));
        assert_eq!(cache.len(), CEL_CACHE_SIZE);
    }

    #[test]
    fn random_workload_matches_an_lru_model() {
        let mut rng = StdRng::seed_from_u64(0x5C1_32);
        let mut cache = CelCache::new();
        // Most recently used last.
        let mut model: Vec<CelInfo> = Vec::new();

        for _ in 0..5000 {
            let key = CelInfo::view(rng.gen_range(0..150), 0, 0);
            let hit = matches!(cache.search(&key), Lookup::Hit(_));
            assert_eq!(hit, model.contains(&key), "{key:?}");

            if hit {
                model.retain(|cached| *cached != key);
            } else {
                let Lookup::Miss(index) = cache.search(&key) else {
                    unreachable!()
                };
                cache.insert(index, key, &cel(key)).unwrap();
                if model.len() == CEL_CACHE_SIZE {
                    model.remove(0);
                }
            }
            model.push(key);
            assert!(cache.len() <= CEL_CACHE_SIZE);
        }

        assert_eq!(cache.len(), CEL_CACHE_SIZE);
        for key in &model {
            assert!(matches!(cache.search(key), Lookup::Hit(_)));
        }
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut cache = CelCache::new();
        fetch(&mut cache, CelInfo::view(1, 0, 0));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), CEL_CACHE_SIZE);
    }
}
