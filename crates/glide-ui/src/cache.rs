//! Byte-budgeted store of rendered surfaces, keyed by the element that owns
//! them.
//!
//! When an allocation would push the live total over `budget_bytes`, the
//! cache evicts the oldest entries until the total plus the new allocation
//! fits in `evict_to_bytes`. Eviction order is insertion order; only the byte
//! bound is a guarantee.

use glide_core::ElementId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::surface::{Surface, surface_bytes};

pub const MIB: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub budget_bytes: usize,
    pub evict_to_bytes: usize,
    /// Allocations larger than this fail as if memory ran out.
    pub max_surface_bytes: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            budget_bytes: 10 * MIB,
            evict_to_bytes: MIB,
            max_surface_bytes: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub allocations: u64,
    pub failures: u64,
    pub evictions: u64,
    pub sweeps: u64,
}

pub struct SurfaceCache {
    config: CacheConfig,
    surfaces: IndexMap<ElementId, Surface>,
    bytes: usize,
    stats: CacheStats,
}

impl Default for SurfaceCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl SurfaceCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            surfaces: IndexMap::new(),
            bytes: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn with_budget(budget_bytes: usize, evict_to_bytes: usize) -> Self {
        Self::new(CacheConfig {
            budget_bytes,
            evict_to_bytes,
            max_surface_bytes: None,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.surfaces.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// Drop the surface owned by `id`. Returns whether one was cached.
    pub fn invalidate(&mut self, id: ElementId) -> bool {
        match self.surfaces.shift_remove(&id) {
            Some(s) => {
                self.bytes -= s.bytes();
                true
            }
            None => false,
        }
    }

    /// Teardown: release every surface.
    pub fn clear(&mut self) {
        self.surfaces.clear();
        self.bytes = 0;
    }

    fn make_room(&mut self, need: usize) {
        if self.bytes + need <= self.config.budget_bytes {
            return;
        }
        let before = self.bytes;
        let mut evicted = 0usize;
        while self.bytes + need > self.config.evict_to_bytes {
            let Some((_, s)) = self.surfaces.shift_remove_index(0) else {
                break;
            };
            self.bytes -= s.bytes();
            evicted += 1;
        }
        self.stats.evictions += evicted as u64;
        self.stats.sweeps += 1;
        log::debug!(
            "surface cache sweep: evicted {evicted}, {before} -> {} bytes (need {need})",
            self.bytes
        );
    }

    /// Replace `id`'s surface with a fresh transparent `width x height` one,
    /// evicting older surfaces first if the budget requires it.
    pub fn allocate(&mut self, id: ElementId, width: u32, height: u32) -> Result<&mut Surface> {
        self.invalidate(id);
        let need = surface_bytes(width, height);
        self.make_room(need);

        let surface = match Surface::allocate(width, height, self.config.max_surface_bytes) {
            Ok(s) => s,
            Err(e) => {
                self.stats.failures += 1;
                return Err(e);
            }
        };
        self.stats.allocations += 1;
        self.bytes += surface.bytes();
        let (index, _) = self.surfaces.insert_full(id, surface);
        Ok(&mut self.surfaces[index])
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::UiError;

    fn surface_sizes() -> impl Strategy<Value = Vec<(u32, u32)>> {
        prop::collection::vec((1u32..=96, 1u32..=96), 1..500)
    }

    proptest! {
        #[test]
        fn eviction_never_overshoots_the_budget(sizes in surface_sizes()) {
            let budget = 64 * 1024;
            let mut cache = SurfaceCache::with_budget(budget, 16 * 1024);
            let mut requested = 0usize;

            for (w, h) in sizes {
                let need = surface_bytes(w, h);
                requested += need;
                cache.allocate(ElementId::next(), w, h).unwrap();
                prop_assert!(
                    cache.bytes() <= budget.max(need),
                    "{} bytes live after a {need} byte allocation",
                    cache.bytes()
                );
                prop_assert!(cache.bytes() >= need);
            }
            prop_assert_eq!(cache.stats().evictions > 0, requested > budget);
        }
    }

    #[test]
    fn reallocating_replaces_existing_surface() {
        let mut cache = SurfaceCache::default();
        let id = ElementId::next();
        cache.allocate(id, 10, 10).unwrap();
        cache.allocate(id, 20, 10).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.bytes(), 800);
    }

    #[test]
    fn oldest_surfaces_go_first() {
        let mut cache = SurfaceCache::with_budget(1000, 400);
        let a = ElementId::next();
        let b = ElementId::next();
        let c = ElementId::next();
        cache.allocate(a, 10, 10).unwrap(); // 400
        cache.allocate(b, 10, 10).unwrap(); // 800
        cache.allocate(c, 10, 10).unwrap(); // would be 1200
        assert!(!cache.contains(a));
        assert!(!cache.contains(b));
        assert!(cache.contains(c));
        assert_eq!(cache.bytes(), 400);
    }

    #[test]
    fn failed_allocation_leaves_cache_consistent() {
        let mut cache = SurfaceCache::new(CacheConfig {
            max_surface_bytes: Some(100),
            ..CacheConfig::default()
        });
        let id = ElementId::next();
        let err = cache.allocate(id, 50, 50).unwrap_err();
        assert!(matches!(err, UiError::SurfaceAllocation { .. }));
        assert_eq!(cache.bytes(), 0);
        assert_eq!(cache.stats().failures, 1);
    }

    #[test]
    fn invalidate_and_clear_release_bytes() {
        let mut cache = SurfaceCache::default();
        let a = ElementId::next();
        cache.allocate(a, 4, 4).unwrap();
        cache.allocate(ElementId::next(), 4, 4).unwrap();
        assert!(cache.invalidate(a));
        assert!(!cache.invalidate(a));
        assert_eq!(cache.bytes(), 64);
        cache.clear();
        assert_eq!(cache.bytes(), 0);
        assert!(cache.is_empty());
    }
}
