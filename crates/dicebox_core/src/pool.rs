//! Reusable die instance pool
//!
//! Every die that ever appears on the table comes out of this pool. The pool
//! grows on demand and is never shrunk: rolling at steady state allocates
//! nothing. Released instances keep whatever group id and tint they last
//! carried; both are overwritten when the instance is next acquired.

use nalgebra::Isometry3;
use slotmap::{new_key_type, SlotMap};

use crate::types::{DieType, Tint};

new_key_type! {
    /// Key to a pooled die instance
    ///
    /// Generational, so a stale key held past a roll can never reach an
    /// instance that has since been recycled into a different roll.
    pub struct DieKey;
}

/// A pooled die: the visual state an external renderer consumes each frame,
/// plus the group tagging set at acquire time
#[derive(Clone, Debug)]
pub struct DieInstance {
    /// Id of the group this die currently belongs to
    pub group_id: String,
    /// Visual tint
    pub tint: Tint,
    /// Kind of die this instance currently represents
    pub die_type: DieType,
    /// Linear scale of the die model
    pub scale: f32,
    /// Current world transform, synced from the physics body each frame
    pub transform: Isometry3<f32>,
    /// Whether the renderer must skip this die (its result was forced and it
    /// no longer has a physics body)
    pub culled: bool,
}

impl Default for DieInstance {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            tint: Tint::WHITE,
            die_type: DieType::D6,
            scale: 1.0,
            transform: Isometry3::identity(),
            culled: false,
        }
    }
}

/// Growable pool of die instances with a free list
pub struct DieInstancePool {
    slots: SlotMap<DieKey, DieInstance>,
    free: Vec<DieKey>,
    created: usize,
}

impl Default for DieInstancePool {
    fn default() -> Self {
        Self::new()
    }
}

impl DieInstancePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            free: Vec::new(),
            created: 0,
        }
    }

    /// Create a pool with instances preallocated
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self::new();
        for _ in 0..capacity {
            let key = pool.slots.insert(DieInstance::default());
            pool.free.push(key);
            pool.created += 1;
        }
        pool
    }

    /// Take an instance out of the pool, growing it if none are free
    pub fn acquire(&mut self) -> DieKey {
        match self.free.pop() {
            Some(key) => key,
            None => {
                self.created += 1;
                log::debug!("die pool grew to {} instances", self.created);
                self.slots.insert(DieInstance::default())
            }
        }
    }

    /// Return an instance to the pool
    ///
    /// Callers must not retain or mutate the instance afterwards. Releasing
    /// an unknown or already-free key is a no-op.
    pub fn release(&mut self, key: DieKey) {
        if self.slots.contains_key(key) && !self.free.contains(&key) {
            self.free.push(key);
        }
    }

    /// Get an instance by key
    pub fn get(&self, key: DieKey) -> Option<&DieInstance> {
        self.slots.get(key)
    }

    /// Get a mutable instance by key
    pub fn get_mut(&mut self, key: DieKey) -> Option<&mut DieInstance> {
        self.slots.get_mut(key)
    }

    /// Total instances ever constructed
    pub fn created(&self) -> usize {
        self.created
    }

    /// Instances currently sitting in the free list
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Instances currently handed out
    pub fn in_use(&self) -> usize {
        self.created - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_grows_empty_pool() {
        let mut pool = DieInstancePool::new();
        assert_eq!(pool.created(), 0);

        let key = pool.acquire();
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.in_use(), 1);
        assert!(pool.get(key).is_some());
    }

    #[test]
    fn test_release_and_reacquire_recycles() {
        let mut pool = DieInstancePool::new();
        let key = pool.acquire();
        pool.release(key);
        assert_eq!(pool.free_count(), 1);

        let again = pool.acquire();
        assert_eq!(again, key);
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_pool_never_shrinks() {
        let mut pool = DieInstancePool::new();
        let keys: Vec<DieKey> = (0..8).map(|_| pool.acquire()).collect();
        for key in &keys {
            pool.release(*key);
        }
        assert_eq!(pool.created(), 8);
        assert_eq!(pool.free_count(), 8);

        // A fresh burst reuses every instance
        for _ in 0..8 {
            pool.acquire();
        }
        assert_eq!(pool.created(), 8);
    }

    #[test]
    fn test_double_release_is_ignored() {
        let mut pool = DieInstancePool::new();
        let key = pool.acquire();
        pool.release(key);
        pool.release(key);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_released_state_overwritten_on_reconfigure() {
        let mut pool = DieInstancePool::new();
        let key = pool.acquire();
        if let Some(instance) = pool.get_mut(key) {
            instance.group_id = "dmg".to_string();
            instance.tint = Tint::RED;
            instance.culled = true;
        }
        pool.release(key);

        // Release does not clear anything; acquire-time reconfiguration does
        let again = pool.acquire();
        if let Some(instance) = pool.get_mut(again) {
            instance.group_id = "heal".to_string();
            instance.tint = Tint::GREEN;
            instance.culled = false;
        }
        let instance = pool.get(again).expect("instance exists");
        assert_eq!(instance.group_id, "heal");
        assert_eq!(instance.tint, Tint::GREEN);
        assert!(!instance.culled);
    }

    #[test]
    fn test_with_capacity_preallocates() {
        let mut pool = DieInstancePool::with_capacity(4);
        assert_eq!(pool.created(), 4);
        assert_eq!(pool.free_count(), 4);

        for _ in 0..4 {
            pool.acquire();
        }
        assert_eq!(pool.created(), 4);
        pool.acquire();
        assert_eq!(pool.created(), 5);
    }
}
