//! Live-instance tracking for method handlers.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, Weak},
};

/// The live instances of one type.
///
/// Members are held weakly; an instance that has been dropped stops
/// receiving method handlers without deregistering.
pub struct InstanceSet<T> {
    members: Mutex<Vec<Weak<T>>>,
}

impl<T> Default for InstanceSet<T> {
    fn default() -> Self {
        Self {
            members: Mutex::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for InstanceSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSet")
            .field("type", &std::any::type_name::<T>())
            .field("live", &self.len())
            .finish()
    }
}

impl<T> InstanceSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `instance`. Returns `false` if it was already registered.
    pub fn register(&self, instance: &Arc<T>) -> bool {
        let mut members = self.members.lock().unwrap();
        members.retain(|member| member.strong_count() > 0);
        if members.iter().any(|member| is_member(member, instance)) {
            return false;
        }
        members.push(Arc::downgrade(instance));
        true
    }

    /// Remove `instance`. Returns `false` if it was not registered.
    pub fn deregister(&self, instance: &Arc<T>) -> bool {
        let mut members = self.members.lock().unwrap();
        let before = members.len();
        members.retain(|member| member.strong_count() > 0 && !is_member(member, instance));
        members.len() < before
    }

    /// Strong references to every live member, pruning dead ones.
    pub fn live(&self) -> Vec<Arc<T>> {
        let mut members = self.members.lock().unwrap();
        members.retain(|member| member.strong_count() > 0);
        members.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.members
            .lock()
            .unwrap()
            .iter()
            .filter(|member| member.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_member<T>(member: &Weak<T>, instance: &Arc<T>) -> bool {
    std::ptr::eq(member.as_ptr(), Arc::as_ptr(instance))
}

/// One [`InstanceSet`] per type, created on first use.
#[derive(Default)]
pub struct InstanceRegistry {
    sets: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("types", &self.sets.lock().unwrap().len())
            .finish()
    }
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance set for `T`, shared by every handler of `T`.
    pub fn set_for<T: Send + Sync + 'static>(&self) -> Arc<InstanceSet<T>> {
        let mut sets = self.sets.lock().unwrap();
        let set = sets
            .entry(TypeId::of::<InstanceSet<T>>())
            .or_insert_with(|| Arc::new(InstanceSet::<T>::new()));
        Arc::clone(set)
            .downcast::<InstanceSet<T>>()
            .expect("instance sets are keyed by their own type id")
    }
}
