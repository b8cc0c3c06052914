//! Liveness queries injected by the subsystems that consume resources

use crate::types::ResourceType;
use std::collections::HashMap;
use std::fmt;

/// Callback answering "is resource `index` currently referenced?"
pub type LivenessQuery = Box<dyn Fn(usize) -> bool>;

/// Per-type liveness callbacks
///
/// The script engine registers for scripts, the actor renderer for
/// costumes, the mixer for sounds. A type without a callback is never
/// in use.
#[derive(Default)]
pub struct LivenessRegistry {
    queries: HashMap<ResourceType, LivenessQuery>,
}

impl LivenessRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the callback for `ty`, replacing any previous one
    pub fn register<F>(&mut self, ty: ResourceType, query: F)
    where
        F: Fn(usize) -> bool + 'static,
    {
        self.queries.insert(ty, Box::new(query));
    }

    /// Remove the callback for `ty`
    pub fn unregister(&mut self, ty: ResourceType) -> bool {
        self.queries.remove(&ty).is_some()
    }

    /// Ask the registered callback, if any
    pub fn is_live(&self, ty: ResourceType, index: usize) -> bool {
        self.queries.get(&ty).is_some_and(|query| query(index))
    }

    /// Whether `(ty, index)` is referenced by the running game
    ///
    /// Rooms and room scripts are in use while they are the current room;
    /// everything else asks the registered callback.
    pub fn is_in_use(&self, ty: ResourceType, index: usize, current_room: Option<u16>) -> bool {
        match ty {
            ResourceType::Room | ResourceType::RoomScripts => {
                current_room.is_some_and(|room| usize::from(room) == index)
            }
            _ => self.is_live(ty, index),
        }
    }
}

impl fmt::Debug for LivenessRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessRegistry")
            .field("types", &self.queries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_registry_dispatch() {
        let mut registry = LivenessRegistry::new();
        assert!(!registry.is_live(ResourceType::Sound, 3));

        let playing = Rc::new(Cell::new(3usize));
        let probe = Rc::clone(&playing);
        registry.register(ResourceType::Sound, move |i| probe.get() == i);

        assert!(registry.is_live(ResourceType::Sound, 3));
        assert!(!registry.is_live(ResourceType::Sound, 4));
        assert!(!registry.is_live(ResourceType::Costume, 3));

        playing.set(4);
        assert!(registry.is_live(ResourceType::Sound, 4));

        assert!(registry.unregister(ResourceType::Sound));
        assert!(!registry.is_live(ResourceType::Sound, 4));
    }

    #[test]
    fn test_current_room_in_use() {
        let mut registry = LivenessRegistry::new();
        registry.register(ResourceType::Room, |_| true);

        assert!(registry.is_in_use(ResourceType::Room, 4, Some(4)));
        assert!(registry.is_in_use(ResourceType::RoomScripts, 4, Some(4)));
        assert!(!registry.is_in_use(ResourceType::Room, 5, Some(4)));
        assert!(!registry.is_in_use(ResourceType::Room, 0, None));
        assert!(!registry.is_in_use(ResourceType::Script, 0, Some(0)));
    }
}
