use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::CoreResult;
use crate::property::{Property, PropertyContainer, PropertyStore, PropertyValue};

/// Properties not owned by any one entity (screen size, active camera, ...).
///
/// A cheap shared handle: clones see the same store. Components that need a
/// global capture a clone when they are constructed.
#[derive(Clone)]
pub struct GlobalProperties {
    store: Rc<RefCell<PropertyStore>>,
}

impl Default for GlobalProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalProperties {
    /// A new, empty store.
    pub fn new() -> Self {
        Self {
            store: Rc::new(RefCell::new(PropertyStore::new("globals"))),
        }
    }

    /// See [`PropertyStore::add`]. Takes `&self`; the store is shared.
    pub fn add<T: PropertyValue>(&self, name: &str, default: T) -> CoreResult<Property<T>> {
        self.store.borrow_mut().add(name, default)
    }

    /// See [`PropertyStore::get`].
    pub fn get<T: PropertyValue>(&self, name: &str) -> Option<Property<T>> {
        self.store.borrow().get(name)
    }

    /// See [`PropertyStore::has`].
    pub fn has<T: PropertyValue>(&self, name: &str) -> bool {
        self.store.borrow().has::<T>(name)
    }

    /// See [`PropertyStore::remove`].
    pub fn remove<T: PropertyValue>(&self, name: &str) -> Option<Property<T>> {
        self.store.borrow_mut().remove(name)
    }

    /// Property names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.store.borrow().names().into_iter().map(str::to_string).collect()
    }

    /// Whether two handles share a store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }
}

impl PropertyContainer for GlobalProperties {
    fn with_properties<R>(&self, f: impl FnOnce(&PropertyStore) -> R) -> R {
        f(&*self.store.borrow())
    }

    fn with_properties_mut<R>(&mut self, f: impl FnOnce(&mut PropertyStore) -> R) -> R {
        f(&mut *self.store.borrow_mut())
    }
}

impl fmt::Debug for GlobalProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobalProperties")
            .field(&*self.store.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;

    #[test]
    fn clones_share_the_store() {
        let globals = GlobalProperties::new();
        let other = globals.clone();
        globals.add("ScreenDimensions", Vector2::new(800.0, 600.0)).unwrap();

        let screen = other.get::<Vector2>("ScreenDimensions").unwrap();
        assert_eq!(screen.get(), Vector2::new(800.0, 600.0));
        assert!(globals.ptr_eq(&other));
    }

    #[test]
    fn container_surface_matches_entities() {
        let mut globals = GlobalProperties::new();
        globals.add_property("Paused", false).unwrap();
        assert!(globals.has_property::<bool>("Paused"));
        assert!(globals.remove_property::<i32>("Paused").is_none());
        assert!(globals.remove_property::<bool>("Paused").is_some());
        assert!(globals.names().is_empty());
    }

    #[test]
    fn type_conflict_names_globals() {
        let globals = GlobalProperties::new();
        globals.add("Zoom", 1.0_f32).unwrap();
        let err = globals.add("Zoom", 1_i32).unwrap_err();
        assert!(err.to_string().contains("on globals"), "{err}");
    }
}
