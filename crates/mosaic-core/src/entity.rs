use std::any::Any;
use std::cell::{Ref, RefMut};
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::{Component, ComponentHandle};
use crate::error::CoreResult;
use crate::event::{Event, EventCallback, EventRegistry};
use crate::factory::ComponentFactory;
use crate::property::{PropertyContainer, PropertyStore};

/// Unique identifier for every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A bag of properties, components and events.
///
/// The three namespaces are independent: a property, a component and an
/// event may all share one name.
pub struct Entity {
    id: EntityId,
    name: String,
    properties: PropertyStore,
    components: HashMap<String, ComponentHandle>,
    /// Component names in insertion order.
    component_order: Vec<String>,
    events: EventRegistry,
}

impl Entity {
    /// Create an empty entity with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: EntityId::new(),
            properties: PropertyStore::new(name.clone()),
            name,
            components: HashMap::new(),
            component_order: Vec::new(),
            events: EventRegistry::new(),
        }
    }

    /// Unique id, assigned at construction.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The name the entity was produced under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity's property store.
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Mutable access to the property store.
    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    // -- components -------------------------------------------------------

    /// Create a component through `factory` and attach it under `name`
    /// (default: the type name). If a component with that name is already
    /// attached it is returned unchanged and nothing is constructed.
    pub fn add_component(
        &mut self,
        factory: &ComponentFactory,
        type_name: &str,
        name: Option<&str>,
    ) -> CoreResult<ComponentHandle> {
        let name = name.filter(|n| !n.is_empty()).unwrap_or(type_name);
        if let Some(existing) = self.components.get(name) {
            return Ok(existing.clone());
        }
        let handle = factory.create(self, type_name, Some(name))?;
        self.components.insert(name.to_string(), handle.clone());
        self.component_order.push(name.to_string());
        log::trace!("{}: attached component {name} ({type_name})", self.name);
        Ok(handle)
    }

    /// The component attached under `name`.
    pub fn get_component(&self, name: &str) -> Option<&ComponentHandle> {
        self.components.get(name)
    }

    /// Whether a component is attached under `name`.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Borrow the component `name` as a `T`. `None` if it is missing, of
    /// another type, or mutably borrowed.
    pub fn component<T: Component>(&self, name: &str) -> Option<Ref<'_, T>> {
        let borrowed = self.components.get(name)?.try_borrow().ok()?;
        Ref::filter_map(borrowed, |c| c.as_any().downcast_ref::<T>()).ok()
    }

    /// Mutable counterpart of [`component`](Self::component).
    pub fn component_mut<T: Component>(&self, name: &str) -> Option<RefMut<'_, T>> {
        let borrowed = self.components.get(name)?.try_borrow_mut().ok()?;
        RefMut::filter_map(borrowed, |c| c.as_any_mut().downcast_mut::<T>()).ok()
    }

    /// Detach a component. Host subsystems holding weak references drop it
    /// on their next pass.
    pub fn remove_component(&mut self, name: &str) -> Option<ComponentHandle> {
        let handle = self.components.remove(name)?;
        self.component_order.retain(|n| n != name);
        Some(handle)
    }

    /// Components in the order they were attached.
    pub fn components(&self) -> impl Iterator<Item = (&str, &ComponentHandle)> {
        self.component_order
            .iter()
            .filter_map(|name| self.components.get(name).map(|h| (name.as_str(), h)))
    }

    /// Component names in attach order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.component_order.iter().map(String::as_str)
    }

    // -- events -----------------------------------------------------------

    /// See [`EventRegistry::add`].
    pub fn add_event(&mut self, name: &str, callback: impl Fn(&dyn Any) + 'static) -> Event {
        self.events.add(name, callback)
    }

    /// See [`EventRegistry::add_shared`].
    pub fn add_shared_event(&mut self, name: &str, callback: EventCallback) -> Event {
        self.events.add_shared(name, callback)
    }

    /// A handle to the event `name`, if it has subscribers.
    pub fn get_event(&self, name: &str) -> Option<Event> {
        self.events.get(name)
    }

    /// Whether the event `name` exists.
    pub fn has_event(&self, name: &str) -> bool {
        self.events.has(name)
    }

    /// Fire `name`. Unknown names are ignored.
    pub fn invoke_event(&self, name: &str, payload: &dyn Any) {
        self.events.invoke(name, payload);
    }

    /// See [`EventRegistry::remove`].
    pub fn remove_event(&mut self, name: &str) -> Option<Event> {
        self.events.remove(name)
    }

    /// All events of this entity.
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }
}

impl PropertyContainer for Entity {
    fn with_properties<R>(&self, f: impl FnOnce(&PropertyStore) -> R) -> R {
        f(&self.properties)
    }

    fn with_properties_mut<R>(&mut self, f: impl FnOnce(&mut PropertyStore) -> R) -> R {
        f(&mut self.properties)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("components", &self.component_order)
            .field("events", &self.events.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::math::Vector3;

    struct Counter {
        name: String,
        owner: EntityId,
        hits: u32,
    }

    impl Component for Counter {
        fn name(&self) -> &str {
            &self.name
        }
        fn owner(&self) -> EntityId {
            self.owner
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn factory() -> ComponentFactory {
        let mut factory = ComponentFactory::new();
        factory.register_component_type("Counter", |entity: &mut Entity, name: &str| {
            entity.add_property("Hits", 0_u32).unwrap();
            Counter {
                name: name.to_string(),
                owner: entity.id(),
                hits: 0,
            }
        });
        factory
    }

    #[test]
    fn add_component_returns_existing_by_name() {
        let factory = factory();
        let mut entity = Entity::new("Crate");
        let first = entity.add_component(&factory, "Counter", None).unwrap();
        let again = entity.add_component(&factory, "Counter", None).unwrap();
        assert!(Rc::ptr_eq(&first, &again));

        entity.add_component(&factory, "Counter", Some("Other")).unwrap();
        assert_eq!(entity.component_names().collect::<Vec<_>>(), vec!["Counter", "Other"]);
    }

    #[test]
    fn constructor_may_add_properties() {
        let factory = factory();
        let mut entity = Entity::new("Crate");
        entity.add_component(&factory, "Counter", None).unwrap();
        assert!(entity.has_property::<u32>("Hits"));
    }

    #[test]
    fn unknown_type_leaves_entity_untouched() {
        let mut entity = Entity::new("Crate");
        assert!(entity.add_component(&ComponentFactory::new(), "Nope", None).is_err());
        assert!(!entity.has_component("Nope"));
    }

    #[test]
    fn typed_component_access() {
        let factory = factory();
        let mut entity = Entity::new("Crate");
        entity.add_component(&factory, "Counter", None).unwrap();

        entity.component_mut::<Counter>("Counter").unwrap().hits += 2;
        assert_eq!(entity.component::<Counter>("Counter").unwrap().hits, 2);
        assert_eq!(entity.component::<Counter>("Counter").unwrap().owner, entity.id());
    }

    #[test]
    fn remove_component_detaches() {
        let factory = factory();
        let mut entity = Entity::new("Crate");
        let handle = entity.add_component(&factory, "Counter", None).unwrap();
        let weak = Rc::downgrade(&handle);
        drop(handle);

        assert!(entity.remove_component("Counter").is_some());
        assert!(weak.upgrade().is_none());
        assert_eq!(entity.components().count(), 0);
    }

    #[test]
    fn namespaces_are_independent() {
        let factory = factory();
        let mut entity = Entity::new("Crate");
        entity.add_property("Counter", Vector3::ZERO).unwrap();
        entity.add_component(&factory, "Counter", None).unwrap();
        let fired = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&fired);
        entity.add_event("Counter", move |_| *sink.borrow_mut() = true);

        assert!(entity.has_property::<Vector3>("Counter"));
        assert!(entity.has_component("Counter"));
        entity.invoke_event("Counter", &());
        assert!(*fired.borrow());

        entity.remove_event("Counter");
        assert!(entity.has_component("Counter"));
        assert!(entity.has_property::<Vector3>("Counter"));
    }

    #[test]
    fn entity_id_display_is_short() {
        assert_eq!(EntityId::new().to_string().len(), 8);
    }
}
