use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{Capability, Component, ComponentHandle, implements, into_handle};
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};

/// Builds a component for an entity under a given name.
pub type ComponentConstructor = Rc<dyn Fn(&mut Entity, &str) -> ComponentHandle>;

/// Observer notified after a component with some capability is created.
pub type CreatedCallback = Rc<dyn Fn(&ComponentHandle)>;

/// Constructs components by type name and tells capability observers about
/// every component it creates.
#[derive(Default)]
pub struct ComponentFactory {
    constructors: HashMap<String, ComponentConstructor>,
    /// Kept in first-registration order of the capability.
    created: Vec<(Capability, Vec<CreatedCallback>)>,
}

impl ComponentFactory {
    /// A factory with no component types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. The first registration of a type name wins;
    /// returns `false` if `type_name` was already taken.
    pub fn register_component_type<C, F>(&mut self, type_name: &str, ctor: F) -> bool
    where
        C: Component,
        F: Fn(&mut Entity, &str) -> C + 'static,
    {
        if self.constructors.contains_key(type_name) {
            log::debug!("component type {type_name} already registered, keeping the first");
            return false;
        }
        self.replace_component_type(type_name, ctor);
        true
    }

    /// Register a constructor, replacing any existing one.
    pub fn replace_component_type<C, F>(&mut self, type_name: &str, ctor: F)
    where
        C: Component,
        F: Fn(&mut Entity, &str) -> C + 'static,
    {
        let ctor: ComponentConstructor =
            Rc::new(move |entity: &mut Entity, name: &str| into_handle(ctor(entity, name)));
        self.constructors.insert(type_name.to_string(), ctor);
    }

    /// Whether a constructor is registered for `type_name`.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn component_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Call `callback` for every component created from now on that exposes
    /// `capability`.
    pub fn register_created_callback(
        &mut self,
        capability: Capability,
        callback: impl Fn(&ComponentHandle) + 'static,
    ) {
        let callback: CreatedCallback = Rc::new(callback);
        match self.created.iter_mut().find(|(c, _)| *c == capability) {
            Some((_, callbacks)) => callbacks.push(callback),
            None => self.created.push((capability, vec![callback])),
        }
    }

    /// Construct a component of `type_name` for `entity`, named `name` or
    /// the type name, then notify capability observers.
    ///
    /// The component is not attached to the entity; use
    /// [`Entity::add_component`] for that.
    pub fn create(
        &self,
        entity: &mut Entity,
        type_name: &str,
        name: Option<&str>,
    ) -> CoreResult<ComponentHandle> {
        let Some(ctor) = self.constructors.get(type_name) else {
            log::warn!("{}: unknown component type {type_name}", entity.name());
            return Err(CoreError::UnknownComponentType(type_name.to_string()));
        };
        let name = name.filter(|n| !n.is_empty()).unwrap_or(type_name);
        let handle = ctor(entity, name);
        self.broadcast(&handle);
        Ok(handle)
    }

    fn broadcast(&self, handle: &ComponentHandle) {
        // Decide on matches first: observers may borrow the component.
        let matching: Vec<&(Capability, Vec<CreatedCallback>)> = {
            let mut component = handle.borrow_mut();
            self.created
                .iter()
                .filter(|(capability, _)| implements(&mut *component, capability))
                .collect()
        };
        for (capability, callbacks) in matching {
            log::trace!("broadcasting {capability} component to {} observers", callbacks.len());
            for callback in callbacks {
                callback(handle);
            }
        }
    }
}
