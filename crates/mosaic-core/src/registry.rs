use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{CoreError, CoreResult};
use crate::factory::ComponentFactory;
use crate::global::GlobalProperties;
use crate::math::{Vector2, Vector3};
use crate::node::Node;
use crate::property::{AnyProperty, Property, PropertyValue};
use crate::value::FromNode;

/// Builds a property cell from a `property` node.
pub type PropertyBuilder = Rc<dyn Fn(&Node) -> Result<Box<dyn AnyProperty>, String>>;

/// Type name → property builder, used when producing entities from
/// definitions (`<property name="Zoom" type="float">2</property>`).
#[derive(Clone, Default)]
pub struct PropertyTypes {
    builders: HashMap<String, PropertyBuilder>,
}

impl PropertyTypes {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in value types under their common spellings.
    pub fn with_defaults() -> Self {
        let mut types = Self::new();
        types.register::<bool>(&["bool", "Boolean", "System.Boolean"]);
        types.register::<i32>(&["int", "i32", "Int32", "System.Int32"]);
        types.register::<i64>(&["long", "i64", "Int64", "System.Int64"]);
        types.register::<u32>(&["uint", "u32", "UInt32", "System.UInt32"]);
        types.register::<f32>(&["float", "f32", "Single", "System.Single"]);
        types.register::<f64>(&["double", "f64", "Double", "System.Double"]);
        types.register::<String>(&["string", "String", "System.String"]);
        types.register::<Vector2>(&["Vector2", "vec2"]);
        types.register::<Vector3>(&["Vector3", "vec3"]);
        types
    }

    /// Register `T` under every name in `names`, replacing earlier entries.
    pub fn register<T: PropertyValue + FromNode>(&mut self, names: &[&str]) {
        let builder: PropertyBuilder = Rc::new(|node: &Node| {
            T::from_node(node).map(|value| Box::new(Property::new(value)) as Box<dyn AnyProperty>)
        });
        for name in names {
            self.builders.insert((*name).to_string(), Rc::clone(&builder));
        }
    }

    /// Register a custom builder under one name.
    pub fn register_builder(
        &mut self,
        name: &str,
        builder: impl Fn(&Node) -> Result<Box<dyn AnyProperty>, String> + 'static,
    ) {
        self.builders.insert(name.to_string(), Rc::new(builder));
    }

    /// Whether a builder is registered under `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.builders.contains_key(type_name)
    }

    /// Build a cell of `type_name` from the node's payload.
    pub fn build(&self, type_name: &str, node: &Node) -> CoreResult<Box<dyn AnyProperty>> {
        let builder = self
            .builders
            .get(type_name)
            .ok_or_else(|| CoreError::UnknownPropertyType(type_name.to_string()))?;
        builder(node).map_err(|reason| CoreError::InvalidPropertyValue {
            name: node.name().unwrap_or("<unnamed>").to_string(),
            type_name: type_name.to_string(),
            reason,
        })
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PropertyTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_names()).finish()
    }
}

/// Everything entity production needs: the component factory, the property
/// type table and the global property store.
///
/// Build one per application and pass it by reference. The global store is
/// created on first access.
pub struct Registry {
    factory: ComponentFactory,
    property_types: PropertyTypes,
    globals: OnceCell<GlobalProperties>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with the default property types and no component types.
    pub fn new() -> Self {
        Self {
            factory: ComponentFactory::new(),
            property_types: PropertyTypes::with_defaults(),
            globals: OnceCell::new(),
        }
    }

    /// The component factory.
    pub fn factory(&self) -> &ComponentFactory {
        &self.factory
    }

    /// Mutable access to the component factory, for registering types.
    pub fn factory_mut(&mut self) -> &mut ComponentFactory {
        &mut self.factory
    }

    /// The property type table.
    pub fn property_types(&self) -> &PropertyTypes {
        &self.property_types
    }

    /// Mutable access to the property type table.
    pub fn property_types_mut(&mut self) -> &mut PropertyTypes {
        &mut self.property_types
    }

    /// The shared global store.
    pub fn globals(&self) -> &GlobalProperties {
        self.globals.get_or_init(|| {
            log::debug!("creating global property store");
            GlobalProperties::new()
        })
    }

    /// Whether [`globals`](Self::globals) has been called yet.
    pub fn globals_initialized(&self) -> bool {
        self.globals.get().is_some()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("component_types", &self.factory.component_types())
            .field("property_types", &self.property_types)
            .field("globals", &self.globals.get())
            .finish()
    }
}
