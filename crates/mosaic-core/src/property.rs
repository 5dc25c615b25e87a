//! Typed, observable property cells and the name-keyed store that holds them.
//!
//! A [`Property<T>`] is a shared handle: every clone refers to the same cell,
//! so a component can keep the handle it got from [`PropertyStore::add`] and
//! see writes made through any other clone.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{CoreError, CoreResult};

/// Any value that can live in a property cell.
pub trait PropertyValue: Clone + fmt::Debug + 'static {}

impl<T: Clone + fmt::Debug + 'static> PropertyValue for T {}

type Subscriber<T> = Rc<dyn Fn(&T, &T)>;

struct Cell<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

/// A named typed value with change notification.
pub struct Property<T> {
    inner: Rc<Cell<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PropertyValue> Property<T> {
    /// Create a detached cell. Cells normally come from [`PropertyStore::add`].
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Cell {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Store a new value.
    ///
    /// Every subscriber is called with `(old, new)` in subscription order,
    /// including when the value is unchanged. Subscribers run before the
    /// value is stored, so reading the property inside a subscriber yields
    /// the old value.
    pub fn set(&self, value: T) {
        let old = self.get();
        let subscribers: Vec<Subscriber<T>> = self.inner.subscribers.borrow().clone();
        for subscriber in &subscribers {
            subscriber(&old, &value);
        }
        *self.inner.value.borrow_mut() = value;
    }

    /// Compute a new value from the current one and [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    /// Call `f(old, new)` on every subsequent write.
    pub fn subscribe(&self, f: impl Fn(&T, &T) + 'static) {
        self.inner.subscribers.borrow_mut().push(Rc::new(f));
    }

    /// Number of change subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: PropertyValue> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

/// Type-erased view of a [`Property<T>`].
pub trait AnyProperty {
    /// `TypeId` of the stored value type.
    fn value_type(&self) -> TypeId;
    /// Readable name of the stored value type.
    fn value_type_name(&self) -> &'static str;
    /// `Debug` rendering of the current value.
    fn debug_value(&self) -> String;
    /// Downcast hook; the concrete type is `Property<T>`.
    fn as_any(&self) -> &dyn Any;
    /// Another handle to the same cell.
    fn clone_box(&self) -> Box<dyn AnyProperty>;
}

impl<T: PropertyValue> AnyProperty for Property<T> {
    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn debug_value(&self) -> String {
        format!("{:?}", *self.inner.value.borrow())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn AnyProperty> {
        Box::new(self.clone())
    }
}

impl fmt::Debug for dyn AnyProperty + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.value_type_name(), self.debug_value())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Name → property cell map. Lookups are paired with the expected type; a
/// name bound to another type reads as absent.
pub struct PropertyStore {
    owner: String,
    cells: HashMap<String, Box<dyn AnyProperty>>,
}

impl PropertyStore {
    /// Create an empty store. `owner` labels errors (an entity name or `globals`).
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            cells: HashMap::new(),
        }
    }

    /// Label used in errors and logs.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Add a property, or return the existing cell if `name` is already bound
    /// to a `T`. The existing value is kept; `default` is dropped.
    pub fn add<T: PropertyValue>(&mut self, name: &str, default: T) -> CoreResult<Property<T>> {
        if let Some(existing) = self.cells.get(name) {
            return existing
                .as_any()
                .downcast_ref::<Property<T>>()
                .cloned()
                .ok_or_else(|| CoreError::TypeConflict {
                    owner: self.owner.clone(),
                    name: name.to_string(),
                    existing: existing.value_type_name(),
                    requested: type_name::<T>(),
                });
        }
        let cell = Property::new(default);
        self.cells.insert(name.to_string(), Box::new(cell.clone()));
        log::trace!("{}: added property {name}: {}", self.owner, type_name::<T>());
        Ok(cell)
    }

    /// The cell `name` if it holds a `T`.
    pub fn get<T: PropertyValue>(&self, name: &str) -> Option<Property<T>> {
        self.cells
            .get(name)?
            .as_any()
            .downcast_ref::<Property<T>>()
            .cloned()
    }

    /// Whether `name` is bound to a `T`.
    pub fn has<T: PropertyValue>(&self, name: &str) -> bool {
        self.cells
            .get(name)
            .is_some_and(|c| c.value_type() == TypeId::of::<T>())
    }

    /// Remove `name` if it is bound to a `T`; otherwise leave the store alone.
    pub fn remove<T: PropertyValue>(&mut self, name: &str) -> Option<Property<T>> {
        if !self.has::<T>(name) {
            return None;
        }
        let cell = self.get::<T>(name);
        self.cells.remove(name);
        cell
    }

    /// Insert an already-built cell. Returns whether it was inserted: an
    /// occupied name is kept unless `overwrite` is set.
    pub fn insert_erased(
        &mut self,
        name: &str,
        cell: Box<dyn AnyProperty>,
        overwrite: bool,
    ) -> bool {
        if !overwrite && self.cells.contains_key(name) {
            return false;
        }
        self.cells.insert(name.to_string(), cell);
        true
    }

    /// The cell `name`, type-erased.
    pub fn get_erased(&self, name: &str) -> Option<&dyn AnyProperty> {
        self.cells.get(name).map(Box::as_ref)
    }

    /// Whether `name` is bound, regardless of type.
    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    /// Remove `name` regardless of its type.
    pub fn remove_erased(&mut self, name: &str) -> Option<Box<dyn AnyProperty>> {
        self.cells.remove(name)
    }

    /// Property names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cells.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Cells sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn AnyProperty)> {
        self.names()
            .into_iter()
            .filter_map(|name| self.get_erased(name).map(|cell| (name, cell)))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Shared property surface of [`Entity`](crate::Entity) and
/// [`GlobalProperties`](crate::GlobalProperties).
pub trait PropertyContainer {
    /// Run `f` against the underlying store.
    fn with_properties<R>(&self, f: impl FnOnce(&PropertyStore) -> R) -> R;

    /// Run `f` against the underlying store mutably.
    fn with_properties_mut<R>(&mut self, f: impl FnOnce(&mut PropertyStore) -> R) -> R;

    /// See [`PropertyStore::add`].
    fn add_property<T: PropertyValue>(&mut self, name: &str, default: T) -> CoreResult<Property<T>> {
        self.with_properties_mut(|store| store.add(name, default))
    }

    /// See [`PropertyStore::get`].
    fn get_property<T: PropertyValue>(&self, name: &str) -> Option<Property<T>> {
        self.with_properties(|store| store.get(name))
    }

    /// See [`PropertyStore::has`].
    fn has_property<T: PropertyValue>(&self, name: &str) -> bool {
        self.with_properties(|store| store.has::<T>(name))
    }

    /// See [`PropertyStore::remove`].
    fn remove_property<T: PropertyValue>(&mut self, name: &str) -> Option<Property<T>> {
        self.with_properties_mut(|store| store.remove(name))
    }
}
