//! The template library: named entity and set definitions, and production
//! of live entities from them.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use mosaic_core::{CoreError, CoreResult, Entity, Node, Registry};

use crate::error::{TemplateError, TemplateKind, TemplateResult};
use crate::template::{EntityDefinition, SetDefinition};
use crate::zip::{zip_entity, zip_set};

/// Which kind of entity member a [`ProductionIssue`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A `<property>` node.
    Property,
    /// A `<component>` node.
    Component,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property => write!(f, "property"),
            Self::Component => write!(f, "component"),
        }
    }
}

/// A property or component node that was skipped (or only partly applied)
/// while producing an entity. Production carries on past these.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionIssue {
    /// Name of the entity being produced.
    pub entity: String,
    /// Name of the property or component.
    pub member: String,
    /// Property or component.
    pub kind: MemberKind,
    /// Why it was skipped.
    pub error: CoreError,
}

impl fmt::Display for ProductionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}: {}", self.entity, self.kind, self.member, self.error)
    }
}

/// What [`TemplateLibrary::produce`] built.
#[derive(Debug)]
pub enum Produced {
    /// An entity template was produced.
    Entity(Entity),
    /// A set template was produced, in set order.
    Set(Vec<Entity>),
}

impl Produced {
    /// The produced entities, one for an entity template.
    pub fn into_entities(self) -> Vec<Entity> {
        match self {
            Self::Entity(entity) => vec![entity],
            Self::Set(entities) => entities,
        }
    }
}

/// Entity and set templates by name. Both maps are append-only; names are
/// listed in registration order.
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    entities: HashMap<String, EntityDefinition>,
    sets: HashMap<String, SetDefinition>,
    entity_order: Vec<String>,
    set_order: Vec<String>,
}

impl TemplateLibrary {
    /// An empty library.
    pub fn new() -> Self {
        Self::default()
    }

    // -- parsing ----------------------------------------------------------

    /// Register every template under `node`, stopping at the first error.
    ///
    /// `project` nodes recurse, `entity` and `set` nodes are parsed and
    /// registered, anything else is ignored.
    pub fn parse(&mut self, node: &Node) -> TemplateResult<()> {
        if node.is("project") {
            for child in node.children() {
                self.parse(child)?;
            }
        } else if node.is("entity") {
            let def = self.parse_entity(node)?;
            self.register_entity(def, node)?;
        } else if node.is("set") {
            let def = self.parse_set(node)?;
            self.register_set(def, node)?;
        } else {
            log::debug!("ignoring top-level <{}>", node.tag());
        }
        Ok(())
    }

    /// Like [`parse`](Self::parse) but keeps going: a failing definition is
    /// skipped and its error collected.
    pub fn parse_lenient(&mut self, node: &Node) -> Vec<TemplateError> {
        if node.is("project") {
            return node
                .children()
                .iter()
                .flat_map(|child| self.parse_lenient(child))
                .collect();
        }
        match self.parse(node) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err],
        }
    }

    /// Build an entity definition from `node`. A `base` naming a known
    /// entity template makes this an inheritance zip.
    pub fn parse_entity(&self, node: &Node) -> TemplateResult<EntityDefinition> {
        match node.attr("base") {
            Some(base) => match self.entities.get(base) {
                Some(def) => zip_entity(def, Some(node)),
                None => {
                    log::warn!(
                        "entity {}: base {base} is not defined (yet), building from scratch",
                        node.name().unwrap_or("?")
                    );
                    EntityDefinition::from_node(node)
                }
            },
            None => EntityDefinition::from_node(node),
        }
    }

    /// Build a set definition from `node`, inheriting from a known set
    /// named by `base`.
    pub fn parse_set(&self, node: &Node) -> TemplateResult<SetDefinition> {
        match node.attr("base") {
            Some(base) => match self.sets.get(base) {
                Some(def) => zip_set(def, Some(node)),
                None => {
                    log::warn!(
                        "set {}: base {base} is not defined (yet), building from scratch",
                        node.name().unwrap_or("?")
                    );
                    SetDefinition::from_node(node)
                }
            },
            None => SetDefinition::from_node(node),
        }
    }

    /// Register `def`. `origin` is the node it came from, for error spans.
    pub fn register_entity(&mut self, def: EntityDefinition, origin: &Node) -> TemplateResult<()> {
        if self.entities.contains_key(&def.name) {
            return Err(TemplateError::DuplicateTemplate {
                kind: TemplateKind::Entity,
                name: def.name,
                span: origin.span(),
            });
        }
        log::debug!("registered entity template {}", def.name);
        self.entity_order.push(def.name.clone());
        self.entities.insert(def.name.clone(), def);
        Ok(())
    }

    /// Register a set template. Names must be unique among sets.
    pub fn register_set(&mut self, def: SetDefinition, origin: &Node) -> TemplateResult<()> {
        if self.sets.contains_key(&def.name) {
            return Err(TemplateError::DuplicateTemplate {
                kind: TemplateKind::Set,
                name: def.name,
                span: origin.span(),
            });
        }
        log::debug!("registered set template {} ({} entities)", def.name, def.entities.len());
        self.set_order.push(def.name.clone());
        self.sets.insert(def.name.clone(), def);
        Ok(())
    }

    // -- lookup -----------------------------------------------------------

    /// The entity template `name`.
    pub fn entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.get(name)
    }

    /// The set template `name`.
    pub fn set(&self, name: &str) -> Option<&SetDefinition> {
        self.sets.get(name)
    }

    /// Entity template names in registration order.
    pub fn entity_names(&self) -> &[String] {
        &self.entity_order
    }

    /// Set template names in registration order.
    pub fn set_names(&self) -> &[String] {
        &self.set_order
    }

    /// Whether no templates are registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.sets.is_empty()
    }

    /// The definition `produce_entity` would build from.
    pub fn resolve_entity(
        &self,
        name: &str,
        customization: Option<&Node>,
    ) -> TemplateResult<EntityDefinition> {
        let base = self
            .entities
            .get(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;
        zip_entity(base, customization)
    }

    /// The definition `produce_set` would build from.
    pub fn resolve_set(
        &self,
        name: &str,
        customization: Option<&Node>,
    ) -> TemplateResult<SetDefinition> {
        let base = self
            .sets
            .get(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;
        zip_set(base, customization)
    }

    /// Every problem that would make a set fail to produce.
    pub fn validate(&self) -> Vec<TemplateError> {
        self.set_order
            .iter()
            .filter_map(|name| self.sets.get(name))
            .flat_map(|set| set.entities.iter().map(move |r| (set, r)))
            .filter_map(|(set, reference)| self.reference_base(set, reference).err())
            .collect()
    }

    fn reference_base(
        &self,
        set: &SetDefinition,
        reference: &Node,
    ) -> TemplateResult<&EntityDefinition> {
        let Some(base) = reference.attr("base") else {
            return Err(TemplateError::MalformedCustomization {
                template: set.name.clone(),
                path: match reference.name() {
                    Some(name) => format!("set[{}]/{}[{name}]", set.name, reference.tag()),
                    None => format!("set[{}]/{}", set.name, reference.tag()),
                },
                reason: "entity reference has no base attribute".to_string(),
                span: reference.span(),
            });
        };
        self.entities
            .get(base)
            .ok_or_else(|| TemplateError::UnresolvedSetReference {
                set: set.name.clone(),
                reference: base.to_string(),
            })
    }

    // -- production -------------------------------------------------------

    /// Produce a live entity from the entity template `name`.
    ///
    /// Property and component nodes that fail are skipped and logged; use
    /// [`produce_entity_with_issues`](Self::produce_entity_with_issues) to
    /// inspect them.
    pub fn produce_entity(
        &self,
        registry: &Registry,
        name: &str,
        customization: Option<&Node>,
    ) -> TemplateResult<Entity> {
        self.produce_entity_with_issues(registry, name, customization)
            .map(|(entity, _)| entity)
    }

    /// Like [`produce_entity`](Self::produce_entity), also returning what was skipped.
    pub fn produce_entity_with_issues(
        &self,
        registry: &Registry,
        name: &str,
        customization: Option<&Node>,
    ) -> TemplateResult<(Entity, Vec<ProductionIssue>)> {
        let def = self.resolve_entity(name, customization)?;
        Ok(build_entity(registry, &def))
    }

    /// Produce every entity of the set template `name`, in order.
    ///
    /// All references are resolved before anything is built, so an unknown
    /// base fails the whole set.
    pub fn produce_set(
        &self,
        registry: &Registry,
        name: &str,
        customization: Option<&Node>,
    ) -> TemplateResult<Vec<Entity>> {
        self.produce_set_with_issues(registry, name, customization)
            .map(|(entities, _)| entities)
    }

    /// Like [`produce_set`](Self::produce_set), also returning what was skipped.
    pub fn produce_set_with_issues(
        &self,
        registry: &Registry,
        name: &str,
        customization: Option<&Node>,
    ) -> TemplateResult<(Vec<Entity>, Vec<ProductionIssue>)> {
        let set = self.resolve_set(name, customization)?;
        let resolved = set
            .entities
            .iter()
            .map(|reference| Ok((self.reference_base(&set, reference)?, reference)))
            .collect::<TemplateResult<Vec<(&EntityDefinition, &Rc<Node>)>>>()?;

        let mut entities = Vec::with_capacity(resolved.len());
        let mut issues = Vec::new();
        for (base, reference) in resolved {
            let def = zip_entity(base, Some(reference))?;
            let (entity, found) = build_entity(registry, &def);
            entities.push(entity);
            issues.extend(found);
        }
        log::debug!("produced set {} ({} entities)", set.name, entities.len());
        Ok((entities, issues))
    }

    /// Produce an entity template, or failing that a set template.
    pub fn produce(&self, registry: &Registry, name: &str) -> TemplateResult<Produced> {
        if self.entities.contains_key(name) {
            self.produce_entity(registry, name, None).map(Produced::Entity)
        } else if self.sets.contains_key(name) {
            self.produce_set(registry, name, None).map(Produced::Set)
        } else {
            Err(TemplateError::UnknownTemplate(name.to_string()))
        }
    }
}

fn build_entity(registry: &Registry, def: &EntityDefinition) -> (Entity, Vec<ProductionIssue>) {
    let mut entity = Entity::new(def.name.as_str());
    let mut issues = Vec::new();

    for node in &def.properties {
        if let Err(error) = build_property(registry, &mut entity, node) {
            issues.push(issue(&entity, node, MemberKind::Property, error));
        }
    }
    for node in &def.components {
        if let Err(error) = build_component(registry, &mut entity, node) {
            issues.push(issue(&entity, node, MemberKind::Component, error));
        }
    }
    log::trace!(
        "produced {} ({} properties, {} components)",
        entity.name(),
        entity.properties().len(),
        entity.component_names().count()
    );
    (entity, issues)
}

fn issue(entity: &Entity, node: &Node, kind: MemberKind, error: CoreError) -> ProductionIssue {
    let member = node
        .name()
        .or_else(|| node.attr("type"))
        .unwrap_or("<unnamed>")
        .to_string();
    log::warn!("{}: skipped {kind} {member}: {error}", entity.name());
    ProductionIssue {
        entity: entity.name().to_string(),
        member,
        kind,
        error,
    }
}

fn build_property(registry: &Registry, entity: &mut Entity, node: &Node) -> CoreResult<()> {
    let name = node.name().unwrap_or_default();
    let Some(type_name) = node.attr("type") else {
        return Err(CoreError::InvalidPropertyValue {
            name: name.to_string(),
            type_name: String::new(),
            reason: "missing type attribute".to_string(),
        });
    };
    if name.is_empty() {
        return Err(CoreError::InvalidPropertyValue {
            name: String::new(),
            type_name: type_name.to_string(),
            reason: "missing name attribute".to_string(),
        });
    }

    let cell = registry.property_types().build(type_name, node)?;
    let store = entity.properties_mut();
    if let Some(existing) = store.get_erased(name) {
        if existing.value_type() != cell.value_type() {
            return Err(CoreError::TypeConflict {
                owner: store.owner().to_string(),
                name: name.to_string(),
                existing: existing.value_type_name(),
                requested: cell.value_type_name(),
            });
        }
        log::debug!("{}: property {name} defined twice, keeping the first", store.owner());
        return Ok(());
    }
    store.insert_erased(name, cell, false);
    Ok(())
}

fn build_component(registry: &Registry, entity: &mut Entity, node: &Node) -> CoreResult<()> {
    let Some(type_name) = node.attr("type") else {
        return Err(CoreError::ComponentParse {
            component: node.name().unwrap_or_default().to_string(),
            reason: "missing type attribute".to_string(),
        });
    };
    let handle = entity.add_component(registry.factory(), type_name, node.name())?;
    handle.borrow_mut().parse(node, entity)
}
