//! The zip merge: applying a customization diff to a template.
//!
//! Each child of a customization node carries a `mod` attribute:
//!
//! - `add` appends a copy of the child, minus its `mod` marker.
//! - `remove` deletes every entry whose `name` equals the child's `name`.
//! - `modify` zips every entry with a matching `name` against the child,
//!   recursively, keeping the entry's own tag and attributes.
//!
//! A child without `mod` replaces: at node level every same-tag child, at
//! entity level every same-named entry of its list. `mod` values are
//! case-insensitive; entries without a `name` never match.
//!
//! Zipping never mutates its inputs. Results share untouched subtrees with
//! the base through `Rc`.

use std::rc::Rc;

use mosaic_core::Node;

use crate::error::{TemplateError, TemplateResult};
use crate::template::{EntityDefinition, SetDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mod {
    Add,
    Remove,
    Modify,
}

/// Where in a customization we are, for error messages.
struct Context<'a> {
    template: &'a str,
    path: String,
}

impl<'a> Context<'a> {
    fn root(template: &'a str, customization: &Node) -> Self {
        Self {
            template,
            path: describe(customization),
        }
    }

    fn child(&self, node: &Node) -> Self {
        Self {
            template: self.template,
            path: format!("{}/{}", self.path, describe(node)),
        }
    }

    fn error(&self, node: &Node, reason: impl Into<String>) -> TemplateError {
        TemplateError::MalformedCustomization {
            template: self.template.to_string(),
            path: self.path.clone(),
            reason: reason.into(),
            span: node.span(),
        }
    }

    fn mod_of(&self, node: &Node) -> TemplateResult<Option<Mod>> {
        let Some(value) = node.attr("mod") else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "add" => Ok(Some(Mod::Add)),
            "remove" => Ok(Some(Mod::Remove)),
            "modify" => Ok(Some(Mod::Modify)),
            _ => Err(self.error(node, format!("unknown mod \"{value}\""))),
        }
    }

    fn name_of<'n>(&self, node: &'n Node, action: &str) -> TemplateResult<&'n str> {
        node.name()
            .ok_or_else(|| self.error(node, format!("mod=\"{action}\" needs a name attribute")))
    }
}

/// `tag` or `tag[name]`.
fn describe(node: &Node) -> String {
    match node.name() {
        Some(name) => format!("{}[{name}]", node.tag()),
        None => node.tag().to_string(),
    }
}

/// Name for a zipped entity whose customization gave none. Unique only with
/// high probability.
fn synthesize_name(base: &str) -> String {
    format!("Nameless {base}{}", rand::random::<u32>())
}

/// Apply an entity-level customization to `base`.
///
/// `None` yields an equal copy. Otherwise the result is named after the
/// customization's `name`, or a synthesized name if it has none. Children
/// tagged `property` or `component` edit the matching list; other children
/// are ignored.
pub fn zip_entity(
    base: &EntityDefinition,
    customization: Option<&Node>,
) -> TemplateResult<EntityDefinition> {
    let mut result = base.clone();
    let Some(customization) = customization else {
        return Ok(result);
    };

    result.name = match customization.name() {
        Some(name) => name.to_string(),
        None => synthesize_name(&base.name),
    };
    log::trace!("zipping entity {} into {}", base.name, result.name);

    let root = Context::root(&base.name, customization);
    for child in customization.children() {
        let ctx = root.child(child);
        let list = if child.is("property") {
            &mut result.properties
        } else if child.is("component") {
            &mut result.components
        } else {
            log::debug!("{}: ignoring <{}> in customization", ctx.path, child.tag());
            continue;
        };
        apply_to_list(list, child, &ctx, ReplaceBy::Name)?;
    }
    Ok(result)
}

/// Apply a set-level customization to `base`.
///
/// Only `entity` children with a `mod` are considered; added references
/// are stored verbatim. The result takes the customization's `name` if it
/// has one.
pub fn zip_set(base: &SetDefinition, customization: Option<&Node>) -> TemplateResult<SetDefinition> {
    let mut result = base.clone();
    let Some(customization) = customization else {
        return Ok(result);
    };
    if let Some(name) = customization.name() {
        result.name = name.to_string();
    }

    let root = Context::root(&base.name, customization);
    for child in customization.children() {
        if !child.is("entity") || !child.has_attr("mod") {
            log::debug!("set {}: ignoring <{}> without mod", base.name, child.tag());
            continue;
        }
        let ctx = root.child(child);
        match ctx.mod_of(child)? {
            Some(Mod::Add) => {
                result.entities.push(Rc::new(child.as_ref().clone().without_attr("mod")))
            }
            Some(Mod::Remove) => {
                let name = ctx.name_of(child, "remove")?;
                result.entities.retain(|e| e.name() != Some(name));
            }
            Some(Mod::Modify) => {
                let name = ctx.name_of(child, "modify")?;
                modify_matching(&mut result.entities, name, child, &ctx)?;
            }
            None => {}
        }
    }
    Ok(result)
}

/// Apply a customization to a generic node.
///
/// The result keeps `node`'s tag and attributes. Children are edited by the
/// customization's children; a non-blank customization text replaces the
/// node's text.
pub fn zip_node(node: &Node, customization: &Node) -> TemplateResult<Node> {
    let template = node.name().unwrap_or(node.tag());
    zip_node_in(node, customization, &Context::root(template, node))
}

fn zip_node_in(node: &Node, customization: &Node, ctx: &Context<'_>) -> TemplateResult<Node> {
    let mut result = node.clone();
    for child in customization.children() {
        apply_to_list(result.children_mut(), child, &ctx.child(child), ReplaceBy::Tag)?;
    }
    if let Some(text) = customization.text().filter(|t| !t.trim().is_empty()) {
        result.set_text(Some(text.to_string()));
    }
    Ok(result)
}

/// What a child without `mod` replaces.
#[derive(Clone, Copy)]
enum ReplaceBy {
    /// Every entry with the same tag.
    Tag,
    /// Every entry with the same name; unnamed children are appended.
    Name,
}

fn apply_to_list(
    list: &mut Vec<Rc<Node>>,
    child: &Rc<Node>,
    ctx: &Context<'_>,
    replace: ReplaceBy,
) -> TemplateResult<()> {
    match ctx.mod_of(child)? {
        Some(Mod::Add) => list.push(Rc::new(child.as_ref().clone().without_attr("mod"))),
        Some(Mod::Remove) => {
            let name = ctx.name_of(child, "remove")?;
            list.retain(|entry| entry.name() != Some(name));
        }
        Some(Mod::Modify) => {
            let name = ctx.name_of(child, "modify")?;
            modify_matching(list, name, child, ctx)?;
        }
        None => {
            match replace {
                ReplaceBy::Tag => list.retain(|entry| entry.tag() != child.tag()),
                ReplaceBy::Name => {
                    if let Some(name) = child.name() {
                        list.retain(|entry| entry.name() != Some(name));
                    }
                }
            }
            list.push(Rc::clone(child));
        }
    }
    Ok(())
}

fn modify_matching(
    list: &mut [Rc<Node>],
    name: &str,
    customization: &Node,
    ctx: &Context<'_>,
) -> TemplateResult<()> {
    for entry in list.iter_mut().filter(|e| e.name() == Some(name)) {
        let zipped = zip_node_in(entry.as_ref(), customization, ctx)?;
        *entry = Rc::new(zipped);
    }
    Ok(())
}
