use std::fmt;
use std::ops::Range;

use mosaic_core::CoreError;

/// Alias for `Result<T, TemplateError>`.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Which of the two template maps a definition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// An entity template.
    Entity,
    /// A set template.
    Set,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => write!(f, "entity"),
            Self::Set => write!(f, "set"),
        }
    }
}

/// Errors raised while registering, zipping or producing templates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    /// No entity or set template is registered under the name.
    #[error("unknown template: \"{0}\"")]
    UnknownTemplate(String),

    /// A template with the same name is already registered in that map.
    #[error("{kind} template \"{name}\" is already defined")]
    DuplicateTemplate {
        /// The map the name collided in.
        kind: TemplateKind,
        /// The duplicated name.
        name: String,
        /// The second definition.
        span: Range<usize>,
    },

    /// A definition built from scratch has no `name`.
    #[error("{kind} definition has no name and no known base")]
    MissingName {
        /// Entity or set.
        kind: TemplateKind,
        /// The unnamed definition.
        span: Range<usize>,
    },

    /// A customization node that cannot be applied.
    #[error("malformed customization of \"{template}\" at {path}: {reason}")]
    MalformedCustomization {
        /// The template being customized.
        template: String,
        /// Slash-separated tag path to the offending node.
        path: String,
        /// What is wrong with it.
        reason: String,
        /// The offending node.
        span: Range<usize>,
    },

    /// A set entry names an entity template that does not exist.
    #[error("set \"{set}\" references unknown entity template \"{reference}\"")]
    UnresolvedSetReference {
        /// The set holding the reference.
        set: String,
        /// The missing entity template.
        reference: String,
    },

    /// A property or component error from the core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TemplateError {
    /// Source span of the offending node, if the error has one.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Self::DuplicateTemplate { span, .. }
            | Self::MissingName { span, .. }
            | Self::MalformedCustomization { span, .. } => Some(span.clone()),
            _ => None,
        }
    }
}
