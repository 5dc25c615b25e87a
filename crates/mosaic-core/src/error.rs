/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by property stores, the component factory and entities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A property name is already bound to a cell of another type.
    #[error("property \"{name}\" on {owner} is {existing}, cannot add it as {requested}")]
    TypeConflict {
        /// Label of the store that holds the property (entity name or `globals`).
        owner: String,
        /// The conflicting property name.
        name: String,
        /// Type of the cell already stored.
        existing: &'static str,
        /// Type the caller asked for.
        requested: &'static str,
    },

    /// No builder is registered for a property type name.
    #[error("unknown property type: \"{0}\"")]
    UnknownPropertyType(String),

    /// A property node's payload could not be parsed as its declared type.
    #[error("invalid value for property \"{name}\" of type {type_name}: {reason}")]
    InvalidPropertyValue {
        /// The property name.
        name: String,
        /// The declared type name.
        type_name: String,
        /// Parser message.
        reason: String,
    },

    /// No constructor is registered for a component type name.
    #[error("unknown component type: \"{0}\"")]
    UnknownComponentType(String),

    /// A component rejected the node it was configured from.
    #[error("component \"{component}\" rejected its configuration: {reason}")]
    ComponentParse {
        /// The component name.
        component: String,
        /// What was wrong with the node.
        reason: String,
    },
}
