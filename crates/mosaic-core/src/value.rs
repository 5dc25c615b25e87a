//! Parsing typed property values out of definition nodes.

use crate::node::Node;

/// Types that can be read from a property node's payload.
///
/// An empty payload yields the type's default value, so
/// `<property name="Hp" type="int"/>` declares `Hp = 0`.
pub trait FromNode: Sized {
    /// Parse a value, returning a human-readable reason on failure.
    fn from_node(node: &Node) -> Result<Self, String>;
}

macro_rules! from_str_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromNode for $ty {
                fn from_node(node: &Node) -> Result<Self, String> {
                    match node.payload() {
                        None => Ok(<$ty>::default()),
                        Some(text) => text
                            .parse::<$ty>()
                            .map_err(|e| format!("cannot parse {text:?}: {e}")),
                    }
                }
            }
        )*
    };
}

from_str_payload!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl FromNode for bool {
    fn from_node(node: &Node) -> Result<Self, String> {
        let Some(text) = node.payload() else {
            return Ok(false);
        };
        match text.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(format!("cannot parse {text:?} as a boolean")),
        }
    }
}

impl FromNode for String {
    fn from_node(node: &Node) -> Result<Self, String> {
        Ok(node.payload().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(text: &str) -> Node {
        Node::new("property").with_text(text)
    }

    #[test]
    fn integers_and_floats() {
        assert_eq!(i32::from_node(&prop("-12")), Ok(-12));
        assert_eq!(f32::from_node(&prop(" 2.5 ")), Ok(2.5));
        assert_eq!(u8::from_node(&prop("255")), Ok(255));
    }

    #[test]
    fn empty_payload_is_default() {
        let empty = Node::new("property");
        assert_eq!(i64::from_node(&empty), Ok(0));
        assert_eq!(String::from_node(&empty), Ok(String::new()));
        assert_eq!(bool::from_node(&empty), Ok(false));
    }

    #[test]
    fn bool_accepts_common_spellings() {
        assert_eq!(bool::from_node(&prop("True")), Ok(true));
        assert_eq!(bool::from_node(&prop("0")), Ok(false));
        assert!(bool::from_node(&prop("maybe")).is_err());
    }

    #[test]
    fn bad_number_reports_input() {
        let err = i32::from_node(&prop("twelve")).unwrap_err();
        assert!(err.contains("\"twelve\""), "{err}");
    }
}
