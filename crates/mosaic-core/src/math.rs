//! Small 2D/3D value types used by built-in properties.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::value::FromNode;

/// A 2D vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

/// A 3D vector. In 2D scenes `z` is the parallax layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
    /// Depth, or parallax layer.
    pub z: f32,
}

impl Vector2 {
    /// `(0, 0)`.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Build from components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Vector3 {
    /// `(0, 0, 0)`.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Build from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Drop the z component.
    pub fn xy(self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

macro_rules! vector_ops {
    ($ty:ident { $($f:ident),+ }) => {
        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl Mul<f32> for $ty {
            type Output = Self;
            fn mul(self, rhs: f32) -> Self {
                Self { $($f: self.$f * rhs),+ }
            }
        }

        impl Div<f32> for $ty {
            type Output = Self;
            fn div(self, rhs: f32) -> Self {
                Self { $($f: self.$f / rhs),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }
    };
}

vector_ops!(Vector2 { x, y });
vector_ops!(Vector3 { x, y, z });

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A 2D view transform: `(p + translation) * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Added to the point first.
    pub translation: Vector2,
    /// Multiplier applied after translation.
    pub scale: f32,
    /// Added last, in screen space.
    pub offset: Vector2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Leaves every point where it is.
    pub const IDENTITY: Self = Self {
        translation: Vector2::ZERO,
        scale: 1.0,
        offset: Vector2::ZERO,
    };

    /// Map a point through the transform.
    pub fn apply(&self, point: Vector2) -> Vector2 {
        (point + self.translation) * self.scale + self.offset
    }

    /// Map a transformed point back. A zero scale maps everything to `-translation`.
    pub fn invert(&self, point: Vector2) -> Vector2 {
        if self.scale == 0.0 {
            return -self.translation;
        }
        (point - self.offset) / self.scale - self.translation
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Read `axes.len()` floats from a vector node. Accepts axis elements
/// (`<X>1</X><Y>2</Y>`, directly or under one wrapper element) or a text
/// payload such as `1 2`, `(1, 2)` or `{X:1 Y:2}`. `None` means no payload.
fn components(node: &Node, axes: &[&str]) -> Result<Option<Vec<f32>>, String> {
    let has_axes = |n: &Node| axes.iter().any(|a| n.child(a).is_some());
    let holder = if has_axes(node) {
        Some(node)
    } else {
        node.children()
            .first()
            .map(Rc::as_ref)
            .filter(|c| has_axes(*c))
    };

    if let Some(holder) = holder {
        return axes
            .iter()
            .map(|axis| match holder.child(axis).and_then(Node::payload) {
                None => Ok(0.0),
                Some(text) => parse_axis(text),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some);
    }

    let Some(text) = node.payload() else {
        return Ok(None);
    };
    let parts: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace() || "(){}".contains(c))
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != axes.len() {
        return Err(format!(
            "expected {} components, found {} in {text:?}",
            axes.len(),
            parts.len()
        ));
    }
    parts.into_iter().map(parse_axis).collect::<Result<_, _>>().map(Some)
}

fn parse_axis(text: &str) -> Result<f32, String> {
    // `X:1.5` style labels
    let number = text.rsplit(':').next().unwrap_or(text).trim();
    number
        .parse::<f32>()
        .map_err(|e| format!("cannot parse {text:?}: {e}"))
}

impl FromNode for Vector2 {
    fn from_node(node: &Node) -> Result<Self, String> {
        Ok(match components(node, &["X", "Y"])? {
            Some(c) => Self::new(c[0], c[1]),
            None => Self::default(),
        })
    }
}

impl FromNode for Vector3 {
    fn from_node(node: &Node) -> Result<Self, String> {
        Ok(match components(node, &["X", "Y", "Z"])? {
            Some(c) => Self::new(c[0], c[1], c[2]),
            None => Self::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_from_space_separated_text() {
        let node = Node::new("property").with_text("1 2.5 -3");
        assert_eq!(Vector3::from_node(&node), Ok(Vector3::new(1.0, 2.5, -3.0)));
    }

    #[test]
    fn vector_from_tuple_text() {
        let node = Node::new("property").with_text("(4, 5)");
        assert_eq!(Vector2::from_node(&node), Ok(Vector2::new(4.0, 5.0)));
    }

    #[test]
    fn vector_from_labelled_text() {
        let node = Node::new("property").with_text("{X:640 Y:480}");
        assert_eq!(Vector2::from_node(&node), Ok(Vector2::new(640.0, 480.0)));
    }

    #[test]
    fn vector_from_axis_elements() {
        let direct = Node::new("property")
            .with_child(Node::new("X").with_text("1"))
            .with_child(Node::new("Z").with_text("3"));
        assert_eq!(Vector3::from_node(&direct), Ok(Vector3::new(1.0, 0.0, 3.0)));

        let wrapped = Node::new("property").with_child(
            Node::new("Vector2")
                .with_child(Node::new("X").with_text("7"))
                .with_child(Node::new("Y").with_text("8")),
        );
        assert_eq!(Vector2::from_node(&wrapped), Ok(Vector2::new(7.0, 8.0)));
    }

    #[test]
    fn vector_empty_is_zero() {
        assert_eq!(Vector3::from_node(&Node::new("property")), Ok(Vector3::ZERO));
    }

    #[test]
    fn vector_wrong_arity_is_error() {
        let node = Node::new("property").with_text("1 2");
        let err = Vector3::from_node(&node).unwrap_err();
        assert!(err.contains("expected 3 components"), "{err}");
    }

    #[test]
    fn transform_round_trips_points() {
        let t = Transform {
            translation: Vector2::new(-10.0, 5.0),
            scale: 2.0,
            offset: Vector2::new(320.0, 240.0),
        };
        let p = Vector2::new(3.0, 4.0);
        assert_eq!(t.apply(p), Vector2::new(306.0, 258.0));
        assert_eq!(t.invert(t.apply(p)), p);
    }
}
