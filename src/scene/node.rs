//! Scene node data: kinds, typed properties, and the by-name property schema
//! that compiled instructions address nodes through.
//!
//! Destination names in compiled templates are the snake_case field names
//! (`"x"`, `"scale_x"`, `"font_size"`, ...). Writing a value of the wrong
//! semantic type, or naming a property the node kind does not carry, is a
//! fatal error and leaves the node untouched.

use crate::error::{Result, ScenaError};
use crate::scene::graph::NodeId;

/// An RGBA color. Stored as linear floats, constructed from hex for parity
/// with the usual 0xRRGGBB literals in scene code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// The kind of a scene node, fixed at creation.
///
/// `Container` and `Sprite` hold children; `Text`, `Graphics` and `Marker`
/// are leaves. A `Marker` is the non-visual render location placeholder that
/// template controllers mount dynamic views at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Sprite,
    Text,
    Graphics,
    Marker,
}

impl NodeKind {
    /// Whether nodes of this kind may hold child nodes.
    pub fn supports_children(self) -> bool {
        matches!(self, NodeKind::Container | NodeKind::Sprite)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::Sprite => "sprite",
            NodeKind::Text => "text",
            NodeKind::Graphics => "graphics",
            NodeKind::Marker => "marker",
        }
    }
}

/// A dynamically typed property value moving between view-model state and
/// scene node properties.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Color(Color),
    /// A reference to a scene node, produced by ref bindings.
    Node(NodeId),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::Text(_) => "text",
            PropertyValue::Color(_) => "color",
            PropertyValue::Node(_) => "node",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        PropertyValue::Color(v)
    }
}

/// Text rendering style, present on `Text` nodes only.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: String,
    pub fill: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
            font_weight: "normal".to_string(),
            fill: Color::BLACK,
        }
    }
}

/// A retained scene node. Created through the [`NodeRegistry`] factories or
/// directly for literal text content.
///
/// [`NodeRegistry`]: crate::scene::registry::NodeRegistry
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub alpha: f64,
    pub width: f64,
    pub height: f64,
    pub visible: bool,
    pub interactive: bool,
    pub tint: Color,
    pub text: String,
    pub style: TextStyle,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            width: 0.0,
            height: 0.0,
            visible: true,
            interactive: false,
            tint: Color::WHITE,
            text: String::new(),
            style: TextStyle::default(),
        }
    }

    /// A `Text` node carrying literal content.
    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Text);
        node.text = content.into();
        node
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Read a property by its destination name.
    pub fn get_property(&self, name: &str) -> Result<PropertyValue> {
        let value = match name {
            "x" => PropertyValue::Number(self.x),
            "y" => PropertyValue::Number(self.y),
            "scale_x" => PropertyValue::Number(self.scale_x),
            "scale_y" => PropertyValue::Number(self.scale_y),
            "rotation" => PropertyValue::Number(self.rotation),
            "alpha" => PropertyValue::Number(self.alpha),
            "width" => PropertyValue::Number(self.width),
            "height" => PropertyValue::Number(self.height),
            "visible" => PropertyValue::Bool(self.visible),
            "interactive" => PropertyValue::Bool(self.interactive),
            "tint" => PropertyValue::Color(self.tint),
            "text" if self.kind == NodeKind::Text => PropertyValue::Text(self.text.clone()),
            _ => return Err(self.unknown_property(name)),
        };
        Ok(value)
    }

    /// Write a property by its destination name.
    ///
    /// The value's type must match the property's declared semantic type; a
    /// mismatch fails without mutating the node.
    pub fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        match name {
            "x" => self.x = self.expect_number(name, &value)?,
            "y" => self.y = self.expect_number(name, &value)?,
            "scale_x" => self.scale_x = self.expect_number(name, &value)?,
            "scale_y" => self.scale_y = self.expect_number(name, &value)?,
            "rotation" => self.rotation = self.expect_number(name, &value)?,
            "alpha" => self.alpha = self.expect_number(name, &value)?,
            "width" => self.width = self.expect_number(name, &value)?,
            "height" => self.height = self.expect_number(name, &value)?,
            "visible" => self.visible = self.expect_bool(name, &value)?,
            "interactive" => self.interactive = self.expect_bool(name, &value)?,
            "tint" => self.tint = self.expect_color(name, &value)?,
            "text" if self.kind == NodeKind::Text => {
                self.text = self.expect_text(name, &value)?;
            }
            _ => return Err(self.unknown_property(name)),
        }
        Ok(())
    }

    /// Read a style property (`Text` nodes only).
    pub fn get_style_property(&self, name: &str) -> Result<PropertyValue> {
        if self.kind != NodeKind::Text {
            return Err(self.unknown_property(name));
        }
        let value = match name {
            "font_family" => PropertyValue::Text(self.style.font_family.clone()),
            "font_size" => PropertyValue::Number(self.style.font_size),
            "font_weight" => PropertyValue::Text(self.style.font_weight.clone()),
            "fill" => PropertyValue::Color(self.style.fill),
            _ => return Err(self.unknown_property(name)),
        };
        Ok(value)
    }

    /// Write a style property (`Text` nodes only).
    pub fn set_style_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        if self.kind != NodeKind::Text {
            return Err(self.unknown_property(name));
        }
        match name {
            "font_family" => self.style.font_family = self.expect_text(name, &value)?,
            "font_size" => self.style.font_size = self.expect_number(name, &value)?,
            "font_weight" => self.style.font_weight = self.expect_text(name, &value)?,
            "fill" => self.style.fill = self.expect_color(name, &value)?,
            _ => return Err(self.unknown_property(name)),
        }
        Ok(())
    }

    fn expect_number(&self, name: &str, value: &PropertyValue) -> Result<f64> {
        value.as_number().ok_or_else(|| ScenaError::InvalidValue {
            property: name.to_string(),
            expected: "number",
            actual: value.type_name(),
        })
    }

    fn expect_bool(&self, name: &str, value: &PropertyValue) -> Result<bool> {
        value.as_bool().ok_or_else(|| ScenaError::InvalidValue {
            property: name.to_string(),
            expected: "bool",
            actual: value.type_name(),
        })
    }

    fn expect_text(&self, name: &str, value: &PropertyValue) -> Result<String> {
        match value {
            PropertyValue::Text(s) => Ok(s.clone()),
            other => Err(ScenaError::InvalidValue {
                property: name.to_string(),
                expected: "text",
                actual: other.type_name(),
            }),
        }
    }

    fn expect_color(&self, name: &str, value: &PropertyValue) -> Result<Color> {
        match value {
            PropertyValue::Color(c) => Ok(*c),
            other => Err(ScenaError::InvalidValue {
                property: name.to_string(),
                expected: "color",
                actual: other.type_name(),
            }),
        }
    }

    fn unknown_property(&self, name: &str) -> ScenaError {
        ScenaError::UnknownProperty {
            property: name.to_string(),
            kind: self.kind.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_roundtrip() {
        let mut node = SceneNode::new(NodeKind::Container);
        node.set_property("x", PropertyValue::Number(40.0)).unwrap();
        assert_eq!(node.get_property("x").unwrap(), PropertyValue::Number(40.0));
    }

    #[test]
    fn test_wrong_type_leaves_node_unchanged() {
        let mut node = SceneNode::new(NodeKind::Container);
        node.set_property("x", PropertyValue::Number(7.0)).unwrap();

        let err = node
            .set_property("x", PropertyValue::Text("abc".into()))
            .unwrap_err();
        assert!(matches!(err, ScenaError::InvalidValue { .. }));
        assert_eq!(node.x, 7.0);
    }

    #[test]
    fn test_text_property_only_on_text_nodes() {
        let mut container = SceneNode::new(NodeKind::Container);
        assert!(matches!(
            container.set_property("text", PropertyValue::Text("hi".into())),
            Err(ScenaError::UnknownProperty { .. })
        ));

        let mut text = SceneNode::text("hi");
        text.set_property("text", PropertyValue::Text("yo".into()))
            .unwrap();
        assert_eq!(text.text, "yo");
    }

    #[test]
    fn test_style_properties() {
        let mut text = SceneNode::text("");
        text.set_style_property("font_weight", PropertyValue::Text("bold".into()))
            .unwrap();
        assert_eq!(
            text.get_style_property("font_weight").unwrap(),
            PropertyValue::Text("bold".into())
        );

        let mut sprite = SceneNode::new(NodeKind::Sprite);
        assert!(sprite
            .set_style_property("font_weight", PropertyValue::Text("bold".into()))
            .is_err());
    }

    #[test]
    fn test_unknown_property_name() {
        let node = SceneNode::new(NodeKind::Graphics);
        assert!(matches!(
            node.get_property("radius"),
            Err(ScenaError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex(0xFF0000);
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.0));
    }
}
