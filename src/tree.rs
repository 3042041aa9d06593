// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A read-only SVG paint document model.
//!
//! The types below are the inputs of the paint pipeline. They are expected
//! to be produced by an SVG parser (which is out of scope for this crate)
//! or constructed manually. The pipeline never mutates them.

use std::collections::HashMap;
use std::rc::Rc;

use tiny_skia::{NonZeroRect, Transform};

pub use svgtypes::{Align, AspectRatio, Length, LengthUnit};

/// An alias to `NormalizedF32`.
pub type Opacity = strict_num::NormalizedF32;

/// An RGBA color.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    /// Constructs a new `Color` from RGBA values.
    #[inline]
    pub fn new_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Constructs a new opaque `Color` from RGB values.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Color {
        Color::new_rgba(red, green, blue, 255)
    }

    /// Constructs a new `Color` set to black.
    #[inline]
    pub fn black() -> Color {
        Color::new_rgb(0, 0, 0)
    }

    /// Constructs a new `Color` set to white.
    #[inline]
    pub fn white() -> Color {
        Color::new_rgb(255, 255, 255)
    }
}

/// An element units.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Units {
    UserSpaceOnUse,
    ObjectBoundingBox,
}

// `Units` cannot have a default value, because it changes depending on an element.

/// A spread method.
///
/// `spreadMethod` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SpreadMethod {
    Pad,
    Reflect,
    Repeat,
}

impl Default for SpreadMethod {
    fn default() -> Self {
        Self::Pad
    }
}

/// A fill rule.
///
/// `fill-rule` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl Default for FillRule {
    fn default() -> Self {
        Self::NonZero
    }
}

/// A line cap.
///
/// `stroke-linecap` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl Default for LineCap {
    fn default() -> Self {
        Self::Butt
    }
}

/// A line join.
///
/// `stroke-linejoin` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter
    }
}

/// A shape rendering method.
///
/// `shape-rendering` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ShapeRendering {
    Auto,
    OptimizeSpeed,
    CrispEdges,
    GeometricPrecision,
}

impl ShapeRendering {
    /// Checks if anti-aliasing should be enabled.
    pub fn use_shape_antialiasing(self) -> bool {
        match self {
            ShapeRendering::OptimizeSpeed => false,
            ShapeRendering::CrispEdges => false,
            ShapeRendering::Auto => true,
            ShapeRendering::GeometricPrecision => true,
        }
    }
}

impl Default for ShapeRendering {
    fn default() -> Self {
        Self::Auto
    }
}

/// A visibility property.
///
/// `visibility` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Visibility {
    Visible,
    Hidden,
    Collapse,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Visible
    }
}

/// A deferred, by-reference paint server.
///
/// `url(#id) fallback` in the SVG. The fallback is captured at parse time
/// and consulted only when the referenced server cannot be used.
#[derive(Clone, Debug)]
pub struct Link {
    /// The referenced server id. Resolved against [`Document`] at render time.
    pub id: String,

    /// A pre-captured fallback paint.
    pub fallback: Paint,
}

/// A paint style.
///
/// `paint` value type in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum Paint {
    None,
    Color(Color),
    LinearGradient(Rc<LinearGradient>),
    RadialGradient(Rc<RadialGradient>),
    Pattern(Rc<Pattern>),
    Link(Box<Link>),
}

impl Paint {
    /// Checks that the paint is `none`.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }
}

/// Gradient's stop element.
///
/// `stop` element in the SVG.
#[derive(Clone, Debug)]
pub struct Stop {
    /// Gradient stop offset.
    ///
    /// `offset` in the SVG.
    pub offset: Length,

    /// Gradient stop color.
    ///
    /// `stop-color` in the SVG. Can be a deferred reference
    /// (e.g. `currentColor`), which is resolved during rendering.
    pub color: Paint,

    /// Gradient stop opacity.
    ///
    /// `stop-opacity` in the SVG.
    pub opacity: f32,
}

impl Stop {
    /// Creates a stop from a plain fraction offset and a color.
    pub fn new(offset: f32, color: Color, opacity: f32) -> Self {
        Stop {
            offset: Length::new(offset as f64, LengthUnit::None),
            color: Paint::Color(color),
            opacity,
        }
    }
}

/// A generic gradient.
#[derive(Clone, Debug)]
pub struct BaseGradient {
    /// Coordinate system units.
    ///
    /// `gradientUnits` in the SVG.
    pub units: Units,

    /// Gradient transform.
    ///
    /// `gradientTransform` in the SVG.
    pub transform: Transform,

    /// Gradient spreading method.
    ///
    /// `spreadMethod` in the SVG.
    pub spread_method: SpreadMethod,

    /// A list of `stop` elements.
    pub stops: Vec<Stop>,

    /// A gradient this one inherits stops from.
    ///
    /// `href` in the SVG. Only the stop list is inherited through
    /// this reference; units, transform and spread method are not.
    pub links_to: Option<String>,
}

impl Default for BaseGradient {
    fn default() -> Self {
        BaseGradient {
            units: Units::ObjectBoundingBox,
            transform: Transform::default(),
            spread_method: SpreadMethod::default(),
            stops: Vec::new(),
            links_to: None,
        }
    }
}

/// A linear gradient.
///
/// `linearGradient` element in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct LinearGradient {
    pub x1: Length,
    pub y1: Length,
    pub x2: Length,
    pub y2: Length,

    /// Base gradient data.
    pub base: BaseGradient,
}

impl std::ops::Deref for LinearGradient {
    type Target = BaseGradient;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// A radial gradient.
///
/// `radialGradient` element in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct RadialGradient {
    pub cx: Length,
    pub cy: Length,
    pub fx: Length,
    pub fy: Length,
    pub r: Length,

    /// Base gradient data.
    pub base: BaseGradient,
}

impl std::ops::Deref for RadialGradient {
    type Target = BaseGradient;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// A pattern element.
///
/// `pattern` element in the SVG.
///
/// Unlike gradients, almost every pattern attribute falls back through
/// the inheritance chain independently, so all of them are optional here.
#[derive(Clone, Debug)]
pub struct Pattern {
    /// Coordinate system units.
    ///
    /// `patternUnits` in the SVG.
    pub units: Option<Units>,

    /// Content coordinate system units.
    ///
    /// `patternContentUnits` in the SVG.
    pub content_units: Option<Units>,

    /// Pattern transform.
    ///
    /// `patternTransform` in the SVG. Not inherited.
    pub transform: Transform,

    /// Tile origin.
    ///
    /// `x` in the SVG.
    pub x: Option<Length>,

    /// Tile origin.
    ///
    /// `y` in the SVG.
    pub y: Option<Length>,

    /// Tile width.
    ///
    /// `width` in the SVG.
    pub width: Option<Length>,

    /// Tile height.
    ///
    /// `height` in the SVG.
    pub height: Option<Length>,

    /// Pattern viewbox.
    ///
    /// `viewBox` in the SVG.
    pub view_box: Option<NonZeroRect>,

    /// Pattern viewbox aspect.
    ///
    /// `preserveAspectRatio` in the SVG.
    pub aspect: Option<AspectRatio>,

    /// Pattern children.
    pub children: Vec<Element>,

    /// A pattern this one inherits attributes from.
    ///
    /// `href` in the SVG.
    pub links_to: Option<String>,
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern {
            units: None,
            content_units: None,
            transform: Transform::default(),
            x: None,
            y: None,
            width: None,
            height: None,
            view_box: None,
            aspect: None,
            children: Vec::new(),
            links_to: None,
        }
    }
}

/// A visual element.
///
/// Carries the presentation attributes the paint pipeline consumes
/// together with an already-constructed geometry path.
#[derive(Clone, Debug)]
pub struct Element {
    /// Element geometry. Path construction is out of scope of this crate.
    pub path: Rc<tiny_skia::Path>,

    /// Element transform, relative to its parent.
    pub transform: Transform,

    /// Fill paint.
    pub fill: Paint,
    /// `fill-opacity` in the SVG.
    pub fill_opacity: f32,
    /// `fill-rule` in the SVG.
    pub fill_rule: FillRule,

    /// Stroke paint.
    pub stroke: Paint,
    /// `stroke-opacity` in the SVG.
    pub stroke_opacity: f32,
    /// `stroke-width` in the SVG.
    pub stroke_width: Length,
    /// `stroke-dasharray` in the SVG. `None` when not declared.
    pub dasharray: Option<Vec<Length>>,
    /// `stroke-dashoffset` in the SVG.
    pub dashoffset: Length,
    /// `stroke-linecap` in the SVG.
    pub linecap: LineCap,
    /// `stroke-linejoin` in the SVG.
    pub linejoin: LineJoin,
    /// `stroke-miterlimit` in the SVG.
    pub miterlimit: f32,

    /// `shape-rendering` in the SVG.
    pub rendering_mode: ShapeRendering,

    /// Element opacity. Composited as a layer, unlike fill/stroke opacity.
    pub opacity: f32,

    /// `visibility` in the SVG.
    pub visibility: Visibility,
}

impl Element {
    /// Creates an element with the SVG initial values and the provided geometry.
    pub fn new(path: Rc<tiny_skia::Path>) -> Self {
        Element {
            path,
            transform: Transform::default(),
            fill: Paint::Color(Color::black()),
            fill_opacity: 1.0,
            fill_rule: FillRule::default(),
            stroke: Paint::None,
            stroke_opacity: 1.0,
            stroke_width: Length::new(1.0, LengthUnit::None),
            dasharray: None,
            dashoffset: Length::new(0.0, LengthUnit::None),
            linecap: LineCap::default(),
            linejoin: LineJoin::default(),
            miterlimit: 4.0,
            rendering_mode: ShapeRendering::default(),
            opacity: 1.0,
            visibility: Visibility::default(),
        }
    }
}

/// A paint-server registry resolved against during rendering.
///
/// Holds the document-wide values length conversion depends on
/// and the `id -> paint server` map deferred references resolve through.
#[derive(Clone, Debug)]
pub struct Document {
    /// Dots per inch for physical length units.
    pub dpi: f32,

    /// Font size for `em`/`ex` length units.
    pub font_size: f32,

    defs: HashMap<String, Paint>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Document {
            dpi: 96.0,
            font_size: 12.0,
            defs: HashMap::new(),
        }
    }

    /// Registers a paint server under an id.
    pub fn define(&mut self, id: impl Into<String>, paint: Paint) {
        self.defs.insert(id.into(), paint);
    }

    /// Resolves a paint server by id.
    pub fn find(&self, id: &str) -> Option<Paint> {
        self.defs.get(id).cloned()
    }
}
