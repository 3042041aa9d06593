// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fill and stroke paint assembly.

use tiny_skia::Rect;

use crate::paint_server::{self, ResolvedPaint};
use crate::scope::RenderScope;
use crate::tree::{Document, Element, LineCap, LineJoin, Opacity, Units};
use crate::units::{self, Axis};

/// A ready-to-use fill paint.
#[derive(Clone, Debug)]
pub struct Brush {
    /// The resolved paint source.
    pub paint: ResolvedPaint,

    /// Whether shapes filled with this brush are antialiased.
    pub anti_alias: bool,
}

impl Brush {
    /// Binds the brush into a backend paint.
    pub fn to_paint(&self) -> tiny_skia::Paint<'_> {
        let mut paint = tiny_skia::Paint::default();
        paint.shader = self.paint.to_shader();
        paint.anti_alias = self.anti_alias;
        paint
    }
}

/// A ready-to-use stroke paint.
#[derive(Clone, Debug)]
pub struct Pen {
    /// The resolved paint source.
    pub paint: ResolvedPaint,

    /// Whether shapes stroked with this pen are antialiased.
    pub anti_alias: bool,

    /// Stroke properties: width, caps, joins, miter limit and dashing.
    pub stroke: tiny_skia::Stroke,
}

impl Pen {
    /// Binds the pen into a backend paint.
    pub fn to_paint(&self) -> tiny_skia::Paint<'_> {
        let mut paint = tiny_skia::Paint::default();
        paint.shader = self.paint.to_shader();
        paint.anti_alias = self.anti_alias;
        paint
    }
}

/// Assembles the fill paint of an element.
///
/// Returns `None` when the element's fill must not be drawn.
/// The element's stroke is unaffected by that decision.
pub fn fill_brush(
    element: &Element,
    bbox: Rect,
    ignore_opacity: bool,
    doc: &Document,
    scope: &RenderScope,
) -> Option<Brush> {
    let opacity = paint_server::normalize_opacity(element.fill_opacity);
    let paint = paint_server::convert(&element.fill, opacity, bbox, ignore_opacity, doc, scope)?;

    Some(Brush {
        paint,
        anti_alias: element.rendering_mode.use_shape_antialiasing(),
    })
}

/// Assembles the stroke paint of an element.
///
/// Returns `None` when the element's stroke must not be drawn.
/// Callers should gate on [`is_valid_stroke`] first: a zero-width
/// stroke is not drawable at all.
pub fn stroke_pen(
    element: &Element,
    bbox: Rect,
    ignore_opacity: bool,
    doc: &Document,
    scope: &RenderScope,
) -> Option<Pen> {
    let opacity = paint_server::normalize_opacity(element.stroke_opacity);
    let paint = paint_server::convert(&element.stroke, opacity, bbox, ignore_opacity, doc, scope)?;

    let mut stroke = tiny_skia::Stroke {
        width: units::convert_length(
            element.stroke_width,
            Axis::Other,
            Units::UserSpaceOnUse,
            bbox,
            doc,
        ),
        miter_limit: element.miterlimit,
        line_cap: match element.linecap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match element.linejoin {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        dash: None,
    };

    // A declared dash array is always attempted, even when it turns
    // out to be empty or invalid. An invalid one renders solid.
    if element.dasharray.is_some() {
        stroke.dash = dash_pattern(element, bbox, doc);
    }

    Some(Pen {
        paint,
        anti_alias: element.rendering_mode.use_shape_antialiasing(),
        stroke,
    })
}

/// Builds a stroke dash pattern.
///
/// An odd dash array repeats itself once to an even length. Any negative
/// device interval or a non-positive interval sum disables dashing.
pub fn dash_pattern(
    element: &Element,
    bounds: Rect,
    doc: &Document,
) -> Option<tiny_skia::StrokeDash> {
    let list = element.dasharray.as_ref()?;
    if list.is_empty() {
        return None;
    }

    let is_odd = list.len() % 2 != 0;
    let mut intervals = Vec::with_capacity(if is_odd { list.len() * 2 } else { list.len() });
    let mut sum = 0.0f32;
    for len in list {
        let dash = units::convert_length(*len, Axis::Other, Units::UserSpaceOnUse, bounds, doc);
        if dash < 0.0 {
            return None;
        }

        intervals.push(dash);
        sum += dash;
    }

    if sum <= 0.0 {
        return None;
    }

    if is_odd {
        intervals.extend_from_within(..);
    }

    let phase = units::convert_length(
        element.dashoffset,
        Axis::Other,
        Units::UserSpaceOnUse,
        bounds,
        doc,
    );

    tiny_skia::StrokeDash::new(intervals, phase)
}

/// Checks that an element has a fill worth resolving.
pub fn is_valid_fill(element: &Element) -> bool {
    !element.fill.is_none()
}

/// Checks that an element has a stroke worth resolving.
///
/// A stroke without paint or with a non-positive width is not drawable.
pub fn is_valid_stroke(element: &Element, bounds: Rect, doc: &Document) -> bool {
    !element.stroke.is_none()
        && units::convert_length(
            element.stroke_width,
            Axis::Other,
            Units::UserSpaceOnUse,
            bounds,
            doc,
        ) > 0.0
}

/// Returns the compositing opacity for a layer, if one is needed at all.
pub fn opacity_layer(opacity: f32) -> Option<Opacity> {
    let opacity = paint_server::normalize_opacity(opacity);
    if opacity.get() < 1.0 {
        Some(opacity)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use svgtypes::{Length, LengthUnit};

    fn doc() -> Document {
        Document::new()
    }

    fn bounds() -> Rect {
        Rect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap()
    }

    fn element_with_dashes(dashes: &[f64]) -> Element {
        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.line_to(100.0, 0.0);
        let mut element = Element::new(Rc::new(pb.finish().unwrap()));
        element.dasharray = Some(
            dashes
                .iter()
                .map(|n| Length::new(*n, LengthUnit::None))
                .collect(),
        );
        element
    }

    #[test]
    fn odd_dash_array_doubles() {
        let element = element_with_dashes(&[4.0, 2.0, 6.0]);
        // tiny-skia rejects odd arrays, so an expanded array proves
        // the doubling happened before construction.
        assert!(dash_pattern(&element, bounds(), &doc()).is_some());
    }

    #[test]
    fn negative_dash_disables_dashing() {
        let element = element_with_dashes(&[4.0, -2.0, 6.0]);
        assert!(dash_pattern(&element, bounds(), &doc()).is_none());
    }

    #[test]
    fn zero_sum_dash_disables_dashing() {
        let element = element_with_dashes(&[0.0, 0.0]);
        assert!(dash_pattern(&element, bounds(), &doc()).is_none());
    }

    #[test]
    fn empty_dash_array_disables_dashing() {
        let element = element_with_dashes(&[]);
        assert!(dash_pattern(&element, bounds(), &doc()).is_none());
    }

    #[test]
    fn zero_width_stroke_is_invalid() {
        let mut element = element_with_dashes(&[]);
        element.stroke = crate::tree::Paint::Color(crate::tree::Color::black());
        element.stroke_width = Length::new(0.0, LengthUnit::None);
        assert!(!is_valid_stroke(&element, bounds(), &doc()));

        element.stroke_width = Length::new(2.0, LengthUnit::None);
        assert!(is_valid_stroke(&element, bounds(), &doc()));
    }
}
