// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Paint-server resolution.
//!
//! Turns a [`Paint`] value plus the element bounding box into a concrete
//! shader or pattern tile, following deferred references, gradient stop
//! inheritance and fallback colors along the way.

use std::rc::Rc;

use svgtypes::{Length, LengthUnit};
use tiny_skia::{Rect, SpreadMode, Transform};

use crate::pattern::Tile;
use crate::scope::RenderScope;
use crate::tree::{
    BaseGradient, Color, Document, LinearGradient, Opacity, Paint, RadialGradient, SpreadMethod,
    Units,
};
use crate::units::{self, Axis};
use crate::OptionLog;

/// References can legitimately chain (a `use` of a gradient that links
/// another gradient), but an unbounded walk would hang on reference cycles.
const MAX_LINK_HOPS: u8 = 8;

/// A resolved paint ready to be bound into a [`tiny_skia::Paint`].
#[derive(Clone, Debug)]
pub enum ResolvedPaint {
    /// A self-contained shader: a solid color or a gradient.
    Shader(tiny_skia::Shader<'static>),

    /// A rasterized pattern tile, repeated over the target.
    Tile(Rc<Tile>),
}

impl ResolvedPaint {
    /// Produces the backend shader for this paint.
    pub fn to_shader(&self) -> tiny_skia::Shader<'_> {
        match self {
            ResolvedPaint::Shader(ref shader) => shader.clone(),
            ResolvedPaint::Tile(ref tile) => tile.to_shader(),
        }
    }
}

/// Clamps an opacity value to the 0..1 range.
pub fn normalize_opacity(opacity: f32) -> Opacity {
    Opacity::new_clamped(opacity)
}

/// Multiplies an alpha channel by an opacity factor.
///
/// Only the alpha channel is affected, colors are not premultiplied.
pub fn combine_opacity(alpha: u8, opacity: Opacity) -> u8 {
    ((opacity.get() * (alpha as f32 / 255.0)) * 255.0).round() as u8
}

/// Resolves a plain color server into a backend color.
///
/// With `ignore_opacity` set the color's own alpha is kept unchanged.
pub fn resolve_color(color: Color, opacity: Opacity, ignore_opacity: bool) -> tiny_skia::Color {
    let alpha = if ignore_opacity {
        color.alpha
    } else {
        combine_opacity(color.alpha, opacity)
    };

    tiny_skia::Color::from_rgba8(color.red, color.green, color.blue, alpha)
}

/// Resolves a possibly deferred paint into a concrete server.
///
/// Returns the resolved server and the fallback captured by the original
/// reference. A fallback's own fallback is never consulted. Dangling
/// references resolve into [`Paint::None`].
pub fn resolve_paint(paint: &Paint, doc: &Document) -> (Paint, Paint) {
    let (mut server, fallback) = match paint {
        Paint::Link(ref link) => {
            let resolved = doc
                .find(&link.id)
                .log_none(|| log::warn!("Paint server '{}' is not defined.", link.id))
                .unwrap_or(Paint::None);
            (resolved, link.fallback.clone())
        }
        _ => (paint.clone(), Paint::None),
    };

    // A reference can resolve into another reference.
    // Follow it, keeping the original fallback.
    let mut hops = 0;
    while let Paint::Link(link) = server {
        hops += 1;
        if hops > MAX_LINK_HOPS {
            log::warn!("Paint server '{}' reference chain is too long.", link.id);
            return (Paint::None, fallback);
        }

        server = doc.find(&link.id).unwrap_or(Paint::None);
    }

    (server, fallback)
}

/// Resolves a paint into a shader or a pattern tile.
///
/// `bbox` is the element bounding box, used by object-bounding-box
/// coordinate systems. Returns `None` when the element must not be drawn
/// with this paint.
pub fn convert(
    paint: &Paint,
    opacity: Opacity,
    bbox: Rect,
    ignore_opacity: bool,
    doc: &Document,
    scope: &RenderScope,
) -> Option<ResolvedPaint> {
    let (server, fallback) = resolve_paint(paint, doc);

    match server {
        Paint::None => None,
        Paint::Color(c) => {
            let color = resolve_color(c, opacity, ignore_opacity);
            Some(ResolvedPaint::Shader(tiny_skia::Shader::SolidColor(color)))
        }
        Paint::LinearGradient(ref lg) => {
            if lg.units == Units::ObjectBoundingBox && is_zero_sized(bbox) {
                log::warn!("Gradient on zero-sized shapes is not allowed.");
                return fallback_color(&fallback, opacity, ignore_opacity);
            }

            convert_linear_gradient(lg, opacity, bbox, ignore_opacity, doc)
                .map(ResolvedPaint::Shader)
        }
        Paint::RadialGradient(ref rg) => {
            if rg.units == Units::ObjectBoundingBox && is_zero_sized(bbox) {
                log::warn!("Gradient on zero-sized shapes is not allowed.");
                return fallback_color(&fallback, opacity, ignore_opacity);
            }

            convert_radial_gradient(rg, opacity, bbox, ignore_opacity, doc)
                .map(ResolvedPaint::Shader)
        }
        Paint::Pattern(ref pattern) => {
            match crate::pattern::convert(pattern, bbox, opacity, ignore_opacity, doc, scope) {
                Some(tile) => Some(tile),
                None => fallback_color(&fallback, opacity, ignore_opacity),
            }
        }
        // `resolve_paint` never returns a reference.
        Paint::Link(_) => None,
    }
}

fn is_zero_sized(bbox: Rect) -> bool {
    bbox.width() == 0.0 || bbox.height() == 0.0
}

fn fallback_color(
    fallback: &Paint,
    opacity: Opacity,
    ignore_opacity: bool,
) -> Option<ResolvedPaint> {
    match fallback {
        Paint::Color(c) => {
            let color = resolve_color(*c, opacity, ignore_opacity);
            Some(ResolvedPaint::Shader(tiny_skia::Shader::SolidColor(color)))
        }
        _ => None,
    }
}

fn convert_linear_gradient(
    gradient: &LinearGradient,
    opacity: Opacity,
    bbox: Rect,
    ignore_opacity: bool,
    doc: &Document,
) -> Option<tiny_skia::Shader<'static>> {
    let (mode, transform, colors, offsets) =
        convert_base_gradient(gradient, opacity, bbox, ignore_opacity, doc)?;

    if colors.is_empty() {
        return Some(tiny_skia::Shader::SolidColor(tiny_skia::Color::TRANSPARENT));
    } else if colors.len() == 1 {
        return Some(tiny_skia::Shader::SolidColor(colors[0]));
    }

    let x1 = units::convert_length(gradient.x1, Axis::Horizontal, gradient.units, bbox, doc);
    let y1 = units::convert_length(gradient.y1, Axis::Vertical, gradient.units, bbox, doc);
    let x2 = units::convert_length(gradient.x2, Axis::Horizontal, gradient.units, bbox, doc);
    let y2 = units::convert_length(gradient.y2, Axis::Vertical, gradient.units, bbox, doc);

    tiny_skia::LinearGradient::new(
        (x1, y1).into(),
        (x2, y2).into(),
        gradient_stops(colors, offsets),
        mode,
        transform,
    )
}

fn convert_radial_gradient(
    gradient: &RadialGradient,
    opacity: Opacity,
    bbox: Rect,
    ignore_opacity: bool,
    doc: &Document,
) -> Option<tiny_skia::Shader<'static>> {
    let (mode, transform, colors, offsets) =
        convert_base_gradient(gradient, opacity, bbox, ignore_opacity, doc)?;

    if colors.is_empty() {
        return Some(tiny_skia::Shader::SolidColor(tiny_skia::Color::TRANSPARENT));
    } else if colors.len() == 1 {
        return Some(tiny_skia::Shader::SolidColor(colors[0]));
    }

    let cx = units::convert_length(gradient.cx, Axis::Horizontal, gradient.units, bbox, doc);
    let cy = units::convert_length(gradient.cy, Axis::Vertical, gradient.units, bbox, doc);
    let fx = units::convert_length(gradient.fx, Axis::Horizontal, gradient.units, bbox, doc);
    let fy = units::convert_length(gradient.fy, Axis::Vertical, gradient.units, bbox, doc);
    let r = units::convert_length(gradient.r, Axis::Other, gradient.units, bbox, doc);

    // A cone from the focal point at zero radius to the center circle,
    // matching the SVG focal point semantics.
    tiny_skia::RadialGradient::new(
        (fx, fy).into(),
        (cx, cy).into(),
        r,
        gradient_stops(colors, offsets),
        mode,
        transform,
    )
}

type BaseGradientParts = (SpreadMode, Transform, Vec<tiny_skia::Color>, Vec<f32>);

fn convert_base_gradient(
    gradient: &BaseGradient,
    opacity: Opacity,
    bbox: Rect,
    ignore_opacity: bool,
    doc: &Document,
) -> Option<BaseGradientParts> {
    let mode = match gradient.spread_method {
        SpreadMethod::Pad => SpreadMode::Pad,
        SpreadMethod::Reflect => SpreadMode::Reflect,
        SpreadMethod::Repeat => SpreadMode::Repeat,
    };

    let transform = if gradient.units == Units::ObjectBoundingBox {
        let bbox = bbox
            .to_non_zero_rect()
            .log_none(|| log::warn!("Gradient on zero-sized shapes is not allowed."))?;
        let ts = Transform::from_bbox(bbox);
        ts.pre_concat(gradient.transform)
    } else {
        gradient.transform
    };

    let mut colors = Vec::new();
    let mut offsets = Vec::new();
    collect_stops(
        gradient,
        bbox,
        opacity,
        ignore_opacity,
        doc,
        &mut colors,
        &mut offsets,
        0,
    );
    adjust_stop_offsets(&mut offsets);

    Some((mode, transform, colors, offsets))
}

fn gradient_stops(
    colors: Vec<tiny_skia::Color>,
    offsets: Vec<f32>,
) -> Vec<tiny_skia::GradientStop> {
    colors
        .into_iter()
        .zip(offsets)
        .map(|(color, offset)| tiny_skia::GradientStop::new(offset, color))
        .collect()
}

/// Collects gradient stops in document order.
///
/// A gradient without stops of its own inherits the stop list of the
/// gradient it links to. This is the only attribute inherited this way.
#[allow(clippy::too_many_arguments)]
fn collect_stops(
    gradient: &BaseGradient,
    bbox: Rect,
    opacity: Opacity,
    ignore_opacity: bool,
    doc: &Document,
    colors: &mut Vec<tiny_skia::Color>,
    offsets: &mut Vec<f32>,
    depth: u8,
) {
    for stop in &gradient.stops {
        // `stop-color` can be a reference itself, e.g. `currentColor`.
        let (server, _) = resolve_paint(&stop.color, doc);
        let color = match server {
            Paint::Color(c) => c,
            _ => continue,
        };

        let stop_opacity = normalize_opacity(stop.opacity);
        let combined = normalize_opacity(opacity.get() * stop_opacity.get());
        colors.push(resolve_color(color, combined, ignore_opacity));
        offsets.push(stop_offset(stop.offset, bbox, doc));
    }

    if colors.is_empty() {
        if let Some(ref id) = gradient.links_to {
            if depth >= MAX_LINK_HOPS {
                log::warn!("Gradient '{}' stop inheritance chain is too long.", id);
                return;
            }

            match doc.find(id) {
                Some(Paint::LinearGradient(ref lg)) => collect_stops(
                    &lg.base,
                    bbox,
                    opacity,
                    ignore_opacity,
                    doc,
                    colors,
                    offsets,
                    depth + 1,
                ),
                Some(Paint::RadialGradient(ref rg)) => collect_stops(
                    &rg.base,
                    bbox,
                    opacity,
                    ignore_opacity,
                    doc,
                    colors,
                    offsets,
                    depth + 1,
                ),
                _ => {}
            }
        }
    }
}

/// A stop offset is always a fraction, whatever unit it was declared in.
fn stop_offset(offset: Length, bbox: Rect, doc: &Document) -> f32 {
    match offset.unit {
        LengthUnit::None => offset.number as f32,
        LengthUnit::Percent => offset.number as f32 / 100.0,
        _ => {
            let n = units::convert_length(offset, Axis::Horizontal, Units::UserSpaceOnUse, bbox, doc);
            if bbox.width() > 0.0 {
                n / bbox.width()
            } else {
                n
            }
        }
    }
}

/// Forces stop offsets to be monotonically non-decreasing.
///
/// An offset lower than the running maximum is clamped up to it,
/// collapsing into a flat band. Stops are never reordered.
pub(crate) fn adjust_stop_offsets(offsets: &mut [f32]) {
    let mut max_offset = f32::MIN;
    for offset in offsets {
        if *offset > max_offset {
            max_offset = *offset;
        } else if *offset < max_offset {
            *offset = max_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_clamped() {
        assert_eq!(normalize_opacity(-0.5).get(), 0.0);
        assert_eq!(normalize_opacity(0.25).get(), 0.25);
        assert_eq!(normalize_opacity(1.7).get(), 1.0);
    }

    #[test]
    fn combined_alpha_is_rounded() {
        assert_eq!(combine_opacity(255, normalize_opacity(0.5)), 128);
        assert_eq!(combine_opacity(100, normalize_opacity(1.0)), 100);
        assert_eq!(combine_opacity(0, normalize_opacity(0.5)), 0);
    }

    #[test]
    fn color_keeps_own_alpha_when_opacity_is_ignored() {
        let color = Color::new_rgba(10, 20, 30, 200);
        let resolved = resolve_color(color, normalize_opacity(0.5), true);
        assert_eq!(resolved.to_color_u8().alpha(), 200);

        let resolved = resolve_color(color, normalize_opacity(0.5), false);
        assert_eq!(resolved.to_color_u8().alpha(), 100);
    }

    #[test]
    fn stop_offsets_never_decrease() {
        let mut offsets = vec![0.0, 0.3, 0.2, 0.2, 0.9];
        adjust_stop_offsets(&mut offsets);
        assert_eq!(offsets, vec![0.0, 0.3, 0.3, 0.3, 0.9]);
    }

    #[test]
    fn stop_offsets_keep_monotonic_input() {
        let mut offsets = vec![0.0, 0.5, 1.0];
        adjust_stop_offsets(&mut offsets);
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }
}
