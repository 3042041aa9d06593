// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pattern synthesis.
//!
//! Resolves a chain of inheriting pattern servers into one effective
//! definition, rasterizes the pattern content into a reusable tile and
//! wraps it as a repeating shader.

use std::rc::Rc;

use svgtypes::{AspectRatio, Length, LengthUnit};
use tiny_skia::{FilterQuality, IntSize, Pixmap, Rect, Size, SpreadMode, Transform};

use crate::paint_server::ResolvedPaint;
use crate::scope::RenderScope;
use crate::tree::{Document, Opacity, Paint, Pattern, Units};
use crate::units::{self, Axis};
use crate::{geom, OptionLog};

/// A rasterized pattern tile.
///
/// Owned by the [`RenderScope`] it was resolved in; shaders produced by
/// [`Tile::to_shader`] borrow the tile pixmap.
#[derive(Debug)]
pub struct Tile {
    /// The rasterized tile content.
    pub pixmap: Pixmap,

    /// Tile placement matrix, applied when the tile repeats.
    pub transform: Transform,
}

impl Tile {
    /// Wraps the tile into a repeating shader.
    pub fn to_shader(&self) -> tiny_skia::Shader<'_> {
        tiny_skia::Pattern::new(
            self.pixmap.as_ref(),
            SpreadMode::Repeat,
            FilterQuality::Bicubic,
            1.0,
            self.transform,
        )
    }
}

/// Resolves a pattern into a rasterized, repeating tile.
///
/// Returns `None` when the chain provides no usable geometry or content;
/// the caller decides whether a fallback color applies.
pub fn convert(
    pattern: &Rc<Pattern>,
    bbox: Rect,
    opacity: Opacity,
    ignore_opacity: bool,
    doc: &Document,
    scope: &RenderScope,
) -> Option<ResolvedPaint> {
    let chain = collect_chain(pattern, doc);

    // Every attribute falls back through the chain independently:
    // each one is taken from the first server that defines it.
    let children = chain
        .iter()
        .find(|p| !p.children.is_empty())
        .map(|p| &p.children)
        .log_none(|| log::warn!("Pattern has no content."))?;
    let x = find_attr(&chain, |p| p.x);
    let y = find_attr(&chain, |p| p.y);
    let width = find_attr(&chain, |p| p.width)
        .log_none(|| log::warn!("Pattern has no width."))?;
    let height = find_attr(&chain, |p| p.height)
        .log_none(|| log::warn!("Pattern has no height."))?;
    let units = find_attr(&chain, |p| p.units).unwrap_or(Units::ObjectBoundingBox);
    let content_units = find_attr(&chain, |p| p.content_units).unwrap_or(Units::UserSpaceOnUse);
    let view_box = find_attr(&chain, |p| p.view_box);
    let aspect = find_attr(&chain, |p| p.aspect).unwrap_or_else(AspectRatio::default);

    let x_len = x.unwrap_or_else(Length::zero);
    let y_len = y.unwrap_or_else(Length::zero);

    let mut x = units::convert_length(x_len, Axis::Horizontal, Units::UserSpaceOnUse, bbox, doc);
    let mut y = units::convert_length(y_len, Axis::Vertical, Units::UserSpaceOnUse, bbox, doc);
    let mut w = units::convert_length(width, Axis::Horizontal, Units::UserSpaceOnUse, bbox, doc);
    let mut h = units::convert_length(height, Axis::Vertical, Units::UserSpaceOnUse, bbox, doc);

    if w <= 0.0 || h <= 0.0 {
        log::warn!("Pattern has an invalid size.");
        return None;
    }

    if units == Units::ObjectBoundingBox {
        // Percentages were already resolved against the bounding box.
        if x_len.unit != LengthUnit::Percent {
            x *= bbox.width();
        }
        if y_len.unit != LengthUnit::Percent {
            y *= bbox.height();
        }
        if width.unit != LengthUnit::Percent {
            w *= bbox.width();
        }
        if height.unit != LengthUnit::Percent {
            h *= bbox.height();
        }

        x += bbox.x();
        y += bbox.y();
    }

    // Tile placement: the pattern transform, then the tile origin.
    // The transform is not inherited, it always comes from the
    // referenced pattern itself.
    let mut transform = Transform::default();
    transform = transform.pre_concat(pattern.transform);
    transform = transform.pre_translate(x, y);

    // The transform the content is rendered with inside the tile.
    let content_transform = if let Some(vb) = view_box {
        let tile_size = Size::from_wh(w, h)?;
        geom::view_box_to_transform(vb, aspect, tile_size)
    } else if content_units == Units::ObjectBoundingBox {
        // 'Note that this attribute has no effect if attribute viewBox is specified.'
        Transform::from_scale(bbox.width(), bbox.height())
    } else {
        Transform::default()
    };

    let img_size = IntSize::from_wh(w.round() as u32, h.round() as u32)
        .log_none(|| log::warn!("Pattern has a zero-sized tile."))?;

    // Account for the tile rect to pixel grid rounding.
    let sx = img_size.width() as f32 / w;
    let sy = img_size.height() as f32 / h;
    let content_transform = Transform::from_scale(sx, sy).pre_concat(content_transform);
    let transform = transform.pre_scale(1.0 / sx, 1.0 / sy);

    let child_scope = scope.nested()?;
    let picture = child_scope.register_picture(crate::render::record_picture(
        children,
        w,
        h,
        content_transform,
        opacity,
        ignore_opacity,
        doc,
        &child_scope,
    ));

    let pixmap = crate::render::rasterize(&picture, img_size.width(), img_size.height())
        .log_none(|| log::warn!("Failed to allocate a pattern tile."))?;

    let tile = scope.register_tile(Tile { pixmap, transform });
    Some(ResolvedPaint::Tile(tile))
}

/// Walks the pattern inheritance chain.
///
/// The chain is linear; a server seen twice terminates the walk so
/// self-referential documents cannot hang the renderer.
fn collect_chain(pattern: &Rc<Pattern>, doc: &Document) -> Vec<Rc<Pattern>> {
    let mut chain = vec![pattern.clone()];
    let mut current = pattern.clone();

    loop {
        let next = match current.links_to {
            Some(ref id) => doc.find(id),
            None => None,
        };

        match next {
            Some(Paint::Pattern(next)) => {
                if chain.iter().any(|p| Rc::ptr_eq(p, &next)) {
                    break;
                }

                chain.push(next.clone());
                current = next;
            }
            _ => break,
        }
    }

    chain
}

fn find_attr<T>(chain: &[Rc<Pattern>], f: impl Fn(&Pattern) -> Option<T>) -> Option<T> {
    chain.iter().find_map(|p| f(p.as_ref()))
}
