// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svgpaint` resolves SVG fill and stroke paint into ready-to-draw backend
objects and records element content into replayable pictures.

The crate sits between a parsed SVG document model and a 2D backend:

- [`style::fill_brush`] and [`style::stroke_pen`] turn an element's
  presentation attributes and bounding box into a configured
  [`Brush`]/[`Pen`], resolving deferred paint-server references,
  gradients (with stop inheritance) and patterns along the way.
- [`render::record_picture`] records content into a [`Picture`] —
  a flat list of draw commands with explicit save/restore nesting —
  which replays against any [`DrawContext`], including the built-in
  raster one.

Resolution failures are not errors: an unresolvable or degenerate paint
yields `None` ("do not draw"), optionally rescued by the reference's
fallback color. Every backend resource produced during resolution is
owned by a caller-supplied [`RenderScope`] and released when the scope
is dropped.

SVG parsing, path construction and text shaping are out of scope.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::collapsible_else_if)]

pub mod geom;
pub mod paint_server;
pub mod pattern;
pub mod picture;
pub mod render;
pub mod scope;
pub mod style;
pub mod tree;
pub mod units;

pub use tiny_skia;

pub use crate::paint_server::ResolvedPaint;
pub use crate::picture::{DrawCommand, DrawContext, Picture, PictureRecorder};
pub use crate::render::{rasterize, record_picture, RasterContext};
pub use crate::scope::RenderScope;
pub use crate::style::{Brush, Pen};
pub use crate::tree::{Color, Document, Element, Paint};

pub(crate) trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}
