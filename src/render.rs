// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Element recording and raster replay.

use tiny_skia::{
    FillRule, FilterQuality, Mask, Path, PathBuilder, Pixmap, PixmapMut, PixmapPaint, Point, Rect,
    Size, Transform,
};

use crate::picture::{DrawContext, FormattedText, Picture, PictureRecorder};
use crate::scope::RenderScope;
use crate::style::{self, Brush, Pen};
use crate::tree::{self, Document, Element, Opacity, Visibility};

/// Records elements into a picture.
///
/// The content is recorded under `transform`, wrapped into a compositing
/// layer when `opacity` is below one and the ignore flag is not set.
/// Every element's fill and stroke resolve independently; an element
/// whose both resolve into do-not-draw contributes nothing.
#[allow(clippy::too_many_arguments)]
pub fn record_picture(
    children: &[Element],
    width: f32,
    height: f32,
    transform: Transform,
    opacity: Opacity,
    ignore_opacity: bool,
    doc: &Document,
    scope: &RenderScope,
) -> Picture {
    let mut rec = PictureRecorder::new();
    rec.save();
    if !transform.is_identity() {
        rec.set_transform(transform);
    }

    let layer = if ignore_opacity {
        None
    } else {
        style::opacity_layer(opacity.get())
    };
    if let Some(opacity) = layer {
        rec.save_layer(opacity);
    }

    for element in children {
        record_element(element, transform, ignore_opacity, doc, scope, &mut rec);
    }

    if layer.is_some() {
        rec.restore();
    }
    rec.restore();

    // The cull size. A degenerate one is pinned to a single pixel.
    let size = Size::from_wh(width, height).unwrap_or_else(|| Size::from_wh(1.0, 1.0).unwrap());
    rec.finish(size)
}

fn record_element(
    element: &Element,
    parent_transform: Transform,
    ignore_opacity: bool,
    doc: &Document,
    scope: &RenderScope,
    rec: &mut PictureRecorder,
) {
    if element.visibility != Visibility::Visible {
        return;
    }

    let bbox = match element.path.compute_tight_bounds() {
        Some(bbox) => bbox,
        None => return,
    };

    // Fill and stroke are resolved before any command is recorded,
    // so a not-drawable element leaves no trace in the picture.
    let brush = if style::is_valid_fill(element) {
        style::fill_brush(element, bbox, ignore_opacity, doc, scope)
    } else {
        None
    };
    let pen = if style::is_valid_stroke(element, bbox, doc) {
        style::stroke_pen(element, bbox, ignore_opacity, doc, scope)
    } else {
        None
    };

    if brush.is_none() && pen.is_none() {
        return;
    }

    rec.save();
    if !element.transform.is_identity() {
        rec.set_transform(parent_transform.pre_concat(element.transform));
    }

    let layer = if ignore_opacity {
        None
    } else {
        style::opacity_layer(element.opacity)
    };
    if let Some(opacity) = layer {
        rec.save_layer(opacity);
    }

    let fill_rule = match element.fill_rule {
        tree::FillRule::NonZero => FillRule::Winding,
        tree::FillRule::EvenOdd => FillRule::EvenOdd,
    };
    rec.draw_geometry(brush, pen, fill_rule, element.path.clone());

    if layer.is_some() {
        rec.restore();
    }
    rec.restore();
}

/// Replays a picture into a freshly allocated pixmap.
pub fn rasterize(picture: &Picture, width: u32, height: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;

    {
        let mut ctx = RasterContext::new(pixmap.as_mut());
        picture.replay(&mut ctx);
    }

    Some(pixmap)
}

struct Layer {
    pixmap: Pixmap,
    opacity: Opacity,
}

/// A pop token of [`RasterContext`].
pub enum RasterState {
    /// Restores the previous transform.
    Transform(Transform),
    /// Restores the previous clip mask.
    Clip(Option<Mask>),
    /// Composites the topmost layer into its parent.
    Layer {
        /// Whether a layer pixmap was actually allocated.
        composited: bool,
    },
}

/// A [`DrawContext`] drawing into a tiny-skia pixmap.
pub struct RasterContext<'a> {
    target: PixmapMut<'a>,
    transform: Transform,
    clip: Option<Mask>,
    layers: Vec<Layer>,
}

impl<'a> RasterContext<'a> {
    /// Creates a context drawing into `target`.
    pub fn new(target: PixmapMut<'a>) -> Self {
        RasterContext {
            target,
            transform: Transform::default(),
            clip: None,
            layers: Vec::new(),
        }
    }

    fn width(&self) -> u32 {
        self.target.width()
    }

    fn height(&self) -> u32 {
        self.target.height()
    }

    fn intersect_clip(&mut self, path: &Path, fill_rule: FillRule) {
        match self.clip.as_mut() {
            Some(mask) => mask.intersect_path(path, fill_rule, true, self.transform),
            None => {
                if let Some(mut mask) = Mask::new(self.target.width(), self.target.height()) {
                    mask.fill_path(path, fill_rule, true, self.transform);
                    self.clip = Some(mask);
                }
            }
        }
    }

    fn fill(&mut self, path: &Path, paint: &tiny_skia::Paint, fill_rule: FillRule) {
        let transform = self.transform;
        match self.layers.last_mut() {
            Some(layer) => {
                layer
                    .pixmap
                    .fill_path(path, paint, fill_rule, transform, self.clip.as_ref())
            }
            None => self
                .target
                .fill_path(path, paint, fill_rule, transform, self.clip.as_ref()),
        }
    }

    fn stroke(&mut self, path: &Path, paint: &tiny_skia::Paint, stroke: &tiny_skia::Stroke) {
        let transform = self.transform;
        match self.layers.last_mut() {
            Some(layer) => {
                layer
                    .pixmap
                    .stroke_path(path, paint, stroke, transform, self.clip.as_ref())
            }
            None => self
                .target
                .stroke_path(path, paint, stroke, transform, self.clip.as_ref()),
        }
    }

    fn blit(&mut self, pixmap: &Pixmap, paint: &PixmapPaint, transform: Transform) {
        match self.layers.last_mut() {
            Some(layer) => {
                let mut target = layer.pixmap.as_mut();
                target.draw_pixmap(0, 0, pixmap.as_ref(), paint, transform, self.clip.as_ref());
            }
            None => {
                self.target
                    .draw_pixmap(0, 0, pixmap.as_ref(), paint, transform, self.clip.as_ref())
            }
        }
    }
}

impl DrawContext for RasterContext<'_> {
    type State = RasterState;

    fn push_clip_rect(&mut self, rect: Rect) -> RasterState {
        let prev = self.clip.clone();
        let path = PathBuilder::from_rect(rect);
        self.intersect_clip(&path, FillRule::Winding);
        RasterState::Clip(prev)
    }

    fn push_clip_path(&mut self, path: &Path) -> RasterState {
        let prev = self.clip.clone();
        self.intersect_clip(path, FillRule::Winding);
        RasterState::Clip(prev)
    }

    fn push_transform(&mut self, ts: Transform) -> RasterState {
        let prev = self.transform;
        self.transform = ts;
        RasterState::Transform(prev)
    }

    fn push_layer(&mut self, opacity: Opacity) -> RasterState {
        match Pixmap::new(self.width(), self.height()) {
            Some(pixmap) => {
                self.layers.push(Layer { pixmap, opacity });
                RasterState::Layer { composited: true }
            }
            None => {
                log::warn!("Failed to allocate a compositing layer.");
                RasterState::Layer { composited: false }
            }
        }
    }

    fn pop(&mut self, state: RasterState) {
        match state {
            RasterState::Transform(ts) => self.transform = ts,
            RasterState::Clip(clip) => self.clip = clip,
            RasterState::Layer { composited: false } => {}
            RasterState::Layer { composited: true } => {
                let layer = match self.layers.pop() {
                    Some(layer) => layer,
                    None => return,
                };

                let paint = PixmapPaint {
                    opacity: layer.opacity.get(),
                    blend_mode: tiny_skia::BlendMode::SourceOver,
                    quality: FilterQuality::Nearest,
                };

                // Clips established inside the layer are already popped
                // at this point, so the outer clip applies, as it would
                // have at the matching save.
                self.blit(&layer.pixmap, &paint, Transform::identity());
            }
        }
    }

    fn draw_geometry(
        &mut self,
        brush: Option<&Brush>,
        pen: Option<&Pen>,
        fill_rule: FillRule,
        path: &Path,
    ) {
        if let Some(brush) = brush {
            let paint = brush.to_paint();
            self.fill(path, &paint, fill_rule);
        }

        if let Some(pen) = pen {
            let paint = pen.to_paint();
            self.stroke(path, &paint, &pen.stroke);
        }
    }

    fn draw_line(&mut self, pen: &Pen, p1: Point, p2: Point) {
        let mut pb = PathBuilder::new();
        pb.move_to(p1.x, p1.y);
        pb.line_to(p2.x, p2.y);
        if let Some(path) = pb.finish() {
            let paint = pen.to_paint();
            self.stroke(&path, &paint, &pen.stroke);
        }
    }

    fn draw_rect(
        &mut self,
        brush: Option<&Brush>,
        pen: Option<&Pen>,
        rect: Rect,
        rx: f32,
        ry: f32,
    ) {
        let path = match round_rect_path(rect, rx, ry) {
            Some(path) => path,
            None => return,
        };

        self.draw_geometry(brush, pen, FillRule::Winding, &path);
    }

    fn draw_text(&mut self, _brush: &Brush, _origin: Point, _text: &FormattedText) {
        // Text shaping is an external collaborator; there is nothing
        // to rasterize without outlined glyphs.
        log::warn!("Text cannot be rasterized without outlined glyphs. Skipped.");
    }

    fn draw_image(&mut self, image: &Pixmap, src: Rect, dst: Rect, quality: FilterQuality) {
        if src.width() == 0.0 || src.height() == 0.0 {
            return;
        }

        let ts = self
            .transform
            .pre_translate(dst.x(), dst.y())
            .pre_scale(dst.width() / src.width(), dst.height() / src.height())
            .pre_translate(-src.x(), -src.y());

        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: tiny_skia::BlendMode::SourceOver,
            quality,
        };

        self.blit(image, &paint, ts);
    }
}

fn round_rect_path(rect: Rect, rx: f32, ry: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();

    if rx <= 0.0 || ry <= 0.0 {
        pb.push_rect(rect);
        return pb.finish();
    }

    let rx = rx.min(rect.width() / 2.0);
    let ry = ry.min(rect.height() / 2.0);

    // Circular arc approximation constant for cubic curves.
    const K: f32 = 0.5522848;
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());

    pb.move_to(l + rx, t);
    pb.line_to(r - rx, t);
    pb.cubic_to(r - rx + rx * K, t, r, t + ry - ry * K, r, t + ry);
    pb.line_to(r, b - ry);
    pb.cubic_to(r, b - ry + ry * K, r - rx + rx * K, b, r - rx, b);
    pb.line_to(l + rx, b);
    pb.cubic_to(l + rx - rx * K, b, l, b - ry + ry * K, l, b - ry);
    pb.line_to(l, t + ry);
    pb.cubic_to(l, t + ry - ry * K, l + rx - rx * K, t, l + rx, t);
    pb.close();

    pb.finish()
}
