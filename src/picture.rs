// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Draw-command capture and replay.
//!
//! A [`Picture`] is a flat, ordered list of primitive draw commands with
//! explicit nesting via save/restore markers. It can be replayed against
//! any [`DrawContext`]: a raster target, a retained-mode UI drawing
//! context, or a mock in tests.

use std::rc::Rc;

use tiny_skia::{FillRule, FilterQuality, Path, Pixmap, Point, Rect, Size, Transform};

use crate::style::{Brush, Pen};
use crate::tree::Opacity;

/// Pre-shaped text ready to be drawn.
///
/// Text shaping is out of scope of this crate; raster targets without
/// font access skip text commands.
#[derive(Clone, Debug)]
pub struct FormattedText {
    /// The text content.
    pub text: String,

    /// Font size in device units.
    pub font_size: f32,
}

/// A single recorded draw operation.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum DrawCommand {
    Save,
    Restore,
    SaveLayer(Opacity),
    SetTransform(Transform),
    ClipRect(Rect),
    ClipPath(Rc<Path>),
    DrawGeometry {
        brush: Option<Brush>,
        pen: Option<Pen>,
        fill_rule: FillRule,
        path: Rc<Path>,
    },
    DrawLine {
        pen: Pen,
        p1: Point,
        p2: Point,
    },
    DrawRect {
        brush: Option<Brush>,
        pen: Option<Pen>,
        rect: Rect,
        rx: f32,
        ry: f32,
    },
    DrawText {
        brush: Brush,
        origin: Point,
        text: FormattedText,
    },
    DrawImage {
        image: Rc<Pixmap>,
        src: Rect,
        dst: Rect,
        quality: FilterQuality,
    },
}

/// A replay target.
///
/// Scoped push operations return a state token; [`DrawContext::pop`]
/// receives tokens back in reverse push order when the enclosing
/// save frame is restored.
pub trait DrawContext {
    /// A token undoing one scoped push operation.
    type State;

    /// Intersects the clip with a rectangle.
    fn push_clip_rect(&mut self, rect: Rect) -> Self::State;
    /// Intersects the clip with an arbitrary geometry.
    fn push_clip_path(&mut self, path: &Path) -> Self::State;
    /// Replaces the current transform.
    fn push_transform(&mut self, ts: Transform) -> Self::State;
    /// Starts a compositing layer with an opacity.
    fn push_layer(&mut self, opacity: Opacity) -> Self::State;
    /// Undoes one push operation.
    fn pop(&mut self, state: Self::State);

    /// Fills and/or strokes a geometry.
    fn draw_geometry(
        &mut self,
        brush: Option<&Brush>,
        pen: Option<&Pen>,
        fill_rule: FillRule,
        path: &Path,
    );
    /// Strokes a line.
    fn draw_line(&mut self, pen: &Pen, p1: Point, p2: Point);
    /// Fills and/or strokes a rectangle, optionally rounded.
    fn draw_rect(&mut self, brush: Option<&Brush>, pen: Option<&Pen>, rect: Rect, rx: f32, ry: f32);
    /// Draws pre-shaped text.
    fn draw_text(&mut self, brush: &Brush, origin: Point, text: &FormattedText);
    /// Draws a sub-rectangle of an image into a destination rectangle.
    fn draw_image(&mut self, image: &Pixmap, src: Rect, dst: Rect, quality: FilterQuality);
}

/// A stack of save frames, each holding the pop tokens pending for
/// its matching restore.
///
/// Kept separate from the command representation so the replay nesting
/// logic can be exercised without any drawing backend.
#[derive(Debug)]
pub struct StateStack<T> {
    frames: Vec<Vec<T>>,
}

impl<T> StateStack<T> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        StateStack { frames: Vec::new() }
    }

    /// Opens a new save frame.
    pub fn open_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Appends a pop token to the current frame.
    ///
    /// # Panics
    ///
    /// When no frame is open. Such a command list is malformed and
    /// replaying further would desynchronize the context state.
    pub fn push(&mut self, state: T) {
        self.frames
            .last_mut()
            .expect("state pushed outside of a save frame")
            .push(state);
    }

    /// Closes the current frame, returning its tokens in push order.
    ///
    /// # Panics
    ///
    /// On a restore that does not match any save.
    pub fn close_frame(&mut self) -> Vec<T> {
        self.frames
            .pop()
            .expect("restore does not match any save")
    }

    /// Checks that no frame is open.
    pub fn is_balanced(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<T> Default for StateStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A replayable sequence of draw commands.
///
/// Owns every resource embedded in its commands (pattern tiles through
/// brushes, image pixmaps); they are released when the picture is dropped.
#[derive(Debug)]
pub struct Picture {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl Picture {
    /// Creates a picture from an already built command list.
    ///
    /// Commands produced by [`PictureRecorder`] are always balanced;
    /// hand-built lists are validated during [`Picture::replay`].
    pub fn new(size: Size, commands: Vec<DrawCommand>) -> Self {
        Picture { size, commands }
    }

    /// The recorded content size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// The recorded commands, in draw order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Replays the picture against a drawing context.
    ///
    /// Clip, transform and layer state established between a save and
    /// its restore is undone, in reverse order, when the restore is
    /// replayed.
    ///
    /// # Panics
    ///
    /// On a malformed command list: a `Restore` without a matching
    /// `Save`, or a scoped push outside of any save frame.
    pub fn replay<C: DrawContext>(&self, ctx: &mut C) {
        let mut states = StateStack::new();

        for command in &self.commands {
            match command {
                DrawCommand::Save => states.open_frame(),
                DrawCommand::SaveLayer(opacity) => {
                    states.open_frame();
                    let state = ctx.push_layer(*opacity);
                    states.push(state);
                }
                DrawCommand::Restore => {
                    for state in states.close_frame().into_iter().rev() {
                        ctx.pop(state);
                    }
                }
                DrawCommand::SetTransform(ts) => {
                    let state = ctx.push_transform(*ts);
                    states.push(state);
                }
                DrawCommand::ClipRect(rect) => {
                    let state = ctx.push_clip_rect(*rect);
                    states.push(state);
                }
                DrawCommand::ClipPath(ref path) => {
                    let state = ctx.push_clip_path(path);
                    states.push(state);
                }
                DrawCommand::DrawGeometry {
                    ref brush,
                    ref pen,
                    fill_rule,
                    ref path,
                } => ctx.draw_geometry(brush.as_ref(), pen.as_ref(), *fill_rule, path),
                DrawCommand::DrawLine { ref pen, p1, p2 } => ctx.draw_line(pen, *p1, *p2),
                DrawCommand::DrawRect {
                    ref brush,
                    ref pen,
                    rect,
                    rx,
                    ry,
                } => ctx.draw_rect(brush.as_ref(), pen.as_ref(), *rect, *rx, *ry),
                DrawCommand::DrawText {
                    ref brush,
                    origin,
                    ref text,
                } => ctx.draw_text(brush, *origin, text),
                DrawCommand::DrawImage {
                    ref image,
                    src,
                    dst,
                    quality,
                } => ctx.draw_image(image, *src, *dst, *quality),
            }
        }
    }
}

/// Records draw commands into a [`Picture`].
#[derive(Debug, Default)]
pub struct PictureRecorder {
    commands: Vec<DrawCommand>,
    depth: usize,
}

impl PictureRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        PictureRecorder::default()
    }

    /// Opens a save frame.
    pub fn save(&mut self) {
        self.depth += 1;
        self.commands.push(DrawCommand::Save);
    }

    /// Opens a save frame with a compositing layer.
    pub fn save_layer(&mut self, opacity: Opacity) {
        self.depth += 1;
        self.commands.push(DrawCommand::SaveLayer(opacity));
    }

    /// Closes the innermost save frame.
    ///
    /// # Panics
    ///
    /// When there is no open frame to close.
    pub fn restore(&mut self) {
        assert!(self.depth > 0, "restore does not match any save");
        self.depth -= 1;
        self.commands.push(DrawCommand::Restore);
    }

    /// Records a transform replacement.
    pub fn set_transform(&mut self, ts: Transform) {
        self.commands.push(DrawCommand::SetTransform(ts));
    }

    /// Records a rectangular clip.
    pub fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClipRect(rect));
    }

    /// Records a geometry clip.
    pub fn clip_path(&mut self, path: Rc<Path>) {
        self.commands.push(DrawCommand::ClipPath(path));
    }

    /// Records a geometry draw.
    pub fn draw_geometry(
        &mut self,
        brush: Option<Brush>,
        pen: Option<Pen>,
        fill_rule: FillRule,
        path: Rc<Path>,
    ) {
        self.commands.push(DrawCommand::DrawGeometry {
            brush,
            pen,
            fill_rule,
            path,
        });
    }

    /// Records a line draw.
    pub fn draw_line(&mut self, pen: Pen, p1: Point, p2: Point) {
        self.commands.push(DrawCommand::DrawLine { pen, p1, p2 });
    }

    /// Records a rectangle draw.
    pub fn draw_rect(
        &mut self,
        brush: Option<Brush>,
        pen: Option<Pen>,
        rect: Rect,
        rx: f32,
        ry: f32,
    ) {
        self.commands.push(DrawCommand::DrawRect {
            brush,
            pen,
            rect,
            rx,
            ry,
        });
    }

    /// Records a text draw.
    pub fn draw_text(&mut self, brush: Brush, origin: Point, text: FormattedText) {
        self.commands.push(DrawCommand::DrawText {
            brush,
            origin,
            text,
        });
    }

    /// Records an image draw.
    pub fn draw_image(&mut self, image: Rc<Pixmap>, src: Rect, dst: Rect, quality: FilterQuality) {
        self.commands.push(DrawCommand::DrawImage {
            image,
            src,
            dst,
            quality,
        });
    }

    /// Finishes the recording.
    ///
    /// # Panics
    ///
    /// When save frames are left open.
    pub fn finish(self, size: Size) -> Picture {
        assert!(self.depth == 0, "unbalanced save/restore in a recording");
        Picture {
            size,
            commands: self.commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_close_in_reverse_order() {
        let mut stack = StateStack::new();
        stack.open_frame();
        stack.push(1);
        stack.open_frame();
        stack.push(2);
        stack.push(3);

        assert_eq!(stack.close_frame(), vec![2, 3]);
        assert_eq!(stack.close_frame(), vec![1]);
        assert!(stack.is_balanced());
    }

    #[test]
    #[should_panic(expected = "restore does not match any save")]
    fn unbalanced_close_panics() {
        let mut stack = StateStack::<u32>::new();
        stack.close_frame();
    }

    #[test]
    #[should_panic(expected = "state pushed outside of a save frame")]
    fn push_without_frame_panics() {
        let mut stack = StateStack::new();
        stack.push(1);
    }

    #[test]
    #[should_panic(expected = "restore does not match any save")]
    fn recorder_rejects_stray_restore() {
        let mut rec = PictureRecorder::new();
        rec.restore();
    }
}
