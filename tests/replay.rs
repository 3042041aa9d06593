// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use tiny_skia::{FillRule, FilterQuality, Path, Point, Rect, Size, Transform};

use svgpaint::picture::{DrawCommand, DrawContext, FormattedText, Picture, PictureRecorder};
use svgpaint::render::{self, rasterize};
use svgpaint::scope::RenderScope;
use svgpaint::style::{Brush, Pen};
use svgpaint::tree::{Color, Document, Element, Opacity, Paint};

/// A replay target that only records what happens to it.
#[derive(Default)]
struct EventLog {
    events: Vec<String>,
}

impl DrawContext for EventLog {
    type State = String;

    fn push_clip_rect(&mut self, _rect: Rect) -> String {
        self.events.push("push clip".to_string());
        "pop clip".to_string()
    }

    fn push_clip_path(&mut self, _path: &Path) -> String {
        self.events.push("push geometry clip".to_string());
        "pop geometry clip".to_string()
    }

    fn push_transform(&mut self, _ts: Transform) -> String {
        self.events.push("push transform".to_string());
        "pop transform".to_string()
    }

    fn push_layer(&mut self, _opacity: Opacity) -> String {
        self.events.push("push layer".to_string());
        "pop layer".to_string()
    }

    fn pop(&mut self, state: String) {
        self.events.push(state);
    }

    fn draw_geometry(
        &mut self,
        _brush: Option<&Brush>,
        _pen: Option<&Pen>,
        _fill_rule: FillRule,
        _path: &Path,
    ) {
        self.events.push("draw geometry".to_string());
    }

    fn draw_line(&mut self, _pen: &Pen, _p1: Point, _p2: Point) {
        self.events.push("draw line".to_string());
    }

    fn draw_rect(
        &mut self,
        _brush: Option<&Brush>,
        _pen: Option<&Pen>,
        _rect: Rect,
        _rx: f32,
        _ry: f32,
    ) {
        self.events.push("draw rect".to_string());
    }

    fn draw_text(&mut self, _brush: &Brush, _origin: Point, _text: &FormattedText) {
        self.events.push("draw text".to_string());
    }

    fn draw_image(&mut self, _image: &tiny_skia::Pixmap, _src: Rect, _dst: Rect, _q: FilterQuality) {
        self.events.push("draw image".to_string());
    }
}

fn size() -> Size {
    Size::from_wh(10.0, 10.0).unwrap()
}

fn rect() -> Rect {
    Rect::from_xywh(1.0, 1.0, 5.0, 5.0).unwrap()
}

#[test]
fn restore_undoes_the_clip() {
    let mut rec = PictureRecorder::new();
    rec.save();
    rec.clip_rect(rect());
    rec.draw_rect(None, None, rect(), 0.0, 0.0);
    rec.restore();
    let picture = rec.finish(size());

    let mut log = EventLog::default();
    picture.replay(&mut log);

    assert_eq!(
        log.events,
        vec!["push clip", "draw rect", "pop clip"]
    );
}

#[test]
fn nested_state_pops_in_reverse_order() {
    let mut rec = PictureRecorder::new();
    rec.save();
    rec.set_transform(Transform::from_translate(1.0, 0.0));
    rec.clip_rect(rect());
    rec.draw_rect(None, None, rect(), 0.0, 0.0);
    rec.restore();
    let picture = rec.finish(size());

    let mut log = EventLog::default();
    picture.replay(&mut log);

    assert_eq!(
        log.events,
        vec![
            "push transform",
            "push clip",
            "draw rect",
            "pop clip",
            "pop transform",
        ]
    );
}

#[test]
fn save_layer_establishes_a_layer() {
    let mut rec = PictureRecorder::new();
    rec.save_layer(Opacity::new_clamped(0.5));
    rec.draw_rect(None, None, rect(), 0.0, 0.0);
    rec.restore();
    let picture = rec.finish(size());

    let mut log = EventLog::default();
    picture.replay(&mut log);

    assert_eq!(log.events, vec!["push layer", "draw rect", "pop layer"]);
}

#[test]
#[should_panic(expected = "restore does not match any save")]
fn stray_restore_is_an_invariant_violation() {
    let picture = Picture::new(size(), vec![DrawCommand::Restore]);
    let mut log = EventLog::default();
    picture.replay(&mut log);
}

#[test]
#[should_panic(expected = "state pushed outside of a save frame")]
fn clip_outside_a_frame_is_an_invariant_violation() {
    let picture = Picture::new(size(), vec![DrawCommand::ClipRect(rect())]);
    let mut log = EventLog::default();
    picture.replay(&mut log);
}

fn red_square(w: f32, h: f32) -> Element {
    let rect = Rect::from_xywh(0.0, 0.0, w, h).unwrap();
    let mut element = Element::new(Rc::new(tiny_skia::PathBuilder::from_rect(rect)));
    element.fill = Paint::Color(Color::new_rgb(255, 0, 0));
    element
}

#[test]
fn recorded_elements_rasterize() {
    let doc = Document::new();
    let scope = RenderScope::new();

    let picture = render::record_picture(
        &[red_square(10.0, 10.0)],
        10.0,
        10.0,
        Transform::identity(),
        Opacity::ONE,
        false,
        &doc,
        &scope,
    );

    let pixmap = rasterize(&picture, 10, 10).unwrap();
    let pixel = pixmap.pixel(5, 5).unwrap();
    assert_eq!(pixel.red(), 255);
    assert_eq!(pixel.alpha(), 255);
}

#[test]
fn element_opacity_composites_as_a_layer() {
    let doc = Document::new();
    let scope = RenderScope::new();

    let mut element = red_square(10.0, 10.0);
    element.opacity = 0.5;

    let picture = render::record_picture(
        &[element],
        10.0,
        10.0,
        Transform::identity(),
        Opacity::ONE,
        false,
        &doc,
        &scope,
    );

    assert!(picture
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::SaveLayer(_))));

    let pixmap = rasterize(&picture, 10, 10).unwrap();
    let pixel = pixmap.pixel(5, 5).unwrap();
    assert!((126..=129).contains(&pixel.alpha()));
}

#[test]
fn ignored_opacity_skips_the_layer() {
    let doc = Document::new();
    let scope = RenderScope::new();

    let mut element = red_square(10.0, 10.0);
    element.opacity = 0.5;

    let picture = render::record_picture(
        &[element],
        10.0,
        10.0,
        Transform::identity(),
        Opacity::new_clamped(0.25),
        true,
        &doc,
        &scope,
    );

    assert!(!picture
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::SaveLayer(_))));
}

#[test]
fn hidden_elements_record_nothing() {
    let doc = Document::new();
    let scope = RenderScope::new();

    let mut element = red_square(10.0, 10.0);
    element.visibility = svgpaint::tree::Visibility::Hidden;

    let picture = render::record_picture(
        &[element],
        10.0,
        10.0,
        Transform::identity(),
        Opacity::ONE,
        false,
        &doc,
        &scope,
    );

    assert!(!picture
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::DrawGeometry { .. })));
}

#[test]
fn element_transform_positions_content() {
    let doc = Document::new();
    let scope = RenderScope::new();

    let mut element = red_square(2.0, 2.0);
    element.transform = Transform::from_translate(6.0, 6.0);

    let picture = render::record_picture(
        &[element],
        10.0,
        10.0,
        Transform::identity(),
        Opacity::ONE,
        false,
        &doc,
        &scope,
    );

    let pixmap = rasterize(&picture, 10, 10).unwrap();
    assert!(pixmap.pixel(1, 1).unwrap().alpha() == 0);
    assert_eq!(pixmap.pixel(7, 7).unwrap().red(), 255);
}

#[test]
fn clipped_drawing_stays_inside_the_clip() {
    let mut rec = PictureRecorder::new();

    let brush = solid_brush(Color::new_rgb(0, 255, 0));
    let full = Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
    let clip = Rect::from_xywh(0.0, 0.0, 4.0, 4.0).unwrap();

    rec.save();
    rec.clip_rect(clip);
    rec.draw_rect(Some(brush), None, full, 0.0, 0.0);
    rec.restore();

    // After the restore the clip must be gone.
    let brush = solid_brush(Color::new_rgb(0, 255, 0));
    let outside = Rect::from_xywh(8.0, 8.0, 2.0, 2.0).unwrap();
    rec.save();
    rec.draw_rect(Some(brush), None, outside, 0.0, 0.0);
    rec.restore();

    let picture = rec.finish(size());
    let pixmap = rasterize(&picture, 10, 10).unwrap();

    assert_eq!(pixmap.pixel(2, 2).unwrap().green(), 255);
    // Clipped out.
    assert_eq!(pixmap.pixel(6, 6).unwrap().alpha(), 0);
    // Drawn after the clip was popped.
    assert_eq!(pixmap.pixel(9, 9).unwrap().green(), 255);
}

#[test]
fn lines_replay_with_the_pen_width() {
    let doc = Document::new();
    let scope = RenderScope::new();

    let mut element = red_square(10.0, 10.0);
    element.stroke = Paint::Color(Color::new_rgb(255, 255, 255));
    element.stroke_width = svgtypes::Length::new(2.0, svgtypes::LengthUnit::None);
    let pen = svgpaint::style::stroke_pen(
        &element,
        Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(),
        false,
        &doc,
        &scope,
    )
    .unwrap();

    let mut rec = PictureRecorder::new();
    rec.save();
    rec.draw_line(pen, Point::from_xy(0.0, 5.0), Point::from_xy(10.0, 5.0));
    rec.restore();

    let pixmap = rasterize(&rec.finish(size()), 10, 10).unwrap();
    assert_eq!(pixmap.pixel(5, 5).unwrap().red(), 255);
    assert_eq!(pixmap.pixel(5, 1).unwrap().alpha(), 0);
}

#[test]
fn images_replay_into_their_destination() {
    let mut source = tiny_skia::Pixmap::new(2, 2).unwrap();
    source.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));

    let mut rec = PictureRecorder::new();
    rec.save();
    rec.draw_image(
        Rc::new(source),
        Rect::from_xywh(0.0, 0.0, 2.0, 2.0).unwrap(),
        Rect::from_xywh(4.0, 4.0, 4.0, 4.0).unwrap(),
        FilterQuality::Nearest,
    );
    rec.restore();

    let picture = rec.finish(size());
    let pixmap = rasterize(&picture, 10, 10).unwrap();

    assert_eq!(pixmap.pixel(1, 1).unwrap().alpha(), 0);
    assert_eq!(pixmap.pixel(5, 5).unwrap().blue(), 255);
}

fn solid_brush(color: Color) -> Brush {
    let doc = Document::new();
    let scope = RenderScope::new();
    let mut element = red_square(10.0, 10.0);
    element.fill = Paint::Color(color);
    svgpaint::style::fill_brush(
        &element,
        Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(),
        false,
        &doc,
        &scope,
    )
    .unwrap()
}
