// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Geometry helpers shared by the paint pipeline.

use svgtypes::{Align, AspectRatio};
use tiny_skia::{NonZeroRect, Size, Transform};

/// Converts a `viewBox` into a transform that maps it onto `img_size`.
///
/// Honors the alignment and meet-or-slice parts of `preserveAspectRatio`.
pub fn view_box_to_transform(view_box: NonZeroRect, aspect: AspectRatio, img_size: Size) -> Transform {
    let vr = view_box;

    let sx = img_size.width() / vr.width();
    let sy = img_size.height() / vr.height();

    let (sx, sy) = if aspect.align == Align::None {
        (sx, sy)
    } else {
        let s = if aspect.slice {
            if sx < sy {
                sy
            } else {
                sx
            }
        } else {
            if sx > sy {
                sy
            } else {
                sx
            }
        };

        (s, s)
    };

    let x = -vr.x() * sx;
    let y = -vr.y() * sy;
    let w = img_size.width() - vr.width() * sx;
    let h = img_size.height() - vr.height() * sy;

    let (tx, ty) = aligned_pos(aspect.align, x, y, w, h);
    Transform::from_row(sx, 0.0, 0.0, sy, tx, ty)
}

/// Returns a position aligned inside a `w`x`h` area.
pub fn aligned_pos(align: Align, x: f32, y: f32, w: f32, h: f32) -> (f32, f32) {
    match align {
        Align::None => (x, y),
        Align::XMinYMin => (x, y),
        Align::XMidYMin => (x + w / 2.0, y),
        Align::XMaxYMin => (x + w, y),
        Align::XMinYMid => (x, y + h / 2.0),
        Align::XMidYMid => (x + w / 2.0, y + h / 2.0),
        Align::XMaxYMid => (x + w, y + h / 2.0),
        Align::XMinYMax => (x, y + h),
        Align::XMidYMax => (x + w / 2.0, y + h),
        Align::XMaxYMax => (x + w, y + h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_box_simple_scale() {
        let vb = NonZeroRect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
        let size = Size::from_wh(20.0, 20.0).unwrap();
        let ts = view_box_to_transform(vb, AspectRatio::default(), size);
        assert_eq!(ts, Transform::from_row(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
    }

    #[test]
    fn view_box_meet_centers() {
        let vb = NonZeroRect::from_xywh(0.0, 0.0, 10.0, 20.0).unwrap();
        let size = Size::from_wh(20.0, 20.0).unwrap();
        let ts = view_box_to_transform(vb, AspectRatio::default(), size);
        // sx = 2.0, sy = 1.0 -> meet keeps 1.0 and centers horizontally.
        assert_eq!(ts, Transform::from_row(1.0, 0.0, 0.0, 1.0, 5.0, 0.0));
    }
}
