// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Length to device value conversion.

use svgtypes::{Length, LengthUnit as Unit};
use tiny_skia::Rect;

use crate::tree::{Document, Units};

/// An axis a length is measured along.
///
/// Percentages resolve against a different base depending on it.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
    Other,
}

/// Converts a length into a device value.
///
/// `bounds` is the rectangle percentages resolve against in user space.
/// Under `Units::ObjectBoundingBox` percentages resolve to plain fractions.
pub fn convert_length(
    length: Length,
    axis: Axis,
    object_units: Units,
    bounds: Rect,
    doc: &Document,
) -> f32 {
    let dpi = doc.dpi;
    let n = length.number as f32;
    match length.unit {
        Unit::None | Unit::Px => n,
        Unit::Em => n * doc.font_size,
        Unit::Ex => n * doc.font_size / 2.0,
        Unit::In => n * dpi,
        Unit::Cm => n * dpi / 2.54,
        Unit::Mm => n * dpi / 25.4,
        Unit::Pt => n * dpi / 72.0,
        Unit::Pc => n * dpi / 6.0,
        Unit::Percent => {
            if object_units == Units::ObjectBoundingBox {
                n / 100.0
            } else {
                match axis {
                    Axis::Horizontal => convert_percent(n, bounds.width()),
                    Axis::Vertical => convert_percent(n, bounds.height()),
                    Axis::Other => {
                        let w = bounds.width();
                        let h = bounds.height();
                        let base = (w * w + h * h).sqrt() / std::f32::consts::SQRT_2;
                        convert_percent(n, base)
                    }
                }
            }
        }
    }
}

fn convert_percent(n: f32, base: f32) -> f32 {
    base * n / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new()
    }

    fn bounds() -> Rect {
        Rect::from_xywh(0.0, 0.0, 200.0, 50.0).unwrap()
    }

    #[test]
    fn plain_numbers_pass_through() {
        let len = Length::new(42.0, Unit::Px);
        let n = convert_length(len, Axis::Other, Units::UserSpaceOnUse, bounds(), &doc());
        assert_eq!(n, 42.0);
    }

    #[test]
    fn physical_units_use_dpi() {
        let len = Length::new(1.0, Unit::In);
        let n = convert_length(len, Axis::Other, Units::UserSpaceOnUse, bounds(), &doc());
        assert_eq!(n, 96.0);
    }

    #[test]
    fn percent_is_axis_relative() {
        let len = Length::new(50.0, Unit::Percent);
        let w = convert_length(len, Axis::Horizontal, Units::UserSpaceOnUse, bounds(), &doc());
        let h = convert_length(len, Axis::Vertical, Units::UserSpaceOnUse, bounds(), &doc());
        assert_eq!(w, 100.0);
        assert_eq!(h, 25.0);
    }

    #[test]
    fn percent_is_a_fraction_in_bbox_units() {
        let len = Length::new(50.0, Unit::Percent);
        let n = convert_length(len, Axis::Horizontal, Units::ObjectBoundingBox, bounds(), &doc());
        assert_eq!(n, 0.5);
    }
}
