//! Circular progress gauge drawn with cairo

use gtk::cairo::{self, Context, FontSlant, FontWeight, LineCap};
use std::f64::consts::PI;

use crate::dashboard::{GaugeCard, Palette};

/// Requested gauge size in pixels
pub const GAUGE_SIZE: i32 = 100;
/// Ring thickness in pixels
pub const STROKE_WIDTH: f64 = 10.0;

/// Share of a full turn to fill, clamped to the ring
pub fn sweep_fraction(percent: f64) -> f64 {
    if !percent.is_finite() {
        return 0.0;
    }
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Draw a ring that fills clockwise from 12 o'clock, with the centre text on top
pub fn render_gauge(
    cr: &Context,
    card: &GaugeCard,
    palette: &Palette,
    width: f64,
    height: f64,
) -> Result<(), cairo::Error> {
    let center_x = width / 2.0;
    let center_y = height / 2.0;
    let radius = ((width.min(height) - STROKE_WIDTH) / 2.0).max(1.0);

    cr.save()?;
    cr.set_line_width(STROKE_WIDTH);

    // Track
    palette.track.apply_to_cairo(cr);
    cr.new_path();
    cr.arc(center_x, center_y, radius, 0.0, 2.0 * PI);
    cr.stroke()?;

    // Filled portion
    let fraction = sweep_fraction(card.percent);
    if fraction > 0.0 {
        let start = -PI / 2.0;
        card.color.apply_to_cairo(cr);
        cr.set_line_cap(if fraction < 1.0 { LineCap::Round } else { LineCap::Butt });
        cr.new_path();
        cr.arc(center_x, center_y, radius, start, start + fraction * 2.0 * PI);
        cr.stroke()?;
    }

    // Centre label
    palette.text.apply_to_cairo(cr);
    cr.select_font_face("Sans", FontSlant::Normal, FontWeight::Bold);
    cr.set_font_size((radius * 0.32).max(8.0));
    let extents = cr.text_extents(&card.center_text)?;
    cr.move_to(
        center_x - (extents.width() / 2.0 + extents.x_bearing()),
        center_y - (extents.height() / 2.0 + extents.y_bearing()),
    );
    cr.show_text(&card.center_text)?;

    cr.restore()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_fraction_clamps() {
        assert_eq!(sweep_fraction(60.0), 0.6);
        assert_eq!(sweep_fraction(-5.0), 0.0);
        assert_eq!(sweep_fraction(130.0), 1.0);
        assert_eq!(sweep_fraction(f64::NAN), 0.0);
    }
}
