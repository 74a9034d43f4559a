use crate::gui::theme::ThemeColors;
use arc_knob::ArcGeometry;
use cairo::Context;
use std::f64::consts::PI;

/// What the draw function needs, shared between the surface and GTK.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scene {
    pub arc: Option<ArcGeometry>,
    pub stroke_width: f64,
    pub focused: bool,
}

/// Compass degrees (0 up, clockwise) to cairo radians (0 right, clockwise).
fn to_cairo(degrees: f64) -> f64 {
    (degrees - 90.0).to_radians()
}

pub fn draw(cr: &Context, scene: &Scene, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let Some(arc) = scene.arc else {
        return Ok(());
    };
    if arc.radius <= 0.0 {
        return Ok(());
    }

    cr.set_line_width(scene.stroke_width);
    cr.set_line_cap(cairo::LineCap::Round);

    let (r, g, b, a) = colors.track.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.arc(arc.center.x, arc.center.y, arc.radius, 0.0, 2.0 * PI);
    cr.stroke()?;

    if arc.end_angle > arc.start_angle {
        let (r, g, b, a) = colors.value.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.arc(
            arc.center.x,
            arc.center.y,
            arc.radius,
            to_cairo(arc.start_angle),
            to_cairo(arc.end_angle),
        );
        cr.stroke()?;
    }

    if scene.focused {
        let (r, g, b, a) = colors.focus.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.set_line_width(1.0);
        cr.arc(
            arc.center.x,
            arc.center.y,
            arc.radius + scene.stroke_width,
            0.0,
            2.0 * PI,
        );
        cr.stroke()?;
    }
    Ok(())
}
