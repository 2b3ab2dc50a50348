use crate::braille::BrailleCanvas;
use crate::category::terminal_color;
use crate::map::geometry::{draw_circle, draw_line};
use crate::map::projection::Viewport;
use crate::printable::{MapSurface, Marker};
use ratatui::style::Color;

/// Graticule spacings in degrees, coarse to fine
const GRID_STEPS: [f64; 12] = [90.0, 45.0, 30.0, 10.0, 5.0, 1.0, 0.5, 0.1, 0.05, 0.01, 0.005, 0.001];
/// Upper bound on meridians drawn across the pane
const MAX_GRID_LINES: f64 = 8.0;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_graticule: bool,
    pub show_numbers: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_graticule: true,
            show_numbers: true,
        }
    }
}

/// Text placed over the Braille layer, in character cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub color: Color,
}

/// Draws the graticule and the point markers
#[derive(Default)]
pub struct MarkerRenderer {
    pub settings: DisplaySettings,
}

impl MarkerRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render onto `canvas` and return the ordinal badges to overlay
    pub fn render(
        &self,
        canvas: &mut BrailleCanvas,
        viewport: &Viewport,
        markers: &[Marker],
        selected: Option<usize>,
    ) -> Vec<Label> {
        if self.settings.show_graticule {
            self.draw_graticule(canvas, viewport);
        }

        let mut labels = Vec::new();
        for marker in markers {
            let (px, py) = viewport.project(marker.position.lng, marker.position.lat);
            if !viewport.is_visible(px, py) {
                continue;
            }
            let radius = if selected == Some(marker.layer_id) { 2 } else { 1 };
            let color = terminal_color(&marker.color);
            draw_circle(canvas, px, py, radius, color);

            if self.settings.show_numbers && marker.number > 0 {
                // Badge goes one cell right of the marker
                let char_x = (px / 2) as u16;
                let char_y = (py / 4) as u16;
                if let Some(x) = char_x.checked_add(1) {
                    labels.push(Label {
                        x,
                        y: char_y,
                        text: marker.number.to_string(),
                        color,
                    });
                }
            }
        }
        labels
    }

    fn draw_graticule(&self, canvas: &mut BrailleCanvas, viewport: &Viewport) {
        let bounds = viewport.bounds();
        let span = (bounds.ne.lng - bounds.sw.lng).max(bounds.ne.lat - bounds.sw.lat);
        // Finest spacing that stays under the line budget
        let step = GRID_STEPS
            .iter()
            .rev()
            .copied()
            .find(|s| span / s <= MAX_GRID_LINES)
            .unwrap_or(GRID_STEPS[0]);
        let (w, h) = (viewport.width as i32, viewport.height as i32);

        let mut lon = (bounds.sw.lng / step).ceil() * step;
        while lon < bounds.ne.lng {
            let (x, _) = viewport.project(lon, bounds.sw.lat);
            if viewport.line_might_be_visible((x, 0), (x, h - 1)) {
                draw_line(canvas, x, 0, x, h - 1, Color::DarkGray);
            }
            lon += step;
        }

        let mut lat = (bounds.sw.lat / step).ceil() * step;
        while lat < bounds.ne.lat {
            let (_, y) = viewport.project(bounds.sw.lng, lat);
            if viewport.line_might_be_visible((0, y), (w - 1, y)) {
                draw_line(canvas, 0, y, w - 1, y, Color::DarkGray);
            }
            lat += step;
        }
    }
}
