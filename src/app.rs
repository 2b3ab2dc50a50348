use crate::data::Source;
use crate::fragment::{History, SessionHistory};
use crate::map::{MarkerRenderer, Viewport};
use crate::printable::{Marker, Poi, PoiListener, PrintableMap};
use anyhow::{Context, Result};

/// Width of the legend/list column, borders included
pub const SIDE_PANEL_WIDTH: u16 = 36;

/// One row of the numbered list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub number: usize,
    pub layer_id: usize,
    pub name: String,
    pub category: String,
    pub color: String,
}

/// Listener that keeps the latest sorted visible points for the list pane
#[derive(Debug, Default)]
pub struct PoiList {
    pub entries: Vec<ListEntry>,
}

impl PoiListener for PoiList {
    fn poi_filtered(&mut self, targets: &[&Poi]) {
        self.entries = targets
            .iter()
            .enumerate()
            .map(|(index, poi)| ListEntry {
                number: index + 1,
                layer_id: poi.layer_id,
                name: poi.name().unwrap_or_default(),
                category: poi.category.name.clone(),
                color: poi.category.color.clone().unwrap_or_default(),
            })
            .collect();
    }
}

/// Braille pixel size of the map pane for a terminal of the given size.
/// Accounts for the side panel, the map border and the status bar.
pub fn map_pixel_size(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(SIDE_PANEL_WIDTH as usize + 2);
    let inner_height = height.saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map: PrintableMap<PoiList>,
    pub history: SessionHistory,
    pub renderer: MarkerRenderer,
    pub show_legend: bool,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Index into the list pane
    pub selected: Option<usize>,
    /// Set by any viewport change, cleared when the move settles
    moved: bool,
}

impl App {
    pub fn new(width: usize, height: usize, history: SessionHistory) -> Self {
        let (pixel_width, pixel_height) = map_pixel_size(width, height);
        Self {
            viewport: Viewport::world(pixel_width, pixel_height),
            map: PrintableMap::new(Some(PoiList::default())),
            history,
            renderer: MarkerRenderer::new(),
            show_legend: true,
            should_quit: false,
            last_mouse: None,
            selected: None,
            moved: true,
        }
    }

    /// Load a data source and fit the view to it
    pub fn load(&mut self, source: &Source) -> Result<()> {
        self.map
            .load_file(source, &mut self.viewport, &self.history)
            .with_context(|| format!("failed to load {source}"))?;
        self.moved = true;
        Ok(())
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixel_size(width, height);
        self.viewport.set_size(pixel_width, pixel_height);
        self.moved = true;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.moved = true;
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.moved = true;
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.moved = true;
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
        self.moved = true;
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
        self.moved = true;
    }

    /// Fit back to the loaded data, ignoring the fragment
    pub fn refit(&mut self) {
        self.map.fit_data_bounds(&mut self.viewport);
        self.moved = true;
    }

    /// Pan by the drag delta since the last mouse position
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // One terminal cell is 2x4 Braille pixels
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Run the viewport filter if the view changed since the last settle.
    /// Returns whether it ran.
    pub fn settle(&mut self) -> bool {
        if !self.moved {
            return false;
        }
        self.moved = false;
        self.map.move_end(&self.viewport, &mut self.history);

        let len = self.entries().len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => None,
        };
        true
    }

    pub fn entries(&self) -> &[ListEntry] {
        self.map
            .listener()
            .map(|list| list.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn select_next(&mut self) {
        let len = self.entries().len();
        if len > 0 {
            self.selected = Some(self.selected.map_or(0, |i| (i + 1) % len));
        }
    }

    pub fn select_previous(&mut self) {
        let len = self.entries().len();
        if len > 0 {
            self.selected = Some(self.selected.map_or(len - 1, |i| (i + len - 1) % len));
        }
    }

    /// Marker of the selected list entry
    pub fn selected_marker(&self) -> Option<&Marker> {
        let entry = self.entries().get(self.selected?)?;
        self.map.markers().get(entry.layer_id)
    }

    pub fn toggle_numbers(&mut self) {
        self.renderer.settings.show_numbers = !self.renderer.settings.show_numbers;
    }

    pub fn toggle_graticule(&mut self) {
        self.renderer.settings.show_graticule = !self.renderer.settings.show_graticule;
    }

    pub fn toggle_legend(&mut self) {
        self.show_legend = !self.show_legend;
    }

    /// Current bounds fragment, shareable via `--view`
    pub fn fragment(&self) -> &str {
        self.history.hash()
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Terminal cell to Braille pixel, skipping the map border
fn to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}
