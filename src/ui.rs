use crate::app::{App, SIDE_PANEL_WIDTH};
use crate::braille::BrailleCanvas;
use crate::category::terminal_color;
use crate::map::Label;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Widget, Wrap},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map and side panel
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(rows[0]);

    render_map(frame, app, columns[0]);
    render_side_panel(frame, app, columns[1]);
    render_status_bar(frame, app, rows[1]);
}

fn panel(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Printable Map");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut canvas = BrailleCanvas::new(inner.width as usize, inner.height as usize);
    let selected = app.selected_marker().map(|m| m.layer_id);
    let labels = app
        .renderer
        .render(&mut canvas, &app.viewport, app.map.markers(), selected);

    frame.render_widget(MapWidget { canvas, labels }, inner);
}

/// Braille layer with ordinal badges overlaid
struct MapWidget {
    canvas: BrailleCanvas,
    labels: Vec<Label>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (col, row, ch, color) in self.canvas.cells() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)]
                .set_char(ch)
                .set_fg(color);
        }

        let badge = Style::default().fg(Color::Black).add_modifier(Modifier::BOLD);
        for label in &self.labels {
            if label.y >= area.height {
                continue;
            }
            for (i, ch) in label.text.chars().enumerate() {
                let x = label.x as usize + i;
                if x >= area.width as usize {
                    break;
                }
                buf[(area.x + x as u16, area.y + label.y)]
                    .set_char(ch)
                    .set_style(badge.bg(label.color));
            }
        }
    }
}

fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let legend_height = if app.show_legend {
        app.map.legends().len() as u16 + 2
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(legend_height),
            Constraint::Min(3),
            Constraint::Length(6),
        ])
        .split(area);

    if app.show_legend {
        let lines: Vec<Line> = app
            .map
            .legends()
            .iter()
            .map(|legend| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(terminal_color(&legend.color))),
                    Span::raw(legend.name.clone()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(panel("Legend")), chunks[0]);
    }

    let items: Vec<ListItem> = app
        .entries()
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>3} ", entry.number),
                    Style::default()
                        .fg(Color::Black)
                        .bg(terminal_color(&entry.color)),
                ),
                Span::raw(format!(" {}", entry.name)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(panel("Points"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(app.selected);
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let popup = match app.selected_marker() {
        Some(marker) => vec![
            Line::from(Span::styled(
                marker.popup.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(marker.popup.description.clone()),
        ],
        None => vec![Line::from(Span::styled(
            "Tab to select a point",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(
        Paragraph::new(popup)
            .wrap(Wrap { trim: true })
            .block(panel("Details")),
        chunks[2],
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.renderer.settings;
    let toggle = |on: bool, text: &'static str| {
        Span::styled(
            text,
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        toggle(settings.show_numbers, "[n]umbers "),
        toggle(settings.show_graticule, "[g]rid "),
        toggle(app.show_legend, "[L]egend "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | #", Style::default().fg(Color::DarkGray)),
        Span::styled(app.fragment().to_string(), Style::default().fg(Color::Magenta)),
    ];
    if let Some(updated) = app.map.updated() {
        spans.push(Span::styled(
            format!(" | Updated: {updated}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom Tab:select r:fit q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
