//! TUI rendering for the navigation widget.
//!
//! Map canvas on the left; search, directions inputs and the step list on
//! the right; a status line at the bottom. Notices are drawn last as a
//! centred popup over everything else.

use crate::app::{App, InputMode, PlaceInput, PlaceTarget};
use crate::geo::Coordinate;
use ratatui::{
    prelude::*,
    widgets::canvas::{Canvas, Line as CanvasLine, Map, MapResolution, Points},
    widgets::*,
};

/// Map centre used before any location or search is known.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(20.0, 78.0);

const ACCENT: Color = Color::Rgb(255, 143, 177);
const HIGHLIGHT_BG: Color = Color::Rgb(60, 30, 45);

/// Renders one frame of the TUI based on current application state.
pub fn render(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.size());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);

    render_map(f, app, chunks[0]);
    render_controls(f, app, chunks[1]);
    render_status(f, app, rows[1]);

    if let Some(ref notice) = app.notice {
        render_notice(f, notice);
    }
}

/// Lon/lat bounds of the map viewport: the route when there is one,
/// otherwise a fixed span around the best known point.
pub fn viewport(app: &App, aspect: f64) -> ([f64; 2], [f64; 2]) {
    if let Some(route) = app.route.as_ref().filter(|r| !r.overlay.is_empty()) {
        let mut points: Vec<Coordinate> = route.overlay.clone();
        points.extend(app.tracking.current_location);
        return fit_bounds(&points, aspect);
    }

    let center = app
        .search_result
        .as_ref()
        .map(|s| s.coordinate)
        .or(app.tracking.current_location)
        .unwrap_or(DEFAULT_CENTER);
    let half_lat = app.config.ui.map_span_degrees / 2.0;
    let half_lng = half_lat * aspect;
    (
        [center.lng - half_lng, center.lng + half_lng],
        [center.lat - half_lat, center.lat + half_lat],
    )
}

fn fit_bounds(points: &[Coordinate], aspect: f64) -> ([f64; 2], [f64; 2]) {
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
    }

    // 10% margin, and never collapse to a single point
    let span_lat = ((max_lat - min_lat) * 1.1).max(0.002);
    let span_lng = ((max_lng - min_lng) * 1.1).max(0.002);
    // Keep the canvas aspect so the route isn't stretched
    let (span_lat, span_lng) = if span_lng / aspect > span_lat {
        (span_lng / aspect, span_lng)
    } else {
        (span_lat, span_lat * aspect)
    };

    let mid_lat = (min_lat + max_lat) / 2.0;
    let mid_lng = (min_lng + max_lng) / 2.0;
    (
        [mid_lng - span_lng / 2.0, mid_lng + span_lng / 2.0],
        [mid_lat - span_lat / 2.0, mid_lat + span_lat / 2.0],
    )
}

fn render_map(f: &mut Frame, app: &App, area: Rect) {
    // Terminal cells are about twice as tall as wide.
    let aspect = if area.height > 2 {
        f64::from(area.width.saturating_sub(2)) / (2.0 * f64::from(area.height - 2))
    } else {
        1.0
    };
    let (x_bounds, y_bounds) = viewport(app, aspect);

    let title = match app.route.as_ref().and_then(|r| r.raw.headline()) {
        Some((distance, duration)) => format!(" Map │ {} · {} ", distance, duration),
        None => " Map ".to_string(),
    };

    let step_points: Vec<(f64, f64)> = app.steps.iter().map(|s| (s.start.lng, s.start.lat)).collect();
    let current_step = app.tracking.current_step.and_then(|i| app.steps.get(i));

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT)),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            // Landmass outlines
            ctx.draw(&Map {
                color: Color::Rgb(50, 50, 50),
                resolution: MapResolution::High,
            });
            ctx.layer();

            // Route overlay
            if let Some(route) = &app.route {
                for pair in route.overlay.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: pair[0].lng,
                        y1: pair[0].lat,
                        x2: pair[1].lng,
                        y2: pair[1].lat,
                        color: Color::Cyan,
                    });
                }
                ctx.draw(&Points {
                    coords: &step_points,
                    color: Color::White,
                });
            }
            ctx.layer();

            if let Some(step) = current_step {
                ctx.print(
                    step.start.lng,
                    step.start.lat,
                    Line::from(Span::styled(
                        format!(" {} ", step.id + 1),
                        Style::default().fg(Color::Black).bg(Color::Yellow),
                    )),
                );
            }

            if let Some(place) = &app.search_result {
                ctx.print(
                    place.coordinate.lng,
                    place.coordinate.lat,
                    Line::from(Span::styled(
                        "⚑",
                        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                    )),
                );
            }

            if let Some(here) = app.tracking.current_location {
                ctx.print(
                    here.lng,
                    here.lat,
                    Line::from(Span::styled(
                        "◉",
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )),
                );
            }
        });

    f.render_widget(canvas, area);
}

fn render_controls(f: &mut Frame, app: &App, area: Rect) {
    let searching = app.mode == InputMode::Editing(PlaceTarget::Search);
    let editing_origin = app.mode == InputMode::Editing(PlaceTarget::Origin);

    let suggestions = |input: &PlaceInput, active: bool| -> u16 {
        if active {
            input.predictions.len().min(5) as u16
        } else {
            0
        }
    };

    let mut constraints = vec![
        Constraint::Length(3 + suggestions(&app.search_input, searching)),
        Constraint::Length(if app.search_result.is_some() { 1 } else { 0 }),
    ];
    if app.show_directions_input {
        constraints.push(Constraint::Length(3 + suggestions(&app.origin_input, editing_origin)));
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_place_input(f, " Search for a location ", &app.search_input, searching, chunks[0]);

    if app.search_result.is_some() {
        let hint = if app.show_directions_input {
            Line::from(vec![
                Span::styled(" o", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw(" origin  "),
                Span::styled("r", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw(" live location  "),
                Span::styled("g", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw(" get directions"),
            ])
        } else {
            Line::from(vec![
                Span::styled(" d", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw(" 🚗 Get Directions"),
            ])
        };
        f.render_widget(Paragraph::new(hint), chunks[1]);
    }

    let steps_area = if app.show_directions_input {
        if editing_origin {
            render_place_input(f, " Origin ", &app.origin_input, true, chunks[2]);
        } else {
            let origin = if app.origin_overridden {
                Span::raw(app.origin.as_str())
            } else if app.origin.is_empty() {
                Span::styled("Live location (no fix)", Style::default().fg(Color::DarkGray))
            } else {
                Span::styled(
                    format!("Live location ({})", app.origin),
                    Style::default().fg(Color::Green),
                )
            };
            f.render_widget(
                Paragraph::new(Line::from(origin)).block(input_block(" Origin ", false)),
                chunks[2],
            );
        }

        let destination = Paragraph::new(app.destination.as_str())
            .style(Style::default().fg(Color::Gray))
            .block(input_block(" Destination ", false));
        f.render_widget(destination, chunks[3]);
        chunks[4]
    } else {
        chunks[2]
    };

    render_steps(f, app, steps_area);
}

fn input_block(title: &str, active: bool) -> Block<'_> {
    let border = if active { ACCENT } else { Color::DarkGray };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
}

/// Text input with its suggestion list beneath while active.
fn render_place_input(f: &mut Frame, title: &str, input: &PlaceInput, active: bool, area: Rect) {
    let mut lines = vec![Line::from(input.text.as_str())];
    if active {
        for (i, p) in input.predictions.iter().take(5).enumerate() {
            let style = if i == input.selected {
                Style::default().fg(ACCENT).bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(format!("  {}", p.description), style)));
        }
    } else if input.text.is_empty() {
        lines[0] = Line::from(Span::styled("press / to search", Style::default().fg(Color::DarkGray)));
    }

    f.render_widget(Paragraph::new(lines).block(input_block(title, active)), area);

    if active {
        let x = area.x + 1 + input.text.chars().count() as u16;
        f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
    }
}

/// Step list, drawn once there are steps or a request is in flight.
fn render_steps(f: &mut Frame, app: &App, area: Rect) {
    if app.steps.is_empty() && !app.directions_pending {
        return;
    }
    let title = if app.directions_pending {
        " Directions (fetching…) "
    } else {
        " Directions "
    };

    let items: Vec<ListItem> = app
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let current = Some(i) == app.tracking.current_step;
            let style = if current {
                Style::default().fg(Color::Black).bg(ACCENT)
            } else {
                Style::default()
            };
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("{:>2}. {}", i + 1, step.instruction),
                    style.add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("    Distance: {}, Duration: {}", step.distance_text, step.duration_text),
                    if current { style } else { Style::default().fg(Color::DarkGray) },
                )),
            ])
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );

    let mut state = ListState::default().with_selected(app.tracking.current_step);
    f.render_stateful_widget(list, area, &mut state);
}

fn fix_age(app: &App) -> String {
    match app.last_fix {
        Some(at) if app.tracking.current_location.is_some() => {
            let secs = chrono::Local::now().signed_duration_since(at).num_seconds().max(0);
            format!("fix {}s ago ({})", secs, at.format("%H:%M:%S"))
        }
        _ => "no location".to_string(),
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let location_color = if app.tracking.current_location.is_some() {
        Color::Green
    } else {
        Color::Red
    };
    let maps = if app.maps_ready {
        Span::styled("MAPS OK", Style::default().fg(Color::Green))
    } else {
        Span::styled("NO API KEY", Style::default().fg(Color::Red))
    };
    let help = match app.mode {
        InputMode::Normal => "/ search  d directions  q quit",
        InputMode::Editing(_) => "type to search  ↑/↓ choose  Enter select  Esc back",
    };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(fix_age(app), Style::default().fg(location_color)),
        Span::raw("  │  "),
        maps,
        Span::raw("  │  "),
        Span::styled(help, Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Blocking notice, dismissed with Enter or Esc.
fn render_notice(f: &mut Frame, notice: &str) {
    let area = centered_rect(50, 5, f.size());
    let popup = Paragraph::new(vec![
        Line::from(Span::styled(notice, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Enter to dismiss", Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(ACCENT)),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = (u32::from(r.width) * u32::from(percent_x.min(100)) / 100) as u16;
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + r.height.saturating_sub(height) / 2,
        width,
        height: height.min(r.height),
    }
}
