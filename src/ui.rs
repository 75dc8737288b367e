use std::time::Instant;

use crate::app::{App, BookPanel};
use crate::book::catalog::BookState;
use crate::book::{intro_lead, BookView, Page};
use crate::braille::BrailleCanvas;
use crate::contact::form::{ContactForm, Field};
use crate::explorer::{Explorer, Panel, FIRST_YEAR, YEARS};
use crate::globe::{render_globe, CursorStyle, GlobeViewport, Label};
use crate::overlay::{hover_card, modal_rows};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType, List, ListItem, ListState,
        Paragraph, Tabs, Widget, Wrap,
    },
    Frame,
};

/// Trend line colours, one per series in a panel.
const TREND_COLORS: [Color; 3] = [
    Color::Rgb(0xF8, 0x71, 0x71),
    Color::Rgb(0x8B, 0x5C, 0xF6),
    Color::Rgb(0x10, 0xB9, 0x81),
];

/// Render the UI
pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let area = frame.area();

    // Split into globe area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_globe_panel(frame, app, chunks[0], now);
    render_status_bar(frame, app, chunks[1]);

    if let Some(loc) = app.layer.hovered_location() {
        if let Some((col, row)) = app.mouse_pos {
            let (name, coords) = hover_card(loc);
            render_hover_card(frame, area, col, row, &name, &coords);
        }
    }
    if let Some(explorer) = &app.explorer {
        render_explorer(frame, explorer, chunks[0]);
    }
    if let Some(index) = app.modal {
        render_modal(frame, app, index, area);
    }
    if let Some(panel) = &app.book {
        render_book(frame, app, panel, area, now);
    }
    if app.contact_open {
        render_contact(frame, &app.form, area);
    }
    if app.palette.is_open() {
        render_palette(frame, app, area);
    }
    render_toast(frame, app, area);
}

fn render_globe_panel(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    // Create a block with border
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Terra Globe ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut globe = render_globe(
        &app.layer,
        &app.coastlines,
        &app.settings,
        inner.width as usize,
        inner.height as usize,
        now,
    );
    if let (Some(explorer), Some(vp)) = (&app.explorer, app.layer.viewport()) {
        globe.labels.extend(marker_labels(explorer, vp));
    }

    // Cursor marker, in cells inside the border
    let cursor = app.mouse_pos.and_then(|(col, row)| {
        let (cx, cy) = (col.checked_sub(inner.x)?, row.checked_sub(inner.y)?);
        (cx < inner.width && cy < inner.height).then_some((cx, cy, app.layer.cursor()))
    });

    frame.render_widget(
        GlobeWidget { canvas: globe.canvas, labels: globe.labels, cursor },
        inner,
    );
}

/// Braille globe with text labels overlaid
struct GlobeWidget {
    canvas: BrailleCanvas,
    labels: Vec<Label>,
    cursor: Option<(u16, u16, CursorStyle)>,
}

impl Widget for GlobeWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (col, row, ch, color) in self.canvas.lit_cells() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
        }

        for label in &self.labels {
            if label.row >= area.height || label.col >= area.width {
                continue;
            }
            let mut style = Style::default().fg(label.color);
            if label.emphasised {
                style = style.add_modifier(Modifier::BOLD);
            }
            let max_len = (area.width - label.col) as usize;
            let y = area.y + label.row;
            for (i, ch) in label.text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + label.col + i as u16, y)].set_char(ch).set_style(style);
            }
        }

        if let Some((cx, cy, style)) = self.cursor {
            let (ch, color) = match style {
                CursorStyle::Pointer => ('◉', Color::Yellow),
                CursorStyle::Grab => ('╋', Color::Red),
                CursorStyle::Grabbing => ('✥', Color::Red),
            };
            buf[(area.x + cx, area.y + cy)].set_char(ch).set_fg(color);
        }
    }
}

/// Explorer markers as labels, numbered for their hotkeys.
fn marker_labels(explorer: &Explorer, vp: &GlobeViewport) -> Vec<Label> {
    explorer
        .countries()
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let (px, py) = vp.project(c.lat, c.lng)?;
            Some(Label {
                col: (px / 2) as u16,
                row: (py / 4) as u16,
                text: format!("◆{} {}", i + 1, c.name),
                color: Color::Yellow,
                emphasised: explorer.selected() == Some(i),
            })
        })
        .collect()
}

fn toggle_span(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.settings;
    let selection = app.layer.selected_location().map_or("none", |l| l.name);

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" ", Style::default()),
        toggle_span(app.layer.auto_rotate_enabled(), "[␣]Rotate ", "[␣]rotate "),
        toggle_span(settings.show_arcs, "[A]rcs ", "[a]rcs "),
        toggle_span(settings.show_rings, "[R]ings ", "[r]ings "),
        toggle_span(settings.show_labels, "[L]abels ", "[l]abels "),
        toggle_span(settings.show_stars, "[S]tars ", "[s]tars "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            app.pointer_coords().map(|c| format!(" ⌖ {c}")).unwrap_or_default(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(selection, Style::default().fg(Color::Magenta)),
        Span::styled(
            " | ^K:search ←→:cycle b:book g:explore c:contact q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

/// A `width` x `height` rect centred in `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn popup_block(title: String, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
}

fn render_hover_card(frame: &mut Frame, area: Rect, col: u16, row: u16, name: &str, coords: &str) {
    let width = name.chars().count().max(coords.chars().count()) as u16 + 4;
    let height = 4;
    // Prefer below-right of the pointer, flip when it would not fit
    let x = if col + 2 + width <= area.right() { col + 2 } else { col.saturating_sub(width + 1) };
    let y = if row + 1 + height <= area.bottom() { row + 1 } else { row.saturating_sub(height) };
    let rect = Rect { x, y, width, height }.intersection(area);

    let text = vec![
        Line::from(Span::styled(name.to_string(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(coords.to_string(), Style::default().fg(Color::Gray))),
    ];
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray))),
        rect,
    );
}

fn render_modal(frame: &mut Frame, app: &App, index: usize, area: Rect) {
    let Some(loc) = app.layer.locations().get(index) else {
        return;
    };
    let rect = centered(area, 56, 13);
    let mut lines: Vec<Line> = modal_rows(loc)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:>12}: "), Style::default().fg(Color::DarkGray)),
                Span::styled(value, Style::default().fg(Color::White)),
            ])
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        " Enter/Esc: close  b: storybook  c: contact",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(popup_block(format!(" {} ", loc.name), Color::Cyan)),
        rect,
    );
}

fn render_palette(frame: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let height = palette.results().len() as u16 + 7;
    let rect = Rect { y: area.y + area.height / 6, ..centered(area, 76, height) }.intersection(area);

    frame.render_widget(Clear, rect);
    let block = popup_block(" Search locations and actions ".to_string(), Color::Yellow);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    // Quick actions stay visible whatever the query
    let mut actions = vec![Span::styled("Tab ", Style::default().fg(Color::DarkGray))];
    for action in palette.actions() {
        let style = if palette.active_action() == Some(*action) {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        actions.push(Span::styled(format!("[{}]", action.label()), style));
        actions.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(actions)), chunks[2]);

    let caret = if palette.has_focus() { "▏" } else { "" };
    let query = Line::from(vec![
        Span::styled("› ", Style::default().fg(Color::Yellow)),
        Span::styled(palette.query().to_string(), Style::default().fg(Color::White)),
        Span::styled(caret, Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(query), chunks[0]);

    if palette.results().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" No matches", Style::default().fg(Color::DarkGray))),
            chunks[1],
        );
        return;
    }

    let items: Vec<ListItem> = palette
        .results()
        .iter()
        .map(|r| ListItem::new(format!(" {}", r.text)))
        .collect();
    let list = List::new(items).highlight_style(
        Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
    );
    let selected = palette.active_action().is_none().then_some(palette.active());
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_explorer(frame: &mut Frame, explorer: &Explorer, area: Rect) {
    render_explorer_controls(frame, explorer, area);
    if explorer.selected_country().is_some() {
        render_explorer_data(frame, explorer, area);
    }
    if explorer.show_info() {
        render_explorer_info(frame, area);
    }
}

/// Play/pause, reset, info and the year cursor, bottom centre.
fn render_explorer_controls(frame: &mut Frame, explorer: &Explorer, area: Rect) {
    let width = 52.min(area.width);
    let height = 6.min(area.height);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.bottom().saturating_sub(height + 1).max(area.y),
        width,
        height,
    };
    frame.render_widget(Clear, rect);
    let block = popup_block(" Terra Earth Explorer ".to_string(), Color::Cyan);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let key = Style::default().fg(Color::DarkGray);
    let play = if explorer.is_playing() { "⏸ Pause" } else { "▶ Play" };
    let buttons = Line::from(vec![
        Span::styled("[␣] ", key),
        Span::styled(play, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled("  [r] ", key),
        Span::styled("Reset", Style::default().fg(Color::White)),
        Span::styled("  [i] ", key),
        Span::styled("Info", Style::default().fg(Color::White)),
        Span::styled("  [g] ", key),
        Span::styled("Close", Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(buttons), rows[0]);

    let ratio = explorer.year_index() as f64 / (YEARS - 1) as f64;
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format!("Year {}", explorer.year())),
        rows[1],
    );
    frame.render_widget(
        Paragraph::new(Span::styled("←/→ year  1-5 or ↑/↓ country  Tab panel", key)),
        rows[2],
    );
}

/// Selected country: panel tabs, trend chart, and this year's values.
fn render_explorer_data(frame: &mut Frame, explorer: &Explorer, area: Rect) {
    let Some(country) = explorer.selected_country() else {
        return;
    };
    let panel = explorer.panel();
    let series = country.series(panel);

    let rect = Rect {
        x: area.x + 2,
        y: area.y + 1,
        width: 46,
        height: (13 + 2 * series.len() as u16).min(area.height.saturating_sub(8)),
    }
    .intersection(area);
    frame.render_widget(Clear, rect);
    let block = popup_block(format!(" {} - {} ", country.name, explorer.year()), Color::Yellow)
        .title_bottom(Line::from(Span::styled(" Esc: deselect ", Style::default().fg(Color::DarkGray))));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let mut constraints = vec![Constraint::Length(1), Constraint::Min(6)];
    constraints.extend(std::iter::repeat(Constraint::Length(2)).take(series.len()));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let tabs = Tabs::new(Panel::ALL.iter().map(|p| p.title()))
        .select(panel.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, rows[0]);

    let year = f64::from(explorer.year());
    let points: Vec<Vec<(f64, f64)>> = series.iter().map(|s| s.points()).collect();
    let cursor: Vec<(f64, f64)> = series
        .iter()
        .map(|s| (year, s.value(explorer.year_index())))
        .collect();
    let (lo, hi) = series.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        let (a, b) = s.bounds();
        (lo.min(a), hi.max(b))
    });
    let pad = ((hi - lo) * 0.1).max(0.5);
    let (lo, hi) = (lo - pad, hi + pad);

    let mut datasets: Vec<Dataset> = series
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(k, (s, data))| {
            Dataset::default()
                .name(s.label)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(TREND_COLORS[k % TREND_COLORS.len()]))
                .data(data)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White))
            .data(&cursor),
    );

    let last_year = f64::from(FIRST_YEAR) + (YEARS - 1) as f64;
    let axis = Style::default().fg(Color::Gray);
    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled(
            format!("{} Trends", panel.title()),
            Style::default().fg(Color::White),
        )))
        .x_axis(
            Axis::default()
                .style(axis)
                .bounds([f64::from(FIRST_YEAR), last_year])
                .labels(vec![format!("{FIRST_YEAR}"), format!("{}", last_year as u16)]),
        )
        .y_axis(
            Axis::default()
                .style(axis)
                .bounds([lo, hi])
                .labels(vec![format!("{lo:.0}"), format!("{hi:.0}")]),
        );
    frame.render_widget(chart, rows[1]);

    for (k, s) in series.iter().enumerate() {
        let Some(row) = rows.get(k + 2) else {
            break;
        };
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(*row);
        let value = s.value(explorer.year_index());
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", s.label), Style::default().fg(Color::Gray)),
                Span::styled(format!("{value:.2}"), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            ])),
            parts[0],
        );
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(TREND_COLORS[k % TREND_COLORS.len()]).bg(Color::Black))
                .ratio(s.ratio(explorer.year_index()))
                .label(""),
            parts[1],
        );
    }
}

fn render_explorer_info(frame: &mut Frame, area: Rect) {
    let width = 42.min(area.width);
    let rect = Rect {
        x: area.right().saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: 7,
    }
    .intersection(area);
    let text = vec![
        Line::from(vec![
            Span::styled("Drag to rotate", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::styled(" the Earth.", Style::default().fg(Color::Gray)),
        ]),
        Line::from(Span::styled(
            "Pick a marker to see 25 years of NASA Terra data.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Team CosmoMinds • Terra Data Visualization",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(popup_block(" Terra Earth Explorer ".to_string(), Color::Cyan)),
        rect,
    );
}

fn render_toast(frame: &mut Frame, app: &App, area: Rect) {
    let Some(toast) = app.toasts.current() else {
        return;
    };
    let width = (toast.message.chars().count() as u16 + 4)
        .max(24)
        .min(area.width.saturating_sub(2));
    let rect = Rect {
        x: area.right().saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: 3,
    }
    .intersection(area);

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(toast.message.as_str())
            .style(Style::default().fg(Color::White))
            .block(popup_block(format!(" {} ", toast.kind.title()), toast.kind.color())),
        rect,
    );
}

fn render_contact(frame: &mut Frame, form: &ContactForm, area: Rect) {
    let rect = centered(area, 60, 16);
    frame.render_widget(Clear, rect);
    let block = popup_block(" Contact us ".to_string(), Color::Green);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let mut lines = Vec::new();
    for field in Field::ALL {
        let focused = form.focus() == field;
        let marker = if focused { "▸ " } else { "  " };
        let value = form.value(field);
        // Only complain about fields the user has started on
        let error = (!value.is_empty()).then(|| form.error(field)).flatten();
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Green)),
            Span::styled(format!("{:<8}", field.label()), Style::default().fg(Color::DarkGray)),
            Span::styled(
                value.to_string(),
                Style::default().fg(if focused { Color::White } else { Color::Gray }),
            ),
            Span::styled(if focused { "▏" } else { "" }, Style::default().fg(Color::Green)),
        ]));
        lines.push(match error {
            Some(msg) => Line::from(Span::styled(format!("          {msg}"), Style::default().fg(Color::Red))),
            None => Line::default(),
        });
    }

    let footer = if form.is_loading() {
        Span::styled(" Sending…", Style::default().fg(Color::Yellow))
    } else if form.can_submit() {
        Span::styled(" Enter: send  Tab: next field  Esc: close", Style::default().fg(Color::Green))
    } else {
        Span::styled(" Tab: next field  Esc: close", Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::default());
    lines.push(Line::from(footer));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn render_book(frame: &mut Frame, app: &App, panel: &BookPanel, area: Rect, now: Instant) {
    let rect = centered(area, area.width.saturating_sub(4), area.height.saturating_sub(2));
    frame.render_widget(Clear, rect);

    let Some(view) = &panel.view else {
        let message = match app.book_state() {
            Some(BookState::Missing) => format!("No story yet for {}.", panel.code),
            _ => format!("Loading the {} storybook…", panel.code),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(Color::Gray)))
                .block(popup_block(" Storybook ".to_string(), Color::Magenta)),
            rect,
        );
        return;
    };

    let block = popup_block(format!(" {} ", view.book().title), Color::Magenta)
        .title_bottom(Line::from(Span::styled(
            format!(" ←/→ flip  Esc close  {}/{} ", view.current() + 1, view.pages().len()),
            Style::default().fg(Color::DarkGray),
        )));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let visible = view.visible();
    let constraints = vec![Constraint::Ratio(1, visible.len().max(1) as u32); visible.len()];
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner);

    for ((_, page), column) in visible.iter().zip(columns.iter()) {
        let page_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let text = page_lines(view, *page);
        frame.render_widget(
            Paragraph::new(text).wrap(Wrap { trim: true }).block(page_block),
            *column,
        );
    }

    if let Some(confetti) = view.confetti() {
        let buf = frame.buffer_mut();
        for (x, y, color) in confetti.positions(now) {
            let col = inner.x + (x * inner.width.saturating_sub(1) as f64) as u16;
            let row = inner.y + (y * inner.height.saturating_sub(1) as f64) as u16;
            if col < inner.right() && row < inner.bottom() {
                buf[(col, row)].set_char('✦').set_fg(color);
            }
        }
    }
}

fn page_lines(view: &BookView, page: Page) -> Vec<Line<'static>> {
    let book = view.book();
    let title = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let body = Style::default().fg(Color::Gray);
    let muted = Style::default().fg(Color::DarkGray);

    match page {
        Page::Cover => {
            let mut lines = vec![Line::default(), Line::from(Span::styled(book.title.clone(), title))];
            if let Some(subtitle) = &book.subtitle {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(subtitle.clone(), body)));
            }
            if let Some(source) = &book.source {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(format!("Data: {source}"), muted)));
            }
            lines
        }
        Page::CountryIntro { country } => match book.countries.get(country) {
            Some(c) => vec![
                Line::default(),
                Line::from(Span::styled(c.name.clone(), title)),
                Line::default(),
                Line::from(Span::styled(intro_lead(&c.name), body)),
            ],
            None => Vec::new(),
        },
        Page::Year { country, page } => {
            let Some(c) = book.countries.get(country) else {
                return Vec::new();
            };
            let Some(p) = c.pages.get(page) else {
                return Vec::new();
            };
            let mut lines = vec![Line::from(Span::styled(format!("{} · {}", c.name, p.year), title))];
            if let Some(caption) = &p.caption {
                lines.push(Line::from(Span::styled(caption.clone(), muted.add_modifier(Modifier::ITALIC))));
            }
            if let Some(story) = &p.story {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(story.clone(), body)));
            }
            lines
        }
        Page::Back => vec![
            Line::default(),
            Line::from(Span::styled("The End", title)),
            Line::default(),
            Line::from(Span::styled("Thanks for flying with Terra.", body)),
        ],
        Page::Blank => Vec::new(),
    }
}
