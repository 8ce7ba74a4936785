use crate::model::{ErrorClass, Timer};
use crate::store::Store;
use crate::ui::app::{App, StatusLevel, View};
use crate::ui::form::{format_local, EntityForm, FieldKey, FieldValue};
use crate::ui::stopwatch::format_duration;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw<S: Store>(f: &mut Frame<'_>, app: &App<S>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(f.size());

    draw_header(f, layout[0], app.view());
    match app.view() {
        View::Entries => draw_entries(f, layout[1], app),
        View::Timers => draw_timers(f, layout[1], app),
        View::TimerDetail => draw_timer_detail(f, layout[1], app),
        View::Tags => draw_tags(f, layout[1], app),
    }
    draw_footer(f, layout[2], app);

    if let Some(form) = app.form() {
        draw_form(f, form);
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, active: View) {
    let mut spans = vec![Span::styled(
        "punch ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    for (idx, view) in View::CYCLE.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("  •  "));
        }
        let style = if *view == active {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(view.label(), style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn list_block(title: String) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn draw_rows(
    f: &mut Frame<'_>,
    area: Rect,
    title: String,
    rows: Vec<ListItem<'static>>,
    cursor: Option<usize>,
    empty: &str,
) {
    if rows.is_empty() {
        let msg = Paragraph::new(empty.to_string())
            .alignment(Alignment::Center)
            .block(list_block(title));
        f.render_widget(msg, area);
        return;
    }
    let mut state = ListState::default();
    state.select(cursor);
    let list = List::new(rows).block(list_block(title)).highlight_style(
        Style::default()
            .bg(Color::LightCyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );
    f.render_stateful_widget(list, area, &mut state);
}

fn tag_span(tags: &[String]) -> Span<'static> {
    if tags.is_empty() {
        Span::raw("")
    } else {
        Span::styled(
            format!("  #{}", tags.join(" #")),
            Style::default().fg(Color::LightMagenta),
        )
    }
}

fn draw_entries<S: Store>(f: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let rows = app
        .entries()
        .items()
        .iter()
        .map(|entry| {
            let mut spans = vec![
                Span::styled(
                    entry.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{} → {}", format_local(entry.start), format_local(entry.end)),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw("  "),
                Span::styled(
                    format_duration(entry.duration()),
                    Style::default().fg(Color::Yellow),
                ),
                tag_span(&entry.tags),
            ];
            if let Some(description) = &entry.description {
                spans.push(Span::styled(
                    format!("  {}", description),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    draw_rows(
        f,
        area,
        format!("Entries ({})", app.entries().len()),
        rows,
        app.entries().cursor(),
        "No entries yet",
    );
}

fn draw_timers<S: Store>(f: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let rows = app
        .timers()
        .items()
        .iter()
        .map(|timer| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    timer.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("since {}", format_local(timer.start)),
                    Style::default().fg(Color::Gray),
                ),
                tag_span(&timer.tags),
            ]))
        })
        .collect();
    draw_rows(
        f,
        area,
        format!("Running timers ({})", app.timers().len()),
        rows,
        app.timers().cursor(),
        "No running timers",
    );
}

fn draw_tags<S: Store>(f: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let rows = app
        .tags()
        .items()
        .iter()
        .map(|tag| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("#{}", tag.name),
                    Style::default().fg(Color::LightMagenta),
                ),
                Span::styled(format!("  [{}]", tag.id), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    draw_rows(
        f,
        area,
        format!("Tags ({})", app.tags().len()),
        rows,
        app.tags().cursor(),
        "No tags yet",
    );
}

fn draw_timer_detail<S: Store>(f: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let lines = match app.timers().selected() {
        Some(timer) => detail_lines(timer, &format_duration(app.stopwatch().elapsed())),
        None => vec![Line::from(Span::styled(
            "No timer selected",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(list_block("Timer".to_string()));
    f.render_widget(paragraph, area);
}

fn detail_lines(timer: &Timer, elapsed: &str) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            timer.name.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            elapsed.to_string(),
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("started {}", format_local(timer.start)),
            Style::default().fg(Color::Gray),
        )),
    ];
    if !timer.tags.is_empty() {
        lines.push(Line::from(tag_span(&timer.tags)));
    }
    lines
}

fn draw_footer<S: Store>(f: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(area);

    let help_bar = Paragraph::new(help_line(app.view()))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(help_bar, rows[0]);

    let status = app.status();
    let color = match status.level {
        StatusLevel::Info => Color::Gray,
        StatusLevel::Error(ErrorClass::Validation) => Color::Yellow,
        StatusLevel::Error(ErrorClass::Conflict) => Color::LightMagenta,
        StatusLevel::Error(ErrorClass::Unavailable) => Color::LightRed,
    };
    let paragraph = Paragraph::new(Span::styled(status.text.clone(), Style::default().fg(color)))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(paragraph, rows[1]);
}

fn help_line(view: View) -> Line<'static> {
    let key = Style::default().fg(Color::LightCyan);
    let mut spans = vec![
        Span::styled("←/→", key),
        Span::raw(" view  "),
        Span::styled("↑/↓", key),
        Span::raw(" select  "),
        Span::styled("a", key),
        Span::raw(" add  "),
        Span::styled("e", key),
        Span::raw(" edit  "),
        Span::styled("d", key),
        Span::raw(" delete  "),
    ];
    if matches!(view, View::Timers | View::TimerDetail) {
        spans.extend([Span::styled("t", key), Span::raw(" stop  ")]);
    }
    spans.extend([Span::styled("q", key), Span::raw(" quit")]);
    Line::from(spans)
}

fn draw_form(f: &mut Frame<'_>, form: &EntityForm) {
    let area = centered_rect(70, 60, f.size());
    let mut lines = Vec::new();
    for (key, value) in form.values() {
        lines.extend(field_lines(key, value, form.error(key), key == form.focus()));
    }
    lines.push(Line::from(Span::styled(
        "Enter to save • Esc to cancel • Tab/Shift-Tab to move • Space toggles a tag",
        Style::default().fg(Color::Gray),
    )));
    let dialog = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    form.title(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn field_lines(
    key: FieldKey,
    value: &FieldValue,
    error: Option<&str>,
    active: bool,
) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", key.label());

    let mut lines = match value {
        FieldValue::Text(input) => {
            let text = if active {
                input.with_caret()
            } else {
                input.value().to_string()
            };
            vec![Line::from(vec![
                Span::styled(prefix, label_style),
                Span::styled(text, value_style),
            ])]
        }
        FieldValue::Tags(select) => {
            let mut lines = vec![Line::from(Span::styled(prefix, label_style))];
            if select.options().is_empty() {
                lines.push(Line::from(Span::styled(
                    "  (no tags yet)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for (idx, option) in select.options().iter().enumerate() {
                let mark = if select.is_selected(option) { "[x]" } else { "[ ]" };
                let mut style = value_style;
                if active && idx == select.highlight() {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                lines.push(Line::from(Span::styled(
                    format!("  {} {}", mark, option),
                    style,
                )));
            }
            lines
        }
    };
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::LightRed),
        )));
    }
    lines
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
