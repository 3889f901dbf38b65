use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use samchat_core::orchestrator::BOT_NAME;
use samchat_core::{Bubble, ScrollingMessageView, Side, Speaker};
use unicode_width::UnicodeWidthChar;

use crate::app::App;

/// Input box grows with the message up to this many rows
const MAX_INPUT_LINES: usize = 5;
const SEND_LABEL: &str = "Send";
const END_LABEL: &str = "End Chat";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let input_lines = app.input.line_count().clamp(1, MAX_INPUT_LINES) as u16;

    // Main layout: header, chat, input row, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" Chat with {} ", BOT_NAME), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {}: {} ", app.provider.display_name(), app.model),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    if app.is_closing() {
        block = block.title_bottom(Line::from(Span::styled(
            " Closing... ",
            Style::default().fg(Color::Yellow),
        )));
    } else if app.session.is_awaiting() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} is thinking{} ", BOT_NAME, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let inner = block.inner(area);
    app.chat_area = Some(inner);
    app.session.resize(inner.width, inner.height);

    let view = app.session.view();
    let chat = Paragraph::new(bubble_lines(view, inner.width))
        .block(block)
        .scroll((view.scroll_offset(), 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [text_area, send_area, end_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SEND_LABEL.len() as u16 + 6),
        Constraint::Length(END_LABEL.len() as u16 + 6),
    ])
    .areas(area);

    // Store areas for mouse hit-testing
    app.send_area = Some(send_area);
    app.end_area = Some(end_area);

    let closing = app.is_closing();
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if closing { Color::DarkGray } else { Color::Yellow }))
        .title(" Message ");
    let inner = input_block.inner(text_area);

    if closing || app.input.text().is_empty() {
        let hint = if closing {
            "Conversation ended."
        } else {
            "Type a message and press Enter..."
        };
        let placeholder = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(placeholder, text_area);
    } else {
        // Scroll so the cursor stays inside the box
        let (row, col) = app.input.cursor_position();
        let visible_rows = usize::from(inner.height.max(1));
        let visible_cols = usize::from(inner.width.max(1));
        let row_offset = (row + 1).saturating_sub(visible_rows);
        let col_offset = (col + 1).saturating_sub(visible_cols);

        // Use cyan text to match the user's bubbles
        let input = Paragraph::new(app.input.text())
            .style(Style::default().fg(Color::Cyan))
            .scroll((row_offset as u16, col_offset as u16))
            .block(input_block);
        frame.render_widget(input, text_area);
    }

    if !closing {
        let (row, col) = app.input.cursor_position();
        let row_offset = (row + 1).saturating_sub(usize::from(inner.height.max(1)));
        let col_offset = (col + 1).saturating_sub(usize::from(inner.width.max(1)));
        frame.set_cursor_position((
            inner.x + (col - col_offset) as u16,
            inner.y + (row - row_offset) as u16,
        ));
    }

    let send_enabled = !closing && !app.input.is_blank();
    frame.render_widget(button(SEND_LABEL, Color::Cyan, send_enabled), send_area);
    frame.render_widget(button(END_LABEL, Color::Red, !closing), end_area);
}

fn button(label: &str, color: Color, enabled: bool) -> Paragraph<'_> {
    let color = if enabled { color } else { Color::DarkGray };
    Paragraph::new(Span::styled(label, Style::default().fg(color).bold()))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color)),
        )
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Black).bg(Color::Gray);
    let label_style = Style::default().fg(Color::Gray);

    let mut hints = if app.is_closing() {
        vec![]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Shift+Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Ctrl+E ", key_style),
            Span::styled(" end chat ", label_style),
        ]
    };
    hints.extend([
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl+C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Every bubble as terminal rows, each starting at the row the view placed it
fn bubble_lines(view: &ScrollingMessageView, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (top, bubble) in view.positioned() {
        lines.resize(usize::from(top), Line::default());
        lines.extend(bubble_box(bubble, width));
    }
    lines
}

fn bubble_style(speaker: Speaker) -> Style {
    match speaker {
        Speaker::User => Style::default().fg(Color::Cyan),
        Speaker::Bot => Style::default().fg(Color::Gray),
    }
}

fn bubble_box(bubble: &Bubble, area_width: u16) -> Vec<Line<'static>> {
    let geometry = bubble.layout.geometry;
    let width = geometry.width.min(area_width).max(2);
    let inner = usize::from(width - 2);

    let (top_left, top_right, bottom_left, bottom_right) = if geometry.corner_radius > 0 {
        ('╭', '╮', '╰', '╯')
    } else {
        ('┌', '┐', '└', '┘')
    };
    let horizontal = "─".repeat(inner);

    let mut rows = Vec::with_capacity(usize::from(geometry.height));
    rows.push(format!("{top_left}{horizontal}{top_right}"));
    for i in 0..geometry.height.saturating_sub(2) {
        let text = bubble
            .layout
            .lines
            .get(usize::from(i))
            .map(String::as_str)
            .unwrap_or("");
        rows.push(format!("│{}│", fit_to_width(text, inner)));
    }
    rows.push(format!("{bottom_left}{horizontal}{bottom_right}"));

    let indent = match geometry.side {
        Side::Left => 0,
        Side::Right => area_width.saturating_sub(width),
    };
    let pad = " ".repeat(usize::from(indent));
    let style = bubble_style(bubble.speaker);

    rows.into_iter()
        .map(|row| Line::from(vec![Span::raw(pad.clone()), Span::styled(row, style)]))
        .collect()
}

/// One space of left padding, then `text`, filled or cut to exactly `width` cells
fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in std::iter::once(' ').chain(text.chars()) {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}
