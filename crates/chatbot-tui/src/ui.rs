use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use chatbot_core::state::ERROR_MARKER;
use chatbot_core::{ChatError, Role};
use crate::app::App;

/// The input box grows with its content up to this many rows.
const MAX_INPUT_ROWS: usize = 6;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_rows = app
        .session
        .pending_input
        .split('\n')
        .count()
        .clamp(1, MAX_INPUT_ROWS) as u16;

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
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
        Span::styled(" AI Chatbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", app.model), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, used by the scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    if app.follow_tail {
        app.scroll_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let busy = app.session.is_busy();

    // Rows come from App::wrap_message, the same rows transcript_lines counts
    let chat = if app.session.transcript.is_empty() && !busy {
        Paragraph::new(Span::styled(
            "Type a question below and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: false })
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.session.transcript {
            match msg.role {
                Role::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    for row in app.wrap_message(&msg.text) {
                        lines.push(Line::from(row));
                    }
                }
                Role::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    let style = if msg.text.starts_with(ERROR_MARKER) {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default()
                    };
                    for row in app.wrap_message(&msg.text) {
                        lines.push(Line::styled(row, style));
                    }
                }
            }
            lines.push(Line::default());
        }

        if busy {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Paragraph::new(Text::from(lines))
    };

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.session.is_busy();
    let (border_color, title) = if busy {
        (Color::DarkGray, " Waiting for reply... ")
    } else {
        (Color::Yellow, " Ask (Enter to send, Shift+Enter for newline) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Cursor row/column within the (possibly multi-line) input
    let before_cursor: String = app
        .session
        .pending_input
        .chars()
        .take(app.input_cursor)
        .collect();
    let cursor_row = before_cursor.matches('\n').count();
    let cursor_col = before_cursor
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0);

    // Scroll offsets that keep the cursor visible
    let row_offset = if inner_height == 0 {
        0
    } else {
        (cursor_row + 1).saturating_sub(inner_height)
    };
    let col_offset = if inner_width == 0 {
        0
    } else {
        (cursor_col + 1).saturating_sub(inner_width)
    };

    let input = if app.session.pending_input.is_empty() {
        Paragraph::new(Span::styled(
            "Ask something...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible: Vec<Line> = app
            .session
            .pending_input
            .split('\n')
            .skip(row_offset)
            .take(inner_height)
            .map(|l| Line::from(l.chars().skip(col_offset).take(inner_width).collect::<String>()))
            .collect();
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if inner_width > 0 && inner_height > 0 {
        frame.set_cursor_position((
            area.x + 1 + (cursor_col - col_offset) as u16,
            area.y + 1 + (cursor_row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.is_busy() {
        (" BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    match app.session.last_error() {
        Some(err) => spans.push(Span::styled(
            error_hint(err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::styled(
            "Enter send | Shift+Enter newline | PgUp/PgDn scroll | Esc quit",
            Style::default().fg(Color::DarkGray),
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Friendly wording for a local submit error.
fn error_hint(err: &str) -> String {
    if err == ChatError::EmptyInput.to_string() {
        "Please enter a question.".to_string()
    } else {
        err.to_string()
    }
}
