use chatterm_core::{ChatBackend, Sender};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

const PLACEHOLDER: &str = "Type your message here... (Press Enter to send)";

/// Render `**bold**` runs; an unmatched marker is kept as literal text.
fn styled_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    let closed = parts.len() % 2 == 1;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let inside_markers = i % 2 == 1;
        let dangling = inside_markers && !closed && i == parts.len() - 1;

        if dangling {
            spans.push(Span::raw(format!("**{}", part)));
        } else if part.is_empty() {
            continue;
        } else if inside_markers {
            spans.push(Span::styled(part.to_string(), bold));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

pub fn render<B: ChatBackend + 'static>(app: &mut App<B>, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header<B: ChatBackend + 'static>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", app.title), Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.subtitle.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn chat_lines<B: ChatBackend + 'static>(app: &App<B>) -> Vec<Line<'static>> {
    let sender_style = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);
    let failure_style = Style::default().fg(Color::Red);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in app.session.log().messages() {
        match msg.sender {
            Sender::User => {
                lines.push(Line::styled("You:", sender_style(Color::Cyan)));
                lines.extend(msg.text.lines().map(|line| Line::raw(line.to_string())));
            }
            Sender::Assistant => {
                lines.push(Line::styled("Assistant:", sender_style(Color::Yellow)));
                if app.is_failed_reply(msg.id) {
                    lines.extend(
                        msg.text
                            .lines()
                            .map(|line| Line::styled(line.to_string(), failure_style)),
                    );
                } else {
                    lines.extend(msg.text.lines().map(styled_line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_busy() {
        lines.push(Line::styled("Assistant:", sender_style(Color::Yellow)));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    lines
}

fn render_chat<B: ChatBackend + 'static>(app: &mut App<B>, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    // Inner size minus borders
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    if app.session.log().is_empty() && !app.session.is_busy() {
        app.chat_total_lines = 0;
        app.chat_scroll = 0;

        let welcome = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "Start a conversation with me!",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Ask me anything...",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        let paragraph = Paragraph::new(welcome)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let chat = Paragraph::new(Text::from(chat_lines(app))).wrap(Wrap { trim: false });

    // Measured without the block so the count is for the inner width only
    let total_lines = chat.line_count(app.chat_width);
    app.chat_total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);
    if app.follow_tail {
        app.chat_scroll = app.max_scroll();
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_scroll());
    }

    frame.render_widget(chat.block(block).scroll((app.chat_scroll, 0)), area);
}

fn render_input<B: ChatBackend + 'static>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let border_color = if app.session.is_busy() {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    let input_text = app.session.pending_input();
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Keep the cursor visible by scrolling the line horizontally
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let paragraph = if input_text.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let visible: String = input_text
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(paragraph.block(block), area);

    let cursor_x = u16::try_from(cursor_pos - scroll_offset).unwrap_or(u16::MAX);
    frame.set_cursor_position((area.x.saturating_add(cursor_x).saturating_add(1), area.y + 1));
}

fn render_footer<B: ChatBackend + 'static>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.is_busy() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let send_style = if app.can_send() { key_style } else { disabled_style };
    let send_label_style = if app.can_send() { label_style } else { disabled_style };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
        Span::styled(" Enter ", send_style),
        Span::styled(" send ", send_label_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl+U ", key_style),
        Span::styled(" clear ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(footer).style(Style::default().bg(Color::Black)), area);
}
