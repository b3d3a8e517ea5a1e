use chrono::Local;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Message, Role};
use crate::ui::markdown;

/// Accent for the user's bubbles; assistant text stays in the default color.
const USER_ACCENT: Color = Color::LightBlue;

/// Render one message into styled, wrapped, time-stamped lines.
///
/// Pure: the same message and width always produce the same lines. The role
/// picks one of exactly two treatments — user right-aligned in the accent
/// color, assistant left-aligned neutral — and the body goes through the
/// markdown formatter.
pub fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
    let (base, alignment) = match message.role {
        Role::User => (Style::default().fg(USER_ACCENT), Alignment::Right),
        Role::Assistant => (Style::default(), Alignment::Left),
    };

    // Bubbles take at most ~78% of the transcript width, like the web page
    // this replaces.
    let max_width = ((width as usize * 78) / 100).max(16);

    let mut lines = Vec::new();
    for line in markdown::render_markdown(&message.text, base) {
        for wrapped in wrap_line(line, max_width) {
            lines.push(wrapped.alignment(alignment));
        }
    }

    let stamp = message
        .created_at
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    lines.push(
        Line::from(Span::styled(stamp, base.add_modifier(Modifier::DIM))).alignment(alignment),
    );

    lines
}

/// Greedy word wrap that keeps span styling. Words longer than the width are
/// hard-split so a pasted token cannot push the layout sideways.
pub(crate) fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    if line.spans.iter().map(|s| s.content.chars().count()).sum::<usize>() <= width {
        return vec![line];
    }

    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;

    for span in line.spans {
        let style = span.style;
        for piece in split_keeping_spaces(&span.content) {
            let mut piece_len = piece.chars().count();
            let mut piece = piece.to_string();

            // Break oversized words into width-sized chunks.
            while piece_len > width {
                let taken: String = piece.chars().take(width - used.min(width)).collect();
                if taken.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    used = 0;
                    continue;
                }
                piece = piece.chars().skip(taken.chars().count()).collect();
                piece_len = piece.chars().count();
                current.push(Span::styled(taken, style));
                lines.push(Line::from(std::mem::take(&mut current)));
                used = 0;
            }

            if used + piece_len > width {
                lines.push(Line::from(std::mem::take(&mut current)));
                used = 0;
                if piece.trim().is_empty() {
                    continue; // never start a line with wrap-induced whitespace
                }
            }

            used += piece_len;
            current.push(Span::styled(piece, style));
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Split into alternating word / whitespace chunks so wrapping can drop
/// boundary spaces without eating intra-word styling.
fn split_keeping_spaces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                pieces.push(&text[start..i]);
                start = i;
                in_space = Some(space);
            }
            None => in_space = Some(space),
            _ => {}
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}
