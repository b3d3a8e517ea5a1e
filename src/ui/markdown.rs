use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::mem;

/// Render markdown into styled terminal lines.
///
/// `base` carries the role's color treatment and is layered under every
/// inline style, so emphasis inside a user bubble stays in the user color.
pub fn render_markdown(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut writer = LineWriter::new(base);
    for event in Parser::new_ext(text, options) {
        writer.handle(event);
    }
    writer.finish()
}

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    has_header: bool,
}

struct LineWriter {
    base: Style,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    list_stack: Vec<Option<u64>>,
    in_code_block: bool,
    table: Option<TableState>,
}

impl LineWriter {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            list_stack: Vec::new(),
            in_code_block: false,
            table: None,
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(Tag::Paragraph) => {
                self.break_block();
            }
            Event::End(TagEnd::Paragraph) => {
                self.flush();
            }
            Event::Start(Tag::Heading { .. }) => {
                self.break_block();
                self.push_modifier(Modifier::BOLD);
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush();
                self.styles.pop();
            }
            Event::Start(Tag::Emphasis) => self.push_modifier(Modifier::ITALIC),
            Event::End(TagEnd::Emphasis) => {
                self.styles.pop();
            }
            Event::Start(Tag::Strong) => self.push_modifier(Modifier::BOLD),
            Event::End(TagEnd::Strong) => {
                self.styles.pop();
            }
            Event::Start(Tag::Strikethrough) => self.push_modifier(Modifier::CROSSED_OUT),
            Event::End(TagEnd::Strikethrough) => {
                self.styles.pop();
            }
            Event::Start(Tag::Link { .. }) => self.push_modifier(Modifier::UNDERLINED),
            Event::End(TagEnd::Link) => {
                self.styles.pop();
            }
            Event::Start(Tag::List(start)) => {
                self.flush();
                if self.list_stack.is_empty() {
                    self.break_block();
                }
                self.list_stack.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush();
                self.list_stack.pop();
            }
            Event::Start(Tag::Item) => {
                self.flush();
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                let marker = match self.list_stack.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{indent}{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.current.push(Span::styled(marker, self.base));
            }
            Event::End(TagEnd::Item) => {
                self.flush();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.break_block();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                self.flush();
            }
            Event::Start(Tag::Table(_)) => {
                self.break_block();
                self.table = Some(TableState::default());
            }
            Event::End(TagEnd::Table) => {
                if let Some(table) = self.table.take() {
                    self.emit_table(table);
                }
            }
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(table) = self.table.as_mut() {
                    let row = mem::take(&mut table.row);
                    table.rows.push(row);
                    table.has_header = true;
                }
            }
            Event::End(TagEnd::TableRow) => {
                if let Some(table) = self.table.as_mut() {
                    let row = mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(table) = self.table.as_mut() {
                    let cell = mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            Event::Text(text) => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.push_str(&text);
                } else if self.in_code_block {
                    let style = self.base.fg(Color::Yellow);
                    for line in text.lines() {
                        self.lines
                            .push(Line::from(Span::styled(format!("  {line}"), style)));
                    }
                } else {
                    self.current
                        .push(Span::styled(text.into_string(), self.current_style()));
                }
            }
            Event::Code(code) => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.push_str(&code);
                } else {
                    self.current.push(Span::styled(
                        code.into_string(),
                        self.current_style().fg(Color::Yellow),
                    ));
                }
            }
            Event::SoftBreak => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.push(' ');
                } else {
                    self.current
                        .push(Span::styled(" ".to_string(), self.current_style()));
                }
            }
            Event::HardBreak => {
                self.flush();
            }
            Event::Rule => {
                self.break_block();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    self.base.add_modifier(Modifier::DIM),
                )));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        self.lines
    }

    fn current_style(&self) -> Style {
        *self.styles.last().unwrap_or(&self.base)
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(mem::take(&mut self.current)));
        }
    }

    /// Separate block-level elements with one blank line.
    fn break_block(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn emit_table(&mut self, table: TableState) {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }

        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        for (index, row) in table.rows.iter().enumerate() {
            let mut text = String::new();
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    text.push_str(" │ ");
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                text.push_str(cell);
                // Pad every column but the last to keep rows aligned.
                if i + 1 < columns {
                    for _ in cell.chars().count()..*width {
                        text.push(' ');
                    }
                }
            }

            let style = if table.has_header && index == 0 {
                self.base.add_modifier(Modifier::BOLD)
            } else {
                self.base
            };
            self.lines.push(Line::from(Span::styled(text, style)));

            if table.has_header && index == 0 {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.lines.push(Line::from(Span::styled(
                    rule,
                    self.base.add_modifier(Modifier::DIM),
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn emphasis_and_strong_map_to_modifiers() {
        let lines = render_markdown("*soft* and **loud**", Style::default());
        assert_eq!(lines.len(), 1);

        let spans = &lines[0].spans;
        let italic = spans.iter().find(|s| s.content == "soft").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));

        let bold = spans.iter().find(|s| s.content == "loud").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn bullet_lists_get_markers() {
        let lines = render_markdown("- first\n- second", Style::default());
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert!(texts.contains(&"• first".to_string()));
        assert!(texts.contains(&"• second".to_string()));
    }

    #[test]
    fn ordered_lists_count_up() {
        let lines = render_markdown("1. one\n2. two", Style::default());
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert!(texts.contains(&"1. one".to_string()));
        assert!(texts.contains(&"2. two".to_string()));
    }

    #[test]
    fn tables_align_columns() {
        let lines = render_markdown("|a|bb|\n|-|-|\n|11|2|", Style::default());
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert!(texts.contains(&"a  │ bb".to_string()));
        assert!(texts.contains(&"11 │ 2".to_string()));
        assert!(
            texts.iter().any(|t| t.contains("┼")),
            "header rule expected, got {texts:?}"
        );
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let lines = render_markdown("```\nlet x = 1;\nlet y = 2;\n```", Style::default());
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert!(texts.contains(&"  let x = 1;".to_string()));
        assert!(texts.contains(&"  let y = 2;".to_string()));
    }

    #[test]
    fn paragraphs_are_separated_by_a_blank_line() {
        let lines = render_markdown("one\n\ntwo", Style::default());
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert_eq!(texts, ["one", "", "two"]);
    }

    #[test]
    fn base_style_flows_into_plain_text() {
        let base = Style::default().fg(Color::LightBlue);
        let lines = render_markdown("hello", base);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::LightBlue));
    }
}
