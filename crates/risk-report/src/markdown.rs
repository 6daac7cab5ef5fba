//! Minimal Markdown document builder used to render review reports.
//!
//! Blocks are kept as data so callers can inspect the structure before it is
//! turned into text, and rendering is deterministic: blocks are separated by a
//! single blank line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    fn marker(self) -> &'static str {
        match self {
            Align::Left => ":---",
            Align::Center => ":---:",
            Align::Right => "---:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
        align: Vec<Align>,
    },
    Paragraph(String),
    Code(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    blocks: Vec<Block>,
}

impl MarkdownDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) -> &mut Self {
        self.blocks.push(Block::Heading {
            level: level.clamp(1, 6),
            text: text.into(),
        });
        self
    }

    pub fn add_table(
        &mut self,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
        align: Vec<Align>,
    ) -> &mut Self {
        self.blocks.push(Block::Table { header, rows, align });
        self
    }

    pub fn add_paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn add_code(&mut self, code: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Code(code.into()));
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MarkdownDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                f.write_str("\n\n")?;
            }
            match block {
                Block::Heading { level, text } => {
                    write!(f, "{} {}", "#".repeat(*level as usize), single_line(text))?
                }
                Block::Table { header, rows, align } => {
                    f.write_str(&render_table(header, rows, align))?
                }
                Block::Paragraph(text) => f.write_str(text)?,
                Block::Code(code) => {
                    let fence = code_fence(code);
                    write!(f, "{fence}\n{code}\n{fence}")?
                }
            }
        }
        if !self.blocks.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

fn render_table(header: &[String], rows: &[Vec<String>], align: &[Align]) -> String {
    let columns = header.len();
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(table_row(header.iter().map(String::as_str), columns));
    lines.push(table_row(
        (0..columns).map(|col| align.get(col).copied().unwrap_or_default().marker()),
        columns,
    ));
    for row in rows {
        lines.push(table_row(row.iter().map(String::as_str), columns));
    }
    lines.join("\n")
}

fn table_row<'a>(cells: impl Iterator<Item = &'a str>, columns: usize) -> String {
    let mut rendered: Vec<String> = cells.take(columns).map(escape_cell).collect();
    rendered.resize(columns, String::new());
    format!("| {} |", rendered.join(" | "))
}

// A pipe-table row must stay on one physical line.
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", "<br/>")
        .replace('\n', "<br/>")
}

fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

/// Backtick fence one longer than the longest run inside `code`, never shorter than three.
fn code_fence(code: &str) -> String {
    let longest = code
        .split(|ch| ch != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
