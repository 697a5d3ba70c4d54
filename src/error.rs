use thiserror::Error;

const SNIPPET_CHARS: usize = 40;

/// Malformed DOT text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error in DOT graph at line {line}, column {column}: {message} near `{snippet}`")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the source text.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    pub snippet: String,
}

impl ParseError {
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = source[line_start..offset].chars().count() + 1;

        let rest = source[offset..].lines().next().unwrap_or("").trim();
        let snippet = if rest.is_empty() {
            "end of input".to_string()
        } else if rest.chars().count() > SNIPPET_CHARS {
            let head: String = rest.chars().take(SNIPPET_CHARS).collect();
            format!("{head}...")
        } else {
            rest.to_string()
        };

        Self {
            message: message.into(),
            offset,
            line,
            column,
            snippet,
        }
    }
}

/// The widget has no usable DOT text to render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("no DOT column configured")]
    MissingColumn,
    #[error("no data rows available")]
    NoRows,
    #[error("column `{0}` is missing from the first row")]
    MissingValue(String),
    #[error("column `{0}` does not hold text")]
    NotText(String),
    #[error("DOT string is empty")]
    EmptyDot,
}

/// A graph model that violates the model invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("edge references unknown node `{0}`")]
    UnknownNode(String),
    #[error("node sizer returned an invalid size for `{id}`")]
    InvalidNodeSize { id: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
