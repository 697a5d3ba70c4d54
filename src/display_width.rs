use unicode_width::UnicodeWidthStr;

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Split a DOT label into display lines.
///
/// `\n`, `\l` and `\r` terminate a line (a trailing terminator does not open
/// a new empty line), as does a literal newline. `\\` collapses to a single
/// backslash; any other escape is kept verbatim.
pub fn split_label(label: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = label.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some('n' | 'l' | 'r') => {
                    chars.next();
                    lines.push(std::mem::take(&mut current));
                }
                Some('\\') => {
                    chars.next();
                    current.push('\\');
                }
                _ => current.push('\\'),
            },
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {}
            _ => current.push(c),
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Maximum display width among label lines.
pub fn multiline_width(lines: &[String]) -> usize {
    lines
        .iter()
        .map(|line| display_width(line))
        .max()
        .unwrap_or(0)
}
