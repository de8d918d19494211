/// Line-oriented TOML tokenizer and themed styling.
///
/// This is a display highlighter, not a validator: malformed input is still
/// tokenized best-effort and printed verbatim.
use clap::ValueEnum;
use console::Style;

/// Named color themes for highlighted TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Theme {
    /// Monokai-like 256-color palette.
    #[default]
    Monokai,
    /// GitHub dark palette.
    GithubDark,
    /// Basic 16-color ANSI palette.
    Ansi,
    /// No colors, bold table headers only.
    Plain,
}

impl Theme {
    /// Look up a theme by name (case-insensitive, `_` and `-` interchangeable).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        Self::from_str(&normalized, true).ok()
    }

    fn palette(self) -> Palette {
        match self {
            Self::Monokai => Palette {
                table: Style::new().color256(197).bold(),
                key: Style::new().color256(81),
                string: Style::new().color256(186),
                number: Style::new().color256(141),
                boolean: Style::new().color256(141),
                comment: Style::new().color256(242).italic(),
                punctuation: Style::new().color256(255),
                line_number: Style::new().color256(240),
            },
            Self::GithubDark => Palette {
                table: Style::new().color256(209).bold(),
                key: Style::new().color256(117),
                string: Style::new().color256(153),
                number: Style::new().color256(75),
                boolean: Style::new().color256(75),
                comment: Style::new().color256(245).italic(),
                punctuation: Style::new().color256(250),
                line_number: Style::new().color256(243),
            },
            Self::Ansi => Palette {
                table: Style::new().blue().bold(),
                key: Style::new().cyan(),
                string: Style::new().green(),
                number: Style::new().magenta(),
                boolean: Style::new().yellow(),
                comment: Style::new().dim(),
                punctuation: Style::new(),
                line_number: Style::new().dim(),
            },
            Self::Plain => Palette {
                table: Style::new().bold(),
                key: Style::new(),
                string: Style::new(),
                number: Style::new(),
                boolean: Style::new(),
                comment: Style::new(),
                punctuation: Style::new(),
                line_number: Style::new(),
            },
        }
    }
}

struct Palette {
    table: Style,
    key: Style,
    string: Style,
    number: Style,
    boolean: Style,
    comment: Style,
    punctuation: Style,
    line_number: Style,
}

/// Token classes produced by [`tokenize_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Table,
    Key,
    String,
    Number,
    Boolean,
    Comment,
    Punctuation,
    Whitespace,
    Other,
}

/// Multi-line string delimiter still open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carry {
    None,
    Basic,
    Literal,
}

impl Carry {
    fn delimiter(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Basic => Some("\"\"\""),
            Self::Literal => Some("'''"),
        }
    }
}

/// Split one line into tokens. `carry` is the multi-line string state from the
/// previous line; the returned `Carry` is the state for the next one.
#[must_use]
pub fn tokenize_line(line: &str, carry: Carry) -> (Vec<(TokenKind, &str)>, Carry) {
    let mut tokens = Vec::new();
    let mut rest = line;

    if let Some(delim) = carry.delimiter() {
        match find_close(rest, delim, carry == Carry::Basic) {
            Some(end) => {
                tokens.push((TokenKind::String, &rest[..end]));
                rest = &rest[end..];
            }
            None => {
                tokens.push((TokenKind::String, rest));
                return (tokens, carry);
            }
        }
    } else {
        let trimmed = rest.trim_start();
        let indent = &rest[..rest.len() - trimmed.len()];
        if trimmed.starts_with('[') {
            if !indent.is_empty() {
                tokens.push((TokenKind::Whitespace, indent));
            }
            let end = header_end(trimmed);
            tokens.push((TokenKind::Table, &trimmed[..end]));
            rest = &trimmed[end..];
        }
    }

    let mut expect_key = carry == Carry::None && tokens.is_empty();
    let mut next_carry = Carry::None;

    while !rest.is_empty() {
        let c = rest.chars().next().unwrap_or(' ');
        let (kind, len) = if c.is_whitespace() {
            let len = rest.len() - rest.trim_start().len();
            (TokenKind::Whitespace, len)
        } else if c == '#' {
            (TokenKind::Comment, rest.len())
        } else if c == '"' || c == '\'' {
            let (len, open) = string_len(rest);
            if let Some(open) = open {
                next_carry = open;
            }
            let kind = if expect_key && followed_by_eq(&rest[len..]) {
                TokenKind::Key
            } else {
                TokenKind::String
            };
            (kind, len)
        } else if "=[]{},.".contains(c) {
            if c == '{' || c == ',' {
                expect_key = true;
            } else if c == '=' {
                expect_key = false;
            }
            (TokenKind::Punctuation, c.len_utf8())
        } else {
            let len = rest
                .find(|ch: char| {
                    ch.is_whitespace()
                        || "=[]{},#".contains(ch)
                        || (expect_key && (ch == '.' || ch == '"' || ch == '\''))
                })
                .unwrap_or(rest.len());
            let word = &rest[..len];
            let kind = if expect_key && followed_by_eq(&rest[len..]) {
                TokenKind::Key
            } else if word == "true" || word == "false" {
                TokenKind::Boolean
            } else if is_number_like(word) {
                TokenKind::Number
            } else {
                TokenKind::Other
            };
            (kind, len.max(c.len_utf8()))
        };
        tokens.push((kind, &rest[..len]));
        rest = &rest[len..];
    }

    (tokens, next_carry)
}

/// Byte offset just past `]` / `]]` of a table header.
fn header_end(s: &str) -> usize {
    let double = s.starts_with("[[");
    let close = if double { "]]" } else { "]" };
    s.find(close).map_or(s.len(), |i| i + close.len())
}

/// Byte offset just past the closing `delim`, honoring `\` escapes in basic strings.
fn find_close(s: &str, delim: &str, escapes: bool) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(delim.as_bytes()) {
            return Some(i + delim.len());
        }
        i += 1;
    }
    None
}

/// Length of the string token at the start of `s`, and the carry if it is an
/// unterminated multi-line string.
fn string_len(s: &str) -> (usize, Option<Carry>) {
    let basic = s.starts_with('"');
    let (delim, carry) = if basic {
        ("\"\"\"", Carry::Basic)
    } else {
        ("'''", Carry::Literal)
    };

    if s.starts_with(delim) {
        let body = &s[delim.len()..];
        return match find_close(body, delim, basic) {
            Some(end) => (delim.len() + end, None),
            None => (s.len(), Some(carry)),
        };
    }

    let quote = &s[..1];
    let body = &s[1..];
    let end = find_close(body, quote, basic).map_or(body.len(), |e| e);
    (1 + end, None)
}

fn followed_by_eq(s: &str) -> bool {
    let t = s.trim_start();
    t.starts_with('=') || t.starts_with('.')
}

fn is_number_like(word: &str) -> bool {
    let body = word.trim_start_matches(['+', '-']);
    matches!(body, "inf" | "nan") || body.starts_with(|c: char| c.is_ascii_digit())
}

/// Renders TOML text with a theme.
pub struct Highlighter {
    palette: Palette,
    color: bool,
}

impl Highlighter {
    #[must_use]
    pub fn new(theme: Theme, color: bool) -> Self {
        Self {
            palette: theme.palette(),
            color,
        }
    }

    /// Highlight every line of `text`, optionally prefixed with right-aligned line numbers.
    #[must_use]
    pub fn render(&self, text: &str, line_numbers: bool) -> String {
        let line_count = text.lines().count();
        let width = line_count.to_string().len();
        let mut out = String::with_capacity(text.len() * 2);
        let mut carry = Carry::None;

        for (i, line) in text.lines().enumerate() {
            if line_numbers {
                let number = format!("{:>width$} ", i + 1);
                out.push_str(&self.paint(&self.palette.line_number, &number));
            }
            let (tokens, next) = tokenize_line(line, carry);
            carry = next;
            for (kind, token) in tokens {
                match self.style(kind) {
                    Some(style) => out.push_str(&self.paint(style, token)),
                    None => out.push_str(token),
                }
            }
            out.push('\n');
        }
        out
    }

    fn style(&self, kind: TokenKind) -> Option<&Style> {
        match kind {
            TokenKind::Table => Some(&self.palette.table),
            TokenKind::Key => Some(&self.palette.key),
            TokenKind::String => Some(&self.palette.string),
            TokenKind::Number => Some(&self.palette.number),
            TokenKind::Boolean => Some(&self.palette.boolean),
            TokenKind::Comment => Some(&self.palette.comment),
            TokenKind::Punctuation => Some(&self.palette.punctuation),
            TokenKind::Whitespace | TokenKind::Other => None,
        }
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        style
            .clone()
            .force_styling(self.color)
            .apply_to(text)
            .to_string()
    }
}
