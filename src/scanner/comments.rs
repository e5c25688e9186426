//! Line comment recovery.
//!
//! `syn` keeps doc comments as attributes but drops plain `//` comments, and
//! directive annotations live in plain comments. This scanner works on the raw
//! text instead: consecutive lines whose first non-blank characters are `//`
//! form one [`CommentGroup`], the same way a blank line or code line ends a
//! comment block when reading the file.

/// One `//`, `///` or `//!` line, trimmed of leading indentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// 1-based line number in the source file
    pub line: usize,
    /// The comment text including its `//` marker
    pub text: String,
}

impl CommentLine {
    /// Whitespace-separated tokens; the comment marker is token 0
    pub fn words(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// A block of adjacent comment lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub lines: Vec<CommentLine>,
}

impl CommentGroup {
    /// Line number of the last comment line in the group
    #[must_use]
    pub fn end_line(&self) -> usize {
        self.lines.last().map(|l| l.line).unwrap_or(0)
    }
}

/// Collect every line-comment group in `source`, in file order.
///
/// Lines inside `/* ... */` blocks (nested or not) and lines that start inside
/// a string literal are skipped. Trailing comments after code on the same line
/// are not comment lines.
pub fn comment_groups(source: &str) -> Vec<CommentGroup> {
    let mut groups = Vec::new();
    let mut current: Vec<CommentLine> = Vec::new();
    let mut state = LexState::Code;

    for (idx, raw) in source.lines().enumerate() {
        let trimmed = raw.trim_start();
        if state == LexState::Code && trimmed.starts_with("//") {
            current.push(CommentLine {
                line: idx + 1,
                text: trimmed.trim_end().to_string(),
            });
            continue;
        }
        flush(&mut groups, &mut current);
        state = scan_line(raw, state);
    }
    flush(&mut groups, &mut current);
    groups
}

/// What the lexer is inside of at a line boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    /// `"..."`; an escaped newline keeps the string open
    Str,
    /// `r#"..."#` with this many hashes
    RawStr(usize),
    /// `/* ... */` at this nesting depth
    Block(usize),
}

/// Advance `state` over one line of source
fn scan_line(line: &str, mut state: LexState) -> LexState {
    let chars: Vec<char> = line.chars().collect();
    let at = |i: usize| chars.get(i).copied();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match state {
            LexState::Str => match c {
                '\\' => i += 1,
                '"' => state = LexState::Code,
                _ => {}
            },
            LexState::RawStr(hashes) => {
                if c == '"' && (1..=hashes).all(|n| at(i + n) == Some('#')) {
                    state = LexState::Code;
                    i += hashes;
                }
            }
            LexState::Block(depth) => {
                if c == '*' && at(i + 1) == Some('/') {
                    state = if depth == 1 { LexState::Code } else { LexState::Block(depth - 1) };
                    i += 1;
                } else if c == '/' && at(i + 1) == Some('*') {
                    state = LexState::Block(depth + 1);
                    i += 1;
                }
            }
            LexState::Code => match c {
                '/' if at(i + 1) == Some('/') => return state,
                '/' if at(i + 1) == Some('*') => {
                    state = LexState::Block(1);
                    i += 1;
                }
                '"' => state = LexState::Str,
                'r' if !continues_ident(i.checked_sub(1).and_then(at), i.checked_sub(2).and_then(at)) => {
                    let hashes = chars[i + 1..].iter().take_while(|&&h| h == '#').count();
                    if at(i + 1 + hashes) == Some('"') {
                        state = LexState::RawStr(hashes);
                        i += 1 + hashes;
                    }
                }
                '\'' => {
                    // char literal or lifetime
                    if at(i + 1) == Some('\\') {
                        i += 2;
                        while i < chars.len() && chars[i] != '\'' {
                            i += 1;
                        }
                    } else if at(i + 2) == Some('\'') {
                        i += 2;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    state
}

/// Whether an `r` preceded by `prev` (and `before` that) is inside an
/// identifier rather than starting a raw string; `br"..."` is still raw.
fn continues_ident(prev: Option<char>, before: Option<char>) -> bool {
    match prev {
        Some('b') => before.is_some_and(|c| c.is_alphanumeric() || c == '_'),
        Some(c) => c.is_alphanumeric() || c == '_',
        None => false,
    }
}

fn flush(groups: &mut Vec<CommentGroup>, current: &mut Vec<CommentLine>) {
    if !current.is_empty() {
        groups.push(CommentGroup {
            lines: std::mem::take(current),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_split_on_code_and_blank_lines() {
        let src = "\
// first
/// second
fn a() {}

    // indented
// still indented group

fn b() {} // trailing, ignored
";
        let groups = comment_groups(src);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].lines.len(), 2);
        assert_eq!(groups[0].lines[0].line, 1);
        assert_eq!(groups[0].end_line(), 2);
        assert_eq!(groups[1].lines[0].text, "// indented");
        assert_eq!(groups[1].end_line(), 6);
    }

    #[test]
    fn test_block_comments_are_skipped() {
        let src = "/*\n// not a line comment\n*/\n// real\n";
        let groups = comment_groups(src);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lines[0].line, 4);
    }

    #[test]
    fn test_words_keep_marker_as_first_token() {
        let line = CommentLine {
            line: 1,
            text: "/// @URL   /users".to_string(),
        };
        assert_eq!(line.words(), vec!["///", "@URL", "/users"]);
    }

    #[test]
    fn test_lines_inside_string_literals_are_not_comments() {
        let src = r##"
const HELP: &str = "usage:
//routegen:api GET /in-string
done";
const RAW: &str = r#"
// raw "quoted" text
"#;
const BYTES: &[u8] = br"
// bytes
";
const QUOTE: char = '"';
// after the quote char
fn f<'a>(s: &'a str) -> &'a str { s }
// after a lifetime
"##;
        let groups = comment_groups(src);
        let texts: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.lines.iter().map(|l| l.text.as_str()))
            .collect();
        assert_eq!(texts, vec!["// after the quote char", "// after a lifetime"]);
    }

    #[test]
    fn test_nested_and_inline_block_comments() {
        let src = "let x = 1; /* open\n// hidden\n/* nested */\n// still hidden\n*/\n// visible\n";
        let groups = comment_groups(src);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lines[0].text, "// visible");
    }

    #[test]
    fn test_escaped_quote_does_not_close_string() {
        let src = "let s = \"a \\\" b\n// inside\n\";\n// outside\n";
        let groups = comment_groups(src);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lines[0].line, 4);
    }
}
