//! Line-oriented script parser.
//!
//! Grammar, one line at a time (lines trimmed except inside raw blocks):
//!
//! | line                | result                                          |
//! |---------------------|-------------------------------------------------|
//! | empty               | nothing                                         |
//! | `---`               | raw code block until blank line or `---`        |
//! | `# comment`         | nothing                                         |
//! | `;name{json}`       | command tag; JSON entries become values         |
//! | `:name`             | label tag                                       |
//! | `-code`             | embedded-code tag, silent                       |
//! | `=code`             | embedded-code tag, printed                      |
//! | anything else       | one `ch` tag per character; `$` emits `br`      |
//!
//! Parsing is eager and total: the whole text parses before any execution
//! begins, so a structurally invalid script never reaches the conductor.

use tracing::trace;

use crate::error::ParseError;
use crate::tag::{Tag, Value, BODY_KEY, BR_TAG, CH_TAG, CODE_TAG, LABEL_TAG, PRINT_KEY, TEXT_KEY};

/// Marker for raw code block boundaries.
const BLOCK_DELIM: &str = "---";

/// Parse full script text into the ordered tag sequence.
pub fn parse_script(src: &str) -> Result<Vec<Tag>, ParseError> {
    ScriptParser::new(src).run()
}

// ── ScriptParser ──────────────────────────────────────────────────────────────

struct ScriptParser<'a> {
    /// Remaining lines; `None` from the iterator is the end-of-input sentinel.
    lines: std::str::Lines<'a>,
    /// 1-based number of the most recently pulled line.
    line_no: usize,
    tags: Vec<Tag>,
}

impl<'a> ScriptParser<'a> {
    fn new(src: &'a str) -> Self {
        ScriptParser {
            lines: src.lines(),
            line_no: 0,
            tags: Vec::new(),
        }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line)
    }

    fn run(mut self) -> Result<Vec<Tag>, ParseError> {
        while let Some(raw) = self.next_line() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            trace!(line = self.line_no, text = line, "script line");

            if line == BLOCK_DELIM {
                self.raw_block()?;
                continue;
            }
            // Marker characters are all ASCII, so a multi-byte first
            // character always falls through to plain text.
            match line.as_bytes()[0] {
                b'#' => {}
                b';' => self.command(line)?,
                b':' => self.label(line),
                b'-' => self.code(line, false),
                b'=' => self.code(line, true),
                _ => self.text(line),
            }
        }
        Ok(self.tags)
    }

    /// `---` opens a block accumulating the following lines untrimmed, each
    /// with its newline, until a strictly empty line or a `---` line. The
    /// emitted tag has no print key (silent execution).
    fn raw_block(&mut self) -> Result<(), ParseError> {
        let opened_at = self.line_no;
        let mut code = String::new();
        loop {
            let Some(raw) = self.next_line() else {
                return Err(ParseError::new(opened_at, "unterminated raw code block"));
            };
            if raw.is_empty() || raw.trim() == BLOCK_DELIM {
                break;
            }
            code.push_str(raw);
            code.push('\n');
        }
        self.tags.push(Tag::new(CODE_TAG, code));
        Ok(())
    }

    /// `;name{json}` — the substring from the first `{` must be a JSON
    /// object of scalar values. The reserved body entry always wins over a
    /// literal `__body__` key.
    fn command(&mut self, line: &str) -> Result<(), ParseError> {
        let body = line[1..].trim();
        let Some(brace) = body.find('{') else {
            return Err(ParseError::new(self.line_no, "missing '{' in command line"));
        };
        let name = body[..brace].trim();

        let literal: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&body[brace..]).map_err(|e| {
                ParseError::new(self.line_no, format!("malformed command literal: {e}"))
            })?;

        let mut values = std::collections::BTreeMap::new();
        for (key, entry) in literal {
            values.insert(key, self.scalar(entry)?);
        }
        values.insert(BODY_KEY.to_owned(), Value::from(body));

        self.tags.push(Tag::from_values(name, values));
        Ok(())
    }

    /// Command values must fit the closed value variant; anything else is
    /// rejected at parse time so the conductor never sees it.
    fn scalar(&self, entry: serde_json::Value) -> Result<Value, ParseError> {
        match entry {
            serde_json::Value::String(s) => Ok(Value::Str(s)),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Num).ok_or_else(|| {
                ParseError::new(self.line_no, format!("unrepresentable number: {n}"))
            }),
            other => Err(ParseError::new(
                self.line_no,
                format!(
                    "unsupported command value: {other} (expected string, number, or boolean)"
                ),
            )),
        }
    }

    fn label(&mut self, line: &str) {
        let body = line[1..].trim();
        self.tags.push(Tag::new(LABEL_TAG, body));
    }

    fn code(&mut self, line: &str, print: bool) {
        let body = line[1..].trim();
        let mut tag = Tag::new(CODE_TAG, body);
        tag.set(PRINT_KEY, print);
        self.tags.push(tag);
    }

    /// Plain text: one `ch` tag per character, in order; `$` instead emits a
    /// forced break carrying the whole line.
    fn text(&mut self, line: &str) {
        for ch in line.chars() {
            if ch == '$' {
                self.tags.push(Tag::new(BR_TAG, line));
            } else {
                let mut tag = Tag::new(CH_TAG, ch);
                tag.set(TEXT_KEY, ch);
                self.tags.push(tag);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
