//! Source text frames and the tokenizer.
//!
//! Whitespace includes `,`, `;` and `#`, with `#` also opening a comment
//! that runs to the matching `#` or end of line. Quotes make a token
//! verbatim so strings can contain separators. `include` pushes a new
//! frame (up to five deep); `end` finishes the current frame early.

use crate::AsmError;

pub const MAX_TOKEN: usize = 200;
pub const MAX_INCLUDE_DEPTH: usize = 5;

/// Extension appended to include names that carry no dot.
pub const SOURCE_EXT: &str = ".tri";

struct Frame {
    bytes: Vec<u8>,
    pos: usize,
    line: usize,
    file: String,
    done: bool,
}

impl Frame {
    fn next_char(&mut self) -> Option<u8> {
        if self.done {
            return None;
        }
        let c = *self.bytes.get(self.pos)?;
        if c == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
        Some(c)
    }
}

pub struct SourceStack {
    frames: Vec<Frame>,
}

impl SourceStack {
    pub fn new(text: &str, file: &str) -> Self {
        Self {
            frames: vec![Frame {
                bytes: text.as_bytes().to_vec(),
                pos: 0,
                line: 1,
                file: file.to_string(),
                done: false,
            }],
        }
    }

    /// Begin parsing an included file. Fails (returns false) when the
    /// stack is already [`MAX_INCLUDE_DEPTH`] frames past the root.
    pub fn push(&mut self, text: String, file: String) -> bool {
        if self.frames.len() > MAX_INCLUDE_DEPTH {
            return false;
        }
        self.frames.push(Frame {
            bytes: text.into_bytes(),
            pos: 0,
            line: 1,
            file,
            done: false,
        });
        true
    }

    /// Drop the finished frame; true while frames remain.
    pub fn pop(&mut self) -> bool {
        self.frames.pop();
        !self.frames.is_empty()
    }

    pub fn line(&self) -> usize {
        self.frames.last().map_or(0, |f| f.line)
    }

    pub fn file(&self) -> &str {
        self.frames.last().map_or("", |f| f.file.as_str())
    }

    /// Next token of the current frame, or `None` at end of frame (or on
    /// an `end` keyword). Operand readers call this too, so a token never
    /// spans an include boundary.
    pub fn next_token(&mut self) -> Result<Option<String>, AsmError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(None);
        };
        let mut c = match frame.next_char() {
            Some(c) => c,
            None => return Ok(None),
        };
        while is_separator(c) {
            if c == b'#' {
                loop {
                    match frame.next_char() {
                        None => return Ok(None),
                        Some(b'#') | Some(b'\n') => break,
                        Some(_) => {}
                    }
                }
            }
            c = match frame.next_char() {
                Some(c) => c,
                None => return Ok(None),
            };
        }
        let mut token = Vec::new();
        let mut verbatim = false;
        loop {
            if c == b'"' || c == b'\'' {
                verbatim = !verbatim;
            }
            if token.len() == MAX_TOKEN {
                return Err(AsmError::TokenTooLong {
                    line: frame.line,
                    file: frame.file.clone(),
                });
            }
            token.push(c);
            match frame.next_char() {
                None => break,
                Some(next) => {
                    if is_separator(next) && !verbatim {
                        break;
                    }
                    c = next;
                }
            }
        }
        let token = String::from_utf8_lossy(&token).into_owned();
        if token == "end" {
            frame.done = true;
            return Ok(None);
        }
        Ok(Some(token))
    }
}

fn is_separator(c: u8) -> bool {
    c.is_ascii_whitespace() || c == b',' || c == b';' || c == b'#'
}
