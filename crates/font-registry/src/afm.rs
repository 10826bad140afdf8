//! Adobe Font Metrics (AFM) parsing for Type 1 fonts.

use std::collections::HashMap;

use crate::errors::{AfmError, AfmErrorKind};

/// Metrics of a single character from the `CharMetrics` section.
#[derive(Debug, Clone)]
pub struct AfmChar {
    /// Character code; -1 for unencoded characters.
    pub code: i32,
    /// Horizontal advance width in 1/1000 em units; -1 if not recorded.
    pub width: i32,
    /// PostScript character name, if recorded.
    pub name: Option<String>,
}

/// Parsed Adobe Font Metrics: global attributes plus per-character metrics.
#[derive(Debug, Clone, Default)]
pub struct AfmModel {
    attributes: HashMap<String, String>,
    chars: Vec<AfmChar>,
    by_code: HashMap<i32, usize>,
    by_name: HashMap<String, usize>,
}

impl AfmModel {
    /// Parses AFM text.
    ///
    /// # Errors
    ///
    /// Fails if the `StartFontMetrics` / `EndFontMetrics` markers are absent,
    /// or if a character metrics field carries a malformed value.
    pub fn parse(text: &str) -> Result<Self, AfmError> {
        // (1-based line number, trimmed line) for all non-empty lines.
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        let start_ok = lines
            .first()
            .is_some_and(|(_, line)| keyword_of(line) == "StartFontMetrics");
        if !start_ok {
            return Err(AfmError {
                kind: AfmErrorKind::MissingStartMarker,
                line: lines.first().map_or(1, |&(line_no, _)| line_no),
            });
        }

        let mut this = Self::default();
        let mut pos = 1;
        let mut terminated = false;
        while pos < lines.len() {
            let (_, line) = lines[pos];
            let keyword = keyword_of(line);
            match keyword {
                "EndFontMetrics" => {
                    terminated = true;
                    break;
                }
                "Comment" => {}
                "StartCharMetrics" => {
                    pos = this.parse_char_metrics(&lines, pos + 1)?;
                    continue;
                }
                _ if keyword.starts_with("Start") => {
                    pos = skip_block(&lines, pos + 1);
                    continue;
                }
                _ => {
                    let value = line[keyword.len()..].trim();
                    this.attributes.insert(keyword.to_owned(), value.to_owned());
                }
            }
            pos += 1;
        }
        if !terminated {
            return Err(AfmError {
                kind: AfmErrorKind::MissingEndMarker,
                line: lines.last().map_or(1, |&(line_no, _)| line_no),
            });
        }
        Ok(this)
    }

    /// Parses lines of the `CharMetrics` block starting at `pos`. Returns the
    /// index of the line following `EndCharMetrics`.
    fn parse_char_metrics(
        &mut self,
        lines: &[(usize, &str)],
        mut pos: usize,
    ) -> Result<usize, AfmError> {
        while pos < lines.len() {
            let (line_no, line) = lines[pos];
            pos += 1;
            if keyword_of(line) == "EndCharMetrics" {
                break;
            }

            let mut code = -1;
            let mut width = -1;
            let mut name = None;
            let mut recognized = false;
            for field in line.split(';') {
                let field = field.trim();
                let mut tokens = field.split_whitespace();
                let Some(key) = tokens.next() else {
                    continue;
                };
                match key {
                    "C" => {
                        code = parse_number(next_value(&mut tokens, "C", line_no)?, line_no)?;
                        recognized = true;
                    }
                    "CH" => {
                        let token = next_value(&mut tokens, "CH", line_no)?;
                        let digits = token.trim_start_matches('<').trim_end_matches('>');
                        code = i32::from_str_radix(digits, 16).map_err(|_| AfmError {
                            kind: AfmErrorKind::InvalidNumber(token.to_owned()),
                            line: line_no,
                        })?;
                        recognized = true;
                    }
                    "WX" | "W0X" | "W" | "W0" => {
                        let keyword = match key {
                            "WX" => "WX",
                            "W0X" => "W0X",
                            "W" => "W",
                            _ => "W0",
                        };
                        width = parse_number(next_value(&mut tokens, keyword, line_no)?, line_no)?;
                        recognized = true;
                    }
                    "N" => {
                        name = Some(next_value(&mut tokens, "N", line_no)?.to_owned());
                        recognized = true;
                    }
                    _ => {} // unknown fields (B, L, etc.) are ignored
                }
            }

            if recognized {
                let idx = self.chars.len();
                if code >= 0 {
                    self.by_code.entry(code).or_insert(idx);
                }
                if let Some(name) = &name {
                    self.by_name.entry(name.clone()).or_insert(idx);
                }
                self.chars.push(AfmChar { code, width, name });
            }
        }
        Ok(pos)
    }

    /// Gets a global attribute value (e.g., `FontName`).
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Gets all parsed character metrics in file order.
    pub fn chars(&self) -> &[AfmChar] {
        &self.chars
    }

    /// Gets the metrics of a character by its code.
    pub fn char_by_code(&self, code: i32) -> Option<&AfmChar> {
        self.by_code.get(&code).map(|&idx| &self.chars[idx])
    }

    /// Gets the metrics of a character by its PostScript name.
    pub fn char_by_name(&self, name: &str) -> Option<&AfmChar> {
        self.by_name.get(name).map(|&idx| &self.chars[idx])
    }
}

fn keyword_of(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

fn next_value<'a>(
    tokens: &mut std::str::SplitWhitespace<'a>,
    keyword: &'static str,
    line_no: usize,
) -> Result<&'a str, AfmError> {
    tokens.next().ok_or(AfmError {
        kind: AfmErrorKind::MissingValue(keyword),
        line: line_no,
    })
}

/// Skips an unknown `Start*` block, with support for nested blocks. Returns the
/// index of the line following the matching `End*` marker.
fn skip_block(lines: &[(usize, &str)], mut pos: usize) -> usize {
    let mut depth = 1_usize;
    while pos < lines.len() {
        let keyword = keyword_of(lines[pos].1);
        pos += 1;
        if keyword == "EndFontMetrics" {
            // Unterminated block; hand the marker back to the main loop so the
            // metrics as a whole still terminate.
            return pos - 1;
        } else if keyword.starts_with("Start") {
            depth += 1;
        } else if keyword.starts_with("End") {
            depth -= 1;
            if depth == 0 {
                break;
            }
        }
    }
    pos
}

/// Parses a numeric field value. Fractional widths are rounded to the nearest
/// integer.
fn parse_number(token: &str, line_no: usize) -> Result<i32, AfmError> {
    if let Ok(value) = token.parse::<i32>() {
        return Ok(value);
    }
    let parsed = token.parse::<f64>().map_err(|_| AfmError {
        kind: AfmErrorKind::InvalidNumber(token.to_owned()),
        line: line_no,
    })?;
    #[allow(clippy::cast_possible_truncation)] // AFM widths fit into i32
    Ok(parsed.round() as i32)
}
