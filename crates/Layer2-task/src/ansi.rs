//! ANSI SGR stream renderer
//!
//! Converts raw process output containing SGR color escapes into markup-safe
//! rich text for the console sink. Only the 16 basic foreground colors and
//! reset are honored; every other escape that matches the SGR shape is
//! dropped without visible effect.
//!
//! The renderer is a streaming state machine: chunks may arrive with escape
//! sequences split across chunk boundaries, so an incomplete trailing prefix
//! is buffered until more data arrives.

use regex::Regex;
use std::sync::OnceLock;

/// Reset code closing the current color span
const RESET: &str = "\u{1B}[0m";

/// Matches `ESC [ (digits ;)? (digits)? m`
fn sgr_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{1B}\\[(\\d+;)?(\\d+)?m").unwrap())
}

/// Matches a prefix that could still grow into a full SGR sequence
fn incomplete_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^\u{1B}(\\[[0-9;]*)?$").unwrap())
}

/// Fixed color table for the recognized SGR codes
fn sgr_color(code: &str) -> Option<&'static str> {
    match code {
        "\u{1B}[30m" => Some("#3B4252"), // Black
        "\u{1B}[31m" => Some("#BF616A"), // Red
        "\u{1B}[32m" => Some("#A3BE8C"), // Green
        "\u{1B}[33m" => Some("#EBCB8B"), // Yellow
        "\u{1B}[34m" => Some("#81A1C1"), // Blue
        "\u{1B}[35m" => Some("#B48EAD"), // Magenta
        "\u{1B}[36m" => Some("#88C0F0"), // Cyan
        "\u{1B}[37m" => Some("#FFFFFF"), // White
        "\u{1B}[90m" => Some("#4C566A"), // Bright Black
        "\u{1B}[91m" => Some("#BF616A"), // Bright Red
        "\u{1B}[92m" => Some("#A3BE8C"), // Bright Green
        "\u{1B}[93m" => Some("#EBCB8B"), // Bright Yellow
        "\u{1B}[94m" => Some("#81A1C1"), // Bright Blue
        "\u{1B}[95m" => Some("#B48EAD"), // Bright Magenta
        "\u{1B}[96m" => Some("#8FBCFF"), // Bright Cyan
        "\u{1B}[97m" => Some("#ECEFF4"), // Bright White
        _ => None,
    }
}

/// Escape markup-significant characters and encode non-ASCII code points as
/// numeric character references, so the output is safe to embed in the
/// rich-text sink.
fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if (c as u32) > 127 => {
                out.push_str("&#");
                out.push_str(&(c as u32).to_string());
                out.push(';');
            }
            c => out.push(c),
        }
    }
    out
}

/// Streaming SGR renderer, one instance per run session.
///
/// Each `feed` returns the markup to append after all previously returned
/// output; nothing already handed out is ever replaced. Color spans from
/// consecutive color codes never nest: an open span is closed before the
/// next one opens, and `finish` closes whatever is still open at
/// end-of-stream.
#[derive(Debug, Default)]
pub struct AnsiRenderer {
    /// Color of the currently open span, if any
    open_color: Option<&'static str>,

    /// Trailing bytes that may be the start of a split escape sequence
    pending: String,
}

impl AnsiRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a color span is currently open
    pub fn has_open_span(&self) -> bool {
        self.open_color.is_some()
    }

    /// Render one raw chunk, returning the markup to append to the sink.
    pub fn feed(&mut self, chunk: &str) -> String {
        let text = if self.pending.is_empty() {
            chunk.to_string()
        } else {
            let mut t = std::mem::take(&mut self.pending);
            t.push_str(chunk);
            t
        };

        // Hold back a trailing prefix that could still complete into an
        // SGR sequence on the next chunk.
        let cut = match text.rfind('\u{1B}') {
            Some(pos) if incomplete_pattern().is_match(&text[pos..]) => pos,
            _ => text.len(),
        };
        let (text, held) = text.split_at(cut);
        self.pending = held.to_string();

        let mut out = String::with_capacity(text.len());
        let mut last_end = 0;
        for m in sgr_pattern().find_iter(text) {
            out.push_str(&escape_markup(&text[last_end..m.start()]));

            let code = m.as_str();
            if let Some(color) = sgr_color(code) {
                if self.open_color.is_some() {
                    out.push_str("</span>");
                }
                out.push_str("<span style='color: ");
                out.push_str(color);
                out.push_str(";'>");
                self.open_color = Some(color);
            } else if code == RESET {
                if self.open_color.take().is_some() {
                    out.push_str("</span>");
                }
            }
            // Any other matched sequence (e.g. ESC[1;31m) is dropped.

            last_end = m.end();
        }
        out.push_str(&escape_markup(&text[last_end..]));
        out
    }

    /// Flush at end-of-stream: emit any buffered partial escape as literal
    /// (escaped) text and close the open span so the final output is
    /// well-formed.
    pub fn finish(&mut self) -> String {
        let mut out = String::new();
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            out.push_str(&escape_markup(&pending));
        }
        if self.open_color.take().is_some() {
            out.push_str("</span>");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_renders_as_itself() {
        let mut r = AnsiRenderer::new();
        assert_eq!(r.feed("hello\n"), "hello\n");
        assert_eq!(r.finish(), "");
    }

    #[test]
    fn test_red_error_span() {
        let mut r = AnsiRenderer::new();
        let out = r.feed("\u{1B}[31mERROR\u{1B}[0m: bad");
        assert_eq!(out, "<span style='color: #BF616A;'>ERROR</span>: bad");
        assert!(!out.contains('\u{1B}'));
    }

    #[test]
    fn test_markup_escaping() {
        let mut r = AnsiRenderer::new();
        assert_eq!(r.feed("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_non_ascii_character_references() {
        let mut r = AnsiRenderer::new();
        assert_eq!(r.feed("héllo"), "h&#233;llo");
    }

    #[test]
    fn test_unrecognized_code_dropped() {
        let mut r = AnsiRenderer::new();
        // Bold+red is matched by the SGR shape but is not in the table.
        assert_eq!(r.feed("\u{1B}[1;31mbold"), "bold");
        assert!(!r.has_open_span());
    }

    #[test]
    fn test_consecutive_colors_close_then_open() {
        let mut r = AnsiRenderer::new();
        let out = r.feed("\u{1B}[31mred\u{1B}[32mgreen\u{1B}[0m");
        assert_eq!(
            out,
            "<span style='color: #BF616A;'>red</span>\
             <span style='color: #A3BE8C;'>green</span>"
        );
        assert!(!r.has_open_span());
    }

    #[test]
    fn test_reset_without_open_span_is_noop() {
        let mut r = AnsiRenderer::new();
        assert_eq!(r.feed("\u{1B}[0mtext"), "text");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut r = AnsiRenderer::new();
        assert_eq!(r.feed("before\u{1B}[3"), "before");
        assert_eq!(r.feed("1mred"), "<span style='color: #BF616A;'>red");
        assert_eq!(r.finish(), "</span>");
    }

    #[test]
    fn test_split_reset_across_chunks() {
        let mut r = AnsiRenderer::new();
        r.feed("\u{1B}[32m");
        assert_eq!(r.feed("ok\u{1B}"), "ok");
        assert_eq!(r.feed("[0m done"), "</span> done");
    }

    #[test]
    fn test_finish_closes_open_span() {
        let mut r = AnsiRenderer::new();
        r.feed("\u{1B}[33mwarning");
        assert_eq!(r.finish(), "</span>");
        assert!(!r.has_open_span());
    }

    #[test]
    fn test_finish_flushes_pending_prefix() {
        let mut r = AnsiRenderer::new();
        assert_eq!(r.feed("x\u{1B}["), "x");
        // Stream ended mid-escape; the partial prefix comes out literal.
        assert_eq!(r.finish(), "\u{1B}[");
    }

    #[test]
    fn test_bright_palette() {
        let mut r = AnsiRenderer::new();
        let out = r.feed("\u{1B}[96mcyan\u{1B}[0m");
        assert_eq!(out, "<span style='color: #8FBCFF;'>cyan</span>");
    }
}
