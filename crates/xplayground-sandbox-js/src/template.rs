//! Run template that embeds the user's source.
//!
//! The source is spliced in verbatim. It is never escaped: it only ever runs
//! inside a fresh context whose sole outside reference is the relay outlet.
//! The user's code gets its own function scope, so its declarations cannot
//! shadow the catch reporter.

use std::sync::OnceLock;

use regex::Regex;

const TEMPLATE_HEAD: &str = "(function () {\n  try { (function () {\n";
const TEMPLATE_TAIL: &str = "\n  })(); } catch (err) {\n    __relay_report(err);\n  }\n})();\n";

/// Template line on which the user's first line lands.
const BODY_FIRST_LINE: u32 = 3;

/// Embed `code` into the run template.
pub fn render(code: &str) -> String {
    let mut script = String::with_capacity(TEMPLATE_HEAD.len() + code.len() + TEMPLATE_TAIL.len());
    script.push_str(TEMPLATE_HEAD);
    script.push_str(code);
    script.push_str(TEMPLATE_TAIL);
    script
}

/// Uncaught error text split into message and a source position relative to
/// the user's code. Unknown positions are reported as `0:0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

fn position_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:\s+at)?\s+line (\d+), col(?:umn)? (\d+)").expect("valid position pattern")
    })
}

/// Pull the engine's `line N, col M` suffix out of an error message.
pub fn locate(raw: &str) -> ErrorLocation {
    let Some(caps) = position_pattern().captures(raw) else {
        return ErrorLocation {
            message: raw.trim().to_string(),
            line: 0,
            column: 0,
        };
    };

    let line: u32 = caps[1].parse().unwrap_or(0);
    let column: u32 = caps[2].parse().unwrap_or(0);
    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let mut message = String::with_capacity(raw.len());
    message.push_str(&raw[..whole.start]);
    message.push_str(&raw[whole.end..]);

    ErrorLocation {
        message: message.trim().to_string(),
        line: if line >= BODY_FIRST_LINE {
            line - (BODY_FIRST_LINE - 1)
        } else {
            line
        },
        column,
    }
}
