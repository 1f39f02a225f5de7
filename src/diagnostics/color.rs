use std::sync::OnceLock;

/// ANSI styling is skipped when `NO_COLOR` is set.
fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("NO_COLOR").is_none())
}

fn paint(code: &str, s: &str) -> String {
    if enabled() {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

pub fn red(s: &str) -> String { paint("31", s) }
pub fn yellow(s: &str) -> String { paint("33", s) }
pub fn blue(s: &str) -> String { paint("34", s) }
pub fn bold(s: &str) -> String { paint("1", s) }

pub fn error_tag() -> String { bold(&red("error:")) }
pub fn help_tag() -> String { bold(&yellow("help:")) }

pub fn location(path: &str, line: usize, column: usize) -> String {
    format!("  {} {}:{}:{}", blue("-->"), path, line, column)
}

/// Source line with a caret under the 1-based `column`.
pub fn caret_line(line_text: &str, column: usize) -> String {
    let pad = " ".repeat(column.saturating_sub(1));
    format!("   |\n   | {line_text}\n   | {pad}{}", red("^"))
}
