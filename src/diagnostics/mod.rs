use crate::execution_engine::ExecutionError;
use std::path::Path;
pub mod color;


pub struct Span {
    pub line: usize,
    pub column: usize,
}

fn get_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}

/// 1-based column of `needle` in the line, or of the first non-blank
/// character when there is no needle to look for.
fn find_column_in_line(line_text: &str, needle: Option<&str>) -> usize {
    if let Some(n) = needle {
        if !n.is_empty() {
            if let Some(pos) = line_text.find(n) {
                return pos + 1;
            }
        }
    }
    line_text.len() - line_text.trim_start().len() + 1
}

fn suggest(message: &str) -> Option<String> {
    let m = message.to_lowercase();
    if m.contains("nested function definitions") {
        return Some("move the inner function to module level".to_string());
    }
    if m.contains("unindent does not match") {
        return Some("use the same indentation as an enclosing block".to_string());
    }
    if m.contains("chained assignment") {
        return Some("split it into one assignment per name".to_string());
    }
    if m.contains("keyword arguments") {
        return Some("pass arguments by position".to_string());
    }
    if m.contains("unterminated string") {
        return Some("close the string with a matching quote".to_string());
    }
    None
}

fn render_caret(line_text: &str, column: usize) -> String { color::caret_line(line_text, column) }

pub fn emit_basic(
    title: &str,
    file_path: &Path,
    source: &str,
    span: Option<Span>,
    lexeme_hint: Option<&str>,
    message: &str,
) -> String {
    let (line, column, rendered) = if let Some(sp) = span.as_ref() {
        let line_text = get_line(source, sp.line).unwrap_or("");
        let col = if sp.column == 0 {
            find_column_in_line(line_text, lexeme_hint)
        } else { sp.column };
        (sp.line, col, render_caret(line_text, col))
    } else {
        (1, 1, String::new())
    };
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", color::error_tag(), color::bold(&color::red(title))));
    out.push_str(&format!("{}\n", color::location(&file_path.display().to_string(), line, column)));
    if !rendered.is_empty() {
        out.push_str(&rendered);
        out.push('\n');
    }
    out.push_str("   |\n");
    if !title.contains(message) {
        out.push_str(&format!("   = {}\n", message));
    }
    if let Some(help) = suggest(message) {
        out.push_str(&format!("   = {} {}\n", color::help_tag(), help));
    }
    out
}

pub fn from_execution_error(
    file_path: &Path,
    source: &str,
    err: &ExecutionError,
) -> String {
    match err {
        ExecutionError::ParserError(pe) => {
            emit_basic(
                &format!("Parser error: {}", pe.message),
                file_path,
                source,
                Some(Span { line: pe.line, column: 0 }),
                None,
                &pe.message,
            )
        }
        ExecutionError::LexerError(le) => {
            emit_basic(
                &format!("Lexer error: {}", le.message),
                file_path,
                source,
                Some(Span { line: le.line, column: 0 }),
                None,
                &le.message,
            )
        }
        ExecutionError::FunctionNotFound { name, available } => {
            let mut rendered = emit_basic(
                &format!("Function '{}' not found", name),
                file_path,
                source,
                None,
                None,
                "the function to translate must be defined at module level",
            );
            if let Some(candidate) = closest_name(name, available) {
                rendered.push_str(&format!("   = {} did you mean '{}'?\n", color::help_tag(), candidate));
            } else if !available.is_empty() {
                rendered.push_str(&format!(
                    "   = {} available functions: {}\n",
                    color::help_tag(),
                    available.join(", ")
                ));
            }
            rendered
        }
        ExecutionError::FunctionTakesArguments { name, line, .. } => {
            let mut rendered = emit_basic(
                &format!("Function '{}' takes parameters", name),
                file_path,
                source,
                Some(Span { line: *line, column: 0 }),
                Some("("),
                &err.to_string(),
            );
            rendered.push_str(&format!(
                "   = {} wrap the call in a zero-argument function and translate that instead\n",
                color::help_tag()
            ));
            rendered
        }
        ExecutionError::CCodeGenError(ce) => {
            emit_basic(
                "Code generation error",
                file_path,
                source,
                None,
                None,
                &ce.to_string(),
            )
        }
        ExecutionError::IoError(ioe) => {
            emit_basic(
                "I/O error",
                file_path,
                source,
                None,
                None,
                &ioe.to_string(),
            )
        }
        ExecutionError::CompilationFailed { message } => {
            emit_basic(
                "C compilation failed",
                file_path,
                source,
                None,
                None,
                message.trim_end(),
            )
        }
    }
}

/// Closest candidate within a small edit distance.
fn closest_name<'a>(name: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (edit_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.as_str())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let mut dp = vec![vec![0; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() { row[0] = i; }
    for j in 0..=b.len() { dp[0][j] = j; }
    let ab = a.as_bytes();
    let bb = b.as_bytes();
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if ab[i - 1] == bb[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}
