//! Lexical table-reference extraction.
//!
//! This is a heuristic scan, not a parser: every identifier following a
//! `FROM` or `JOIN` keyword is reported, which means derived tables and
//! reserved-word collisions such as `EXTRACT(YEAR FROM col)` can produce
//! false positives.

use anyhow::{Result, bail};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static TABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([\w.]+)").expect("table reference pattern is valid")
});

const EXPLAIN_DIRECTIVE: &str = "EXPLAIN";

/// Remove a leading `EXPLAIN` directive (any case) and trim surrounding whitespace.
pub fn strip_explain_prefix(sql: &str) -> &str {
    let trimmed = sql.trim();
    let len = EXPLAIN_DIRECTIVE.len();

    let has_directive = trimmed
        .get(..len)
        .is_some_and(|head| head.eq_ignore_ascii_case(EXPLAIN_DIRECTIVE));
    if !has_directive {
        return trimmed;
    }

    let rest = &trimmed[len..];
    match rest.chars().next() {
        None => rest,
        Some(c) if c.is_whitespace() => rest.trim(),
        // `EXPLAINED`, `EXPLAIN_FOO`, ...
        Some(_) => trimmed,
    }
}

/// Byte offsets of every `;` outside string literals, quoted identifiers and
/// comments.
fn statement_separators(sql: &str) -> Vec<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Scan {
        Code,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut separators = Vec::new();
    let mut state = Scan::Code;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match state {
            Scan::Code => match c {
                ';' => separators.push(i),
                '\'' | '"' | '`' => state = Scan::Quoted(c),
                '#' => state = Scan::LineComment,
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    chars.next();
                    state = Scan::LineComment;
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    state = Scan::BlockComment;
                }
                _ => {}
            },
            Scan::Quoted(quote) => {
                if c == '\\' && quote != '`' {
                    chars.next();
                } else if c == quote {
                    state = Scan::Code;
                }
            }
            Scan::LineComment => {
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = Scan::Code;
                }
            }
        }
    }

    separators
}

/// Accept exactly one statement, dropping a single trailing `;`.
///
/// Input with a second statement is rejected so it never reaches the server.
pub fn single_statement(sql: &str) -> Result<&str> {
    let trimmed = sql.trim();
    let separators = statement_separators(trimmed);

    match separators.as_slice() {
        [] => Ok(trimmed),
        [last] if trimmed[last + 1..].trim().is_empty() => Ok(trimmed[..*last].trim_end()),
        _ => bail!("only a single SQL statement can be analyzed"),
    }
}

/// Returns the distinct table identifiers referenced after `FROM` / `JOIN`,
/// in order of first appearance.
pub fn extract_table_names(sql: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    TABLE_REFERENCE
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
