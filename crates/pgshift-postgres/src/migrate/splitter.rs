//! Splits a migration body into independently executable statements.
//!
//! The splitter works line by line. A statement ends on a line whose trimmed
//! text ends with `;`, unless that line is inside a dollar-quoted block
//! (`$$ ... $$` or `$tag$ ... $tag$`), which is how PostgreSQL function and
//! procedure bodies embed their own semicolons.

use std::sync::LazyLock;

use regex::Regex;

use crate::TRACING_TARGET_MIGRATION;

/// Matches a PostgreSQL dollar-quote delimiter: `$$` or `$identifier$`.
static DOLLAR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$").expect("dollar-quote pattern is valid")
});

const LINE_COMMENT: &str = "--";

/// Dollar-quoting state carried from one line to the next.
#[derive(Debug, Default)]
struct QuoteState {
    open_tag: Option<String>,
}

impl QuoteState {
    #[inline]
    fn is_open(&self) -> bool {
        self.open_tag.is_some()
    }

    /// Applies every delimiter found on `line`, in order.
    ///
    /// A delimiter opens a block when none is open and closes it only when it
    /// repeats the open tag exactly; any other tag inside a block is content.
    fn scan(&mut self, line: &str) {
        for tag in DOLLAR_TAG.find_iter(line).map(|m| m.as_str()) {
            match self.open_tag.as_deref() {
                None => self.open_tag = Some(tag.to_owned()),
                Some(open) if open == tag => self.open_tag = None,
                Some(_) => {}
            }
        }
    }
}

/// Splits raw migration SQL into an ordered list of non-empty statements.
///
/// - Line endings are normalized to `\n`.
/// - Blank and `--` comment lines preceding a statement are dropped; comment
///   lines inside a statement are kept verbatim and never end it.
/// - Semicolons inside dollar-quoted blocks never end a statement.
/// - Tags follow PostgreSQL's identifier rule (`$$` or `$name$`, the name not
///   starting with a digit), so positional parameters such as `$1` never open
///   or close a block.
/// - A trailing statement without a terminating semicolon is still returned.
///
/// An unterminated dollar-quoted block absorbs the rest of the input into
/// one final statement.
///
/// # Example
///
/// ```
/// use pgshift_postgres::split_statements;
///
/// let sql = "CREATE TABLE t (id int);\n\
///            CREATE FUNCTION f() RETURNS void AS $$\n\
///            BEGIN PERFORM 1; END;\n\
///            $$ LANGUAGE plpgsql;\n";
///
/// let statements = split_statements(sql);
/// assert_eq!(statements.len(), 2);
/// assert!(statements[1].ends_with("LANGUAGE plpgsql;"));
/// ```
pub fn split_statements(sql: &str) -> Vec<String> {
    let normalized = sql.replace("\r\n", "\n").replace('\r', "\n");

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote = QuoteState::default();

    for line in normalized.lines() {
        let trimmed = line.trim();

        if !quote.is_open() {
            let is_comment = trimmed.starts_with(LINE_COMMENT);
            if trimmed.is_empty() || is_comment {
                if !current.trim().is_empty() {
                    current.push_str(line);
                    current.push('\n');
                }
                continue;
            }
        }

        current.push_str(line);
        current.push('\n');
        quote.scan(line);

        if !quote.is_open() && trimmed.ends_with(';') {
            push_statement(&mut statements, &current);
            current.clear();
        }
    }

    if quote.is_open() {
        tracing::warn!(
            target: TRACING_TARGET_MIGRATION,
            open_tag = quote.open_tag.as_deref().unwrap_or_default(),
            "Unterminated dollar-quoted block, remaining input kept as one statement"
        );
    }

    push_statement(&mut statements, &current);

    tracing::debug!(
        target: TRACING_TARGET_MIGRATION,
        statement_count = statements.len(),
        "Split migration into statements"
    );

    statements
}

fn push_statement(statements: &mut Vec<String>, buffer: &str) {
    let statement = buffer.trim();
    if !statement.is_empty() {
        statements.push(statement.to_owned());
    }
}
