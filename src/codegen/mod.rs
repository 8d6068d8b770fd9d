//! Recursive-descent parser synthesis from a deterministic LL(1) table.
//!
//! The walk over the table lives here; each target language only knows how
//! to spell the individual pieces through [`Emitter`].

mod c;
mod python;
mod rust;

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use log::debug;

use crate::grammar::{
    error::GenerateError, grammar::END_MARK_INDEX, ll1_parsing_table::LL1Table, Grammar,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Python,
    Rust,
    C,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Python, Backend::Rust, Backend::C];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Python => "python",
            Backend::Rust => "rust",
            Backend::C => "c",
        }
    }

    fn emitter(&self) -> &'static dyn Emitter {
        match self {
            Backend::Python => &python::Python,
            Backend::Rust => &rust::Rust,
            Backend::C => &c::C,
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown backend \"{}\", expected one of: {}",
                    s,
                    Backend::ALL.map(|b| b.name()).join(", ")
                )
            })
    }
}

/// Line-oriented output buffer with four-space indentation.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    level: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.level {
                self.buf.push_str("    ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// What a branch is selected on. The end of input is its own case so that
/// no input token can be mistaken for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead<'a> {
    Terminal(&'a str),
    End,
}

/// The pieces a target language must provide. Terminal names arrive raw;
/// quoting them is the emitter's job. `expected` lists terminal names with
/// the end of input spelled `$`.
pub trait Emitter {
    fn prologue(&self, out: &mut CodeWriter, start: &str, procedures: &[&str]);
    fn begin_procedure(&self, out: &mut CodeWriter, procedure: &str, non_terminal: &str);
    /// Opens the branch taken on `lookahead`. `first` is set for the first
    /// branch of a procedure.
    fn branch(&self, out: &mut CodeWriter, first: bool, lookahead: Lookahead);
    fn end_branch(&self, out: &mut CodeWriter);
    fn match_terminal(&self, out: &mut CodeWriter, terminal: &str);
    fn call_non_terminal(&self, out: &mut CodeWriter, procedure: &str);
    fn empty_body(&self, _out: &mut CodeWriter) {}
    /// The fallback when no branch applies. `no_branches` is set when the
    /// procedure has no branch at all.
    fn syntax_error(
        &self,
        out: &mut CodeWriter,
        no_branches: bool,
        non_terminal: &str,
        expected: &[&str],
    );
    fn end_procedure(&self, out: &mut CodeWriter);
    fn epilogue(&self, out: &mut CodeWriter, start: &str);
}

/// A double-quoted literal valid in every supported target.
pub(crate) fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '\\' || c == '"' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// `parse_<name>` with primes spelled out and anything else outside
/// `[A-Za-z0-9_]` replaced by `_`.
pub fn procedure_name(non_terminal: &str) -> String {
    let mut name = String::from("parse_");
    for c in non_terminal.chars() {
        match c {
            '\'' => name.push_str("_prime"),
            c if c.is_ascii_alphanumeric() || c == '_' => name.push(c),
            _ => name.push('_'),
        }
    }
    name
}

fn procedure_names(g: &Grammar) -> BTreeMap<usize, String> {
    let mut names: BTreeMap<usize, String> = BTreeMap::new();
    for nt in g.non_terminal_iter() {
        let base = procedure_name(&nt.name);
        let mut name = base.clone();
        let mut n = 2;
        while names.values().any(|v| *v == name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        names.insert(nt.index, name);
    }
    names
}

/// Synthesizes a recursive-descent parser for `g` in the language of
/// `backend`. A table with any conflicting cell is refused.
pub fn generate_parser(
    table: &LL1Table,
    g: &Grammar,
    backend: Backend,
) -> Result<String, GenerateError> {
    let code = generate_with(table, g, backend.emitter())?;
    debug!(
        "{} parser generated with {} procedure(s)",
        backend,
        table.rows.len()
    );
    Ok(code)
}

/// Walks the table through any [`Emitter`]. One procedure per non-terminal,
/// one branch per populated cell of its row, in column order.
pub fn generate_with(
    table: &LL1Table,
    g: &Grammar,
    emitter: &dyn Emitter,
) -> Result<String, GenerateError> {
    table.require_ll1(g)?;

    let names = procedure_names(g);
    let start = names[&g.start_symbol()].as_str();
    let procedures: Vec<&str> = names.values().map(|s| s.as_str()).collect();

    let mut out = CodeWriter::new();
    emitter.prologue(&mut out, start, &procedures);

    for row in &table.rows {
        let non_terminal = g.get_symbol_name(row.non_terminal);
        emitter.begin_procedure(&mut out, &names[&row.non_terminal], non_terminal);

        let mut expected: Vec<&str> = Vec::new();
        for (&lookahead, entries) in table
            .columns
            .iter()
            .filter_map(|t| row.cells.get(t).map(|entries| (t, entries)))
        {
            let Some(entry) = entries.first() else {
                continue;
            };
            let terminal = g.get_symbol_name(lookahead);
            let on = if lookahead == END_MARK_INDEX {
                Lookahead::End
            } else {
                Lookahead::Terminal(terminal)
            };
            emitter.branch(&mut out, expected.is_empty(), on);
            expected.push(terminal);

            let body = &g.production(entry.production).body;
            if body.is_empty() {
                emitter.empty_body(&mut out);
            }
            for &symbol in body {
                if g.is_non_terminal(symbol) {
                    emitter.call_non_terminal(&mut out, &names[&symbol]);
                } else {
                    emitter.match_terminal(&mut out, g.get_symbol_name(symbol));
                }
            }
            emitter.end_branch(&mut out);
        }

        emitter.syntax_error(&mut out, expected.is_empty(), non_terminal, &expected);
        emitter.end_procedure(&mut out);
    }

    emitter.epilogue(&mut out, start);
    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Analysis;
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_from_str() {
        assert_eq!("python".parse::<Backend>(), Ok(Backend::Python));
        assert_eq!("Rust".parse::<Backend>(), Ok(Backend::Rust));
        assert_eq!("c".parse::<Backend>(), Ok(Backend::C));
        assert!("java".parse::<Backend>().is_err());
        assert_eq!(Backend::C.to_string(), "c");
    }

    #[test]
    fn procedure_names_are_identifiers() {
        assert_eq!(procedure_name("Expr'"), "parse_Expr_prime");
        assert_eq!(procedure_name("Stmt-List"), "parse_Stmt_List");
        assert_eq!(procedure_name("Énoncé"), "parse__nonc_");
    }

    #[test]
    fn colliding_procedure_names_are_numbered() {
        let g = Grammar::parse("B → B' B_prime; B' → b; B_prime → c;").unwrap();
        let names = procedure_names(&g);
        assert_eq!(
            names.values().collect::<Vec<_>>(),
            vec!["parse_B", "parse_B_prime", "parse_B_prime_2"]
        );
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a"), "\"a\"");
        assert_eq!(quote("\"\\"), "\"\\\"\\\\\"");
    }

    #[test]
    fn conflicting_table_emits_nothing() {
        let g = Grammar::parse("A → a | a b;").unwrap();
        let analysis = Analysis::new(&g);
        for backend in Backend::ALL {
            let err = generate_parser(&analysis.table, &g, backend).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Grammar is not LL(1), cannot generate parser. Conflicting cells: [A, a]"
            );
        }
    }

    #[test]
    fn writer_indents_non_empty_lines() {
        let mut out = CodeWriter::new();
        out.line("a");
        out.indent();
        out.line("b");
        out.line("");
        out.dedent();
        out.dedent();
        out.line("c");
        assert_eq!(out.finish(), "a\n    b\n\nc\n");
    }
}
