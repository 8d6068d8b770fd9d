use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Syntax,
    UndefinedSymbol,
}

/// One problem found while validating grammar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    MissingTerminator { line: usize, production: String },
    MissingArrow { line: usize, text: String },
    MissingHead { line: usize, text: String },
    MultipleHeadSymbols { line: usize, text: String },
    DanglingAlternative { line: usize, production: String },
    ReservedSymbol { line: usize, symbol: String },
    HeadNotNonTerminal { line: usize, head: String },
    UndefinedSymbol { symbol: String, production: String },
    Empty,
}

impl GrammarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrammarError::UndefinedSymbol { .. } => ErrorKind::UndefinedSymbol,
            _ => ErrorKind::Syntax,
        }
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::MissingTerminator { line, production } => write!(
                f,
                "Line {}: production \"{}\" is missing its terminator \";\"",
                line, production
            ),
            GrammarError::MissingArrow { line, text } => {
                write!(f, "Line {}: \"{}\" has no \"→\" or \"->\"", line, text)
            }
            GrammarError::MissingHead { line, text } => {
                write!(f, "Line {}: \"{}\" has an empty left side", line, text)
            }
            GrammarError::MultipleHeadSymbols { line, text } => write!(
                f,
                "Line {}: left side of \"{}\" must be a single symbol",
                line, text
            ),
            GrammarError::DanglingAlternative { line, production } => write!(
                f,
                "Line {}: production \"{}\" has an empty alternative around \"|\"",
                line, production
            ),
            GrammarError::ReservedSymbol { line, symbol } => write!(
                f,
                "Line {}: \"{}\" is reserved for the end of input",
                line, symbol
            ),
            GrammarError::HeadNotNonTerminal { line, head } => write!(
                f,
                "Line {}: head \"{}\" is not a non-terminal (must start with an uppercase letter)",
                line, head
            ),
            GrammarError::UndefinedSymbol { symbol, production } => write!(
                f,
                "Non-terminal \"{}\" used in \"{}\" has no productions",
                symbol, production
            ),
            GrammarError::Empty => write!(f, "No productions defined"),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Every error found in a grammar text, together with the productions that
/// were still well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<GrammarError>,
    pub recovered: Vec<String>,
}

impl ValidationError {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.errors.iter().any(|e| e.kind() == ErrorKind::Syntax)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages().join("\n"))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Serialize)]
struct ValidationErrorOutput {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
}

impl ValidationError {
    pub fn to_json(&self) -> serde_json::Value {
        let errors: Vec<ValidationErrorOutput> = self
            .errors
            .iter()
            .map(|e| ValidationErrorOutput {
                kind: e.kind(),
                message: e.to_string(),
                line: e.line(),
            })
            .collect();
        serde_json::json!({
            "error": "Grammar validation errors",
            "details": errors,
            "recovered": self.recovered,
        })
    }
}

impl GrammarError {
    pub fn line(&self) -> Option<usize> {
        match self {
            GrammarError::MissingTerminator { line, .. }
            | GrammarError::MissingArrow { line, .. }
            | GrammarError::MissingHead { line, .. }
            | GrammarError::MultipleHeadSymbols { line, .. }
            | GrammarError::DanglingAlternative { line, .. }
            | GrammarError::ReservedSymbol { line, .. }
            | GrammarError::HeadNotNonTerminal { line, .. } => Some(*line),
            GrammarError::UndefinedSymbol { .. } | GrammarError::Empty => None,
        }
    }
}

/// Refusal to synthesize code from a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The table holds at least one conflicting cell, listed as
    /// `(non-terminal, lookahead)`.
    NotLL1 { cells: Vec<(String, String)> },
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::NotLL1 { cells } => write!(
                f,
                "Grammar is not LL(1), cannot generate parser. Conflicting cells: {}",
                cells
                    .iter()
                    .map(|(nt, t)| format!("[{}, {}]", nt, t))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for GenerateError {}

/// Failure while parsing a sentence with the LL(1) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedToken {
        position: usize,
        found: String,
        expected: Vec<String>,
    },
    NotLL1(GenerateError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                position,
                found,
                expected,
            } => write!(
                f,
                "Token {}: unexpected \"{}\", expected one of: {}",
                position,
                found,
                expected.join(", ")
            ),
            ParseError::NotLL1(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ParseError {}
