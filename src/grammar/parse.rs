use log::debug;

use super::{
    error::{GrammarError, ValidationError},
    grammar::is_non_terminal_name,
    Grammar, END_MARK,
};

const ARROWS: [&str; 2] = ["→", "->"];
const ALTERNATIVE: &str = "|";
const TERMINATOR: char = ';';
const EPSILON_SPELLINGS: [&str; 3] = ["ε", "epsilon", "ɛ"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Arrow,
    Alternative,
    /// A lone `;`, either a terminal or the terminator depending on what follows.
    Semicolon,
    Terminator,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    kind: TokenKind,
    line: usize,
}

fn classify(text: &str) -> TokenKind {
    if ARROWS.contains(&text) {
        TokenKind::Arrow
    } else if text == ALTERNATIVE {
        TokenKind::Alternative
    } else {
        TokenKind::Word
    }
}

fn tokenize(grammar: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (i, line) in grammar.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for word in line.split_whitespace() {
            let line = i + 1;
            if word.len() == 1 && word.starts_with(TERMINATOR) {
                tokens.push(Token {
                    text: word,
                    kind: TokenKind::Semicolon,
                    line,
                });
            } else if let Some(stripped) = word.strip_suffix(TERMINATOR) {
                tokens.push(Token {
                    text: stripped,
                    kind: classify(stripped),
                    line,
                });
                tokens.push(Token {
                    text: ";",
                    kind: TokenKind::Terminator,
                    line,
                });
            } else {
                tokens.push(Token {
                    text: word,
                    kind: classify(word),
                    line,
                });
            }
        }
    }

    // A lone `;` ends the production when nothing follows it or when the
    // next two tokens open another production.
    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::Semicolon {
            continue;
        }
        let opens_production = matches!(
            (tokens.get(i + 1), tokens.get(i + 2)),
            (Some(a), Some(b)) if a.kind == TokenKind::Word && b.kind == TokenKind::Arrow
        );
        tokens[i].kind = if i + 1 == tokens.len() || opens_production {
            TokenKind::Terminator
        } else {
            TokenKind::Word
        };
    }

    tokens
}

struct Segment<'t, 'a> {
    tokens: &'t [Token<'a>],
    terminated: bool,
}

impl Segment<'_, '_> {
    fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Splits the token stream into one segment per production. A segment ends
/// at a terminator, or is cut short when a new `Head →` starts after an
/// arrow has already been seen.
fn split_productions<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<Segment<'t, 'a>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut seen_arrow = false;

    for i in 0..tokens.len() {
        match tokens[i].kind {
            TokenKind::Terminator => {
                if start < i {
                    segments.push(Segment {
                        tokens: &tokens[start..i],
                        terminated: true,
                    });
                }
                start = i + 1;
                seen_arrow = false;
            }
            TokenKind::Arrow => seen_arrow = true,
            TokenKind::Word
                if seen_arrow
                    && tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Arrow) =>
            {
                segments.push(Segment {
                    tokens: &tokens[start..i],
                    terminated: false,
                });
                start = i;
                seen_arrow = false;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        segments.push(Segment {
            tokens: &tokens[start..],
            terminated: false,
        });
    }

    segments
}

struct RawProduction<'a> {
    head: &'a str,
    alternatives: Vec<Vec<&'a str>>,
    well_formed: bool,
}

fn parse_segment<'a>(
    segment: &Segment<'_, 'a>,
    errors: &mut Vec<GrammarError>,
) -> Option<RawProduction<'a>> {
    let line = segment.tokens[0].line;
    let text = segment.text();

    let arrow = match segment
        .tokens
        .iter()
        .position(|t| t.kind == TokenKind::Arrow)
    {
        Some(arrow) => arrow,
        None => {
            errors.push(GrammarError::MissingArrow { line, text });
            return None;
        }
    };

    let head = match &segment.tokens[..arrow] {
        [] => {
            errors.push(GrammarError::MissingHead { line, text });
            return None;
        }
        [head] if head.kind == TokenKind::Word => head.text,
        _ => {
            errors.push(GrammarError::MultipleHeadSymbols { line, text });
            return None;
        }
    };

    if !is_non_terminal_name(head) {
        errors.push(GrammarError::HeadNotNonTerminal {
            line,
            head: head.to_string(),
        });
        return None;
    }

    let body = &segment.tokens[arrow + 1..];
    if body.iter().any(|t| t.kind == TokenKind::Arrow) {
        errors.push(GrammarError::MissingHead { line, text });
        return None;
    }

    let groups: Vec<&[Token]> = body
        .split(|t| t.kind == TokenKind::Alternative)
        .collect();
    if groups.len() > 1 && groups.iter().any(|g| g.is_empty()) {
        errors.push(GrammarError::DanglingAlternative {
            line,
            production: text,
        });
        return None;
    }

    let mut well_formed = true;
    let mut alternatives = Vec::new();
    for group in groups {
        let mut alternative = Vec::new();
        for token in group {
            if token.text == END_MARK {
                errors.push(GrammarError::ReservedSymbol {
                    line: token.line,
                    symbol: token.text.to_string(),
                });
                well_formed = false;
            } else if !EPSILON_SPELLINGS.contains(&token.text) {
                alternative.push(token.text);
            }
        }
        alternatives.push(alternative);
    }
    if !well_formed {
        return None;
    }

    if !segment.terminated {
        errors.push(GrammarError::MissingTerminator {
            line,
            production: text,
        });
    }

    Some(RawProduction {
        head,
        alternatives,
        well_formed: segment.terminated,
    })
}

impl Grammar {
    /// Parses and validates grammar text.
    ///
    /// Errors are collected per production; an unterminated production is
    /// still modeled so that it does not cascade into undefined-symbol
    /// errors, but it is left out of `ValidationError::recovered`.
    pub fn parse(grammar: &str) -> Result<Self, ValidationError> {
        let tokens = tokenize(grammar);
        let mut errors: Vec<GrammarError> = Vec::new();

        let raw_productions: Vec<RawProduction> = split_productions(&tokens)
            .iter()
            .filter_map(|segment| parse_segment(segment, &mut errors))
            .collect();

        if raw_productions.is_empty() && errors.is_empty() {
            errors.push(GrammarError::Empty);
        }

        let mut g = Self::new();
        let mut recovered: Vec<String> = Vec::new();
        for raw in &raw_productions {
            let head = g.intern(raw.head);
            for alternative in &raw.alternatives {
                let body = alternative.iter().map(|s| g.intern(s)).collect();
                let index = g.add_production(head, body);
                if raw.well_formed {
                    recovered.push(g.production_to_string(index));
                }
            }
        }

        if let Some(first) = g.productions.first() {
            g.start_symbol = first.head;
        }

        for nt in g.non_terminal_iter() {
            if !nt.productions.is_empty() {
                continue;
            }
            for production in &g.productions {
                if production.body.contains(&nt.index) {
                    errors.push(GrammarError::UndefinedSymbol {
                        symbol: nt.name.clone(),
                        production: g.production_to_string(production.index),
                    });
                }
            }
        }

        if !errors.is_empty() {
            debug!(
                "grammar rejected with {} error(s), {} production(s) recovered",
                errors.len(),
                recovered.len()
            );
            return Err(ValidationError { errors, recovered });
        }

        debug!(
            "parsed {} production(s) over {} symbol(s)",
            g.productions.len(),
            g.symbols.len()
        );
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn bodies(g: &Grammar, head: &str) -> Vec<Vec<String>> {
        let head = g.get_symbol_index(head).unwrap();
        g.productions_of(head)
            .map(|p| {
                p.body
                    .iter()
                    .map(|&s| g.get_symbol_name(s).to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn simple_parse() {
        let g = Grammar::parse("S → a;").unwrap();

        let s = g.get_symbol_index("S").unwrap();
        let a = g.get_symbol_index("a").unwrap();

        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.start_symbol(), s);
        assert!(g.is_non_terminal(s));
        assert!(!g.is_non_terminal(a));
        assert_eq!(g.productions()[0].body, vec![a]);
    }

    #[test]
    fn ascii_arrow_and_newlines() {
        let g = Grammar::parse("  S -> a \n | b c\n ;").unwrap();
        assert_eq!(bodies(&g, "S"), vec![vec!["a"], vec!["b", "c"]]);
    }

    #[test]
    fn epsilon_spellings_and_empty_body() {
        let g = Grammar::parse("S → A B;\nA → ε | a;\nB → epsilon | b;\nC → ;\nS → C;").unwrap();
        assert_eq!(bodies(&g, "A"), vec![vec![], vec!["a"]]);
        assert_eq!(bodies(&g, "B"), vec![vec![], vec!["b"]]);
        assert_eq!(bodies(&g, "C"), vec![Vec::<String>::new()]);
        assert_eq!(bodies(&g, "S").len(), 2);
    }

    #[test]
    fn lone_semicolon_is_terminal_inside_body() {
        let g = Grammar::parse("L → S L' | ε; L' → ; S L' | ε; S → id;").unwrap();
        assert_eq!(bodies(&g, "L'"), vec![vec![";", "S", "L'"], vec![]]);
        assert!(!g.is_non_terminal(g.get_symbol_index(";").unwrap()));
    }

    #[test]
    fn lone_semicolon_terminates_before_next_head() {
        let g = Grammar::parse("S → a ; T → b ;").unwrap();
        assert_eq!(bodies(&g, "S"), vec![vec!["a"]]);
        assert_eq!(bodies(&g, "T"), vec![vec!["b"]]);
    }

    #[test]
    fn doubled_semicolon_keeps_terminal() {
        let g = Grammar::parse("S → a ;;").unwrap();
        assert_eq!(bodies(&g, "S"), vec![vec!["a", ";"]]);
    }

    #[test]
    fn comments_are_skipped() {
        let g = Grammar::parse("# statements\nS → a;\n  # trailing\n").unwrap();
        assert_eq!(g.productions().len(), 1);
    }

    #[test]
    fn missing_terminator_is_reported_with_recovery() {
        let err = Grammar::parse("S → A b;\nA → a\nB → c;\n").unwrap_err();
        assert_eq!(
            err.errors,
            vec![GrammarError::MissingTerminator {
                line: 2,
                production: "A → a".to_string()
            }]
        );
        assert_eq!(err.recovered, vec!["S → A b", "B → c"]);
    }

    #[test]
    fn missing_terminator_at_end_of_input() {
        let err = Grammar::parse("S → a").unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].kind(), ErrorKind::Syntax);
    }

    #[test]
    fn missing_arrow() {
        let err = Grammar::parse("S a b;\nT → x;").unwrap_err();
        assert_eq!(
            err.errors,
            vec![GrammarError::MissingArrow {
                line: 1,
                text: "S a b".to_string()
            }]
        );
        assert_eq!(err.recovered, vec!["T → x"]);
    }

    #[test]
    fn head_must_be_single_symbol() {
        let err = Grammar::parse("S a → x;").unwrap_err();
        assert!(matches!(
            err.errors[0],
            GrammarError::MultipleHeadSymbols { line: 1, .. }
        ));
    }

    #[test]
    fn empty_head() {
        let err = Grammar::parse("→ x;").unwrap_err();
        assert!(matches!(err.errors[0], GrammarError::MissingHead { .. }));
    }

    #[test]
    fn dangling_alternative() {
        let err = Grammar::parse("S → a | ;\nT → | b;").unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err
            .errors
            .iter()
            .all(|e| matches!(e, GrammarError::DanglingAlternative { .. })));
    }

    #[test]
    fn lowercase_head_is_rejected() {
        let err = Grammar::parse("S → a;\na → b;").unwrap_err();
        assert_eq!(
            err.errors,
            vec![GrammarError::HeadNotNonTerminal {
                line: 2,
                head: "a".to_string()
            }]
        );
    }

    #[test]
    fn end_mark_is_reserved() {
        let err = Grammar::parse("S → a $;").unwrap_err();
        assert!(matches!(err.errors[0], GrammarError::ReservedSymbol { .. }));
    }

    #[test]
    fn undefined_symbol_lists_every_reference() {
        let err = Grammar::parse("S → A x | y A;").unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err
            .errors
            .iter()
            .all(|e| e.kind() == ErrorKind::UndefinedSymbol));
        assert!(!err.has_syntax_errors());
        assert_eq!(
            err.messages()[0],
            "Non-terminal \"A\" used in \"S → A x\" has no productions"
        );
    }

    #[test]
    fn empty_parse() {
        let err = Grammar::parse("  \n  ").unwrap_err();
        assert_eq!(err.errors, vec![GrammarError::Empty]);
    }

    #[test]
    fn every_bad_production_is_reported() {
        let err = Grammar::parse("S → a\nT → ;\nU → | c;\nV → v;\nW x;").unwrap_err();
        assert!(matches!(err.errors[0], GrammarError::MissingTerminator { line: 1, .. }));
        assert!(matches!(err.errors[1], GrammarError::DanglingAlternative { line: 3, .. }));
        assert!(matches!(err.errors[2], GrammarError::MissingArrow { line: 5, .. }));
        assert_eq!(err.errors.len(), 3);
        assert_eq!(err.recovered, vec!["T → ε", "V → v"]);
    }

    #[test]
    fn left_recursion_is_not_a_syntax_error() {
        assert!(Grammar::parse("E → E + T | T; T → id;").is_ok());
    }
}
