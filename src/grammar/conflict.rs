use std::collections::{BTreeSet, VecDeque};
use std::fmt::Display;

use log::debug;
use serde::Serialize;

use super::{
    ll1_parsing_table::{LL1Table, TableEntry, Via},
    nullable_first_follow::NullableFirst,
    Grammar, EPSILON,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConflictKind {
    #[serde(rename = "FIRST_FIRST")]
    FirstFirst,
    #[serde(rename = "FIRST_FOLLOW")]
    FirstFollow,
}

impl Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::FirstFirst => write!(f, "FIRST_FIRST"),
            ConflictKind::FirstFollow => write!(f, "FIRST_FOLLOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftRecursion {
    /// The head is the first body symbol, possibly behind nullable symbols.
    Direct,
    /// The head is reached through the leading symbols of other non-terminals.
    Indirect,
}

/// A proposed grammar rewrite. Bodies are rendered symbol lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    LeftFactor {
        head: String,
        new_head: String,
        prefix: Vec<String>,
        suffixes: Vec<Vec<String>>,
        others: Vec<Vec<String>>,
    },
    EliminateLeftRecursion {
        head: String,
        new_head: String,
        production: String,
        kind: LeftRecursion,
        /// `α` of every `A → A α`.
        recursive: Vec<Vec<String>>,
        /// `β` of every other production of `A`.
        others: Vec<Vec<String>>,
    },
    Indistinguishable {
        head: String,
        lookahead: String,
        productions: Vec<String>,
        in_follow: bool,
    },
}

fn join(body: &[String]) -> String {
    if body.is_empty() {
        EPSILON.to_string()
    } else {
        body.join(" ")
    }
}

fn with_tail(body: &[String], tail: &str) -> String {
    if body.is_empty() {
        tail.to_string()
    } else {
        format!("{} {}", body.join(" "), tail)
    }
}

impl Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suggestion::LeftFactor {
                head,
                new_head,
                prefix,
                suffixes,
                others,
            } => {
                let heads = std::iter::once(with_tail(prefix, new_head))
                    .chain(others.iter().map(|b| join(b)))
                    .collect::<Vec<_>>()
                    .join(" | ");
                let tails = suffixes
                    .iter()
                    .map(|b| join(b))
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(
                    f,
                    "Left factoring: the productions of {} share the prefix \"{}\". \
                     Hoist it into a new non-terminal {}:\n  {} → {}\n  {} → {}",
                    head,
                    prefix.join(" "),
                    new_head,
                    head,
                    heads,
                    new_head,
                    tails
                )
            }
            Suggestion::EliminateLeftRecursion {
                head,
                new_head,
                production,
                kind: LeftRecursion::Direct,
                recursive,
                others,
            } if !recursive.is_empty() => {
                let heads = if others.is_empty() {
                    new_head.clone()
                } else {
                    others
                        .iter()
                        .map(|b| with_tail(b, new_head))
                        .collect::<Vec<_>>()
                        .join(" | ")
                };
                let tails = recursive
                    .iter()
                    .map(|b| with_tail(b, new_head))
                    .chain(std::iter::once(EPSILON.to_string()))
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(
                    f,
                    "Left recursion: {} is left-recursive. Eliminate it by rewriting:\n  {} → {}\n  {} → {}",
                    production, head, heads, new_head, tails
                )
            }
            Suggestion::EliminateLeftRecursion {
                head,
                production,
                kind,
                ..
            } => {
                let how = match kind {
                    LeftRecursion::Direct => "through a nullable prefix",
                    LeftRecursion::Indirect => "through other non-terminals",
                };
                write!(
                    f,
                    "Left recursion: {} lets {} derive a string starting with {} {}. \
                     Substitute the leading symbols until the recursion is direct, \
                     then eliminate it with A → β A', A' → α A' | ε.",
                    production, head, head, how
                )
            }
            Suggestion::Indistinguishable {
                head,
                lookahead,
                productions,
                in_follow,
            } => {
                write!(
                    f,
                    "Productions {} are not distinguishable by one lookahead token: \
                     all of them are selected by \"{}\".",
                    productions.join(", "),
                    lookahead
                )?;
                if *in_follow {
                    write!(
                        f,
                        " \"{}\" is in FOLLOW({}) and one of them can derive ε; \
                         restructure {} so that its FIRST and FOLLOW sets are disjoint.",
                        lookahead, head, head
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub non_terminal: usize,
    pub lookahead: usize,
    /// Competing productions, in table order.
    pub productions: Vec<usize>,
    pub suggestion: Suggestion,
}

/// The conflict record handed to callers.
#[derive(Debug, Serialize)]
pub struct ConflictOutput<'a> {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub non_terminal: &'a str,
    pub lookahead: &'a str,
    pub productions: Vec<String>,
    pub suggestion: String,
}

impl ConflictOutput<'_> {
    pub fn to_plaintext(&self) -> String {
        format!(
            "{} conflict at [{}, {}]: {}\n{}",
            self.kind,
            self.non_terminal,
            self.lookahead,
            self.productions.join(", "),
            self.suggestion
        )
    }
}

fn classify(entries: &[TableEntry]) -> ConflictKind {
    if entries.iter().filter(|e| e.via == Via::First).count() >= 2 {
        ConflictKind::FirstFirst
    } else {
        ConflictKind::FirstFollow
    }
}

impl Grammar {
    pub fn detect_conflicts(&self, nf: &NullableFirst, table: &LL1Table) -> Vec<Conflict> {
        let conflicts: Vec<Conflict> = table
            .conflict_cells()
            .map(|(non_terminal, lookahead, entries)| {
                let kind = classify(entries);
                let productions: Vec<usize> = entries.iter().map(|e| e.production).collect();
                let suggestion = self.suggest(nf, kind, non_terminal, lookahead, &productions);
                Conflict {
                    kind,
                    non_terminal,
                    lookahead,
                    productions,
                    suggestion,
                }
            })
            .collect();
        debug!("{} LL(1) conflict(s) found", conflicts.len());
        conflicts
    }

    fn body_names(&self, production: usize) -> Vec<String> {
        self.productions[production]
            .body
            .iter()
            .map(|&s| self.get_symbol_name(s).to_string())
            .collect()
    }

    /// Non-terminals that can start the body: every leading non-terminal up
    /// to and including the first one that is not nullable.
    fn leading_non_terminals(&self, nf: &NullableFirst, body: &[usize]) -> Vec<usize> {
        let mut leading = Vec::new();
        for &s in body {
            if !self.is_non_terminal(s) {
                break;
            }
            leading.push(s);
            if !nf.is_nullable(s) {
                break;
            }
        }
        leading
    }

    pub fn left_recursion(&self, nf: &NullableFirst, production: usize) -> Option<LeftRecursion> {
        let head = self.productions[production].head;
        let leading = self.leading_non_terminals(nf, &self.productions[production].body);
        if leading.contains(&head) {
            return Some(LeftRecursion::Direct);
        }

        let mut visited: BTreeSet<usize> = leading.iter().cloned().collect();
        let mut queue: VecDeque<usize> = leading.into_iter().collect();
        while let Some(nt) = queue.pop_front() {
            for p in self.productions_of(nt) {
                for next in self.leading_non_terminals(nf, &p.body) {
                    if next == head {
                        return Some(LeftRecursion::Indirect);
                    }
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    fn suggest(
        &self,
        nf: &NullableFirst,
        kind: ConflictKind,
        non_terminal: usize,
        lookahead: usize,
        productions: &[usize],
    ) -> Suggestion {
        let head = self.get_symbol_name(non_terminal).to_string();
        let bodies: Vec<&[usize]> = productions
            .iter()
            .map(|&p| self.productions[p].body.as_slice())
            .collect();

        let prefix_len = (0..)
            .take_while(|&i| {
                bodies
                    .first()
                    .and_then(|b| b.get(i))
                    .map_or(false, |s| bodies.iter().all(|b| b.get(i) == Some(s)))
            })
            .count();
        if prefix_len > 0 && bodies[0][0] != non_terminal {
            let others = self
                .productions_of(non_terminal)
                .filter(|p| !productions.contains(&p.index))
                .map(|p| self.body_names(p.index))
                .collect();
            let prefix = self.body_names(productions[0])[..prefix_len].to_vec();
            return Suggestion::LeftFactor {
                new_head: self.get_symbol_prime_name(head.clone()),
                head,
                prefix,
                suffixes: productions
                    .iter()
                    .map(|&p| self.body_names(p)[prefix_len..].to_vec())
                    .collect(),
                others,
            };
        }

        if let Some((production, recursion)) = productions
            .iter()
            .find_map(|&p| self.left_recursion(nf, p).map(|r| (p, r)))
        {
            let (recursive, others): (Vec<_>, Vec<_>) = self
                .productions_of(non_terminal)
                .partition(|p| p.body.first() == Some(&non_terminal));
            return Suggestion::EliminateLeftRecursion {
                new_head: self.get_symbol_prime_name(head.clone()),
                head,
                production: self.production_to_string(production),
                kind: recursion,
                recursive: recursive
                    .iter()
                    .map(|p| self.body_names(p.index)[1..].to_vec())
                    .collect(),
                others: others.iter().map(|p| self.body_names(p.index)).collect(),
            };
        }

        Suggestion::Indistinguishable {
            head,
            lookahead: self.get_symbol_name(lookahead).to_string(),
            productions: productions
                .iter()
                .map(|&p| self.production_to_string(p))
                .collect(),
            in_follow: kind == ConflictKind::FirstFollow,
        }
    }

    pub fn to_conflict_output<'a>(&'a self, conflict: &Conflict) -> ConflictOutput<'a> {
        ConflictOutput {
            kind: conflict.kind,
            non_terminal: self.get_symbol_name(conflict.non_terminal),
            lookahead: self.get_symbol_name(conflict.lookahead),
            productions: conflict
                .productions
                .iter()
                .map(|&p| self.production_to_string(p))
                .collect(),
            suggestion: conflict.suggestion.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conflicts(text: &str) -> (Grammar, Vec<Conflict>) {
        let g = Grammar::parse(text).unwrap();
        let nf = g.calculate_nullable_first();
        let follow = g.calculate_follow(&nf);
        let table = g.generate_ll1_parsing_table(&nf, &follow);
        let conflicts = g.detect_conflicts(&nf, &table);
        (g, conflicts)
    }

    #[test]
    fn common_prefix_suggests_left_factoring() {
        let (g, c) = conflicts("A → a | a b;");
        assert_eq!(c.len(), 1);
        let out = g.to_conflict_output(&c[0]);
        assert_eq!(out.kind, ConflictKind::FirstFirst);
        assert_eq!(out.non_terminal, "A");
        assert_eq!(out.lookahead, "a");
        assert_eq!(out.productions, vec!["A → a", "A → a b"]);
        assert_eq!(
            out.suggestion,
            "Left factoring: the productions of A share the prefix \"a\". \
             Hoist it into a new non-terminal A':\n  A → a A'\n  A' → ε | b"
        );
    }

    #[test]
    fn left_factoring_keeps_other_alternatives() {
        let (g, c) = conflicts("S → if E then S | if E then S else S | x; E → b;");
        let out = g.to_conflict_output(&c[0]);
        assert!(matches!(c[0].suggestion, Suggestion::LeftFactor { .. }));
        assert!(out
            .suggestion
            .ends_with("S → if E then S S' | x\n  S' → ε | else S"));
    }

    #[test]
    fn direct_left_recursion_suggests_elimination() {
        let (g, c) = conflicts("A → A b | a;");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].kind, ConflictKind::FirstFirst);
        assert_eq!(
            g.to_conflict_output(&c[0]).suggestion,
            "Left recursion: A → A b is left-recursive. Eliminate it by rewriting:\n  A → a A'\n  A' → b A' | ε"
        );
    }

    #[test]
    fn indirect_left_recursion_is_named() {
        let (g, c) = conflicts("A → B x | a; B → A y | b;");
        assert!(!c.is_empty());
        let nf = g.calculate_nullable_first();
        assert_eq!(g.left_recursion(&nf, 0), Some(LeftRecursion::Indirect));
        assert!(c.iter().any(|c| matches!(
            c.suggestion,
            Suggestion::EliminateLeftRecursion {
                kind: LeftRecursion::Indirect,
                ..
            }
        )));
    }

    #[test]
    fn left_recursion_through_nullable_prefix() {
        let g = Grammar::parse("A → N A c | a; N → ε | n;").unwrap();
        let nf = g.calculate_nullable_first();
        assert_eq!(g.left_recursion(&nf, 0), Some(LeftRecursion::Direct));
        assert_eq!(g.left_recursion(&nf, 1), None);
    }

    #[test]
    fn nullable_alternative_gives_first_follow() {
        let (g, c) = conflicts("S → A a; A → a | ε;");
        assert_eq!(c.len(), 1);
        let out = g.to_conflict_output(&c[0]);
        assert_eq!(out.kind, ConflictKind::FirstFollow);
        assert_eq!(out.lookahead, "a");
        assert_eq!(out.productions, vec!["A → a", "A → ε"]);
        assert!(out.suggestion.contains("not distinguishable by one lookahead token"));
        assert!(out.suggestion.contains("FOLLOW(A)"));
    }

    #[test]
    fn ambiguous_without_prefix_is_generic() {
        let (g, c) = conflicts("S → A | B; A → x; B → x;");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].kind, ConflictKind::FirstFirst);
        assert_eq!(
            g.to_conflict_output(&c[0]).suggestion,
            "Productions S → A, S → B are not distinguishable by one lookahead token: \
             all of them are selected by \"x\"."
        );
    }

    #[test]
    fn conflict_record_serializes_type_field() {
        let (g, c) = conflicts("A → a | a b;");
        let json = serde_json::to_value(g.to_conflict_output(&c[0])).unwrap();
        assert_eq!(json["type"], "FIRST_FIRST");
        assert_eq!(json["lookahead"], "a");
    }
}
