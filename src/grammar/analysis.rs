use indexmap::IndexMap;
use serde::Serialize;

use super::{
    conflict::{Conflict, ConflictOutput},
    ll1_parsing_table::{LL1Table, LL1TableJson},
    nullable_first_follow::{NullableFirst, SymbolSets},
    Grammar,
};

/// Everything derived from one grammar: nullable and FIRST sets, FOLLOW
/// sets, the LL(1) table and its conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub sets: NullableFirst,
    pub follow: SymbolSets,
    pub table: LL1Table,
    pub conflicts: Vec<Conflict>,
}

impl Analysis {
    pub fn new(g: &Grammar) -> Self {
        let sets = g.calculate_nullable_first();
        let follow = g.calculate_follow(&sets);
        let table = g.generate_ll1_parsing_table(&sets, &follow);
        let conflicts = g.detect_conflicts(&sets, &table);
        Self {
            sets,
            follow,
            table,
            conflicts,
        }
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn is_nullable(&self, non_terminal: usize) -> bool {
        self.sets.is_nullable(non_terminal)
    }

    pub fn first(&self, non_terminal: usize) -> impl Iterator<Item = usize> + '_ {
        self.sets
            .first_of(non_terminal)
            .into_iter()
            .flat_map(|s| s.iter().cloned())
    }

    pub fn follow(&self, non_terminal: usize) -> impl Iterator<Item = usize> + '_ {
        self.follow
            .get(&non_terminal)
            .into_iter()
            .flat_map(|s| s.iter().cloned())
    }
}

#[derive(Serialize)]
struct GrammarSummary<'a> {
    terminals: Vec<&'a str>,
    non_terminals: Vec<&'a str>,
    start_symbol: &'a str,
    productions: Vec<String>,
}

/// The full analysis report, as served to callers.
#[derive(Serialize)]
pub struct AnalysisReport<'a> {
    grammar: GrammarSummary<'a>,
    nullable: Vec<&'a str>,
    first_sets: IndexMap<&'a str, Vec<&'a str>>,
    follow_sets: IndexMap<&'a str, Vec<&'a str>>,
    is_ll1: bool,
    conflicts: Vec<ConflictOutput<'a>>,
    ll1_table: LL1TableJson<'a>,
}

impl Grammar {
    pub fn to_analysis_report<'a>(&'a self, analysis: &Analysis) -> AnalysisReport<'a> {
        let sorted_names = |it: &mut dyn Iterator<Item = usize>| {
            let mut v: Vec<&str> = it.map(|i| self.get_symbol_name(i)).collect();
            v.sort();
            v
        };

        AnalysisReport {
            grammar: GrammarSummary {
                terminals: self.terminal_iter().map(|(_, t)| t).collect(),
                non_terminals: self.non_terminal_iter().map(|nt| nt.name.as_str()).collect(),
                start_symbol: self.get_symbol_name(self.start_symbol),
                productions: (0..self.productions.len())
                    .map(|p| self.production_to_string(p))
                    .collect(),
            },
            nullable: self
                .non_terminal_iter()
                .filter(|nt| analysis.is_nullable(nt.index))
                .map(|nt| nt.name.as_str())
                .collect(),
            first_sets: self
                .non_terminal_iter()
                .map(|nt| (nt.name.as_str(), sorted_names(&mut analysis.first(nt.index))))
                .collect(),
            follow_sets: self
                .non_terminal_iter()
                .map(|nt| (nt.name.as_str(), sorted_names(&mut analysis.follow(nt.index))))
                .collect(),
            is_ll1: analysis.is_ll1(),
            conflicts: analysis
                .conflicts
                .iter()
                .map(|c| self.to_conflict_output(c))
                .collect(),
            ll1_table: self.to_ll1_table_json(&analysis.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PASCAL_SUBSET: &str = "Program → StmtList;
StmtList → Stmt StmtList' | ε;
StmtList' → ; Stmt StmtList' | ε;
Stmt → id := Expr;
Expr → Term Expr';
Expr' → + Term Expr' | ε;
Term → id | number;";

    #[test]
    fn pascal_subset_is_ll1() {
        let g = Grammar::parse(PASCAL_SUBSET).unwrap();
        let analysis = Analysis::new(&g);
        let report = serde_json::to_value(g.to_analysis_report(&analysis)).unwrap();

        assert!(analysis.is_ll1());
        assert_eq!(report["is_ll1"], true);
        assert_eq!(report["first_sets"]["Expr"], serde_json::json!(["id", "number"]));
        assert_eq!(report["follow_sets"]["Expr'"], serde_json::json!(["$", ";"]));
        assert_eq!(report["conflicts"], serde_json::json!([]));
        assert_eq!(
            report["nullable"],
            serde_json::json!(["Program", "StmtList", "StmtList'", "Expr'"])
        );
        assert_eq!(
            report["ll1_table"]["StmtList'"][";"],
            serde_json::json!(["StmtList' → ; Stmt StmtList'"])
        );
        assert_eq!(report["grammar"]["start_symbol"], "Program");
    }

    #[test]
    fn analysis_is_idempotent() {
        let g = Grammar::parse("S → A a | b; A → a | ε; B → S c;").unwrap();
        // `B` is unreachable but still analyzed
        let first = Analysis::new(&g);
        let second = Analysis::new(&g);
        assert_eq!(first, second);
        assert!(!first.is_ll1());
    }

    #[test]
    fn conflicts_do_not_hide_sets() {
        let g = Grammar::parse("A → a | a b;").unwrap();
        let analysis = Analysis::new(&g);
        let report = serde_json::to_value(g.to_analysis_report(&analysis)).unwrap();
        assert_eq!(report["is_ll1"], false);
        assert_eq!(report["first_sets"]["A"], serde_json::json!(["a"]));
        assert_eq!(report["conflicts"][0]["type"], "FIRST_FIRST");
        assert_eq!(report["ll1_table"]["A"]["a"], serde_json::json!(["A → a", "A → a b"]));
    }
}
