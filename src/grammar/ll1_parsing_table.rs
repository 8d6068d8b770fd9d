use crowbook_text_processing::escape::tex as escape_tex;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::Grammar;

use super::{
    error::GenerateError,
    grammar::END_MARK_INDEX,
    nullable_first_follow::{NullableFirst, SymbolSets},
    pretty_print::ProductionOutput,
};

/// How a production reached a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Via {
    /// The lookahead is in FIRST of the production body.
    First,
    /// The body is nullable and the lookahead is in FOLLOW of the head.
    Follow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub production: usize,
    pub via: Via,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LL1Row {
    pub non_terminal: usize,
    /// Lookahead symbol index → candidates, in the order they were appended.
    pub cells: BTreeMap<usize, Vec<TableEntry>>,
}

impl LL1Row {
    fn push(&mut self, lookahead: usize, entry: TableEntry) {
        let cell = self.cells.entry(lookahead).or_default();
        if cell.iter().all(|e| e.production != entry.production) {
            cell.push(entry);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LL1Table {
    /// Column order: terminals as they first appear, then the end marker.
    pub columns: Vec<usize>,
    /// One row per non-terminal, in declaration order.
    pub rows: Vec<LL1Row>,
}

impl LL1Table {
    pub fn row(&self, non_terminal: usize) -> Option<&LL1Row> {
        self.rows.iter().find(|r| r.non_terminal == non_terminal)
    }

    pub fn get(&self, non_terminal: usize, lookahead: usize) -> &[TableEntry] {
        self.row(non_terminal)
            .and_then(|r| r.cells.get(&lookahead))
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// Cells holding two or more candidates, as `(non-terminal, lookahead, entries)`.
    pub fn conflict_cells(&self) -> impl Iterator<Item = (usize, usize, &[TableEntry])> {
        self.rows.iter().flat_map(|row| {
            row.cells
                .iter()
                .filter(|(_, entries)| entries.len() > 1)
                .map(move |(&lookahead, entries)| (row.non_terminal, lookahead, entries.as_slice()))
        })
    }

    pub fn is_ll1(&self) -> bool {
        self.conflict_cells().next().is_none()
    }

    /// Fails with `NotLL1` if any cell is ambiguous.
    pub fn require_ll1(&self, g: &Grammar) -> Result<(), GenerateError> {
        let cells: Vec<(String, String)> = self
            .conflict_cells()
            .map(|(nt, t, _)| {
                (
                    g.get_symbol_name(nt).to_string(),
                    g.get_symbol_name(t).to_string(),
                )
            })
            .collect();
        if cells.is_empty() {
            Ok(())
        } else {
            Err(GenerateError::NotLL1 { cells })
        }
    }
}

impl Grammar {
    /// Selection set of a production, split into the lookaheads contributed
    /// by FIRST of the body and those contributed by FOLLOW of the head.
    pub fn selection_set(
        &self,
        nf: &NullableFirst,
        follow: &SymbolSets,
        production: usize,
    ) -> (BTreeSet<usize>, BTreeSet<usize>) {
        let production = &self.productions[production];
        let (first, nullable) = nf.first_of_sequence(self, &production.body);
        let follow = if nullable {
            follow.get(&production.head).cloned().unwrap_or_default()
        } else {
            BTreeSet::new()
        };
        (first, follow)
    }

    pub fn generate_ll1_parsing_table(&self, nf: &NullableFirst, follow: &SymbolSets) -> LL1Table {
        let mut columns: Vec<usize> = self.terminal_iter().map(|(i, _)| i).collect();
        columns.push(END_MARK_INDEX);

        let mut rows: Vec<LL1Row> = Vec::new();
        for nt in self.non_terminal_iter() {
            let mut row = LL1Row {
                non_terminal: nt.index,
                cells: BTreeMap::new(),
            };
            for &production in &nt.productions {
                let (first, follow) = self.selection_set(nf, follow, production);
                for t in first {
                    row.push(
                        t,
                        TableEntry {
                            production,
                            via: Via::First,
                        },
                    );
                }
                for t in follow {
                    row.push(
                        t,
                        TableEntry {
                            production,
                            via: Via::Follow,
                        },
                    );
                }
            }
            rows.push(row);
        }

        let table = LL1Table { columns, rows };
        debug!(
            "LL(1) table built: {} row(s), {} conflicting cell(s)",
            table.rows.len(),
            table.conflict_cells().count()
        );
        table
    }
}

pub struct LL1ParsingTable<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<(&'a str, Vec<ProductionOutput<'a>>)>,
}

impl LL1ParsingTable<'_> {
    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_plaintext(left.chars().count(), false)),
            );
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| {
                output
                    .iter()
                    .map(|line| line[j].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape_tex(t))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![format!("{}", escape_tex(*left))];
            line.extend(row.iter().map(|productions| {
                let cell = productions.to_latex(false);
                if productions.rights.len() > 1 {
                    format!("{{\\color{{red}}{}}}", cell)
                } else {
                    cell
                }
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

/// `{non_terminal: {lookahead: [production, ...]}}`, populated cells only.
#[derive(Serialize)]
#[serde(transparent)]
pub struct LL1TableJson<'a>(IndexMap<&'a str, IndexMap<&'a str, Vec<String>>>);

impl Grammar {
    pub fn to_ll1_parsing_table_output<'a>(&'a self, table: &LL1Table) -> LL1ParsingTable<'a> {
        let terminals: Vec<&str> = table
            .columns
            .iter()
            .map(|&t| self.get_symbol_name(t))
            .collect();

        let mut rows: Vec<(&str, Vec<ProductionOutput>)> = Vec::new();
        for row in &table.rows {
            let left = self.get_symbol_name(row.non_terminal);
            let cells = table
                .columns
                .iter()
                .map(|t| ProductionOutput {
                    left,
                    rights: row
                        .cells
                        .get(t)
                        .map(|entries| {
                            entries
                                .iter()
                                .map(|e| self.production_to_vec_str(self.production(e.production)))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect();
            rows.push((left, cells));
        }

        LL1ParsingTable { terminals, rows }
    }

    pub fn to_ll1_table_json<'a>(&'a self, table: &LL1Table) -> LL1TableJson<'a> {
        let mut map: IndexMap<&str, IndexMap<&str, Vec<String>>> = IndexMap::new();
        for row in &table.rows {
            let cells = map.entry(self.get_symbol_name(row.non_terminal)).or_default();
            for &t in &table.columns {
                if let Some(entries) = row.cells.get(&t) {
                    cells.insert(
                        self.get_symbol_name(t),
                        entries
                            .iter()
                            .map(|e| self.production_to_string(e.production))
                            .collect(),
                    );
                }
            }
        }
        LL1TableJson(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> (Grammar, NullableFirst, SymbolSets, LL1Table) {
        let g = Grammar::parse(text).unwrap();
        let nf = g.calculate_nullable_first();
        let follow = g.calculate_follow(&nf);
        let table = g.generate_ll1_parsing_table(&nf, &follow);
        (g, nf, follow, table)
    }

    fn cell(g: &Grammar, table: &LL1Table, nt: &str, t: &str) -> Vec<String> {
        table
            .get(g.get_symbol_index(nt).unwrap(), g.get_symbol_index(t).unwrap())
            .iter()
            .map(|e| g.production_to_string(e.production))
            .collect()
    }

    #[test]
    fn nullable_production_fills_follow_columns() {
        let (g, _, _, table) = build("S → A b; A → a | ε;");
        assert_eq!(cell(&g, &table, "A", "a"), vec!["A → a"]);
        assert_eq!(cell(&g, &table, "A", "b"), vec!["A → ε"]);
        assert!(cell(&g, &table, "A", "$").is_empty());
        assert!(table.is_ll1());
        assert!(table.require_ll1(&g).is_ok());
    }

    #[test]
    fn conflicting_cell_keeps_every_candidate() {
        let (g, _, _, table) = build("S → a | a b | A; A → a;");
        assert_eq!(
            cell(&g, &table, "S", "a"),
            vec!["S → a", "S → a b", "S → A"]
        );
        assert!(!table.is_ll1());
        assert_eq!(
            table.require_ll1(&g),
            Err(GenerateError::NotLL1 {
                cells: vec![("S".to_string(), "a".to_string())]
            })
        );
    }

    #[test]
    fn production_listed_once_per_cell() {
        // `S → B` reaches `c` through FIRST(B) and through FOLLOW(S)
        let (g, _, _, table) = build("T → S c; S → B; B → c | ε;");
        let s = g.get_symbol_index("S").unwrap();
        let c = g.get_symbol_index("c").unwrap();
        assert_eq!(
            table.get(s, c),
            &[TableEntry {
                production: 1,
                via: Via::First
            }]
        );
    }

    #[test]
    fn every_selection_lookahead_has_its_production() {
        let (g, nf, follow, table) = build(
            "E → T E'; E' → + T E' | ε; T → F T'; T' → * F T' | ε; F → ( E ) | id;",
        );
        for production in g.productions() {
            let (first, follow) = g.selection_set(&nf, &follow, production.index);
            for t in first.iter().chain(follow.iter()) {
                assert!(table
                    .get(production.head, *t)
                    .iter()
                    .any(|e| e.production == production.index));
            }
        }
    }

    #[test]
    fn plaintext_layout() {
        let (g, _, _, table) = build("S → a S | ε;");
        let text = g.to_ll1_parsing_table_output(&table).to_plaintext();
        assert_eq!(text, "  |       a |     $\nS | S → a S | S → ε");
    }

    #[test]
    fn latex_marks_conflicts() {
        let (g, _, _, table) = build("A → a | a b;");
        let latex = g.to_ll1_parsing_table_output(&table).to_latex();
        assert!(latex.contains("\\color{red}"));
    }
}
