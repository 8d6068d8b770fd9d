use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use super::{
    grammar::{Symbol, END_MARK_INDEX},
    Grammar,
};

/// Non-terminal index → set of symbol indices.
pub type SymbolSets = BTreeMap<usize, BTreeSet<usize>>;

/// Nullable set and FIRST sets of a grammar. FIRST sets never hold epsilon;
/// nullability lives only in `nullable`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NullableFirst {
    pub nullable: BTreeSet<usize>,
    pub first: SymbolSets,
}

impl NullableFirst {
    pub fn is_nullable(&self, symbol: usize) -> bool {
        self.nullable.contains(&symbol)
    }

    pub fn first_of(&self, non_terminal: usize) -> Option<&BTreeSet<usize>> {
        self.first.get(&non_terminal)
    }

    /// FIRST of a symbol sequence, and whether the whole sequence can derive
    /// the empty string.
    pub fn first_of_sequence(&self, g: &Grammar, symbols: &[usize]) -> (BTreeSet<usize>, bool) {
        let mut first: BTreeSet<usize> = BTreeSet::new();
        for &idx in symbols {
            match g.symbol(idx) {
                Symbol::NonTerminal(_) => {
                    if let Some(f) = self.first.get(&idx) {
                        first.extend(f.iter().cloned());
                    }
                    if !self.is_nullable(idx) {
                        return (first, false);
                    }
                }
                Symbol::Epsilon => {}
                Symbol::Terminal(_) | Symbol::EndMark => {
                    first.insert(idx);
                    return (first, false);
                }
            }
        }
        (first, true)
    }
}

impl Grammar {
    pub fn calculate_nullable_first(&self) -> NullableFirst {
        self.calculate_nullable_first_with(|_| {})
    }

    /// Runs the nullable/FIRST fixpoint, handing the accumulated state to
    /// `on_pass` after every full pass over the productions.
    pub fn calculate_nullable_first_with(
        &self,
        mut on_pass: impl FnMut(&NullableFirst),
    ) -> NullableFirst {
        let mut nf = NullableFirst {
            nullable: BTreeSet::new(),
            first: self
                .non_terminal_iter()
                .map(|nt| (nt.index, BTreeSet::new()))
                .collect(),
        };

        let mut passes = 0;
        loop {
            let mut changed = false;
            for production in &self.productions {
                let (first, nullable) = nf.first_of_sequence(self, &production.body);

                let entry = nf.first.entry(production.head).or_default();
                let before = entry.len();
                entry.extend(first);
                changed |= entry.len() != before;

                if nullable {
                    changed |= nf.nullable.insert(production.head);
                }
            }

            passes += 1;
            trace!("nullable/FIRST pass {}: changed = {}", passes, changed);
            on_pass(&nf);
            if !changed {
                break;
            }
        }
        debug!("nullable/FIRST converged after {} pass(es)", passes);

        nf
    }

    pub fn calculate_follow(&self, nf: &NullableFirst) -> SymbolSets {
        self.calculate_follow_with(nf, |_| {})
    }

    pub fn calculate_follow_with(
        &self,
        nf: &NullableFirst,
        mut on_pass: impl FnMut(&SymbolSets),
    ) -> SymbolSets {
        let mut follow: SymbolSets = self
            .non_terminal_iter()
            .map(|nt| (nt.index, BTreeSet::new()))
            .collect();
        if let Some(start) = follow.get_mut(&self.start_symbol) {
            start.insert(END_MARK_INDEX);
        }

        let mut passes = 0;
        loop {
            let mut changed = false;
            for production in &self.productions {
                for (i, &symbol) in production.body.iter().enumerate() {
                    if !self.is_non_terminal(symbol) {
                        continue;
                    }

                    let (mut addition, rest_nullable) =
                        nf.first_of_sequence(self, &production.body[i + 1..]);
                    if rest_nullable {
                        if let Some(head_follow) = follow.get(&production.head) {
                            addition.extend(head_follow.iter().cloned());
                        }
                    }

                    let entry = follow.entry(symbol).or_default();
                    let before = entry.len();
                    entry.extend(addition);
                    changed |= entry.len() != before;
                }
            }

            passes += 1;
            trace!("FOLLOW pass {}: changed = {}", passes, changed);
            on_pass(&follow);
            if !changed {
                break;
            }
        }
        debug!("FOLLOW converged after {} pass(es)", passes);

        follow
    }
}
