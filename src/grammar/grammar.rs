use indexmap::IndexMap;

use super::{END_MARK, EPSILON};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    /// Indices into `Grammar::productions`, in declaration order.
    pub productions: Vec<usize>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            productions: Vec::new(),
        }
    }
}

/// A grammar symbol. The tag is fixed when the symbol is interned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Epsilon,
    EndMark,
    Terminal(String),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_) | Symbol::EndMark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub index: usize,
    pub head: usize,
    /// Empty for an epsilon production.
    pub body: Vec<usize>,
}

/// A validated context-free grammar.
///
/// Values of this type only come out of [`Grammar::parse`], so every
/// non-terminal has at least one production and every body symbol is
/// interned in `symbol_table`.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) symbol_table: IndexMap<String, usize>,
    pub(crate) productions: Vec<Production>,
    pub(crate) start_symbol: usize,
}

pub(crate) const EPSILON_INDEX: usize = 0;
pub(crate) const END_MARK_INDEX: usize = 1;

impl Grammar {
    pub(crate) fn new() -> Self {
        let mut g = Self {
            symbols: Vec::new(),
            symbol_table: IndexMap::new(),
            productions: Vec::new(),
            start_symbol: END_MARK_INDEX,
        };

        g.symbols.push(Symbol::Epsilon);
        g.symbol_table.insert(EPSILON.to_string(), EPSILON_INDEX);
        g.symbols.push(Symbol::EndMark);
        g.symbol_table.insert(END_MARK.to_string(), END_MARK_INDEX);

        g
    }

    pub fn start_symbol(&self) -> usize {
        self.start_symbol
    }

    pub fn symbol(&self, index: usize) -> &Symbol {
        &self.symbols[index]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, index: usize) -> &Production {
        &self.productions[index]
    }

    /// Terminals in order of first appearance, without the end marker.
    pub fn terminal_iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.symbols.iter().enumerate().filter_map(|(i, s)| {
            if let Symbol::Terminal(name) = s {
                Some((i, name.as_str()))
            } else {
                None
            }
        })
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.symbols.iter().filter_map(|s| s.non_terminal())
    }

    pub fn productions_of(&self, non_terminal: usize) -> impl Iterator<Item = &Production> {
        self.symbols[non_terminal]
            .non_terminal()
            .map(|nt| nt.productions.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&p| &self.productions[p])
    }

    pub fn is_non_terminal(&self, index: usize) -> bool {
        matches!(self.symbols[index], Symbol::NonTerminal(_))
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    pub(crate) fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub(crate) fn add_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(name.to_string()));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    /// Interns `name`, classifying it by the case of its first character.
    pub(crate) fn intern(&mut self, name: &str) -> usize {
        if let Some(idx) = self.get_symbol_index(name) {
            idx
        } else if is_non_terminal_name(name) {
            self.add_non_terminal(name)
        } else {
            self.add_terminal(name)
        }
    }

    pub(crate) fn add_production(&mut self, head: usize, body: Vec<usize>) -> usize {
        let index = self.productions.len();
        self.productions.push(Production { index, head, body });
        if let Some(nt) = self.symbols[head].mut_non_terminal() {
            nt.productions.push(index);
        }
        index
    }

    pub fn get_symbol_name(&self, index: usize) -> &str {
        match &self.symbols[index] {
            Symbol::Epsilon => EPSILON,
            Symbol::EndMark => END_MARK,
            Symbol::NonTerminal(e) => e.name.as_str(),
            Symbol::Terminal(e) => e.as_str(),
        }
    }

    /// Appends primes to `name` until it collides with no interned symbol.
    pub fn get_symbol_prime_name(&self, mut name: String) -> String {
        name.push('\'');
        while self.symbol_table.contains_key(&name) {
            name.push('\'');
        }
        name
    }

    pub fn production_to_vec_str(&self, production: &Production) -> Vec<&str> {
        if production.body.is_empty() {
            vec![EPSILON]
        } else {
            production
                .body
                .iter()
                .map(|idx| self.get_symbol_name(*idx))
                .collect()
        }
    }

    /// `Head → body`, with `ε` for an empty body.
    pub fn production_to_string(&self, index: usize) -> String {
        let production = &self.productions[index];
        format!(
            "{} → {}",
            self.get_symbol_name(production.head),
            self.production_to_vec_str(production).join(" ")
        )
    }
}

pub fn is_non_terminal_name(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reserved_symbols_come_first() {
        let g = Grammar::new();
        assert_eq!(g.symbol(EPSILON_INDEX), &Symbol::Epsilon);
        assert_eq!(g.symbol(END_MARK_INDEX), &Symbol::EndMark);
        assert_eq!(g.get_symbol_index("$"), Some(END_MARK_INDEX));
    }

    #[test]
    fn intern_classifies_by_case() {
        let mut g = Grammar::new();
        let e = g.intern("Expr");
        let id = g.intern("id");
        let plus = g.intern("+");
        assert!(g.is_non_terminal(e));
        assert!(!g.is_non_terminal(id));
        assert!(g.symbol(plus).is_terminal());
        assert_eq!(g.intern("Expr"), e);
    }

    #[test]
    fn prime_name_skips_existing() {
        let mut g = Grammar::new();
        g.intern("A");
        g.intern("A'");
        assert_eq!(g.get_symbol_prime_name("A".to_string()), "A''");
        assert_eq!(g.get_symbol_prime_name("B".to_string()), "B'");
    }

    #[test]
    fn epsilon_production_renders_marker() {
        let mut g = Grammar::new();
        let a = g.intern("A");
        let p = g.add_production(a, vec![]);
        assert_eq!(g.production_to_string(p), "A → ε");
        assert_eq!(g.productions_of(a).count(), 1);
    }
}
