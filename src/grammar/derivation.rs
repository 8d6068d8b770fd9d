use log::debug;
use serde::Serialize;

use super::{
    error::ParseError,
    grammar::{Symbol, END_MARK_INDEX, EPSILON_INDEX},
    ll1_parsing_table::LL1Table,
    Grammar, END_MARK, EPSILON,
};

/// A derivation tree produced by the LL(1) table, so its shape is exactly
/// the leftmost derivation the table prescribes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivationTree {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production: Option<usize>,
    pub children: Vec<DerivationTree>,
}

impl DerivationTree {
    pub fn to_plaintext(&self) -> String {
        let mut lines = Vec::new();
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            let mut line = format!("{}{}", "  ".repeat(depth), node.symbol);
            if let Some(token) = &node.token {
                line.push_str(&format!(" '{}'", token));
            }
            lines.push(line);
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
        lines.join("\n")
    }

    /// Matched tokens, left to right.
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(token) = &node.token {
                leaves.push(token.as_str());
            }
            stack.extend(node.children.iter().rev());
        }
        leaves
    }
}

// Long right-recursive derivations nest as deep as the input is long.
impl Drop for DerivationTree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// One configuration of the predictive parser and what it did there.
/// `stack` is listed bottom to top; `input` is what is left to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseStep {
    pub step: usize,
    pub stack: Vec<String>,
    pub input: Vec<String>,
    pub action: String,
}

pub fn steps_to_plaintext(steps: &[ParseStep]) -> String {
    let rows: Vec<[String; 4]> = steps
        .iter()
        .map(|s| {
            [
                s.step.to_string(),
                s.stack.join(" "),
                s.input.join(" "),
                s.action.clone(),
            ]
        })
        .collect();
    let header = ["Step", "Stack", "Input", "Action"].map(str::to_string);
    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    std::iter::once(&header)
        .chain(&rows)
        .map(|row| {
            format!(
                "{:>w0$}  {:<w1$}  {:<w2$}  {}",
                row[0],
                row[1],
                row[2],
                row[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// An accepted sentence: its tree and the steps that built it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Derivation {
    pub tree: DerivationTree,
    pub steps: Vec<ParseStep>,
}

impl Derivation {
    pub fn to_plaintext(&self) -> String {
        format!(
            "{}\n\n{}",
            steps_to_plaintext(&self.steps),
            self.tree.to_plaintext()
        )
    }
}

struct Node {
    symbol: usize,
    token: Option<String>,
    production: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    fn new(symbol: usize) -> Self {
        Self {
            symbol,
            token: None,
            production: None,
            children: Vec::new(),
        }
    }
}

impl Grammar {
    fn lookahead(&self, tokens: &[&str], pos: usize) -> (Option<usize>, String) {
        match tokens.get(pos) {
            Some(&text) => (
                self.get_symbol_index(text)
                    .filter(|&i| matches!(self.symbol(i), Symbol::Terminal(_))),
                text.to_string(),
            ),
            None => (Some(END_MARK_INDEX), END_MARK.to_string()),
        }
    }

    /// Parses a whitespace-separated sentence with the predictive parsing
    /// algorithm over `table`, keeping every step. A table with conflicts
    /// is refused.
    pub fn parse_sentence(
        &self,
        table: &LL1Table,
        sentence: &str,
    ) -> Result<Derivation, ParseError> {
        let (steps, result) = self.trace_sentence(table, sentence);
        result.map(|tree| Derivation { tree, steps })
    }

    /// Like [`Grammar::parse_sentence`], but the steps are returned whether
    /// or not the sentence is accepted.
    pub fn trace_sentence(
        &self,
        table: &LL1Table,
        sentence: &str,
    ) -> (Vec<ParseStep>, Result<DerivationTree, ParseError>) {
        let mut steps = Some(Vec::new());
        let result = self.run_parser(table, sentence, &mut steps);
        (steps.unwrap_or_default(), result)
    }

    /// The tree alone. The step trace grows with the square of the input,
    /// so long sentences go through here.
    pub fn derivation_tree(
        &self,
        table: &LL1Table,
        sentence: &str,
    ) -> Result<DerivationTree, ParseError> {
        self.run_parser(table, sentence, &mut None)
    }

    fn record(
        &self,
        steps: &mut Option<Vec<ParseStep>>,
        nodes: &[Node],
        stack: &[usize],
        input: &[&str],
        action: impl FnOnce() -> String,
    ) {
        if let Some(steps) = steps {
            steps.push(ParseStep {
                step: steps.len() + 1,
                stack: std::iter::once(END_MARK)
                    .chain(stack.iter().map(|&id| self.get_symbol_name(nodes[id].symbol)))
                    .map(str::to_string)
                    .collect(),
                input: input.iter().map(|t| t.to_string()).collect(),
                action: action(),
            });
        }
    }

    fn run_parser(
        &self,
        table: &LL1Table,
        sentence: &str,
        steps: &mut Option<Vec<ParseStep>>,
    ) -> Result<DerivationTree, ParseError> {
        table.require_ll1(self).map_err(ParseError::NotLL1)?;

        let tokens: Vec<&str> = sentence.split_whitespace().collect();
        let mut nodes: Vec<Node> = vec![Node::new(self.start_symbol)];
        let mut stack: Vec<usize> = vec![0];
        let mut pos = 0;

        while let Some(&id) = stack.last() {
            let symbol = nodes[id].symbol;
            let (lookahead, text) = self.lookahead(&tokens, pos);

            if symbol == EPSILON_INDEX {
                self.record(steps, &nodes, &stack, &tokens[pos..], || {
                    format!("Skip {}", EPSILON)
                });
                stack.pop();
                continue;
            }

            if !self.is_non_terminal(symbol) {
                if lookahead != Some(symbol) {
                    return Err(ParseError::UnexpectedToken {
                        position: pos + 1,
                        found: text,
                        expected: vec![self.get_symbol_name(symbol).to_string()],
                    });
                }
                self.record(steps, &nodes, &stack, &tokens[pos..], || {
                    format!("Match '{}'", text)
                });
                stack.pop();
                nodes[id].token = Some(text);
                pos += 1;
                continue;
            }

            let entry = lookahead.and_then(|t| table.get(symbol, t).first());
            let production = match entry {
                Some(entry) => self.production(entry.production),
                None => {
                    let expected = table
                        .row(symbol)
                        .map(|row| {
                            table
                                .columns
                                .iter()
                                .filter(|&t| row.cells.contains_key(t))
                                .map(|&t| self.get_symbol_name(t).to_string())
                                .collect()
                        })
                        .unwrap_or_default();
                    return Err(ParseError::UnexpectedToken {
                        position: pos + 1,
                        found: text,
                        expected,
                    });
                }
            };
            self.record(steps, &nodes, &stack, &tokens[pos..], || {
                format!("Apply: {}", self.production_to_string(production.index))
            });
            stack.pop();

            nodes[id].production = Some(production.index);
            let body: &[usize] = if production.body.is_empty() {
                &[EPSILON_INDEX]
            } else {
                &production.body
            };
            let first_child = nodes.len();
            for &s in body {
                nodes.push(Node::new(s));
            }
            let children: Vec<usize> = (first_child..nodes.len()).collect();
            stack.extend(children.iter().rev());
            nodes[id].children = children;
        }

        if pos < tokens.len() {
            return Err(ParseError::UnexpectedToken {
                position: pos + 1,
                found: tokens[pos].to_string(),
                expected: vec![END_MARK.to_string()],
            });
        }
        self.record(steps, &nodes, &stack, &[], || "Accept".to_string());

        debug!(
            "sentence of {} token(s) parsed into {} node(s)",
            tokens.len(),
            nodes.len()
        );
        Ok(self.build_tree(nodes))
    }

    /// Children always sit after their parent in the arena, so a pass from
    /// the back finds every child already built.
    fn build_tree(&self, nodes: Vec<Node>) -> DerivationTree {
        let mut built: Vec<DerivationTree> = Vec::with_capacity(nodes.len());
        built.resize_with(nodes.len(), DerivationTree::default);
        for (id, node) in nodes.into_iter().enumerate().rev() {
            let children = node
                .children
                .iter()
                .map(|&c| std::mem::take(&mut built[c]))
                .collect();
            built[id] = DerivationTree {
                symbol: self.get_symbol_name(node.symbol).to_string(),
                token: node.token,
                production: node.production,
                children,
            };
        }
        built.swap_remove(0)
    }
}
