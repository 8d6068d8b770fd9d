use crowbook_text_processing::escape;
use serde::Serialize;

use super::{analysis::Analysis, Grammar, EPSILON};

#[derive(Debug, Clone)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} → {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$} | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| escape::tex(*s))
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        let output = left + &right;
        output.replace(EPSILON, "\\epsilon")
    }
}

pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
}

impl ProductionOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|s| s.to_latex(true)))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.productions
            .iter()
            .map(|p| p.to_plaintext(0, false))
            .collect()
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .non_terminal_iter()
            .map(|nt| ProductionOutput {
                left: nt.name.as_str(),
                rights: self
                    .productions_of(nt.index)
                    .map(|p| self.production_to_vec_str(p))
                    .collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self, name_width: usize) -> String {
        format!(
            "{:<width$} | {:<5} | {{{}}} | {{{}}}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", "),
            width = name_width
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|s| escape::tex(*s))
                .collect::<Vec<_>>()
                .join(r"\ ")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let width = self
            .data
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0);
        self.data
            .iter()
            .map(|s| s.to_plaintext(width))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    pub fn to_non_terminal_output_vec<'a>(&'a self, analysis: &Analysis) -> NonTerminalOutputVec<'a> {
        let data = self
            .non_terminal_iter()
            .map(|nt| {
                let mut t = NonTerminalOutput {
                    name: nt.name.as_str(),
                    nullable: analysis.is_nullable(nt.index),
                    first: analysis
                        .first(nt.index)
                        .map(|idx| self.get_symbol_name(idx))
                        .collect(),
                    follow: analysis
                        .follow(nt.index)
                        .map(|idx| self.get_symbol_name(idx))
                        .collect(),
                };
                t.first.sort();
                t.follow.sort();
                t
            })
            .collect();
        NonTerminalOutputVec { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn productions_plaintext_aligns_heads() {
        let g = Grammar::parse("S → Abc b | ε; Abc → a;").unwrap();
        assert_eq!(
            g.to_production_output_vec().to_plaintext(),
            "  S → Abc b\n    | ε\nAbc → a"
        );
        assert_eq!(
            g.to_production_output_vec().to_strings(),
            vec!["S → Abc b | ε", "Abc → a"]
        );
    }

    #[test]
    fn productions_latex_uses_epsilon_macro() {
        let g = Grammar::parse("S → a | ε;").unwrap();
        let latex = g.to_production_output_vec().to_latex();
        assert!(latex.contains("S & \\rightarrow &a \\mid \\epsilon"));
    }

    #[test]
    fn nullable_first_follow_plaintext() {
        let g = Grammar::parse("S → A b; A → a | ε;").unwrap();
        let analysis = Analysis::new(&g);
        assert_eq!(
            g.to_non_terminal_output_vec(&analysis).to_plaintext(),
            "S | false | {a, b} | {$}\nA | true  | {a} | {b}"
        );
    }

    #[test]
    fn nullable_first_follow_json() {
        let g = Grammar::parse("S → a;").unwrap();
        let analysis = Analysis::new(&g);
        assert_eq!(
            g.to_non_terminal_output_vec(&analysis).to_json().unwrap(),
            r#"{"data":[{"name":"S","nullable":false,"first":["a"],"follow":["$"]}]}"#
        );
    }
}
