use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedGrammar {
    pub name: String,
    pub grammar: String,
}

/// Named grammars offered to users as starting points.
///
/// Loaded from JSON of the form `{"grammars": [{"name": ..., "grammar": ...}]}`,
/// or built from the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleGrammars {
    pub grammars: Vec<NamedGrammar>,
}

impl ExampleGrammars {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.grammars
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.grammar.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grammars.iter().map(|g| g.name.as_str())
    }
}

impl Default for ExampleGrammars {
    fn default() -> Self {
        let named = |name: &str, grammar: &str| NamedGrammar {
            name: name.to_string(),
            grammar: grammar.to_string(),
        };
        Self {
            grammars: vec![
                named(
                    "pascal_subset",
                    "Program → StmtList;
StmtList → Stmt StmtList';
StmtList' → ; Stmt StmtList' | ε;
Stmt → id := Expr;
Expr → Term Expr';
Expr' → + Term Expr' | ε;
Term → id | number;",
                ),
                named(
                    "arithmetic",
                    "E → T E';
E' → + T E' | ε;
T → F T';
T' → * F T' | ε;
F → ( E ) | id | number;",
                ),
                named(
                    "simple",
                    "S → A B;
A → a | ε;
B → b | c;",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Analysis, Grammar};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid_ll1_grammars() {
        let examples = ExampleGrammars::default();
        assert_eq!(
            examples.names().collect::<Vec<_>>(),
            vec!["pascal_subset", "arithmetic", "simple"]
        );
        for example in &examples.grammars {
            let g = Grammar::parse(&example.grammar).unwrap();
            assert!(Analysis::new(&g).is_ll1(), "{} is not LL(1)", example.name);
        }
    }

    #[test]
    fn loads_from_json() {
        let examples = ExampleGrammars::from_json(
            r#"{"grammars": [{"name": "tiny", "grammar": "S → a;"}]}"#,
        )
        .unwrap();
        assert_eq!(examples.get("tiny"), Some("S → a;"));
        assert_eq!(examples.get("simple"), None);
        assert!(ExampleGrammars::from_json("[]").is_err());
    }
}
