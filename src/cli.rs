use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use grammar_playground::codegen::Backend;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Output {
    /// Productions
    Prod,
    /// Nullable, FIRST and FOLLOW sets
    Nff,
    /// LL(1) parsing table
    Ll1,
    /// Table conflicts with suggested rewrites
    Conflicts,
    /// Generated recursive-descent parser
    Parser,
    /// Parse steps and derivation tree of --sentence
    Parse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Plain,
    Latex,
    Json,
}

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Outputs (prod, nff, ll1, conflicts, parser, parse), then an optional
    /// grammar file (default: stdin)
    #[arg(value_name = "OUTPUTS... [FILE]")]
    pub args: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Plain)]
    pub format: Format,

    /// Target language of the generated parser
    #[arg(short, long, default_value_t = Backend::Python)]
    pub backend: Backend,

    /// Whitespace-separated tokens to parse with the LL(1) table
    #[arg(short, long, value_name = "TEXT")]
    pub sentence: Option<String>,

    /// Analyze a named example grammar instead of FILE
    #[arg(short, long, value_name = "NAME", conflicts_with = "list_examples")]
    pub example: Option<String>,

    /// JSON file replacing the built-in example grammars
    #[arg(long, value_name = "PATH")]
    pub examples_file: Option<PathBuf>,

    /// Print the names of the example grammars and exit
    #[arg(long)]
    pub list_examples: bool,
}

impl Cli {
    /// Splits the positional arguments into the leading outputs and the
    /// trailing grammar file.
    pub fn outputs_and_file(&self) -> Result<(Vec<Output>, Option<PathBuf>)> {
        let mut outputs = Vec::new();
        let mut rest = self.args.iter();
        let mut file = None;
        for arg in rest.by_ref() {
            match Output::from_str(arg, true) {
                Ok(output) => outputs.push(output),
                Err(_) => {
                    file = Some(PathBuf::from(arg));
                    break;
                }
            }
        }
        if let Some(extra) = rest.next() {
            bail!("unexpected argument \"{}\" after the grammar file", extra);
        }
        Ok((outputs, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn outputs_then_file() {
        let cli = Cli::parse_from(["grammar-playground", "nff", "ll1", "g.txt", "-f", "json"]);
        let (outputs, file) = cli.outputs_and_file().unwrap();
        assert_eq!(outputs, vec![Output::Nff, Output::Ll1]);
        assert_eq!(file, Some(PathBuf::from("g.txt")));
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.backend, Backend::Python);
    }

    #[test]
    fn backend_and_sentence() {
        let cli = Cli::parse_from([
            "grammar-playground",
            "parser",
            "parse",
            "--backend",
            "c",
            "--sentence",
            "id + id",
        ]);
        let (outputs, file) = cli.outputs_and_file().unwrap();
        assert_eq!(outputs, vec![Output::Parser, Output::Parse]);
        assert_eq!(file, None);
        assert_eq!(cli.backend, Backend::C);
        assert_eq!(cli.sentence.as_deref(), Some("id + id"));
    }

    #[test]
    fn rejects_arguments_after_file() {
        let cli = Cli::parse_from(["grammar-playground", "prod", "a.txt", "b.txt"]);
        assert!(cli.outputs_and_file().is_err());
    }
}
