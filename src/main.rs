mod cli;

use std::{fs, io::Read, path::Path, process::ExitCode};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::info;

use cli::{Cli, Format, Output};
use grammar_playground::{
    codegen::generate_parser,
    example_grammars::ExampleGrammars,
    grammar::{derivation::steps_to_plaintext, Analysis},
    Derivation, Grammar,
};

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_examples(path: Option<&Path>) -> Result<ExampleGrammars> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ExampleGrammars::from_json(&json)
                .with_context(|| format!("invalid example grammars in {}", path.display()))
        }
        None => Ok(ExampleGrammars::default()),
    }
}

fn read_grammar(
    file: Option<&Path>,
    example: Option<&str>,
    examples: &ExampleGrammars,
) -> Result<String> {
    if let Some(file) = file {
        return fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()));
    }
    if let Some(name) = example {
        return examples.get(name).map(str::to_string).ok_or_else(|| {
            anyhow!(
                "unknown example \"{}\", available: {}",
                name,
                examples.names().collect::<Vec<_>>().join(", ")
            )
        });
    }
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read grammar from stdin")?;
    Ok(input)
}

fn run(cli: &Cli) -> Result<()> {
    let examples = load_examples(cli.examples_file.as_deref())?;
    if cli.list_examples {
        for name in examples.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let (outputs, file) = cli.outputs_and_file()?;
    if outputs.is_empty() {
        bail!("no output selected, expected any of: prod, nff, ll1, conflicts, parser, parse");
    }
    if file.is_some() && cli.example.is_some() {
        bail!("a grammar file and --example cannot be used together");
    }

    let input = read_grammar(file.as_deref(), cli.example.as_deref(), &examples)?;
    let g = match Grammar::parse(&input) {
        Ok(g) => g,
        Err(e) => {
            if cli.format == Format::Json {
                println!("{}", e.to_json());
            }
            return Err(e.into());
        }
    };
    let analysis = Analysis::new(&g);
    info!(
        "{} production(s), {} conflict(s)",
        g.productions().len(),
        analysis.conflicts.len()
    );

    for output in outputs {
        println!("{}", render(cli, &g, &analysis, output)?);
    }
    Ok(())
}

fn render(cli: &Cli, g: &Grammar, analysis: &Analysis, output: Output) -> Result<String> {
    let text = match output {
        Output::Prod => {
            let t = g.to_production_output_vec();
            match cli.format {
                Format::Plain => t.to_plaintext(),
                Format::Latex => t.to_latex(),
                Format::Json => serde_json::to_string(&t.to_strings())?,
            }
        }
        Output::Nff => {
            let t = g.to_non_terminal_output_vec(analysis);
            match cli.format {
                Format::Plain => t.to_plaintext(),
                Format::Latex => t.to_latex(),
                Format::Json => t.to_json()?,
            }
        }
        Output::Ll1 => match cli.format {
            Format::Plain => g.to_ll1_parsing_table_output(&analysis.table).to_plaintext(),
            Format::Latex => g.to_ll1_parsing_table_output(&analysis.table).to_latex(),
            Format::Json => serde_json::to_string(&g.to_ll1_table_json(&analysis.table))?,
        },
        Output::Conflicts => {
            let conflicts: Vec<_> = analysis
                .conflicts
                .iter()
                .map(|c| g.to_conflict_output(c))
                .collect();
            match cli.format {
                Format::Json => serde_json::to_string(&conflicts)?,
                _ if conflicts.is_empty() => "Grammar is LL(1)".to_string(),
                _ => conflicts
                    .iter()
                    .map(|c| c.to_plaintext())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            }
        }
        Output::Parser => {
            let code = generate_parser(&analysis.table, g, cli.backend)?;
            match cli.format {
                Format::Json => serde_json::to_string(&serde_json::json!({
                    "backend": cli.backend.name(),
                    "code": code,
                }))?,
                _ => code,
            }
        }
        Output::Parse => {
            let sentence = cli
                .sentence
                .as_deref()
                .context("the parse output needs --sentence")?;
            let (steps, result) = g.trace_sentence(&analysis.table, sentence);
            match (result, cli.format) {
                (Ok(tree), Format::Json) => serde_json::to_string(&Derivation { tree, steps })?,
                (Ok(tree), _) => Derivation { tree, steps }.to_plaintext(),
                (Err(e), format) => {
                    if format == Format::Json {
                        println!(
                            "{}",
                            serde_json::json!({ "error": e.to_string(), "steps": steps })
                        );
                    } else if !steps.is_empty() {
                        println!("{}", steps_to_plaintext(&steps));
                    }
                    return Err(e.into());
                }
            }
        }
    };
    Ok(text)
}
