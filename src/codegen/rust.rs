use super::{quote, CodeWriter, Emitter, Lookahead};

pub struct Rust;

impl Emitter for Rust {
    fn prologue(&self, out: &mut CodeWriter, _start: &str, _procedures: &[&str]) {
        out.line("// Recursive-descent parser generated by grammar-playground.");
        out.blank();
        out.line("#[derive(Debug)]");
        out.line("pub struct ParseError(pub String);");
        out.blank();
        out.line("pub struct Parser<'a> {");
        out.indent();
        out.line("tokens: Vec<&'a str>,");
        out.line("pos: usize,");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("#[allow(non_snake_case)]");
        out.line("impl<'a> Parser<'a> {");
        out.indent();
        out.line("pub fn new(text: &'a str) -> Self {");
        out.indent();
        out.line("Self {");
        out.indent();
        out.line("tokens: text.split_whitespace().collect(),");
        out.line("pos: 0,");
        out.dedent();
        out.line("}");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("/// `None` at the end of input.");
        out.line("fn lookahead(&self) -> Option<&'a str> {");
        out.indent();
        out.line("self.tokens.get(self.pos).copied()");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("fn expect(&mut self, terminal: &str) -> Result<(), ParseError> {");
        out.indent();
        out.line("if self.lookahead() != Some(terminal) {");
        out.indent();
        out.line("return Err(ParseError(format!(");
        out.indent();
        out.line("\"expected {:?}, found {:?}\",");
        out.line("terminal,");
        out.line("self.lookahead()");
        out.dedent();
        out.line(")));");
        out.dedent();
        out.line("}");
        out.line("self.pos += 1;");
        out.line("Ok(())");
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn begin_procedure(&self, out: &mut CodeWriter, procedure: &str, non_terminal: &str) {
        out.line(format!("/// {}", non_terminal));
        out.line(format!("fn {}(&mut self) -> Result<(), ParseError> {{", procedure));
        out.indent();
    }

    fn branch(&self, out: &mut CodeWriter, first: bool, lookahead: Lookahead) {
        if first {
            out.line("match self.lookahead() {");
            out.indent();
        }
        let pattern = match lookahead {
            Lookahead::Terminal(t) => format!("Some({})", quote(t)),
            Lookahead::End => "None".to_string(),
        };
        out.line(format!("{} => {{", pattern));
        out.indent();
    }

    fn end_branch(&self, out: &mut CodeWriter) {
        out.dedent();
        out.line("}");
    }

    fn match_terminal(&self, out: &mut CodeWriter, terminal: &str) {
        out.line(format!("self.expect({})?;", quote(terminal)));
    }

    fn call_non_terminal(&self, out: &mut CodeWriter, procedure: &str) {
        out.line(format!("self.{}()?;", procedure));
    }

    fn syntax_error(
        &self,
        out: &mut CodeWriter,
        no_branches: bool,
        non_terminal: &str,
        expected: &[&str],
    ) {
        let error = |found: &str| {
            format!(
                "Err(ParseError(format!(\"expected one of {{}} in {{}}, found {{:?}}\", {}, {}, {})))",
                quote(&expected.join(", ")),
                quote(non_terminal),
                found
            )
        };
        if no_branches {
            out.line(error("self.lookahead()"));
        } else {
            out.line(format!("found => return {},", error("found")));
            out.dedent();
            out.line("}");
            out.line("Ok(())");
        }
    }

    fn end_procedure(&self, out: &mut CodeWriter) {
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn epilogue(&self, out: &mut CodeWriter, start: &str) {
        out.line("pub fn parse(&mut self) -> Result<(), ParseError> {");
        out.indent();
        out.line(format!("self.{}()?;", start));
        out.line("match self.lookahead() {");
        out.indent();
        out.line("None => Ok(()),");
        out.line("Some(found) => Err(ParseError(format!(");
        out.indent();
        out.line("\"expected end of input, found {:?}\",");
        out.line("found");
        out.dedent();
        out.line("))),");
        out.dedent();
        out.line("}");
        out.dedent();
        out.line("}");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("pub fn parse(text: &str) -> Result<(), ParseError> {");
        out.indent();
        out.line("Parser::new(text).parse()");
        out.dedent();
        out.line("}");
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        codegen::{generate_parser, Backend},
        grammar::{Analysis, Grammar},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn procedure_matches_on_lookahead() {
        let g = Grammar::parse("E → T E'; E' → + T E' | ε; T → id;").unwrap();
        let analysis = Analysis::new(&g);
        let source = generate_parser(&analysis.table, &g, Backend::Rust).unwrap();
        let procedure = source
            .split("\n\n")
            .find(|chunk| chunk.contains("fn parse_E_prime(&mut self)"))
            .unwrap();
        assert_eq!(
            procedure,
            r#"    /// E'
    fn parse_E_prime(&mut self) -> Result<(), ParseError> {
        match self.lookahead() {
            Some("+") => {
                self.expect("+")?;
                self.parse_T()?;
                self.parse_E_prime()?;
            }
            None => {
            }
            found => return Err(ParseError(format!("expected one of {} in {}, found {:?}", "+, $", "E'", found))),
        }
        Ok(())
    }"#
        );
        assert!(source.contains("#[allow(non_snake_case)]"));
        assert!(source.contains("        self.parse_E()?;\n        match self.lookahead() {\n            None => Ok(()),\n"));
    }

    #[test]
    fn procedure_without_branches_fails_immediately() {
        let g = Grammar::parse("S → a | B; B → B b;").unwrap();
        let analysis = Analysis::new(&g);
        let source = generate_parser(&analysis.table, &g, Backend::Rust).unwrap();
        assert!(source.contains(
            "    fn parse_B(&mut self) -> Result<(), ParseError> {\n        Err(ParseError(format!(\"expected one of {} in {}, found {:?}\", \"\", \"B\", self.lookahead())))\n    }"
        ));
    }
}
