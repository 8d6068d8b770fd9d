use super::{quote, CodeWriter, Emitter, Lookahead};

pub struct Python;

impl Emitter for Python {
    fn prologue(&self, out: &mut CodeWriter, _start: &str, _procedures: &[&str]) {
        out.line("# Recursive-descent parser generated by grammar-playground.");
        out.blank();
        out.blank();
        out.line("class ParseError(Exception):");
        out.indent();
        out.line("pass");
        out.dedent();
        out.blank();
        out.blank();
        out.line("class Parser:");
        out.indent();
        out.line("def __init__(self, tokens):");
        out.indent();
        out.line("self.tokens = list(tokens)");
        out.line("self.pos = 0");
        out.dedent();
        out.blank();
        out.line("# None at the end of input");
        out.line("def lookahead(self):");
        out.indent();
        out.line("if self.pos < len(self.tokens):");
        out.indent();
        out.line("return self.tokens[self.pos]");
        out.dedent();
        out.line("return None");
        out.dedent();
        out.blank();
        out.line("def found(self):");
        out.indent();
        out.line("if self.lookahead() is None:");
        out.indent();
        out.line("return \"end of input\"");
        out.dedent();
        out.line("return repr(self.lookahead())");
        out.dedent();
        out.blank();
        out.line("def expect(self, terminal):");
        out.indent();
        out.line("if self.lookahead() != terminal:");
        out.indent();
        out.line("raise ParseError(\"expected %r, found %s\" % (terminal, self.found()))");
        out.dedent();
        out.line("self.pos += 1");
        out.dedent();
        out.blank();
    }

    fn begin_procedure(&self, out: &mut CodeWriter, procedure: &str, non_terminal: &str) {
        out.line(format!("def {}(self):", procedure));
        out.indent();
        out.line(format!("# {}", non_terminal));
    }

    fn branch(&self, out: &mut CodeWriter, first: bool, lookahead: Lookahead) {
        let keyword = if first { "if" } else { "elif" };
        let test = match lookahead {
            Lookahead::Terminal(t) => format!("self.lookahead() == {}", quote(t)),
            Lookahead::End => "self.lookahead() is None".to_string(),
        };
        out.line(format!("{} {}:", keyword, test));
        out.indent();
    }

    fn end_branch(&self, out: &mut CodeWriter) {
        out.dedent();
    }

    fn match_terminal(&self, out: &mut CodeWriter, terminal: &str) {
        out.line(format!("self.expect({})", quote(terminal)));
    }

    fn call_non_terminal(&self, out: &mut CodeWriter, procedure: &str) {
        out.line(format!("self.{}()", procedure));
    }

    fn empty_body(&self, out: &mut CodeWriter) {
        out.line("pass");
    }

    fn syntax_error(
        &self,
        out: &mut CodeWriter,
        no_branches: bool,
        non_terminal: &str,
        expected: &[&str],
    ) {
        let raise = format!(
            "raise ParseError({} + self.found())",
            quote(&format!(
                "expected one of {} in {}, found ",
                expected.join(", "),
                non_terminal
            ))
        );
        if no_branches {
            out.line(raise);
        } else {
            out.line("else:");
            out.indent();
            out.line(raise);
            out.dedent();
        }
    }

    fn end_procedure(&self, out: &mut CodeWriter) {
        out.dedent();
        out.blank();
    }

    fn epilogue(&self, out: &mut CodeWriter, start: &str) {
        out.line("def parse(self):");
        out.indent();
        out.line(format!("self.{}()", start));
        out.line("if self.pos != len(self.tokens):");
        out.indent();
        out.line("raise ParseError(\"expected end of input, found \" + self.found())");
        out.dedent();
        out.dedent();
        out.dedent();
        out.blank();
        out.blank();
        out.line("def parse(text):");
        out.indent();
        out.line("Parser(text.split()).parse()");
        out.dedent();
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
    fn one_branch_per_lookahead() {
        let g = Grammar::parse("S → a S | ε;").unwrap();
        let analysis = Analysis::new(&g);
        let source = generate_parser(&analysis.table, &g, Backend::Python).unwrap();
        let procedure = source
            .split("\n\n")
            .find(|chunk| chunk.contains("def parse_S(self):"))
            .unwrap();
        assert_eq!(
            procedure,
            r#"    def parse_S(self):
        # S
        if self.lookahead() == "a":
            self.expect("a")
            self.parse_S()
        elif self.lookahead() is None:
            pass
        else:
            raise ParseError("expected one of a, $ in S, found " + self.found())"#
        );
        assert!(source.contains(
            "    def parse(self):\n        self.parse_S()\n        if self.pos != len(self.tokens):\n"
        ));
        assert!(source.ends_with("def parse(text):\n    Parser(text.split()).parse()\n"));
    }

    #[test]
    fn end_of_input_is_not_a_token() {
        let g = Grammar::parse("S → a S | ε;").unwrap();
        let analysis = Analysis::new(&g);
        let source = generate_parser(&analysis.table, &g, Backend::Python).unwrap();
        assert!(!source.contains("== \"$\""));
        assert!(!source.contains("return \"$\""));
        assert!(source.contains("        return None\n"));
    }

    #[test]
    fn quotes_terminals() {
        let g = Grammar::parse("S → \" S | \\;").unwrap();
        let analysis = Analysis::new(&g);
        let source = generate_parser(&analysis.table, &g, Backend::Python).unwrap();
        assert!(source.contains(r#"self.expect("\"")"#));
        assert!(source.contains(r#"if self.lookahead() == "\"":"#));
        assert!(source.contains(r#"elif self.lookahead() == "\\":"#));
    }
}
