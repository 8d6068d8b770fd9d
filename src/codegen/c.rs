use super::{quote, CodeWriter, Emitter, Lookahead};

pub struct C;

impl Emitter for C {
    fn prologue(&self, out: &mut CodeWriter, _start: &str, procedures: &[&str]) {
        out.line("/* Recursive-descent parser generated by grammar-playground. */");
        out.line("#include <stdio.h>");
        out.line("#include <stdlib.h>");
        out.line("#include <string.h>");
        out.blank();
        out.line("static char **tokens;");
        out.line("static int token_count;");
        out.line("static int pos;");
        out.blank();
        out.line("/* NULL at the end of input. */");
        out.line("static const char *lookahead(void) {");
        out.indent();
        out.line("return pos < token_count ? tokens[pos] : NULL;");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("static int lookahead_is(const char *terminal) {");
        out.indent();
        out.line("return lookahead() != NULL && strcmp(lookahead(), terminal) == 0;");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("static void report_found(void) {");
        out.indent();
        out.line("if (lookahead() == NULL) {");
        out.indent();
        out.line("fprintf(stderr, \"end of input\\n\");");
        out.dedent();
        out.line("} else {");
        out.indent();
        out.line("fprintf(stderr, \"\\\"%s\\\"\\n\", lookahead());");
        out.dedent();
        out.line("}");
        out.line("exit(1);");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("static void syntax_error(const char *non_terminal, const char *expected) {");
        out.indent();
        out.line("fprintf(stderr, \"expected one of %s in %s, found \", expected, non_terminal);");
        out.line("report_found();");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("static void expect(const char *terminal) {");
        out.indent();
        out.line("if (!lookahead_is(terminal)) {");
        out.indent();
        out.line("fprintf(stderr, \"expected \\\"%s\\\", found \", terminal);");
        out.line("report_found();");
        out.dedent();
        out.line("}");
        out.line("pos++;");
        out.dedent();
        out.line("}");
        out.blank();
        for procedure in procedures {
            out.line(format!("static void {}(void);", procedure));
        }
        out.blank();
    }

    fn begin_procedure(&self, out: &mut CodeWriter, procedure: &str, non_terminal: &str) {
        out.line(format!("/* {} */", non_terminal.replace("*/", "* /")));
        out.line(format!("static void {}(void) {{", procedure));
        out.indent();
    }

    fn branch(&self, out: &mut CodeWriter, first: bool, lookahead: Lookahead) {
        let keyword = if first { "if" } else { "} else if" };
        let test = match lookahead {
            Lookahead::Terminal(t) => format!("lookahead_is({})", quote(t)),
            Lookahead::End => "lookahead() == NULL".to_string(),
        };
        out.line(format!("{} ({}) {{", keyword, test));
        out.indent();
    }

    fn end_branch(&self, out: &mut CodeWriter) {
        out.dedent();
    }

    fn match_terminal(&self, out: &mut CodeWriter, terminal: &str) {
        out.line(format!("expect({});", quote(terminal)));
    }

    fn call_non_terminal(&self, out: &mut CodeWriter, procedure: &str) {
        out.line(format!("{}();", procedure));
    }

    fn syntax_error(
        &self,
        out: &mut CodeWriter,
        no_branches: bool,
        non_terminal: &str,
        expected: &[&str],
    ) {
        let call = format!(
            "syntax_error({}, {});",
            quote(non_terminal),
            quote(&expected.join(", "))
        );
        if no_branches {
            out.line(call);
        } else {
            out.line("} else {");
            out.indent();
            out.line(call);
            out.dedent();
            out.line("}");
        }
    }

    fn end_procedure(&self, out: &mut CodeWriter) {
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn epilogue(&self, out: &mut CodeWriter, start: &str) {
        out.line("int parse(char **input, int count) {");
        out.indent();
        out.line("tokens = input;");
        out.line("token_count = count;");
        out.line("pos = 0;");
        out.line(format!("{}();", start));
        out.line("if (pos != token_count) {");
        out.indent();
        out.line("fprintf(stderr, \"expected end of input, found \");");
        out.line("report_found();");
        out.dedent();
        out.line("}");
        out.line("return 0;");
        out.dedent();
        out.line("}");
        out.blank();
        out.line("int main(int argc, char **argv) {");
        out.indent();
        out.line("return parse(argv + 1, argc - 1);");
        out.dedent();
        out.line("}");
    }
}
