use codespan::Files;
use sauce::codegen::CBackend;
use sauce::lexer::Lexer;
use sauce::parser::Parser;
use sauce::typeck::Resolver;

fn compile(source: &str) -> String {
    let mut files = Files::new();
    let file_id = files.add("test", source.to_string());
    let lexer = Lexer::new(&files, file_id);
    let mut parser = Parser::new(lexer).unwrap();
    let program = parser.parse().unwrap();

    let mut resolver = Resolver::new(&program, file_id);
    resolver.resolve().unwrap();

    let mut backend = CBackend::new(&resolver, file_id);
    backend.generate(&program).unwrap()
}

#[test]
fn test_preamble_and_includes() {
    let code = compile("say(1)\n");

    assert!(code.contains("#define _POSIX_C_SOURCE 200809L"));
    assert!(code.contains("#include <stdio.h>"));
    assert!(code.contains("#include <stdlib.h>"));
    assert!(code.contains("#include <string.h>"));
}

#[test]
fn test_global_is_zero_initialized_and_assigned_in_main() {
    let code = compile("x[int] = 2 + 3\nsay(x)\n");

    assert!(code.contains("int x = 0;"));
    let assign = code.find("x = (2 + 3);").unwrap();
    let print = code.find("printf(\"%d\\n\", x);").unwrap();
    assert!(assign < print);
}

#[test]
fn test_global_initializers_run_in_source_order() {
    let code = compile("a[int] = 1\nsay(a)\nb[int] = 2\nsay(b)\n");

    let a = code.find("a = 1;").unwrap();
    let say_a = code.find("printf(\"%d\\n\", a);").unwrap();
    let b = code.find("b = 2;").unwrap();
    let say_b = code.find("printf(\"%d\\n\", b);").unwrap();
    assert!(a < say_a && say_a < b && b < say_b);
}

#[test]
fn test_say_bool_prints_words() {
    let code = compile("say(true)\n");
    assert!(code.contains("printf(\"%s\\n\", (1) ? \"true\" : \"false\");"));
}

#[test]
fn test_say_float_format() {
    let code = compile("say(1.5)\n");
    assert!(code.contains("printf(\"%f\\n\", 1.5);"));
}

#[test]
fn test_say_void_call_emits_placeholder() {
    let code = compile("fn p() {\n    say(1)\n}\nsay(p())\n");
    assert!(code.contains("printf(\"UNKNOWN_TYPE\\n\");"));
}

#[test]
fn test_string_reassignment_frees_previous_buffer() {
    let code = compile("name[text] = \"hi\"\nname = \"bye\"\n");

    assert!(code.contains("char* name = NULL;"));
    let first = code.find("name = strdup(\"hi\");").unwrap();
    let free_between = code[first..].find("if (name != NULL) free(name);").unwrap();
    let second = code[first..].find("name = strdup(\"bye\");").unwrap();
    assert!(free_between < second);
}

#[test]
fn test_string_globals_are_freed_at_end_of_main() {
    let code = compile("s[text] = \"x\"\n");

    let cleanup = code.rfind("if (s != NULL) free(s);").unwrap();
    let ret = code.rfind("return 0;").unwrap();
    assert!(cleanup < ret);
}

#[test]
fn test_prototype_uses_inferred_return_type() {
    let code = compile("fn f() {\n    return 3.5\n}\n");

    assert!(code.contains("double f();"));
    assert!(code.contains("double f() {"));
}

#[test]
fn test_user_main_is_renamed() {
    let code = compile("fn main() [int] {\n    return 1\n}\nmain()\n");

    assert!(code.contains("int sauce_main();"));
    assert!(code.contains("int sauce_main() {"));
    assert!(code.contains("    sauce_main();"));
    assert_eq!(code.matches("int main(void)").count(), 1);
}

#[test]
fn test_safety_fallback_return() {
    let code = compile("fn f() [int] {\n    say(1)\n}\n");
    assert!(code.contains("int f() {\n    printf(\"%d\\n\", 1);\n    return 0;\n}"));
}

#[test]
fn test_no_fallback_after_literal_return() {
    let code = compile("fn f() [int] {\n    return 1\n}\n");
    assert!(code.contains("int f() {\n    return 1;\n}"));
}

#[test]
fn test_return_annotation_emits_cast() {
    let code = compile("fn f() {\n    return[int] 2.5\n}\n");
    assert!(code.contains("return (int)2.5;"));
}

#[test]
fn test_hear_int_scans_and_flushes_line() {
    let code = compile("x[int]\nhear(x)\n");

    assert!(code.contains("printf(\"\\n> \");"));
    let scan = code.find("scanf(\"%d\", &x)").unwrap();
    let flush = code.find("{ int _c = getchar(); while (_c != '\\n' && _c != EOF) _c = getchar(); }").unwrap();
    assert!(scan < flush);
}

#[test]
fn test_hear_float_uses_lf() {
    let code = compile("x[float]\nhear(x)\n");
    assert!(code.contains("scanf(\"%lf\", &x)"));
}

#[test]
fn test_hear_string_reads_line_and_takes_ownership() {
    let code = compile("s[text]\nhear(s)\n");

    assert!(code.contains("fgets(_buf, sizeof(_buf), stdin)"));
    assert!(code.contains("_buf[strcspn(_buf, \"\\n\")] = '\\0';"));
    assert!(code.contains("s = strdup(_buf);"));
}

#[test]
fn test_else_if_emits_nested_conditional() {
    let code = compile(
        "x[int] = 1\nif (x > 2) {\n    say(1)\n} else if (x > 1) {\n    say(2)\n} else {\n    say(3)\n}\n",
    );
    assert!(code.contains("} else {\n        if ((x > 1)) {"));
}

#[test]
fn test_function_parameters_are_typed() {
    let code = compile("fn add(a[int], b[float]) [float] {\n    return a + b\n}\n");

    assert!(code.contains("double add(int, double);"));
    assert!(code.contains("double add(int a, double b) {"));
    assert!(code.contains("return (a + b);"));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "s[text] = \"hi\"\nx[int] = 1 + 2\nfn f() {\n    return 3.5\n}\nsay(f())\nsay(s)\nsay(x)\n";
    assert_eq!(compile(source), compile(source));
}
