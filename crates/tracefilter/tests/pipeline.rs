//! End-to-end tests for the filter compilation pipeline.
//!
//! These drive the public API only: text in, wire bytes out, decoded
//! back through the bytecode contract.

use tracefilter::bytecode::{Constant, FieldCategory, Opcode, Program};
use tracefilter::lexer::{tokenize, LexErrorKind};
use tracefilter::parser::{parse, ParsedFilter};
use tracefilter::{compile, CompileError, CompileOptions, CompiledFilter, FieldSchema};

fn bytecode(text: &str) -> Vec<u8> {
    match compile(text, &CompileOptions::default()).unwrap() {
        CompiledFilter::Bytecode(buf) => buf.into_bytes(),
        CompiledFilter::MatchAll => panic!("unexpected match-all for {:?}", text),
    }
}

fn program(text: &str) -> Program {
    Program::decode(&bytecode(text)).unwrap()
}

#[test]
fn integer_threshold_layout() {
    let prog = program("int_loglevel >= 5");

    assert_eq!(prog.fields.len(), 1);
    assert_eq!(prog.fields[0].name, "int_loglevel");
    assert_eq!(prog.fields[0].category, FieldCategory::Integer);

    assert_eq!(prog.constants, vec![Constant::Int(5)]);

    let opcodes: Vec<Opcode> = prog.instructions.iter().map(|i| i.opcode).collect();
    assert_eq!(
        opcodes,
        vec![Opcode::PushField, Opcode::PushConst, Opcode::CmpGe]
    );
    assert_eq!(prog.instructions[0].operand, 0);
    assert_eq!(prog.instructions[1].operand, 0);
}

#[test]
fn wildcard_pattern_compiles_to_glob_match() {
    let prog = program("logger_name == \"app.*\"");
    assert_eq!(prog.constants, vec![Constant::Glob("app.*".to_string())]);
    assert_eq!(prog.fields[0].category, FieldCategory::Glob);
    assert!(prog
        .instructions
        .iter()
        .any(|i| i.opcode == Opcode::GlobEq));
}

#[test]
fn wildcard_free_pattern_demotes_to_exact_match() {
    let prog = program("logger_name == \"literal\"");
    assert_eq!(prog.constants, vec![Constant::Str("literal".to_string())]);
    assert_eq!(prog.fields[0].category, FieldCategory::String);
    assert!(prog.instructions.iter().any(|i| i.opcode == Opcode::StrEq));
    assert!(!prog.instructions.iter().any(|i| i.opcode == Opcode::GlobEq));
}

#[test]
fn comparison_nested_in_comparison_is_rejected() {
    let err = compile("(a == 1) == (b == 2)", &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Nesting(_)));
}

#[test]
fn ordering_on_string_is_rejected() {
    let err = compile("name > \"x\"", &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Type(_)));
}

#[test]
fn dangling_escape_is_caught_at_lex_time() {
    // The trailing backslash escapes the closing quote, leaving the
    // literal unterminated. This stage choice is fixed: malformed
    // escapes never reach glob validation.
    let err = compile(r#"a == "x \""#, &CompileOptions::default()).unwrap_err();
    match err {
        CompileError::Lex(lex) => assert_eq!(lex.kind, LexErrorKind::UnterminatedString),
        other => panic!("expected a lex error, got {:?}", other),
    }
}

#[test]
fn compilation_is_byte_identical_across_runs() {
    let text = "(int_loglevel >= 5 || int_loglevel == 1) && logger_name == \"app.**server\"";
    assert_eq!(bytecode(text), bytecode(text));
}

#[test]
fn skip_offsets_cover_exactly_the_right_operand() {
    let prog = program("a == 1 && b == 2");
    let skip = prog
        .instructions
        .iter()
        .position(|i| i.opcode == Opcode::SkipIfFalse)
        .expect("missing skip instruction");
    // The skip jumps over everything that remains: the right operand.
    assert_eq!(
        skip + 1 + prog.instructions[skip].operand as usize,
        prog.instructions.len()
    );
}

#[test]
fn closed_namespace_requires_known_fields() {
    let schema = FieldSchema::new()
        .with("int_loglevel", FieldCategory::Integer)
        .with("logger_name", FieldCategory::String);

    let options = CompileOptions::closed(schema.clone());
    assert!(compile(
        "int_loglevel >= 5 && logger_name == \"app.*\"",
        &options
    )
    .is_ok());

    let err = compile("unknown_field == 1", &options).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownField {
            name: "unknown_field".to_string()
        }
    );

    // The same expression is fine when the namespace stays open.
    assert!(compile("unknown_field == 1", &CompileOptions::open(schema)).is_ok());
}

#[test]
fn render_parse_round_trip_is_stable() {
    let cases = [
        "int_loglevel >= 5",
        "a == 1 && b == 2 || !(c != 3)",
        "logger_name == \"app.*\" && (a < 2 || b >= 0x10)",
        r#"msg == "quote \" and \\ backslash""#,
    ];
    for text in cases {
        let tokens = tokenize(text).unwrap();
        let first = match parse(&tokens, text.len()).unwrap() {
            ParsedFilter::Expr(expr) => expr,
            ParsedFilter::MatchAll => panic!("unexpected match-all"),
        };
        let rendered = first.to_string();
        let tokens = tokenize(&rendered).unwrap();
        let second = match parse(&tokens, rendered.len()).unwrap() {
            ParsedFilter::Expr(expr) => expr,
            ParsedFilter::MatchAll => panic!("unexpected match-all"),
        };
        assert_eq!(first, second, "round trip changed {:?}", text);
        // And the rendering itself is a fixed point.
        assert_eq!(rendered, second.to_string());
    }
}

#[test]
fn hex_and_decimal_literals_deduplicate() {
    let prog = program("a == 0x10 || a == 16");
    assert_eq!(prog.constants, vec![Constant::Int(16)]);
}

#[test]
fn buffer_is_standalone() {
    // The decoded view must be reconstructible from the bytes alone,
    // after every compiler structure is gone.
    let bytes = bytecode("int_loglevel >= 5 && logger_name == \"app.*\"");
    let prog = Program::decode(&bytes).unwrap();
    assert_eq!(prog.instructions.len(), 7);
    drop(bytes);
}

#[test]
fn lex_error_reports_offset() {
    let err = compile("a == $", &CompileOptions::default()).unwrap_err();
    match err {
        CompileError::Lex(lex) => {
            assert_eq!(lex.offset, 5);
            assert_eq!(lex.kind, LexErrorKind::InvalidCharacter);
        }
        other => panic!("expected a lex error, got {:?}", other),
    }
}

#[test]
fn parse_error_reports_offset() {
    let err = compile("a == 1 &&", &CompileOptions::default()).unwrap_err();
    match err {
        CompileError::Parse(parse) => assert_eq!(parse.offset, 9),
        other => panic!("expected a parse error, got {:?}", other),
    }
}
