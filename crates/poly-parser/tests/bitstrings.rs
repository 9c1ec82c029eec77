//! Bitstring literals, patterns, sizes, and specifiers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use poly_parser::ast::{BitstringSegment, NodeKind, SizeExpr};
use poly_parser::parse_source;
use pretty_assertions::assert_eq;

fn segments(source: &str) -> Vec<BitstringSegment> {
    let program = parse_source(source).expect(source);
    let NodeKind::Program { mut statements } = program.kind else {
        panic!("expected program");
    };
    match statements.remove(0).kind {
        NodeKind::Bitstring { segments } => segments,
        NodeKind::VariableAssignment { value, .. } => match value.kind {
            NodeKind::Bitstring { segments } => segments,
            other => panic!("expected bitstring, got {other:?}"),
        },
        other => panic!("expected bitstring, got {other:?}"),
    }
}

#[test]
fn empty_bitstring() {
    assert!(segments("<<>>").is_empty());
}

#[test]
fn literal_sizes_are_static() {
    let segs = segments("<<1:8, 2:16>>");
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].size, Some(SizeExpr::Literal(8)));
    assert!(!segs[0].size_is_dynamic);
    assert_eq!(segs[1].size, Some(SizeExpr::Literal(16)));
    assert!(!segs[1].size_is_dynamic);
}

#[test]
fn segment_without_size_or_specifier() {
    let segs = segments("<<version>>");
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].size, None);
    assert!(!segs[0].colon_present);
    assert!(!segs[0].slash_present);
}

#[test]
fn variable_size_is_dynamic_when_specifier_follows() {
    let segs = segments("<<payload:len/binary>>");
    assert_eq!(segs[0].size, Some(SizeExpr::Variable("len".to_string())));
    assert!(segs[0].size_is_dynamic);
    assert!(segs[0].colon_present);
    assert!(segs[0].slash_present);
}

#[test]
fn lone_colon_identifier_reclassifies_as_type_specifier() {
    // `data:binary` with no `/` sizes nothing; binary is a type specifier
    let segs = segments("<<data:binary>>");
    assert_eq!(segs[0].size, None);
    assert!(!segs[0].size_is_dynamic);
    assert_eq!(segs[0].specifiers, vec!["binary".to_string()]);
    assert!(segs[0].colon_present);
    assert!(!segs[0].slash_present);
}

#[test]
fn parenthesized_size_expression_is_dynamic() {
    let segs = segments("<<payload:(len*8-4)/binary>>");
    match &segs[0].size {
        Some(SizeExpr::Expr(node)) => {
            assert_eq!(
                node.summary(),
                "Binary(-, Binary(*, Id(len), Number(8)), Number(4))"
            );
        }
        other => panic!("expected dynamic size expression, got {other:?}"),
    }
    assert!(segs[0].size_is_dynamic);
}

#[test]
fn parenthesized_literal_size_collapses_to_static() {
    let segs = segments("<<flags:(16)>>");
    assert_eq!(segs[0].size, Some(SizeExpr::Literal(16)));
    assert!(!segs[0].size_is_dynamic);
}

#[test]
fn parenthesized_arithmetic_on_literals_stays_dynamic() {
    // any operator makes the size dynamic, even over pure literals
    let segs = segments("<<flags:(8+8)>>");
    assert!(matches!(segs[0].size, Some(SizeExpr::Expr(_))));
    assert!(segs[0].size_is_dynamic);
}

#[test]
fn qualified_size_is_dynamic() {
    let segs = segments("<<body:py.cfg.width/bits>>");
    assert!(matches!(segs[0].size, Some(SizeExpr::Expr(_))));
    assert!(segs[0].size_is_dynamic);
}

#[test]
fn multiple_specifiers_join_in_order() {
    let segs = segments("<<count:32/integer-unsigned-big>>");
    assert_eq!(
        segs[0].specifiers,
        vec!["integer".to_string(), "unsigned".to_string(), "big".to_string()]
    );
}

#[test]
fn unit_specifier_carries_its_parameter() {
    let segs = segments("<<chunk:size/binary-unit:1>>");
    assert_eq!(segs[0].specifiers, vec!["binary".to_string(), "unit:1".to_string()]);
}

#[test]
fn unit_parameter_out_of_range_is_rejected() {
    let err = parse_source("<<chunk:8/unit:300>>").unwrap_err();
    assert!(err.to_string().starts_with("unit specifier must be between 1 and 256"));
}

#[test]
fn unknown_specifier_is_rejected() {
    let err = parse_source("<<x:8/gigantic>>").unwrap_err();
    assert_eq!(err.to_string(), "unknown bitstring specifier 'gigantic' at line 1, column 7");
}

#[test]
fn newlines_are_tolerated_around_separators() {
    let segs = segments("<<\n  a:8,\n  b:16\n>>");
    assert_eq!(segs.len(), 2);
}

#[test]
fn bitstring_literal_as_assignment_value() {
    let segs = segments("packet = <<1:8, checksum:16>>");
    assert_eq!(segs.len(), 2);
}

#[test]
fn pattern_assignment_supports_walrus() {
    let program = parse_source("<<a:8>> := data").expect("walrus pattern");
    let NodeKind::Program { statements } = program.kind else {
        panic!("expected program");
    };
    match &statements[0].kind {
        NodeKind::BitstringPatternAssignment { op, .. } => assert_eq!(op, ":="),
        other => panic!("expected pattern assignment, got {other:?}"),
    }
}

#[test]
fn pattern_value_may_be_a_bitstring() {
    let program = parse_source("<<a:8>> = <<1:8>>").expect("bitstring value");
    let NodeKind::Program { statements } = program.kind else {
        panic!("expected program");
    };
    match &statements[0].kind {
        NodeKind::BitstringPatternAssignment { value, .. } => {
            assert!(matches!(value.kind, NodeKind::Bitstring { .. }));
        }
        other => panic!("expected pattern assignment, got {other:?}"),
    }
}

#[test]
fn segment_values_may_be_expressions() {
    let segs = segments("<<a+1:8>>");
    assert_eq!(segs[0].value.summary(), "Binary(+, Id(a), Number(1))");
    assert_eq!(segs[0].size, Some(SizeExpr::Literal(8)));
}
