//! Expression engine coverage: precedence, associativity, postfix forms.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use poly_parser::ast::{Node, NodeKind};
use poly_parser::parse_source;
use pretty_assertions::assert_eq;

fn rhs(source: &str) -> Node {
    let program = parse_source(source).expect(source);
    let NodeKind::Program { mut statements } = program.kind else {
        panic!("expected program");
    };
    match statements.remove(0).kind {
        NodeKind::VariableAssignment { value, .. } => *value,
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        rhs("x = 1 + 2 * 3 - 4").summary(),
        "Binary(-, Binary(+, Number(1), Binary(*, Number(2), Number(3))), Number(4))"
    );
}

#[test]
fn comparison_is_looser_than_arithmetic() {
    assert_eq!(
        rhs("x = a + 1 < b * 2").summary(),
        "Binary(<, Binary(+, Id(a), Number(1)), Binary(*, Id(b), Number(2)))"
    );
}

#[test]
fn logical_operators_stack_loosest() {
    assert_eq!(
        rhs("x = a == 1 && b != 2 || c").summary(),
        "Binary(||, Binary(&&, Binary(==, Id(a), Number(1)), Binary(!=, Id(b), Number(2))), Id(c))"
    );
}

#[test]
fn left_associative_operators_lean_left() {
    assert_eq!(
        rhs("x = 10 - 4 - 3").summary(),
        "Binary(-, Binary(-, Number(10), Number(4)), Number(3))"
    );
    assert_eq!(
        rhs("x = a ++ b ++ c").summary(),
        "Binary(++, Binary(++, Id(a), Id(b)), Id(c))"
    );
}

#[test]
fn exponentiation_is_right_associative() {
    assert_eq!(
        rhs("x = 2 ** 3 ** 2").summary(),
        "Binary(**, Number(2), Binary(**, Number(3), Number(2)))"
    );
}

#[test]
fn shifts_sit_between_comparisons_and_bitwise_and() {
    assert_eq!(
        rhs("x = 1 << 2 + 3").summary(),
        "Binary(<<, Number(1), Binary(+, Number(2), Number(3)))"
    );
    // `&` binds tighter than shifts in this table
    assert_eq!(
        rhs("x = a & 3 << 1").summary(),
        "Binary(<<, Binary(&, Id(a), Number(3)), Number(1))"
    );
}

#[test]
fn bitwise_or_on_numbers_stays_binary() {
    // `|` between non-stage operands reads as bitwise-or, not a pipeline
    assert_eq!(rhs("x = 1 | 2").summary(), "Binary(|, Number(1), Number(2))");
}

#[test]
fn parenthesized_groups_are_transparent() {
    assert_eq!(
        rhs("x = (1 + 2) * 3").summary(),
        "Binary(*, Binary(+, Number(1), Number(2)), Number(3))"
    );
}

#[test]
fn unary_prefixes_bind_to_their_operand() {
    assert_eq!(rhs("x = -a + 2").summary(), "Binary(+, Unary(-, Id(a)), Number(2))");
    assert_eq!(rhs("x = ~mask").summary(), "Unary(~, Id(mask))");
}

#[test]
fn nested_ternaries_are_right_associative() {
    assert_eq!(
        rhs("x = a ? b : c ? d : e").summary(),
        "Ternary(Id(a), Id(b), Ternary(Id(c), Id(d), Id(e)))"
    );
}

#[test]
fn ternary_sits_above_comparisons_in_the_table() {
    // `?` binds at precedence 5, one step tighter than comparisons, so the
    // comparison's right operand hosts the ternary
    assert_eq!(
        rhs("x = a > 1 ? b : c").summary(),
        "Binary(>, Id(a), Ternary(Number(1), Id(b), Id(c)))"
    );
    // a parenthesized condition gets the C-style reading
    assert_eq!(
        rhs("x = (a > 1) ? b : c").summary(),
        "Ternary(Binary(>, Id(a), Number(1)), Id(b), Id(c))"
    );
}

#[test]
fn shifts_win_the_precedence_tie_with_ternary() {
    // `<<` is left-associative at the same precedence as `?`, so the shift
    // reduces first and the ternary takes the whole shift as its condition
    assert_eq!(
        rhs("x = a << b ? c : d").summary(),
        "Ternary(Binary(<<, Id(a), Id(b)), Id(c), Id(d))"
    );
}

#[test]
fn elvis_fallback_takes_following_operators() {
    assert_eq!(
        rhs("x = a ?: b + 1").summary(),
        "Ternary(Id(a), Id(a), Binary(+, Id(b), Number(1)))"
    );
}

#[test]
fn index_chains_nest_left_associatively() {
    assert_eq!(
        rhs("x = a[i][j]").summary(),
        "Index(Index(Id(a), Id(i)), Id(j))"
    );
}

#[test]
fn index_binds_tighter_than_operators() {
    assert_eq!(
        rhs("x = a[0] + b[1]").summary(),
        "Binary(+, Index(Id(a), Number(0)), Index(Id(b), Number(1)))"
    );
}

#[test]
fn qualified_index_reads_in_expressions() {
    assert_eq!(
        rhs("x = py.rows[2].name").summary(),
        "Index(Index(QualifiedId(python, rows), Number(2)), String(\"name\"))"
    );
}

#[test]
fn nested_language_calls_as_arguments() {
    assert_eq!(
        rhs("x = lua.math.max(py.stats.mean(data), 0)").summary(),
        "Call(lua, math.max, [Call(python, stats.mean, [Id(data)]), Number(0)])"
    );
}

#[test]
fn call_arguments_tolerate_newlines() {
    assert_eq!(
        rhs("x = py.fn(\n  1,\n  2\n)").summary(),
        "Call(python, fn, [Number(1), Number(2)])"
    );
}

#[test]
fn string_literals_decode_escapes() {
    let node = rhs(r#"x = "line\none""#);
    assert!(matches!(node.kind, NodeKind::String { ref value } if value == "line\none"));
}

#[test]
fn booleans_and_nil_are_literals() {
    assert!(matches!(rhs("x = true").kind, NodeKind::Boolean { value: true }));
    assert!(matches!(rhs("x = false").kind, NodeKind::Boolean { value: false }));
    assert!(matches!(rhs("x = nil").kind, NodeKind::Nil));
}

#[test]
fn right_spine_precedence_invariant_holds() {
    // for every left-associative Binary node, the right child's operator
    // binds strictly tighter
    fn check(node: &Node) {
        if let NodeKind::Binary { op, left, right } = &node.kind {
            if let NodeKind::Binary { op: right_op, .. } = &right.kind {
                let prec = |o: &str| match o {
                    "||" => 1,
                    "&&" => 2,
                    "==" | "!=" => 3,
                    "<" | "<=" | ">" | ">=" | "|" => 4,
                    "<<" | ">>" => 5,
                    "&" => 6,
                    "^" | "~" => 7,
                    "+" | "-" => 8,
                    "*" | "/" | "%" => 9,
                    "**" => 10,
                    "++" => 11,
                    other => panic!("unknown operator {other}"),
                };
                if op != "**" {
                    assert!(prec(right_op) > prec(op), "{op} vs {right_op}");
                }
            }
            check(left);
            check(right);
        }
    }
    check(&rhs("x = 1 + 2 * 3 - 4 / 5 % 6 + 7 ** 8 ** 9"));
    check(&rhs("x = a && b || c == d + e * f"));
}
