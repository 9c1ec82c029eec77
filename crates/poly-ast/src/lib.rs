//! Abstract syntax tree for the Poly language.
//!
//! The parser produces one [`Node`] per construct; every node owns its
//! children and carries the [`Span`] of its leftmost-to-rightmost tokens.
//! The variant set is closed: downstream tools match exhaustively on
//! [`NodeKind`] and get a compile error when the language grows.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use poly_position::Span;
use serde::{Deserialize, Serialize};

/// A numeric literal value.
///
/// Integers are arbitrary precision; anything with a decimal point or an
/// exponent falls back to a 64-bit float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumberValue {
    /// Arbitrary-precision integer
    Int(BigInt),
    /// 64-bit float
    Float(f64),
}

impl NumberValue {
    /// Whether this literal is an integer.
    pub fn is_int(&self) -> bool {
        matches!(self, NumberValue::Int(_))
    }

    /// The value as an `f64`, with integer widening (lossy past 2^53).
    pub fn as_f64(&self) -> f64 {
        match self {
            NumberValue::Int(i) => i.to_f64().unwrap_or(f64::INFINITY),
            NumberValue::Float(f) => *f,
        }
    }

    /// The value as a `u64` if it is a non-negative integer that fits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NumberValue::Int(i) => i.to_u64(),
            NumberValue::Float(_) => None,
        }
    }
}

impl std::fmt::Display for NumberValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberValue::Int(i) => write!(f, "{i}"),
            NumberValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Size of a bitstring segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SizeExpr {
    /// Static size from a numeric literal: `len:16`
    Literal(u64),
    /// Size taken from a variable at runtime: `payload:len`
    Variable(String),
    /// Size from an arbitrary expression: `payload:(len*8-4)`
    Expr(Box<Node>),
}

impl SizeExpr {
    /// Whether the size can only be resolved at runtime.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, SizeExpr::Literal(_))
    }
}

/// One `value[:size][/spec-spec…]` segment of a bitstring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitstringSegment {
    /// The value expression of the segment
    pub value: Node,
    /// Optional size after `:`
    pub size: Option<SizeExpr>,
    /// True when the size contains a variable, call, or operator
    pub size_is_dynamic: bool,
    /// Canonicalised specifiers, each `name` or `name:param`
    pub specifiers: Vec<String>,
    /// Whether a `:` appeared in the segment source
    pub colon_present: bool,
    /// Whether a `/` appeared in the segment source
    pub slash_present: bool,
}

/// One `pattern -> body` arm of a match statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    /// The pattern; `_` parses to [`NodeKind::Wildcard`]
    pub pattern: Node,
    /// Arm body statements
    pub body: Vec<Node>,
}

/// An AST node: a construct kind plus the source region it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The construct this node represents
    pub kind: NodeKind,
    /// Source region, starting at the node's leftmost token
    pub span: Span,
}

/// The closed set of Poly constructs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // ===== Literals =====
    /// Numeric literal
    Number {
        /// Parsed value, integer or float
        value: NumberValue,
    },
    /// String literal (quotes stripped, escapes resolved)
    String {
        /// Decoded string contents
        value: String,
    },
    /// Boolean literal
    Boolean {
        /// The literal value
        value: bool,
    },
    /// Nil literal
    Nil,
    /// The `_` wildcard pattern in match arms
    Wildcard,

    // ===== Identifiers and access paths =====
    /// Plain identifier
    Identifier {
        /// Variable name
        name: String,
    },
    /// Language-qualified identifier: `py.data.users`
    QualifiedIdentifier {
        /// Canonical language name from the alias registry
        language: String,
        /// Dot-separated segments after the language
        path: Vec<String>,
        /// Distinguishes a true qualified name from a plain identifier
        /// whose spelling happens to match a language
        qualified: bool,
    },
    /// Index access: `a[i]`; chains nest left-associatively
    Index {
        /// The indexed object
        object: Box<Node>,
        /// The index expression
        index: Box<Node>,
    },

    // ===== Expressions =====
    /// Binary operation
    Binary {
        /// Operator lexeme
        op: String,
        /// Left operand
        left: Box<Node>,
        /// Right operand
        right: Box<Node>,
    },
    /// Unary prefix operation
    Unary {
        /// Operator lexeme
        op: String,
        /// Operand
        operand: Box<Node>,
    },
    /// Ternary conditional; Elvis `a ?: b` is stored with `then_branch`
    /// structurally equal to `condition`
    Ternary {
        /// Condition
        condition: Box<Node>,
        /// Value when the condition holds
        then_branch: Box<Node>,
        /// Value otherwise
        else_branch: Box<Node>,
    },
    /// Pipeline: `a | b |> c`
    Pipe {
        /// Stages, in source order; always at least two
        stages: Vec<Node>,
        /// Operator lexemes between stages; always `stages.len() - 1`
        operators: Vec<String>,
    },
    /// Cross-language call: `lua.math.sqrt(x)`
    LanguageCall {
        /// Canonical language name
        language: String,
        /// Dotted function path within the runtime
        function_path: String,
        /// Argument expressions
        arguments: Vec<Node>,
    },
    /// Object literal argument value: `{ key: val, … }`
    ObjectLiteral {
        /// Key/value pairs in source order
        entries: Vec<(String, Node)>,
    },
    /// Array literal argument value: `[ v, v, … ]`
    ArrayLiteral {
        /// Element expressions
        elements: Vec<Node>,
    },
    /// Bitstring literal or pattern: `<<segment, …>>`
    Bitstring {
        /// The segments in source order
        segments: Vec<BitstringSegment>,
    },

    // ===== Statements =====
    /// Assignment to a plain or qualified variable
    VariableAssignment {
        /// Identifier or qualified identifier
        target: Box<Node>,
        /// `=` or `:=`
        op: String,
        /// Right-hand side
        value: Box<Node>,
    },
    /// Assignment through an index or property chain
    ExpressionAssignment {
        /// Index-expression left-hand side
        left: Box<Node>,
        /// `=` or `:=`
        op: String,
        /// Right-hand side
        value: Box<Node>,
    },
    /// Bare read of a variable, qualified variable, or index chain
    VariableRead {
        /// What is read
        target: Box<Node>,
    },
    /// A language call in statement position
    CallStatement {
        /// The underlying [`NodeKind::LanguageCall`]
        call: Box<Node>,
        /// Whether the call was marked to run in the background with `&`
        background: bool,
    },
    /// Conditional statement
    If {
        /// Condition
        condition: Box<Node>,
        /// Then-block statements
        then_block: Vec<Node>,
        /// `else if` chain: condition and block per link
        elif_branches: Vec<(Node, Vec<Node>)>,
        /// Optional final else block
        else_block: Option<Vec<Node>>,
    },
    /// While loop
    While {
        /// Condition
        condition: Box<Node>,
        /// Body statements
        body: Vec<Node>,
    },
    /// Numeric for: `for i = 1, 10, 2 do … end`
    NumericFor {
        /// Loop variable
        var: String,
        /// Start expression
        start: Box<Node>,
        /// End expression (inclusive)
        end: Box<Node>,
        /// Optional step
        step: Option<Box<Node>>,
        /// Body statements
        body: Vec<Node>,
    },
    /// C-style for: `for init; cond; incr { … }`
    CStyleFor {
        /// Optional initializer
        init: Option<Box<Node>>,
        /// Optional condition
        condition: Option<Box<Node>>,
        /// Optional increment
        increment: Option<Box<Node>>,
        /// Body statements
        body: Vec<Node>,
    },
    /// Iterator for: `for k, v in expr { … }`
    ForIn {
        /// Bound variables
        vars: Vec<String>,
        /// The iterated expression
        iterable: Box<Node>,
        /// Body statements
        body: Vec<Node>,
    },
    /// Match statement
    Match {
        /// The matched subject
        subject: Box<Node>,
        /// Arms in source order
        arms: Vec<MatchArm>,
    },
    /// Loop exit
    Break,
    /// Loop continuation
    Continue,
    /// Runtime import: `import lua "stdlib/math"`
    Import {
        /// Canonical language name
        runtime: String,
        /// Module path string
        path: String,
    },
    /// Destructuring a value against a bitstring pattern
    BitstringPatternAssignment {
        /// The [`NodeKind::Bitstring`] pattern
        pattern: Box<Node>,
        /// `=` or `:=`
        op: String,
        /// The matched value
        value: Box<Node>,
    },
    /// A whole source file: ordered top-level statements
    Program {
        /// Top-level statements
        statements: Vec<Node>,
    },
}

impl Node {
    /// Create a node.
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { kind, span }
    }

    /// Whether this node is a literal (number, string, boolean, nil).
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Number { .. }
                | NodeKind::String { .. }
                | NodeKind::Boolean { .. }
                | NodeKind::Nil
        )
    }

    /// Whether this node may stand as a pipeline stage.
    ///
    /// Stages are identifiers, qualified identifiers, language calls, or
    /// string literals. Numeric literals are never stages.
    pub fn is_pipe_stage(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Identifier { .. }
                | NodeKind::QualifiedIdentifier { .. }
                | NodeKind::LanguageCall { .. }
                | NodeKind::String { .. }
        )
    }

    /// Print the node back to parseable source text.
    ///
    /// Covers the pure-syntactic subset (literals, identifiers, qualified
    /// paths, index chains, arithmetic and the other binary forms, calls,
    /// simple assignments); re-parsing the printed form yields a
    /// structurally identical tree. Statement-heavy constructs fall back to
    /// their summary rendering.
    pub fn to_source(&self) -> String {
        match &self.kind {
            NodeKind::Number { value } => value.to_string(),
            NodeKind::String { value } => format!("{value:?}"),
            NodeKind::Boolean { value } => value.to_string(),
            NodeKind::Nil => "nil".to_string(),
            NodeKind::Wildcard => "_".to_string(),
            NodeKind::Identifier { name } => name.clone(),
            NodeKind::QualifiedIdentifier { language, path, .. } => {
                format!("{language}.{}", path.join("."))
            }
            NodeKind::Index { object, index } => match &index.kind {
                // property access prints back in dot form when the key is a
                // plain identifier
                NodeKind::String { value }
                    if value.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
                        && value.chars().all(|c| c.is_alphanumeric() || c == '_') =>
                {
                    format!("{}.{value}", object.to_source())
                }
                _ => format!("{}[{}]", object.to_source(), index.to_source()),
            },
            NodeKind::Binary { op, left, right } => {
                format!("({} {op} {})", left.to_source(), right.to_source())
            }
            NodeKind::Unary { op, operand } => format!("{op}{}", operand.to_source()),
            NodeKind::Ternary { condition, then_branch, else_branch } => {
                if condition == then_branch {
                    format!("({} ?: {})", condition.to_source(), else_branch.to_source())
                } else {
                    format!(
                        "({} ? {} : {})",
                        condition.to_source(),
                        then_branch.to_source(),
                        else_branch.to_source()
                    )
                }
            }
            NodeKind::Pipe { stages, operators } => {
                let mut out = stages.first().map(Node::to_source).unwrap_or_default();
                for (op, stage) in operators.iter().zip(stages.iter().skip(1)) {
                    out.push_str(&format!(" {op} {}", stage.to_source()));
                }
                format!("({out})")
            }
            NodeKind::LanguageCall { language, function_path, arguments } => {
                let args: Vec<_> = arguments.iter().map(Node::to_source).collect();
                format!("{language}.{function_path}({})", args.join(", "))
            }
            NodeKind::ObjectLiteral { entries } => {
                let parts: Vec<_> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.to_source()))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            NodeKind::ArrayLiteral { elements } => {
                let parts: Vec<_> = elements.iter().map(Node::to_source).collect();
                format!("[{}]", parts.join(", "))
            }
            NodeKind::VariableAssignment { target, op, value } => {
                format!("{} {op} {}", target.to_source(), value.to_source())
            }
            NodeKind::ExpressionAssignment { left, op, value } => {
                format!("{} {op} {}", left.to_source(), value.to_source())
            }
            NodeKind::VariableRead { target } => target.to_source(),
            NodeKind::CallStatement { call, background } => {
                if *background {
                    format!("{} &", call.to_source())
                } else {
                    call.to_source()
                }
            }
            NodeKind::Import { runtime, path } => format!("import {runtime} {path:?}"),
            NodeKind::Break => "break".to_string(),
            NodeKind::Continue => "continue".to_string(),
            NodeKind::Program { statements } => {
                let lines: Vec<_> = statements.iter().map(Node::to_source).collect();
                lines.join("\n")
            }
            _ => self.summary(),
        }
    }

    /// Compact single-line rendering used by tests and debug output.
    pub fn summary(&self) -> String {
        match &self.kind {
            NodeKind::Number { value } => format!("Number({value})"),
            NodeKind::String { value } => format!("String({value:?})"),
            NodeKind::Boolean { value } => format!("Boolean({value})"),
            NodeKind::Nil => "Nil".to_string(),
            NodeKind::Wildcard => "_".to_string(),
            NodeKind::Identifier { name } => format!("Id({name})"),
            NodeKind::QualifiedIdentifier { language, path, .. } => {
                format!("QualifiedId({language}, {})", path.join("."))
            }
            NodeKind::Index { object, index } => {
                format!("Index({}, {})", object.summary(), index.summary())
            }
            NodeKind::Binary { op, left, right } => {
                format!("Binary({op}, {}, {})", left.summary(), right.summary())
            }
            NodeKind::Unary { op, operand } => format!("Unary({op}, {})", operand.summary()),
            NodeKind::Ternary { condition, then_branch, else_branch } => format!(
                "Ternary({}, {}, {})",
                condition.summary(),
                then_branch.summary(),
                else_branch.summary()
            ),
            NodeKind::Pipe { stages, .. } => {
                let parts: Vec<_> = stages.iter().map(Node::summary).collect();
                format!("Pipe[{}]", parts.join(", "))
            }
            NodeKind::LanguageCall { language, function_path, arguments } => {
                let args: Vec<_> = arguments.iter().map(Node::summary).collect();
                format!("Call({language}, {function_path}, [{}])", args.join(", "))
            }
            NodeKind::ObjectLiteral { entries } => format!("Object({} entries)", entries.len()),
            NodeKind::ArrayLiteral { elements } => format!("Array({} elements)", elements.len()),
            NodeKind::Bitstring { segments } => format!("Bitstring({} segments)", segments.len()),
            NodeKind::VariableAssignment { target, op, value } => {
                format!("Assign({}, {op}, {})", target.summary(), value.summary())
            }
            NodeKind::ExpressionAssignment { left, op, value } => {
                format!("ExprAssign({}, {op}, {})", left.summary(), value.summary())
            }
            NodeKind::VariableRead { target } => format!("Read({})", target.summary()),
            NodeKind::CallStatement { call, background } => {
                if *background {
                    format!("CallStmt({} &)", call.summary())
                } else {
                    format!("CallStmt({})", call.summary())
                }
            }
            NodeKind::If { .. } => "If".to_string(),
            NodeKind::While { .. } => "While".to_string(),
            NodeKind::NumericFor { var, .. } => format!("NumericFor({var})"),
            NodeKind::CStyleFor { .. } => "CStyleFor".to_string(),
            NodeKind::ForIn { vars, .. } => format!("ForIn({})", vars.join(", ")),
            NodeKind::Match { subject, arms } => {
                format!("Match({}, {} arms)", subject.summary(), arms.len())
            }
            NodeKind::Break => "Break".to_string(),
            NodeKind::Continue => "Continue".to_string(),
            NodeKind::Import { runtime, path } => format!("Import({runtime}, {path:?})"),
            NodeKind::BitstringPatternAssignment { pattern, op, value } => format!(
                "BitstringPatternAssign({}, {op}, {})",
                pattern.summary(),
                value.summary()
            ),
            NodeKind::Program { statements } => format!("Program({} statements)", statements.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use num_bigint::BigInt;
    use poly_position::{Position, Span};

    fn span() -> Span {
        Span::point(Position::start_of_input())
    }

    #[test]
    fn number_discriminator() {
        let int = NumberValue::Int(BigInt::from(42));
        let float = NumberValue::Float(4.2);
        assert!(int.is_int());
        assert!(!float.is_int());
        assert_eq!(int.as_u64(), Some(42));
        assert_eq!(float.as_u64(), None);
    }

    #[test]
    fn pipe_stage_eligibility() {
        let id = Node::new(NodeKind::Identifier { name: "a".into() }, span());
        let num = Node::new(
            NodeKind::Number { value: NumberValue::Int(BigInt::from(1)) },
            span(),
        );
        let s = Node::new(NodeKind::String { value: "data".into() }, span());
        assert!(id.is_pipe_stage());
        assert!(s.is_pipe_stage());
        assert!(!num.is_pipe_stage());
    }

    #[test]
    fn size_expr_dynamic() {
        assert!(!SizeExpr::Literal(16).is_dynamic());
        assert!(SizeExpr::Variable("len".into()).is_dynamic());
    }

    #[test]
    fn summary_renders_nested_index() {
        let base = Node::new(
            NodeKind::QualifiedIdentifier {
                language: "python".into(),
                path: vec!["data".into(), "users".into()],
                qualified: true,
            },
            span(),
        );
        let idx = Node::new(
            NodeKind::Index {
                object: Box::new(base),
                index: Box::new(Node::new(
                    NodeKind::Number { value: NumberValue::Int(BigInt::from(0)) },
                    span(),
                )),
            },
            span(),
        );
        assert_eq!(idx.summary(), "Index(QualifiedId(python, data.users), Number(0))");
    }

    #[test]
    fn to_source_prints_the_syntactic_subset() {
        let node = Node::new(
            NodeKind::VariableAssignment {
                target: Box::new(Node::new(NodeKind::Identifier { name: "x".into() }, span())),
                op: "=".into(),
                value: Box::new(Node::new(
                    NodeKind::Binary {
                        op: "+".into(),
                        left: Box::new(Node::new(
                            NodeKind::Number { value: NumberValue::Int(BigInt::from(1)) },
                            span(),
                        )),
                        right: Box::new(Node::new(
                            NodeKind::Identifier { name: "y".into() },
                            span(),
                        )),
                    },
                    span(),
                )),
            },
            span(),
        );
        assert_eq!(node.to_source(), "x = (1 + y)");
    }

    #[test]
    fn to_source_prints_property_indexes_in_dot_form() {
        let base = Node::new(NodeKind::Identifier { name: "rows".into() }, span());
        let indexed = Node::new(
            NodeKind::Index {
                object: Box::new(base),
                index: Box::new(Node::new(
                    NodeKind::Number { value: NumberValue::Int(BigInt::from(0)) },
                    span(),
                )),
            },
            span(),
        );
        let prop = Node::new(
            NodeKind::Index {
                object: Box::new(indexed),
                index: Box::new(Node::new(NodeKind::String { value: "age".into() }, span())),
            },
            span(),
        );
        assert_eq!(prop.to_source(), "rows[0].age");
    }

    #[test]
    fn nodes_round_trip_through_serde() {
        let node = Node::new(
            NodeKind::Binary {
                op: "+".into(),
                left: Box::new(Node::new(
                    NodeKind::Number { value: NumberValue::Int(BigInt::from(1)) },
                    span(),
                )),
                right: Box::new(Node::new(
                    NodeKind::Identifier { name: "x".into() },
                    span(),
                )),
            },
            span(),
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}
