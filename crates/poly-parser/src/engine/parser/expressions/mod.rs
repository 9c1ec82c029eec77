/// Pipeline operator precedence (loosest binding).
const PIPE_FORWARD_PREC: u8 = 0;
/// Ternary `?` precedence; right-associative, resolved by a dedicated
/// subroutine so `?` never appears as a binary operator node.
const TERNARY_PREC: u8 = 5;
/// Precedence of `|` when it acts as bitwise-or rather than a pipeline.
const BITWISE_OR_PREC: u8 = 4;

/// A binary operator's binding strength and associativity.
#[derive(Debug, Clone, Copy)]
struct BinOp {
    prec: u8,
    right_assoc: bool,
}

/// The operator table. Pipes and `?` are absent: both are handled by
/// dedicated sub-rules in the climbing loop. `|` appears here only in its
/// bitwise-or reading.
fn binary_op(kind: TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::OrOr => BinOp { prec: 1, right_assoc: false },
        TokenKind::AndAnd => BinOp { prec: 2, right_assoc: false },
        TokenKind::EqualEqual | TokenKind::NotEqual => BinOp { prec: 3, right_assoc: false },
        TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Pipe => BinOp { prec: 4, right_assoc: false },
        TokenKind::DoubleLess | TokenKind::DoubleGreater => BinOp { prec: 5, right_assoc: false },
        TokenKind::Ampersand => BinOp { prec: 6, right_assoc: false },
        TokenKind::Caret | TokenKind::Tilde => BinOp { prec: 7, right_assoc: false },
        TokenKind::Plus | TokenKind::Minus => BinOp { prec: 8, right_assoc: false },
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
            BinOp { prec: 9, right_assoc: false }
        }
        TokenKind::StarStar => BinOp { prec: 10, right_assoc: true },
        TokenKind::PlusPlus => BinOp { prec: 11, right_assoc: false },
        _ => return None,
    };
    Some(op)
}

/// Injection point for restricted sub-grammars: the climbing loop consults
/// the filter before treating a token as an operator.
type OperatorFilter = fn(TokenKind) -> bool;

/// The full expression grammar.
fn every_operator(_: TokenKind) -> bool {
    true
}

/// Bitstring segment values: `/` introduces specifiers, `>>` closes the
/// bitstring, and pipes/ternaries make no sense inside a segment.
fn bitstring_value_operator(kind: TokenKind) -> bool {
    !matches!(
        kind,
        TokenKind::Slash
            | TokenKind::Question
            | TokenKind::Pipe
            | TokenKind::PipeForward
            | TokenKind::DoubleLess
            | TokenKind::DoubleGreater
    )
}

impl Parser {
    /// Parse a full expression.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node> {
        self.trace_state(DispatchState::InExpression);
        self.parse_binary_expr(None, 0, every_operator)
    }
}
