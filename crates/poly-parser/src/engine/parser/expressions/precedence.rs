impl Parser {
    /// The precedence-climbing core shared by every construct handler.
    ///
    /// Extends `left` (parsing an operand first when none is given) while the
    /// upcoming token is a binary operator of precedence at least `min_prec`.
    /// Left-associative operators recurse one level tighter for their right
    /// operand; right-associative operators recurse at their own level. `?`
    /// and the pipe operators divert into their sub-rules instead of
    /// producing Binary nodes.
    fn parse_binary_expr(
        &mut self,
        left: Option<Node>,
        min_prec: u8,
        allowed: OperatorFilter,
    ) -> ParseResult<Node> {
        let mut left = match left {
            Some(node) => node,
            None => self.parse_operand()?,
        };

        loop {
            let kind = self.tokens.current().kind;
            if !allowed(kind) {
                break;
            }
            match kind {
                TokenKind::Question if TERNARY_PREC >= min_prec => {
                    left = self.parse_ternary_tail(left, allowed)?;
                    continue;
                }
                TokenKind::PipeForward if PIPE_FORWARD_PREC >= min_prec => {
                    left = self.parse_pipe_tail(left)?;
                    continue;
                }
                TokenKind::Pipe
                    if BITWISE_OR_PREC >= min_prec && self.pipe_stage_follows(&left) =>
                {
                    left = self.parse_pipe_tail(left)?;
                    continue;
                }
                _ => {}
            }

            let Some(op) = binary_op(kind) else { break };
            if op.prec < min_prec {
                break;
            }
            let op_token = self.tokens.consume();
            let next_min = if op.right_assoc { op.prec } else { op.prec + 1 };
            let right = self.parse_binary_expr(None, next_min, allowed)?;
            let span = left.span.to(right.span);
            left = Node::new(
                NodeKind::Binary {
                    op: op_token.text.to_string(),
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// Ternary and Elvis, entered on `?`.
    ///
    /// `cond ?: fallback` stores the condition as its own then-branch.
    /// Plain ternary parses the then-branch at the loosest level (the `:`
    /// terminates it) and the else-branch at the ternary's own level for
    /// right associativity.
    fn parse_ternary_tail(
        &mut self,
        condition: Node,
        allowed: OperatorFilter,
    ) -> ParseResult<Node> {
        let start = condition.span.start;
        self.tokens.consume(); // consume '?'

        if self.eat(TokenKind::Colon) {
            let fallback = self.parse_binary_expr(None, TERNARY_PREC, allowed)?;
            let span = Span::new(start, fallback.span.end);
            let then_branch = condition.clone();
            return Ok(Node::new(
                NodeKind::Ternary {
                    condition: Box::new(condition),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(fallback),
                },
                span,
            ));
        }

        let then_branch = self.parse_binary_expr(None, 0, allowed)?;
        self.expect(TokenKind::Colon, "expected ':' in ternary expression")?;
        let else_branch = self.parse_binary_expr(None, TERNARY_PREC, allowed)?;
        let span = Span::new(start, else_branch.span.end);
        Ok(Node::new(
            NodeKind::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }
}
