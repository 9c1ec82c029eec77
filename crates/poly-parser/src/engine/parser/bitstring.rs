/// Specifier names a bitstring segment may carry after `/`.
static BITSTRING_SPECIFIERS: phf::Set<&'static str> = phf::phf_set! {
    "integer", "float", "binary", "bitstring", "bytes", "bits",
    "utf8", "utf16", "utf32", "signed", "unsigned",
    "big", "little", "native", "unit",
};

/// Binding strength for the size evaluator's operator stack.
fn size_op_info(kind: TokenKind) -> (u8, bool) {
    match kind {
        TokenKind::Plus | TokenKind::Minus => (1, false),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (2, false),
        TokenKind::StarStar => (3, true),
        _ => (0, false),
    }
}

/// Pop one operator and fold the top two operands into a Binary node.
fn reduce_size_op(operands: &mut Vec<Node>, op: &Token) -> ParseResult<()> {
    let Some(right) = operands.pop() else {
        return Err(ParseError::syntax(
            "invalid size expression in bitstring segment",
            op.span.start,
        ));
    };
    let Some(left) = operands.pop() else {
        return Err(ParseError::syntax(
            "invalid size expression in bitstring segment",
            op.span.start,
        ));
    };
    let span = left.span.to(right.span);
    operands.push(Node::new(
        NodeKind::Binary {
            op: op.text.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ));
    Ok(())
}

impl Parser {
    /// `<<segment, …>>` in statement position.
    fn handle_bitstring(&mut self) -> ParseResult<Option<Node>> {
        let node = self.parse_bitstring()?;
        Ok(Some(node))
    }

    /// `<<pattern>> = value` destructuring. Claims the statement only when a
    /// cloned-cursor scan finds an assignment token right after the matching
    /// `>>`; otherwise the plain bitstring handler runs.
    fn handle_bitstring_pattern_assignment(&mut self) -> ParseResult<Option<Node>> {
        if !self.bitstring_assignment_ahead() {
            return Ok(None);
        }
        let start = self.current_position();
        let pattern = self.parse_bitstring()?;
        let op = if self.tokens.current().kind.is_assign() {
            self.tokens.consume()
        } else {
            return Err(ParseError::syntax(
                "expected '=' after bitstring pattern",
                self.current_position(),
            ));
        };
        let value = self.parse_expression()?;
        let span = self.span_from(start);
        Ok(Some(Node::new(
            NodeKind::BitstringPatternAssignment {
                pattern: Box::new(pattern),
                op: op.text.to_string(),
                value: Box::new(value),
            },
            span,
        )))
    }

    fn bitstring_assignment_ahead(&self) -> bool {
        let mut probe = self.tokens.clone();
        let mut depth = 0usize;
        loop {
            let kind = probe.current().kind;
            probe.consume();
            match kind {
                TokenKind::DoubleLess => depth += 1,
                TokenKind::DoubleGreater => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return probe.current().kind.is_assign();
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
        }
    }

    /// `<<value[:size][/spec-spec…], …>>`, newline-tolerant around the
    /// separators.
    pub(crate) fn parse_bitstring(&mut self) -> ParseResult<Node> {
        let start = self.current_position();
        self.expect(TokenKind::DoubleLess, "expected '<<' to open bitstring")?;
        self.skip_newlines();

        let mut segments = Vec::new();
        if !self.eat(TokenKind::DoubleGreater) {
            loop {
                segments.push(self.parse_bitstring_segment()?);
                self.skip_newlines();
                if self.eat(TokenKind::Comma) {
                    self.skip_newlines();
                    continue;
                }
                if self.eat(TokenKind::DoubleGreater) {
                    break;
                }
                if self.at(TokenKind::Eof) {
                    return Err(ParseError::syntax(
                        "unterminated bitstring",
                        self.current_position(),
                    ));
                }
                return Err(ParseError::syntax(
                    "expected ',' or '>>' in bitstring",
                    self.current_position(),
                ));
            }
        }

        Ok(Node::new(NodeKind::Bitstring { segments }, self.span_from(start)))
    }

    /// One segment: value, optional `:` size, optional `/` specifier list.
    ///
    /// A lone `:identifier` with no following `/` re-classifies as a type
    /// specifier (`data:binary` sizes nothing), and a size is dynamic exactly
    /// when it contains a variable, call, or operator.
    fn parse_bitstring_segment(&mut self) -> ParseResult<BitstringSegment> {
        let value = self.parse_binary_expr(None, 0, bitstring_value_operator)?;

        let mut size = None;
        let mut colon_present = false;
        let mut slash_present = false;
        let mut specifiers = Vec::new();

        if self.eat(TokenKind::Colon) {
            colon_present = true;
            size = Some(self.parse_segment_size()?);
        }
        if self.at(TokenKind::Slash) {
            slash_present = true;
            self.tokens.consume();
            loop {
                specifiers.push(self.parse_bitstring_specifier()?);
                if !self.eat(TokenKind::Minus) {
                    break;
                }
            }
        }

        if colon_present && !slash_present {
            if let Some(SizeExpr::Variable(name)) = &size {
                specifiers.push(name.clone());
                size = None;
            }
        }

        let size_is_dynamic = size.as_ref().is_some_and(SizeExpr::is_dynamic);
        Ok(BitstringSegment {
            value,
            size,
            size_is_dynamic,
            specifiers,
            colon_present,
            slash_present,
        })
    }

    /// The size after `:`: a literal, a variable, a qualified name, or a
    /// parenthesized expression evaluated by the shunting-yard below.
    fn parse_segment_size(&mut self) -> ParseResult<SizeExpr> {
        let token = self.tokens.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.tokens.consume();
                let value = literal::parse_number_token(&token.text, token.span.start)?;
                match value.as_u64() {
                    Some(bits) => Ok(SizeExpr::Literal(bits)),
                    None => Err(ParseError::syntax(
                        "bitstring segment size must be a non-negative integer",
                        token.span.start,
                    )),
                }
            }
            TokenKind::Identifier if self.tokens.peek(1).kind != TokenKind::Dot => {
                self.tokens.consume();
                Ok(SizeExpr::Variable(token.text.to_string()))
            }
            TokenKind::Identifier | TokenKind::Language => {
                let node = self.parse_qualified_operand()?;
                Ok(SizeExpr::Expr(Box::new(node)))
            }
            TokenKind::LeftParen => {
                self.tokens.consume();
                self.parse_size_expression()
            }
            TokenKind::Eof => Err(ParseError::eof(token.span.start)),
            _ => Err(ParseError::syntax(
                "expected size after ':' in bitstring segment",
                token.span.start,
            )),
        }
    }

    /// Shunting-yard evaluator for parenthesized dynamic sizes.
    ///
    /// Operands and operators reduce by precedence on two stacks, producing
    /// a Binary tree without recursing through the main expression engine.
    /// A result that is a single numeric literal collapses to a static size;
    /// any variable, call, or operator makes the size dynamic.
    fn parse_size_expression(&mut self) -> ParseResult<SizeExpr> {
        let mut operands: Vec<Node> = Vec::new();
        let mut operators: Vec<Token> = Vec::new();
        let mut open_parens = 0usize;
        let mut has_operator = false;
        let mut has_non_literal = false;
        let mut expect_operand = true;

        loop {
            let token = self.tokens.current().clone();
            match token.kind {
                TokenKind::Number if expect_operand => {
                    self.tokens.consume();
                    let value = literal::parse_number_token(&token.text, token.span.start)?;
                    operands.push(Node::new(NodeKind::Number { value }, token.span));
                    expect_operand = false;
                }
                TokenKind::Identifier | TokenKind::Language if expect_operand => {
                    let node = if self.tokens.peek(1).kind == TokenKind::Dot {
                        self.parse_qualified_operand()?
                    } else {
                        self.tokens.consume();
                        Node::new(NodeKind::Identifier { name: token.text.to_string() }, token.span)
                    };
                    has_non_literal = true;
                    operands.push(node);
                    expect_operand = false;
                }
                TokenKind::LeftParen if expect_operand => {
                    self.tokens.consume();
                    operators.push(token);
                    open_parens += 1;
                }
                TokenKind::RightParen => {
                    if open_parens == 0 {
                        // the closing paren of the size expression itself
                        self.tokens.consume();
                        break;
                    }
                    while let Some(top) = operators.last() {
                        if top.kind == TokenKind::LeftParen {
                            break;
                        }
                        let op = operators.pop().ok_or_else(|| {
                            ParseError::syntax(
                                "invalid size expression in bitstring segment",
                                token.span.start,
                            )
                        })?;
                        reduce_size_op(&mut operands, &op)?;
                    }
                    let _ = operators.pop(); // the '('
                    open_parens -= 1;
                    self.tokens.consume();
                    expect_operand = false;
                }
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::StarStar
                    if !expect_operand =>
                {
                    has_operator = true;
                    let (prec, right_assoc) = size_op_info(token.kind);
                    while let Some(top) = operators.last() {
                        if top.kind == TokenKind::LeftParen {
                            break;
                        }
                        let (top_prec, _) = size_op_info(top.kind);
                        if top_prec > prec || (top_prec == prec && !right_assoc) {
                            let op = operators.pop().ok_or_else(|| {
                                ParseError::syntax(
                                    "invalid size expression in bitstring segment",
                                    token.span.start,
                                )
                            })?;
                            reduce_size_op(&mut operands, &op)?;
                        } else {
                            break;
                        }
                    }
                    operators.push(token);
                    self.tokens.consume();
                    expect_operand = true;
                }
                TokenKind::Eof => return Err(ParseError::eof(token.span.start)),
                _ => {
                    return Err(ParseError::syntax(
                        "invalid size expression in bitstring segment",
                        token.span.start,
                    ));
                }
            }
        }

        while let Some(op) = operators.pop() {
            if op.kind == TokenKind::LeftParen {
                return Err(ParseError::syntax(
                    "unbalanced parentheses in size expression",
                    op.span.start,
                ));
            }
            reduce_size_op(&mut operands, &op)?;
        }
        let Some(node) = operands.pop() else {
            return Err(ParseError::syntax(
                "empty size expression in bitstring segment",
                self.current_position(),
            ));
        };
        if !operands.is_empty() {
            return Err(ParseError::syntax(
                "invalid size expression in bitstring segment",
                node.span.start,
            ));
        }

        if !has_operator && !has_non_literal {
            if let NodeKind::Number { value } = &node.kind {
                if let Some(bits) = value.as_u64() {
                    return Ok(SizeExpr::Literal(bits));
                }
            }
        }
        Ok(SizeExpr::Expr(Box::new(node)))
    }

    /// One specifier after `/` or `-`: a known name with an optional
    /// `:param`, canonicalised as `name` or `name:param`.
    fn parse_bitstring_specifier(&mut self) -> ParseResult<String> {
        let token = self.expect(
            TokenKind::Identifier,
            "expected specifier after '/' in bitstring segment",
        )?;
        let name = token.text.to_string();
        if !BITSTRING_SPECIFIERS.contains(name.as_str()) {
            return Err(ParseError::syntax(
                format!("unknown bitstring specifier '{name}'"),
                token.span.start,
            ));
        }
        if self.eat(TokenKind::Colon) {
            let param = self.expect(
                TokenKind::Number,
                "expected parameter after ':' in bitstring specifier",
            )?;
            let value = literal::parse_number_token(&param.text, param.span.start)?;
            if name == "unit" {
                let units = value.as_u64().unwrap_or(0);
                if units == 0 || units > 256 {
                    return Err(ParseError::syntax(
                        "unit specifier must be between 1 and 256",
                        param.span.start,
                    ));
                }
            }
            return Ok(format!("{name}:{value}"));
        }
        Ok(name)
    }
}
