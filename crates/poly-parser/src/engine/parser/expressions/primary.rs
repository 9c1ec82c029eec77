impl Parser {
    /// Parse a primary operand with its unary prefixes, then consume any
    /// trailing index chain (index binds tighter than every operator).
    fn parse_operand(&mut self) -> ParseResult<Node> {
        self.with_recursion_guard(Parser::parse_operand_inner)
    }

    fn parse_operand_inner(&mut self) -> ParseResult<Node> {
        let token = self.tokens.current().clone();
        let node = match token.kind {
            TokenKind::Number => {
                self.tokens.consume();
                let value = literal::parse_number_token(&token.text, token.span.start)?;
                Node::new(NodeKind::Number { value }, token.span)
            }
            TokenKind::String => {
                self.tokens.consume();
                Node::new(
                    NodeKind::String {
                        value: poly_lexer::decode_string_literal(&token.text),
                    },
                    token.span,
                )
            }
            TokenKind::True | TokenKind::False => {
                self.tokens.consume();
                Node::new(
                    NodeKind::Boolean { value: token.kind == TokenKind::True },
                    token.span,
                )
            }
            TokenKind::Nil => {
                self.tokens.consume();
                Node::new(NodeKind::Nil, token.span)
            }
            TokenKind::Wildcard => {
                self.tokens.consume();
                Node::new(NodeKind::Wildcard, token.span)
            }
            TokenKind::Identifier => {
                if self.tokens.peek(1).kind == TokenKind::Dot {
                    // dotted paths always resolve their head as a language
                    self.parse_qualified_operand()?
                } else {
                    self.tokens.consume();
                    Node::new(NodeKind::Identifier { name: token.text.to_string() }, token.span)
                }
            }
            TokenKind::Language => self.parse_qualified_operand()?,
            TokenKind::LeftParen => {
                self.tokens.consume();
                self.skip_newlines();
                let inner = self.parse_expression()?;
                self.skip_newlines();
                self.expect(TokenKind::RightParen, "expected ')' after expression")?;
                // the group is transparent; no wrapper node survives
                inner
            }
            TokenKind::DoubleLess => self.parse_bitstring()?,
            TokenKind::LeftBrace => self.parse_object_literal()?,
            TokenKind::LeftBracket => self.parse_array_literal()?,
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde => {
                self.tokens.consume();
                let operand = self.parse_operand()?;
                let span = Span::new(token.span.start, operand.span.end);
                Node::new(
                    NodeKind::Unary { op: token.text.to_string(), operand: Box::new(operand) },
                    span,
                )
            }
            TokenKind::Eof => return Err(ParseError::eof(token.span.start)),
            _ => {
                return Err(ParseError::syntax(
                    format!("unexpected token '{}'", token.text),
                    token.span.start,
                ));
            }
        };
        self.parse_index_chain(node)
    }

    /// `{ key: value, … }` object literal; keys are identifiers or strings.
    fn parse_object_literal(&mut self) -> ParseResult<Node> {
        let start = self.current_position();
        self.tokens.consume(); // consume '{'
        self.skip_newlines();
        let mut entries = Vec::new();
        if !self.eat(TokenKind::RightBrace) {
            loop {
                let key_token = self.tokens.current().clone();
                let key = match key_token.kind {
                    TokenKind::Identifier => {
                        self.tokens.consume();
                        key_token.text.to_string()
                    }
                    TokenKind::String => {
                        self.tokens.consume();
                        poly_lexer::decode_string_literal(&key_token.text)
                    }
                    TokenKind::Eof => return Err(ParseError::eof(key_token.span.start)),
                    _ => {
                        return Err(ParseError::syntax(
                            "expected key in object literal",
                            key_token.span.start,
                        ));
                    }
                };
                self.expect(TokenKind::Colon, "expected ':' after object key")?;
                self.skip_newlines();
                let value = self.parse_expression()?;
                entries.push((key, value));
                self.skip_newlines();
                if self.eat(TokenKind::Comma) {
                    self.skip_newlines();
                    if self.eat(TokenKind::RightBrace) {
                        break;
                    }
                    continue;
                }
                if self.eat(TokenKind::RightBrace) {
                    break;
                }
                if self.at(TokenKind::Eof) {
                    return Err(ParseError::eof(self.current_position()));
                }
                return Err(ParseError::syntax(
                    "expected ',' or '}' in object literal",
                    self.current_position(),
                ));
            }
        }
        Ok(Node::new(NodeKind::ObjectLiteral { entries }, self.span_from(start)))
    }

    /// `[ value, … ]` array literal.
    fn parse_array_literal(&mut self) -> ParseResult<Node> {
        let start = self.current_position();
        self.tokens.consume(); // consume '['
        self.skip_newlines();
        let mut elements = Vec::new();
        if !self.eat(TokenKind::RightBracket) {
            loop {
                elements.push(self.parse_expression()?);
                self.skip_newlines();
                if self.eat(TokenKind::Comma) {
                    self.skip_newlines();
                    if self.eat(TokenKind::RightBracket) {
                        break;
                    }
                    continue;
                }
                if self.eat(TokenKind::RightBracket) {
                    break;
                }
                if self.at(TokenKind::Eof) {
                    return Err(ParseError::eof(self.current_position()));
                }
                return Err(ParseError::syntax(
                    "expected ',' or ']' in array literal",
                    self.current_position(),
                ));
            }
        }
        Ok(Node::new(NodeKind::ArrayLiteral { elements }, self.span_from(start)))
    }
}
