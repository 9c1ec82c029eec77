impl Parser {
    /// After consuming the head of a qualified path, parse `.name(.name)*`
    /// and resolve the head through the alias registry. The head token must
    /// already be consumed and a `.` must be current.
    fn parse_qualified_tail(&mut self, head: &Token) -> ParseResult<Node> {
        let Some(language) = self.languages.resolve(&head.text) else {
            return Err(validate::unsupported_language(&head.text, head.span.start));
        };
        let mut path = Vec::new();
        while self.at(TokenKind::Dot) && self.tokens.peek(1).kind == TokenKind::Identifier {
            self.tokens.consume(); // consume '.'
            let segment = self.tokens.consume();
            path.push(segment.text.to_string());
        }
        if path.is_empty() {
            return Err(ParseError::syntax(
                format!("expected name after '{}.'", head.text),
                self.current_position(),
            ));
        }
        Ok(Node::new(
            NodeKind::QualifiedIdentifier {
                language: language.to_string(),
                path,
                qualified: true,
            },
            self.span_from(head.span.start),
        ))
    }

    /// Operand beginning with a language (or dotted identifier) head:
    /// a qualified identifier, or a language call when `(` follows.
    fn parse_qualified_operand(&mut self) -> ParseResult<Node> {
        let head = self.tokens.consume();
        if !self.at(TokenKind::Dot) {
            return Err(validate::not_a_qualified_variable(&head.text, head.span.start));
        }
        let qualified = self.parse_qualified_tail(&head)?;
        if self.at(TokenKind::LeftParen) {
            self.finish_language_call(qualified)
        } else {
            Ok(qualified)
        }
    }

    /// Turn a parsed qualified path plus an argument list into a language
    /// call node.
    fn finish_language_call(&mut self, qualified: Node) -> ParseResult<Node> {
        let start = qualified.span.start;
        let NodeKind::QualifiedIdentifier { language, path, .. } = qualified.kind else {
            return Err(ParseError::syntax(
                "expected qualified function path",
                qualified.span.start,
            ));
        };
        let arguments = self.parse_call_arguments()?;
        Ok(Node::new(
            NodeKind::LanguageCall { language, function_path: path.join("."), arguments },
            self.span_from(start),
        ))
    }

    /// `( arg, arg, … )`, newline-tolerant around separators. Arguments are
    /// full expressions, including nested calls and object/array literals.
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Node>> {
        self.expect(TokenKind::LeftParen, "expected '(' to open argument list")?;
        self.trace_state(DispatchState::InCallArglist);
        self.skip_newlines();
        let mut arguments = Vec::new();
        if self.eat(TokenKind::RightParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            self.skip_newlines();
            if self.eat(TokenKind::Comma) {
                self.skip_newlines();
                continue;
            }
            if self.eat(TokenKind::RightParen) {
                break;
            }
            if self.at(TokenKind::Eof) {
                return Err(ParseError::eof(self.current_position()));
            }
            return Err(ParseError::syntax(
                "expected ',' or ')' in argument list",
                self.current_position(),
            ));
        }
        Ok(arguments)
    }

    /// Consume `[expr]` chains and `.prop` suffixes after an index, building
    /// left-associative nesting: `a[i][j].k` becomes
    /// `Index(Index(Index(a, i), j), "k")`.
    fn parse_index_chain(&mut self, mut expr: Node) -> ParseResult<Node> {
        loop {
            if self.at(TokenKind::LeftBracket) {
                self.tokens.consume();
                let index = self.parse_expression()?;
                self.expect(TokenKind::RightBracket, "expected ']' after index expression")?;
                let span = self.span_from(expr.span.start);
                expr = Node::new(
                    NodeKind::Index { object: Box::new(expr), index: Box::new(index) },
                    span,
                );
            } else if self.at(TokenKind::Dot)
                && self.tokens.peek(1).kind == TokenKind::Identifier
                && matches!(expr.kind, NodeKind::Index { .. })
            {
                self.tokens.consume(); // consume '.'
                let prop = self.tokens.consume();
                let span = self.span_from(expr.span.start);
                let index =
                    Node::new(NodeKind::String { value: prop.text.to_string() }, prop.span);
                expr = Node::new(
                    NodeKind::Index { object: Box::new(expr), index: Box::new(index) },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }
}
