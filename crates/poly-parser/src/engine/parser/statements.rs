impl Parser {
    /// Assignment handler: `x = …`, `lua.y = …`, `py.data.users[0].age = 26`,
    /// chained `a = b = 3`.
    ///
    /// Declines when the head is a bare language token (the guard's business)
    /// or when no assignment token follows the target, rolling the stream
    /// back so later candidates see the original position.
    fn handle_assignment(&mut self) -> ParseResult<Option<Node>> {
        let save = self.tokens.position();
        let head = self.tokens.current().clone();

        if head.kind == TokenKind::Language && self.tokens.peek(1).kind != TokenKind::Dot {
            return Ok(None);
        }

        self.tokens.consume();
        let mut target = if self.at(TokenKind::Dot) {
            self.parse_qualified_tail(&head)?
        } else {
            Node::new(NodeKind::Identifier { name: head.text.to_string() }, head.span)
        };

        if self.at(TokenKind::LeftBracket) {
            target = self.parse_index_chain(target)?;
        }

        if !self.tokens.current().kind.is_assign() {
            self.tokens.set_position(save);
            return Ok(None);
        }
        let op = self.tokens.consume();

        // `a = b = 3` nests the inner assignment as the value
        let value = if self.at(TokenKind::Identifier) && self.tokens.peek(1).kind.is_assign() {
            match self.handle_assignment()? {
                Some(inner) => inner,
                None => self.parse_expression()?,
            }
        } else {
            self.parse_expression()?
        };

        let span = Span::new(head.span.start, value.span.end);
        let node = if matches!(target.kind, NodeKind::Index { .. }) {
            Node::new(
                NodeKind::ExpressionAssignment {
                    left: Box::new(target),
                    op: op.text.to_string(),
                    value: Box::new(value),
                },
                span,
            )
        } else {
            Node::new(
                NodeKind::VariableAssignment {
                    target: Box::new(target),
                    op: op.text.to_string(),
                    value: Box::new(value),
                },
                span,
            )
        };
        Ok(Some(node))
    }

    /// Rejects misuse of a bare language keyword: assignment to it is a
    /// contextual error, and a lone keyword is not a qualified variable.
    /// Declines when a qualified path, call, or object argument follows.
    fn handle_reserved_keyword_guard(&mut self) -> ParseResult<Option<Node>> {
        let head = self.tokens.current().clone();
        match self.tokens.peek(1).kind {
            TokenKind::Assign | TokenKind::Walrus => {
                Err(validate::reserved_keyword_assignment(&head.text, head.span.start))
            }
            TokenKind::Dot | TokenKind::LeftParen | TokenKind::LeftBrace => Ok(None),
            _ => Err(validate::not_a_qualified_variable(&head.text, head.span.start)),
        }
    }

    /// `lua.fn(args)` in statement position, optionally backgrounded with a
    /// trailing `&`; also claims `py.data[0]` index reads. Declines on bare
    /// qualified reads so the fallback tier handles them.
    fn handle_language_call(&mut self) -> ParseResult<Option<Node>> {
        let save = self.tokens.position();
        let head = self.tokens.consume();
        if !self.at(TokenKind::Dot) {
            self.tokens.set_position(save);
            return Ok(None);
        }
        let qualified = self.parse_qualified_tail(&head)?;
        match self.tokens.current().kind {
            TokenKind::LeftParen => {
                let call = self.finish_language_call(qualified)?;
                let background = self.eat(TokenKind::Ampersand);
                let span = self.span_from(head.span.start);
                Ok(Some(Node::new(
                    NodeKind::CallStatement { call: Box::new(call), background },
                    span,
                )))
            }
            TokenKind::LeftBracket => {
                let chain = self.parse_index_chain(qualified)?;
                let span = chain.span;
                Ok(Some(Node::new(NodeKind::VariableRead { target: Box::new(chain) }, span)))
            }
            _ => {
                self.tokens.set_position(save);
                Ok(None)
            }
        }
    }

    /// Fallback: a bare `lua.name` read.
    fn handle_qualified_variable(&mut self) -> ParseResult<Option<Node>> {
        let save = self.tokens.position();
        let head = self.tokens.consume();
        if !self.at(TokenKind::Dot) {
            self.tokens.set_position(save);
            return Ok(None);
        }
        let qualified = self.parse_qualified_tail(&head)?;
        let span = qualified.span;
        Ok(Some(Node::new(NodeKind::VariableRead { target: Box::new(qualified) }, span)))
    }

    /// Fallback: a bare identifier read. Declines when a call-looking `(`
    /// follows, which is never valid Poly without a language prefix.
    fn handle_variable_read(&mut self) -> ParseResult<Option<Node>> {
        if self.tokens.peek(1).kind == TokenKind::LeftParen {
            return Ok(None);
        }
        let head = self.tokens.consume();
        Ok(Some(Node::new(
            NodeKind::VariableRead {
                target: Box::new(Node::new(
                    NodeKind::Identifier { name: head.text.to_string() },
                    head.span,
                )),
            },
            head.span,
        )))
    }

    /// `import <language> "<path>"`.
    fn handle_import(&mut self) -> ParseResult<Option<Node>> {
        let start = self.current_position();
        self.tokens.consume(); // consume 'import'
        let runtime_token =
            self.expect(TokenKind::Language, "expected language name after 'import'")?;
        let runtime = match self.languages.resolve(&runtime_token.text) {
            Some(name) => name.to_string(),
            None => {
                return Err(validate::unsupported_language(
                    &runtime_token.text,
                    runtime_token.span.start,
                ));
            }
        };
        let path_token =
            self.expect(TokenKind::String, "expected module path string in import")?;
        let path = poly_lexer::decode_string_literal(&path_token.text);
        Ok(Some(Node::new(NodeKind::Import { runtime, path }, self.span_from(start))))
    }

    /// Statement-level pipeline: `"data" | py.clean | lua.render()`.
    ///
    /// Only claims the statement when a pipe operator occurs at bracket depth
    /// zero before the statement ends, and no assignment token intervenes
    /// (an assignment owns any pipe on its right-hand side).
    fn handle_pipe(&mut self) -> ParseResult<Option<Node>> {
        if !self.pipe_chain_in_statement() {
            return Ok(None);
        }
        let expr = self.parse_expression()?;
        Ok(Some(expr))
    }

    fn pipe_chain_in_statement(&self) -> bool {
        let mut probe = self.tokens.clone();
        let mut depth = 0usize;
        loop {
            let kind = probe.current().kind;
            match kind {
                TokenKind::Eof => return false,
                TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::DoubleLess => depth += 1,
                TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::DoubleGreater => depth = depth.saturating_sub(1),
                TokenKind::Pipe | TokenKind::PipeForward if depth == 0 => return true,
                TokenKind::Assign | TokenKind::Walrus if depth == 0 => return false,
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => return false,
                _ => {}
            }
            probe.consume();
        }
    }

    /// Statement-level ternary: `flag ? lua.a() : lua.b()`.
    fn handle_ternary(&mut self) -> ParseResult<Option<Node>> {
        if !self.ternary_in_statement() {
            return Ok(None);
        }
        let expr = self.parse_expression()?;
        Ok(Some(expr))
    }

    fn ternary_in_statement(&self) -> bool {
        let mut probe = self.tokens.clone();
        let mut depth = 0usize;
        loop {
            let kind = probe.current().kind;
            match kind {
                TokenKind::Eof => return false,
                TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::DoubleLess => depth += 1,
                TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::DoubleGreater => depth = depth.saturating_sub(1),
                TokenKind::Question if depth == 0 => return true,
                TokenKind::Assign | TokenKind::Walrus if depth == 0 => return false,
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => return false,
                _ => {}
            }
            probe.consume();
        }
    }

    /// `a[0]` read in statement position. Assignment has already had its
    /// chance, so a chain here is a bare read.
    fn handle_index_expression(&mut self) -> ParseResult<Option<Node>> {
        if self.tokens.peek(1).kind != TokenKind::LeftBracket {
            return Ok(None);
        }
        let head = self.tokens.consume();
        let base = Node::new(NodeKind::Identifier { name: head.text.to_string() }, head.span);
        let chain = self.parse_index_chain(base)?;
        let span = chain.span;
        Ok(Some(Node::new(NodeKind::VariableRead { target: Box::new(chain) }, span)))
    }

    /// `( expression )` in statement position; the group itself is
    /// transparent, so the inner expression node is the statement.
    fn handle_parenthesized(&mut self) -> ParseResult<Option<Node>> {
        let expr = self.parse_expression()?;
        Ok(Some(expr))
    }

    /// Placeholder until tuple syntax is settled: honours its configured
    /// parameters, then declines so the parenthesized handler runs.
    fn handle_tuple(&mut self) -> ParseResult<Option<Node>> {
        let config = self.registry.config_for(TokenKind::LeftParen, HandlerKind::Tuple);
        let max_elements = config.and_then(|c| c.usize_param("maxElements")).unwrap_or(100);
        let allow_empty = config.and_then(|c| c.bool_param("allowEmpty")).unwrap_or(true);
        trace!(max_elements, allow_empty, "tuple handler declined");
        Ok(None)
    }
}
