impl Parser {
    /// `if cond { … } else if cond { … } else { … }`; parentheses around the
    /// condition are optional.
    fn handle_if(&mut self) -> ParseResult<Option<Node>> {
        let start = self.current_position();
        self.tokens.consume(); // consume 'if'
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;

        let mut elif_branches = Vec::new();
        let mut else_block = None;
        loop {
            let save = self.tokens.position();
            self.skip_separators();
            if !self.at(TokenKind::Else) {
                self.tokens.set_position(save);
                break;
            }
            self.tokens.consume(); // consume 'else'
            if self.eat(TokenKind::If) {
                let cond = self.parse_expression()?;
                let block = self.parse_block()?;
                elif_branches.push((cond, block));
            } else {
                else_block = Some(self.parse_block()?);
                break;
            }
        }

        Ok(Some(Node::new(
            NodeKind::If {
                condition: Box::new(condition),
                then_block,
                elif_branches,
                else_block,
            },
            self.span_from(start),
        )))
    }

    /// `while cond { … }`.
    fn handle_while(&mut self) -> ParseResult<Option<Node>> {
        let start = self.current_position();
        self.tokens.consume(); // consume 'while'
        let condition = self.parse_expression()?;
        let body = self.with_loop_scope(Parser::parse_block)?;
        Ok(Some(Node::new(
            NodeKind::While { condition: Box::new(condition), body },
            self.span_from(start),
        )))
    }

    /// `for (init; cond; incr) { … }` with optional parentheses and any of
    /// the three header parts empty. Declines unless the header is
    /// parenthesized or a `;` occurs before the body opens.
    fn handle_c_style_for(&mut self) -> ParseResult<Option<Node>> {
        if !self.c_style_for_ahead() {
            return Ok(None);
        }
        let start = self.current_position();
        self.tokens.consume(); // consume 'for'
        let parened = self.eat(TokenKind::LeftParen);

        let init = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_for_header_clause()?))
        };
        self.expect(TokenKind::Semicolon, "expected ';' after for-loop initializer")?;

        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::Semicolon, "expected ';' after for-loop condition")?;

        let at_body = if parened {
            self.at(TokenKind::RightParen)
        } else {
            self.at(TokenKind::LeftBrace)
        };
        let increment = if at_body {
            None
        } else {
            Some(Box::new(self.parse_for_header_clause()?))
        };
        if parened {
            self.expect(TokenKind::RightParen, "expected ')' after for-loop header")?;
        }

        let body = self.with_loop_scope(Parser::parse_block)?;
        Ok(Some(Node::new(
            NodeKind::CStyleFor { init, condition, increment, body },
            self.span_from(start),
        )))
    }

    fn c_style_for_ahead(&self) -> bool {
        if self.tokens.peek(1).kind == TokenKind::LeftParen {
            return true;
        }
        let mut probe = self.tokens.clone();
        probe.consume(); // step over 'for'
        let mut depth = 0usize;
        loop {
            let kind = probe.current().kind;
            match kind {
                TokenKind::Eof => return false,
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::DoubleLess => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::DoubleGreater => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Semicolon if depth == 0 => return true,
                TokenKind::LeftBrace | TokenKind::Do | TokenKind::Newline if depth == 0 => {
                    return false;
                }
                _ => {}
            }
            probe.consume();
        }
    }

    /// A for-header init/increment clause: an assignment when one is
    /// present, otherwise a bare expression.
    fn parse_for_header_clause(&mut self) -> ParseResult<Node> {
        if matches!(
            self.tokens.current().kind,
            TokenKind::Identifier | TokenKind::Language
        ) {
            if let Some(node) = self.handle_assignment()? {
                return Ok(node);
            }
        }
        self.parse_expression()
    }

    /// `for i = start, end[, step] do … end`.
    fn handle_numeric_for(&mut self) -> ParseResult<Option<Node>> {
        if self.tokens.peek(1).kind != TokenKind::Identifier
            || self.tokens.peek(2).kind != TokenKind::Assign
        {
            return Ok(None);
        }
        let start = self.current_position();
        self.tokens.consume(); // consume 'for'
        let var = self.tokens.consume();
        self.tokens.consume(); // consume '='
        let from = self.parse_expression()?;
        self.expect(TokenKind::Comma, "expected ',' after numeric for start value")?;
        let to = self.parse_expression()?;
        let step = if self.eat(TokenKind::Comma) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(TokenKind::Do, "expected 'do' in numeric for loop")?;
        let body = self.with_loop_scope(Parser::parse_keyword_block)?;
        Ok(Some(Node::new(
            NodeKind::NumericFor {
                var: var.text.to_string(),
                start: Box::new(from),
                end: Box::new(to),
                step,
                body,
            },
            self.span_from(start),
        )))
    }

    /// `for k, v in expr { … }`.
    fn handle_for_in(&mut self) -> ParseResult<Option<Node>> {
        if self.tokens.peek(1).kind != TokenKind::Identifier
            || !matches!(self.tokens.peek(2).kind, TokenKind::In | TokenKind::Comma)
        {
            return Ok(None);
        }
        let start = self.current_position();
        self.tokens.consume(); // consume 'for'
        let mut vars = vec![self.tokens.consume().text.to_string()];
        while self.eat(TokenKind::Comma) {
            let var = self.expect(TokenKind::Identifier, "expected variable name in for-in loop")?;
            vars.push(var.text.to_string());
        }
        self.expect(TokenKind::In, "expected 'in' in for-in loop")?;
        let iterable = self.parse_expression()?;
        let body = self.with_loop_scope(Parser::parse_block)?;
        Ok(Some(Node::new(
            NodeKind::ForIn { vars, iterable: Box::new(iterable), body },
            self.span_from(start),
        )))
    }

    /// `match subject { pattern -> body … }`. Arm bodies are a braced block
    /// or a single statement; `_` is the catch-all pattern.
    fn handle_match(&mut self) -> ParseResult<Option<Node>> {
        let start = self.current_position();
        self.tokens.consume(); // consume 'match'
        let subject = self.parse_expression()?;
        self.expect(TokenKind::LeftBrace, "expected '{' after match subject")?;

        let mut arms = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(TokenKind::RightBrace) {
                break;
            }
            if self.at(TokenKind::Eof) {
                return Err(ParseError::eof(self.current_position()));
            }
            let pattern = if self.at(TokenKind::Wildcard) {
                let token = self.tokens.consume();
                Node::new(NodeKind::Wildcard, token.span)
            } else {
                self.parse_expression()?
            };
            self.expect(TokenKind::Arrow, "expected '->' after match pattern")?;
            let body = if self.at(TokenKind::LeftBrace) {
                self.parse_block()?
            } else {
                vec![self.parse_statement()?]
            };
            arms.push(MatchArm { pattern, body });
        }

        if arms.is_empty() {
            return Err(ParseError::syntax(
                "match statement requires at least one arm",
                start,
            ));
        }
        Ok(Some(Node::new(
            NodeKind::Match { subject: Box::new(subject), arms },
            self.span_from(start),
        )))
    }

    /// `break`, valid only inside a loop body.
    fn handle_break(&mut self) -> ParseResult<Option<Node>> {
        let token = self.tokens.current().clone();
        validate::ensure_loop_context(&self.ctx, "break", token.span.start)?;
        self.tokens.consume();
        Ok(Some(Node::new(NodeKind::Break, token.span)))
    }

    /// `continue`, valid only inside a loop body.
    fn handle_continue(&mut self) -> ParseResult<Option<Node>> {
        let token = self.tokens.current().clone();
        validate::ensure_loop_context(&self.ctx, "continue", token.span.start)?;
        self.tokens.consume();
        Ok(Some(Node::new(NodeKind::Continue, token.span)))
    }

    /// `{ … }` body: statements separated by newlines/semicolons, re-entering
    /// the statement dispatcher for each.
    fn parse_block(&mut self) -> ParseResult<Vec<Node>> {
        self.expect(TokenKind::LeftBrace, "expected '{' to open block")?;
        self.trace_state(DispatchState::InBlock);
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(TokenKind::RightBrace) {
                break;
            }
            if self.at(TokenKind::Eof) {
                return Err(ParseError::eof(self.current_position()));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// `do`-style body: statements until the matching `end` keyword.
    fn parse_keyword_block(&mut self) -> ParseResult<Vec<Node>> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(TokenKind::End) {
                break;
            }
            if self.at(TokenKind::Eof) {
                return Err(ParseError::eof(self.current_position()));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }
}
