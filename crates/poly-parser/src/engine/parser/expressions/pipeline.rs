/// Bare qualified identifiers become zero-argument language calls; numeric
/// literals are rejected; identifiers, strings, and calls pass through.
fn into_pipe_stage(node: Node) -> ParseResult<Node> {
    match node.kind {
        NodeKind::QualifiedIdentifier { language, path, .. } => Ok(Node::new(
            NodeKind::LanguageCall {
                language,
                function_path: path.join("."),
                arguments: Vec::new(),
            },
            node.span,
        )),
        NodeKind::Number { .. } => Err(ParseError::syntax(
            "numeric literals cannot be used as pipeline stages",
            node.span.start,
        )),
        NodeKind::Identifier { .. } | NodeKind::String { .. } | NodeKind::LanguageCall { .. } => {
            Ok(node)
        }
        _ => Err(ParseError::syntax("expected pipeline stage", node.span.start)),
    }
}

impl Parser {
    /// Whether a bare `|` should extend a pipeline rather than read as
    /// bitwise-or: both the left side and the upcoming token must be
    /// eligible stages.
    fn pipe_stage_follows(&self, left: &Node) -> bool {
        left.is_pipe_stage()
            && matches!(
                self.tokens.peek(1).kind,
                TokenKind::Identifier | TokenKind::Language | TokenKind::String
            )
    }

    /// Assemble a pipeline from `first` onward, consuming the whole chain in
    /// one pass so nested binary trees never need flattening after the fact.
    fn parse_pipe_tail(&mut self, first: Node) -> ParseResult<Node> {
        let start = first.span.start;
        let mut stages = vec![into_pipe_stage(first)?];
        let mut operators = Vec::new();

        loop {
            let kind = self.tokens.current().kind;
            let continues = match kind {
                TokenKind::PipeForward => true,
                TokenKind::Pipe => matches!(
                    self.tokens.peek(1).kind,
                    TokenKind::Identifier | TokenKind::Language | TokenKind::String
                ),
                _ => false,
            };
            if !continues {
                break;
            }
            let op_token = self.tokens.consume();
            operators.push(op_token.text.to_string());
            let stage = self.parse_pipe_stage()?;
            stages.push(stage);
        }

        let span = self.span_from(start);
        Ok(Node::new(NodeKind::Pipe { stages, operators }, span))
    }

    /// One pipeline stage: a language call (possibly arg-less), a qualified
    /// identifier (normalised to an arg-less call), an identifier, or a
    /// string input.
    fn parse_pipe_stage(&mut self) -> ParseResult<Node> {
        let token = self.tokens.current().clone();
        match token.kind {
            TokenKind::String => {
                self.tokens.consume();
                Ok(Node::new(
                    NodeKind::String {
                        value: poly_lexer::decode_string_literal(&token.text),
                    },
                    token.span,
                ))
            }
            TokenKind::Number => Err(ParseError::syntax(
                "numeric literals cannot be used as pipeline stages",
                token.span.start,
            )),
            TokenKind::Identifier => {
                if self.tokens.peek(1).kind == TokenKind::Dot {
                    let node = self.parse_qualified_operand()?;
                    into_pipe_stage(node)
                } else {
                    self.tokens.consume();
                    Ok(Node::new(
                        NodeKind::Identifier { name: token.text.to_string() },
                        token.span,
                    ))
                }
            }
            TokenKind::Language => {
                let node = self.parse_qualified_operand()?;
                into_pipe_stage(node)
            }
            TokenKind::Eof => Err(ParseError::eof(token.span.start)),
            _ => Err(ParseError::syntax("expected pipeline stage", token.span.start)),
        }
    }
}
