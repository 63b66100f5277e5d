use tracing::{debug, trace};

use super::core::ParseError;
use crate::{
    ast::{EvaluatorNode, ExpressionContent, MalformedContent, Span},
    tokenizer::{Token, TokenKind},
};

/// Recursive-descent parser over a token slice.
///
/// Parsing never fails as a whole: an expression that cannot be completed
/// becomes an [`EvaluatorNode::Malformed`] and the error surfaces when that
/// node is evaluated.
pub struct ExpressionParser<'t, 'src> {
    tokens: &'t [Token<'src>],
    position: usize,
    nesting_level: usize,
    max_depth: usize,
}

impl<'t, 'src> ExpressionParser<'t, 'src> {
    pub fn new(tokens: &'t [Token<'src>], max_depth: usize) -> Self {
        Self {
            tokens,
            position: 0,
            nesting_level: 0,
            max_depth,
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn parse(mut self) -> Vec<EvaluatorNode> {
        let mut result = Vec::new();
        while self.position < self.tokens.len() {
            self.parse_content(&mut result);
        }
        debug!("parsed {} top-level nodes", result.len());
        result
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.position).copied()
    }

    fn input_end(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(0)
    }

    /// Consumes one token at the current position: text, a nested
    /// expression, or (at top level only) a separator taken literally.
    fn parse_content(&mut self, result: &mut Vec<EvaluatorNode>) {
        let Some(token) = self.peek() else {
            return;
        };
        self.position += 1;
        match token.kind {
            TokenKind::BeginExpression => {
                let node = self.parse_expression(token);
                result.push(node);
            }
            TokenKind::Text
            | TokenKind::EndExpression
            | TokenKind::ColonSeparator
            | TokenKind::CommaSeparator => extend_text(result, token.span()),
        }
    }

    fn parse_expression(&mut self, begin: Token<'src>) -> EvaluatorNode {
        self.nesting_level += 1;
        let node = if self.nesting_level > self.max_depth {
            self.skip_expression(begin)
        } else {
            self.parse_expression_body(begin)
        };
        self.nesting_level -= 1;
        node
    }

    fn parse_expression_body(&mut self, begin: Token<'src>) -> EvaluatorNode {
        let mut identifier = Vec::new();
        loop {
            match self.peek() {
                None => return self.unterminated(begin),
                Some(token) if token.kind == TokenKind::EndExpression => {
                    self.position += 1;
                    return EvaluatorNode::Content(ExpressionContent {
                        identifier,
                        parameters: Vec::new(),
                        span: Span::new(begin.offset, token.end()),
                    });
                }
                Some(token) if token.kind == TokenKind::ColonSeparator => {
                    self.position += 1;
                    break;
                }
                Some(token) if token.kind == TokenKind::CommaSeparator => {
                    self.position += 1;
                    extend_text(&mut identifier, token.span());
                }
                Some(_) => self.parse_content(&mut identifier),
            }
        }

        let mut parameters = Vec::new();
        let mut current = Vec::new();
        loop {
            match self.peek() {
                None => return self.unterminated(begin),
                Some(token) => match token.kind {
                    TokenKind::EndExpression => {
                        self.position += 1;
                        parameters.push(current);
                        trace!("expression with {} parameters", parameters.len());
                        return EvaluatorNode::Content(ExpressionContent {
                            identifier,
                            parameters,
                            span: Span::new(begin.offset, token.end()),
                        });
                    }
                    TokenKind::CommaSeparator => {
                        self.position += 1;
                        parameters.push(std::mem::take(&mut current));
                    }
                    TokenKind::ColonSeparator => {
                        self.position += 1;
                        extend_text(&mut current, token.span());
                    }
                    TokenKind::Text | TokenKind::BeginExpression => {
                        self.parse_content(&mut current)
                    }
                },
            }
        }
    }

    fn unterminated(&mut self, begin: Token<'src>) -> EvaluatorNode {
        self.position = self.tokens.len();
        EvaluatorNode::Malformed(MalformedContent {
            span: Span::new(begin.offset, self.input_end()),
            error: ParseError::Unterminated {
                position: begin.offset,
            },
        })
    }

    /// Skips to the `>` matching `begin` without building nodes.
    fn skip_expression(&mut self, begin: Token<'src>) -> EvaluatorNode {
        let mut depth = 1usize;
        let mut end = self.input_end();
        while let Some(token) = self.peek() {
            self.position += 1;
            match token.kind {
                TokenKind::BeginExpression => depth += 1,
                TokenKind::EndExpression => {
                    depth -= 1;
                    if depth == 0 {
                        end = token.end();
                        break;
                    }
                }
                _ => {}
            }
        }
        debug!("expression at {} exceeds nesting limit", begin.offset);
        EvaluatorNode::Malformed(MalformedContent {
            span: Span::new(begin.offset, end),
            error: ParseError::NestingTooDeep {
                limit: self.max_depth,
                position: begin.offset,
            },
        })
    }
}

/// Appends literal text, merging it into a directly preceding text node.
fn extend_text(result: &mut Vec<EvaluatorNode>, span: Span) {
    if let Some(EvaluatorNode::Text(previous)) = result.last_mut() {
        if previous.end == span.start {
            previous.end = span.end;
            return;
        }
    }
    result.push(EvaluatorNode::Text(span));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Vec<EvaluatorNode> {
        let tokens = tokenize(input);
        ExpressionParser::new(tokens.as_slice(), 100).parse()
    }

    fn text(input: &str, node: &EvaluatorNode) -> String {
        node.span().slice(input).to_string()
    }

    fn content(node: &EvaluatorNode) -> &ExpressionContent {
        match node {
            EvaluatorNode::Content(content) => content,
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_single_node() {
        let nodes = parse("a>b:c,d");
        assert_eq!(nodes, vec![EvaluatorNode::Text(Span::new(0, 7))]);
    }

    #[test]
    fn test_expression_with_parameters() {
        let input = "x$<STREQUAL:a,b>y";
        let nodes = parse(input);
        assert_eq!(nodes.len(), 3);
        let expr = content(&nodes[1]);
        assert_eq!(text(input, &nodes[1]), "$<STREQUAL:a,b>");
        assert_eq!(text(input, &expr.identifier[0]), "STREQUAL");
        assert_eq!(expr.parameters.len(), 2);
        assert_eq!(text(input, &expr.parameters[1][0]), "b");
    }

    #[test]
    fn test_no_colon_means_no_parameters() {
        let nodes = parse("$<CONFIGURATION>");
        assert!(content(&nodes[0]).parameters.is_empty());
        let nodes = parse("$<CONFIG:>");
        assert_eq!(content(&nodes[0]).parameters, vec![Vec::new()]);
    }

    #[test]
    fn test_extra_colons_and_identifier_commas_are_text() {
        let input = "$<1:a:b>";
        let nodes = parse(input);
        let expr = content(&nodes[0]);
        assert_eq!(expr.parameters.len(), 1);
        assert_eq!(expr.parameters[0].len(), 1);
        assert_eq!(text(input, &expr.parameters[0][0]), "a:b");

        let input = "$<A,B:x>";
        let expr = content(&parse(input)[0]).clone();
        assert_eq!(expr.identifier.len(), 1);
        assert_eq!(text(input, &expr.identifier[0]), "A,B");
    }

    #[test]
    fn test_nested_identifier_and_parameter() {
        let input = "$<$<CONFIG:Debug>:-g$<1:x>>";
        let nodes = parse(input);
        assert_eq!(nodes.len(), 1);
        let expr = content(&nodes[0]);
        assert!(matches!(expr.identifier[0], EvaluatorNode::Content(_)));
        assert_eq!(expr.parameters[0].len(), 2);
        assert_eq!(text(input, &expr.parameters[0][1]), "$<1:x>");
    }

    #[test]
    fn test_unterminated_becomes_malformed() {
        let input = "pre$<1:abc";
        let nodes = parse(input);
        assert_eq!(nodes.len(), 2);
        match &nodes[1] {
            EvaluatorNode::Malformed(malformed) => {
                assert_eq!(malformed.span, Span::new(3, input.len()));
                assert_eq!(malformed.error, ParseError::Unterminated { position: 3 });
            }
            other => panic!("expected malformed node, got {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let input = "$<1:$<1:$<1:deep>>>tail";
        let tokens = tokenize(input);
        let nodes = ExpressionParser::new(tokens.as_slice(), 2).parse();
        assert_eq!(nodes.len(), 2);
        let outer = content(&nodes[0]);
        let inner = content(&outer.parameters[0][0]);
        match &inner.parameters[0][0] {
            EvaluatorNode::Malformed(malformed) => {
                assert_eq!(text(input, &inner.parameters[0][0]), "$<1:deep>");
                assert!(matches!(malformed.error, ParseError::NestingTooDeep { limit: 2, .. }));
            }
            other => panic!("expected malformed node, got {:?}", other),
        }
        assert_eq!(text(input, &nodes[1]), "tail");
    }
}
