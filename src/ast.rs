//! Evaluator tree produced by the parser.
//!
//! Nodes refer to the source string through byte [`Span`]s instead of
//! borrowing it, so a tree can be cached next to the string it was parsed
//! from (see [`crate::expression::CompiledExpression`]).

use std::fmt::Write;

use crate::analyzer::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The covered text, or `""` if the span does not fit `source`.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatorNode {
    /// Literal text.
    Text(Span),
    /// A complete `$<identifier:param,...>` expression.
    Content(ExpressionContent),
    /// An expression the parser could not complete. Reported when walked.
    Malformed(MalformedContent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionContent {
    pub identifier: Vec<EvaluatorNode>,
    /// One node sequence per comma-separated parameter. Empty when the
    /// expression has no `:`.
    pub parameters: Vec<Vec<EvaluatorNode>>,
    /// From `$<` through the closing `>`.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MalformedContent {
    pub span: Span,
    pub error: ParseError,
}

impl EvaluatorNode {
    pub fn span(&self) -> Span {
        match self {
            EvaluatorNode::Text(span) => *span,
            EvaluatorNode::Content(content) => content.span,
            EvaluatorNode::Malformed(malformed) => malformed.span,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, EvaluatorNode::Text(_))
    }

    /// Indented outline of the tree, used by `genex tree`.
    pub fn describe(nodes: &[EvaluatorNode], source: &str) -> String {
        let mut out = String::new();
        for node in nodes {
            node.describe_into(source, 0, &mut out);
        }
        out
    }

    fn describe_into(&self, source: &str, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self {
            EvaluatorNode::Text(span) => {
                let _ = writeln!(out, "{}Text {:?}", indent, span.slice(source));
            }
            EvaluatorNode::Content(content) => {
                let _ = writeln!(out, "{}Expression {}", indent, content.span);
                let _ = writeln!(out, "{}  identifier:", indent);
                for node in &content.identifier {
                    node.describe_into(source, depth + 2, out);
                }
                for (index, parameter) in content.parameters.iter().enumerate() {
                    let _ = writeln!(out, "{}  parameter {}:", indent, index);
                    for node in parameter {
                        node.describe_into(source, depth + 2, out);
                    }
                }
            }
            EvaluatorNode::Malformed(malformed) => {
                let _ = writeln!(
                    out,
                    "{}Malformed {} ({})",
                    indent, malformed.span, malformed.error
                );
            }
        }
    }
}
