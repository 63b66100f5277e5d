//! Compiled expressions and the text-level helpers used when exporting.
//!
//! A [`CompiledExpression`] is tokenized and parsed once and can then be
//! evaluated any number of times, for different configurations and head
//! targets. [`preprocess`], [`split`] and [`find`] work on the raw text and
//! never evaluate anything.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, instrument};

use crate::{
    analyzer,
    ast::EvaluatorNode,
    engine::Engine,
    eval::{DagChecker, EvaluationContext, Evaluator},
    list::{expand_list, is_full_path, strip_empty_list_elements},
    tokenizer,
};

#[derive(Debug, Clone)]
pub struct CompiledExpression {
    input: String,
    nodes: Vec<EvaluatorNode>,
    needs_evaluation: bool,
}

impl CompiledExpression {
    #[instrument(level = "debug", skip(input), fields(len = input.len()))]
    pub fn parse(input: &str, max_depth: usize) -> Self {
        let tokens = tokenizer::tokenize(input);
        let needs_evaluation = tokens.saw_generator_expression();
        let nodes = analyzer::parse(tokens.as_slice(), max_depth);
        debug!("parsed {} top-level nodes", nodes.len());
        Self {
            input: input.to_string(),
            nodes,
            needs_evaluation,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn nodes(&self) -> &[EvaluatorNode] {
        &self.nodes
    }

    /// `false` when the input contains no `$<`; evaluation then returns the
    /// input unchanged.
    pub fn needs_evaluation(&self) -> bool {
        self.needs_evaluation
    }

    /// Evaluates the top-level nodes left to right. A failing node adds
    /// nothing and the walk goes on; check [`EvaluationContext::had_error`]
    /// afterwards.
    pub fn evaluate(
        &self,
        engine: &Engine<'_>,
        context: &mut EvaluationContext,
        dag: Option<&DagChecker<'_>>,
    ) -> String {
        if !self.needs_evaluation {
            return self.input.clone();
        }
        let evaluator = Evaluator::new(engine, &self.input, dag);
        let mut output = String::new();
        for node in &self.nodes {
            if let Ok(result) = evaluator.evaluate_node(node, context) {
                output.push_str(&result);
            }
        }
        output
    }
}

/// How [`preprocess`] treats generator expressions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PreprocessMode {
    /// Remove every generator expression.
    StripAllGeneratorExpressions,
    /// Keep `$<BUILD_INTERFACE:...>` content, drop `$<INSTALL_INTERFACE:...>`.
    BuildInterface,
    /// Keep `$<INSTALL_INTERFACE:...>` content, drop `$<BUILD_INTERFACE:...>`.
    InstallInterface,
}

/// Rewrites `input` for export. With `resolve_relative`, relative entries
/// kept from `$<INSTALL_INTERFACE:...>` are prefixed with
/// `${_IMPORT_PREFIX}/`. Empty list elements are dropped from the result.
pub fn preprocess(input: &str, mode: PreprocessMode, resolve_relative: bool) -> String {
    match mode {
        PreprocessMode::StripAllGeneratorExpressions => strip_all(input),
        PreprocessMode::BuildInterface | PreprocessMode::InstallInterface => {
            strip_export_interface(input, mode, resolve_relative)
        }
    }
}

/// Index of the `>` closing the expression whose content starts at
/// `start`, or `bytes.len()` when it is unterminated.
fn matching_close(bytes: &[u8], start: usize) -> usize {
    let mut nesting = 1;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'<') {
            nesting += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'>' {
            nesting -= 1;
            if nesting == 0 {
                return i;
            }
        }
        i += 1;
    }
    bytes.len()
}

fn strip_all(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = String::new();
    let mut last = 0;
    while let Some(found) = input.get(last..).and_then(|rest| rest.find("$<")) {
        let start = last + found;
        result.push_str(&input[last..start]);
        let body = start + 2;
        let close = matching_close(bytes, body);
        if close == bytes.len() {
            // unterminated, keep the rest verbatim
            result.push_str(&input[start..]);
            return strip_empty_list_elements(&result);
        }
        last = close + 1;
    }
    result.push_str(&input[last..]);
    strip_empty_list_elements(&result)
}

fn strip_export_interface(input: &str, mode: PreprocessMode, resolve_relative: bool) -> String {
    const BUILD: &str = "$<BUILD_INTERFACE:";
    const INSTALL: &str = "$<INSTALL_INTERFACE:";

    let bytes = input.as_bytes();
    let mut result = String::new();
    let mut last = 0;
    loop {
        let rest = &input[last..];
        let (found, install) = match (rest.find(BUILD), rest.find(INSTALL)) {
            (None, None) => break,
            (Some(b), None) => (b, false),
            (None, Some(i)) => (i, true),
            (Some(b), Some(i)) if b < i => (b, false),
            (_, Some(i)) => (i, true),
        };
        let start = last + found;
        result.push_str(&input[last..start]);
        let marker = if install { INSTALL } else { BUILD };
        let body = start + marker.len();
        let close = matching_close(bytes, body);
        if close == bytes.len() {
            result.push_str(&input[start..]);
            return strip_empty_list_elements(&result);
        }

        let content = &input[body..close];
        match (mode, install) {
            (PreprocessMode::BuildInterface, false) => result.push_str(content),
            (PreprocessMode::InstallInterface, true) if resolve_relative => {
                prefix_items(content, &mut result, "${_IMPORT_PREFIX}/")
            }
            (PreprocessMode::InstallInterface, true) => result.push_str(content),
            _ => {}
        }
        last = close + 1;
    }
    result.push_str(&input[last..]);
    strip_empty_list_elements(&result)
}

fn prefix_items(content: &str, result: &mut String, prefix: &str) {
    let mut separator = "";
    for item in expand_list(content) {
        result.push_str(separator);
        separator = ";";
        if !is_full_path(&item) && find(&item) != Some(0) {
            result.push_str(prefix);
        }
        result.push_str(&item);
    }
}

/// Splits a list like [`expand_list`], except that a generator expression
/// and the text around it up to the neighbouring `;` stay one element.
///
/// `a;x$<1:b;c>y;d` splits into `a`, `x$<1:b;c>y` and `d`.
pub fn split(input: &str) -> Vec<String> {
    let bytes = input.as_bytes();
    let mut output = Vec::new();
    let mut last = 0;

    while let Some(found) = input.get(last..).and_then(|rest| rest.find("$<")) {
        let start = last + found;
        let mut part = &input[last..start];
        let mut before = "";
        if !part.is_empty() {
            match input[..start].rfind(';') {
                None => {
                    before = part;
                    part = "";
                }
                Some(separator) if separator + 1 != start && separator >= last => {
                    part = &input[last..separator];
                    before = &input[separator + 1..start];
                }
                Some(_) => {}
            }
            output.extend(expand_list(part));
        }

        let body = start + 2;
        let mut end = matching_close(bytes, body);
        while end < bytes.len() && bytes[end] != b';' {
            end += 1;
        }
        output.push(format!("{}$<{}", before, &input[body..end]));
        last = end + 1;
    }

    if last < input.len() {
        output.extend(expand_list(&input[last..]));
    }
    output
}

/// Position of the first `$<` that has a `>` somewhere after it.
pub fn find(input: &str) -> Option<usize> {
    let open = input.find("$<")?;
    input[open..].contains('>').then_some(open)
}
