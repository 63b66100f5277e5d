mod common;

use genex::{
    engine::Engine,
    expression::{preprocess, split, PreprocessMode},
    list::{expand_list, strip_empty_list_elements},
    model::{InMemoryModel, ProjectSpec},
    tokenizer::tokenize,
};
use proptest::prelude::*;

fn empty_model() -> InMemoryModel {
    InMemoryModel::from_spec(ProjectSpec::new()).unwrap()
}

fn plain_text() -> impl Strategy<Value = String> {
    "[a-z0-9$;:,>/ ._-]{0,40}"
}

fn list_text() -> impl Strategy<Value = String> {
    "[a-z0-9;/._-]{0,40}"
}

proptest! {
    #[test]
    fn test_text_without_expressions_is_unchanged(input in plain_text()) {
        let model = empty_model();
        let engine = Engine::new(&model);
        let evaluation = engine.evaluate(&input, &common::request("Debug"));
        prop_assert_eq!(&evaluation.output, &input);
        prop_assert!(!evaluation.had_error());
    }

    #[test]
    fn test_tokens_cover_the_input(input in "[a-z$<>:,;]{0,40}") {
        let tokens = tokenize(&input);
        let joined: String = tokens.iter().map(|t| t.text).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn test_arbitrary_input_evaluates_without_panicking(input in "[A-Z01$<>:,;_]{0,40}") {
        let model = empty_model();
        let engine = Engine::new(&model);
        let first = engine.evaluate(&input, &common::request(""));
        let second = engine.evaluate(&input, &common::request(""));
        prop_assert_eq!(first.output, second.output);
        prop_assert_eq!(first.context.errors().count(), second.context.errors().count());
    }

    #[test]
    fn test_split_matches_plain_list_expansion(input in list_text()) {
        prop_assert_eq!(split(&input), expand_list(&input));
    }

    #[test]
    fn test_strip_all_on_plain_lists(input in list_text()) {
        prop_assert_eq!(
            preprocess(&input, PreprocessMode::StripAllGeneratorExpressions, false),
            strip_empty_list_elements(&input)
        );
    }

    #[test]
    fn test_true_condition_yields_content(content in list_text()) {
        let model = empty_model();
        let engine = Engine::new(&model);
        let evaluation = engine.evaluate(&format!("$<1:{}>", content), &common::request(""));
        prop_assert_eq!(evaluation.output, content);
    }

    #[test]
    fn test_build_interface_keeps_content(content in list_text()) {
        prop_assert_eq!(
            preprocess(
                &format!("$<BUILD_INTERFACE:{}>", content),
                PreprocessMode::BuildInterface,
                false
            ),
            strip_empty_list_elements(&content)
        );
    }
}
