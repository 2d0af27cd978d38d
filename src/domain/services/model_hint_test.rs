use super::suggest;
use super::ModelTier;
use super::LONG_INPUT_CHARS;

#[test]
fn it_suggests_simple_for_short_question() {
    assert_eq!(suggest("What is the capital of France?", false), ModelTier::Simple);
}

#[test]
fn it_suggests_complex_for_coding_request() {
    assert_eq!(
        suggest(
            "Write a function that implements quicksort and explain the algorithm step by step",
            false
        ),
        ModelTier::Complex
    );
}

#[test]
fn it_suggests_complex_with_attachments() {
    assert_eq!(suggest("hi", true), ModelTier::Complex);
    assert_eq!(suggest("", true), ModelTier::Complex);
}

#[test]
fn it_suggests_complex_for_long_input() {
    let text = "x".repeat(LONG_INPUT_CHARS + 1);
    assert_eq!(suggest(&text, false), ModelTier::Complex);

    let text = "x".repeat(LONG_INPUT_CHARS);
    assert_eq!(suggest(&text, false), ModelTier::Simple);
}

#[test]
fn it_matches_keywords_case_insensitively() {
    assert_eq!(suggest("COMPARE these two", false), ModelTier::Complex);
}

#[test]
fn it_matches_whole_words_only() {
    assert_eq!(suggest("Can you decode this?", false), ModelTier::Simple);
    assert_eq!(suggest("That's reasonable, thanks", false), ModelTier::Simple);
    assert_eq!(suggest("A story about dysfunction", false), ModelTier::Simple);

    assert_eq!(suggest("Can you debug this?", false), ModelTier::Complex);
    assert_eq!(suggest("What is the trade-off here?", false), ModelTier::Complex);
    assert_eq!(suggest("the difference between them", false), ModelTier::Complex);
}

#[test]
fn it_matches_keywords_next_to_punctuation() {
    assert_eq!(suggest("(refactor) please", false), ModelTier::Complex);
    assert_eq!(suggest("Why? Explain.", false), ModelTier::Complex);
}
