use assert_matches::assert_matches;

use dict_harvest::clean::Cleaner;
use dict_harvest::domain::{FetchResult, PartOfSpeech, Source};
use dict_harvest::error::FetchFailure;
use dict_harvest::providers::{cambridge, collins, dictionary_com, oxford};

const CAMBRIDGE_WICK: &str = include_str!("fixtures/cambridge_wick.html");
const DICTIONARY_COM_ALERT: &str = include_str!("fixtures/dictionary_com_alert.html");
const COLLINS_WICK: &str = include_str!("fixtures/collins_wick.html");
const OXFORD_LIGHT: &str = include_str!("fixtures/oxford_light.html");

#[test]
fn cambridge_all_definitions() {
    let defs = cambridge::extract_definitions(CAMBRIDGE_WICK, PartOfSpeech::All).unwrap();
    assert_eq!(
        defs,
        vec![
            "the piece of string in the middle of a candle",
            "a piece of material that carries liquid by capillary action",
            "to draw moisture away from something",
            "an entry with no part of speech",
        ]
    );
}

#[test]
fn cambridge_filters_by_exact_label() {
    let nouns = cambridge::extract_definitions(CAMBRIDGE_WICK, PartOfSpeech::Noun).unwrap();
    assert_eq!(nouns.len(), 2);
    let verbs = cambridge::extract_definitions(CAMBRIDGE_WICK, PartOfSpeech::Verb).unwrap();
    assert_eq!(verbs, vec!["to draw moisture away from something"]);
    let adjectives =
        cambridge::extract_definitions(CAMBRIDGE_WICK, PartOfSpeech::Adjective).unwrap();
    assert!(adjectives.is_empty());
}

#[test]
fn dictionary_com_drops_examples() {
    let defs =
        dictionary_com::extract_definitions(DICTIONARY_COM_ALERT, PartOfSpeech::All).unwrap();
    assert_eq!(
        defs,
        vec![
            "fully aware and attentive; wide-awake; keen:",
            "swift; agile; nimble.",
            "an attitude of vigilance.",
            "to prepare for action.",
        ]
    );
}

#[test]
fn dictionary_com_matches_label_by_substring() {
    let verbs =
        dictionary_com::extract_definitions(DICTIONARY_COM_ALERT, PartOfSpeech::Verb).unwrap();
    assert_eq!(verbs, vec!["to prepare for action."]);
    let adjectives =
        dictionary_com::extract_definitions(DICTIONARY_COM_ALERT, PartOfSpeech::Adjective)
            .unwrap();
    assert_eq!(adjectives.len(), 2);
}

#[test]
fn collins_reads_only_definitions_block() {
    let defs = collins::extract_definitions(COLLINS_WICK, PartOfSpeech::All).unwrap();
    assert_eq!(
        defs,
        vec![
            "The wick of a candle is the piece of string in it which burns when it is lit.",
            "to absorb or draw off liquid",
            "to annoy someone",
        ]
    );
}

#[test]
fn collins_skips_senses_without_label() {
    let nouns = collins::extract_definitions(COLLINS_WICK, PartOfSpeech::Noun).unwrap();
    assert_eq!(nouns.len(), 1);
    assert!(nouns[0].starts_with("The wick of a candle"));
    let verbs = collins::extract_definitions(COLLINS_WICK, PartOfSpeech::Verb).unwrap();
    assert_eq!(verbs, vec!["to absorb or draw off liquid"]);
}

#[test]
fn oxford_by_part_of_speech() {
    let all = oxford::extract_definitions(OXFORD_LIGHT, PartOfSpeech::All).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[1], "A source of illumination.");

    let verbs = oxford::extract_definitions(OXFORD_LIGHT, PartOfSpeech::Verb).unwrap();
    assert_eq!(verbs, vec!["Provide with light."]);
}

#[test]
fn oxford_block_without_label_is_structure_failure() {
    let html = r#"<section class="gramb"><span class="ind">glow</span></section>"#;
    let outcome = oxford::extract_definitions(html, PartOfSpeech::Noun);
    assert_matches!(outcome, Err(FetchFailure::Structure(_)));
    assert_eq!(
        oxford::extract_definitions(html, PartOfSpeech::All).unwrap(),
        vec!["glow"]
    );
}

#[test]
fn unrelated_page_yields_nothing() {
    let html = "<html><body><p>No exact matches found.</p></body></html>";
    for pos in [PartOfSpeech::All, PartOfSpeech::Noun] {
        assert!(cambridge::extract_definitions(html, pos).unwrap().is_empty());
        assert!(dictionary_com::extract_definitions(html, pos).unwrap().is_empty());
        assert!(collins::extract_definitions(html, pos).unwrap().is_empty());
        assert!(oxford::extract_definitions(html, pos).unwrap().is_empty());
    }
}

#[test]
fn raw_definition_wrapped_in_markup_stays_one_record() {
    let html = "<div class=\"def\">to burn\nslowly</div>";
    let defs = cambridge::extract_definitions(html, PartOfSpeech::All).unwrap();
    let result = FetchResult {
        source: Source::Cambridge,
        key: "wick".to_string(),
        fragments: Cleaner::passthrough().clean(&defs),
    };
    assert_eq!(result.fragments, vec!["to burn slowly"]);
    assert_eq!(result.to_line(), "Cam wick to burn slowly");
}
