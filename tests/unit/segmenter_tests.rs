/*!
 * Tests for markup segmentation and reinjection
 */

use std::collections::HashMap;

use proptest::prelude::*;

use compendia::segmenter::{ProtectedKind, Segment, Skeleton};

fn markup() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("<p>".to_string()),
            Just("</p>".to_string()),
            Just("<a href=\"x>y\">".to_string()),
            Just("<br/>".to_string()),
            Just("&nbsp;".to_string()),
            Just("&#x1F600;".to_string()),
            Just("<!-- note -->".to_string()),
            Just("[[/r 2d6]]".to_string()),
            "@(UUID|Compendium)\\[[A-Za-z.]{1,10}\\](\\{[A-Za-z ]{1,6}\\})?",
            "[a-zA-Z ,.!]{1,12}",
            "[<>&@\\[\\]{}]",
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

fn protected(skeleton: &Skeleton) -> Vec<String> {
    skeleton
        .segments()
        .iter()
        .filter(|segment| !segment.is_text())
        .map(|segment| segment.literal().to_string())
        .collect()
}

proptest! {
    /// Rendering the segments of any input gives the input back
    #[test]
    fn test_extract_withAnyString_shouldBeLossless(text in any::<String>()) {
        prop_assert_eq!(Skeleton::extract(&text).render(), text);
    }

    #[test]
    fn test_extract_withGeneratedMarkup_shouldBeLossless(text in markup()) {
        let skeleton = Skeleton::extract(&text);
        prop_assert_eq!(skeleton.render(), text.clone());
        prop_assert_eq!(skeleton.inject(&HashMap::new()), text);
    }

    /// Translating every text segment never disturbs a protected token
    #[test]
    fn test_inject_withLetterTranslations_shouldKeepProtectedTokens(
        text in markup(),
        words in prop::collection::vec("[a-z]{1,5}( [a-z]{1,5})?", 12),
    ) {
        let skeleton = Skeleton::extract(&text);
        let translations: HashMap<usize, String> = skeleton
            .text_segments()
            .map(|(index, _)| (index, words[index % words.len()].clone()))
            .collect();

        let translated = Skeleton::extract(&skeleton.inject(&translations));
        prop_assert_eq!(protected(&translated), protected(&skeleton));
    }

    /// Adjacent text never appears as two consecutive text segments
    #[test]
    fn test_extract_withGeneratedMarkup_shouldAlternateTextRuns(text in markup()) {
        let skeleton = Skeleton::extract(&text);
        for pair in skeleton.segments().windows(2) {
            prop_assert!(!(pair[0].is_text() && pair[1].is_text()));
        }
    }
}

#[test]
fn test_extract_withDescription_shouldExposeOnlyWords() {
    let skeleton = Skeleton::extract("<p>See @UUID[Compendium.rules.Size]{Size} for <em>details</em>.</p>");

    let view: Vec<String> = skeleton.translatable_view().into_iter().map(|s| s.text).collect();
    assert_eq!(view, vec!["See ", " for ", "details", "."]);
    assert_eq!(skeleton.links(), vec!["@UUID[Compendium.rules.Size]{Size}"]);
}

#[test]
fn test_extract_withNamedAndNumericEntities_shouldProtectThem() {
    let skeleton = Skeleton::extract("Fish &amp; chips &#8212; &#x2014;");
    assert_eq!(
        skeleton.protected_of(ProtectedKind::Entity),
        vec!["&amp;", "&#8212;", "&#x2014;"]
    );
}

#[test]
fn test_inject_withChineseTranslation_shouldReproduceMarkup() {
    let skeleton = Skeleton::extract("<p>See @UUID[X]{Rules}.</p>");
    let translations = HashMap::from([(0, "详见".to_string()), (1, "了解更多。".to_string())]);

    assert_eq!(skeleton.inject(&translations), "<p>详见@UUID[X]{Rules}了解更多。</p>");
}

#[test]
fn test_segments_withTagAttributes_shouldKeepTagWhole() {
    let skeleton = Skeleton::extract("<span class=\"a > b\" data-x='1'>Hit</span>");

    assert_eq!(skeleton.segments().len(), 3);
    assert!(matches!(
        &skeleton.segments()[0],
        Segment::Protected { kind: ProtectedKind::TagOpen, literal } if literal == "<span class=\"a > b\" data-x='1'>"
    ));
    assert_eq!(skeleton.plain_text(), "Hit");
}
