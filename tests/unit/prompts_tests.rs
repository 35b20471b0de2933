/*!
 * Tests for name prompt templates and reply cleaning
 */

use std::collections::BTreeMap;

use namekeep::prompts::{NamePromptTemplate, clean_proposal, render_name_glossary};

/// Test that the system prompt names both languages
#[test]
fn test_renderSystem_withLanguageNames_shouldMentionBoth() {
    let system = NamePromptTemplate::render_system("Chinese", "Vietnamese");

    assert!(system.contains("Chinese to Vietnamese"));
    assert!(system.contains("Sino-Vietnamese"));
    assert!(!system.contains("{target_language}"));
}

/// Test a custom template with only some of the variables
#[test]
fn test_customTemplate_render_shouldReplaceKnownVariables() {
    let template = NamePromptTemplate::new("Name for {term} in {target_language}?");
    assert_eq!(template.render("Chinese", "Vietnamese", "王媽"), "Name for 王媽 in Vietnamese?");
}

/// Test that an empty mapping renders no block at all
#[test]
fn test_renderNameGlossary_withEmptyMapping_shouldBeEmpty() {
    assert!(render_name_glossary(&BTreeMap::new(), "Chinese", "Vietnamese").is_empty());
}

/// Test the exact glossary block layout
#[test]
fn test_renderNameGlossary_withNames_shouldRenderOneLinePerName() {
    let mut mapping = BTreeMap::new();
    mapping.insert("王媽".to_string(), "Vương Ma".to_string());

    assert_eq!(
        render_name_glossary(&mapping, "Chinese", "Vietnamese"),
        "Character Name Glossary (Chinese → Vietnamese):\n- 王媽 → Vương Ma\n"
    );
}

/// Test cleaning of typical model replies
#[test]
fn test_cleanProposal_withNoisyReplies_shouldExtractName() {
    let cases = [
        ("Diệp Dương", "Diệp Dương"),
        ("  \"Diệp Dương\"  ", "Diệp Dương"),
        ("葉陽 → Diệp Dương", "Diệp Dương"),
        ("Vietnamese name: Vương Ma", "Vương Ma"),
        ("- Tô Uyển Dung.", "Tô Uyển Dung"),
        ("<think>\n葉 is Diệp, 陽 is Dương\n</think>\n\nDiệp Dương\nThis is the Sino-Vietnamese reading.", "Diệp Dương"),
        ("「Đào Hưng Vượng」", "Đào Hưng Vượng"),
    ];

    for (reply, expected) in cases {
        assert_eq!(clean_proposal(reply), expected, "reply: {:?}", reply);
    }
}

/// Test that a reply with nothing but reasoning cleans to an empty name
#[test]
fn test_cleanProposal_withOnlyThinking_shouldBeEmpty() {
    assert_eq!(clean_proposal("<think>no idea</think>\n  \n"), "");
}
