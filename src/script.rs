//! Comic script prompting and parsing.
//!
//! The text model is asked for a plain-text script with one block per panel:
//!
//! ```text
//! Panel 1
//! Scene Description: ...
//! Dialogue: ...
//! Narration: ...
//! ```
//!
//! Models are loose with that format (markdown, bullets, quotes, missing
//! panels), so parsing is forgiving and always yields the requested number of
//! panels.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_SCENE_DESCRIPTION;

static PANEL_HEADER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?i)^[\s*#_]*panel\b"));

static SECTION_HEADER: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s*#_\-]*(scene description|scene|dialogue|narration/caption|narration|caption)[\s*_]*(?::[\s*_]*(.*))?$",
    )
});

static LIST_MARKER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[*\-•]+|\d+[.)])\s*"));

/// One panel of a parsed script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelScript {
    /// What the image should show.
    pub scene: String,
    /// Spoken lines, one speech bubble each.
    pub dialogue: Vec<String>,
    /// Caption text, may be empty.
    pub narration: String,
}

impl PanelScript {
    fn has_content(&self) -> bool {
        !self.scene.is_empty() || !self.dialogue.is_empty() || !self.narration.is_empty()
    }

    fn fallback() -> Self {
        Self {
            scene: FALLBACK_SCENE_DESCRIPTION.to_string(),
            ..Default::default()
        }
    }
}

/// A script as returned by the text model plus its panel breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicScript {
    /// The raw text, kept verbatim for storage.
    pub text: String,
    /// Exactly as many panels as were requested.
    pub panels: Vec<PanelScript>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    None,
    Scene,
    Dialogue,
    Narration,
}

impl Section {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "scene description" | "scene" => Section::Scene,
            "dialogue" => Section::Dialogue,
            _ => Section::Narration,
        }
    }
}

fn regex(lazy: &'static LazyLock<Result<Regex, regex::Error>>) -> Option<&'static Regex> {
    LazyLock::force(lazy).as_ref().ok()
}

/// Strips list markers, markdown emphasis and wrapping quotes.
fn clean_line(line: &str) -> String {
    let line = line.replace("**", "").replace("__", "");
    let line = match regex(&LIST_MARKER) {
        Some(re) => re.replace(&line, "").to_string(),
        None => line,
    };
    strip_wrapping_quotes(line.trim())
        .trim_matches('*')
        .trim()
        .to_string()
}

fn strip_wrapping_quotes(line: &str) -> &str {
    let is_quote = |c: char| matches!(c, '"' | '\'' | '“' | '”');
    let mut chars = line.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if is_quote(first) && is_quote(last) => {
            line[first.len_utf8()..line.len() - last.len_utf8()].trim()
        }
        _ => line,
    }
}

fn is_none_marker(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("n/a")
}

fn push_content(panel: &mut PanelScript, section: Section, raw: &str) {
    let text = clean_line(raw);
    if is_none_marker(&text) {
        return;
    }
    match section {
        Section::Scene => {
            if !panel.scene.is_empty() {
                panel.scene.push(' ');
            }
            panel.scene.push_str(&text);
        }
        Section::Dialogue => panel.dialogue.push(text),
        Section::Narration => {
            if !panel.narration.is_empty() {
                panel.narration.push(' ');
            }
            panel.narration.push_str(&text);
        }
        Section::None => {}
    }
}

impl ComicScript {
    /// Splits the script into exactly `panel_count` panels.
    pub fn parse(text: &str, panel_count: usize) -> Self {
        let mut panels = Vec::new();
        let mut current: Option<PanelScript> = None;
        let mut section = Section::None;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if regex(&PANEL_HEADER).is_some_and(|re| re.is_match(trimmed)) {
                if let Some(panel) = current.take()
                    && panel.has_content()
                {
                    panels.push(panel);
                }
                current = Some(PanelScript::default());
                section = Section::None;
                continue;
            }

            // Anything before the first panel header (title, objective) is preamble.
            let Some(panel) = current.as_mut() else {
                continue;
            };

            if let Some(caps) = regex(&SECTION_HEADER).and_then(|re| re.captures(trimmed)) {
                section = caps
                    .get(1)
                    .map(|label| Section::from_label(label.as_str()))
                    .unwrap_or(Section::None);
                if let Some(rest) = caps.get(2) {
                    push_content(panel, section, rest.as_str());
                }
                continue;
            }

            push_content(panel, section, trimmed);
        }
        if let Some(panel) = current
            && panel.has_content()
        {
            panels.push(panel);
        }

        for panel in panels.iter_mut() {
            if panel.scene.is_empty() {
                panel.scene = FALLBACK_SCENE_DESCRIPTION.to_string();
            }
        }
        panels.truncate(panel_count);
        panels.resize_with(panel_count, PanelScript::fallback);

        Self {
            text: text.to_string(),
            panels,
        }
    }
}

/// Builds the instruction sent to the text model.
pub fn build_script_prompt(
    objective: &str,
    topic: Option<&str>,
    cultural_elements: &[String],
    panel_count: usize,
) -> String {
    let mut prompt = format!(
        r#"You are an expert creator of educational comic strips for Ghanaian primary school students.
Your task is to generate a script for a {panel_count}-panel comic with the following EXACT format.

Learning Objective: {objective}
"#
    );
    if let Some(topic) = topic.map(str::trim).filter(|topic| !topic.is_empty()) {
        prompt.push_str(&format!("Story Topic: {topic}\n"));
    }
    if cultural_elements.is_empty() {
        prompt.push_str(
            "Include everyday Ghanaian cultural elements to give the story a natural feel.\n",
        );
    } else {
        prompt.push_str(&format!(
            "Mandatory Ghanaian cultural elements to include: {}\n",
            cultural_elements.join(", ")
        ));
    }

    for number in 1..=panel_count.min(2) {
        prompt.push_str(&format!(
            r#"
Panel {number}
Scene Description: [Visual elements, setting, simple relatable Ghanaian characters, their actions and expressions. Incorporate the cultural elements here.]
Dialogue: [One line per character. Simple, clear language for primary school students. Use Ghanaian names and phrases where relevant.]
Narration: [Text that explains the scene or reinforces the learning objective.]
"#
        ));
    }
    if panel_count > 2 {
        prompt.push_str(&format!("\n[Continue for all {panel_count} panels]\n"));
    }

    prompt.push_str(
        r#"
The story should be engaging, easy to understand for a primary school student, directly teach or illustrate the learning objective, and be culturally sensitive and relevant to Ghana. It should be grammatically correct.
Output the script as clear, well-structured plain text.
Make sure each panel has content for the dialogue and narration sections.
"#,
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"**Learning Objective:** Wash your hands

**Panel 1**
Scene Description: Ama stands at a Veronica bucket in the school yard.
She wears a kente-trimmed uniform.
Dialogue:
* Ama: "Kofi, come and wash your hands!"
* Kofi: "But they look clean."
Narration: Germs are too small to see.

## Panel 2
Scene Description: Kofi rubs soap between his fingers.
Dialogue: "Twenty seconds, like a song!"
Narration: None

Panel 3
Scene: The children eat kelewele together.
Dialogue: None
Caption: Clean hands keep everyone healthy.
"#;

    #[test]
    fn parses_sections_per_panel() {
        let script = ComicScript::parse(SCRIPT, 3);
        assert_eq!(script.panels.len(), 3);

        let first = &script.panels[0];
        assert_eq!(
            first.scene,
            "Ama stands at a Veronica bucket in the school yard. She wears a kente-trimmed uniform."
        );
        assert_eq!(
            first.dialogue,
            vec![
                "Ama: \"Kofi, come and wash your hands!\"".to_string(),
                "Kofi: \"But they look clean.\"".to_string()
            ]
        );
        assert_eq!(first.narration, "Germs are too small to see.");

        let second = &script.panels[1];
        assert_eq!(second.dialogue, vec!["Twenty seconds, like a song!".to_string()]);
        assert!(second.narration.is_empty());

        let third = &script.panels[2];
        assert_eq!(third.scene, "The children eat kelewele together.");
        assert!(third.dialogue.is_empty());
        assert_eq!(third.narration, "Clean hands keep everyone healthy.");
    }

    #[test]
    fn pads_missing_panels_with_fallback_scene() {
        let script = ComicScript::parse(SCRIPT, 4);
        assert_eq!(script.panels.len(), 4);
        assert_eq!(script.panels[3].scene, FALLBACK_SCENE_DESCRIPTION);
        assert!(script.panels[3].dialogue.is_empty());
    }

    #[test]
    fn truncates_extra_panels() {
        let script = ComicScript::parse(SCRIPT, 2);
        assert_eq!(script.panels.len(), 2);
        assert_eq!(script.text, SCRIPT);
    }

    #[test]
    fn unstructured_text_still_yields_panels() {
        let script = ComicScript::parse("Once upon a time there was a goat.", 4);
        assert_eq!(script.panels.len(), 4);
        assert!(
            script
                .panels
                .iter()
                .all(|panel| panel.scene == FALLBACK_SCENE_DESCRIPTION)
        );
    }

    #[test]
    fn numbered_dialogue_lines_lose_their_markers() {
        let script = ComicScript::parse(
            "Panel 1\nDialogue:\n1. Esi: Look!\n2) 3 mangoes fell.\n",
            1,
        );
        assert_eq!(
            script.panels[0].dialogue,
            vec!["Esi: Look!".to_string(), "3 mangoes fell.".to_string()]
        );
    }

    #[test]
    fn prompt_mentions_objective_and_elements() {
        let prompt = build_script_prompt(
            "Sharing food",
            Some("Lunch at school"),
            &["kelewele".to_string(), "Adinkra symbols".to_string()],
            4,
        );
        assert!(prompt.contains("4-panel comic"));
        assert!(prompt.contains("Learning Objective: Sharing food"));
        assert!(prompt.contains("Story Topic: Lunch at school"));
        assert!(prompt.contains("kelewele, Adinkra symbols"));
        assert!(prompt.contains("[Continue for all 4 panels]"));
    }
}
