use serde::{Deserialize, Serialize};

/// One sentence of the story, in original order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub index: usize,
    pub text: String,
}

/// Splits a story on sentence-terminating punctuation, keeps trimmed
/// fragments strictly longer than `min_chars`, and caps the result at
/// `max_scenes` fragments in original order.
pub fn split_story(story: &str, min_chars: usize, max_scenes: usize) -> Vec<Scene> {
    story
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > min_chars)
        .take(max_scenes)
        .enumerate()
        .map(|(index, fragment)| Scene {
            index,
            text: fragment.to_string(),
        })
        .collect()
}
