use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content genre selected by the caller. Drives the script prompt and the music mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    HorrorStories,
    ChildrensCartoonComedy,
    Motivational,
    HistoricalFacts,
}

/// Coarse tag selecting the background music asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicMood {
    Suspenseful,
    Upbeat,
    Inspirational,
}

impl MusicMood {
    pub fn as_str(self) -> &'static str {
        match self {
            MusicMood::Suspenseful => "suspenseful",
            MusicMood::Upbeat => "upbeat",
            MusicMood::Inspirational => "inspirational",
        }
    }
}

impl fmt::Display for MusicMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::HorrorStories,
        Topic::ChildrensCartoonComedy,
        Topic::Motivational,
        Topic::HistoricalFacts,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Topic::HorrorStories => "horror stories",
            Topic::ChildrensCartoonComedy => "childrens cartoon comedy",
            Topic::Motivational => "motivational",
            Topic::HistoricalFacts => "historical facts",
        }
    }

    pub fn mood(self) -> MusicMood {
        match self {
            Topic::HorrorStories => MusicMood::Suspenseful,
            Topic::ChildrensCartoonComedy => MusicMood::Upbeat,
            Topic::Motivational | Topic::HistoricalFacts => MusicMood::Inspirational,
        }
    }

    fn prompt_segment(self) -> &'static str {
        match self {
            Topic::HorrorStories => {
                "Create a terrifying horror story that is exactly 300-400 words long (suitable for 1-2 minutes of narration). Use vivid, spine-chilling descriptions and build suspense throughout. The story must be engaging and suitable for a short video. Also, provide a list of 8 specific, visually descriptive keywords for searching stock videos (e.g., 'dark forest path', 'creaking door', 'shadowy figure', 'abandoned house', 'flickering candle', 'storm clouds', 'empty corridor', 'mysterious fog')."
            }
            Topic::ChildrensCartoonComedy => {
                "Write a funny, light-hearted comedy script for children that is exactly 300-400 words long (suitable for 1-2 minutes of narration). The story should feature talking animals and multiple silly situations with a clear beginning, middle, and end. Also, provide a list of 8 fun, simple keywords for searching animated or cartoon-style videos (e.g., 'happy squirrel', 'bouncing ball', 'silly dance', 'colorful playground', 'laughing children', 'cute animals', 'rainbow', 'birthday party')."
            }
            Topic::Motivational => {
                "Write a powerful and inspiring motivational speech that is exactly 300-400 words long (suitable for 1-2 minutes of narration). Focus on overcoming challenges, achieving goals, and personal growth. Use strong, encouraging language with specific examples. Also, provide a list of 8 symbolic keywords for searching stock videos (e.g., 'mountain sunrise', 'person crossing finish line', 'eagle soaring', 'ocean waves', 'city skyline', 'runner training', 'success celebration', 'teamwork')."
            }
            Topic::HistoricalFacts => {
                "Generate a 'Top 8 Interesting Facts' script about a randomly chosen famous person from history that is exactly 300-400 words long (suitable for 1-2 minutes of narration). Make the facts surprising, engaging, and historically accurate. Also, provide a list of 8 keywords related to the facts for searching stock videos (e.g., 'ancient manuscripts', 'historical artifacts', 'old paintings', 'castle architecture', 'vintage photographs', 'library books', 'museum exhibits', 'historical timeline')."
            }
        }
    }

    /// Full instruction sent to the script generator.
    pub fn prompt(self) -> String {
        format!(
            "{}\n\nIMPORTANT: The script must be between 300-400 words to ensure 1-2 minutes of narration time.\n\nReturn your response ONLY as a single, valid JSON object with three keys:\n1. \"title\": A short, catchy title for the video.\n2. \"script\": The full text of the story/script (300-400 words).\n3. \"visual_keywords\": A JSON list of exactly 8 strings, representing diverse search terms for video clips.\n",
            self.prompt_segment()
        )
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.label()).collect()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Topic {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Err(PipelineError::Input("A niche must be selected.".to_string()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                PipelineError::Input(format!(
                    "Unknown niche '{}'. Choose one of: {}.",
                    wanted,
                    Self::labels().join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("Horror Stories".parse::<Topic>().unwrap(), Topic::HorrorStories);
        assert_eq!(
            "  childrens cartoon comedy ".parse::<Topic>().unwrap(),
            Topic::ChildrensCartoonComedy
        );
        for topic in Topic::ALL {
            assert_eq!(topic.label().parse::<Topic>().unwrap(), topic);
        }
    }

    #[test]
    fn rejects_empty_and_unknown_topics() {
        let empty = "   ".parse::<Topic>().unwrap_err();
        assert_eq!(empty.kind(), "input_error");
        assert_eq!(empty.user_message(), "A niche must be selected.");

        let unknown = "cooking".parse::<Topic>().unwrap_err();
        assert!(unknown.user_message().contains("cooking"));
        assert!(unknown.user_message().contains("motivational"));
    }

    #[test]
    fn moods_follow_topic() {
        assert_eq!(Topic::HorrorStories.mood(), MusicMood::Suspenseful);
        assert_eq!(Topic::ChildrensCartoonComedy.mood(), MusicMood::Upbeat);
        assert_eq!(Topic::Motivational.mood(), MusicMood::Inspirational);
        assert_eq!(Topic::HistoricalFacts.mood(), MusicMood::Inspirational);
    }

    #[test]
    fn prompt_asks_for_json_package() {
        let prompt = Topic::Motivational.prompt();
        assert!(prompt.contains("motivational speech"));
        assert!(prompt.contains("\"visual_keywords\""));
    }
}
