//! The topic pool: a plain text file with one topic per line.
//!
//! Pool files are partly written by the backend itself (see
//! [`discover_topics`]), so lines are cleaned of list syntax and chatty
//! preambles before they become topics.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use gaia_core::{Error, Result, Topic};
use gaia_inference::{prompts, GenerationClient};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

pub const MAX_TOPIC_CHARS: usize = 100;

/// Openers that only count as a preamble when a word boundary follows, so
/// "Surefire flashlight" stays a topic while "Sure! Here you go" does not.
const PREAMBLE_WORDS: &[&str] = &["here are", "here is", "sure", "はい", "承知しました", "かしこまりました"];

/// Japanese sentence openers that never start a product name.
const PREAMBLE_PHRASES: &[&str] = &["以下は", "以下の"];

fn is_preamble(lowered: &str) -> bool {
    let word = PREAMBLE_WORDS.iter().any(|marker| {
        lowered
            .strip_prefix(marker)
            .is_some_and(|rest| rest.chars().next().map_or(true, |c| !c.is_alphanumeric()))
    });
    word || PREAMBLE_PHRASES.iter().any(|phrase| lowered.starts_with(phrase))
}

fn list_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^(?:[-*+]\s+|[•・●■#>]+\s*|\(\d{1,3}\)\s*|\d{1,3}[.):：]\s+|\d{1,3}、\s*)")
            .expect("list marker pattern is a valid regex")
    })
}

/// Cleans one candidate line. Returns `None` for lines that are not topics.
pub fn normalize_topic(line: &str) -> Option<String> {
    let mut text = line.trim();
    if text.is_empty() || text.starts_with("```") {
        return None;
    }

    loop {
        if text.len() > 4 && text.starts_with("**") && text.ends_with("**") {
            text = text[2..text.len() - 2].trim();
        } else if let Some(found) = list_marker().find(text) {
            text = text[found.end()..].trim();
        } else {
            break;
        }
    }

    if text.is_empty() || text.chars().count() > MAX_TOPIC_CHARS || is_preamble(&text.to_lowercase()) {
        return None;
    }
    Some(text.to_string())
}

/// Normalizes every line of `text`, dropping rejects and duplicates.
pub fn topics_from_text(text: &str) -> Vec<Topic> {
    let mut seen = HashSet::new();
    text.lines()
        .filter_map(normalize_topic)
        .filter(|topic| seen.insert(topic.clone()))
        .map(Topic::new)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TopicPool {
    topics: Vec<Topic>,
}

impl TopicPool {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::TopicPool(format!("Topic file not found: {}", path.display())));
        }
        let pool = Self::from_lines(&fs::read_to_string(path)?);
        if pool.is_empty() {
            return Err(Error::TopicPool(format!("Topic file {} has no usable topics", path.display())));
        }
        tracing::info!("📚 Loaded {} topics from {}", pool.len(), path.display());
        Ok(pool)
    }

    pub fn from_lines(text: &str) -> Self {
        Self {
            topics: topics_from_text(text),
        }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Topics in file order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Draws `count` distinct topics without replacement.
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<Topic>> {
        if count > self.topics.len() {
            return Err(Error::TopicPool(format!(
                "Cannot sample {} topics from a pool of {}",
                count,
                self.topics.len()
            )));
        }
        Ok(self.topics.choose_multiple(rng, count).cloned().collect())
    }

    /// Appends the topics not already present in the file at `path`, creating
    /// it when needed. Returns how many were added.
    pub fn append_new(path: impl AsRef<Path>, topics: &[Topic]) -> Result<usize> {
        let path = path.as_ref();
        let existing = if path.exists() { fs::read_to_string(path)? } else { String::new() };
        let known: HashSet<_> = topics_from_text(&existing).into_iter().collect();

        let mut added = HashSet::new();
        let fresh: Vec<&Topic> = topics
            .iter()
            .filter(|topic| !known.contains(*topic) && added.insert(topic.to_string()))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            writeln!(file)?;
        }
        for topic in &fresh {
            writeln!(file, "{}", topic)?;
        }
        Ok(fresh.len())
    }
}

/// Asks the backend for `count` new topic ideas.
pub async fn discover_topics(client: &GenerationClient, count: usize) -> Result<Vec<Topic>> {
    let reply = client
        .generate(&prompts::topic_ideas(count), false)
        .await
        .ok_or_else(|| Error::TopicPool("Backend returned no topic ideas".to_string()))?;
    let topics: Vec<Topic> = topics_from_text(&reply).into_iter().take(count).collect();
    tracing::info!("💡 Backend suggested {} topics", topics.len());
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaia_core::GenerationSettings;
    use gaia_inference::create_backend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_strips_list_syntax() {
        assert_eq!(normalize_topic("12. Widget").as_deref(), Some("Widget"));
        assert_eq!(normalize_topic("- Widget").as_deref(), Some("Widget"));
        assert_eq!(normalize_topic("3) Widget").as_deref(), Some("Widget"));
        assert_eq!(normalize_topic("(4) Widget").as_deref(), Some("Widget"));
        assert_eq!(normalize_topic("5、電気ケトル").as_deref(), Some("電気ケトル"));
        assert_eq!(normalize_topic("・ロボット掃除機").as_deref(), Some("ロボット掃除機"));
        assert_eq!(normalize_topic("1. **Anker 充電器**").as_deref(), Some("Anker 充電器"));
        assert_eq!(normalize_topic("  ## Widget  ").as_deref(), Some("Widget"));
    }

    #[test]
    fn test_normalize_keeps_numbers_that_are_part_of_the_topic() {
        assert_eq!(normalize_topic("3D プリンター").as_deref(), Some("3D プリンター"));
        assert_eq!(normalize_topic("1.5L 電気ケトル").as_deref(), Some("1.5L 電気ケトル"));
    }

    #[test]
    fn test_normalize_rejects_noise() {
        assert_eq!(normalize_topic(""), None);
        assert_eq!(normalize_topic("   "), None);
        assert_eq!(normalize_topic("```"), None);
        assert_eq!(normalize_topic("```text"), None);
        assert_eq!(normalize_topic("Here are 10 ideas:"), None);
        assert_eq!(normalize_topic("SURE! Here you go"), None);
        assert_eq!(normalize_topic("以下は人気の商品です"), None);
        assert_eq!(normalize_topic(&"x".repeat(MAX_TOPIC_CHARS + 1)), None);
        assert!(normalize_topic(&"x".repeat(MAX_TOPIC_CHARS)).is_some());
    }

    #[test]
    fn test_preamble_words_need_a_boundary() {
        assert_eq!(normalize_topic("Surefire flashlight").as_deref(), Some("Surefire flashlight"));
        assert_eq!(normalize_topic("Hereford beef").as_deref(), Some("Hereford beef"));
        assert_eq!(normalize_topic("はいからさん 着物").as_deref(), Some("はいからさん 着物"));
        assert_eq!(normalize_topic("Sure"), None);
        assert_eq!(normalize_topic("Sure, here you go:"), None);
        assert_eq!(normalize_topic("Here is the list"), None);
        assert_eq!(normalize_topic("はい、以下の通りです"), None);
        assert_eq!(normalize_topic("承知しました。"), None);
        assert_eq!(normalize_topic("以下の商品が人気です"), None);
    }

    #[test]
    fn test_pool_deduplicates_in_file_order() {
        let pool = TopicPool::from_lines("Here are some:\n1. Kettle\n2. Toaster\n- Kettle\n\nBlender\n");
        let names: Vec<_> = pool.topics().iter().map(Topic::as_str).collect();
        assert_eq!(names, vec!["Kettle", "Toaster", "Blender"]);
    }

    #[test]
    fn test_load_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let missing = TopicPool::load(dir.path().join("topics.txt"));
        assert!(matches!(missing, Err(Error::TopicPool(_))));

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "\n```\nHere are none\n").unwrap();
        assert!(matches!(TopicPool::load(&empty), Err(Error::TopicPool(_))));
    }

    #[test]
    fn test_sample_is_distinct_and_seeded() {
        let pool = TopicPool::from_lines(&(1..=10).map(|i| format!("topic {}", i)).collect::<Vec<_>>().join("\n"));
        let first = pool.sample(5, &mut StdRng::seed_from_u64(7)).unwrap();
        let again = pool.sample(5, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(first, again);
        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(pool.sample(10, &mut StdRng::seed_from_u64(1)).unwrap().len(), 10);
    }

    #[test]
    fn test_sample_more_than_pool_fails_fast() {
        let pool = TopicPool::from_lines("a\nb\nc");
        let err = pool.sample(4, &mut StdRng::seed_from_u64(0)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains('4') && message.contains('3'), "{}", message);
    }

    #[test]
    fn test_append_new_skips_known_topics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("topics.txt");
        let added = TopicPool::append_new(&path, &[Topic::new("Kettle"), Topic::new("Toaster")]).unwrap();
        assert_eq!(added, 2);

        fs::write(&path, "Kettle\nToaster").unwrap();
        let added = TopicPool::append_new(&path, &[Topic::new("Toaster"), Topic::new("Blender"), Topic::new("Blender")]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Kettle\nToaster\nBlender\n");
    }

    #[tokio::test]
    async fn test_discover_topics_filters_preamble() {
        let backend = create_backend("dummy", &GenerationSettings::default()).unwrap();
        let client = GenerationClient::new(backend, &GenerationSettings::default());
        let topics = discover_topics(&client, 2).await.unwrap();
        let names: Vec<_> = topics.iter().map(Topic::as_str).collect();
        assert_eq!(names, vec!["ワイヤレスイヤホン", "電気ケトル"]);
    }
}
