//! Prompt templates.
//!
//! Every builder is deterministic: the same topics always produce the same
//! prompt text.

use gaia_core::Topic;

const TOPICS_HEADER: &str = "TOPICS:";

const WRITER_PREAMBLE: &str = "You are an experienced Japanese product reviewer writing for an affiliate blog. \
Write natural, helpful Japanese aimed at readers comparing products before buying.";

const ARTICLE_GUIDE: &str = "Structure each article in Markdown:\n\
- an introduction explaining who the product is for\n\
- `## ` sections for features, merits and demerits, and a buying guide\n\
- a short conclusion\n\
You may use these shortcodes: [point]...[/point] for key points, [merit]...[/merit] and \
[demerit]...[/demerit] for pros and cons, [left]...[/left] and [right]...[/right] for a short \
dialogue between a curious reader (left) and the reviewer (right).";

/// One request asking for an article per topic, returned as a JSON array.
pub fn bulk_articles(topics: &[Topic]) -> String {
    let listing = topics
        .iter()
        .enumerate()
        .map(|(i, topic)| format!("{}. {}", i + 1, topic))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{preamble}\n\n\
Write {count} separate articles, one for each topic below.\n\n\
{header}\n{listing}\n\n\
{guide}\n\n\
Respond with ONLY a JSON array of {count} objects and nothing else. Each object must have the keys \
\"topic\" (the topic exactly as listed above), \"title\" (an attractive Japanese title) and \
\"content\" (the article body in Markdown, without the title heading).",
        preamble = WRITER_PREAMBLE,
        count = topics.len(),
        header = TOPICS_HEADER,
        listing = listing,
        guide = ARTICLE_GUIDE,
    )
}

/// Free-form review article about one topic, starting with a `# ` title.
pub fn single_article(topic: &Topic) -> String {
    format!(
        "{preamble}\n\nWrite one review article about: {topic}\n\n{guide}\n\n\
Start the answer with the article title as a `# ` heading.",
        preamble = WRITER_PREAMBLE,
        topic = topic,
        guide = ARTICLE_GUIDE,
    )
}

/// Free-form news-style summary about one topic, starting with a `# ` title.
pub fn news_summary(topic: &Topic) -> String {
    format!(
        "{preamble}\n\nWrite a concise news-style summary of the latest developments about: {topic}\n\n\
Use `## ` sections for background, what changed and what it means for buyers. \
Start the answer with the title as a `# ` heading.",
        preamble = WRITER_PREAMBLE,
        topic = topic,
    )
}

/// Asks for a plain list of new topic ideas, one per line.
pub fn topic_ideas(count: usize) -> String {
    format!(
        "List {count} specific consumer products or product categories that Japanese shoppers are \
searching for right now and that would make good review articles. \
Answer with one topic per line, no numbering, no explanations, no introduction."
    )
}

/// Recovers the topic list embedded by [`bulk_articles`].
pub fn topics_in_prompt(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .skip_while(|line| line.trim() != TOPICS_HEADER)
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(". ").map(|(_, topic)| topic.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Vec<Topic> {
        vec![Topic::new("Anker モバイルバッテリー"), Topic::new("電気ケトル")]
    }

    #[test]
    fn test_bulk_prompt_lists_every_topic() {
        let prompt = bulk_articles(&topics());
        assert!(prompt.contains("Write 2 separate articles"));
        assert!(prompt.contains("1. Anker モバイルバッテリー\n2. 電気ケトル"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_bulk_prompt_is_deterministic() {
        assert_eq!(bulk_articles(&topics()), bulk_articles(&topics()));
    }

    #[test]
    fn test_topics_round_trip_through_prompt() {
        let prompt = bulk_articles(&topics());
        assert_eq!(topics_in_prompt(&prompt), vec!["Anker モバイルバッテリー", "電気ケトル"]);
        assert!(topics_in_prompt("no topics here").is_empty());
    }

    #[test]
    fn test_single_prompts_mention_topic() {
        let topic = Topic::new("電気ケトル");
        assert!(single_article(&topic).contains("電気ケトル"));
        assert!(news_summary(&topic).contains("電気ケトル"));
        assert!(topic_ideas(20).starts_with("List 20"));
    }
}
