use std::fmt;

use gaia_core::{GenerationBackend, GenerationRequest, Result};
use serde_json::json;

use crate::prompts;

/// Offline backend producing canned articles, for dry runs.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }

    fn article_body(topic: &str) -> String {
        format!(
            "{topic}を検討している方に向けて、特徴と選び方をまとめました。\n\n\
## 特徴\n\n[point]{topic}は毎日の使い勝手が大きく変わります。[/point]\n\n\
## メリットとデメリット\n\n[merit]手軽に導入できる[/merit]\n\n[demerit]モデルによって価格差が大きい[/demerit]\n\n\
[left]どれを選べばいいですか?[/left]\n\n[right]まずは用途をはっきりさせましょう。[/right]\n\n\
## まとめ\n\n用途に合った{topic}を選びましょう。"
        )
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GenerationBackend for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.structured {
            let records: Vec<_> = prompts::topics_in_prompt(&request.prompt)
                .into_iter()
                .map(|topic| {
                    json!({
                        "topic": topic,
                        "title": format!("{}のおすすめ徹底レビュー", topic),
                        "content": Self::article_body(&topic),
                    })
                })
                .collect();
            return Ok(format!("```json\n{}\n```", serde_json::to_string_pretty(&records)?));
        }

        if request.prompt.starts_with("List ") {
            return Ok("Here are some ideas:\n1. ワイヤレスイヤホン\n2. 電気ケトル\n3. ロボット掃除機".to_string());
        }

        let topic = request
            .prompt
            .lines()
            .find_map(|line| line.split_once("about: ").map(|(_, topic)| topic.trim()))
            .unwrap_or("おすすめ商品");
        Ok(format!("# {}のおすすめ徹底レビュー\n\n{}", topic, Self::article_body(topic)))
    }
}
