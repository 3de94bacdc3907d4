//! Builds the system/user prompt pair for the LLM Extraction Client (§4.2, §6).

const MAX_CONTENT_CHARS: usize = 50_000;
const MAX_ITEMS: usize = 20;

pub fn system_prompt() -> String {
    format!(
        "You extract individual learning resources (papers, videos, blog posts, social media posts) \
         from raw web content. Respond with strict JSON matching this schema and nothing else: \
         {{ \"resources\": [ {{ \"title\": string, \"url\": string, \"description\": string|null, \
         \"kind\": \"paper\"|\"video\"|\"blog_post\"|\"social_media_post\"|null }} ] }}. \
         Rules:\n\
         1. Never invent a URL — every candidate's url must literally appear in the content.\n\
         2. Resolve relative URLs against the provided source URL or an explicit base declared in the content.\n\
         3. Do not emit the source URL itself or any feed/channel-level metadata — only individual items.\n\
         4. Emit at most {MAX_ITEMS} resources.\n\
         5. If you cannot determine a resource's kind, omit the \"kind\" field rather than guessing."
    )
}

pub fn user_prompt(source_url: &str, content: &str, source_category: &str) -> String {
    let truncated = ai_client::util::truncate_to_char_boundary(content, MAX_CONTENT_CHARS);
    format!(
        "source_url: {source_url}\n\
         default_kind_if_omitted: {source_category}\n\
         ---\n\
         content:\n{truncated}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_truncates_long_content() {
        let content = "x".repeat(100_000);
        let prompt = user_prompt("https://example.com", &content, "blog_post");
        assert!(prompt.len() < 100_000);
    }

    #[test]
    fn system_prompt_mentions_item_cap() {
        assert!(system_prompt().contains("20"));
    }
}
