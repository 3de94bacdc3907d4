//! Normalizes fetched bytes into plain text for the LLM Extraction Client.
//!
//! RSS/Atom feeds are parsed into a compact entry list so the prompt doesn't
//! have to wade through XML; anything else is passed through as lossy UTF-8.

use tracing::debug;

use crate::fetcher::looks_like_feed;

/// Produce extraction-ready text from fetched bytes, truncated to `max_chars`.
pub fn extraction_text(content_type: Option<&str>, bytes: &[u8], max_chars: usize) -> String {
    let text = if looks_like_feed(content_type, bytes) {
        match feed_rs::parser::parse(bytes) {
            Ok(feed) => render_feed(&feed),
            Err(err) => {
                debug!(%err, "feed parse failed, falling back to raw bytes");
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    ai_client::util::truncate_to_char_boundary(&text, max_chars).to_string()
}

fn render_feed(feed: &feed_rs::model::Feed) -> String {
    let mut out = String::new();
    if let Some(title) = &feed.title {
        out.push_str(&format!("Feed: {}\n\n", title.content));
    }
    for entry in &feed.entries {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        let link = entry.links.first().map(|l| l.href.as_str()).unwrap_or("");
        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();
        out.push_str(&format!("- title: {title}\n  url: {link}\n  summary: {summary}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_html_passes_through_lossy() {
        let html = b"<html><body>hello</body></html>";
        let text = extraction_text(Some("text/html"), html, 1000);
        assert!(text.contains("hello"));
    }

    #[test]
    fn truncates_to_max_chars() {
        let html = "a".repeat(100);
        let text = extraction_text(Some("text/html"), html.as_bytes(), 10);
        assert_eq!(text.len(), 10);
    }

    #[test]
    fn rss_feed_renders_entries() {
        let rss = br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Example</title>
<item><title>Post One</title><link>https://example.com/1</link><description>desc</description></item>
</channel></rss>"#;
        let text = extraction_text(Some("application/rss+xml"), rss, 10_000);
        assert!(text.contains("Post One"));
        assert!(text.contains("https://example.com/1"));
    }
}
