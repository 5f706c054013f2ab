/// Trims trailing slashes so endpoint joins stay predictable.
#[must_use]
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

#[must_use]
pub fn sessions_url(base_url: &str, bot_id: &str) -> String {
    format!("{}/api/bots/{bot_id}/web/sessions", normalize_base_url(base_url))
}

#[must_use]
pub fn chat_stream_url(base_url: &str, bot_id: &str) -> String {
    format!("{}/api/bots/{bot_id}/chat/stream", normalize_base_url(base_url))
}

#[cfg(test)]
mod tests {
    use super::{chat_stream_url, normalize_base_url, sessions_url};

    #[test]
    fn normalize_strips_trailing_slashes_and_whitespace() {
        assert_eq!(normalize_base_url(" https://host/// "), "https://host");
        assert_eq!(normalize_base_url("https://host"), "https://host");
    }

    #[test]
    fn endpoints_join_against_normalized_base() {
        assert_eq!(
            sessions_url("https://host/", "bot-1"),
            "https://host/api/bots/bot-1/web/sessions"
        );
        assert_eq!(
            chat_stream_url("https://host", "bot-1"),
            "https://host/api/bots/bot-1/chat/stream"
        );
    }
}
