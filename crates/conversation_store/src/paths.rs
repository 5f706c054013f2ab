#[must_use]
pub fn sanitize_bot_id(bot_id: &str) -> String {
    bot_id
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '-',
        })
        .collect()
}

#[must_use]
pub fn conversation_file_name(bot_id: &str) -> String {
    format!("{}.json", sanitize_bot_id(bot_id))
}

#[cfg(test)]
mod tests {
    use super::{conversation_file_name, sanitize_bot_id};

    #[test]
    fn sanitize_replaces_path_hostile_characters() {
        assert_eq!(sanitize_bot_id("bot/1:alpha beta"), "bot-1-alpha-beta");
        assert_eq!(sanitize_bot_id("bot_2.v1"), "bot_2.v1");
    }

    #[test]
    fn file_name_appends_json_extension() {
        assert_eq!(conversation_file_name("bot/1"), "bot-1.json");
    }
}
