/// Lowercases `text` and splits it into runs of word characters
/// (alphanumerics and `_`). Runs shorter than two characters are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|token| token.chars().nth(1).is_some())
        .map(str::to_owned)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::tokenize;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("USB-C Cable, 1.5m (Braided)!"),
            vec!["usb", "cable", "5m", "braided"]
        );
    }

    #[test]
    fn drops_single_character_tokens() {
        assert_eq!(tokenize("a b cd e"), vec!["cd"]);
    }

    #[test]
    fn keeps_underscores_and_unicode_letters() {
        assert_eq!(tokenize("snake_case Café"), vec!["snake_case", "café"]);
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(tokenize("   \t ").is_empty());
    }
}
