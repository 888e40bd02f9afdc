/// Number of whitespace-delimited words sent upstream, roughly the first
/// three pages of an article.
pub const MAX_WORDS: usize = 3000;

/// Keep the first `max_words` whitespace-delimited words, joined by single
/// spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
