/// The fixed instruction prompt sent with every extraction request.
///
/// It asks the model for a bare JSON object with `title`, `authors`, `year`
/// and `keywords`, using `"Desconocido"` for anything it cannot determine.
///
/// The prompt is loaded from `prompt.txt` at compile time using the
/// `include_str!` macro, making it easy to edit without dealing with
/// Rust string syntax.
pub const METADATA_EXTRACTION_PROMPT: &str = include_str!("prompt.txt");

/// Single prompt for providers that take no separate system instruction.
pub fn inline_prompt(instructions: &str, text: &str) -> String {
    format!("{}\n\n{}", instructions.trim_end(), text)
}
