/// Mask a secret for display, keeping its first two and last two characters.
///
/// The masked form has the same length as the input. Secrets of four
/// characters or fewer are masked entirely, since keeping four characters
/// would reveal all of them.
pub fn redact_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 4))
}
