//! Identifier casing shared by the parsers and the language codecs.
//!
//! Words are split on any non-alphanumeric character and on case
//! boundaries, so `SecretVersion`, `secret_version`, `secret-version` and
//! `SECRET_VERSION` all split into the same two words.

use std::collections::HashSet;

/// Split an identifier into words.
///
/// Acronyms stay together (`HTTPServer` is `HTTP`, `Server`) and digits stay
/// attached to the word before them (`v1beta` is one word).
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let prev = chars[i - 1];
            let cur = chars[i];
            let next_is_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            let boundary = (cur.is_ascii_uppercase()
                && (prev.is_ascii_lowercase() || prev.is_ascii_digit()))
                || (cur.is_ascii_uppercase() && prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                words.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        if start < chars.len() {
            words.push(chars[start..].iter().collect());
        }
    }
    words
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

fn pascal_word(word: &str) -> String {
    // SCREAMING words (`STATE`, `API`) are folded, mixed case is kept.
    if word.chars().all(|c| !c.is_ascii_lowercase()) {
        capitalize_first(&word.to_ascii_lowercase())
    } else {
        capitalize_first(word)
    }
}

/// snake_case.
pub fn to_snake_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// SCREAMING_SNAKE_CASE.
pub fn to_screaming_snake_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// PascalCase.
pub fn to_pascal_case(name: &str) -> String {
    split_words(name).iter().map(|w| pascal_word(w)).collect()
}

/// lowerCamelCase.
pub fn to_camel_case(name: &str) -> String {
    let mut words = split_words(name).into_iter();
    let Some(first) = words.next() else {
        return String::new();
    };
    let mut out = first.to_ascii_lowercase();
    for word in words {
        out.push_str(&pascal_word(&word));
    }
    out
}

/// Append `_` to names that collide with a reserved word, and prefix names
/// that would start with a digit.
pub fn escape_reserved(name: String, reserved: &HashSet<&'static str>) -> String {
    let name = if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    };
    if reserved.contains(name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("SecretVersion"), vec!["Secret", "Version"]);
        assert_eq!(split_words("secret_version"), vec!["secret", "version"]);
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("v1beta"), vec!["v1beta"]);
        assert_eq!(split_words("display-name.v2"), vec!["display", "name", "v2"]);
    }

    #[test]
    fn test_casing() {
        assert_eq!(to_snake_case("SecretVersion"), "secret_version");
        assert_eq!(to_snake_case("secretId"), "secret_id");
        assert_eq!(to_pascal_case("secret_version"), "SecretVersion");
        assert_eq!(to_pascal_case("STATE_UNSPECIFIED"), "StateUnspecified");
        assert_eq!(to_pascal_case("Secret Manager API"), "SecretManagerApi");
        assert_eq!(to_camel_case("SecretVersion"), "secretVersion");
        assert_eq!(to_camel_case("secret_id"), "secretId");
        assert_eq!(to_screaming_snake_case("Enabled"), "ENABLED");
    }

    #[test]
    fn test_escape_reserved() {
        let reserved: HashSet<&'static str> = ["type", "move"].into_iter().collect();
        assert_eq!(escape_reserved("type".into(), &reserved), "type_");
        assert_eq!(escape_reserved("name".into(), &reserved), "name");
        assert_eq!(escape_reserved("2fa".into(), &reserved), "_2fa");
    }
}
