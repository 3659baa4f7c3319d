//! Colour extraction from free-text variant descriptions.
//!
//! Stock rows describe variants like `"BP9601 NAVY cotton Tote"`. The colour
//! is whatever trails the code tokens: scan from the end, keep tokens that
//! contain a lowercase letter, and stop at the first all-caps alphanumeric
//! token once collection has started. Kept tokens get their first letter
//! uppercased.
//!
//! Edge cases the export and sync layers depend on:
//! - no letters at all -> empty colour
//! - every token all-caps -> empty colour

/// Extract the colour phrase from a variant description.
pub fn extract_colour(description: &str) -> String {
    let tokens: Vec<&str> = description.split_whitespace().collect();
    let mut colour: Vec<String> = Vec::new();
    let mut collecting = false;

    for token in tokens.iter().rev() {
        if is_code_token(token) || !has_lowercase(token) {
            if collecting {
                break;
            }
            continue;
        }

        collecting = true;
        colour.insert(0, title_case(token));
    }

    colour.join(" ")
}

/// All-caps alphanumeric tokens are treated as SKU/code fragments.
fn is_code_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn has_lowercase(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_lowercase())
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_all_caps_tokens() {
        assert_eq!(extract_colour("NAVY cotton Tote"), "Cotton Tote");
        assert_eq!(extract_colour("GREY waterproof Backpack"), "Waterproof Backpack");
    }

    #[test]
    fn test_trailing_run_only() {
        // A code token after collection started ends the phrase.
        assert_eq!(extract_colour("dark BP9601 navy blue"), "Navy Blue");
    }

    #[test]
    fn test_no_letters_is_empty() {
        assert_eq!(extract_colour("1234 5678"), "");
        assert_eq!(extract_colour(""), "");
    }

    #[test]
    fn test_all_caps_is_empty() {
        assert_eq!(extract_colour("BP9601 NAVY"), "");
    }

    #[test]
    fn test_title_cases_preserving_order() {
        assert_eq!(extract_colour("BP9601 light grey melange"), "Light Grey Melange");
    }

    #[test]
    fn test_mixed_case_token_kept_after_first_letter() {
        assert_eq!(extract_colour("McIntosh red"), "McIntosh Red");
    }
}
