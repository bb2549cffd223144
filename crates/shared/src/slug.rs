//! Room slug generation.
//!
//! Slugs are the public invite codes players type to join a room, so they
//! use a restricted alphabet without visually ambiguous characters
//! (no `0`/`O`, no `1`/`I`). Generation gives no uniqueness guarantee;
//! collision handling belongs to the caller (the room repository probes the
//! store and retries a bounded number of times).

use rand::Rng;

/// Characters allowed in a slug. Uppercase letters and digits, excluding
/// the ambiguous 0/O/1/I pairs.
pub const SLUG_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of random characters in a slug (dash excluded).
pub const SLUG_CHARS: usize = 6;

/// Generate a random room slug in `XXX-XXX` format.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();

    let mut segment = || -> String {
        (0..SLUG_CHARS / 2)
            .map(|_| {
                let idx = rng.gen_range(0..SLUG_ALPHABET.len());
                SLUG_ALPHABET[idx] as char
            })
            .collect()
    };

    format!("{}-{}", segment(), segment())
}

/// Normalize user input to canonical slug form: uppercase, with the dash
/// re-inserted if the user typed the six characters without it.
pub fn normalize(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.len() == SLUG_CHARS {
        format!("{}-{}", &cleaned[..3], &cleaned[3..])
    } else {
        input.trim().to_ascii_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_format() {
        let slug = generate();
        assert_eq!(slug.len(), 7); // XXX-XXX
        assert_eq!(&slug[3..4], "-");

        for (i, c) in slug.chars().enumerate() {
            if i == 3 {
                assert_eq!(c, '-');
            } else {
                assert!(SLUG_ALPHABET.contains(&(c as u8)), "Invalid char: {}", c);
            }
        }
    }

    #[test]
    fn test_generate_excludes_ambiguous_chars() {
        for _ in 0..200 {
            let slug = generate();
            assert!(!slug.contains('0'));
            assert!(!slug.contains('O'));
            assert!(!slug.contains('1'));
            assert!(!slug.contains('I'));
        }
    }

    #[test]
    fn test_generate_is_random() {
        let slugs: Vec<String> = (0..100).map(|_| generate()).collect();
        let unique: std::collections::HashSet<_> = slugs.iter().collect();
        // 32^6 possibilities, collisions in 100 draws should be rare
        assert!(unique.len() >= 99);
    }

    #[test]
    fn test_normalize_lowercase_input() {
        assert_eq!(normalize("abc-def"), "ABC-DEF");
    }

    #[test]
    fn test_normalize_without_dash() {
        assert_eq!(normalize("abcdef"), "ABC-DEF");
        assert_eq!(normalize("AB2XY9"), "AB2-XY9");
    }

    #[test]
    fn test_normalize_with_whitespace() {
        assert_eq!(normalize("  abc-def  "), "ABC-DEF");
    }

    #[test]
    fn test_normalize_generated_roundtrip() {
        let slug = generate();
        assert_eq!(normalize(&slug), slug);
        assert_eq!(normalize(&slug.to_lowercase()), slug);
        assert_eq!(normalize(&slug.replace('-', "")), slug);
    }
}
