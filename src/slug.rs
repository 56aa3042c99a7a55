use rand::Rng;
use rand::rngs::OsRng;
use std::collections::HashSet;

pub const SLUG_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn random_slug() -> String {
    let mut rng = OsRng;
    (0..SLUG_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generates a slug that is not already taken.
///
/// Draws from the OS entropy source and retries on collision. There is no retry
/// bound; with 62^6 possible slugs a loop of more than one iteration is rare.
pub fn generate(existing: &HashSet<String>) -> String {
    loop {
        let slug = random_slug();
        if !existing.contains(&slug) {
            return slug;
        }
        tracing::debug!(slug = %slug, "slug collision, retrying");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_shape() {
        let slug = generate(&HashSet::new());
        assert_eq!(slug.len(), SLUG_LEN);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn never_returns_existing() {
        let mut taken = HashSet::new();
        for _ in 0..2_000 {
            let slug = generate(&taken);
            assert!(taken.insert(slug));
        }
    }
}
