//! Healing-marker generation (§9 design notes): a high-entropy identifier unique to
//! one parse, chosen by rejection sampling against the input so it's guaranteed not
//! to collide with anything already there.

use rand::distr::{Alphanumeric, SampleString};

const MARKER_BYTES: usize = 16; // 128 bits, well over the "≥64 random bits" floor.
const MAX_ATTEMPTS: usize = 64;

/// Generates a marker that does not occur anywhere in `input`. Bounded retries: an
/// adversarial input stuffed with random-looking alnum runs could in principle force
/// collisions, but at 128 bits of entropy per attempt the bound is never expected to
/// bite in practice — it exists to guarantee termination, not to compensate for weak
/// entropy.
pub fn generate_healing_marker(input: &str) -> String {
    let mut rng = rand::rng();
    for _ in 0..MAX_ATTEMPTS {
        let candidate = Alphanumeric.sample_string(&mut rng, MARKER_BYTES);
        if !input.contains(candidate.as_str()) {
            return candidate;
        }
    }
    // Exhausted retries (astronomically unlikely): fall back to a longer marker,
    // which only makes a further collision less likely still.
    Alphanumeric.sample_string(&mut rng, MARKER_BYTES * 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_does_not_occur_in_input() {
        let input = "some input text with numbers 12345 and symbols !@#";
        let marker = generate_healing_marker(input);
        assert!(!input.contains(&marker));
        assert!(marker.len() >= MARKER_BYTES);
    }

    #[test]
    fn marker_is_alphanumeric() {
        let marker = generate_healing_marker("anything");
        assert!(marker.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
