use rand::Rng;

const GLITCH_CHARS: &[u8] = b"0123456789";

/// Per-character replacement probability for headline scrambling.
pub const SCRAMBLE_INTENSITY: f64 = 0.07;
pub const SCRAMBLE_DURATION_MS: u32 = 500;
pub const SCRAMBLE_STEP_MS: u32 = 50;

/// Replaces each non-whitespace character of `text` with a random digit with
/// probability `intensity`. Spaces and newlines always survive.
pub fn scramble<R: Rng>(text: &str, intensity: f64, rng: &mut R) -> String {
    let intensity = intensity.clamp(0.0, 1.0);
    text.chars()
        .map(|c| {
            if c != ' ' && c != '\n' && rng.gen_bool(intensity) {
                char::from(GLITCH_CHARS[rng.gen_range(0..GLITCH_CHARS.len())])
            } else {
                c
            }
        })
        .collect()
}
