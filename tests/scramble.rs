use crt_tv::scramble::{scramble, SCRAMBLE_INTENSITY};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn zero_intensity_is_identity() {
    let mut rng = SmallRng::seed_from_u64(1);
    assert_eq!(scramble("Selected work", 0.0, &mut rng), "Selected work");
}

#[test]
fn full_intensity_keeps_only_whitespace() {
    let mut rng = SmallRng::seed_from_u64(2);
    let out = scramble("ab c\nd", 1.0, &mut rng);
    let chars: Vec<char> = out.chars().collect();
    assert_eq!(chars.len(), 6);
    assert_eq!(chars[2], ' ');
    assert_eq!(chars[4], '\n');
    for i in [0, 1, 3, 5] {
        assert!(chars[i].is_ascii_digit(), "{out:?}");
    }
}

#[test]
fn default_intensity_changes_a_few_characters() {
    let mut rng = SmallRng::seed_from_u64(3);
    let text = "x".repeat(2000);
    let out = scramble(&text, SCRAMBLE_INTENSITY, &mut rng);
    let changed = out.chars().filter(|c| c.is_ascii_digit()).count();
    assert_eq!(out.chars().count(), 2000);
    assert!((60..=230).contains(&changed), "{changed}");
}

#[test]
fn multibyte_text_keeps_its_length_in_chars() {
    let mut rng = SmallRng::seed_from_u64(4);
    let out = scramble("café · über", 0.5, &mut rng);
    assert_eq!(out.chars().count(), "café · über".chars().count());
}
