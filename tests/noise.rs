use crt_tv::config::NoiseConfig;
use crt_tv::noise::{generate_frame, NoiseParams};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const WIDTH: f64 = 533.0;
const HEIGHT: f64 = 395.0;

#[test]
fn zero_intensity_draws_nothing() {
    let config = NoiseConfig::default();
    assert_eq!(NoiseParams::for_intensity(&config, 0.0), None);

    let mut rng = SmallRng::seed_from_u64(1);
    let frame = generate_frame(&config, 0.0, WIDTH, HEIGHT, &mut rng);
    assert!(frame.dots.is_empty());
    assert_eq!(frame.blur_px, 0.0);
}

#[test]
fn parameters_follow_the_control_points() {
    let config = NoiseConfig::default();
    let half = NoiseParams::for_intensity(&config, 0.5).unwrap();
    assert_eq!(half.band_start, 100.0);
    assert_eq!(half.particle_count, 4);
    assert_eq!(half.blur_px, 1.0);

    let full = NoiseParams::for_intensity(&config, 1.0).unwrap();
    assert_eq!(full.band_start, 10.0);
    assert_eq!(full.particle_count, 40);
    assert_eq!(full.blur_px, 2.0);

    let quarter = NoiseParams::for_intensity(&config, 0.25).unwrap();
    assert_eq!(quarter.band_start, 150.0);
}

#[test]
fn more_intensity_means_more_noise() {
    let config = NoiseConfig::default();
    let counts: Vec<u32> = [0.1, 0.3, 0.5, 0.7, 1.0]
        .iter()
        .map(|&i| NoiseParams::for_intensity(&config, i).unwrap().particle_count)
        .collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
}

#[test]
fn dots_stay_in_their_bands() {
    let config = NoiseConfig::default();
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..50 {
        let frame = generate_frame(&config, 1.0, WIDTH, HEIGHT, &mut rng);
        assert!(!frame.dots.is_empty());
        for &(_, y) in &frame.dots {
            assert_eq!(y, y.trunc());
            let top_band = y <= 0.0;
            let lower_band = (10.0..=HEIGHT - config.bottom_margin).contains(&y);
            assert!(top_band || lower_band, "y = {y}");
        }
    }
}

#[test]
fn every_head_gets_a_tail() {
    let config = NoiseConfig::default();
    let mut rng = SmallRng::seed_from_u64(3);
    let frame = generate_frame(&config, 0.5, WIDTH, HEIGHT, &mut rng);

    // Each particle contributes its two heads, then a tail for each.
    let heads = 2 * NoiseParams::for_intensity(&config, 0.5).unwrap().particle_count as usize;
    let tail_max = heads * config.max_tail as usize;
    assert!(frame.dots.len() >= heads * 2);
    assert!(frame.dots.len() <= heads + tail_max);
}

#[test]
fn degenerate_canvas_is_empty_but_blurred() {
    let config = NoiseConfig::default();
    let mut rng = SmallRng::seed_from_u64(5);
    let frame = generate_frame(&config, 0.5, 0.0, 0.0, &mut rng);
    assert!(frame.dots.is_empty());
    assert_eq!(frame.blur_px, 1.0);
}
