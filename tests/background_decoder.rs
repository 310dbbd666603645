//! End-to-end ordering properties of the background decoder.

use std::time::{Duration, Instant};

use arena_vision::{BackgroundDecoder, Frame, FrameSource, SyntheticTransport};

const RED: [u8; 3] = [0, 0, 255];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [255, 0, 0];

/// Map a solid frame back to its index in the red/green/blue script.
fn color_rank(frame: &Frame) -> usize {
    let px = &frame.pixels()[..3];
    match [px[0], px[1], px[2]] {
        RED => 0,
        GREEN => 1,
        BLUE => 2,
        other => panic!("unexpected frame color {:?}", other),
    }
}

#[test]
fn slow_consumer_observes_monotonic_sequence_ending_at_blue() {
    let transport = SyntheticTransport::script(4, 4, vec![RED, GREEN, BLUE])
        .with_interval(Duration::from_millis(15));
    let mut decoder = BackgroundDecoder::start(Box::new(transport), 4, 4).expect("start decoder");

    // Poll slower than the 15ms production cadence.
    let mut observed = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(frame) = decoder.poll_frame() {
            observed.push(color_rank(&frame));
            if *observed.last().unwrap() == 2 && observed.len() >= 4 {
                break;
            }
        }
        assert!(Instant::now() < deadline, "never reached the final frame");
        std::thread::sleep(Duration::from_millis(20));
    }

    // Non-decreasing: repeats are fine, going backwards is not.
    for pair in observed.windows(2) {
        assert!(pair[0] <= pair[1], "sequence went backwards: {:?}", observed);
    }
    assert_eq!(*observed.last().unwrap(), 2);

    // The script is exhausted; the last frame must now be constant.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(color_rank(&decoder.poll_frame().unwrap()), 2);

    decoder.stop();
    let after_stop = decoder.poll_frame().expect("frame after stop");
    assert_eq!(color_rank(&after_stop), 2);

    // Second stop neither fails nor changes the observable frame.
    decoder.stop();
    assert_eq!(color_rank(&decoder.poll_frame().unwrap()), 2);
}

#[test]
fn fast_consumer_observes_repeats_not_gaps() {
    let transport = SyntheticTransport::script(4, 4, vec![RED, GREEN, BLUE])
        .with_interval(Duration::from_millis(30));
    let mut decoder = BackgroundDecoder::start(Box::new(transport), 4, 4).expect("start decoder");

    let mut observed = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while observed.last().copied() != Some(2) {
        if let Some(frame) = decoder.poll_frame() {
            observed.push(color_rank(&frame));
        }
        assert!(Instant::now() < deadline, "never reached the final frame");
        std::thread::sleep(Duration::from_millis(2));
    }

    // Polling much faster than production repeats frames.
    let repeats = observed
        .windows(2)
        .filter(|pair| pair[0] == pair[1])
        .count();
    assert!(repeats > 0, "expected repeated observations: {:?}", observed);
}

#[test]
fn nothing_available_before_first_decode() {
    // Production is delayed well past the assertion window.
    let transport = SyntheticTransport::script(4, 4, vec![RED])
        .with_interval(Duration::from_millis(200));
    let mut decoder = BackgroundDecoder::start(Box::new(transport), 4, 4).expect("start decoder");

    for _ in 0..10 {
        assert!(!decoder.frame_available());
        assert!(decoder.poll_frame().is_none());
        std::thread::sleep(Duration::from_millis(1));
    }
    decoder.stop();
}
