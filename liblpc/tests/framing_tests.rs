//! Framing tests for liblpc
use liblpc::{frame_count, frame_signal, hann_window, pad_to_hop, LpcError};

// ============================================================================
// Frame count and padding
// ============================================================================

#[test]
fn test_exactly_one_frame() {
    let frame_len = 512;
    let signal = vec![0.5; frame_len];
    assert_eq!(frame_count(signal.len(), frame_len).unwrap(), 1);
    assert_eq!(frame_signal(&signal, frame_len).unwrap().len(), 1);
}

#[test]
fn test_one_past_two_hops_pads_to_three_hops() {
    let n = 8;
    let signal = vec![1.0; 2 * n + 1];

    let padded = pad_to_hop(&signal, n);
    assert_eq!(padded.len() - signal.len(), n - 1);
    assert_eq!(padded.len(), 3 * n);
    assert!(padded[signal.len()..].iter().all(|&s| s == 0.0));

    // floor(3n / n) - 1
    assert_eq!(frame_count(signal.len(), 2 * n).unwrap(), 2);
}

#[test]
fn test_minimum_length_is_one_more_than_hop() {
    let frame_len = 16;
    assert_eq!(frame_count(9, frame_len).unwrap(), 1);

    let err = frame_count(8, frame_len).unwrap_err();
    assert_eq!(
        err,
        LpcError::InsufficientSamples {
            required: 9,
            actual: 8
        }
    );
}

#[test]
fn test_empty_signal() {
    assert!(matches!(
        frame_signal(&[], 64),
        Err(LpcError::InsufficientSamples { actual: 0, .. })
    ));
}

#[test]
fn test_bad_frame_len() {
    assert!(matches!(
        frame_signal(&[0.0; 100], 0),
        Err(LpcError::InvalidParameter(_))
    ));
    assert!(matches!(
        frame_signal(&[0.0; 100], 33),
        Err(LpcError::InvalidParameter(_))
    ));
}

#[test]
fn test_count_matches_frames_for_many_lengths() {
    let frame_len = 32;
    for len in 17..400 {
        let signal = vec![0.25; len];
        let frames = frame_signal(&signal, frame_len).unwrap();
        assert_eq!(frames.len(), frame_count(len, frame_len).unwrap(), "len {len}");
        assert_eq!(frames.frame_len(), frame_len);
        assert_eq!(frames.hop(), 16);
    }
}

// ============================================================================
// Windowing
// ============================================================================

#[test]
fn test_window_symmetric() {
    let w = hann_window(512);
    assert_eq!(w[0], 0.0);
    for k in 0..256 {
        assert!((w[k] - w[511 - k]).abs() < 1e-12);
    }
}

#[test]
fn test_frames_are_windowed_slices() {
    let frame_len = 64;
    let hop = frame_len / 2;
    let signal: Vec<f64> = (0..300).map(|i| (i as f64 * 0.3).sin()).collect();
    let frames = frame_signal(&signal, frame_len).unwrap();
    let padded = pad_to_hop(&signal, hop);
    let window = hann_window(frame_len);

    for (i, frame) in frames.iter().enumerate() {
        for k in 0..frame_len {
            let expected = padded[i * hop + k] * window[k];
            assert_eq!(frame[k], expected);
        }
    }
}

#[test]
fn test_input_untouched() {
    let signal: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let copy = signal.clone();
    let _ = frame_signal(&signal, 20).unwrap();
    assert_eq!(signal, copy);
}
