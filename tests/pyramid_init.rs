use mstrack::{FeatureQuality, Point, RgbView, Roi, TrackError, Tracker, TrackerConfig};

const CHANNELS: usize = 3;

fn frame_with_spots(width: usize, height: usize, spots: &[(i32, i32, u8)]) -> Vec<u8> {
    let mut data = vec![0u8; width * height * CHANNELS];
    for &(x, y, v) in spots {
        let off = ((y as usize) * width + x as usize) * CHANNELS;
        data[off..off + CHANNELS].copy_from_slice(&[v, v, v]);
    }
    data
}

#[test]
fn initialize_allocates_per_target_templates() {
    let mut tracker = Tracker::new(TrackerConfig {
        template_radius: 3,
        ..TrackerConfig::default()
    });
    tracker.initialize(64, 48, 4).unwrap();

    assert_eq!(tracker.target_count(), 4);
    assert_eq!(tracker.frame_count(), 0);
    // (2 * 3 + 1)^2 pixels, three channels each.
    assert_eq!(tracker.feature(3).unwrap().len(), 7 * 7 * 3);
}

#[test]
fn reinitialize_rebuilds_the_pyramid() {
    let mut tracker = Tracker::default();
    tracker.initialize(64, 64, 2).unwrap();
    tracker.set_target(1, Point::new(10, 10)).unwrap();

    tracker.set_scales(2);
    tracker.initialize(32, 32, 5).unwrap();
    assert_eq!(tracker.target_count(), 5);
    assert!(!tracker.target(1).unwrap().used);
}

#[test]
fn invalid_dimensions_are_rejected() {
    let mut tracker = Tracker::default();
    assert!(matches!(
        tracker.initialize(0, 10, 1).unwrap_err(),
        TrackError::InvalidDimensions { .. }
    ));
    assert!(matches!(
        tracker.initialize(10, 0, 1).unwrap_err(),
        TrackError::InvalidDimensions { .. }
    ));
}

#[test]
fn frame_size_must_match_initialization() {
    let mut tracker = Tracker::default();
    tracker.initialize(64, 64, 1).unwrap();

    let data = vec![0u8; 32 * 32 * CHANNELS];
    let frame = RgbView::from_slice(&data, 32, 32).unwrap();
    assert!(matches!(
        tracker.track(frame, Roi::full(32, 32)).unwrap_err(),
        TrackError::FrameSizeMismatch { .. }
    ));
    assert!(matches!(
        tracker
            .pre_process_image(frame, Roi::full(32, 32))
            .unwrap_err(),
        TrackError::FrameSizeMismatch { .. }
    ));
}

#[test]
fn reset_targets_forces_reacquisition() {
    let data = frame_with_spots(64, 64, &[(32, 32, 200)]);
    let frame = RgbView::from_slice(&data, 64, 64).unwrap();
    let roi = Roi::full(64, 64);

    let mut tracker = Tracker::default();
    tracker.initialize(64, 64, 1).unwrap();
    tracker.set_target(0, Point::new(32, 32)).unwrap();

    tracker.pre_process_image(frame, roi).unwrap();
    tracker.track(frame, roi).unwrap();
    assert!(matches!(
        tracker.target(0).unwrap().quality,
        FeatureQuality::Scored(_)
    ));
    assert_eq!(tracker.frame_count(), 1);

    tracker.reset_targets();
    assert_eq!(tracker.frame_count(), 0);
    assert_eq!(
        tracker.target(0).unwrap().quality,
        FeatureQuality::Uninitialized
    );
    assert!(tracker.target(0).unwrap().used);

    tracker.pre_process_image(frame, roi).unwrap();
    tracker.track(frame, roi).unwrap();
    assert!(matches!(
        tracker.target(0).unwrap().quality,
        FeatureQuality::Scored(_)
    ));
}

#[test]
fn release_requires_a_new_initialize() {
    let mut tracker = Tracker::default();
    tracker.initialize(64, 64, 1).unwrap();
    tracker.release();

    let data = vec![0u8; 64 * 64 * CHANNELS];
    let frame = RgbView::from_slice(&data, 64, 64).unwrap();
    assert_eq!(
        tracker.track(frame, Roi::full(64, 64)).unwrap_err(),
        TrackError::NotInitialized
    );

    tracker.initialize(64, 64, 1).unwrap();
    assert!(tracker.track(frame, Roi::full(64, 64)).is_ok());
}

#[test]
fn cleared_targets_are_ignored() {
    let data = frame_with_spots(64, 64, &[(20, 20, 180), (44, 44, 220)]);
    let frame = RgbView::from_slice(&data, 64, 64).unwrap();
    let roi = Roi::full(64, 64);

    let mut tracker = Tracker::default();
    tracker.initialize(64, 64, 2).unwrap();
    tracker.set_target(0, Point::new(20, 20)).unwrap();
    tracker.set_target(1, Point::new(44, 44)).unwrap();
    tracker.clear_target(1).unwrap();

    tracker.pre_process_image(frame, roi).unwrap();
    tracker.track(frame, roi).unwrap();

    assert!(tracker.target(0).unwrap().visible);
    let cleared = tracker.target(1).unwrap();
    assert!(!cleared.used);
    assert!(!cleared.visible);
    assert_eq!(cleared.quality, FeatureQuality::Uninitialized);
}
