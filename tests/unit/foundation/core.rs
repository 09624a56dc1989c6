use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
}

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::new(FrameIndex(3), FrameIndex(2)).is_err());
}

#[test]
fn batches_cover_range_without_gaps() {
    let r = FrameRange::new(FrameIndex(0), FrameIndex(12)).unwrap();
    let batches: Vec<_> = r.batches(5).collect();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.len_frames() <= 5));

    let flat: Vec<u64> = batches.iter().flat_map(|b| b.iter()).map(|f| f.0).collect();
    assert_eq!(flat, (0..12).collect::<Vec<_>>());
}

#[test]
fn batches_of_empty_range_are_empty() {
    let r = FrameRange::new(FrameIndex(4), FrameIndex(4)).unwrap();
    assert_eq!(r.batches(5).count(), 0);
}

#[test]
fn fps_floor_matches_duration_times_rate() {
    let fps = Fps::new(30).unwrap();
    assert_eq!(fps.secs_to_frames_floor(3.0), 90);
    assert_eq!(fps.secs_to_frames_floor(0.05), 1);
    assert_eq!(fps.secs_to_frames_floor(0.01), 0);
    assert!(Fps::new(0).is_err());
}

#[test]
fn frame_file_names_sort_lexically_and_numerically() {
    let names: Vec<String> = [0u64, 1, 9, 10, 99, 100, 123_456]
        .into_iter()
        .map(|i| FrameIndex(i).file_name())
        .collect();
    assert_eq!(names[0], "frame000000.png");
    assert_eq!(names[6], "frame123456.png");

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(sorted, names);
}
