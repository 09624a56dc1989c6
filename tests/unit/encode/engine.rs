use super::*;
use crate::foundation::core::FrameIndex;

fn args(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn vfs_paths_are_validated() {
    assert!(validate_vfs_path("frames/frame000000.png").is_ok());
    assert!(validate_vfs_path("output.mp4").is_ok());
    assert!(validate_vfs_path("/etc/passwd").is_err());
    assert!(validate_vfs_path("frames/../x").is_err());
    assert!(validate_vfs_path("frames//x").is_err());
    assert!(validate_vfs_path("").is_err());
}

#[test]
fn pattern_expansion_pads_indices() {
    assert_eq!(
        expand_pattern("frames/frame%06d.png", 7).as_deref(),
        Some("frames/frame000007.png")
    );
    assert_eq!(expand_pattern("f%d.png", 12).as_deref(), Some("f12.png"));
    assert_eq!(expand_pattern("plain.png", 0), None);
}

#[test]
fn frame_pattern_expands_to_staged_file_names() {
    for i in [0u64, 7, 999_999] {
        assert_eq!(
            expand_pattern(FrameIndex::FILE_PATTERN, i as usize),
            Some(FrameIndex(i).file_name())
        );
    }
}

#[tokio::test]
async fn write_requires_directory() {
    let e = InMemoryEngine::new();
    assert!(e.write_file("frames/a.png", vec![1]).await.is_err());
    e.create_dir("frames").await.unwrap();
    e.write_file("frames/a.png", vec![1]).await.unwrap();
    assert_eq!(e.read_file("frames/a.png").await.unwrap(), vec![1]);
}

#[tokio::test]
async fn delete_dir_removes_contents() {
    let e = InMemoryEngine::new();
    e.create_dir("frames").await.unwrap();
    e.write_file("frames/a.png", vec![1, 2]).await.unwrap();
    e.write_file("keep.bin", vec![3]).await.unwrap();
    e.delete_dir("frames").await.unwrap();
    assert_eq!(e.file_names(), vec!["keep.bin".to_owned()]);
    assert!(e.dir_names().is_empty());
    assert!(e.delete_dir("frames").await.is_err());
}

#[tokio::test]
async fn exec_consumes_consecutive_frames() {
    let e = InMemoryEngine::new();
    e.create_dir("frames").await.unwrap();
    for i in [0u32, 1, 2, 4] {
        e.write_file(&format!("frames/frame{i:06}.png"), vec![0])
            .await
            .unwrap();
    }
    e.exec(&args(&["-framerate", "10", "-i", "frames/frame%06d.png", "out.mp4"]))
        .await
        .unwrap();

    let log = e.exec_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].frames_consumed, 3);
    assert!(!e.read_file("out.mp4").await.unwrap().is_empty());
}

#[tokio::test]
async fn exec_without_frames_fails() {
    let e = InMemoryEngine::new();
    let err = e
        .exec(&args(&["-i", "frames/frame%06d.png", "out.mp4"]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("matched no files"));
}

#[tokio::test]
async fn failing_exec_reports_message() {
    let e = InMemoryEngine::failing_exec("codec exploded");
    let err = e.exec(&args(&["-i", "x%d.png", "o.mp4"])).await.unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(err.to_string().contains("codec exploded"));
}
