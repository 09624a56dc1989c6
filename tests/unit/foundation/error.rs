use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ReelError::resource_fetch("ffmpeg-core.wasm", "x")
            .to_string()
            .contains("resource fetch error: ffmpeg-core.wasm")
    );
    assert!(
        ReelError::initialization("x")
            .to_string()
            .contains("encoder initialization error:")
    );
    assert!(
        ReelError::capture(7, "x")
            .to_string()
            .contains("capture error at frame 7")
    );
    assert!(ReelError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn kind_names_each_variant() {
    assert_eq!(ReelError::validation("x").kind(), "validation");
    assert_eq!(ReelError::capture(0, "x").kind(), "capture");
    assert_eq!(ReelError::encode("x").kind(), "encode");
    assert_eq!(ReelError::data("x").kind(), "data");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
