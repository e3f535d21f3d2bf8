use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ReelError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(ReelError::decode("x").to_string().contains("decode error:"));
    assert!(ReelError::audio("x").to_string().contains("audio error:"));
    assert!(
        ReelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn seek_timeout_mentions_target_and_budget() {
    let err = ReelError::SeekTimeout {
        url: "clip.mp4".to_string(),
        target_secs: 1.5,
        timeout_ms: 750,
    };
    let msg = err.to_string();
    assert!(msg.contains("1.500s"));
    assert!(msg.contains("750ms"));
    assert!(msg.contains("clip.mp4"));
}

#[test]
fn only_decode_class_errors_are_transient() {
    assert!(ReelError::decode("x").is_transient());
    assert!(ReelError::invalid_frame("x").is_transient());
    assert!(
        ReelError::SeekTimeout {
            url: String::new(),
            target_secs: 0.0,
            timeout_ms: 1,
        }
        .is_transient()
    );
    assert!(!ReelError::validation("x").is_transient());
    assert!(!ReelError::audio("x").is_transient());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
