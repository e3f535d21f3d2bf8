use super::*;

const TIMELINE: &str = r#"{
  "tracks": [
    { "id": "v", "name": "Video", "type": "media", "elements": [
        { "id": "clip", "type": "media", "media_id": "vid", "start_time": 1.0, "duration": 2.0,
          "trim_start": 0.5, "volume": 0.8, "pan": 0.25 },
        { "id": "still", "type": "media", "media_id": "img", "start_time": 0, "duration": 2 }
    ]},
    { "id": "a", "name": "Music", "type": "audio", "elements": [
        { "id": "song", "type": "media", "media_id": "mp3", "start_time": 0, "duration": 10 },
        { "id": "quiet", "type": "media", "media_id": "mp3", "start_time": 0, "duration": 1, "muted": true },
        { "id": "gone", "type": "media", "media_id": "mp3", "start_time": 0, "duration": 1, "hidden": true },
        { "id": "dangling", "type": "media", "media_id": "nope", "start_time": 0, "duration": 1 }
    ]},
    { "id": "m", "name": "Muted", "type": "audio", "muted": true, "elements": [
        { "id": "muted_track", "type": "media", "media_id": "mp3", "start_time": 0, "duration": 1 }
    ]}
  ],
  "media_items": [
    { "id": "vid", "type": "video", "url": "clip.mp4" },
    { "id": "img", "type": "image", "url": "still.png" },
    { "id": "mp3", "type": "audio", "url": "song.mp3" }
  ]
}"#;

#[test]
fn collects_video_and_audio_elements_only() {
    let tl: Timeline = serde_json::from_str(TIMELINE).unwrap();
    let sources = collect_audio_sources(&tl, Fps::new(30, 1).unwrap());
    let ids: Vec<_> = sources.iter().map(|s| s.element_id.as_str()).collect();
    assert_eq!(ids, vec!["clip", "song"]);

    let clip = &sources[0];
    assert_eq!(clip.path, "clip.mp4");
    assert_eq!(clip.start_frame, 30);
    assert_eq!(clip.duration_frames, 60);
    assert!((clip.volume - 0.8).abs() < 1e-6);
    assert_eq!(clip.pan, Some(0.25));
    assert_eq!(clip.offset_seconds, 0.5);

    assert_eq!(sources[1].pan, None);
    assert_eq!(sources[1].duration_frames, 300);
}
