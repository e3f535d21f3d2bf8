use crate::{
    audio::mix::AudioSource,
    foundation::core::Fps,
    timeline::model::{ElementBody, MediaKind, Timeline, TrackKind},
};

/// Audio contributions of a timeline, in track then element order.
///
/// Every visible element on an unmuted audio track, and every video element
/// on an unmuted media track, whose element is not muted and whose media
/// item has a URL. Elements with a dangling media reference are skipped.
pub fn collect_audio_sources(timeline: &Timeline, fps: Fps) -> Vec<AudioSource> {
    let mut out = Vec::new();
    for track in timeline.tracks.iter().filter(|t| !t.muted) {
        for element in track.elements.iter().filter(|e| !e.hidden) {
            let ElementBody::Media(media) = &element.body else {
                continue;
            };
            if media.muted {
                continue;
            }
            let Some(item) = timeline.media_item(&media.media_id) else {
                tracing::debug!(
                    element_id = %element.id,
                    media_id = %media.media_id,
                    "audio source has no media item"
                );
                continue;
            };
            let wanted = match track.kind {
                TrackKind::Audio => true,
                TrackKind::Media => item.kind == MediaKind::Video,
                _ => false,
            };
            if !wanted || item.url.is_empty() {
                continue;
            }

            out.push(AudioSource {
                element_id: element.id.clone(),
                path: item.url.clone(),
                start_frame: fps.secs_to_frames_round(element.timing.start_time),
                duration_frames: fps.secs_to_frames_round(element.timing.duration),
                volume: media.volume.clamp(0.0, 1.0) as f32,
                pan: (media.pan != 0.0).then_some(media.pan.clamp(-1.0, 1.0) as f32),
                offset_seconds: element.timing.trim_start.max(0.0),
            });
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/audio/sources.rs"]
mod tests;
