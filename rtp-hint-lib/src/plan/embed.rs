//! Inline-vs-stream decision for single-sample tracks

use crate::types::TrackInfo;

/// Whether the embed check applies to a track at all: it must be referenced
/// by the root descriptor, hold exactly one sample, and the regular
/// descriptor profile must not be requested.
pub fn embed_check_applies(track: &TrackInfo, regular_iod: bool) -> bool {
    !regular_iod && track.in_root_descriptor && track.sample_count == 1
}

/// Decide whether the track's sole sample is carried inline.
///
/// Tracks without a stream type are never inlined. `can_embed` receives the
/// sample bytes and the stream type code.
pub fn should_embed<F>(track: &TrackInfo, sample: Option<&[u8]>, can_embed: F) -> bool
where
    F: FnOnce(&[u8], u8) -> bool,
{
    let stream_type = track.stream_type();
    if stream_type == 0 {
        return false;
    }
    match sample {
        Some(data) => can_embed(data, stream_type),
        None => {
            tracing::warn!(
                "Track ID {}: sample 1 could not be read, streaming it",
                track.track_id
            );
            false
        }
    }
}
