//! Sync track selection

use crate::types::TrackInfo;

/// Find the systems track every other stream synchronizes to.
///
/// The first scene or object-descriptor track referenced by the root
/// descriptor wins. Single-track containers have nothing to synchronize.
pub fn select_sync_track(tracks: &[TrackInfo]) -> Option<&TrackInfo> {
    if tracks.len() <= 1 {
        return None;
    }
    tracks
        .iter()
        .find(|t| t.kind.is_systems() && t.in_root_descriptor)
}
