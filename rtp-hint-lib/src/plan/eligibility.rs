//! Track eligibility filter

use serde::{Deserialize, Serialize};

use crate::types::{MediaKind, ProfileTag, TrackInfo};

/// Whether a track takes part in hinting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// No samples (typically interaction streams)
    SkipEmpty,
    SkipDisabled,
    /// Already a transport track
    SkipHintMedia,
    /// Systems or text track under a profile restricted to audio/video
    SkipUnsupportedUnderProfile,
    Eligible,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Decide whether `track` is hinted under the container's guessed profile.
///
/// Rules apply in order: empty, disabled, hint media, profile restriction.
pub fn check_eligibility(track: &TrackInfo, profile: ProfileTag) -> Eligibility {
    if track.sample_count == 0 {
        return Eligibility::SkipEmpty;
    }
    if !track.enabled {
        return Eligibility::SkipDisabled;
    }
    match (track.kind, profile.forbids_systems_tracks()) {
        (MediaKind::Hint, _) => Eligibility::SkipHintMedia,
        (MediaKind::Visual | MediaKind::Audio, _) => Eligibility::Eligible,
        (
            MediaKind::Scene
            | MediaKind::ObjectDescriptor
            | MediaKind::Text
            | MediaKind::Subtitle
            | MediaKind::Other(_),
            true,
        ) => Eligibility::SkipUnsupportedUnderProfile,
        (
            MediaKind::Scene
            | MediaKind::ObjectDescriptor
            | MediaKind::Text
            | MediaKind::Subtitle
            | MediaKind::Other(_),
            false,
        ) => Eligibility::Eligible,
    }
}
