//! Delivery group and priority assignment

use crate::types::{MediaKind, TrackInfo};

/// Group shared by audio and video in a single-AV presentation
pub const SINGLE_AV_GROUP: u32 = 2;
pub const AUDIO_PRIORITY: u8 = 1;
pub const VIDEO_PRIORITY: u8 = 2;

/// Whether the presentation is one audio and/or one video stream with at
/// most one scene, object-descriptor and text stream around them.
///
/// Multi-sample systems tracks, still images (single-sample visual tracks)
/// and unknown media disqualify. Hint tracks are ignored.
pub fn is_single_av(tracks: &[TrackInfo]) -> bool {
    let (mut nb_visual, mut nb_audio, mut nb_scene, mut nb_od, mut nb_text) = (0, 0, 0, 0, 0);

    for track in tracks {
        match track.kind {
            MediaKind::Scene if track.sample_count > 1 => return false,
            MediaKind::Scene => nb_scene += 1,
            MediaKind::ObjectDescriptor if track.sample_count > 1 => return false,
            MediaKind::ObjectDescriptor => nb_od += 1,
            MediaKind::Text | MediaKind::Subtitle => nb_text += 1,
            MediaKind::Audio => nb_audio += 1,
            MediaKind::Visual if track.sample_count == 1 => return false,
            MediaKind::Visual => nb_visual += 1,
            MediaKind::Hint => {}
            MediaKind::Other(_) => return false,
        }
    }

    if nb_scene > 1 || nb_od > 1 || nb_text > 1 {
        return false;
    }
    (nb_visual == 1 && nb_audio <= 1) || (nb_audio == 1 && nb_visual <= 1)
}

/// Assigns delivery group and priority to eligible tracks in order
#[derive(Debug, Clone)]
pub struct GroupingAssigner {
    single_av: bool,
    group: u32,
    priority: u8,
}

impl GroupingAssigner {
    pub fn new(single_av: bool) -> Self {
        Self {
            single_av,
            group: 0,
            priority: 0,
        }
    }

    pub fn is_single_av(&self) -> bool {
        self.single_av
    }

    /// Return `(group, priority)` for the next eligible track.
    ///
    /// Single-AV: audio and video share one group, audio first. Other media
    /// keep the current assignment. Otherwise every track opens a new group.
    pub fn assign(&mut self, kind: MediaKind) -> (u32, u8) {
        match (self.single_av, kind) {
            (true, MediaKind::Visual) => {
                self.group = SINGLE_AV_GROUP;
                self.priority = VIDEO_PRIORITY;
            }
            (true, MediaKind::Audio) => {
                self.group = SINGLE_AV_GROUP;
                self.priority = AUDIO_PRIORITY;
            }
            (true, _) => {}
            (false, _) => {
                // one media per group; finer grouping is left to the operator
                self.group += 1;
                self.priority = 1;
            }
        }
        (self.group, self.priority)
    }
}
