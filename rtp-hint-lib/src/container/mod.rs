//! Container access
//!
//! The planner only talks to media files through the [`Container`] trait:
//! - track census (count, IDs, media kind, codec subtype, sample count)
//! - descriptor metadata (root descriptor membership, ES descriptors)
//! - single sample reads (used by the embed check)
//! - the two mutations hinting performs (default sync track, clock references)
//!
//! Two implementations are provided: [`MemoryContainer`] for manifests and
//! tests, and [`Mp4Container`] for MP4 files.

pub mod boxes;
pub mod memory;
pub mod mp4file;

pub use memory::{MemoryContainer, MemoryTrack};
pub use mp4file::Mp4Container;

use bytes::Bytes;

use crate::error::Result;
use crate::types::{EsDescriptor, FourCc, MediaKind, ProfileTag, TrackInfo};

/// Read/write access to a multi-track media container.
///
/// Tracks are addressed by their 1-based position in storage order.
pub trait Container {
    /// Number of tracks in the container
    fn track_count(&self) -> usize;

    /// Container-assigned track ID
    fn track_id(&self, pos: usize) -> u32;

    fn media_kind(&self, pos: usize) -> MediaKind;

    /// Codec family of the first sample description
    fn media_subtype(&self, pos: usize) -> FourCc;

    fn sample_count(&self, pos: usize) -> u32;

    fn is_enabled(&self, pos: usize) -> bool;

    /// Whether the track is referenced by the root (initial) object descriptor
    fn is_in_root_descriptor(&self, pos: usize) -> bool;

    /// Number of streams referenced by the root descriptor, 0 when absent
    fn root_descriptor_streams(&self) -> usize;

    fn elementary_descriptor(&self, pos: usize) -> Option<EsDescriptor>;

    /// Read sample `index` (1-based) of the track
    fn sample(&mut self, pos: usize, index: u32) -> Result<Option<Bytes>>;

    fn guessed_profile(&self) -> ProfileTag;

    /// Record the track every other track synchronizes to by default
    fn set_default_sync_track(&mut self, pos: usize);

    /// Rewrite the OCR ES ID of the track's elementary stream descriptor
    fn set_clock_reference(&mut self, pos: usize, ocr_es_id: u16) -> Result<()>;

    /// Average bitrate of the track in bits per second, when known
    fn average_bitrate(&self, _pos: usize) -> Option<u32> {
        None
    }
}

impl TrackInfo {
    /// Read the planner-relevant attributes of the track at `pos`
    pub fn load<C: Container + ?Sized>(container: &C, pos: usize) -> Self {
        Self {
            position: pos,
            track_id: container.track_id(pos),
            kind: container.media_kind(pos),
            subtype: container.media_subtype(pos),
            sample_count: container.sample_count(pos),
            enabled: container.is_enabled(pos),
            in_root_descriptor: container.is_in_root_descriptor(pos),
            descriptor: container.elementary_descriptor(pos),
        }
    }
}

/// Snapshot every track of the container, in storage order
pub fn load_tracks<C: Container + ?Sized>(container: &C) -> Vec<TrackInfo> {
    (1..=container.track_count())
        .map(|pos| TrackInfo::load(container, pos))
        .collect()
}

const MPEG4_BRANDS: &[&[u8; 4]] = &[b"isom", b"iso2", b"iso4", b"iso5", b"iso6", b"mp41", b"mp42"];

/// Guess the specification profile of a container from its brands and tracks
pub fn guess_profile(
    major_brand: FourCc,
    compatible_brands: &[FourCc],
    tracks: &[TrackInfo],
    has_root_descriptor: bool,
) -> ProfileTag {
    let brands = || std::iter::once(&major_brand).chain(compatible_brands.iter());

    if brands().any(|b| b.0.starts_with(b"3g")) {
        return ProfileTag::ThreeGpp;
    }

    if has_root_descriptor {
        let mut nb_visual = 0;
        let mut nb_audio = 0;
        let mut foreign = false;
        for track in tracks {
            match track.kind {
                MediaKind::Visual => match &track.subtype.0 {
                    b"mp4v" | b"avc1" | b"avc3" => nb_visual += 1,
                    _ => foreign = true,
                },
                MediaKind::Audio => match &track.subtype.0 {
                    b"mp4a" => nb_audio += 1,
                    _ => foreign = true,
                },
                MediaKind::Scene | MediaKind::ObjectDescriptor | MediaKind::Hint => {}
                MediaKind::Text | MediaKind::Subtitle | MediaKind::Other(_) => foreign = true,
            }
        }
        if !foreign && nb_visual <= 1 && nb_audio <= 1 && nb_visual + nb_audio > 0 {
            return ProfileTag::Isma;
        }
    }

    if brands().any(|b| MPEG4_BRANDS.contains(&&b.0)) {
        ProfileTag::Mpeg4
    } else {
        ProfileTag::Other(major_brand)
    }
}
