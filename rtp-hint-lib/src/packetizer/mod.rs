//! Packetizer collaborator interface
//!
//! A [`Packetizer`] turns one container track into an RTP hint track. The
//! planner drives each per-track handle through construct → process →
//! finalize; the handle is released when it is dropped, so at most one
//! handle is alive at any time.

pub mod estimate;

pub use estimate::EstimatingPacketizer;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::error::PacketizerError;
use crate::plan::SessionProfile;
use crate::types::stream_type;

bitflags! {
    /// RTP packing flags handed to the packetizer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PacketFlags: u32 {
        /// Aggregate several access units per packet
        const USE_MULTI = 1;
        const USE_INTERLEAVING = 1 << 1;
        /// Static stream ID instead of per-track SSRC
        const USE_STATIC_ID = 1 << 2;
        const SIGNAL_RAP = 1 << 3;
        const SIGNAL_AU_IDX = 1 << 4;
        const SIGNAL_SIZE = 1 << 5;
        const SIGNAL_TS = 1 << 6;
        const AUTO_CAROUSEL = 1 << 7;
        /// Use MPEG-4 generic payload even when a native format exists
        const FORCE_MPEG4 = 1 << 8;
        const SYSTEMS_CAROUSEL = 1 << 9;
        const USE_LATM_AAC = 1 << 10;
    }
}

/// Transport parameters for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParams {
    /// Maximum RTP packet size in bytes
    pub mtu: u32,
    /// Maximum packet duration in milliseconds, 0 for packetizer default
    pub max_ptime: u32,
    /// RTP clock rate, 0 to use the media timescale
    pub rtp_rate: u32,
    pub flags: PacketFlags,
    pub payload_type: u8,
    /// Copy sample data into the hint track instead of referencing it
    pub copy_data: bool,
    pub group: u32,
    pub priority: u8,
}

/// A packetizer bound to one track.
///
/// Dropping the handle releases it.
pub trait TrackHinter {
    /// Estimated bandwidth in kbps
    fn bandwidth(&self) -> u32;

    fn flags(&self) -> PacketFlags;

    /// RTP payload format name (e.g. "H264", "mpeg4-generic")
    fn payload_name(&self) -> String;

    /// Packetize all samples of the track
    fn process(&mut self) -> Result<(), PacketizerError>;

    /// Write the per-track transport description
    fn finalize(&mut self, has_root_descriptor: bool) -> Result<(), PacketizerError>;
}

/// Builds per-track hinters for a container type
pub trait Packetizer<C: Container + ?Sized> {
    /// Bind a hinter to the track at `pos`.
    ///
    /// `Ok(None)` means the packetizer has no payload format for this track.
    fn construct<'a>(
        &'a mut self,
        container: &'a mut C,
        pos: usize,
        params: &TransportParams,
    ) -> Result<Option<Box<dyn TrackHinter + 'a>>, PacketizerError>;

    /// Whether `construct` would build a hinter for the track at `pos`.
    ///
    /// Only consulted when no payload type is left, to
    /// tell declined tracks apart from tracks that missed out on one.
    fn supports(&self, _container: &C, _pos: usize) -> bool {
        true
    }

    /// Whether a single access unit can be carried inline in the session
    /// description instead of being streamed
    fn can_embed(&self, data: &[u8], stream_type: u8) -> bool {
        can_embed_data(data, stream_type)
    }

    /// Called once after all tracks, with the aggregate session profile
    fn finalize_session(
        &mut self,
        _container: &mut C,
        _session: &SessionProfile,
    ) -> Result<(), PacketizerError> {
        Ok(())
    }
}

/// Data URLs embedded in the session description must stay below this size
pub const MAX_EMBEDDED_URL_LEN: usize = 255;

/// MIME data-URL header used to embed an access unit of the given stream type
pub fn data_url_prefix(stream_type: u8) -> &'static str {
    match stream_type {
        stream_type::OBJECT_DESCRIPTOR => "data:application/mpeg4-od-au;base64,",
        stream_type::SCENE => "data:application/mpeg4-bifs-au;base64,",
        _ => "data:application/mpeg4-es-au;base64,",
    }
}

/// Length of the padded base64 encoding of `len` bytes
pub fn base64_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Whether `data` fits in a data URL once base64 encoded
pub fn can_embed_data(data: &[u8], stream_type: u8) -> bool {
    if data.is_empty() {
        return false;
    }
    base64_len(data.len()) + data_url_prefix(stream_type).len() < MAX_EMBEDDED_URL_LEN
}

/// RTP payload format name for a codec subtype
pub fn payload_name_for(subtype: &[u8; 4], flags: PacketFlags) -> &'static str {
    if flags.contains(PacketFlags::FORCE_MPEG4) {
        return "mpeg4-generic";
    }
    match subtype {
        b"avc1" | b"avc3" => "H264",
        b"hvc1" | b"hev1" => "H265",
        b"mp4v" => "MP4V-ES",
        b"mp4a" if flags.contains(PacketFlags::USE_LATM_AAC) => "MP4A-LATM",
        b"s263" => "H263-1998",
        b"samr" => "AMR",
        b"sawb" => "AMR-WB",
        b"tx3g" | b"text" => "3gpp-tt",
        b".mp3" => "MPA",
        _ => "mpeg4-generic",
    }
}
