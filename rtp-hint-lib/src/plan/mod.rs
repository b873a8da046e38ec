//! Hint planning
//!
//! Decides per track whether and how it is hinted for RTP streaming:
//! - eligibility (empty, disabled, hint, profile-restricted tracks)
//! - the sync track anchoring the shared clock
//! - clock reference consistency across tracks
//! - delivery group and priority
//! - inlining single-sample systems tracks instead of streaming them
//! - dynamic payload type allocation
//! - session bandwidth and descriptor profile

pub mod clock;
pub mod eligibility;
pub mod embed;
pub mod grouping;
pub mod payload;
pub mod planner;
pub mod session;
pub mod sync;

pub use eligibility::Eligibility;
pub use planner::{plan_hints, PlannerState};
pub use session::{ProfileMode, SessionProfile};

use serde::{Deserialize, Serialize};

use crate::packetizer::PacketFlags;
use crate::types::{FourCc, MediaKind};

/// Default RTP packet size
pub const DEFAULT_MTU: u32 = 1450;

/// Options controlling a planning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintOptions {
    /// Maximum RTP packet size in bytes
    pub mtu: u32,
    /// Maximum packet duration in milliseconds, 0 for packetizer default
    pub max_ptime: u32,
    /// RTP clock rate, 0 to use the media timescale
    pub rtp_rate: u32,
    /// Flags applied to every hinted track
    pub base_flags: PacketFlags,
    /// Copy sample data into hint tracks
    pub copy_data: bool,
    /// Interleave access units in RTP packets
    pub interleave: bool,
    /// Keep a regular object descriptor profile: disables sample embedding
    pub regular_iod: bool,
    /// Put audio and video in one delivery group regardless of track layout
    pub single_group: bool,
    /// Rewrite clock references so every stream follows the root track
    pub force_ocr: bool,
}

impl Default for HintOptions {
    fn default() -> Self {
        Self {
            mtu: DEFAULT_MTU,
            max_ptime: 0,
            rtp_rate: 0,
            base_flags: PacketFlags::empty(),
            copy_data: false,
            interleave: false,
            regular_iod: false,
            single_group: false,
            force_ocr: false,
        }
    }
}

/// Outcome for a track that passed the eligibility filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintVerdict {
    /// The single sample is carried inline in the session description
    Embedded,
    /// An RTP hint track was produced
    Hinted,
    /// The packetizer has no payload format for this track
    Declined,
    /// Packetizer construction failed; no payload type consumed
    ConstructionFailed,
    /// Processing or finalization failed after construction
    ProcessingFailed,
}

/// Plan for one eligible track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintPlanEntry {
    pub track_id: u32,
    /// 1-based storage position
    pub position: usize,
    pub kind: MediaKind,
    pub subtype: FourCc,
    /// Delivery group, 0 for none
    pub group: u32,
    pub priority: u8,
    pub payload_type: Option<u8>,
    pub payload_name: Option<String>,
    /// Bandwidth in kbps
    pub bandwidth: u32,
    pub flags: PacketFlags,
    pub verdict: HintVerdict,
}

impl HintPlanEntry {
    pub fn is_hinted(&self) -> bool {
        self.verdict == HintVerdict::Hinted
    }
}

/// A track the eligibility filter removed from the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTrack {
    pub track_id: u32,
    pub position: usize,
    pub reason: Eligibility,
}

/// Non-fatal conditions found while planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "warning")]
pub enum PlanWarning {
    #[error("at least 2 timelines found in the file; this may not be supported by servers/players")]
    InconsistentTimeline,

    #[error("track ID {track_id} disabled - skipping hint")]
    TrackDisabled { track_id: u32 },

    #[error("no RTP payload format for track ID {track_id}")]
    NoPayloadFormat { track_id: u32 },

    #[error("cannot create hinter for track ID {track_id}: {message}")]
    ConstructionFailed { track_id: u32, message: String },

    #[error("error while hinting track ID {track_id}: {message}")]
    ProcessingFailed { track_id: u32, message: String },

    #[error("no dynamic payload type left for track ID {track_id}")]
    PayloadTypesExhausted { track_id: u32 },
}

/// Result of a planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintPlan {
    pub entries: Vec<HintPlanEntry>,
    pub skipped: Vec<SkippedTrack>,
    /// Track ID designated as synchronization anchor
    pub sync_track: Option<u32>,
    pub session: SessionProfile,
    pub warnings: Vec<PlanWarning>,
}

impl HintPlan {
    /// Entries that produced a hint track
    pub fn hinted(&self) -> impl Iterator<Item = &HintPlanEntry> {
        self.entries.iter().filter(|e| e.is_hinted())
    }

    /// Payload types allocated in the run, in track order
    pub fn payload_types(&self) -> Vec<u8> {
        self.entries.iter().filter_map(|e| e.payload_type).collect()
    }

    pub fn entry(&self, track_id: u32) -> Option<&HintPlanEntry> {
        self.entries.iter().find(|e| e.track_id == track_id)
    }
}
