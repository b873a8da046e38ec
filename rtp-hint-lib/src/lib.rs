pub(crate) mod api;
pub mod container;
pub(crate) mod error;
pub mod packetizer;
pub mod plan;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use api::*;
pub use container::{Container, MemoryContainer, MemoryTrack, Mp4Container};
pub use error::{HintError, PacketizerError, Result};
pub use packetizer::{EstimatingPacketizer, PacketFlags, Packetizer, TrackHinter, TransportParams};
pub use plan::{
    plan_hints, HintOptions, HintPlan, HintPlanEntry, HintVerdict, PlanWarning, ProfileMode,
    SessionProfile,
};
pub use types::{EsDescriptor, FourCc, MediaKind, ProfileTag, TrackInfo};
