//! Dry-run packetizer: estimates bandwidth and payload formats without
//! writing any packets

use super::{payload_name_for, Packetizer, PacketFlags, TrackHinter, TransportParams};
use crate::container::Container;
use crate::error::PacketizerError;
use crate::types::MediaKind;

/// IPv4 (20) + UDP (8) + RTP (12) header bytes per packet
pub const PACKET_OVERHEAD: u32 = 40;

/// Smallest MTU that leaves room for payload after the headers
pub const MIN_MTU: u32 = 64;

/// Packetizer that only estimates what a real one would produce
#[derive(Debug, Default)]
pub struct EstimatingPacketizer {
    tracks_built: usize,
}

impl EstimatingPacketizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hinters constructed so far
    pub fn tracks_built(&self) -> usize {
        self.tracks_built
    }
}

/// Bandwidth in kbps including per-packet header overhead
pub fn estimate_bandwidth(bitrate: u32, mtu: u32) -> u32 {
    if bitrate == 0 || mtu <= PACKET_OVERHEAD {
        return 0;
    }
    let with_headers = bitrate as u64 * mtu as u64 / (mtu - PACKET_OVERHEAD) as u64;
    with_headers.div_ceil(1000) as u32
}

struct EstimatedTrack {
    bandwidth: u32,
    flags: PacketFlags,
    payload_name: &'static str,
    sample_count: u32,
}

impl TrackHinter for EstimatedTrack {
    fn bandwidth(&self) -> u32 {
        self.bandwidth
    }

    fn flags(&self) -> PacketFlags {
        self.flags
    }

    fn payload_name(&self) -> String {
        self.payload_name.to_string()
    }

    fn process(&mut self) -> Result<(), PacketizerError> {
        if self.sample_count == 0 {
            return Err(PacketizerError::BadSample {
                sample: 1,
                reason: "track has no samples".to_string(),
            });
        }
        Ok(())
    }

    fn finalize(&mut self, _has_root_descriptor: bool) -> Result<(), PacketizerError> {
        Ok(())
    }
}

impl<C: Container + ?Sized> Packetizer<C> for EstimatingPacketizer {
    fn supports(&self, container: &C, pos: usize) -> bool {
        !matches!(container.media_kind(pos), MediaKind::Hint | MediaKind::Other(_))
    }

    fn construct<'a>(
        &'a mut self,
        container: &'a mut C,
        pos: usize,
        params: &TransportParams,
    ) -> Result<Option<Box<dyn TrackHinter + 'a>>, PacketizerError> {
        if params.mtu < MIN_MTU {
            return Err(PacketizerError::InvalidParameters(format!(
                "MTU {} is below the minimum of {} bytes",
                params.mtu, MIN_MTU
            )));
        }

        if !self.supports(container, pos) {
            return Ok(None);
        }
        let kind = container.media_kind(pos);

        let mut flags = params.flags;
        if kind.is_systems() && flags.contains(PacketFlags::AUTO_CAROUSEL) {
            flags |= PacketFlags::SYSTEMS_CAROUSEL;
        }

        let subtype = container.media_subtype(pos);
        let bitrate = container.average_bitrate(pos).unwrap_or(0);
        self.tracks_built += 1;

        Ok(Some(Box::new(EstimatedTrack {
            bandwidth: estimate_bandwidth(bitrate, params.mtu),
            flags,
            payload_name: payload_name_for(subtype.as_bytes(), flags),
            sample_count: container.sample_count(pos),
        })))
    }
}
