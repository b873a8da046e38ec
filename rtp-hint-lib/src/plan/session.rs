//! Session bandwidth and descriptor profile

use serde::{Deserialize, Serialize};

/// How the object descriptor is carried in the session description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    /// No root descriptor in the session
    None,
    /// Minimal descriptor with only the streams needed for playback (ISMA style)
    MinimalAggregation,
    /// Complete descriptor with all elementary stream descriptors
    FullDescriptor,
}

/// Aggregate result of a planning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Sum of the bandwidth of completed hint tracks, in kbps
    pub total_bandwidth: u64,
    pub mode: ProfileMode,
    /// All hinted streams share one clock reference
    pub single_clock: bool,
}

/// Running sum of hinted track bandwidth
#[derive(Debug, Clone, Default)]
pub struct BandwidthAggregator {
    total: u64,
}

impl BandwidthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kbps: u32) {
        self.total += kbps as u64;
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Pick the descriptor profile carried by the session
pub fn profile_mode(has_root_descriptor: bool, regular_iod: bool) -> ProfileMode {
    match (has_root_descriptor, regular_iod) {
        (false, _) => ProfileMode::None,
        (true, false) => ProfileMode::MinimalAggregation,
        (true, true) => ProfileMode::FullDescriptor,
    }
}

/// Build the session profile and report a broken timeline
pub fn finalize_session(
    bandwidth: &BandwidthAggregator,
    has_root_descriptor: bool,
    regular_iod: bool,
    single_clock: bool,
) -> SessionProfile {
    let profile = SessionProfile {
        total_bandwidth: bandwidth.total(),
        mode: profile_mode(has_root_descriptor, regular_iod),
        single_clock,
    };
    if !single_clock {
        tracing::warn!(
            "at least 2 timelines found in the file; this may not be supported by servers/players"
        );
    }
    tracing::info!(
        "Session: {} kbps, descriptor profile {:?}",
        profile.total_bandwidth,
        profile.mode
    );
    profile
}
