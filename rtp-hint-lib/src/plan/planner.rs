//! Hint planner - walks all tracks once and decides how each is streamed

use super::clock::{force_clock_references, ClockReferenceTracker};
use super::eligibility::{check_eligibility, Eligibility};
use super::embed::{embed_check_applies, should_embed};
use super::grouping::{is_single_av, GroupingAssigner};
use super::payload::PayloadAllocator;
use super::session::{finalize_session, BandwidthAggregator};
use super::sync::select_sync_track;
use super::{HintOptions, HintPlan, HintPlanEntry, HintVerdict, PlanWarning, SkippedTrack};
use crate::container::{load_tracks, Container};
use crate::error::{HintError, PacketizerError, Result};
use crate::packetizer::{PacketFlags, Packetizer, TransportParams};
use crate::types::TrackInfo;

/// What the packetizer reported for a constructed track
struct HintedTrack {
    bandwidth: u32,
    flags: PacketFlags,
    payload_name: String,
}

enum TrackFailure {
    Construction(PacketizerError),
    Processing(HintedTrack, PacketizerError),
    Finalization(HintedTrack, PacketizerError),
}

/// Mutable state of one planning run.
///
/// Created fresh for every run; tracks are visited in storage order.
#[derive(Debug)]
pub struct PlannerState {
    pub grouping: GroupingAssigner,
    pub clock: ClockReferenceTracker,
    pub payload: PayloadAllocator,
    pub bandwidth: BandwidthAggregator,
    /// Tracks hinted without error so far
    pub completed: usize,
    entries: Vec<HintPlanEntry>,
    skipped: Vec<SkippedTrack>,
    warnings: Vec<PlanWarning>,
}

impl PlannerState {
    pub fn new(single_av: bool) -> Self {
        Self {
            grouping: GroupingAssigner::new(single_av),
            clock: ClockReferenceTracker::new(),
            payload: PayloadAllocator::new(),
            bandwidth: BandwidthAggregator::new(),
            completed: 0,
            entries: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Run one track through filter → group → clock check → embed check →
    /// packetizer.
    pub fn visit<C, P>(
        &mut self,
        container: &mut C,
        packetizer: &mut P,
        track: &TrackInfo,
        options: &HintOptions,
        has_root_descriptor: bool,
    ) -> Result<()>
    where
        C: Container + ?Sized,
        P: Packetizer<C> + ?Sized,
    {
        let profile = container.guessed_profile();
        match check_eligibility(track, profile) {
            Eligibility::Eligible => {}
            reason => {
                if reason == Eligibility::SkipDisabled {
                    tracing::warn!("Track ID {} disabled - skipping hint", track.track_id);
                    self.warnings.push(PlanWarning::TrackDisabled {
                        track_id: track.track_id,
                    });
                } else {
                    tracing::debug!("Track ID {} skipped: {:?}", track.track_id, reason);
                }
                self.skipped.push(SkippedTrack {
                    track_id: track.track_id,
                    position: track.position,
                    reason,
                });
                return Ok(());
            }
        }

        let (group, priority) = self.grouping.assign(track.kind);
        if let Some(descriptor) = &track.descriptor {
            self.clock.observe(descriptor);
        }

        let mut entry = HintPlanEntry {
            track_id: track.track_id,
            position: track.position,
            kind: track.kind,
            subtype: track.subtype,
            group,
            priority,
            payload_type: None,
            payload_name: None,
            bandwidth: 0,
            flags: PacketFlags::empty(),
            verdict: HintVerdict::Hinted,
        };

        if embed_check_applies(track, options.regular_iod) {
            let sample = container.sample(track.position, 1)?;
            let embed = should_embed(track, sample.as_deref(), |data, stream_type| {
                packetizer.can_embed(data, stream_type)
            });
            if embed {
                tracing::info!(
                    "Track ID {} carried in the session description, not hinted",
                    track.track_id
                );
                entry.verdict = HintVerdict::Embedded;
                self.entries.push(entry);
                return Ok(());
            }
        }

        let Some(payload_type) = self.payload.current() else {
            if !packetizer.supports(container, track.position) {
                tracing::warn!("No RTP payload format for track ID {}", track.track_id);
                self.warnings.push(PlanWarning::NoPayloadFormat {
                    track_id: track.track_id,
                });
                entry.verdict = HintVerdict::Declined;
                self.entries.push(entry);
                return Ok(());
            }
            tracing::error!("No dynamic payload type left for track ID {}", track.track_id);
            if self.completed == 0 {
                return Err(HintError::PayloadTypesExhausted {
                    track_id: track.track_id,
                });
            }
            self.warnings.push(PlanWarning::PayloadTypesExhausted {
                track_id: track.track_id,
            });
            entry.verdict = HintVerdict::ConstructionFailed;
            self.entries.push(entry);
            return Ok(());
        };

        let mut flags = options.base_flags;
        if options.interleave {
            flags |= PacketFlags::USE_INTERLEAVING;
        }
        // OD streams must carry their data, not sample references
        let od_stream = track
            .descriptor
            .map(|d| d.is_object_descriptor_stream())
            .unwrap_or(false);
        let params = TransportParams {
            mtu: options.mtu,
            max_ptime: options.max_ptime,
            rtp_rate: options.rtp_rate,
            flags,
            payload_type,
            copy_data: options.copy_data || od_stream,
            group,
            priority,
        };

        match hint_track(container, packetizer, track, &params, has_root_descriptor) {
            Ok(Some(hinted)) => {
                self.payload.advance();
                self.bandwidth.add(hinted.bandwidth);
                self.completed += 1;
                entry.payload_type = Some(payload_type);
                entry.bandwidth = hinted.bandwidth;
                entry.flags = hinted.flags;
                entry.payload_name = Some(hinted.payload_name);
            }
            Ok(None) => {
                tracing::warn!("No RTP payload format for track ID {}", track.track_id);
                self.warnings.push(PlanWarning::NoPayloadFormat {
                    track_id: track.track_id,
                });
                entry.verdict = HintVerdict::Declined;
            }
            Err(TrackFailure::Construction(source)) => {
                tracing::error!(
                    "Cannot create hinter for track ID {}: {}",
                    track.track_id,
                    source
                );
                if self.completed == 0 {
                    return Err(HintError::ConstructionFailed {
                        track_id: track.track_id,
                        source,
                    });
                }
                self.warnings.push(PlanWarning::ConstructionFailed {
                    track_id: track.track_id,
                    message: source.to_string(),
                });
                entry.verdict = HintVerdict::ConstructionFailed;
            }
            Err(TrackFailure::Processing(hinted, source))
            | Err(TrackFailure::Finalization(hinted, source))
                if self.completed > 0 =>
            {
                tracing::error!("Error while hinting track ID {}: {}", track.track_id, source);
                // the partial hint track keeps its payload type
                self.payload.advance();
                self.warnings.push(PlanWarning::ProcessingFailed {
                    track_id: track.track_id,
                    message: source.to_string(),
                });
                entry.payload_type = Some(payload_type);
                entry.flags = hinted.flags;
                entry.payload_name = Some(hinted.payload_name);
                entry.verdict = HintVerdict::ProcessingFailed;
            }
            Err(TrackFailure::Processing(_, source)) => {
                tracing::error!("Error while hinting track ID {}: {}", track.track_id, source);
                return Err(HintError::ProcessingFailed {
                    track_id: track.track_id,
                    source,
                });
            }
            Err(TrackFailure::Finalization(_, source)) => {
                tracing::error!(
                    "Error while finalizing hint track ID {}: {}",
                    track.track_id,
                    source
                );
                return Err(HintError::FinalizationFailed {
                    track_id: track.track_id,
                    source,
                });
            }
        }

        self.entries.push(entry);
        Ok(())
    }
}

/// Construct, process and finalize one track. The hinter is released when
/// this returns, whatever the outcome.
fn hint_track<C, P>(
    container: &mut C,
    packetizer: &mut P,
    track: &TrackInfo,
    params: &TransportParams,
    has_root_descriptor: bool,
) -> std::result::Result<Option<HintedTrack>, TrackFailure>
where
    C: Container + ?Sized,
    P: Packetizer<C> + ?Sized,
{
    let mut hinter = match packetizer.construct(container, track.position, params) {
        Ok(Some(hinter)) => hinter,
        Ok(None) => return Ok(None),
        Err(e) => return Err(TrackFailure::Construction(e)),
    };

    let hinted = HintedTrack {
        bandwidth: hinter.bandwidth(),
        flags: hinter.flags(),
        payload_name: hinter.payload_name(),
    };
    tracing::info!(
        "Hinting track ID {} - Type \"{}:{}\" ({}) - BW {} kbps",
        track.track_id,
        track.kind,
        track.subtype,
        hinted.payload_name,
        hinted.bandwidth
    );
    if hinted.flags.contains(PacketFlags::SYSTEMS_CAROUSEL) {
        tracing::info!("MPEG-4 Systems stream carousel enabled");
    }

    if let Err(e) = hinter.process() {
        return Err(TrackFailure::Processing(hinted, e));
    }
    if let Err(e) = hinter.finalize(has_root_descriptor) {
        return Err(TrackFailure::Finalization(hinted, e));
    }
    Ok(Some(hinted))
}

/// Plan RTP hinting for every track of `container`.
///
/// Tracks are visited once in storage order. The run aborts only when the
/// first track to be packetized fails; later failures are recorded as
/// warnings on the returned plan.
pub fn plan_hints<C, P>(
    container: &mut C,
    packetizer: &mut P,
    options: &HintOptions,
) -> Result<HintPlan>
where
    C: Container + ?Sized,
    P: Packetizer<C> + ?Sized,
{
    if options.force_ocr {
        force_clock_references(container)?;
    }

    let tracks = load_tracks(container);
    let has_root_descriptor = container.root_descriptor_streams() > 0;
    let single_av = options.single_group || is_single_av(&tracks);
    tracing::debug!(
        "Planning {} tracks: profile={}, root descriptor={}, single AV={}",
        tracks.len(),
        container.guessed_profile(),
        has_root_descriptor,
        single_av
    );

    let sync_track = select_sync_track(&tracks).map(|t| (t.position, t.track_id));
    if let Some((pos, track_id)) = sync_track {
        tracing::debug!("Track ID {} is the default sync track", track_id);
        container.set_default_sync_track(pos);
    }

    let mut state = PlannerState::new(single_av);
    for track in &tracks {
        state.visit(container, packetizer, track, options, has_root_descriptor)?;
    }

    let session = finalize_session(
        &state.bandwidth,
        has_root_descriptor,
        options.regular_iod,
        state.clock.is_single_clock(),
    );
    packetizer
        .finalize_session(container, &session)
        .map_err(HintError::SessionFinalization)?;

    let mut warnings = state.warnings;
    if !session.single_clock {
        warnings.push(PlanWarning::InconsistentTimeline);
    }

    Ok(HintPlan {
        entries: state.entries,
        skipped: state.skipped,
        sync_track: sync_track.map(|(_, id)| id),
        session,
        warnings,
    })
}
