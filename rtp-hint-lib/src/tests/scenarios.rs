use super::fixtures::*;
use crate::container::{MemoryContainer, MemoryTrack};
use crate::error::HintError;
use crate::packetizer::PacketFlags;
use crate::plan::{
    plan_hints, Eligibility, HintOptions, HintVerdict, PlanWarning, ProfileMode,
};
use crate::types::{stream_type, MediaKind, ProfileTag};

fn run(container: &mut MemoryContainer, packetizer: &mut MockPacketizer) -> crate::HintPlan {
    plan_hints(container, packetizer, &HintOptions::default()).unwrap()
}

#[test]
fn test_single_track_has_no_sync_anchor() {
    let mut container = MemoryContainer::new().with_track(od_track(1, &[0u8; 8]));
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert_eq!(plan.sync_track, None);
    assert_eq!(container.default_sync_track, None);
}

#[test]
fn test_root_systems_track_is_sync_anchor() {
    let mut container = MemoryContainer::new()
        .with_track(video(1, 100))
        .with_track(od_track(2, &[0u8; 8]))
        .with_track(audio(3, 100));
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert_eq!(plan.sync_track, Some(2));
    assert_eq!(container.default_sync_track, Some(2));
}

#[test]
fn test_payload_types_increase_from_96() {
    let mut container = MemoryContainer::new()
        .with_track(od_track(1, &[0u8; 8]))
        .with_track(video(2, 100))
        .with_track(hint(3, 50))
        .with_track(audio(4, 0))
        .with_track(audio(5, 100))
        .with_track(MemoryTrack::new(6, MediaKind::Text).subtype(b"tx3g").samples(3));
    let plan = run(&mut container, &mut MockPacketizer::new());

    assert_eq!(plan.payload_types(), vec![96, 97, 98]);
    assert_eq!(plan.entry(1).unwrap().payload_type, None);
    assert_eq!(plan.entry(2).unwrap().payload_type, Some(96));
    assert_eq!(plan.entry(5).unwrap().payload_type, Some(97));
    assert_eq!(plan.entry(6).unwrap().payload_type, Some(98));
    assert!(plan.entry(3).is_none());
    assert!(plan.entry(4).is_none());
}

#[test]
fn test_single_av_grouping() {
    let mut container = av_container();
    let plan = run(&mut container, &mut MockPacketizer::new());

    let video = plan.entry(1).unwrap();
    let audio = plan.entry(2).unwrap();
    assert_eq!((video.group, video.priority), (2, 2));
    assert_eq!((audio.group, audio.priority), (2, 1));
}

#[test]
fn test_single_group_option_forces_shared_group() {
    let mut container = av_container().with_track(audio(3, 100));
    let options = HintOptions {
        single_group: true,
        ..Default::default()
    };
    let plan = plan_hints(&mut container, &mut MockPacketizer::new(), &options).unwrap();
    assert!(plan.entries.iter().all(|e| e.group == 2));
}

#[test]
fn test_one_group_per_track_otherwise() {
    let mut container = av_container().with_track(audio(3, 100));
    let plan = run(&mut container, &mut MockPacketizer::new());

    let groups: Vec<_> = plan.entries.iter().map(|e| (e.group, e.priority)).collect();
    assert_eq!(groups, vec![(1, 1), (2, 1), (3, 1)]);
}

#[test]
fn test_visual_audio_hint_scenario() {
    let mut container = av_container().with_track(hint(3, 50));
    let plan = run(&mut container, &mut MockPacketizer::new());

    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].track_id, 3);
    assert_eq!(plan.skipped[0].reason, Eligibility::SkipHintMedia);
    assert_eq!(plan.entry(1).unwrap().group, 2);
    assert_eq!(plan.entry(2).unwrap().group, 2);
    assert_eq!(plan.payload_types(), vec![96, 97]);
}

#[test]
fn test_single_od_sample_is_embedded() {
    let mut container = MemoryContainer::new().with_track(od_track(1, &[0x01, 0x02, 0x03, 0x04]));
    let mut packetizer = MockPacketizer::new();
    let plan = run(&mut container, &mut packetizer);

    assert!(plan.payload_types().is_empty());
    assert_eq!(plan.session.total_bandwidth, 0);
    assert_eq!(plan.entry(1).unwrap().verdict, HintVerdict::Embedded);
    assert_eq!(plan.entry(1).unwrap().bandwidth, 0);
    assert!(packetizer.events().is_empty());
    assert_eq!(plan.session.mode, ProfileMode::MinimalAggregation);
}

#[test]
fn test_large_od_sample_is_streamed() {
    let mut container = MemoryContainer::new().with_track(od_track(1, &[0u8; 400]));
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert_eq!(plan.entry(1).unwrap().verdict, HintVerdict::Hinted);
    assert_eq!(plan.payload_types(), vec![96]);
}

#[test]
fn test_regular_iod_disables_embedding() {
    let mut container = MemoryContainer::new().with_track(od_track(1, &[0u8; 8]));
    let options = HintOptions {
        regular_iod: true,
        ..Default::default()
    };
    let plan = plan_hints(&mut container, &mut MockPacketizer::new(), &options).unwrap();
    assert_eq!(plan.entry(1).unwrap().payload_type, Some(96));
    assert_eq!(plan.session.mode, ProfileMode::FullDescriptor);
}

#[test]
fn test_unreadable_sample_is_streamed() {
    // declares one sample but stores none
    let track = MemoryTrack::new(1, MediaKind::Scene)
        .subtype(b"mp4s")
        .in_root()
        .descriptor(esd(1, 0, stream_type::SCENE))
        .samples(1);
    let mut container = MemoryContainer::new().with_track(track);
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert_eq!(plan.entry(1).unwrap().payload_type, Some(96));
}

fn clock_container(ocr: [u16; 3]) -> MemoryContainer {
    MemoryContainer::new()
        .with_track(video(1, 100).descriptor(esd(1, ocr[0], stream_type::VISUAL)))
        .with_track(audio(2, 100).descriptor(esd(2, ocr[1], stream_type::AUDIO)))
        .with_track(audio(3, 100).descriptor(esd(3, ocr[2], stream_type::AUDIO)))
}

#[test]
fn test_two_timelines_warn() {
    let mut container = clock_container([5, 5, 7]);
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert!(!plan.session.single_clock);
    assert!(plan.warnings.contains(&PlanWarning::InconsistentTimeline));
    // the warning never blocks output
    assert_eq!(plan.payload_types(), vec![96, 97, 98]);
}

#[test]
fn test_shared_timeline() {
    let mut container = clock_container([5, 5, 5]);
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert!(plan.session.single_clock);
    assert!(!plan.warnings.contains(&PlanWarning::InconsistentTimeline));

    let mut container = MemoryContainer::new()
        .with_track(video(1, 100).descriptor(esd(4, 0, stream_type::VISUAL)))
        .with_track(audio(2, 100).descriptor(esd(4, 0, stream_type::AUDIO)))
        .with_track(audio(3, 100).descriptor(esd(4, 0, stream_type::AUDIO)));
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert!(plan.session.single_clock);
}

#[test]
fn test_force_ocr_unifies_timelines() {
    let build = || {
        MemoryContainer::new()
            .with_track(od_track(1, &[0u8; 8]))
            .with_track(video(2, 100).descriptor(esd(2, 9, stream_type::VISUAL)))
            .with_track(audio(3, 100).descriptor(esd(3, 7, stream_type::AUDIO)))
    };

    let plan = run(&mut build(), &mut MockPacketizer::new());
    assert!(!plan.session.single_clock);

    let mut container = build();
    let options = HintOptions {
        force_ocr: true,
        ..Default::default()
    };
    let plan = plan_hints(&mut container, &mut MockPacketizer::new(), &options).unwrap();
    assert!(plan.session.single_clock);
    assert_eq!(container.tracks[2].descriptor.unwrap().ocr_es_id, 1);
}

#[test]
fn test_total_bandwidth_counts_completed_tracks() {
    let mut container = av_container().with_track(audio(3, 100));
    let mut packetizer = MockPacketizer::new()
        .with_bandwidth(1, 500)
        .with_bandwidth(2, 64)
        .with_bandwidth(3, 1000)
        .failing(3, FailAt::Process);
    let plan = run(&mut container, &mut packetizer);

    assert_eq!(plan.session.total_bandwidth, 564);
    assert_eq!(packetizer.session.unwrap().total_bandwidth, 564);

    let failed = plan.entry(3).unwrap();
    assert_eq!(failed.verdict, HintVerdict::ProcessingFailed);
    assert_eq!(failed.bandwidth, 0);
    // the failed track still consumed its payload type
    assert_eq!(failed.payload_type, Some(98));
    assert!(matches!(
        plan.warnings[0],
        PlanWarning::ProcessingFailed { track_id: 3, .. }
    ));
}

#[test]
fn test_finalize_failure_after_success_continues() {
    let mut container = av_container().with_track(audio(3, 100));
    let mut packetizer = MockPacketizer::new().failing(2, FailAt::Finalize);
    let plan = run(&mut container, &mut packetizer);

    assert_eq!(plan.entry(2).unwrap().verdict, HintVerdict::ProcessingFailed);
    assert_eq!(plan.entry(3).unwrap().payload_type, Some(98));
    assert_eq!(plan.session.total_bandwidth, 200);
}

#[test]
fn test_first_construction_failure_aborts() {
    let mut container = av_container();
    let mut packetizer = MockPacketizer::new().failing(1, FailAt::Construct);
    let err = plan_hints(&mut container, &mut packetizer, &HintOptions::default()).unwrap_err();
    assert!(matches!(err, HintError::ConstructionFailed { track_id: 1, .. }));
}

#[test]
fn test_later_construction_failure_is_skipped() {
    let mut container = av_container().with_track(audio(3, 100));
    let mut packetizer = MockPacketizer::new().failing(2, FailAt::Construct);
    let plan = run(&mut container, &mut packetizer);

    let failed = plan.entry(2).unwrap();
    assert_eq!(failed.verdict, HintVerdict::ConstructionFailed);
    assert_eq!(failed.payload_type, None);
    // no payload type consumed by the failed construction
    assert_eq!(plan.entry(3).unwrap().payload_type, Some(97));
    assert!(matches!(
        plan.warnings[0],
        PlanWarning::ConstructionFailed { track_id: 2, .. }
    ));
}

#[test]
fn test_first_processing_failure_aborts_and_releases() {
    let mut container = av_container();
    let mut packetizer = MockPacketizer::new().failing(1, FailAt::Process);
    let err = plan_hints(&mut container, &mut packetizer, &HintOptions::default()).unwrap_err();

    assert!(matches!(err, HintError::ProcessingFailed { track_id: 1, .. }));
    assert_eq!(packetizer.live_handles(), 0);
    assert_eq!(
        packetizer.events(),
        vec!["construct 1", "process 1", "release 1"]
    );
}

#[test]
fn test_first_finalization_failure_aborts() {
    let mut container = av_container();
    let mut packetizer = MockPacketizer::new().failing(1, FailAt::Finalize);
    let err = plan_hints(&mut container, &mut packetizer, &HintOptions::default()).unwrap_err();
    assert!(matches!(err, HintError::FinalizationFailed { track_id: 1, .. }));
    assert_eq!(packetizer.live_handles(), 0);
}

#[test]
fn test_one_hinter_alive_at_a_time() {
    let mut container = av_container();
    let mut packetizer = MockPacketizer::new();
    run(&mut container, &mut packetizer);

    assert_eq!(packetizer.max_live_handles(), 1);
    assert_eq!(packetizer.live_handles(), 0);
    assert_eq!(
        packetizer.events(),
        vec![
            "construct 1",
            "process 1",
            "finalize 1 root=false",
            "release 1",
            "construct 2",
            "process 2",
            "finalize 2 root=false",
            "release 2",
        ]
    );
}

#[test]
fn test_finalize_sees_root_descriptor() {
    let mut container = MemoryContainer::new()
        .with_track(od_track(1, &[0u8; 8]))
        .with_track(video(2, 100).in_root());
    let mut packetizer = MockPacketizer::new();
    run(&mut container, &mut packetizer);
    assert!(packetizer
        .events()
        .contains(&"finalize 2 root=true".to_string()));
}

#[test]
fn test_declined_track_consumes_no_payload_type() {
    let mut container = av_container();
    let mut packetizer = MockPacketizer::new().declining(1);
    let plan = run(&mut container, &mut packetizer);

    assert_eq!(plan.entry(1).unwrap().verdict, HintVerdict::Declined);
    assert_eq!(plan.entry(2).unwrap().payload_type, Some(96));
    assert_eq!(
        plan.warnings,
        vec![PlanWarning::NoPayloadFormat { track_id: 1 }]
    );
}

#[test]
fn test_disabled_track_is_reported() {
    let mut container = MemoryContainer::new()
        .with_track(video(1, 100).disabled())
        .with_track(audio(2, 100));
    let plan = run(&mut container, &mut MockPacketizer::new());

    assert_eq!(plan.skipped[0].reason, Eligibility::SkipDisabled);
    assert_eq!(plan.warnings, vec![PlanWarning::TrackDisabled { track_id: 1 }]);
    assert_eq!(plan.entry(2).unwrap().payload_type, Some(96));
}

#[test]
fn test_isma_profile_skips_systems_tracks() {
    let scene = MemoryTrack::new(1, MediaKind::Scene)
        .subtype(b"mp4s")
        .in_root()
        .samples(10);
    let mut container = MemoryContainer::new()
        .with_profile(ProfileTag::Isma)
        .with_track(scene)
        .with_track(video(2, 100).in_root())
        .with_track(audio(3, 100).in_root());
    let plan = run(&mut container, &mut MockPacketizer::new());

    assert_eq!(plan.skipped[0].track_id, 1);
    assert_eq!(plan.skipped[0].reason, Eligibility::SkipUnsupportedUnderProfile);
    assert_eq!(plan.payload_types(), vec![96, 97]);
}

#[test]
fn test_transport_params() {
    let od = MemoryTrack::new(1, MediaKind::ObjectDescriptor)
        .subtype(b"mp4s")
        .descriptor(esd(1, 0, stream_type::OBJECT_DESCRIPTOR))
        .samples(3);
    let mut container = MemoryContainer::new()
        .with_track(od)
        .with_track(video(2, 100));
    let options = HintOptions {
        mtu: 1200,
        max_ptime: 100,
        interleave: true,
        base_flags: PacketFlags::SIGNAL_RAP,
        ..Default::default()
    };
    let mut packetizer = MockPacketizer::new();
    plan_hints(&mut container, &mut packetizer, &options).unwrap();

    let od_params = packetizer.params_for(1).unwrap();
    assert!(od_params.copy_data);
    assert_eq!(od_params.payload_type, 96);

    let video_params = packetizer.params_for(2).unwrap();
    assert!(!video_params.copy_data);
    assert_eq!(video_params.mtu, 1200);
    assert_eq!(video_params.max_ptime, 100);
    assert_eq!(video_params.payload_type, 97);
    assert_eq!(
        video_params.flags,
        PacketFlags::SIGNAL_RAP | PacketFlags::USE_INTERLEAVING
    );
}

#[test]
fn test_session_finalization_failure() {
    let mut container = av_container();
    let mut packetizer = MockPacketizer::new();
    packetizer.fail_session = true;
    let err = plan_hints(&mut container, &mut packetizer, &HintOptions::default()).unwrap_err();
    assert!(matches!(err, HintError::SessionFinalization(_)));
    assert_eq!(packetizer.session.unwrap().mode, ProfileMode::None);
}

#[test]
fn test_payload_types_exhausted_keeps_completed_tracks() {
    let mut container = MemoryContainer::new();
    for id in 1..=34 {
        container = container.with_track(audio(id, 10));
    }
    let mut packetizer = MockPacketizer::new().declining(34);
    let plan = run(&mut container, &mut packetizer);

    assert_eq!(plan.payload_types(), (96..=127).collect::<Vec<u8>>());
    assert_eq!(plan.session.total_bandwidth, 32 * 100);

    let starved = plan.entry(33).unwrap();
    assert_eq!(starved.verdict, HintVerdict::ConstructionFailed);
    assert_eq!(starved.payload_type, None);
    // a track the packetizer cannot carry is declined, not starved
    assert_eq!(plan.entry(34).unwrap().verdict, HintVerdict::Declined);
    assert_eq!(
        plan.warnings,
        vec![
            PlanWarning::PayloadTypesExhausted { track_id: 33 },
            PlanWarning::NoPayloadFormat { track_id: 34 },
        ]
    );
    // no hinter was built once the range ran out
    assert_eq!(packetizer.params.len(), 32);
}

#[test]
fn test_distinct_es_ids_are_distinct_timelines() {
    let mut container = MemoryContainer::new()
        .with_track(video(1, 100).descriptor(esd(4, 0, stream_type::VISUAL)))
        .with_track(audio(2, 100).descriptor(esd(5, 0, stream_type::AUDIO)))
        .with_track(audio(3, 100).descriptor(esd(6, 0, stream_type::AUDIO)));
    let plan = run(&mut container, &mut MockPacketizer::new());
    assert!(!plan.session.single_clock);
    assert!(plan.warnings.contains(&PlanWarning::InconsistentTimeline));
}

#[test]
fn test_planning_is_repeatable() {
    let container = av_container().with_track(od_track(3, &[0u8; 8]));
    let first = run(&mut container.clone(), &mut MockPacketizer::new());
    let second = run(&mut container.clone(), &mut MockPacketizer::new());
    assert_eq!(first, second);
}

#[test]
fn test_plan_serializes_to_json() {
    let mut container = av_container();
    let plan = run(&mut container, &mut MockPacketizer::new());
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["entries"][0]["verdict"], "hinted");
    assert_eq!(json["entries"][1]["payload_type"], 97);
    assert_eq!(json["session"]["mode"], "none");
}
