//! Clock reference tracking

use crate::container::Container;
use crate::error::{HintError, Result};
use crate::types::EsDescriptor;

/// Tracks the clock reference shared by hinted streams
#[derive(Debug, Clone)]
pub struct ClockReferenceTracker {
    reference: Option<u16>,
    single_clock: bool,
}

impl ClockReferenceTracker {
    pub fn new() -> Self {
        Self {
            reference: None,
            single_clock: true,
        }
    }

    /// Record the descriptor of an eligible track.
    ///
    /// The clock reference of a descriptor is its OCR ES ID, or its own ES ID
    /// when it has none. The first non-zero reference is kept; any later
    /// non-zero reference that differs breaks the single clock flag, which
    /// never recovers.
    pub fn observe(&mut self, descriptor: &EsDescriptor) {
        match self.reference {
            None => {
                let ocr = descriptor.clock_reference();
                if ocr != 0 {
                    self.reference = Some(ocr);
                }
            }
            Some(reference) => {
                let ocr = descriptor.clock_reference();
                if ocr != 0 && ocr != reference {
                    tracing::debug!(
                        "ES ID {} uses clock reference {}, expected {}",
                        descriptor.es_id,
                        ocr,
                        reference
                    );
                    self.single_clock = false;
                }
            }
        }
    }

    pub fn reference(&self) -> Option<u16> {
        self.reference
    }

    pub fn is_single_clock(&self) -> bool {
        self.single_clock
    }
}

impl Default for ClockReferenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Point every elementary stream at the first root-descriptor track's clock.
///
/// Returns the clock reference ID written, or `None` when nothing changed
/// (single-track container, or no track in the root descriptor).
pub fn force_clock_references<C: Container + ?Sized>(container: &mut C) -> Result<Option<u16>> {
    let count = container.track_count();
    if count == 1 {
        return Ok(None);
    }

    let Some(anchor) = (1..=count).find(|&pos| container.is_in_root_descriptor(pos)) else {
        tracing::debug!("No track in root descriptor, clock references unchanged");
        return Ok(None);
    };
    let track_id = container.track_id(anchor);
    let ocr_id = u16::try_from(track_id).map_err(|_| {
        HintError::InvalidContainer(format!(
            "track ID {} does not fit in a 16-bit ES ID",
            track_id
        ))
    })?;

    for pos in 1..=count {
        if container.elementary_descriptor(pos).is_some() {
            container.set_clock_reference(pos, ocr_id)?;
        }
    }
    tracing::info!("Clock references set to ES ID {}", ocr_id);
    Ok(Some(ocr_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{MemoryContainer, MemoryTrack};
    use crate::types::MediaKind;

    fn esd(es_id: u16, ocr_es_id: u16) -> EsDescriptor {
        EsDescriptor {
            es_id,
            ocr_es_id,
            stream_type: 0x05,
            object_type: 0x40,
        }
    }

    fn run(descriptors: &[EsDescriptor]) -> ClockReferenceTracker {
        let mut tracker = ClockReferenceTracker::new();
        for d in descriptors {
            tracker.observe(d);
        }
        tracker
    }

    #[test]
    fn test_same_clock() {
        let tracker = run(&[esd(1, 5), esd(2, 5), esd(3, 5)]);
        assert!(tracker.is_single_clock());
        assert_eq!(tracker.reference(), Some(5));
    }

    #[test]
    fn test_two_timelines() {
        let tracker = run(&[esd(1, 5), esd(2, 5), esd(3, 7)]);
        assert!(!tracker.is_single_clock());
    }

    #[test]
    fn test_fallback_to_es_id() {
        let tracker = run(&[esd(4, 0), esd(4, 0), esd(4, 0)]);
        assert!(tracker.is_single_clock());
        assert_eq!(tracker.reference(), Some(4));

        // distinct ES IDs without an OCR are distinct timelines
        let tracker = run(&[esd(4, 0), esd(5, 0)]);
        assert!(!tracker.is_single_clock());

        // an explicit OCR pointing at the first stream shares its clock
        let tracker = run(&[esd(4, 0), esd(5, 4)]);
        assert!(tracker.is_single_clock());

        let tracker = run(&[esd(4, 0), esd(5, 9)]);
        assert!(!tracker.is_single_clock());
    }

    #[test]
    fn test_conflict_is_sticky() {
        let tracker = run(&[esd(1, 5), esd(2, 7), esd(3, 5)]);
        assert!(!tracker.is_single_clock());
    }

    #[test]
    fn test_force_clock_references() {
        let mut container = MemoryContainer::new()
            .with_track(MemoryTrack::new(1, MediaKind::Visual).descriptor(esd(1, 0)))
            .with_track(MemoryTrack::new(3, MediaKind::ObjectDescriptor).in_root().descriptor(esd(3, 0)))
            .with_track(MemoryTrack::new(4, MediaKind::Audio).descriptor(esd(4, 9)))
            .with_track(MemoryTrack::new(5, MediaKind::Text));

        assert_eq!(force_clock_references(&mut container).unwrap(), Some(3));
        for pos in 1..=3 {
            assert_eq!(container.elementary_descriptor(pos).unwrap().ocr_es_id, 3);
        }
        assert_eq!(container.elementary_descriptor(4), None);
    }

    #[test]
    fn test_force_clock_references_rejects_wide_track_id() {
        let mut container = MemoryContainer::new()
            .with_track(MemoryTrack::new(70_000, MediaKind::ObjectDescriptor).in_root().descriptor(esd(1, 0)))
            .with_track(MemoryTrack::new(2, MediaKind::Audio).descriptor(esd(2, 0)));
        assert!(matches!(
            force_clock_references(&mut container),
            Err(HintError::InvalidContainer(_))
        ));
        assert_eq!(container.elementary_descriptor(2).unwrap().ocr_es_id, 0);
    }

    #[test]
    fn test_force_clock_references_needs_root_track() {
        let mut container = MemoryContainer::new()
            .with_track(MemoryTrack::new(1, MediaKind::Visual).descriptor(esd(1, 0)))
            .with_track(MemoryTrack::new(2, MediaKind::Audio).descriptor(esd(2, 0)));
        assert_eq!(force_clock_references(&mut container).unwrap(), None);
        assert_eq!(container.elementary_descriptor(2).unwrap().ocr_es_id, 0);
    }
}
