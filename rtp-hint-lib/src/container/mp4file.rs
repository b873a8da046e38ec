//! MP4 file container backed by the `mp4` reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;

use super::boxes::{read_top_level_box, walk_boxes, MoovDescriptors};
use super::{guess_profile, Container};
use crate::error::{HintError, Result};
use crate::types::{EsDescriptor, FourCc, MediaKind, ProfileTag, TrackInfo};

/// Bit 0 of the `tkhd` flags
const TRACK_ENABLED: u32 = 0x000001;

#[derive(Debug, Clone)]
struct Mp4TrackMeta {
    id: u32,
    kind: MediaKind,
    subtype: FourCc,
    sample_count: u32,
    enabled: bool,
    descriptor: Option<EsDescriptor>,
    bitrate: u32,
}

/// An MP4 file opened for hint planning
pub struct Mp4Container<R> {
    reader: mp4::Mp4Reader<R>,
    tracks: Vec<Mp4TrackMeta>,
    root_track_ids: Option<Vec<u32>>,
    profile: ProfileTag,
    default_sync_track: Option<u32>,
}

impl Mp4Container<BufReader<File>> {
    /// Open an MP4 file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            HintError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {:?}: {}", path, e),
            ))
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Mp4Container<R> {
    /// Parse the container header from any seekable reader
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        let moov = read_top_level_box(&mut reader, b"moov")?
            .ok_or_else(|| HintError::InvalidContainer("no moov box found".to_string()))?;
        let descriptors = MoovDescriptors::parse(&moov);
        let sample_entries = first_sample_entries(&moov);

        reader.seek(SeekFrom::Start(0))?;
        let mp4 = mp4::Mp4Reader::read_header(reader, size)?;

        let mut tracks = Vec::with_capacity(mp4.moov.traks.len());
        for trak in &mp4.moov.traks {
            let id = trak.tkhd.track_id;
            let handler = FourCc(trak.mdia.hdlr.handler_type.value);
            let (sample_count, bitrate) = mp4
                .tracks()
                .get(&id)
                .map(|t| (t.sample_count(), t.bitrate()))
                .unwrap_or((0, 0));

            let meta = Mp4TrackMeta {
                id,
                kind: MediaKind::from_handler(handler),
                subtype: sample_entries.get(&id).copied().unwrap_or_default(),
                sample_count,
                enabled: trak.tkhd.flags & TRACK_ENABLED != 0,
                descriptor: descriptors.es_descriptors.get(&id).copied(),
                bitrate,
            };
            tracing::debug!(
                "Found track ID {}: kind={}, subtype={}, samples={}",
                meta.id,
                meta.kind,
                meta.subtype,
                meta.sample_count
            );
            tracks.push(meta);
        }

        let mut container = Self {
            reader: mp4,
            tracks,
            root_track_ids: descriptors.root_track_ids,
            profile: ProfileTag::default(),
            default_sync_track: None,
        };

        let major = FourCc(container.reader.ftyp.major_brand.value);
        let compatible: Vec<FourCc> = container
            .reader
            .ftyp
            .compatible_brands
            .iter()
            .map(|b| FourCc(b.value))
            .collect();
        let census = super::load_tracks(&container);
        let has_root = container.root_descriptor_streams() > 0;
        container.profile = guess_profile(major, &compatible, &census, has_root);
        tracing::debug!("Guessed specification profile: {}", container.profile);

        Ok(container)
    }

    /// Track ID recorded as default sync track, if any
    pub fn default_sync_track(&self) -> Option<u32> {
        self.default_sync_track
    }

    /// Snapshot of all tracks in storage order
    pub fn track_infos(&self) -> Vec<TrackInfo> {
        super::load_tracks(self)
    }

    fn track(&self, pos: usize) -> Option<&Mp4TrackMeta> {
        pos.checked_sub(1).and_then(|i| self.tracks.get(i))
    }
}

/// First sample entry type of every track, keyed by track ID
fn first_sample_entries(moov: &[u8]) -> HashMap<u32, FourCc> {
    let mut entries = HashMap::new();
    walk_boxes(moov, &[], &mut |btype, trak| {
        if btype != b"trak" {
            return;
        }
        let mut track_id = None;
        let mut entry_type = None;
        walk_boxes(trak, &[b"mdia", b"minf", b"stbl"], &mut |btype, payload| {
            match btype {
                b"tkhd" => {
                    let offset = if payload.first() == Some(&1) { 20 } else { 12 };
                    track_id = payload
                        .get(offset..offset + 4)
                        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]));
                }
                b"stsd" if entry_type.is_none() => {
                    if let Some(entry) = payload.get(12..16) {
                        entry_type = Some(FourCc([entry[0], entry[1], entry[2], entry[3]]));
                    }
                }
                _ => {}
            }
        });
        if let (Some(id), Some(entry)) = (track_id, entry_type) {
            entries.insert(id, entry);
        }
    });
    entries
}

impl<R: Read + Seek> Container for Mp4Container<R> {
    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_id(&self, pos: usize) -> u32 {
        self.track(pos).map(|t| t.id).unwrap_or(0)
    }

    fn media_kind(&self, pos: usize) -> MediaKind {
        self.track(pos)
            .map(|t| t.kind)
            .unwrap_or(MediaKind::Other(FourCc::default()))
    }

    fn media_subtype(&self, pos: usize) -> FourCc {
        self.track(pos).map(|t| t.subtype).unwrap_or_default()
    }

    fn sample_count(&self, pos: usize) -> u32 {
        self.track(pos).map(|t| t.sample_count).unwrap_or(0)
    }

    fn is_enabled(&self, pos: usize) -> bool {
        self.track(pos).map(|t| t.enabled).unwrap_or(false)
    }

    fn is_in_root_descriptor(&self, pos: usize) -> bool {
        match (self.track(pos), &self.root_track_ids) {
            (Some(track), Some(ids)) => ids.contains(&track.id),
            _ => false,
        }
    }

    fn root_descriptor_streams(&self) -> usize {
        self.root_track_ids.as_ref().map(|ids| ids.len()).unwrap_or(0)
    }

    fn elementary_descriptor(&self, pos: usize) -> Option<EsDescriptor> {
        self.track(pos).and_then(|t| t.descriptor)
    }

    fn sample(&mut self, pos: usize, index: u32) -> Result<Option<Bytes>> {
        let Some(track_id) = self.track(pos).map(|t| t.id) else {
            return Ok(None);
        };
        let sample = self.reader.read_sample(track_id, index)?;
        Ok(sample.map(|s| s.bytes))
    }

    fn guessed_profile(&self) -> ProfileTag {
        self.profile
    }

    fn set_default_sync_track(&mut self, pos: usize) {
        self.default_sync_track = self.track(pos).map(|t| t.id);
    }

    fn set_clock_reference(&mut self, pos: usize, ocr_es_id: u16) -> Result<()> {
        let track = pos
            .checked_sub(1)
            .and_then(|i| self.tracks.get_mut(i))
            .ok_or_else(|| HintError::InvalidContainer(format!("no track at position {}", pos)))?;
        if let Some(descriptor) = track.descriptor.as_mut() {
            descriptor.ocr_es_id = ocr_es_id;
        }
        Ok(())
    }

    fn average_bitrate(&self, pos: usize) -> Option<u32> {
        self.track(pos).map(|t| t.bitrate).filter(|&b| b > 0)
    }
}
