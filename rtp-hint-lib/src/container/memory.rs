//! In-memory container, built in code or loaded from a TOML/JSON manifest

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::Container;
use crate::error::{HintError, Result};
use crate::types::{EsDescriptor, FourCc, MediaKind, ProfileTag};

fn default_true() -> bool {
    true
}

/// One track of a [`MemoryContainer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTrack {
    pub id: u32,
    pub kind: MediaKind,
    #[serde(default)]
    pub subtype: FourCc,
    /// Declared sample count; when absent the number of stored samples is used
    #[serde(default)]
    pub sample_count: Option<u32>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub in_root_descriptor: bool,
    #[serde(default)]
    pub descriptor: Option<EsDescriptor>,
    /// Average bitrate in bits per second
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub samples: Vec<Vec<u8>>,
}

impl MemoryTrack {
    pub fn new(id: u32, kind: MediaKind) -> Self {
        Self {
            id,
            kind,
            subtype: FourCc::default(),
            sample_count: None,
            enabled: true,
            in_root_descriptor: false,
            descriptor: None,
            bitrate: None,
            samples: Vec::new(),
        }
    }

    pub fn subtype(mut self, subtype: &[u8; 4]) -> Self {
        self.subtype = FourCc::new(subtype);
        self
    }

    pub fn samples(mut self, count: u32) -> Self {
        self.sample_count = Some(count);
        self
    }

    pub fn with_sample(mut self, data: &[u8]) -> Self {
        self.samples.push(data.to_vec());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn in_root(mut self) -> Self {
        self.in_root_descriptor = true;
        self
    }

    pub fn descriptor(mut self, descriptor: EsDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    fn effective_sample_count(&self) -> u32 {
        self.sample_count.unwrap_or(self.samples.len() as u32)
    }
}

/// A container held entirely in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryContainer {
    #[serde(default)]
    pub profile: ProfileTag,
    #[serde(default, rename = "track")]
    pub tracks: Vec<MemoryTrack>,
    /// Track ID recorded as default sync track
    #[serde(skip)]
    pub default_sync_track: Option<u32>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: ProfileTag) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_track(mut self, track: MemoryTrack) -> Self {
        self.tracks.push(track);
        self
    }

    /// Parse a TOML manifest (`[[track]]` tables)
    pub fn from_toml(content: &str) -> Result<Self> {
        let container: MemoryContainer = toml::from_str(content)?;
        container.validate()
    }

    /// Parse a JSON manifest (`{"track": [...]}`)
    pub fn from_json(content: &str) -> Result<Self> {
        let container: MemoryContainer = serde_json::from_str(content)?;
        container.validate()
    }

    /// Load a manifest, choosing the format from the file extension
    pub fn from_manifest<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    fn validate(self) -> Result<Self> {
        for (i, track) in self.tracks.iter().enumerate() {
            if track.id == 0 {
                return Err(HintError::Manifest(format!(
                    "track at position {} has ID 0",
                    i + 1
                )));
            }
            if self.tracks[..i].iter().any(|t| t.id == track.id) {
                return Err(HintError::Manifest(format!(
                    "duplicate track ID {}",
                    track.id
                )));
            }
        }
        Ok(self)
    }

    fn track(&self, pos: usize) -> Option<&MemoryTrack> {
        pos.checked_sub(1).and_then(|i| self.tracks.get(i))
    }

    fn track_mut(&mut self, pos: usize) -> Option<&mut MemoryTrack> {
        pos.checked_sub(1).and_then(|i| self.tracks.get_mut(i))
    }
}

impl Container for MemoryContainer {
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
        self.track(pos)
            .map(|t| t.effective_sample_count())
            .unwrap_or(0)
    }

    fn is_enabled(&self, pos: usize) -> bool {
        self.track(pos).map(|t| t.enabled).unwrap_or(false)
    }

    fn is_in_root_descriptor(&self, pos: usize) -> bool {
        self.track(pos)
            .map(|t| t.in_root_descriptor)
            .unwrap_or(false)
    }

    fn root_descriptor_streams(&self) -> usize {
        self.tracks.iter().filter(|t| t.in_root_descriptor).count()
    }

    fn elementary_descriptor(&self, pos: usize) -> Option<EsDescriptor> {
        self.track(pos).and_then(|t| t.descriptor)
    }

    fn sample(&mut self, pos: usize, index: u32) -> Result<Option<Bytes>> {
        let sample = self.track(pos).and_then(|t| {
            index
                .checked_sub(1)
                .and_then(|i| t.samples.get(i as usize))
                .map(|data| Bytes::copy_from_slice(data))
        });
        Ok(sample)
    }

    fn guessed_profile(&self) -> ProfileTag {
        self.profile
    }

    fn set_default_sync_track(&mut self, pos: usize) {
        self.default_sync_track = self.track(pos).map(|t| t.id);
    }

    fn set_clock_reference(&mut self, pos: usize, ocr_es_id: u16) -> Result<()> {
        let track = self.track_mut(pos).ok_or_else(|| {
            HintError::InvalidContainer(format!("no track at position {}", pos))
        })?;
        if let Some(descriptor) = track.descriptor.as_mut() {
            descriptor.ocr_es_id = ocr_es_id;
        }
        Ok(())
    }

    fn average_bitrate(&self, pos: usize) -> Option<u32> {
        self.track(pos).and_then(|t| t.bitrate)
    }
}
