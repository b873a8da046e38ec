use std::path::Path;

use crate::container::{Container, MemoryContainer, Mp4Container};
use crate::error::Result;
use crate::packetizer::EstimatingPacketizer;
use crate::plan::{plan_hints, HintOptions, HintPlan};

/// Kind of input a planning run reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// ISO base media file (.mp4, .m4a, .3gp, ...)
    Mp4,
    /// TOML or JSON track manifest
    Manifest,
}

impl InputKind {
    /// Guess the input kind from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") | Some("json") => InputKind::Manifest,
            _ => InputKind::Mp4,
        }
    }
}

/// Plan hinting for the tracks of any container with the estimating packetizer
pub fn plan_container<C: Container + ?Sized>(
    container: &mut C,
    options: &HintOptions,
) -> Result<HintPlan> {
    let mut packetizer = EstimatingPacketizer::new();
    plan_hints(container, &mut packetizer, options)
}

/// Plan hinting for an MP4 file
pub fn plan_mp4(path: &Path, options: &HintOptions) -> Result<HintPlan> {
    let mut container = Mp4Container::open(path)?;
    plan_container(&mut container, options)
}

/// Plan hinting for a track manifest
pub fn plan_manifest(path: &Path, options: &HintOptions) -> Result<HintPlan> {
    let mut container = MemoryContainer::from_manifest(path)?;
    plan_container(&mut container, options)
}

/// Plan hinting for a file, choosing the reader from its extension
pub fn plan_file(path: &Path, options: &HintOptions) -> Result<HintPlan> {
    tracing::debug!("Planning hints for {}", path.display());
    match InputKind::from_path(path) {
        InputKind::Mp4 => plan_mp4(path, options),
        InputKind::Manifest => plan_manifest(path, options),
    }
}
