//! ISOBMFF box walking and MPEG-4 descriptor parsing.
//!
//! The `mp4` reader does not expose the initial object descriptor (`iods`)
//! nor the clock reference fields of `esds`, so both are read here straight
//! from the `moov` payload.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use crate::error::{HintError, Result};
use crate::types::EsDescriptor;

const ES_DESCRIPTOR_TAG: u8 = 0x03;
const DECODER_CONFIG_TAG: u8 = 0x04;
const ES_ID_INC_TAG: u8 = 0x0E;
const MP4_IOD_TAG: u8 = 0x10;
const IOD_TAG: u8 = 0x02;

/// Walk all boxes in a buffer, descending into the listed container boxes.
/// `callback` is invoked for every box in pre-order with `(box_type, payload)`.
pub fn walk_boxes<'a, F>(data: &'a [u8], containers: &[&[u8; 4]], callback: &mut F)
where
    F: FnMut(&[u8; 4], &'a [u8]),
{
    let mut pos = 0;
    while pos + 8 <= data.len() {
        let size =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        if size < 8 || pos + size > data.len() {
            break;
        }
        let btype = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
        let payload = &data[pos + 8..pos + size];

        callback(&btype, payload);

        if containers.contains(&&btype) {
            walk_boxes(payload, containers, callback);
        }

        pos += size;
    }
}

/// Find the first direct child box of the given type
pub fn find_child<'a>(data: &'a [u8], wanted: &[u8; 4]) -> Option<&'a [u8]> {
    let mut found = None;
    walk_boxes(data, &[], &mut |btype, payload| {
        if found.is_none() && btype == wanted {
            found = Some(payload);
        }
    });
    found
}

/// Read the payload of the first top-level box of the given type from a file
pub fn read_top_level_box<R: Read + Seek>(reader: &mut R, wanted: &[u8; 4]) -> Result<Option<Vec<u8>>> {
    let end = reader.seek(SeekFrom::End(0))?;
    let mut pos = reader.seek(SeekFrom::Start(0))?;

    while pos + 8 <= end {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let mut size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let btype = [header[4], header[5], header[6], header[7]];
        let mut header_len = 8u64;

        if size == 1 {
            let mut large = [0u8; 8];
            reader.read_exact(&mut large)?;
            size = u64::from_be_bytes(large);
            header_len = 16;
        } else if size == 0 {
            size = end - pos;
        }
        let past_end = pos.checked_add(size).map_or(true, |box_end| box_end > end);
        if size < header_len || past_end {
            return Err(HintError::InvalidContainer(format!(
                "box '{}' at offset {} has invalid size {}",
                String::from_utf8_lossy(&btype),
                pos,
                size
            )));
        }

        if &btype == wanted {
            let mut payload = vec![0u8; (size - header_len) as usize];
            reader.read_exact(&mut payload)?;
            return Ok(Some(payload));
        }

        pos = reader.seek(SeekFrom::Start(pos + size))?;
    }

    Ok(None)
}

/// Read an expandable descriptor size (up to four 7-bit groups)
fn read_descriptor_size(data: &[u8], pos: &mut usize) -> Option<usize> {
    let mut size = 0usize;
    for _ in 0..4 {
        let b = *data.get(*pos)?;
        *pos += 1;
        size = (size << 7) | (b & 0x7F) as usize;
        if b & 0x80 == 0 {
            return Some(size);
        }
    }
    Some(size)
}

/// Split a descriptor into `(tag, body)` and return the offset past it
fn read_descriptor(data: &[u8], pos: usize) -> Option<(u8, &[u8], usize)> {
    let tag = *data.get(pos)?;
    let mut cursor = pos + 1;
    let size = read_descriptor_size(data, &mut cursor)?;
    let body = data.get(cursor..cursor + size)?;
    Some((tag, body, cursor + size))
}

/// Parse the payload of an `iods` box and return the track IDs it references
/// through ES_ID_Inc descriptors. Returns `None` when no object descriptor
/// is present.
pub fn parse_iods(payload: &[u8]) -> Option<Vec<u32>> {
    // full box header
    let data = payload.get(4..)?;
    let (tag, body, _) = read_descriptor(data, 0)?;
    if tag != MP4_IOD_TAG && tag != IOD_TAG {
        return None;
    }

    let flags = u16::from_be_bytes([*body.first()?, *body.get(1)?]);
    let url_flag = flags & 0x0020 != 0;
    let mut pos = 2;
    if url_flag {
        let url_len = *body.get(pos)? as usize;
        pos += 1 + url_len;
    } else {
        // OD, scene, audio, visual and graphics profile levels
        pos += 5;
    }

    let mut track_ids = Vec::new();
    while pos < body.len() {
        let Some((tag, sub, next)) = read_descriptor(body, pos) else {
            break;
        };
        if tag == ES_ID_INC_TAG && sub.len() >= 4 {
            track_ids.push(u32::from_be_bytes([sub[0], sub[1], sub[2], sub[3]]));
        }
        pos = next;
    }
    Some(track_ids)
}

/// Parse the payload of an `esds` box
pub fn parse_esds(payload: &[u8]) -> Option<EsDescriptor> {
    let data = payload.get(4..)?;
    let (tag, body, _) = read_descriptor(data, 0)?;
    if tag != ES_DESCRIPTOR_TAG {
        return None;
    }

    let es_id = u16::from_be_bytes([*body.first()?, *body.get(1)?]);
    let flags = *body.get(2)?;
    let mut pos = 3;
    if flags & 0x80 != 0 {
        // dependsOn_ES_ID
        pos += 2;
    }
    if flags & 0x40 != 0 {
        let url_len = *body.get(pos)? as usize;
        pos += 1 + url_len;
    }
    let mut ocr_es_id = 0;
    if flags & 0x20 != 0 {
        ocr_es_id = u16::from_be_bytes([*body.get(pos)?, *body.get(pos + 1)?]);
        pos += 2;
    }

    let mut esd = EsDescriptor {
        es_id,
        ocr_es_id,
        stream_type: 0,
        object_type: 0,
    };
    if let Some((DECODER_CONFIG_TAG, config, _)) = read_descriptor(body, pos) {
        if config.len() >= 2 {
            esd.object_type = config[0];
            esd.stream_type = config[1] >> 2;
        }
    }
    Some(esd)
}

/// Byte offset of the child boxes inside an MPEG-4 sample entry
fn sample_entry_header_len(entry_type: &[u8; 4]) -> Option<usize> {
    match entry_type {
        // SampleEntry (8) + VisualSampleEntry fields (70)
        b"mp4v" | b"encv" => Some(78),
        // SampleEntry (8) + AudioSampleEntry fields (20)
        b"mp4a" | b"enca" => Some(28),
        b"mp4s" | b"encs" => Some(8),
        _ => None,
    }
}

/// Descriptor metadata read directly from a `moov` payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoovDescriptors {
    /// Track IDs referenced by the root object descriptor, if one exists
    pub root_track_ids: Option<Vec<u32>>,
    /// ES descriptors keyed by track ID
    pub es_descriptors: HashMap<u32, EsDescriptor>,
}

impl MoovDescriptors {
    pub fn parse(moov: &[u8]) -> Self {
        let mut result = MoovDescriptors {
            root_track_ids: find_child(moov, b"iods").and_then(parse_iods),
            es_descriptors: HashMap::new(),
        };

        walk_boxes(moov, &[], &mut |btype, trak| {
            if btype != b"trak" {
                return;
            }
            let Some(track_id) = find_child(trak, b"tkhd").and_then(tkhd_track_id) else {
                return;
            };
            let mut esd = None;
            walk_boxes(trak, &[b"mdia", b"minf", b"stbl"], &mut |btype, payload| {
                if btype == b"stsd" && esd.is_none() {
                    esd = first_entry_esds(payload);
                }
            });
            if let Some(esd) = esd {
                result.es_descriptors.insert(track_id, esd);
            }
        });

        result
    }
}

fn tkhd_track_id(tkhd: &[u8]) -> Option<u32> {
    let version = *tkhd.first()?;
    // version 1 carries 64-bit creation and modification times
    let offset = if version == 1 { 20 } else { 12 };
    let id = tkhd.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([id[0], id[1], id[2], id[3]]))
}

fn first_entry_esds(stsd: &[u8]) -> Option<EsDescriptor> {
    // full box header + entry count
    let entries = stsd.get(8..)?;
    let mut esd = None;
    let mut first = true;
    walk_boxes(entries, &[], &mut |entry_type, entry| {
        if !first {
            return;
        }
        first = false;
        let Some(skip) = sample_entry_header_len(entry_type) else {
            return;
        };
        if let Some(children) = entry.get(skip..) {
            esd = find_child(children, b"esds").and_then(parse_esds);
        }
    });
    esd
}
