use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Four-character code as found in ISOBMFF box types, handlers and brands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl FromStr for FourCc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("four-character code must be 4 bytes: {:?}", s))?;
        Ok(Self(bytes))
    }
}

impl Serialize for FourCc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FourCc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Media kind of a track, derived from its handler type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Visual,
    Audio,
    Scene,
    ObjectDescriptor,
    Hint,
    Text,
    Subtitle,
    Other(FourCc),
}

impl MediaKind {
    /// Map an ISOBMFF handler type to a media kind
    pub fn from_handler(handler: FourCc) -> Self {
        match &handler.0 {
            b"vide" => MediaKind::Visual,
            b"soun" => MediaKind::Audio,
            b"sdsm" => MediaKind::Scene,
            b"odsm" => MediaKind::ObjectDescriptor,
            b"hint" => MediaKind::Hint,
            b"text" => MediaKind::Text,
            b"sbtl" | b"subt" => MediaKind::Subtitle,
            _ => MediaKind::Other(handler),
        }
    }

    /// The handler type this kind is stored under
    pub fn handler(&self) -> FourCc {
        match self {
            MediaKind::Visual => FourCc::new(b"vide"),
            MediaKind::Audio => FourCc::new(b"soun"),
            MediaKind::Scene => FourCc::new(b"sdsm"),
            MediaKind::ObjectDescriptor => FourCc::new(b"odsm"),
            MediaKind::Hint => FourCc::new(b"hint"),
            MediaKind::Text => FourCc::new(b"text"),
            MediaKind::Subtitle => FourCc::new(b"sbtl"),
            MediaKind::Other(code) => *code,
        }
    }

    /// Scene and object-descriptor tracks carry MPEG-4 Systems data
    pub fn is_systems(&self) -> bool {
        matches!(self, MediaKind::Scene | MediaKind::ObjectDescriptor)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.handler())
    }
}

/// MPEG-4 Systems stream type codes (ISO/IEC 14496-1, table 6)
pub mod stream_type {
    pub const OBJECT_DESCRIPTOR: u8 = 0x01;
    pub const CLOCK_REFERENCE: u8 = 0x02;
    pub const SCENE: u8 = 0x03;
    pub const VISUAL: u8 = 0x04;
    pub const AUDIO: u8 = 0x05;
    pub const MPEG7: u8 = 0x06;
    pub const IPMP: u8 = 0x07;
    pub const OCI: u8 = 0x08;
    pub const MPEG_J: u8 = 0x09;
    pub const INTERACTION: u8 = 0x0A;
    pub const TEXT: u8 = 0x0D;
}

/// The parts of an elementary stream descriptor relevant to hinting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EsDescriptor {
    /// Elementary stream ID
    pub es_id: u16,
    /// ES ID of the stream providing the object clock reference (0 = none)
    pub ocr_es_id: u16,
    /// Stream type code, see [`stream_type`]
    pub stream_type: u8,
    /// Object type indication
    pub object_type: u8,
}

impl EsDescriptor {
    /// The explicit clock reference, if one is signalled
    pub fn explicit_clock_reference(&self) -> Option<u16> {
        (self.ocr_es_id != 0).then_some(self.ocr_es_id)
    }

    /// The clock reference, falling back to the stream's own ES ID
    pub fn clock_reference(&self) -> u16 {
        self.explicit_clock_reference().unwrap_or(self.es_id)
    }

    pub fn is_object_descriptor_stream(&self) -> bool {
        self.stream_type == stream_type::OBJECT_DESCRIPTOR
    }
}

/// Specification profile guessed for a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileTag {
    /// Internet Streaming Media Alliance profile: audio/video only
    Isma,
    ThreeGpp,
    #[default]
    Mpeg4,
    Other(FourCc),
}

impl ProfileTag {
    /// Whether tracks other than audio and video must not be streamed
    pub fn forbids_systems_tracks(&self) -> bool {
        matches!(self, ProfileTag::Isma)
    }
}

impl fmt::Display for ProfileTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileTag::Isma => write!(f, "ISMA"),
            ProfileTag::ThreeGpp => write!(f, "3GPP"),
            ProfileTag::Mpeg4 => write!(f, "MPEG-4"),
            ProfileTag::Other(code) => write!(f, "{}", code),
        }
    }
}

/// Snapshot of one track, read from the container before planning
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// 1-based position in storage order
    pub position: usize,
    pub track_id: u32,
    pub kind: MediaKind,
    pub subtype: FourCc,
    pub sample_count: u32,
    pub enabled: bool,
    pub in_root_descriptor: bool,
    pub descriptor: Option<EsDescriptor>,
}

impl TrackInfo {
    /// Stream type code of the track, 0 when it has no descriptor
    pub fn stream_type(&self) -> u8 {
        self.descriptor.map(|d| d.stream_type).unwrap_or(0)
    }
}
