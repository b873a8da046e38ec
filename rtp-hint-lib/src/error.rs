use thiserror::Error;

/// Main error type for hint planning
#[derive(Error, Debug)]
pub enum HintError {
    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error reported by the MP4 reader
    #[error("MP4 error: {0}")]
    Mp4(#[from] mp4::Error),

    /// The container structure could not be interpreted
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// A container manifest could not be parsed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// The packetizer could not be built for a track
    #[error("Cannot create hinter for track ID {track_id}: {source}")]
    ConstructionFailed {
        track_id: u32,
        #[source]
        source: PacketizerError,
    },

    /// Packetizing the samples of a track failed
    #[error("Error while hinting track ID {track_id}: {source}")]
    ProcessingFailed {
        track_id: u32,
        #[source]
        source: PacketizerError,
    },

    /// Writing the per-track transport description failed
    #[error("Error while finalizing hint track ID {track_id}: {source}")]
    FinalizationFailed {
        track_id: u32,
        #[source]
        source: PacketizerError,
    },

    /// Writing the session-level description failed
    #[error("Session finalization failed: {0}")]
    SessionFinalization(#[source] PacketizerError),

    /// No dynamic RTP payload type is left for a track
    #[error("No dynamic payload type left for track ID {track_id}")]
    PayloadTypesExhausted { track_id: u32 },
}

/// Errors reported by packetizer implementations
#[derive(Error, Debug)]
pub enum PacketizerError {
    /// The track media or codec cannot be carried over RTP by this packetizer
    #[error("Unsupported media: {0}")]
    Unsupported(String),

    /// Transport parameters were rejected (MTU too small, bad clock rate, ...)
    #[error("Invalid transport parameters: {0}")]
    InvalidParameters(String),

    /// A sample could not be read or packetized
    #[error("Bad sample {sample}: {reason}")]
    BadSample { sample: u32, reason: String },

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HintError>;

impl From<toml::de::Error> for HintError {
    fn from(e: toml::de::Error) -> Self {
        HintError::Manifest(e.to_string())
    }
}

impl From<serde_json::Error> for HintError {
    fn from(e: serde_json::Error) -> Self {
        HintError::Manifest(e.to_string())
    }
}
