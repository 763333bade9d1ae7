//! Media handles issued by the media engine and simulcast primitives.

use std::{fmt, rc::Rc, str::FromStr};

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::snapshot::Metadata;

/// Kind of a [`MediaStreamTrack`].
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio track.
    #[display(fmt = "audio")]
    Audio,

    /// Video track.
    #[display(fmt = "video")]
    Video,
}

/// Opaque handle to a media stream issued by the media engine.
///
/// Cloning is cheap. Two handles are equal only if they point to the same
/// stream.
#[derive(Clone)]
pub struct MediaStream(Rc<StreamHandle>);

/// Inner data of a [`MediaStream`].
struct StreamHandle {
    /// ID of the stream, as reported by the media engine.
    id: String,
}

impl MediaStream {
    /// Wraps a new media stream with the provided `id`.
    #[inline]
    #[must_use]
    pub fn new<I: Into<String>>(id: I) -> Self {
        Self(Rc::new(StreamHandle { id: id.into() }))
    }

    /// Returns ID of this [`MediaStream`].
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

impl PartialEq for MediaStream {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MediaStream {}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MediaStream").field(&self.0.id).finish()
    }
}

/// Opaque handle to a single media track issued by the media engine.
///
/// Cloning is cheap. Two handles are equal only if they point to the same
/// track.
#[derive(Clone)]
pub struct MediaStreamTrack(Rc<TrackHandle>);

/// Inner data of a [`MediaStreamTrack`].
struct TrackHandle {
    /// ID of the track, as reported by the media engine.
    id: String,

    /// Kind of the track.
    kind: MediaKind,
}

impl MediaStreamTrack {
    /// Wraps a new media track with the provided `id` and [`MediaKind`].
    #[inline]
    #[must_use]
    pub fn new<I: Into<String>>(id: I, kind: MediaKind) -> Self {
        Self(Rc::new(TrackHandle {
            id: id.into(),
            kind,
        }))
    }

    /// Returns ID of this [`MediaStreamTrack`].
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Returns [`MediaKind`] of this [`MediaStreamTrack`].
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.0.kind
    }
}

impl PartialEq for MediaStreamTrack {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MediaStreamTrack {}

impl fmt::Debug for MediaStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStreamTrack")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .finish()
    }
}

/// Quality tier a simulcast track is sent or received with.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum Encoding {
    /// Low quality.
    #[display(fmt = "l")]
    #[serde(rename = "l")]
    Low,

    /// Medium quality.
    #[display(fmt = "m")]
    #[serde(rename = "m")]
    Medium,

    /// High quality.
    #[display(fmt = "h")]
    #[serde(rename = "h")]
    High,
}

impl Encoding {
    /// All the [`Encoding`]s from the lowest to the highest one.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

impl FromStr for Encoding {
    type Err = UnknownEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" => Ok(Self::Low),
            "m" => Ok(Self::Medium),
            "h" => Ok(Self::High),
            _ => Err(UnknownEncodingError(s.to_owned())),
        }
    }
}

/// Error of parsing an unknown [`Encoding`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "Unknown encoding: `{}`", _0)]
pub struct UnknownEncodingError(pub String);

/// Error of constructing a [`SimulcastConfig`] with the same [`Encoding`]
/// listed more than once.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display(fmt = "Encoding `{}` is listed more than once", _0)]
pub struct DuplicateEncodingError(pub Encoding);

/// Simulcast settings of a track.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimulcastConfig {
    /// Indicator whether simulcast is enabled for a track.
    enabled: bool,

    /// [`Encoding`]s the track is sent with, without duplicates.
    active_encodings: Vec<Encoding>,
}

impl SimulcastConfig {
    /// Creates a new [`SimulcastConfig`] keeping the order of the provided
    /// `active_encodings`.
    ///
    /// # Errors
    ///
    /// With [`DuplicateEncodingError`] if some [`Encoding`] is listed more
    /// than once.
    pub fn new<I>(
        enabled: bool,
        active_encodings: I,
    ) -> Result<Self, DuplicateEncodingError>
    where
        I: IntoIterator<Item = Encoding>,
    {
        let mut encodings = Vec::new();
        for encoding in active_encodings {
            if encodings.contains(&encoding) {
                return Err(DuplicateEncodingError(encoding));
            }
            encodings.push(encoding);
        }
        Ok(Self {
            enabled,
            active_encodings: encodings,
        })
    }

    /// Indicates whether simulcast is enabled.
    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the active [`Encoding`]s.
    #[inline]
    #[must_use]
    pub fn active_encodings(&self) -> &[Encoding] {
        &self.active_encodings
    }

    /// Indicates whether the provided [`Encoding`] is active.
    #[inline]
    #[must_use]
    pub fn is_active(&self, encoding: Encoding) -> bool {
        self.active_encodings.contains(&encoding)
    }

    /// Returns a copy of this [`SimulcastConfig`] with the provided
    /// [`Encoding`] activated.
    ///
    /// The new [`Encoding`] is placed before the first active one of a higher
    /// tier. Returns [`None`] if it's active already.
    #[must_use]
    pub fn with_encoding(&self, encoding: Encoding) -> Option<Self> {
        if self.is_active(encoding) {
            return None;
        }
        let mut encodings = self.active_encodings.clone();
        let pos = encodings
            .iter()
            .position(|e| *e > encoding)
            .unwrap_or(encodings.len());
        encodings.insert(pos, encoding);
        Some(Self {
            enabled: self.enabled,
            active_encodings: encodings,
        })
    }

    /// Returns a copy of this [`SimulcastConfig`] with the provided
    /// [`Encoding`] deactivated.
    ///
    /// Returns [`None`] if it isn't active.
    #[must_use]
    pub fn without_encoding(&self, encoding: Encoding) -> Option<Self> {
        if !self.is_active(encoding) {
            return None;
        }
        Some(Self {
            enabled: self.enabled,
            active_encodings: self
                .active_encodings
                .iter()
                .copied()
                .filter(|e| *e != encoding)
                .collect(),
        })
    }
}

/// Application-level type of a track, stored in its metadata under the
/// `"type"` key.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    /// Camera video.
    #[display(fmt = "camera")]
    Camera,

    /// Microphone audio.
    #[display(fmt = "audio")]
    Audio,

    /// Screen sharing video.
    #[display(fmt = "screensharing")]
    Screensharing,
}

impl TrackType {
    /// Key of the track metadata holding its [`TrackType`].
    pub const METADATA_KEY: &'static str = "type";

    /// Extracts [`TrackType`] from the provided track [`Metadata`].
    ///
    /// Returns [`None`] if there is no valid one.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        metadata
            .get(Self::METADATA_KEY)
            .and_then(Metadata::as_str)
            .and_then(|s| s.parse().ok())
    }
}

impl FromStr for TrackType {
    type Err = UnknownTrackTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camera" => Ok(Self::Camera),
            "audio" => Ok(Self::Audio),
            "screensharing" => Ok(Self::Screensharing),
            _ => Err(UnknownTrackTypeError(s.to_owned())),
        }
    }
}

/// Error of parsing an unknown [`TrackType`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "Unknown track type: `{}`", _0)]
pub struct UnknownTrackTypeError(pub String);
