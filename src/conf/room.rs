//! Room settings.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::media::{Encoding, MediaKind};

/// Room settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Room {
    /// Indicator whether video tracks are published with simulcast when no
    /// explicit simulcast settings are given.
    ///
    /// Defaults to `false`.
    pub simulcast: bool,

    /// [`Encoding`]s enabled for video tracks published with simulcast by
    /// default.
    ///
    /// Defaults to `["l", "m", "h"]`.
    #[default(Encoding::ALL.to_vec())]
    pub default_encodings: Vec<Encoding>,

    /// Maximum bandwidth of published tracks.
    pub bandwidth: Bandwidth,
}

/// Maximum bandwidth of published tracks, in kbps.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault,
)]
#[serde(default)]
pub struct Bandwidth {
    /// Maximum bandwidth of a video track.
    ///
    /// Defaults to `81920`.
    #[default(81_920)]
    pub video: u32,

    /// Maximum bandwidth of an audio track.
    ///
    /// Defaults to `8192`.
    #[default(8_192)]
    pub audio: u32,
}

impl Bandwidth {
    /// Returns maximum bandwidth of a track of the provided [`MediaKind`].
    #[inline]
    #[must_use]
    pub fn for_kind(&self, kind: MediaKind) -> u32 {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }
}
