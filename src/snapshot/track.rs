//! Track records and structurally-shared transformations of track maps.

use std::rc::Rc;

use crate::media::{Encoding, MediaStream, MediaStreamTrack, SimulcastConfig};

use super::{Metadata, OrderedMap, TrackId};

/// Tracks of a single peer, keyed by [`TrackId`].
pub type TrackMap = OrderedMap<TrackId, Rc<Track>>;

/// Single media track slot of a peer.
///
/// A track without a [`MediaStream`] has been announced ("added") but isn't
/// ready for playback yet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Track {
    /// ID of this [`Track`].
    pub track_id: TrackId,

    /// [`MediaStream`] this [`Track`] belongs to, once ready.
    pub stream: Option<MediaStream>,

    /// Underlying [`MediaStreamTrack`], once ready.
    pub media_track: Option<MediaStreamTrack>,

    /// Application-defined metadata of this [`Track`].
    pub metadata: Rc<Metadata>,

    /// Simulcast settings of this [`Track`], if any.
    pub simulcast_config: Option<SimulcastConfig>,

    /// [`Encoding`] this [`Track`] is currently received with.
    pub encoding: Option<Encoding>,
}

impl Track {
    /// Creates a new [`Track`] which is not ready yet.
    #[must_use]
    pub fn new(track_id: TrackId, metadata: Metadata) -> Self {
        Self {
            track_id,
            stream: None,
            media_track: None,
            metadata: Rc::new(metadata),
            simulcast_config: None,
            encoding: None,
        }
    }

    /// Indicates whether this [`Track`] is ready for playback.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.stream.is_some()
    }
}

/// Returns a copy of `tracks` with the provided [`Track`] placed under its
/// ID, overwriting any previous one.
pub(crate) fn put(tracks: &Rc<TrackMap>, track: Track) -> Rc<TrackMap> {
    let mut next = TrackMap::clone(tracks);
    let _ = next.insert(track.track_id.clone(), Rc::new(track));
    Rc::new(next)
}

/// Applies the provided `f` to the [`Track`] with the provided ID.
///
/// `f` returns [`None`] if there is nothing to change. The very same
/// `tracks` is returned if the [`Track`] is absent or nothing has changed.
pub(crate) fn update<F>(
    tracks: &Rc<TrackMap>,
    track_id: &TrackId,
    f: F,
) -> Rc<TrackMap>
where
    F: FnOnce(&Track) -> Option<Track>,
{
    let updated = match tracks.get(track_id).and_then(|t| f(t.as_ref())) {
        Some(track) => track,
        None => return Rc::clone(tracks),
    };
    let mut next = TrackMap::clone(tracks);
    let _ = next.insert(track_id.clone(), Rc::new(updated));
    Rc::new(next)
}

/// Removes the [`Track`] with the provided ID.
///
/// The very same `tracks` is returned if there is no such [`Track`].
pub(crate) fn remove(
    tracks: &Rc<TrackMap>,
    track_id: &TrackId,
) -> Rc<TrackMap> {
    if !tracks.contains_key(track_id) {
        return Rc::clone(tracks);
    }
    let mut next = TrackMap::clone(tracks);
    let _ = next.remove(track_id);
    Rc::new(next)
}
