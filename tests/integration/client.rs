//! Media engine recording the calls made to it.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use futures::future::{self, LocalBoxFuture};
use tracerr::Traced;
use videoroom::{
    media::SimulcastConfig,
    room::{MediaClient, MediaClientError},
    Encoding, Metadata, MediaStream, MediaStreamTrack, Room, TrackId,
};

/// Call made to a [`FakeMediaClient`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Join(Metadata),
    Leave,
    AddTrack {
        track_id: TrackId,
        simulcast: Option<Vec<Encoding>>,
        max_bandwidth: u32,
    },
    ReplaceTrack(TrackId),
    RemoveTrack(TrackId),
    UpdateTrackMetadata(TrackId, Metadata),
    EnableEncoding(TrackId, Encoding),
    DisableEncoding(TrackId, Encoding),
    SetTargetEncoding(TrackId, Encoding),
}

#[derive(Default)]
pub struct FakeMediaClient {
    calls: RefCell<Vec<Call>>,
    last_track_id: Cell<u32>,
    replace_error: RefCell<Option<String>>,
}

impl FakeMediaClient {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Makes the next `replace_track()` call fail with the provided message.
    pub fn fail_next_replace(&self, message: &str) {
        *self.replace_error.borrow_mut() = Some(message.to_owned());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl MediaClient for FakeMediaClient {
    fn join(&self, metadata: Metadata) {
        self.record(Call::Join(metadata));
    }

    fn leave(&self) {
        self.record(Call::Leave);
    }

    fn add_track(
        &self,
        _: MediaStreamTrack,
        _: MediaStream,
        _: Metadata,
        simulcast_config: Option<SimulcastConfig>,
        max_bandwidth: u32,
    ) -> TrackId {
        let id = self.last_track_id.get() + 1;
        self.last_track_id.set(id);
        let track_id = TrackId::from(format!("local-{}", id));
        self.record(Call::AddTrack {
            track_id: track_id.clone(),
            simulcast: simulcast_config
                .map(|c| c.active_encodings().to_vec()),
            max_bandwidth,
        });
        track_id
    }

    fn replace_track(
        &self,
        track_id: TrackId,
        _: MediaStreamTrack,
        _: Option<Metadata>,
    ) -> LocalBoxFuture<'static, Result<(), Traced<MediaClientError>>> {
        self.record(Call::ReplaceTrack(track_id));
        match self.replace_error.borrow_mut().take() {
            Some(msg) => {
                Box::pin(future::err(tracerr::new!(MediaClientError(msg))))
            }
            None => Box::pin(future::ok(())),
        }
    }

    fn remove_track(&self, track_id: TrackId) {
        self.record(Call::RemoveTrack(track_id));
    }

    fn update_track_metadata(&self, track_id: TrackId, metadata: Metadata) {
        self.record(Call::UpdateTrackMetadata(track_id, metadata));
    }

    fn enable_track_encoding(&self, track_id: TrackId, encoding: Encoding) {
        self.record(Call::EnableEncoding(track_id, encoding));
    }

    fn disable_track_encoding(&self, track_id: TrackId, encoding: Encoding) {
        self.record(Call::DisableEncoding(track_id, encoding));
    }

    fn set_target_track_encoding(&self, track_id: TrackId, encoding: Encoding) {
        self.record(Call::SetTargetEncoding(track_id, encoding));
    }
}

/// Creates a new [`Room`] with default settings over a fresh
/// [`FakeMediaClient`].
pub fn room() -> (Room, Rc<FakeMediaClient>) {
    room_with(videoroom::conf::Room::default())
}

/// Creates a new [`Room`] with the provided settings over a fresh
/// [`FakeMediaClient`].
pub fn room_with(conf: videoroom::conf::Room) -> (Room, Rc<FakeMediaClient>) {
    let client = FakeMediaClient::new();
    let room = Room::new(Rc::clone(&client) as Rc<dyn MediaClient>, conf);
    (room, client)
}
