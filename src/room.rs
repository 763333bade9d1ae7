//! Session of the local peer in a videoroom.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

use derive_more::{Display, From};
use futures::{
    channel::mpsc,
    future::{self, LocalBoxFuture},
    stream::{self, LocalBoxStream},
    Stream, StreamExt as _,
};
use tracerr::Traced;
use videoroom_reactive::{Selection, Store};

use crate::{
    conf,
    event::Event,
    media::{
        DuplicateEncodingError, Encoding, MediaKind, MediaStream,
        MediaStreamTrack, SimulcastConfig,
    },
    reducer::Reducer,
    snapshot::{Metadata, PeerId, Snapshot, Track, TrackId},
};

/// Failure reported by the media engine.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "Media engine failed: {}", _0)]
pub struct MediaClientError(pub String);

/// Media engine the [`Room`] publishes and receives tracks through.
///
/// Results of the engine's work are reported back as [`Event`]s, which are
/// expected to be fed into [`Room::handle_event()`].
#[cfg_attr(test, mockall::automock)]
pub trait MediaClient {
    /// Starts joining the room with the provided metadata of the local peer.
    fn join(&self, metadata: Metadata);

    /// Leaves the room.
    fn leave(&self);

    /// Starts publishing the provided [`MediaStreamTrack`].
    ///
    /// Returns ID assigned to the published track.
    fn add_track(
        &self,
        track: MediaStreamTrack,
        stream: MediaStream,
        metadata: Metadata,
        simulcast_config: Option<SimulcastConfig>,
        max_bandwidth: u32,
    ) -> TrackId;

    /// Replaces the [`MediaStreamTrack`] of the published track.
    fn replace_track(
        &self,
        track_id: TrackId,
        track: MediaStreamTrack,
        metadata: Option<Metadata>,
    ) -> LocalBoxFuture<'static, Result<(), Traced<MediaClientError>>>;

    /// Stops publishing the track.
    fn remove_track(&self, track_id: TrackId);

    /// Replaces metadata of the published track.
    fn update_track_metadata(&self, track_id: TrackId, metadata: Metadata);

    /// Starts sending the published track with the provided [`Encoding`].
    fn enable_track_encoding(&self, track_id: TrackId, encoding: Encoding);

    /// Stops sending the published track with the provided [`Encoding`].
    fn disable_track_encoding(&self, track_id: TrackId, encoding: Encoding);

    /// Asks the server to forward the received track with the provided
    /// [`Encoding`].
    fn set_target_track_encoding(&self, track_id: TrackId, encoding: Encoding);
}

/// Errors of [`Room`] operations.
#[derive(Clone, Debug, Display, From, PartialEq)]
pub enum RoomError {
    /// The [`Room`] has been left.
    #[display(fmt = "Room has been left")]
    Closed,

    /// There is no track with the provided ID.
    #[display(fmt = "Track with {} ID doesn't exist", _0)]
    #[from(ignore)]
    UnknownTrack(TrackId),

    /// The media engine failed to perform the operation.
    #[display(fmt = "{}", _0)]
    MediaClient(MediaClientError),

    /// Simulcast settings are malformed.
    #[display(fmt = "Invalid simulcast settings: {}", _0)]
    Simulcast(DuplicateEncodingError),
}

/// State of the connection with the media server.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ConnectionStatus {
    /// [`Room::join()`] hasn't been called yet, or the [`Room`] has been
    /// left.
    #[display(fmt = "before_connection")]
    BeforeConnection,

    /// Joining is in progress.
    #[display(fmt = "connecting")]
    Connecting,

    /// The local peer has joined the room.
    #[display(fmt = "connected")]
    Connected,

    /// Joining was refused or the connection has failed.
    #[display(fmt = "error")]
    Error,
}

/// Session of the local peer in a videoroom.
///
/// Owns the [`Store`] of the room [`Snapshot`] for the whole session. Once
/// [`Room::leave()`] is called (or the [`Room`] is dropped) the [`Store`] is
/// gone: all its [`Selection`]s observe no snapshot, and all the streams
/// returned by the [`Room`] end.
pub struct Room {
    /// Media engine of this [`Room`].
    client: Rc<dyn MediaClient>,

    /// Settings of this [`Room`].
    conf: conf::Room,

    /// [`Reducer`] owning the [`Store`]. [`None`] once the [`Room`] is
    /// left.
    session: RefCell<Option<Rc<Reducer>>>,

    /// Current [`ConnectionStatus`].
    status: Cell<ConnectionStatus>,

    /// Subscribers to [`ConnectionStatus`] changes.
    status_subs: RefCell<Vec<mpsc::UnboundedSender<ConnectionStatus>>>,

    /// Subscribers to handled [`Event`]s.
    event_subs: RefCell<Vec<mpsc::UnboundedSender<Event>>>,

    /// Subscribers to connection failures.
    error_subs: RefCell<Vec<mpsc::UnboundedSender<String>>>,

    /// [`Event`]s received while another one is being handled.
    queued: RefCell<VecDeque<Event>>,

    /// Indicator whether an [`Event`] is being handled right now.
    handling: Cell<bool>,
}

impl Room {
    /// Creates a new [`Room`] with an empty [`Snapshot`].
    #[must_use]
    pub fn new(client: Rc<dyn MediaClient>, conf: conf::Room) -> Self {
        let store = Store::new(Snapshot::default());
        Self {
            client,
            conf,
            session: RefCell::new(Some(Rc::new(Reducer::new(store)))),
            status: Cell::new(ConnectionStatus::BeforeConnection),
            status_subs: RefCell::default(),
            event_subs: RefCell::default(),
            error_subs: RefCell::default(),
            queued: RefCell::default(),
            handling: Cell::new(false),
        }
    }

    /// Returns the [`Store`] of this [`Room`], if it hasn't been left.
    ///
    /// Holding the returned [`Rc`] keeps the [`Store`] alive after
    /// [`Room::leave()`], so prefer [`Room::select()`] for observing it.
    #[must_use]
    pub fn store(&self) -> Option<Rc<Store<Snapshot>>> {
        self.session.borrow().as_ref().map(|r| Rc::clone(r.store()))
    }

    /// Returns the current [`Snapshot`], if the [`Room`] hasn't been left.
    #[must_use]
    pub fn snapshot(&self) -> Option<Rc<Snapshot>> {
        self.session
            .borrow()
            .as_ref()
            .map(|r| r.store().get_snapshot())
    }

    /// Binds the provided `selector` to the [`Store`] of this [`Room`].
    ///
    /// See [`crate::selectors`] for the ready-made ones.
    pub fn select<S, O>(&self, selector: S) -> Rc<Selection<Snapshot, O>>
    where
        S: Fn(Option<&Snapshot>) -> O + 'static,
        O: PartialEq + 'static,
    {
        Selection::new(self.store().as_ref(), selector)
    }

    /// Starts joining the room with the provided metadata of the local peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] has been left.
    pub fn join(&self, metadata: Metadata) -> Result<(), Traced<RoomError>> {
        let reducer = self.session().map_err(tracerr::wrap!())?;
        reducer.set_join_metadata(metadata.clone());
        self.client.join(metadata);
        self.set_status(ConnectionStatus::Connecting);
        Ok(())
    }

    /// Leaves the room and drops its [`Store`].
    ///
    /// Ends all the streams returned by this [`Room`]. Does nothing if the
    /// [`Room`] has been left already.
    pub fn leave(&self) {
        let session = self.session.borrow_mut().take();
        if session.is_none() {
            return;
        }
        drop(session);
        self.client.leave();
        self.set_status(ConnectionStatus::BeforeConnection);
        self.status_subs.borrow_mut().clear();
        self.event_subs.borrow_mut().clear();
        self.error_subs.borrow_mut().clear();
    }

    /// Applies the provided [`Event`] of the media engine.
    ///
    /// The [`Snapshot`] is updated first, then the [`ConnectionStatus`], and
    /// then the [`Event`] is emitted to [`Room::on_event()`] subscribers.
    /// [`Event`]s arriving after [`Room::leave()`] are dropped.
    ///
    /// An [`Event`] handed over while another one is being handled (from a
    /// [`Store`] listener, for example) is handled right after it.
    pub fn handle_event(&self, event: Event) {
        self.queued.borrow_mut().push_back(event);
        if self.handling.replace(true) {
            return;
        }
        let _guard = ResetOnDrop(&self.handling);
        loop {
            let next = self.queued.borrow_mut().pop_front();
            match next {
                Some(event) => self.apply_event(event),
                None => break,
            }
        }
    }

    /// Applies all the [`Event`]s of the provided [`Stream`] one by one, in
    /// their order.
    pub async fn process_events<S>(&self, events: S)
    where
        S: Stream<Item = Event>,
    {
        events
            .for_each(|event| {
                self.handle_event(event);
                future::ready(())
            })
            .await;
    }

    /// Returns a [`Stream`] of all the [`Event`]s handled by this [`Room`]
    /// from now on.
    pub fn on_event(&self) -> LocalBoxStream<'static, Event> {
        subscribe(self.is_left(), &self.event_subs)
    }

    /// Returns a [`Stream`] of connection failure descriptions.
    pub fn on_connection_error(&self) -> LocalBoxStream<'static, String> {
        subscribe(self.is_left(), &self.error_subs)
    }

    /// Returns the current [`ConnectionStatus`].
    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// Returns a [`Stream`] yielding the current [`ConnectionStatus`] and
    /// then each of its changes.
    pub fn on_status_change(
        &self,
    ) -> LocalBoxStream<'static, ConnectionStatus> {
        let current = stream::once(future::ready(self.status.get()));
        current
            .chain(subscribe(self.is_left(), &self.status_subs))
            .boxed_local()
    }

    /// Publishes the provided [`MediaStreamTrack`] and places it into the
    /// local tracks of the [`Snapshot`].
    ///
    /// Video tracks published without `simulcast_config` get the default
    /// encodings of [`conf::Room`] if simulcast is enabled there.
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left.
    /// - [`RoomError::Simulcast`] if the default encodings are malformed.
    pub fn add_track(
        &self,
        track: MediaStreamTrack,
        stream: MediaStream,
        metadata: Metadata,
        simulcast_config: Option<SimulcastConfig>,
    ) -> Result<TrackId, Traced<RoomError>> {
        let reducer = self.session().map_err(tracerr::wrap!())?;
        let kind = track.kind();
        let simulcast_config = match simulcast_config {
            Some(config) => Some(config),
            None if kind == MediaKind::Video && self.conf.simulcast => Some(
                SimulcastConfig::new(
                    true,
                    self.conf.default_encodings.iter().copied(),
                )
                .map_err(tracerr::from_and_wrap!())?,
            ),
            None => None,
        };

        let track_id = self.client.add_track(
            track.clone(),
            stream.clone(),
            metadata.clone(),
            simulcast_config.clone(),
            self.conf.bandwidth.for_kind(kind),
        );
        reducer.add_local_track(Track {
            stream: Some(stream),
            media_track: Some(track),
            simulcast_config,
            ..Track::new(track_id.clone(), metadata)
        });
        Ok(track_id)
    }

    /// Replaces the [`MediaStreamTrack`] (and the metadata) of the local
    /// track.
    ///
    /// The [`Snapshot`] is updated only once the media engine succeeds.
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left (even while
    ///   replacing).
    /// - [`RoomError::UnknownTrack`] if there is no such local track.
    /// - [`RoomError::MediaClient`] if the media engine fails.
    pub fn replace_track(
        &self,
        track_id: TrackId,
        track: MediaStreamTrack,
        metadata: Option<Metadata>,
    ) -> LocalBoxFuture<'static, Result<(), Traced<RoomError>>> {
        let reducer = match self.local_session(&track_id) {
            Ok(reducer) => reducer,
            Err(e) => return Box::pin(future::err(e)),
        };
        let reducer = Rc::downgrade(&reducer);
        let replaced = self.client.replace_track(
            track_id.clone(),
            track.clone(),
            metadata.clone(),
        );

        Box::pin(async move {
            replaced.await.map_err(tracerr::map_from_and_wrap!())?;
            let reducer = Weak::upgrade(&reducer)
                .ok_or_else(|| tracerr::new!(RoomError::Closed))?;
            reducer.replace_local_track(track_id, track, metadata);
            Ok(())
        })
    }

    /// Stops publishing the local track and removes it from the [`Snapshot`].
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left.
    /// - [`RoomError::UnknownTrack`] if there is no such local track.
    pub fn remove_track(
        &self,
        track_id: TrackId,
    ) -> Result<(), Traced<RoomError>> {
        let reducer =
            self.local_session(&track_id).map_err(tracerr::wrap!())?;
        self.client.remove_track(track_id.clone());
        reducer.remove_local_track(track_id);
        Ok(())
    }

    /// Replaces metadata of the local track.
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left.
    /// - [`RoomError::UnknownTrack`] if there is no such local track.
    pub fn update_track_metadata(
        &self,
        track_id: TrackId,
        metadata: Metadata,
    ) -> Result<(), Traced<RoomError>> {
        let reducer =
            self.local_session(&track_id).map_err(tracerr::wrap!())?;
        self.client
            .update_track_metadata(track_id.clone(), metadata.clone());
        reducer.update_local_track_metadata(track_id, metadata);
        Ok(())
    }

    /// Starts sending the local track with the provided [`Encoding`].
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left.
    /// - [`RoomError::UnknownTrack`] if there is no such local track.
    pub fn enable_track_encoding(
        &self,
        track_id: TrackId,
        encoding: Encoding,
    ) -> Result<(), Traced<RoomError>> {
        let reducer =
            self.local_session(&track_id).map_err(tracerr::wrap!())?;
        self.client.enable_track_encoding(track_id.clone(), encoding);
        reducer.toggle_local_encoding(track_id, encoding, true);
        Ok(())
    }

    /// Stops sending the local track with the provided [`Encoding`].
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left.
    /// - [`RoomError::UnknownTrack`] if there is no such local track.
    pub fn disable_track_encoding(
        &self,
        track_id: TrackId,
        encoding: Encoding,
    ) -> Result<(), Traced<RoomError>> {
        let reducer =
            self.local_session(&track_id).map_err(tracerr::wrap!())?;
        self.client.disable_track_encoding(track_id.clone(), encoding);
        reducer.toggle_local_encoding(track_id, encoding, false);
        Ok(())
    }

    /// Asks the server to forward the remote track with the provided
    /// [`Encoding`].
    ///
    /// The [`Snapshot`] changes only once the server confirms it with an
    /// [`Event::TrackEncodingChanged`].
    ///
    /// # Errors
    ///
    /// - [`RoomError::Closed`] if the [`Room`] has been left.
    /// - [`RoomError::UnknownTrack`] if there is no such remote track.
    pub fn set_target_track_encoding(
        &self,
        peer_id: &PeerId,
        track_id: TrackId,
        encoding: Encoding,
    ) -> Result<(), Traced<RoomError>> {
        let reducer = self.session().map_err(tracerr::wrap!())?;
        if reducer
            .store()
            .get_snapshot()
            .remote_track(peer_id, &track_id)
            .is_none()
        {
            return Err(tracerr::new!(RoomError::UnknownTrack(track_id)));
        }
        self.client.set_target_track_encoding(track_id, encoding);
        Ok(())
    }

    /// Applies the provided [`Event`] to the [`Store`], and then reports it
    /// out-of-band.
    fn apply_event(&self, event: Event) {
        let reducer = match self.session.borrow().as_ref() {
            Some(reducer) => Rc::clone(reducer),
            None => {
                log::debug!("{} event is dropped: room is left", event.name());
                return;
            }
        };
        log::debug!("Handling {} event", event.name());

        let status = match &event {
            Event::JoinSuccess { .. } => Some(ConnectionStatus::Connected),
            Event::JoinError { .. } | Event::ConnectionError { .. } => {
                Some(ConnectionStatus::Error)
            }
            _ => None,
        };
        let forwarded = (!self.event_subs.borrow().is_empty())
            .then(|| event.clone());
        let connection_error = match &event {
            Event::ConnectionError { message } => Some(message.clone()),
            _ => None,
        };

        event.dispatch_with(reducer.as_ref());
        if self.is_left() {
            return;
        }

        if let Some(status) = status {
            self.set_status(status);
        }
        if let Some(message) = connection_error {
            log::warn!("Connection with media server failed: {}", message);
            broadcast(&self.error_subs, &message);
        }
        if let Some(event) = forwarded {
            broadcast(&self.event_subs, &event);
        }
    }

    /// Indicates whether this [`Room`] has been left.
    fn is_left(&self) -> bool {
        self.session.borrow().is_none()
    }

    /// Returns the [`Reducer`] of the current session.
    fn session(&self) -> Result<Rc<Reducer>, Traced<RoomError>> {
        self.session
            .borrow()
            .as_ref()
            .map(Rc::clone)
            .ok_or_else(|| tracerr::new!(RoomError::Closed))
    }

    /// Returns the [`Reducer`] of the current session, ensuring the local
    /// track with the provided ID exists.
    fn local_session(
        &self,
        track_id: &TrackId,
    ) -> Result<Rc<Reducer>, Traced<RoomError>> {
        let reducer = self.session().map_err(tracerr::wrap!())?;
        if reducer.store().get_snapshot().local_track(track_id).is_none() {
            return Err(tracerr::new!(RoomError::UnknownTrack(
                track_id.clone()
            )));
        }
        Ok(reducer)
    }

    /// Sets the current [`ConnectionStatus`], notifying subscribers if it
    /// changes.
    fn set_status(&self, status: ConnectionStatus) {
        if self.status.replace(status) != status {
            broadcast(&self.status_subs, &status);
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("conf", &self.conf)
            .field("status", &self.status.get())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

/// Resets the wrapped flag once dropped.
struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Sends the provided `value` to all the `subs`, forgetting the gone ones.
fn broadcast<T: Clone>(
    subs: &RefCell<Vec<mpsc::UnboundedSender<T>>>,
    value: &T,
) {
    subs.borrow_mut()
        .retain(|sub| sub.unbounded_send(value.clone()).is_ok());
}

/// Registers a new subscriber in the provided `subs`.
///
/// Returns an already finished [`Stream`] if `closed`.
fn subscribe<T: 'static>(
    closed: bool,
    subs: &RefCell<Vec<mpsc::UnboundedSender<T>>>,
) -> LocalBoxStream<'static, T> {
    if closed {
        return stream::empty().boxed_local();
    }
    let (tx, rx) = mpsc::unbounded();
    subs.borrow_mut().push(tx);
    rx.boxed_local()
}
