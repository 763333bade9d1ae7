use std::{cell::RefCell, rc::Rc};

use futures::{FutureExt as _, StreamExt as _};
use serde_json::json;
use videoroom::{
    selectors, Event, PeerId, PeerInfo, Selection, Snapshot, TrackContext,
};

use crate::{client, timeout};

#[tokio::test]
async fn changes_skip_unrelated_updates() {
    let (room, _) = client::room();
    let peers = room.select(selectors::peer_ids());
    let mut changes = peers.changes();
    assert!(changes.next().await.unwrap().is_empty());

    room.handle_event(Event::JoinSuccess {
        local_peer_id: "me".into(),
        peers_in_room: vec![PeerInfo::new("p1", json!({}))],
    });
    room.handle_event(Event::TrackAdded {
        ctx: TrackContext::new("p1", "t1"),
    });
    room.handle_event(Event::PeerUpdated {
        peer: PeerInfo::new("p1", json!({"displayName": "Bob"})),
    });
    room.handle_event(Event::PeerJoined {
        peer: PeerInfo::new("p2", json!({})),
    });

    assert_eq!(
        *timeout(changes.next()).await.flatten().unwrap(),
        vec![PeerId::from("p1")],
    );
    assert_eq!(
        *timeout(changes.next()).await.flatten().unwrap(),
        vec![PeerId::from("p1"), PeerId::from("p2")],
    );
    assert!(changes.next().now_or_never().is_none());
}

#[tokio::test]
async fn when_resolves_on_matching_value() {
    let (room, _) = client::room();
    room.handle_event(Event::JoinSuccess {
        local_peer_id: "me".into(),
        peers_in_room: vec![],
    });
    let peers = room.select(selectors::peer_ids());
    let bob_joined = peers.when_eq(vec![PeerId::from("bob")]);

    room.handle_event(Event::PeerJoined {
        peer: PeerInfo::new("bob", json!({})),
    });

    assert_eq!(timeout(bob_joined).await, Some(Ok(())));
}

#[test]
fn selection_without_store_returns_defaults() {
    let peers = Selection::new(None, selectors::peer_ids());
    let metadata = Selection::new(
        None,
        selectors::track_metadata("p1".into(), "t1".into()),
    );
    let full = Selection::new(None, selectors::full_state());

    let subscription = peers.subscribe(|| unreachable!());

    assert!(!subscription.is_active());
    assert!(peers.get().is_empty());
    assert_eq!(*metadata.get(), json!({}));
    assert_eq!(*full.get(), None);
    assert!(Rc::ptr_eq(&peers.get(), &peers.get()));
}

#[test]
fn full_state_shares_stored_data() {
    let (room, _) = client::room();
    room.handle_event(Event::JoinSuccess {
        local_peer_id: "me".into(),
        peers_in_room: vec![PeerInfo::new("p1", json!({}))],
    });

    let full = room.select(selectors::full_state()).get();
    let stored = room.snapshot().unwrap();

    let full: &Snapshot = (*full).as_ref().unwrap();
    assert!(Rc::ptr_eq(&full.local, &stored.local));
    assert!(Rc::ptr_eq(&full.remote, &stored.remote));
}

#[test]
fn unsubscribe_is_idempotent() {
    let (room, _) = client::room();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let peers = room.select(selectors::peer_ids());
    let subscription = peers.subscribe({
        let (seen, peers) = (Rc::clone(&seen), Rc::clone(&peers));
        move || seen.borrow_mut().push(peers.get().len())
    });

    room.handle_event(Event::JoinSuccess {
        local_peer_id: "me".into(),
        peers_in_room: vec![PeerInfo::new("p1", json!({}))],
    });
    subscription.unsubscribe();
    subscription.unsubscribe();
    room.handle_event(Event::PeerJoined {
        peer: PeerInfo::new("p2", json!({})),
    });

    assert_eq!(*seen.borrow(), vec![1]);
    assert!(!subscription.is_active());
}
