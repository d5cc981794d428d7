use std::collections::{HashMap, VecDeque};

use hangout_core::{MediaKind, PlayerId, PublisherId, SubscriberId};
use tracing::{debug, warn};

use crate::transport::RemoteTrack;

/// A remote track together with the player it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackBinding {
    pub publisher_id: PublisherId,
    pub owner_player_id: PlayerId,
    pub media_kind: MediaKind,
    pub track: RemoteTrack,
}

/// A binding that went away, resolved or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasedBinding {
    pub publisher_id: PublisherId,
    pub owner_player_id: Option<PlayerId>,
    pub subscriber_id: Option<SubscriberId>,
    /// The binding had been handed out as a [`TrackBinding`].
    pub was_bound: bool,
}

/// How a `Subscribed` acknowledgement was matched.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscribedOutcome {
    Attached(PublisherId),
    /// The publisher went away while the request was in flight; the
    /// subscription should be stopped.
    Stale(SubscriberId),
    Unmatched,
}

#[derive(Debug, Default)]
struct BindingEntry {
    owner: Option<PlayerId>,
    track: Option<RemoteTrack>,
    subscriber_id: Option<SubscriberId>,
    requested: bool,
}

impl BindingEntry {
    fn resolved(&self, publisher_id: &PublisherId) -> Option<TrackBinding> {
        match (&self.owner, &self.track) {
            (Some(owner), Some(track)) => Some(TrackBinding {
                publisher_id: publisher_id.clone(),
                owner_player_id: owner.clone(),
                media_kind: track.kind(),
                track: track.clone(),
            }),
            _ => None,
        }
    }

    fn release(self, publisher_id: PublisherId) -> ReleasedBinding {
        let was_bound = self.owner.is_some() && self.track.is_some();
        ReleasedBinding {
            publisher_id,
            owner_player_id: self.owner,
            subscriber_id: self.subscriber_id,
            was_bound,
        }
    }
}

/// Joins `Published` announcements and subscriber tracks, which arrive on
/// separate paths and in either order, into [`TrackBinding`]s. One entry per
/// publisher id holds whichever half is known.
#[derive(Debug, Default)]
pub struct TrackBinder {
    entries: HashMap<PublisherId, BindingEntry>,
    /// Subscribes decided on but not yet sent, oldest first.
    queued: VecDeque<PublisherId>,
    /// The one Subscribe waiting for `Subscribed` or `SubscribeFailed`.
    /// Acks carry no publisher id and the server may answer concurrent
    /// requests out of order, so only one is outstanding at a time.
    in_flight: Option<PublisherId>,
}

impl TrackBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the owner of each announced publisher. Ids rejected by
    /// `is_local` are our own publications and never subscribed to. Returns
    /// the bindings this announcement completed.
    pub fn on_published(
        &mut self,
        owner: &PlayerId,
        publisher_ids: &[PublisherId],
        is_local: impl Fn(&PublisherId) -> bool,
    ) -> Vec<TrackBinding> {
        let mut resolved = Vec::new();
        for publisher_id in publisher_ids {
            if is_local(publisher_id) {
                debug!("Skipping own publisher {}", publisher_id);
                continue;
            }

            let entry = self.entries.entry(publisher_id.clone()).or_default();
            let was_resolved = entry.owner.is_some() && entry.track.is_some();
            match &entry.owner {
                Some(current) if current != owner => {
                    warn!(
                        "Publisher {} moved from player {} to {}",
                        publisher_id,
                        current.short(),
                        owner.short()
                    );
                }
                _ => {}
            }
            entry.owner = Some(owner.clone());

            if !entry.requested {
                entry.requested = true;
                self.queued.push_back(publisher_id.clone());
            }
            if !was_resolved {
                resolved.extend(entry.resolved(publisher_id));
            }
        }
        resolved
    }

    /// Records a subscriber track. Returns the binding when its owner is
    /// already known.
    pub fn on_track_ready(&mut self, track: RemoteTrack) -> Option<TrackBinding> {
        let publisher_id = track.publisher_id().clone();
        let entry = self.entries.entry(publisher_id.clone()).or_default();
        let had_track = entry.track.is_some();
        entry.track = Some(track);
        entry.requested = true;

        if had_track {
            debug!("Replaced track for publisher {}", publisher_id);
            return None;
        }
        if entry.owner.is_none() {
            debug!("Track for {} arrived before its announcement", publisher_id);
        }
        entry.resolved(&publisher_id)
    }

    pub fn has_queued(&self) -> bool {
        !self.queued.is_empty()
    }

    /// Hands out the next Subscribe to send and marks it outstanding.
    /// Returns `None` while an earlier one is still unanswered.
    pub fn next_subscribe(&mut self) -> Option<PublisherId> {
        if self.in_flight.is_some() {
            return None;
        }
        let publisher_id = self.queued.pop_front()?;
        self.in_flight = Some(publisher_id.clone());
        Some(publisher_id)
    }

    pub fn in_flight(&self) -> Option<&PublisherId> {
        self.in_flight.as_ref()
    }

    /// Matches an acknowledgement with the outstanding Subscribe.
    pub fn on_subscribed(&mut self, subscriber_id: SubscriberId) -> SubscribedOutcome {
        let Some(publisher_id) = self.in_flight.take() else {
            warn!("Subscribed {} without an outstanding request", subscriber_id);
            return SubscribedOutcome::Unmatched;
        };
        match self.entries.get_mut(&publisher_id) {
            Some(entry) => {
                entry.subscriber_id = Some(subscriber_id);
                SubscribedOutcome::Attached(publisher_id)
            }
            None => SubscribedOutcome::Stale(subscriber_id),
        }
    }

    /// The server gave up on a subscription. The entry forgets the request
    /// so a later announcement can try again.
    pub fn on_subscribe_failed(&mut self, publisher_id: &PublisherId) -> bool {
        if self.in_flight.as_ref() != Some(publisher_id) {
            warn!("SubscribeFailed for {} without an outstanding request", publisher_id);
            return false;
        }
        self.in_flight = None;
        if self
            .entries
            .get(publisher_id)
            .is_some_and(|entry| entry.track.is_none())
        {
            self.entries.remove(publisher_id);
        }
        true
    }

    pub fn on_unpublished(&mut self, publisher_id: &PublisherId) -> Option<ReleasedBinding> {
        self.queued.retain(|id| id != publisher_id);
        match self.entries.remove(publisher_id) {
            Some(entry) => Some(entry.release(publisher_id.clone())),
            None => {
                warn!("Unpublished for unknown publisher {}", publisher_id);
                None
            }
        }
    }

    /// Drops every binding owned by `player_id`, whether or not the matching
    /// `Unpublished` messages have arrived.
    pub fn on_player_left(&mut self, player_id: &PlayerId) -> Vec<ReleasedBinding> {
        let owned: Vec<PublisherId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.owner.as_ref() == Some(player_id))
            .map(|(id, _)| id.clone())
            .collect();

        let mut released = Vec::with_capacity(owned.len());
        for publisher_id in owned {
            self.queued.retain(|id| id != &publisher_id);
            if let Some(entry) = self.entries.remove(&publisher_id) {
                released.push(entry.release(publisher_id));
            }
        }
        released.sort_by(|a, b| a.publisher_id.cmp(&b.publisher_id));
        released
    }

    /// Forgets every subscription after the subscriber transport was
    /// replaced. Publishers with a known owner are queued again; the
    /// bindings that were live are returned.
    pub fn reset_subscriptions(&mut self) -> Vec<ReleasedBinding> {
        self.in_flight = None;
        self.queued.clear();

        let mut released = Vec::new();
        let mut ids: Vec<PublisherId> = self.entries.keys().cloned().collect();
        ids.sort();
        for publisher_id in ids {
            let Some(entry) = self.entries.get_mut(&publisher_id) else {
                continue;
            };
            if entry.owner.is_some() && entry.track.is_some() {
                released.push(ReleasedBinding {
                    publisher_id: publisher_id.clone(),
                    owner_player_id: entry.owner.clone(),
                    subscriber_id: entry.subscriber_id.clone(),
                    was_bound: true,
                });
            }
            entry.track = None;
            entry.subscriber_id = None;
            if entry.owner.is_some() {
                entry.requested = true;
                self.queued.push_back(publisher_id);
            } else {
                self.entries.remove(&publisher_id);
            }
        }
        released
    }

    /// Resolved bindings, ordered by publisher id.
    pub fn bindings(&self) -> Vec<TrackBinding> {
        let mut bindings: Vec<TrackBinding> = self
            .entries
            .iter()
            .filter_map(|(id, entry)| entry.resolved(id))
            .collect();
        bindings.sort_by(|a, b| a.publisher_id.cmp(&b.publisher_id));
        bindings
    }

    pub fn binding(&self, publisher_id: &PublisherId) -> Option<TrackBinding> {
        self.entries
            .get(publisher_id)
            .and_then(|entry| entry.resolved(publisher_id))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.queued.clear();
        self.in_flight = None;
    }
}
