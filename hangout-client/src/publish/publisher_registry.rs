use std::collections::HashMap;

use hangout_core::{MediaKind, PublisherId};
use tracing::{debug, info};

use crate::transport::LocalTrack;

/// Where a local publication is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationState {
    /// Track added to the publisher transport, offer not yet generated.
    Attached,
    /// Included in an offer that is waiting for its answer.
    Offered,
    /// Answer applied and `Publish` announced.
    Live,
}

/// Caller-facing handle to a live publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublisherHandle {
    pub publisher_id: PublisherId,
    pub kind: MediaKind,
}

/// A publication that ended, by request or because its transport failed.
#[derive(Debug)]
pub struct StoppedPublication {
    pub handle: PublisherHandle,
    /// `Publish` already went out, so peers must be told it is gone.
    pub announced: bool,
}

struct Publication {
    track: LocalTrack,
    state: PublicationState,
}

impl Publication {
    fn handle(&self) -> PublisherHandle {
        PublisherHandle {
            publisher_id: self.track.id().clone(),
            kind: self.track.kind(),
        }
    }
}

/// Running local publications keyed by publisher id. An entry leaves the
/// map as soon as it ends, so stopping an id that is not here is a no-op.
#[derive(Default)]
pub struct PublisherRegistry {
    publications: HashMap<PublisherId, Publication>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, track: LocalTrack) -> PublisherHandle {
        let publication = Publication {
            track,
            state: PublicationState::Attached,
        };
        let handle = publication.handle();
        debug!("Registered {} publication {}", handle.kind, handle.publisher_id);
        self.publications
            .insert(handle.publisher_id.clone(), publication);
        handle
    }

    /// Whether `publisher_id` is a running publication of this client.
    pub fn contains(&self, publisher_id: &PublisherId) -> bool {
        self.publications.contains_key(publisher_id)
    }

    pub fn state(&self, publisher_id: &PublisherId) -> Option<PublicationState> {
        self.publications.get(publisher_id).map(|p| p.state)
    }

    /// Everything attached since the last offer is now part of a new one.
    pub fn mark_offered(&mut self) {
        for publication in self.publications.values_mut() {
            if publication.state == PublicationState::Attached {
                publication.state = PublicationState::Offered;
            }
        }
    }

    /// Called once the answer is applied. Returns the publications that
    /// have to be announced with `Publish`.
    pub fn take_offered(&mut self) -> Vec<PublisherHandle> {
        let mut live: Vec<PublisherHandle> = self
            .publications
            .values_mut()
            .filter(|p| p.state == PublicationState::Offered)
            .map(|p| {
                p.state = PublicationState::Live;
                p.handle()
            })
            .collect();
        live.sort_by(|a, b| a.publisher_id.cmp(&b.publisher_id));
        live
    }

    /// Ends one publication and its track. Siblings are untouched. Returns
    /// `None` when the publication is unknown or already over.
    pub fn stop(&mut self, publisher_id: &PublisherId) -> Option<StoppedPublication> {
        let Some(publication) = self.publications.remove(publisher_id) else {
            debug!("Publication {} already ended", publisher_id);
            return None;
        };
        let announced = publication.state == PublicationState::Live;
        publication.track.stop();
        info!("Stopped {} publication {}", publication.track.kind(), publisher_id);
        Some(StoppedPublication {
            handle: publication.handle(),
            announced,
        })
    }

    /// Ends every publication and its track. Used when the publisher
    /// transport is torn down under them.
    pub fn fail_all(&mut self) -> Vec<StoppedPublication> {
        self.end_all()
    }

    /// Session teardown.
    pub fn stop_all(&mut self) -> Vec<StoppedPublication> {
        self.end_all()
    }

    fn end_all(&mut self) -> Vec<StoppedPublication> {
        let mut ended: Vec<StoppedPublication> = self
            .publications
            .drain()
            .map(|(_, p)| {
                let announced = p.state == PublicationState::Live;
                p.track.stop();
                StoppedPublication {
                    handle: p.handle(),
                    announced,
                }
            })
            .collect();
        ended.sort_by(|a, b| a.handle.publisher_id.cmp(&b.handle.publisher_id));
        ended
    }

    pub fn len(&self) -> usize {
        self.publications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }

    pub fn live(&self) -> Vec<PublisherHandle> {
        self.publications
            .values()
            .filter(|p| p.state == PublicationState::Live)
            .map(Publication::handle)
            .collect()
    }
}
