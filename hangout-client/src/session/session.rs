use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hangout_core::{ClientMessage, IceCandidate, MediaKind, PublisherId, ServerMessage, SessionDescription};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::audio::AudioContext;
use crate::binding::{ReleasedBinding, SubscribedOutcome, TrackBinder};
use crate::config::ClientConfig;
use crate::error::{ChannelClosed, ConnectError, Error, NegotiationError, Result};
use crate::publish::{PublisherHandle, PublisherRegistry};
use crate::room::{RoomSnapshot, RoomState, RoomView};
use crate::session::{MoveThrottle, PendingMove, SessionCommand, SessionEvent, SessionHandle};
use crate::signaling::{DisconnectReason, SignalingChannel, SignalingEvent, SignalingOutput};
use crate::transport::{
    LocalTrack, MediaDevices, MediaTransportPair, SignalingState, TransportEvent,
    TransportFactory, TransportRole,
};

type PublishReply = oneshot::Sender<Result<PublisherHandle>>;

enum Flow {
    Continue,
    Stop(DisconnectReason),
    Leave(oneshot::Sender<()>),
}

/// The orchestrator. Owns every piece of session state and is the only
/// writer of it; signaling messages, transport events, handle commands and
/// the tick are handled one at a time from a single loop.
pub struct Session {
    signaling: Arc<dyn SignalingOutput>,
    signaling_rx: mpsc::Receiver<SignalingEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transports: MediaTransportPair,
    publishers: PublisherRegistry,
    pending_publishes: HashMap<PublisherId, PublishReply>,
    binder: TrackBinder,
    room: RoomState,
    audio: AudioContext,
    throttle: MoveThrottle,
    snapshot_tx: watch::Sender<Arc<RoomSnapshot>>,
    event_tx: mpsc::Sender<SessionEvent>,
    tick_interval: Duration,
    connected: bool,
}

impl Session {
    /// Opens the signaling connection and starts the session loop.
    pub async fn connect(
        config: ClientConfig,
        factory: Arc<dyn TransportFactory>,
        devices: Arc<dyn MediaDevices>,
    ) -> Result<(SessionHandle, RoomView, mpsc::Receiver<SessionEvent>), ConnectError> {
        let (channel, events) = SignalingChannel::connect(&config).await?;
        Ok(Self::with_signaling(
            config,
            Arc::new(channel),
            events,
            factory,
            devices,
        ))
    }

    /// Starts the session loop over an already open signaling connection.
    pub fn with_signaling(
        config: ClientConfig,
        signaling: Arc<dyn SignalingOutput>,
        signaling_rx: mpsc::Receiver<SignalingEvent>,
        factory: Arc<dyn TransportFactory>,
        devices: Arc<dyn MediaDevices>,
    ) -> (SessionHandle, RoomView, mpsc::Receiver<SessionEvent>) {
        let capacity = config.event_channel_capacity.max(1);
        let (command_tx, command_rx) = mpsc::channel(config.command_channel_capacity.max(1));
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (transport_tx, transport_rx) = mpsc::channel(capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(RoomSnapshot {
            connected: true,
            ..Default::default()
        }));

        let session = Self {
            signaling,
            signaling_rx,
            command_rx,
            transport_rx,
            transports: MediaTransportPair::new(
                factory,
                transport_tx,
                config.transport.ice_servers.clone(),
                config.negotiation_timeout,
            ),
            publishers: PublisherRegistry::new(),
            pending_publishes: HashMap::new(),
            binder: TrackBinder::new(),
            room: RoomState::new(),
            audio: AudioContext::new(),
            throttle: MoveThrottle::new(config.move_interval),
            snapshot_tx,
            event_tx,
            tick_interval: config.tick_interval,
            connected: true,
        };
        tokio::spawn(session.run());

        (
            SessionHandle::new(command_tx, devices),
            RoomView::new(snapshot_rx),
            event_rx,
        )
    }

    async fn run(mut self) {
        info!("Session loop started");
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut leave_reply = None;
        let reason = loop {
            let flow = tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(c) => self.handle_command(c).await,
                    None => {
                        info!("All session handles dropped, leaving");
                        self.signaling.close().await;
                        Ok(Flow::Stop(DisconnectReason::ClosedLocally))
                    }
                },

                evt = self.signaling_rx.recv() => match evt {
                    Some(SignalingEvent::Message(msg)) => {
                        self.handle_message(msg).await.map(|_| Flow::Continue)
                    }
                    Some(SignalingEvent::Disconnected(reason)) => Ok(Flow::Stop(reason)),
                    None => Ok(Flow::Stop(DisconnectReason::Transport(
                        "signaling stream ended".to_owned(),
                    ))),
                },

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await.map(|_| Flow::Continue)
                }

                _ = ticker.tick() => self.on_tick().await.map(|_| Flow::Continue),
            };

            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(reason)) => break reason,
                Ok(Flow::Leave(reply)) => {
                    leave_reply = Some(reply);
                    break DisconnectReason::ClosedLocally;
                }
                Err(ChannelClosed) => {
                    break DisconnectReason::Transport(ChannelClosed.to_string());
                }
            }
        };

        self.teardown(reason).await;
        if let Some(reply) = leave_reply {
            let _ = reply.send(());
        }
        info!("Session loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) -> Result<Flow, ChannelClosed> {
        match cmd {
            SessionCommand::Publish { track, reply } => self.publish(track, reply).await?,

            SessionCommand::Stop { handle, reply } => {
                self.stop_publication(&handle.publisher_id).await?;
                let _ = reply.send(());
            }

            SessionCommand::Chat { message } => {
                self.signaling
                    .send(ClientMessage::ChatMessage { message })
                    .await?;
            }

            SessionCommand::Move {
                position,
                rotation,
                is_moving,
            } => {
                if let Some(change) = self.room.set_local_pose(position, rotation, is_moving) {
                    self.notify(SessionEvent::Room(change));
                }
                let pending = PendingMove {
                    position,
                    rotation,
                    is_moving,
                };
                if let Some(m) = self.throttle.push(pending, Instant::now()) {
                    self.signaling.send(m.into()).await?;
                }
            }

            SessionCommand::PlayAnimation { animation } => {
                self.signaling
                    .send(ClientMessage::PlayAnimation { animation })
                    .await?;
                if let Some(change) = self.room.set_local_animation(animation) {
                    self.notify(SessionEvent::Room(change));
                }
            }

            SessionCommand::Leave { reply } => {
                info!("Leaving room");
                self.signaling.close().await;
                return Ok(Flow::Leave(reply));
            }
        }

        self.publish_snapshot();
        Ok(Flow::Continue)
    }

    async fn publish(&mut self, track: LocalTrack, reply: PublishReply) -> Result<(), ChannelClosed> {
        let role = TransportRole::Publisher;
        if self.publishers.contains(track.id()) || track.is_ended() {
            let err = NegotiationError::transport(
                role,
                format!("track {} already published or ended", track.id()),
            );
            let _ = reply.send(Err(err.into()));
            return Ok(());
        }

        if self.transports.state(role) == SignalingState::Uninitialized {
            self.signaling.send(ClientMessage::PublisherInit).await?;
        }
        let attached = match self.transports.initialize(role).await {
            Ok(()) => self.transports.attach_track(&track).await,
            Err(e) => Err(e),
        };
        if let Err(e) = attached {
            warn!("Failed to publish {} track {}: {}", track.kind(), track.id(), e);
            track.stop();
            let _ = reply.send(Err(e.into()));
            return Ok(());
        }

        if track.kind() == MediaKind::Audio {
            self.audio.acquire("microphone");
        }
        let handle = self.publishers.register(track);
        info!("Publishing {} track {}", handle.kind, handle.publisher_id);
        self.pending_publishes.insert(handle.publisher_id.clone(), reply);
        Ok(())
    }

    async fn stop_publication(&mut self, publisher_id: &PublisherId) -> Result<(), ChannelClosed> {
        let Some(stopped) = self.publishers.stop(publisher_id) else {
            return Ok(());
        };
        if let Some(reply) = self.pending_publishes.remove(publisher_id) {
            let _ = reply.send(Err(Error::SessionEnded));
        }
        if stopped.announced {
            self.signaling
                .send(ClientMessage::StopPublish {
                    publisher_id: publisher_id.clone(),
                })
                .await?;
        }
        if let Err(e) = self.transports.detach_track(publisher_id).await {
            debug!("Detaching {} skipped: {}", publisher_id, e);
        }
        Ok(())
    }

    async fn handle_message(&mut self, msg: ServerMessage) -> Result<(), ChannelClosed> {
        debug!("Signaling message: {}", msg.action());

        match msg {
            ServerMessage::RoomState {
                ref your_player_id,
                ref room_theme,
                ref ice_servers,
                ..
            } => {
                self.transports.set_ice_servers(ice_servers.clone());
                self.notify(SessionEvent::RoomJoined {
                    local_player_id: your_player_id.clone(),
                    room_theme: room_theme.clone(),
                });
                self.room.apply(&msg);

                self.signaling.send(ClientMessage::SubscriberInit).await?;
                if let Err(e) = self.transports.initialize(TransportRole::Subscriber).await {
                    error!("Failed to initialize subscriber transport: {}", e);
                }
                self.flush_subscribes().await?;
            }

            ServerMessage::PlayerJoined { .. }
            | ServerMessage::PlayerMoved { .. }
            | ServerMessage::PlayerAnimation { .. } => {
                for change in self.room.apply(&msg) {
                    self.notify(SessionEvent::Room(change));
                }
            }

            ServerMessage::PlayerLeft { ref player_id } => {
                for change in self.room.apply(&msg) {
                    self.notify(SessionEvent::Room(change));
                }
                for released in self.binder.on_player_left(player_id) {
                    self.release_subscription(released).await?;
                }
            }

            ServerMessage::Published {
                publisher_ids,
                player_id,
            } => {
                // Our own announcements, including late echoes of stopped
                // publications, are never subscribed to.
                let own = self.room.local_player_id() == Some(&player_id);
                let publishers = &self.publishers;
                let resolved = self.binder.on_published(&player_id, &publisher_ids, |id| {
                    own || publishers.contains(id)
                });
                for binding in resolved {
                    info!(
                        "Bound {} track {} to player {}",
                        binding.media_kind,
                        binding.publisher_id,
                        binding.owner_player_id.short()
                    );
                    self.notify(SessionEvent::TrackBound(binding));
                }
                self.flush_subscribes().await?;
            }

            ServerMessage::Subscribed { subscriber_id } => {
                match self.binder.on_subscribed(subscriber_id) {
                    SubscribedOutcome::Attached(publisher_id) => {
                        debug!("Subscription to {} acknowledged", publisher_id);
                    }
                    SubscribedOutcome::Stale(subscriber_id) => {
                        self.signaling
                            .send(ClientMessage::StopSubscribe { subscriber_id })
                            .await?;
                    }
                    SubscribedOutcome::Unmatched => {}
                }
                self.flush_subscribes().await?;
            }

            ServerMessage::SubscribeFailed {
                publisher_id,
                error,
            } => {
                warn!("Subscription to {} failed: {}", publisher_id, error);
                self.binder.on_subscribe_failed(&publisher_id);
                self.notify(SessionEvent::SubscribeFailed {
                    publisher_id,
                    reason: error,
                });
                self.flush_subscribes().await?;
            }

            ServerMessage::Unpublished { publisher_id } => {
                if let Some(released) = self.binder.on_unpublished(&publisher_id) {
                    self.release_subscription(released).await?;
                }
            }

            ServerMessage::ChatMessage { sender, message } => {
                self.notify(SessionEvent::Chat { sender, message });
            }

            ServerMessage::Answer { sdp } => self.on_answer(sdp).await?,

            ServerMessage::Offer { sdp } => self.on_offer(sdp).await?,

            ServerMessage::PublisherIce { candidate } => {
                self.add_remote_candidate(TransportRole::Publisher, candidate)
                    .await;
            }

            ServerMessage::SubscriberIce { candidate } => {
                self.add_remote_candidate(TransportRole::Subscriber, candidate)
                    .await;
            }

            ServerMessage::Pong => {}
        }

        self.publish_snapshot();
        Ok(())
    }

    async fn on_answer(&mut self, sdp: SessionDescription) -> Result<(), ChannelClosed> {
        match self.transports.apply_answer(sdp).await {
            Ok(true) => {
                // The answer makes media flow; only now do peers learn the
                // publications exist.
                for handle in self.publishers.take_offered() {
                    self.signaling
                        .send(ClientMessage::Publish {
                            publisher_id: handle.publisher_id.clone(),
                        })
                        .await?;
                    info!("{} publication {} is live", handle.kind, handle.publisher_id);
                    if let Some(reply) = self.pending_publishes.remove(&handle.publisher_id) {
                        let _ = reply.send(Ok(handle.clone()));
                    }
                    self.notify(SessionEvent::PublicationLive(handle));
                }
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => self.recover(TransportRole::Publisher, e).await,
        }
    }

    async fn on_offer(&mut self, sdp: SessionDescription) -> Result<(), ChannelClosed> {
        match self.transports.accept_offer(sdp).await {
            Ok(answer) => {
                self.signaling
                    .send(ClientMessage::Answer { sdp: answer })
                    .await?;
                self.transports.answer_sent();
                Ok(())
            }
            Err(e) => self.recover(TransportRole::Subscriber, e).await,
        }
    }

    async fn add_remote_candidate(&mut self, role: TransportRole, candidate: IceCandidate) {
        if let Err(e) = self.transports.add_remote_candidate(role, candidate).await {
            warn!("Failed to add remote {} ICE candidate: {}", role, e);
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) -> Result<(), ChannelClosed> {
        if !self.transports.is_current(event.tag()) {
            debug!("Dropping event from replaced {} transport", event.tag().role);
            return Ok(());
        }

        match event {
            TransportEvent::CandidateGenerated(tag, candidate) => {
                let msg = match tag.role {
                    TransportRole::Publisher => ClientMessage::PublisherIce { candidate },
                    TransportRole::Subscriber => ClientMessage::SubscriberIce { candidate },
                };
                self.signaling.send(msg).await?;
            }

            TransportEvent::NegotiationNeeded(tag) => {
                if tag.role != TransportRole::Publisher {
                    return Ok(());
                }
                match self.transports.create_offer().await {
                    Ok(offer) => {
                        self.signaling
                            .send(ClientMessage::Offer { sdp: offer })
                            .await?;
                        self.publishers.mark_offered();
                    }
                    Err(e) => self.recover(tag.role, e).await?,
                }
            }

            TransportEvent::TrackReady(_, track) => {
                if track.kind() == MediaKind::Audio {
                    self.audio.acquire("remote audio");
                }
                if let Some(binding) = self.binder.on_track_ready(track) {
                    info!(
                        "Bound {} track {} to player {}",
                        binding.media_kind,
                        binding.publisher_id,
                        binding.owner_player_id.short()
                    );
                    self.notify(SessionEvent::TrackBound(binding));
                }
            }

            TransportEvent::Disconnected(tag) => {
                let error = NegotiationError::transport(tag.role, "peer connection lost");
                self.recover(tag.role, error).await?;
            }
        }

        self.publish_snapshot();
        Ok(())
    }

    async fn on_tick(&mut self) -> Result<(), ChannelClosed> {
        let now = Instant::now();
        if let Some(m) = self.throttle.flush(now) {
            self.signaling.send(m.into()).await?;
        }
        for role in self.transports.expired(now) {
            self.recover(role, NegotiationError::Timeout { role }).await?;
        }
        Ok(())
    }

    /// Sends the next queued Subscribe once the subscriber can receive the
    /// offer that answers it. Called again whenever the outstanding one is
    /// acknowledged or fails.
    async fn flush_subscribes(&mut self) -> Result<(), ChannelClosed> {
        if !self.binder.has_queued() {
            return Ok(());
        }
        if !self.transports.is_open(TransportRole::Subscriber) {
            debug!("Holding subscribes until the subscriber transport is ready");
            return Ok(());
        }
        if let Some(publisher_id) = self.binder.next_subscribe() {
            debug!("Subscribing to {}", publisher_id);
            self.signaling
                .send(ClientMessage::Subscribe { publisher_id })
                .await?;
        }
        Ok(())
    }

    /// Stops the server-side subscriber behind a released binding, if one
    /// was acknowledged. The server keeps it alive until told otherwise.
    async fn release_subscription(&mut self, released: ReleasedBinding) -> Result<(), ChannelClosed> {
        if let Some(subscriber_id) = released.subscriber_id.clone() {
            debug!("Stopping subscription {} for {}", subscriber_id, released.publisher_id);
            self.signaling
                .send(ClientMessage::StopSubscribe { subscriber_id })
                .await?;
        }
        if released.was_bound {
            self.notify(SessionEvent::TrackReleased(released));
        }
        Ok(())
    }

    /// Resets one side after a negotiation failure. The session itself
    /// keeps going.
    async fn recover(&mut self, role: TransportRole, error: NegotiationError) -> Result<(), ChannelClosed> {
        warn!("Resetting {} transport: {}", role, error);
        self.transports.reset(role).await;
        self.notify(SessionEvent::TransportReset {
            role,
            reason: error.to_string(),
        });

        match role {
            TransportRole::Publisher => {
                for ended in self.publishers.fail_all() {
                    let publisher_id = ended.handle.publisher_id;
                    if ended.announced {
                        self.signaling
                            .send(ClientMessage::StopPublish {
                                publisher_id: publisher_id.clone(),
                            })
                            .await?;
                    }
                    if let Some(reply) = self.pending_publishes.remove(&publisher_id) {
                        let _ = reply.send(Err(error.clone().into()));
                    }
                    self.notify(SessionEvent::PublicationFailed {
                        publisher_id,
                        reason: error.to_string(),
                    });
                }
            }
            TransportRole::Subscriber => {
                for released in self.binder.reset_subscriptions() {
                    self.notify(SessionEvent::TrackReleased(released));
                }
                if self.room.local_player_id().is_some() {
                    self.signaling.send(ClientMessage::SubscriberInit).await?;
                    match self.transports.initialize(role).await {
                        Ok(()) => self.flush_subscribes().await?,
                        Err(e) => error!("Failed to re-initialize subscriber transport: {}", e),
                    }
                }
            }
        }

        self.publish_snapshot();
        Ok(())
    }

    async fn teardown(&mut self, reason: DisconnectReason) {
        info!("Session ending: {}", reason);
        self.connected = false;
        self.transports.close().await;
        self.publishers.stop_all();
        for (_, reply) in self.pending_publishes.drain() {
            let _ = reply.send(Err(Error::SessionEnded));
        }
        self.binder.clear();
        self.room.clear();
        self.throttle.clear();
        self.audio.close();
        self.publish_snapshot();

        // The stream closing when the session drops tells a reader that
        // is behind the same thing.
        let terminal = SessionEvent::Disconnected(reason);
        if let Err(TrySendError::Full(_)) = self.event_tx.try_send(terminal) {
            warn!("Session event queue full, Disconnected not queued");
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = RoomSnapshot::capture(
            &self.room,
            self.binder.bindings(),
            self.audio.state(),
            self.connected,
        );
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    /// Never waits: a full queue means the application stopped reading.
    fn notify(&self, event: SessionEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Session event queue full, dropping event"),
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
