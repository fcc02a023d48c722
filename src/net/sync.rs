//! Network state synchronization
//!
//! Outbound: local movement is throttled to a fixed minimum interval,
//! pose updates are deadbanded, shoot/hit reports go out immediately.
//! Inbound: events mutate shadow entities keyed by remote id and are
//! drained only at tick boundaries, so the simulation always sees a
//! consistent remote snapshot for the duration of one frame.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::augment::{AugmentAggregate, AugmentKind};
use crate::config::{NetTuning, WeaponTuning};
use crate::game::combat::WeaponStats;
use crate::game::player::{Facing, PlayerSnapshot};
use crate::net::protocol::{
    BulletHit, ClientEvent, Inbound, LinkEvent, ParticleData, PoseData, ServerEvent,
};
use crate::util::rate_limit::MovementThrottle;
use crate::util::time::unix_millis;

/// Fire-and-forget outbound event sender implemented by the transport
/// collaborator
pub trait Transport: Send + Sync {
    fn send(&self, event: ClientEvent);
}

/// Capacity of the inbound buffer between the transport task and the
/// frame loop
const INBOUND_BUFFER: usize = 256;

/// Shadow copy of a remote participant, updated only by inbound events
#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub aim_angle: f32,
    /// Server-driven; never predicted locally
    pub health: i32,
    pub augments: Vec<AugmentKind>,
    last_pose_t: u64,
}

impl RemotePlayer {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Right,
            aim_angle: 0.0,
            health: 0,
            augments: Vec::new(),
            last_pose_t: 0,
        }
    }
}

/// All remote shadows, shared read-only with the renderer
#[derive(Debug, Default)]
pub struct RemoteDirectory {
    players: HashMap<Uuid, RemotePlayer>,
}

impl RemoteDirectory {
    pub fn get(&self, id: &Uuid) -> Option<&RemotePlayer> {
        self.players.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn upsert(&mut self, id: Uuid) -> &mut RemotePlayer {
        self.players.entry(id).or_insert_with(|| RemotePlayer::new(id))
    }
}

/// Connection phase gating outbound flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No transport; simulation degrades to local-only
    Offline,
    /// Transport up, waiting for the room to acknowledge our join
    Joining,
    /// Full duplex flow
    Online,
}

/// Side effects of inbound application that the session must act on
#[derive(Debug, Clone)]
pub enum SyncEffect {
    /// A remote fired: spawn a visual-only bullet with the sender's
    /// augment-derived ballistics
    RemoteShot {
        shooter: Uuid,
        x: f32,
        y: f32,
        angle: f32,
        stats: WeaponStats,
    },
    /// Authoritative health for the local player
    LocalHealth { health: i32 },
    /// Authoritative round transition
    RoundReset { round: u32, spawn_x: f32, spawn_y: f32 },
    /// A remote left; their bullets must be torn down too
    RemoteLeft { id: Uuid },
    /// Another client reported a hit (possibly on us)
    IncomingHit { hit: BulletHit },
    /// A replicated cosmetic burst for the renderer
    Particle { particle: ParticleData },
}

/// Throttling/deadbanding outbound gate plus inbound shadow replication
pub struct NetSynchronizer {
    transport: Arc<dyn Transport>,
    inbound_rx: mpsc::Receiver<Inbound>,
    room_id: String,
    local_id: Uuid,
    phase: SyncPhase,
    throttle: MovementThrottle,
    tuning: NetTuning,
    weapon_base: WeaponTuning,
    last_pose: Option<(f32, Facing)>,
    remotes: Arc<RwLock<RemoteDirectory>>,
}

impl NetSynchronizer {
    /// Build a synchronizer and the sender half of its inbound buffer.
    ///
    /// The transport adapter feeds decoded [`Inbound`] values through the
    /// returned sender; the frame loop drains them between frames.
    pub fn new(
        transport: Arc<dyn Transport>,
        room_id: String,
        local_id: Uuid,
        tuning: NetTuning,
        weapon_base: WeaponTuning,
    ) -> (Self, mpsc::Sender<Inbound>) {
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        let sync = Self {
            transport,
            inbound_rx: rx,
            room_id,
            local_id,
            phase: SyncPhase::Offline,
            throttle: MovementThrottle::new(tuning.move_min_interval),
            tuning,
            weapon_base,
            last_pose: None,
            remotes: Arc::new(RwLock::new(RemoteDirectory::default())),
        };
        (sync, tx)
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Shared handle to the remote shadow directory (read-only consumers)
    pub fn remotes(&self) -> Arc<RwLock<RemoteDirectory>> {
        self.remotes.clone()
    }

    /// Drain and apply every buffered inbound event. Called once per
    /// frame, before the simulation tick.
    pub fn drain_inbound(&mut self) -> Vec<SyncEffect> {
        let mut effects = Vec::new();
        while let Ok(inbound) = self.inbound_rx.try_recv() {
            match inbound {
                Inbound::Event(event) => self.apply_event(event, &mut effects),
                Inbound::Link(link) => self.apply_link(link),
            }
        }
        effects
    }

    fn apply_event(&mut self, event: ServerEvent, effects: &mut Vec<SyncEffect>) {
        match event {
            ServerEvent::Move {
                id,
                x,
                y,
                vx,
                vy,
                facing,
            } => {
                // The local entity is never driven by the network
                if id == self.local_id {
                    return;
                }
                let mut remotes = self.remotes.write();
                let remote = remotes.upsert(id);
                remote.x = x;
                remote.y = y;
                remote.vx = vx;
                remote.vy = vy;
                remote.facing = facing;
            }
            ServerEvent::Shoot { id, x, y, angle } => {
                if id == self.local_id {
                    return;
                }
                let stats = {
                    let remotes = self.remotes.read();
                    let agg = remotes
                        .get(&id)
                        .map(|r| AugmentAggregate::from_kinds(&r.augments))
                        .unwrap_or_default();
                    WeaponStats::derive(&self.weapon_base, &agg)
                };
                effects.push(SyncEffect::RemoteShot {
                    shooter: id,
                    x,
                    y,
                    angle,
                    stats,
                });
            }
            ServerEvent::PoseUpdate { pose } => {
                if pose.id == self.local_id {
                    return;
                }
                let mut remotes = self.remotes.write();
                let remote = remotes.upsert(pose.id);
                // Stale out-of-order poses are dropped
                if pose.t >= remote.last_pose_t {
                    remote.aim_angle = pose.angle;
                    remote.facing = pose.facing;
                    remote.last_pose_t = pose.t;
                }
            }
            ServerEvent::ParticleCreate { particle } => {
                effects.push(SyncEffect::Particle { particle });
            }
            ServerEvent::BulletHit { hit } => {
                effects.push(SyncEffect::IncomingHit { hit });
            }
            ServerEvent::HealthUpdate { player_id, health } => {
                if player_id == self.local_id {
                    effects.push(SyncEffect::LocalHealth { health });
                } else {
                    let mut remotes = self.remotes.write();
                    remotes.upsert(player_id).health = health;
                }
            }
            ServerEvent::RoundUpdate {
                round,
                spawn_x,
                spawn_y,
            } => {
                info!(round, "round update");
                effects.push(SyncEffect::RoundReset {
                    round,
                    spawn_x,
                    spawn_y,
                });
            }
            ServerEvent::AugmentState { id, kinds } => {
                if id == self.local_id {
                    return;
                }
                let mut remotes = self.remotes.write();
                remotes.upsert(id).augments = kinds;
            }
            ServerEvent::PlayerJoined { id } => {
                if id == self.local_id {
                    return;
                }
                info!(remote_id = %id, "remote player joined");
                self.remotes.write().upsert(id);
            }
            ServerEvent::PlayerLeft { id } => {
                info!(remote_id = %id, "remote player left");
                self.remotes.write().players.remove(&id);
                effects.push(SyncEffect::RemoteLeft { id });
            }
        }
    }

    fn apply_link(&mut self, link: LinkEvent) {
        match link {
            LinkEvent::Open => {
                // Re-announce membership before resuming event flow
                info!(room_id = %self.room_id, "transport open, announcing join");
                self.phase = SyncPhase::Joining;
                self.transport.send(ClientEvent::Join {
                    room_id: self.room_id.clone(),
                    player_id: self.local_id,
                });
            }
            LinkEvent::Closed => {
                warn!("transport closed, suppressing outbound sync");
                self.phase = SyncPhase::Offline;
            }
            LinkEvent::JoinAcked => {
                info!(room_id = %self.room_id, "join acknowledged, sync online");
                self.phase = SyncPhase::Online;
            }
        }
    }

    /// Throttled local movement broadcast
    pub fn send_movement(&mut self, snap: &PlayerSnapshot) {
        if self.phase != SyncPhase::Online {
            return;
        }
        if !self.throttle.check() {
            return;
        }
        self.transport.send(ClientEvent::InputMove {
            x: snap.x,
            y: snap.y,
            vx: snap.vx,
            vy: snap.vy,
            facing: snap.facing,
        });
    }

    /// Deadbanded aim pose broadcast
    pub fn send_pose(&mut self, angle: f32, facing: Facing) {
        if self.phase != SyncPhase::Online {
            return;
        }
        if let Some((last_angle, last_facing)) = self.last_pose {
            if facing == last_facing && (angle - last_angle).abs() < self.tuning.pose_angle_epsilon
            {
                return;
            }
        }
        self.last_pose = Some((angle, facing));
        self.transport.send(ClientEvent::PoseUpdate {
            room_id: self.room_id.clone(),
            pose: PoseData {
                id: self.local_id,
                angle,
                facing,
                t: unix_millis(),
            },
        });
    }

    /// Immediate shot broadcast
    pub fn send_shoot(&self, x: f32, y: f32, angle: f32) {
        if self.phase != SyncPhase::Online {
            return;
        }
        self.transport.send(ClientEvent::InputShoot { x, y, angle });
    }

    /// Immediate hit report for a bullet this client owns
    pub fn send_bullet_hit(&self, hit: BulletHit) {
        if self.phase != SyncPhase::Online {
            return;
        }
        self.transport.send(ClientEvent::BulletHit {
            room_id: self.room_id.clone(),
            player_id: self.local_id,
            hit,
        });
    }

    /// Cosmetic particle broadcast
    pub fn send_particle(&self, particle: ParticleData) {
        if self.phase != SyncPhase::Online {
            return;
        }
        self.transport.send(ClientEvent::ParticleCreate {
            room_id: self.room_id.clone(),
            particle,
        });
    }

    /// Announce the local augment set so peers can derive our ballistics
    pub fn send_augments(&self, kinds: &[AugmentKind]) {
        if self.phase != SyncPhase::Online {
            return;
        }
        self.transport.send(ClientEvent::AugmentState {
            room_id: self.room_id.clone(),
            player_id: self.local_id,
            kinds: kinds.to_vec(),
        });
    }

    /// Leave the room (still delivered while joining)
    pub fn leave(&self) {
        if self.phase == SyncPhase::Offline {
            return;
        }
        debug!(room_id = %self.room_id, "leaving room");
        self.transport.send(ClientEvent::Leave {
            room_id: self.room_id.clone(),
            player_id: self.local_id,
        });
    }
}
