//! The per-tick world view handed to an updating entity
//!
//! Entities update one at a time, checked out of the actor set, so the
//! context can hand out mutable access to every *other* entity alongside
//! the router, map, and services. Immediate messages addressed back to the
//! checked-out entity are buffered and delivered at check-in, before any
//! later entity updates.

use crate::actor::Actor;
use crate::map::Map;
use crate::services::WorldServices;
use crate::set::ActorSet;
use ember_core::{ActorId, PropertyBag};
use ember_message::{Message, MessageRouter};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;

/// A deferred request to create an entity from data at a position
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Entity data; the factory reads the type name from it
    pub bag: PropertyBag,
    /// Where to place the new entity
    pub position: Vec3,
}

/// A melee strike whose damage lands partway into the swing animation
#[derive(Debug, Clone, Copy)]
pub struct PendingStrike {
    /// Milliseconds until the damage lands
    pub delay_ms: f32,
    /// Who is swinging
    pub attacker: ActorId,
    /// Who gets hit
    pub target: ActorId,
    /// Damage on contact
    pub damage: i32,
}

/// World view for one entity's update
pub struct UpdateContext<'a> {
    /// The entity currently checked out for update
    pub current: ActorId,
    /// Every other entity
    pub actors: &'a mut ActorSet,
    /// The zone's message router
    pub router: &'a mut MessageRouter,
    /// The zone's tile map
    pub map: &'a mut Map,
    /// Fire-and-forget engine services
    pub services: &'a mut dyn WorldServices,
    /// Ids of player-controlled creatures
    pub players: &'a [ActorId],
    /// Zone clock in milliseconds
    pub clock_ms: f64,
    /// Zone RNG; seeded, so ticks are reproducible
    pub rng: &'a mut SmallRng,
    /// Deferred spawns applied at the tick boundary
    pub spawn_requests: &'a mut Vec<SpawnRequest>,
    /// Deferred melee strikes resolved by the zone
    pub strikes: &'a mut Vec<PendingStrike>,
    /// Immediate messages addressed to `current`, delivered at check-in
    pub self_inbox: Vec<Message>,
}

impl<'a> UpdateContext<'a> {
    /// Route a message. Zero-delay messages reach entities synchronously;
    /// messages for the checked-out entity land in its inbox instead.
    pub fn send_message(&mut self, msg: Message) -> bool {
        let current = self.current;
        let actors = &mut *self.actors;
        let inbox = &mut self.self_inbox;
        let mut sink = delivery_sink(current, actors, inbox);
        self.router.send(msg, self.clock_ms, &mut sink)
    }

    /// Raise a broadcast signal through the router
    pub fn raise_signal(&mut self, signal_index: i32) {
        let current = self.current;
        let actors = &mut *self.actors;
        let inbox = &mut self.self_inbox;
        let mut sink = delivery_sink(current, actors, inbox);
        self.router
            .raise_signal(signal_index, self.clock_ms, &mut sink);
    }

    /// Uniform random float in [lo, hi)
    pub fn random_range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Uniform random index below `len`
    pub fn random_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    /// File a deferred spawn request
    pub fn request_spawn(&mut self, bag: PropertyBag, position: Vec3) {
        self.spawn_requests.push(SpawnRequest { bag, position });
    }

    /// File a deferred melee strike
    pub fn queue_strike(&mut self, strike: PendingStrike) {
        self.strikes.push(strike);
    }

    /// First player inside `trigger_radius` of `actor`, by the shrink-free
    /// proximity rule. Zombies on either side never match.
    pub fn player_in_proximity(&self, actor: &Actor, trigger_radius: f32) -> Option<ActorId> {
        if actor.zombie {
            return None;
        }

        for &player in self.players {
            if player == actor.id {
                continue;
            }
            let Some(p) = self.actors.actor(player) else { continue };
            if p.zombie {
                continue;
            }
            if actor.is_in_proximity(p.position, p.cylinder_radius, trigger_radius) {
                return Some(player);
            }
        }
        None
    }
}

/// Sink routing messages into the partially-borrowed set, with
/// self-addressed messages parked in the checked-out entity's inbox
fn delivery_sink<'s>(
    current: ActorId,
    actors: &'s mut ActorSet,
    inbox: &'s mut Vec<Message>,
) -> impl FnMut(&Message) -> bool + 's {
    move |m: &Message| {
        if m.recipient == current {
            inbox.push(*m);
            return true;
        }
        match actors.get_mut(m.recipient) {
            Some(entity) => {
                entity.on_message(m);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BasicActor;
    use crate::services::NullServices;
    use rand::SeedableRng;

    struct Harness {
        actors: ActorSet,
        router: MessageRouter,
        map: Map,
        services: NullServices,
        rng: SmallRng,
        spawns: Vec<SpawnRequest>,
        strikes: Vec<PendingStrike>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                actors: ActorSet::new(),
                router: MessageRouter::new(),
                map: Map::new(8, 8, 1.0),
                services: NullServices,
                rng: SmallRng::seed_from_u64(7),
                spawns: Vec::new(),
                strikes: Vec::new(),
            }
        }

        fn ctx(&mut self, current: ActorId, players: &'static [ActorId]) -> UpdateContext<'_> {
            UpdateContext {
                current,
                actors: &mut self.actors,
                router: &mut self.router,
                map: &mut self.map,
                services: &mut self.services,
                players,
                clock_ms: 0.0,
                rng: &mut self.rng,
                spawn_requests: &mut self.spawns,
                strikes: &mut self.strikes,
                self_inbox: Vec::new(),
            }
        }
    }

    #[test]
    fn test_self_addressed_messages_buffer() {
        let mut h = Harness::new();
        let me = h.actors.spawn_with(|id| Box::new(BasicActor::new(id)));

        let mut ctx = h.ctx(me, &[]);
        let msg = Message::new(ember_message::MessageKind::Timeout, me, me);
        assert!(ctx.send_message(msg));
        assert_eq!(ctx.self_inbox.len(), 1);
    }

    #[test]
    fn test_random_range_degenerate() {
        let mut h = Harness::new();
        let me = h.actors.spawn_with(|id| Box::new(BasicActor::new(id)));
        let mut ctx = h.ctx(me, &[]);
        assert_eq!(ctx.random_range(3.0, 3.0), 3.0);
        let v = ctx.random_range(1.0, 2.0);
        assert!((1.0..2.0).contains(&v));
    }
}
