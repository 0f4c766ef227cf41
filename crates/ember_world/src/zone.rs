//! The zone: one simulated region and its per-tick schedule
//!
//! Tick ordering is load-bearing:
//! 1. the router flushes delayed messages, so entities observe fresh mail;
//! 2. every entity updates (FSM ticks, command execution, trigger polling);
//! 3. all collision detection completes before any collision response;
//! 4. matured melee strikes land;
//! 5. deferred spawns apply and zombies are collected, so the set never
//!    mutates while a pass is iterating.

use crate::factory::EntityFactory;
use ember_actor::{
    ActorSet, Entity, Map, NullServices, PendingStrike, SpawnRequest, UpdateContext, WorldServices,
};
use ember_ai::FsmRegistry;
use ember_combat::{deliver_strike, Creature};
use ember_core::{ActorId, FactoryError, PropertyBag};
use ember_message::MessageRouter;
use glam::Vec3;
use log::warn;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// One simulated region: actors, mail, terrain, and the clock
pub struct Zone {
    /// The zone's message router
    pub router: MessageRouter,
    /// Every simulated entity; the zone is the sole owner
    pub objects: ActorSet,
    /// The tile map
    pub map: Map,
    /// Fire-and-forget engine services
    pub services: Box<dyn WorldServices>,
    /// Entity construction by type name
    pub factory: EntityFactory,
    /// High-level FSM construction by name
    pub fsm_registry: FsmRegistry,
    clock_ms: f64,
    players: Vec<ActorId>,
    rng: SmallRng,
    spawn_requests: Vec<SpawnRequest>,
    strikes: Vec<PendingStrike>,
}

impl Zone {
    /// Create a zone over a map, with null services and a fixed RNG seed
    pub fn new(map: Map) -> Self {
        Self::with_services(map, Box::new(NullServices))
    }

    /// Create a zone with explicit services
    pub fn with_services(map: Map, services: Box<dyn WorldServices>) -> Self {
        Self {
            router: MessageRouter::new(),
            objects: ActorSet::new(),
            map,
            services,
            factory: EntityFactory::with_builtins(),
            fsm_registry: FsmRegistry::with_builtins(),
            clock_ms: 0.0,
            players: Vec::new(),
            rng: SmallRng::seed_from_u64(0x45_4d_42_45_52),
            spawn_requests: Vec::new(),
            strikes: Vec::new(),
        }
    }

    /// Reseed the zone RNG; ticks are deterministic for a given seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Milliseconds of simulated time
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Ids of player-controlled creatures
    pub fn players(&self) -> &[ActorId] {
        &self.players
    }

    /// Number of players in the zone
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Nth player, if present
    pub fn player(&self, index: usize) -> Option<ActorId> {
        self.players.get(index).copied()
    }

    /// Create and register a player at a position
    pub fn add_player(&mut self, pos: Vec3) -> ActorId {
        let id = self.objects.spawn_with(|id| {
            let mut player = Creature::new_player(id);
            player.actor.place(pos);
            Box::new(player)
        });
        self.players.push(id);
        id
    }

    /// File a deferred spawn; it applies at the end of the current tick
    pub fn spawn(&mut self, bag: PropertyBag, position: Vec3) {
        self.spawn_requests.push(SpawnRequest { bag, position });
    }

    /// Create an entity from data right now, place it, and run its spawn
    /// hook. The bag's "type" field picks the constructor.
    pub fn spawn_now(
        &mut self,
        bag: &PropertyBag,
        position: Vec3,
    ) -> Result<ActorId, FactoryError> {
        let type_name: String = bag.get_or("type", String::from("actor"));

        let id = self.objects.allocate_id();
        let mut entity = self.factory.create(&type_name, id)?;
        entity.load(bag);
        entity.actor_mut().place(position);

        // Creatures name their FSM in data; attach it here where the
        // registry is at hand
        if let Some(creature) = entity.as_any_mut().downcast_mut::<Creature>() {
            let fsm_name = creature.fsm_name.clone();
            creature.set_fsm(&fsm_name, &self.fsm_registry);
        }

        self.objects.add(entity);
        self.run_spawn_hook(id);
        Ok(id)
    }

    /// Advance the simulation by `dt_ms` milliseconds
    pub fn update(&mut self, dt_ms: f32) {
        self.clock_ms += dt_ms as f64;
        let now = self.clock_ms;

        // Flush delayed mail and age signals before anyone updates
        self.router.update(dt_ms, now, &mut self.objects);

        // Entity updates, one at a time, checked out of the set
        for id in self.objects.ids() {
            let Some(mut entity) = self.objects.take(id) else {
                continue;
            };
            if entity.actor().zombie {
                self.objects.put_back(entity);
                continue;
            }

            let mut ctx = self.context_for(id);
            entity.update(dt_ms, &mut ctx);
            let inbox = std::mem::take(&mut ctx.self_inbox);
            drop(ctx);

            for msg in inbox {
                entity.on_message(&msg);
            }
            self.objects.put_back(entity);
        }

        // Strict two-phase collision protocol
        self.objects.collision_detection_pass();
        self.objects.collision_response_pass();

        // Matured strikes land
        let mut matured = Vec::new();
        self.strikes.retain_mut(|strike| {
            strike.delay_ms -= dt_ms;
            if strike.delay_ms <= 0.0 {
                matured.push(*strike);
                false
            } else {
                true
            }
        });
        for strike in &matured {
            deliver_strike(&mut self.objects, self.services.as_mut(), strike);
        }

        // Apply deferred spawns at the tick boundary
        let requests = std::mem::take(&mut self.spawn_requests);
        for request in requests {
            if let Err(err) = self.spawn_now(&request.bag, request.position) {
                warn!("deferred spawn failed: {err}");
            }
        }

        // Collect zombies, dropping their subscriptions and player slots
        let zombies: Vec<ActorId> = self
            .objects
            .iter()
            .filter(|(_, e)| e.actor().zombie)
            .map(|(id, _)| id)
            .collect();
        for id in &zombies {
            self.router.unsubscribe_all(*id);
        }
        self.objects.garbage_collect();
        let objects = &self.objects;
        self.players.retain(|id| objects.is_member(*id));
    }

    /// Editor-mode refresh of one actor, typically the editor's current
    /// selection: revalidates it where it stands and re-snaps it to the
    /// terrain, without physics, sliding, or collision
    pub fn update_for_editor(&mut self, id: ActorId, dt_ms: f32) {
        let Some(mut entity) = self.objects.take(id) else {
            return;
        };
        let mut ctx = self.context_for(id);
        entity.update_for_editor(dt_ms, &mut ctx);
        drop(ctx);
        self.objects.put_back(entity);
    }

    /// Route explicit "use" input: activate the nearest usable entity in
    /// reach of the player. Returns whether anything was used.
    pub fn try_use(&mut self, player: ActorId) -> bool {
        let Some(p) = self.objects.actor(player) else {
            return false;
        };
        let player_pos = p.position;
        let player_radius = p.cylinder_radius;

        let mut best: Option<(ActorId, f32)> = None;
        for (id, entity) in self.objects.iter() {
            let Some(reach) = entity.use_radius() else {
                continue;
            };
            let actor = entity.actor();
            if actor.zombie || id == player {
                continue;
            }
            let distance = ember_actor::collision::planar_distance(actor.position, player_pos)
                - (reach + player_radius);
            if distance < 0.0 && best.map(|(_, d)| distance < d).unwrap_or(true) {
                best = Some((id, distance));
            }
        }

        let Some((used, _)) = best else {
            return false;
        };

        let Some(mut entity) = self.objects.take(used) else {
            return false;
        };
        let mut ctx = self.context_for(used);
        entity.on_use(player, &mut ctx);
        let inbox = std::mem::take(&mut ctx.self_inbox);
        drop(ctx);
        for msg in inbox {
            entity.on_message(&msg);
        }
        self.objects.put_back(entity);
        true
    }

    /// Save every entity to a bag list with type tags
    pub fn save_entities(&self) -> PropertyBag {
        let mut entities = Vec::new();
        for (_, entity) in self.objects.iter() {
            let mut bag = PropertyBag::new();
            bag.set("type", &entity.type_name().to_string());
            entity.save_tidy(&mut bag);
            entities.push(bag);
        }

        let mut root = PropertyBag::new();
        let values: Vec<serde_json::Value> = entities.iter().map(|b| b.to_value()).collect();
        root.set("objects", &values);
        root
    }

    /// Recreate entities from a bag produced by [`Zone::save_entities`]
    pub fn load_entities(&mut self, root: &PropertyBag) {
        let entries: Vec<serde_json::Value> = root.get_list("objects");
        for value in entries {
            let Ok(bag) = PropertyBag::from_value(value) else {
                continue;
            };
            let position = bag
                .get::<[f32; 3]>("pos")
                .map(Vec3::from_array)
                .unwrap_or(Vec3::ZERO);
            if let Err(err) = self.spawn_now(&bag, position) {
                warn!("failed to load entity: {err}");
            }
        }
    }

    fn context_for(&mut self, current: ActorId) -> UpdateContext<'_> {
        UpdateContext {
            current,
            actors: &mut self.objects,
            router: &mut self.router,
            map: &mut self.map,
            services: self.services.as_mut(),
            players: &self.players,
            clock_ms: self.clock_ms,
            rng: &mut self.rng,
            spawn_requests: &mut self.spawn_requests,
            strikes: &mut self.strikes,
            self_inbox: Vec::new(),
        }
    }

    fn run_spawn_hook(&mut self, id: ActorId) {
        let Some(mut entity) = self.objects.take(id) else {
            return;
        };
        let mut ctx = self.context_for(id);
        entity.on_spawn(&mut ctx);
        drop(ctx);
        self.objects.put_back(entity);
    }
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("clock_ms", &self.clock_ms)
            .field("objects", &self.objects)
            .field("players", &self.players.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_message::{Message, MessageKind};

    fn flat_zone() -> Zone {
        Zone::new(Map::new(16, 16, 1.0))
    }

    #[test]
    fn test_clock_advances() {
        let mut zone = flat_zone();
        zone.update(16.0);
        zone.update(16.0);
        assert_eq!(zone.clock_ms(), 32.0);
    }

    #[test]
    fn test_spawn_now_by_type() {
        let mut zone = flat_zone();
        let mut bag = PropertyBag::new();
        bag.set("type", &"creature".to_string());
        bag.set("healthPoints", &40);
        bag.set("maxHealthPoints", &40);

        let id = zone.spawn_now(&bag, Vec3::new(3.0, 0.0, 3.0)).unwrap();
        let creature = zone
            .objects
            .get(id)
            .unwrap()
            .downcast_ref::<Creature>()
            .unwrap();
        assert_eq!(creature.health_points, 40);
        assert_eq!(creature.actor.position, Vec3::new(3.0, 0.0, 3.0));
    }

    #[test]
    fn test_deferred_spawn_applies_at_tick_boundary() {
        let mut zone = flat_zone();
        let mut bag = PropertyBag::new();
        bag.set("type", &"actor".to_string());

        zone.spawn(bag, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(zone.objects.len(), 0);

        zone.update(16.0);
        assert_eq!(zone.objects.len(), 1);
    }

    #[test]
    fn test_unknown_spawn_type_degrades() {
        let mut zone = flat_zone();
        let mut bag = PropertyBag::new();
        bag.set("type", &"banshee".to_string());

        zone.spawn(bag, Vec3::ZERO);
        zone.update(16.0);
        assert_eq!(zone.objects.len(), 0);
    }

    #[test]
    fn test_delayed_message_delivery_through_zone() {
        let mut zone = flat_zone();
        let a = zone.add_player(Vec3::new(1.0, 0.0, 1.0));
        let b = zone.add_player(Vec3::new(5.0, 0.0, 5.0));

        let msg = Message::new(MessageKind::Timeout, a, b).with_delay(100.0);
        let now = zone.clock_ms();
        let objects = &mut zone.objects;
        zone.router.send(msg, now, objects);

        // Not yet due
        zone.update(50.0);
        let creature = zone
            .objects
            .get(b)
            .unwrap()
            .downcast_ref::<Creature>()
            .unwrap();
        assert!(creature.buffered_message().is_none());

        // Due inside this tick's router flush
        zone.update(51.0);
        let creature = zone
            .objects
            .get(b)
            .unwrap()
            .downcast_ref::<Creature>()
            .unwrap();
        assert_eq!(creature.buffered_message().unwrap().kind, MessageKind::Timeout);
    }

    #[test]
    fn test_editor_refresh_moves_nothing() {
        let mut zone = flat_zone();
        zone.map.set_height(3, 3, 1.5);

        let id = zone
            .spawn_now(&PropertyBag::new(), Vec3::new(3.5, 0.0, 3.5))
            .unwrap();
        zone.objects.actor_mut(id).unwrap().velocity = Vec3::new(2.0, 0.0, 0.0);

        zone.update_for_editor(id, 16.0);

        let actor = zone.objects.actor(id).unwrap();
        // Re-snapped to its tile, but no integration happened
        assert_eq!(actor.position.x, 3.5);
        assert_eq!(actor.position.y, 1.5);
        assert_eq!(actor.velocity, Vec3::new(2.0, 0.0, 0.0));
        // The editor path never runs the collision passes
        assert!(actor.collisions.is_empty());
    }

    #[test]
    fn test_zombie_collection_drops_subscriptions_and_players() {
        let mut zone = flat_zone();
        let p = zone.add_player(Vec3::new(1.0, 0.0, 1.0));
        zone.router.subscribe_to_signal(p, 3);

        zone.objects.actor_mut(p).unwrap().zombie = true;
        zone.update(16.0);

        assert!(!zone.objects.is_member(p));
        assert_eq!(zone.num_players(), 0);

        // Raising the signal reaches no one
        let now = zone.clock_ms();
        let mut delivered = 0;
        let mut sink = |_: &Message| {
            delivered += 1;
            true
        };
        zone.router.raise_signal(3, now, &mut sink);
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_save_and_reload_entities() {
        let mut zone = flat_zone();
        let mut bag = PropertyBag::new();
        bag.set("type", &"creature".to_string());
        bag.set("name", &"grub".to_string());
        bag.set("healthPoints", &25);
        bag.set("maxHealthPoints", &25);
        zone.spawn_now(&bag, Vec3::new(4.0, 0.0, 4.0)).unwrap();

        let saved = zone.save_entities();

        let mut reloaded = flat_zone();
        reloaded.load_entities(&saved);

        let ids = reloaded.objects.get_by_name("grub");
        assert_eq!(ids.len(), 1);
        let creature = reloaded
            .objects
            .get(ids[0])
            .unwrap()
            .downcast_ref::<Creature>()
            .unwrap();
        assert_eq!(creature.health_points, 25);
        assert_eq!(creature.actor.position, Vec3::new(4.0, 0.0, 4.0));
    }
}
