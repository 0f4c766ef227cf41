//! Monster spawners

use crate::listener::Listener;
use ember_actor::{Actor, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use glam::Vec3;
use std::any::Any;

/// A listener that, the first time it fires, files deferred spawn requests
/// for a pack of monsters arranged in a ring
pub struct Spawner {
    /// Shared listener state
    pub listener: Listener,
    /// Template for each spawned monster
    pub monster_data: PropertyBag,
    /// Smallest pack size
    pub min_monsters: i32,
    /// Largest pack size
    pub max_monsters: i32,
    /// Meters between ring neighbors
    pub separation_distance: f32,
    triggered_once: bool,
}

impl Spawner {
    /// Create a spawner with stock pack sizing
    pub fn new(id: ActorId) -> Self {
        let mut listener = Listener::new(id);
        listener.base.actor.solid = false;
        Self {
            listener,
            monster_data: PropertyBag::new(),
            min_monsters: 1,
            max_monsters: 3,
            separation_distance: 2.0,
            triggered_once: false,
        }
    }

    fn on_trigger(&mut self, ctx: &mut UpdateContext) {
        if self.triggered_once {
            return;
        }
        self.triggered_once = true;

        let num_monsters = if self.min_monsters >= self.max_monsters {
            self.min_monsters
        } else {
            ctx.random_range(self.min_monsters as f32, (self.max_monsters + 1) as f32) as i32
        };

        let center = self.listener.base.actor.position;

        if num_monsters <= 1 {
            ctx.request_spawn(self.monster_data.clone(), center);
            return;
        }

        let radius =
            (self.separation_distance * num_monsters as f32) / (2.0 * std::f32::consts::PI);

        for i in 0..num_monsters {
            let angle = 2.0 * i as f32 * std::f32::consts::PI / num_monsters as f32;
            let mut spawn_point = Vec3::new(angle.cos(), 0.0, angle.sin()) * radius + center;
            spawn_point.y = 0.0;
            ctx.request_spawn(self.monster_data.clone(), spawn_point);
        }
    }
}

impl Entity for Spawner {
    fn actor(&self) -> &Actor {
        &self.listener.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.listener.base.actor
    }

    fn type_name(&self) -> &'static str {
        "spawner"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        if self.listener.tick(dt_ms, ctx) {
            self.on_trigger(ctx);
        }
    }

    fn on_message(&mut self, msg: &ember_message::Message) {
        self.listener.handle_message(msg);
    }

    fn on_spawn(&mut self, ctx: &mut UpdateContext) {
        self.listener.setup_signals(ctx);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.listener.load_fields(bag);
        if let Some(data) = bag.get_bag("monsterData") {
            self.monster_data = data;
        }
        self.min_monsters = bag.get_or("minMonsters", self.min_monsters);
        self.max_monsters = bag.get_or("maxMonsters", self.max_monsters);
        self.separation_distance = bag.get_or("separationDistance", self.separation_distance);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = Spawner::new(ActorId::INVALID);
        self.listener.save_fields(bag, &defaults.listener);
        if !self.monster_data.is_empty() {
            bag.set_bag("monsterData", &self.monster_data);
        }
        bag.set_tidy("minMonsters", &self.min_monsters, &defaults.min_monsters);
        bag.set_tidy("maxMonsters", &self.max_monsters, &defaults.max_monsters);
        bag.set_tidy(
            "separationDistance",
            &self.separation_distance,
            &defaults.separation_distance,
        );
    }
}
