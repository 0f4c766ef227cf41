//! Teleporters

use crate::switch::Switch;
use ember_actor::{Actor, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use glam::Vec3;
use std::any::Any;

/// A use-activated pad that relocates every player to a destination point.
/// Multiple players land in a small ring around it.
pub struct Teleporter {
    /// Shared switch state (prompt + use routing)
    pub switch: Switch,
    /// Where players are sent
    pub destination: Vec3,
}

impl Teleporter {
    /// Create a teleporter sending players to the origin
    pub fn new(id: ActorId) -> Self {
        let mut switch = Switch::new(id);
        switch.action_label = String::from("step through.");
        switch.base.actor.solid = false;
        Self {
            switch,
            destination: Vec3::ZERO,
        }
    }
}

impl Entity for Teleporter {
    fn actor(&self) -> &Actor {
        &self.switch.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.switch.base.actor
    }

    fn type_name(&self) -> &'static str {
        "teleporter"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.switch.tick_prompt(dt_ms, ctx);
        self.switch.base.actor.update(dt_ms, ctx.map);
    }

    fn use_radius(&self) -> Option<f32> {
        Some(self.switch.base.trigger_radius)
    }

    fn on_use(&mut self, _user: ActorId, ctx: &mut UpdateContext) {
        self.switch.fire(ctx);

        let players: Vec<ActorId> = ctx.players.to_vec();
        let count = players.len();

        for (i, player) in players.into_iter().enumerate() {
            let offset = if count <= 1 {
                Vec3::ZERO
            } else {
                let angle = 2.0 * std::f32::consts::PI * i as f32 / count as f32;
                Vec3::new(angle.cos(), 0.0, angle.sin())
            };
            if let Some(actor) = ctx.actors.actor_mut(player) {
                actor.place(self.destination + offset);
            }
        }

        ctx.services
            .spawn_pfx("data/particle/teleport.xml", self.destination);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.switch.load_fields(bag);
        if let Some(dest) = bag.get::<[f32; 3]>("destinationPosition") {
            self.destination = Vec3::from_array(dest);
        }
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = Teleporter::new(ActorId::INVALID);
        self.switch.save_fields(bag, &defaults.switch);
        bag.set_tidy(
            "destinationPosition",
            &self.destination.to_array(),
            &defaults.destination.to_array(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[test]
    fn test_teleports_all_players() {
        let mut h = Harness::new();
        let a = h.add_player(Vec3::new(1.0, 0.0, 1.0));
        let b = h.add_player(Vec3::new(2.0, 0.0, 1.0));

        let pad = h.actors.spawn_with(|id| {
            let mut t = Teleporter::new(id);
            t.switch.base.actor.place(Vec3::new(1.5, 0.0, 1.0));
            t.destination = Vec3::new(10.0, 0.0, 10.0);
            Box::new(t)
        });

        let mut entity = h.actors.take(pad).unwrap();
        let mut ctx = ember_actor::UpdateContext {
            current: pad,
            actors: &mut h.actors,
            router: &mut h.router,
            map: &mut h.map,
            services: &mut h.services,
            players: &h.players,
            clock_ms: 0.0,
            rng: &mut h.rng,
            spawn_requests: &mut h.spawns,
            strikes: &mut h.strikes,
            self_inbox: Vec::new(),
        };
        entity.on_use(a, &mut ctx);
        drop(ctx);
        h.actors.put_back(entity);

        // Both players land in a ring around the destination
        for player in [a, b] {
            let pos = h.actors.actor(player).unwrap().position;
            assert!((pos - Vec3::new(10.0, 0.0, 10.0)).length() <= 1.0 + 1e-5);
            // The landing spot becomes the new validated position
            assert_eq!(h.actors.actor(player).unwrap().validated_pos, pos);
        }
    }
}
