//! Stock monster behavior
//!
//! Wander near the spawn point, pause briefly when a target is noticed,
//! then chase and attack; flee once health drops below a per-instance
//! threshold. Being attacked retargets the machine onto the attacker.

use crate::command::Command;
use crate::fsm::{FsmContext, FsmEvent, StateLogic, StateMachine, GLOBAL_STATE};
use ember_core::ActorId;
use ember_message::{Message, MessageKind};
use glam::Vec3;

/// Re-evaluate options and wander randomly
pub const STATE_WANDER: i32 = 0;
/// Pause for a moment before reacting to a fresh target
pub const STATE_PAUSE_BEFORE_ATTACK: i32 = 1;
/// Chase and attack the target creature
pub const STATE_ATTACK: i32 = 2;
/// Flee from the target creature
pub const STATE_FLEE: i32 = 3;

/// Wander/pause/attack/flee ladder for common monsters
#[derive(Debug)]
pub struct MonsterFsm {
    target: ActorId,
    /// Meters of separation inside which a target grabs our attention
    threshold_gain_interest: f32,
    /// Meters of separation beyond which we lose interest
    threshold_lose_interest: f32,
    /// Cap on random wander distance from the spawn point
    threshold_wander_too_far: f32,
    /// Health fraction below which we flee; randomized on first entry
    flee_threshold: Option<f32>,
}

impl MonsterFsm {
    /// Create the ladder with stock thresholds
    pub fn new() -> Self {
        Self {
            target: ActorId::INVALID,
            threshold_gain_interest: 4.0,
            threshold_lose_interest: 5.0,
            threshold_wander_too_far: 9.0,
            flee_threshold: None,
        }
    }

    /// The creature currently being chased or fled from
    pub fn target(&self) -> ActorId {
        self.target
    }

    fn flee_threshold(&mut self, ctx: &mut dyn FsmContext) -> f32 {
        *self
            .flee_threshold
            .get_or_insert_with(|| ctx.random_range(0.05, 0.20))
    }

    fn random_walk(&self, ctx: &mut dyn FsmContext) -> Vec3 {
        let radius = ctx.random_range(0.0, self.threshold_wander_too_far);
        let angle = ctx.random_range(0.0, 2.0 * std::f32::consts::PI);
        ctx.owner_spawn_point() + Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
    }

    fn distance_to_target(&self, ctx: &dyn FsmContext) -> f32 {
        ctx.surface_distance_to(self.target).unwrap_or(0.0)
    }

    /// An attacker who is not already the target becomes the target.
    /// Returns true when the event was a retaliation trigger.
    fn retaliate(
        &mut self,
        msg: Option<&Message>,
        to_state: i32,
        machine: &mut StateMachine,
    ) -> bool {
        if let Some(msg) = msg {
            if msg.kind == MessageKind::Attacked && msg.sender != self.target {
                self.target = msg.sender;
                machine.set_state(to_state);
                return true;
            }
        }
        false
    }

    fn order_the_attack(&self, ctx: &mut dyn FsmContext) {
        let speed = ctx.random_range(0.7, 1.0);
        ctx.queue_command(Command::attack(self.target).with_speed(speed));
    }
}

impl Default for MonsterFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl StateLogic for MonsterFsm {
    fn states(
        &mut self,
        event: FsmEvent,
        msg: Option<&Message>,
        state: i32,
        machine: &mut StateMachine,
        ctx: &mut dyn FsmContext,
    ) -> bool {
        match state {
            STATE_WANDER => match event {
                FsmEvent::Enter => {
                    ctx.cancel_orders();
                    self.flee_threshold(ctx);
                    true
                }
                FsmEvent::Update | FsmEvent::Message => {
                    if self.retaliate(msg, STATE_ATTACK, machine) {
                        return true;
                    }
                    if event == FsmEvent::Message {
                        return true;
                    }

                    self.target = ctx.closest_attackable(self.threshold_gain_interest);

                    if self.target.is_valid() {
                        machine.set_state(STATE_PAUSE_BEFORE_ATTACK);
                    } else if ctx.owner_any_collisions() || !ctx.owner_has_orders() {
                        // Go someplace random
                        ctx.cancel_orders();
                        let waypoint = self.random_walk(ctx);
                        let speed = ctx.random_range(0.5, 0.7);
                        ctx.queue_command(
                            Command::move_to_pos(waypoint)
                                .with_speed(speed)
                                .with_proximity(f32::EPSILON)
                                .with_timeout(2000.0),
                        );
                    }
                    true
                }
                _ => true,
            },

            STATE_PAUSE_BEFORE_ATTACK => match event {
                FsmEvent::Enter => {
                    ctx.cancel_orders();
                    let pause = ctx.random_range(200.0, 400.0);
                    ctx.queue_command(Command::freeze(self.target, pause));
                    true
                }
                FsmEvent::Update => {
                    if !ctx.owner_has_orders() {
                        machine.set_state(STATE_ATTACK);
                    }
                    true
                }
                _ => true,
            },

            STATE_ATTACK => match event {
                FsmEvent::Enter => {
                    ctx.cancel_orders();
                    ctx.play_attention_sound();
                    true
                }
                FsmEvent::Update | FsmEvent::Message => {
                    if self.retaliate(msg, STATE_ATTACK, machine) {
                        return true;
                    }
                    if event == FsmEvent::Message {
                        return true;
                    }

                    let flee_at = self.flee_threshold(ctx);
                    if !ctx.is_attackable(self.target) {
                        machine.set_state(STATE_WANDER);
                    } else if self.distance_to_target(ctx) > self.threshold_lose_interest {
                        machine.set_state(STATE_WANDER);
                    } else if ctx.owner_health_fraction() < flee_at {
                        machine.set_state(STATE_FLEE);
                    } else if !ctx.owner_has_orders() {
                        self.order_the_attack(ctx);
                    }
                    true
                }
                _ => true,
            },

            STATE_FLEE => match event {
                FsmEvent::Enter => {
                    ctx.cancel_orders();
                    ctx.play_attention_sound();
                    true
                }
                FsmEvent::Update | FsmEvent::Message => {
                    if self.retaliate(msg, STATE_FLEE, machine) {
                        return true;
                    }
                    if event == FsmEvent::Message {
                        return true;
                    }

                    let flee_at = self.flee_threshold(ctx);
                    if !ctx.is_attackable(self.target) {
                        machine.set_state(STATE_WANDER);
                    } else if self.distance_to_target(ctx) > self.threshold_lose_interest {
                        machine.set_state(STATE_WANDER);
                    } else if ctx.owner_health_fraction() >= flee_at {
                        machine.set_state(STATE_ATTACK);
                    } else if !ctx.owner_has_orders() {
                        let speed = ctx.random_range(0.9, 1.0);
                        ctx.queue_command(
                            Command::flee(self.target, self.threshold_lose_interest)
                                .with_speed(speed)
                                .with_timeout(5000.0),
                        );
                    }
                    true
                }
                _ => true,
            },

            GLOBAL_STATE => false,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::fsm::Fsm;
    use std::collections::VecDeque;

    struct MonsterWorld {
        clock_ms: f64,
        orders: VecDeque<Command>,
        nearby_player: ActorId,
        player_alive: bool,
        player_distance: f32,
        health_fraction: f32,
        attention_sounds: u32,
    }

    impl MonsterWorld {
        fn new() -> Self {
            Self {
                clock_ms: 0.0,
                orders: VecDeque::new(),
                nearby_player: ActorId::INVALID,
                player_alive: true,
                player_distance: 1.0,
                health_fraction: 1.0,
                attention_sounds: 0,
            }
        }
    }

    impl FsmContext for MonsterWorld {
        fn owner_id(&self) -> ActorId {
            ActorId::from_raw(1)
        }
        fn clock_ms(&self) -> f64 {
            self.clock_ms
        }
        fn owner_position(&self) -> Vec3 {
            Vec3::ZERO
        }
        fn owner_spawn_point(&self) -> Vec3 {
            Vec3::new(5.0, 0.0, 5.0)
        }
        fn owner_health_fraction(&self) -> f32 {
            self.health_fraction
        }
        fn owner_has_orders(&self) -> bool {
            !self.orders.is_empty()
        }
        fn owner_any_collisions(&self) -> bool {
            false
        }
        fn queue_command(&mut self, cmd: Command) -> bool {
            self.orders.push_back(cmd);
            true
        }
        fn inject_command(&mut self, cmd: Command) -> bool {
            self.orders.push_front(cmd);
            true
        }
        fn cancel_orders(&mut self) {
            self.orders.clear();
        }
        fn surface_distance_to(&self, id: ActorId) -> Option<f32> {
            (id == self.nearby_player).then_some(self.player_distance)
        }
        fn is_attackable(&self, id: ActorId) -> bool {
            id == self.nearby_player && id.is_valid() && self.player_alive
        }
        fn closest_attackable(&self, range: f32) -> ActorId {
            if self.nearby_player.is_valid() && self.player_alive && self.player_distance <= range {
                self.nearby_player
            } else {
                ActorId::INVALID
            }
        }
        fn send_message(&mut self, _msg: Message) -> bool {
            true
        }
        fn random_range(&mut self, lo: f32, _hi: f32) -> f32 {
            lo
        }
        fn play_attention_sound(&mut self) {
            self.attention_sounds += 1;
        }
    }

    fn new_fsm(world: &mut MonsterWorld) -> Fsm {
        let mut fsm = Fsm::new(Box::new(MonsterFsm::new()));
        fsm.initialize(world);
        fsm
    }

    #[test]
    fn test_wanders_without_target() {
        let mut world = MonsterWorld::new();
        let mut fsm = new_fsm(&mut world);

        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_WANDER);
        assert_eq!(world.orders.len(), 1);
        assert_eq!(world.orders[0].kind, CommandKind::MoveToPos);
    }

    #[test]
    fn test_noticing_target_pauses_then_attacks() {
        let mut world = MonsterWorld::new();
        let mut fsm = new_fsm(&mut world);

        world.nearby_player = ActorId::from_raw(2);
        world.player_distance = 2.0;

        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_PAUSE_BEFORE_ATTACK);
        assert_eq!(world.orders[0].kind, CommandKind::Freeze);

        // The pause order runs out, the next update transitions to attack
        world.orders.clear();
        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_ATTACK);
        assert_eq!(world.attention_sounds, 1);

        fsm.update(None, &mut world);
        assert_eq!(world.orders[0].kind, CommandKind::Attack);
    }

    #[test]
    fn test_flees_at_low_health_and_returns() {
        let mut world = MonsterWorld::new();
        let mut fsm = new_fsm(&mut world);

        world.nearby_player = ActorId::from_raw(2);
        world.player_distance = 2.0;

        fsm.update(None, &mut world); // notice -> pause
        world.orders.clear();
        fsm.update(None, &mut world); // -> attack

        // random_range returns its low bound, so the flee threshold is 0.05
        world.health_fraction = 0.01;
        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_FLEE);

        fsm.update(None, &mut world);
        assert_eq!(world.orders[0].kind, CommandKind::Flee);

        world.health_fraction = 0.5;
        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_ATTACK);
    }

    #[test]
    fn test_loses_interest_at_range() {
        let mut world = MonsterWorld::new();
        let mut fsm = new_fsm(&mut world);

        world.nearby_player = ActorId::from_raw(2);
        world.player_distance = 2.0;
        fsm.update(None, &mut world);
        world.orders.clear();
        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_ATTACK);

        world.player_distance = 6.0;
        fsm.update(None, &mut world);
        assert_eq!(fsm.machine().state(), STATE_WANDER);
    }

    #[test]
    fn test_retaliates_against_attacker() {
        let mut world = MonsterWorld::new();
        let mut fsm = new_fsm(&mut world);

        let attacker = ActorId::from_raw(7);
        let msg = Message::new(MessageKind::Attacked, attacker, ActorId::from_raw(1));

        world.nearby_player = attacker;
        world.player_distance = 2.0;

        fsm.update(Some(&msg), &mut world);
        assert_eq!(fsm.machine().state(), STATE_ATTACK);
    }
}
