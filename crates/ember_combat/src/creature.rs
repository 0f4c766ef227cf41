//! Creature state, combat, and command execution

use ember_actor::{
    collision::planar_distance, Actor, ActorSet, CollisionTag, Entity, PendingStrike,
    UpdateContext, WorldServices,
};
use ember_ai::{Command, CommandKind, Fsm, FsmContext, FsmRegistry};
use ember_core::{ActorId, PropertyBag};
use ember_message::{Message, MessageKind};
use glam::Vec3;
use std::any::Any;
use std::collections::VecDeque;

/// Fallback sound when a creature has none configured
const DEFAULT_SOUND: &str = "data/sound/default.wav";

/// Minimum milliseconds a corpse stays before it may despawn
const MIN_CORPSE_TIME_MS: f32 = 1000.0;

/// Top-level creature state; this gates whether commands execute at all and
/// is separate from the high-level FSM
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CreatureState {
    /// Moving and acting normally
    Normal,
    /// Briefly incapacitated by a heavy hit
    Stunned,
    /// Held in place by an external effect
    Frozen,
    /// Playing the death animation
    Dying,
    /// A corpse, awaiting despawn
    Dead,
    /// Awaiting resurrection; moves but cannot be harmed
    Ghost,
}

/// Outcome of a call to [`Creature::damage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    /// Damage actually applied after armor and self-damage reduction
    pub final_damage: i32,
    /// Whether the hit was lethal
    pub died: bool,
    /// Whether the hit stunned the creature
    pub stunned: bool,
}

/// An actor with health, combat stats, and the two AI layers
pub struct Creature {
    /// Base actor state
    pub actor: Actor,
    /// Top-level state
    pub state: CreatureState,
    /// Countdown governing the current top-level state
    pub state_timer: f32,
    /// Current health; may overshoot below zero on a lethal hit
    pub health_points: i32,
    /// Health ceiling
    pub max_health_points: i32,
    /// Base damage per swing
    pub attack_damage: i32,
    /// Outgoing damage multiplier
    pub weapon_multiplier: f32,
    /// Incoming damage multiplier
    pub armor_multiplier: f32,
    /// Base milliseconds between attacks
    pub attack_cool_down: f32,
    /// Cooldown multiplier
    pub attack_cool_down_multiplier: f32,
    /// Milliseconds for an attack to charge to full damage
    pub attack_charge_time: f32,
    /// Milliseconds since the last attack landed
    pub time_since_last_attack: f32,
    /// Countdown until the next attack is allowed
    pub attack_cool_down_timer: f32,
    /// Staggered countdown to the next high-level FSM tick
    pub fsm_update_timer: f32,
    /// Milliseconds a stun lasts
    pub max_stun_time: f32,
    /// Fraction of max health a single hit must reach to stun
    pub damage_percent_to_stun: f32,
    /// Milliseconds knockback velocity is held
    pub max_knock_back_time: f32,
    /// Remaining knockback hold
    pub knock_back_timer: f32,
    /// Knockback speed in meters per second
    pub knock_back_speed: f32,
    /// Velocity held while knocked back
    pub current_knock_back_velocity: Vec3,
    /// Countdown forcing the current order to be abandoned
    pub time_until_order_cancelled: f32,
    /// Sound effect candidates
    pub dying_sounds: Vec<String>,
    /// Sound effect candidates
    pub pain_sounds: Vec<String>,
    /// Sound effect candidates
    pub attack_sounds: Vec<String>,
    /// Sound effect candidates
    pub attn_sounds: Vec<String>,
    /// Name of the high-level FSM, for persistence
    pub fsm_name: String,
    orders: VecDeque<Command>,
    fsm: Option<Fsm>,
    have_message: bool,
    last_message: Message,
}

impl Creature {
    /// Create a creature with stock tuning
    pub fn new(id: ActorId) -> Self {
        Self {
            actor: Actor::new(id),
            state: CreatureState::Normal,
            state_timer: 0.0,
            health_points: 1,
            max_health_points: 1,
            attack_damage: 0,
            weapon_multiplier: 1.0,
            armor_multiplier: 1.0,
            attack_cool_down: 700.0,
            attack_cool_down_multiplier: 1.0,
            attack_charge_time: 3000.0,
            time_since_last_attack: 0.0,
            attack_cool_down_timer: 0.0,
            fsm_update_timer: 0.0,
            max_stun_time: 1200.0,
            damage_percent_to_stun: 0.07,
            max_knock_back_time: 10.0,
            knock_back_timer: 0.0,
            knock_back_speed: 12.0,
            current_knock_back_velocity: Vec3::ZERO,
            time_until_order_cancelled: 0.0,
            dying_sounds: Vec::new(),
            pain_sounds: Vec::new(),
            attack_sounds: Vec::new(),
            attn_sounds: Vec::new(),
            fsm_name: String::from("none"),
            orders: VecDeque::new(),
            fsm: None,
            have_message: false,
            last_message: Message::default(),
        }
    }

    /// Create a player-controlled creature
    pub fn new_player(id: ActorId) -> Self {
        let mut player = Self::new(id);
        player.actor.name = String::from("player");
        player.actor.tag = CollisionTag::player();
        player.health_points = 100;
        player.max_health_points = 100;
        player
    }

    /// Whether the creature has not begun dying
    pub fn is_alive(&self) -> bool {
        !matches!(self.state, CreatureState::Dying | CreatureState::Dead)
    }

    /// Whether commands may move the creature
    pub fn can_move(&self) -> bool {
        matches!(self.state, CreatureState::Normal | CreatureState::Ghost)
    }

    /// Current health over maximum health
    pub fn health_fraction(&self) -> f32 {
        if self.max_health_points <= 0 {
            return 0.0;
        }
        self.health_points.max(0) as f32 / self.max_health_points as f32
    }

    /// Restore health, capped at the maximum
    pub fn heal(&mut self, heal_value: i32, services: &mut dyn WorldServices) {
        self.health_points = (self.health_points + heal_value).min(self.max_health_points);

        services.spawn_pfx("data/particle/heal.xml", self.actor.position);
        services.play_sound("data/sound/magical-healing.wav");
    }

    /// Apply damage. Armor scales the amount, self-inflicted damage is
    /// halved, a heavy hit stuns and knocks back, and a lethal hit starts
    /// the dying sequence.
    pub fn damage(
        &mut self,
        amount: i32,
        attacker: ActorId,
        attacker_pos: Option<Vec3>,
        services: &mut dyn WorldServices,
    ) -> DamageResult {
        let mut result = DamageResult {
            final_damage: 0,
            died: false,
            stunned: false,
        };

        if !self.is_alive() || amount < 0 {
            return result;
        }

        let mut final_damage = (amount as f32 * self.armor_multiplier).floor() as i32;

        // Damage to self is reduced
        if attacker == self.actor.id {
            final_damage /= 2;
        }

        self.health_points -= final_damage;
        result.final_damage = final_damage;

        // Signal the AI; the router would deliver this straight back to us,
        // so buffer it directly
        self.buffer_message(
            Message::new(MessageKind::Attacked, attacker, self.actor.id).with_int(final_damage),
        );

        // Stun and knock back if damaged enough
        let p = final_damage as f32 / self.max_health_points.max(1) as f32;
        if p >= self.damage_percent_to_stun {
            self.state = CreatureState::Stunned;
            self.state_timer = self.max_stun_time;
            result.stunned = true;
            if let Some(from) = attacker_pos {
                self.apply_knock_back(self.actor.position - from);
            }
        }

        if self.health_points <= 0 {
            self.kill(services);
            result.died = true;
        }

        result
    }

    /// Begin the dying sequence
    pub fn kill(&mut self, services: &mut dyn WorldServices) {
        let sfx = self.dying_sfx();
        services.play_sound_3d(&sfx, self.actor.position);

        let delay = services.animation_length_ms(self.actor.id, "dying");
        services.change_animation(self.actor.id, "dying", 1.0);

        self.state = CreatureState::Dying;
        self.state_timer = delay;

        self.on_death();
    }

    fn on_death(&mut self) {
        self.actor.solid = false;
    }

    /// Hold the creature in place for three stun durations
    pub fn freeze(&mut self) {
        if self.is_alive() {
            self.state = CreatureState::Frozen;
            self.state_timer = self.max_stun_time * 3.0;
        }
    }

    /// Return from ghost state at full health
    pub fn resurrect(&mut self, services: &mut dyn WorldServices) {
        self.state = CreatureState::Normal;
        self.health_points = self.max_health_points;

        services.change_animation(self.actor.id, "idle", 1.0);
        services.spawn_pfx("data/particle/summon.xml", self.actor.position);
    }

    /// Shove the creature along a direction at knockback speed
    pub fn apply_knock_back(&mut self, direction: Vec3) {
        self.knock_back_timer = self.max_knock_back_time;
        let v = direction.normalize_or_zero() * self.knock_back_speed;
        self.actor.velocity = v;
        self.current_knock_back_velocity = v;
    }

    /// Attach the named high-level FSM, replacing any previous machine.
    /// Unknown names degrade to no machine.
    pub fn set_fsm(&mut self, name: &str, registry: &FsmRegistry) {
        self.fsm_name = name.into();
        self.fsm = registry.create(name, self.actor.id).map(|mut fsm| {
            // Arm the initial transition so the first tick runs Enter
            fsm.machine_mut().set_state(0);
            fsm
        });
    }

    /// The attached FSM, if any
    pub fn fsm(&self) -> Option<&Fsm> {
        self.fsm.as_ref()
    }

    /// Append an order to the queue
    pub fn queue_command(&mut self, cmd: Command) -> bool {
        if self.orders.is_empty() {
            // Only order in the queue, so it owns the timeout counter
            self.time_until_order_cancelled = cmd.timeout_ms;
        }
        self.orders.push_back(cmd);
        true
    }

    /// Push an order to the front: it runs now, prior orders resume after
    pub fn inject_command(&mut self, cmd: Command) -> bool {
        self.time_until_order_cancelled = cmd.timeout_ms;
        self.orders.push_front(cmd);
        true
    }

    /// Empty the order queue
    pub fn cancel_orders(&mut self) {
        self.orders.clear();
    }

    /// Whether any orders are pending
    pub fn has_orders(&self) -> bool {
        !self.orders.is_empty()
    }

    /// The order currently being executed
    pub fn current_order(&self) -> Option<&Command> {
        self.orders.front()
    }

    /// Abandon the current order and arm the next one's timeout
    pub fn goto_next_order(&mut self) {
        if self.orders.pop_front().is_some() {
            if let Some(next) = self.orders.front() {
                self.time_until_order_cancelled = next.timeout_ms;
            }
        }
    }

    fn buffer_message(&mut self, msg: Message) {
        self.have_message = true;
        self.last_message = msg;
    }

    /// The message waiting for the next FSM tick, if any
    pub fn buffered_message(&self) -> Option<&Message> {
        self.have_message.then_some(&self.last_message)
    }

    /// Steer toward a point with the axis-aligned heuristic: X and Z are
    /// driven independently to full deflection by the sign of the delta,
    /// then the result is normalized and scaled
    pub fn walk_towards(&mut self, target: Vec3, speed: f32) {
        debug_assert!((-1.0..=1.0).contains(&speed), "speed out of range: {speed}");

        if !self.can_move() {
            return;
        }

        let mut v = Vec3::ZERO;

        if target.x > self.actor.position.x {
            v.x = 1.0;
        } else if target.x < self.actor.position.x {
            v.x = -1.0;
        }

        if target.z > self.actor.position.z {
            v.z = 1.0;
        } else if target.z < self.actor.position.z {
            v.z = -1.0;
        }

        self.actor.velocity = v.normalize_or_zero() * (self.actor.top_speed * speed);
        self.actor.look_at(target);
    }

    /// Run one simulation tick
    pub fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.time_since_last_attack += dt_ms;
        self.time_until_order_cancelled -= dt_ms;

        if self.time_until_order_cancelled <= 0.0 {
            self.time_until_order_cancelled = 0.0;
            self.goto_next_order();
        }

        if self.state == CreatureState::Ghost {
            self.state_timer -= dt_ms;
            if self.state_timer <= 0.0 {
                self.state_timer = 0.0;
                self.resurrect(ctx.services);
            }
        }

        match self.state {
            CreatureState::Normal | CreatureState::Ghost => {
                if self.attack_cool_down_timer > 0.0 {
                    self.attack_cool_down_timer -= dt_ms;
                }

                self.tick_fsm(dt_ms, ctx);
                self.process_command(ctx);

                let anim = self.walk_anim();
                ctx.services.change_animation(self.actor.id, anim, 1.0);
            }

            CreatureState::Stunned => {
                self.state_timer -= dt_ms;
                self.knock_back_timer -= dt_ms;

                if self.knock_back_timer < 0.0 {
                    self.knock_back_timer = 0.0;
                } else {
                    // Hold the knockback velocity against friction
                    self.actor.velocity = self.current_knock_back_velocity;
                }

                if self.state_timer <= 0.0 {
                    self.state = CreatureState::Normal;
                    self.state_timer = 0.0;
                }

                ctx.services.change_animation(self.actor.id, "stun", 1.0);
            }

            CreatureState::Frozen => {
                ctx.services.change_animation(self.actor.id, "stun", 1.0);

                self.state_timer -= dt_ms;
                if self.state_timer <= 0.0 {
                    self.state = CreatureState::Normal;
                    self.state_timer = 0.0;
                }
            }

            CreatureState::Dying => {
                self.state_timer -= dt_ms;
                if self.state_timer <= 0.0 {
                    self.state = CreatureState::Dead;
                    self.state_timer = MIN_CORPSE_TIME_MS;
                }
            }

            CreatureState::Dead => {
                ctx.services.change_animation(self.actor.id, "dead", 1.0);

                self.state_timer -= dt_ms;

                // Despawn only once the corpse timer is spent and the body
                // is off-screen
                if self.state_timer <= 0.0 {
                    self.actor.zombie |= !ctx
                        .services
                        .is_visible(self.actor.position, self.actor.sphere_radius);
                    self.state_timer = 0.0;
                }
            }
        }

        self.actor.update(dt_ms, ctx.map);
    }

    /// Staggered high-level FSM tick, consuming the buffered message
    fn tick_fsm(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.fsm_update_timer -= dt_ms;

        let Some(mut fsm) = self.fsm.take() else {
            return;
        };

        if self.fsm_update_timer <= 0.0 {
            self.fsm_update_timer = ctx.random_range(50.0, 200.0);

            let msg = if self.have_message {
                self.have_message = false;
                Some(self.last_message)
            } else {
                None
            };

            let mut fsm_ctx = CreatureFsmContext {
                creature: self,
                world: ctx,
            };
            fsm.update(msg.as_ref(), &mut fsm_ctx);
        }

        self.fsm = Some(fsm);
    }

    /// Execute the front order
    fn process_command(&mut self, ctx: &mut UpdateContext) {
        let Some(cmd) = self.orders.front().copied() else {
            return;
        };

        match cmd.kind {
            CommandKind::Freeze => {
                if let Some(pos) = ctx.actors.actor(cmd.target).map(|a| a.position) {
                    self.actor.look_at(pos);
                }
            }
            CommandKind::MoveToPos => self.process_move_to_pos(&cmd),
            CommandKind::MoveToTarget => self.process_move_to_target(&cmd, ctx),
            CommandKind::Attack => self.process_attack_target(&cmd, ctx),
            CommandKind::Flee => self.process_flee_target(&cmd, ctx),
            CommandKind::Use => self.process_use_target(&cmd, ctx),
        }
    }

    fn process_move_to_pos(&mut self, cmd: &Command) {
        let distance =
            planar_distance(self.actor.position, cmd.position) - self.actor.cylinder_radius;

        if distance < cmd.desired_proximity {
            self.goto_next_order();
        } else {
            self.walk_towards(cmd.position, cmd.desired_speed);
        }
    }

    fn process_move_to_target(&mut self, cmd: &Command, ctx: &UpdateContext) {
        let target_pos = ctx.actors.actor(cmd.target).map(|a| a.position);

        match target_pos {
            // No valid target, or we're already touching it
            None => self.goto_next_order(),
            Some(_) if self.actor.was_collision(cmd.target) => self.goto_next_order(),
            Some(pos) => self.walk_towards(pos, cmd.desired_speed),
        }
    }

    fn process_attack_target(&mut self, cmd: &Command, ctx: &mut UpdateContext) {
        let target = ctx
            .actors
            .actor(cmd.target)
            .map(|a| (a.position, a.cylinder_radius));

        let Some((target_pos, target_radius)) = target else {
            self.goto_next_order();
            return;
        };
        if !self.can_move() {
            self.goto_next_order();
            return;
        }

        let speed = cmd.desired_speed * self.actor.top_speed;
        let attack_charge = self.time_since_last_attack / self.attack_charge_time;
        let charge_time_remaining =
            (self.attack_charge_time - self.time_since_last_attack).max(0.0) / 1000.0;
        let distance = planar_distance(self.actor.position, target_pos);
        let vulnerable_radius = (self.actor.cylinder_radius + target_radius) * 2.0;
        let distance_to_leave = vulnerable_radius - distance;
        let time_to_leave = speed * distance_to_leave;

        let in_reach = self.target_in_reach(cmd.target, ctx);

        if in_reach {
            if attack_charge >= 1.0 {
                self.start_attack_action(cmd.target, ctx);
            } else if time_to_leave < charge_time_remaining && self.attack_cool_down_timer <= 0.0 {
                // Back away while the attack charges
                let z = (self.actor.position - target_pos).normalize_or_zero();
                self.actor.orientation = ember_actor::Basis::from_planar_z(z);
                self.actor.velocity = z * speed;
            } else {
                // Hold position
                self.actor.look_at(target_pos);
            }
        } else {
            self.inject_command(Command::move_to_target(cmd.target));
        }
    }

    fn process_flee_target(&mut self, cmd: &Command, ctx: &UpdateContext) {
        let target_pos = ctx.actors.actor(cmd.target).map(|a| a.position);

        let done = !self.can_move()
            || match target_pos {
                None => true,
                Some(pos) => {
                    planar_distance(self.actor.position, pos) > cmd.desired_proximity
                }
            };

        if done {
            self.goto_next_order();
            return;
        }

        let pos = target_pos.unwrap_or(self.actor.position);
        let away = (self.actor.position - pos).normalize_or_zero();
        self.actor.orientation = ember_actor::Basis::from_planar_z(-away);
        self.actor.velocity = away * (cmd.desired_speed * self.actor.top_speed);
    }

    fn process_use_target(&mut self, cmd: &Command, ctx: &mut UpdateContext) {
        let target_pos = ctx
            .actors
            .actor(cmd.target)
            .map(|a| a.position)
            .unwrap_or(cmd.position);

        let distance =
            planar_distance(self.actor.position, target_pos) - self.actor.cylinder_radius;
        let attack_distance = 1.0;

        if distance < attack_distance {
            ctx.services.play_sound("data/sound/activate.wav");
        } else {
            self.inject_command(
                Command::move_to_target(cmd.target).with_proximity(attack_distance),
            );
        }
    }

    /// Proximity test that also ignores dead creatures
    fn target_in_reach(&self, target: ActorId, ctx: &UpdateContext) -> bool {
        if self.actor.zombie {
            return false;
        }
        let Some(entity) = ctx.actors.get(target) else {
            return false;
        };
        if let Some(creature) = entity.downcast_ref::<Creature>() {
            if !creature.is_alive() {
                return false;
            }
        }

        let other = entity.actor();
        self.actor.is_in_proximity(
            other.position,
            other.cylinder_radius,
            self.actor.cylinder_radius,
        )
    }

    /// Begin a swing: commit the charged damage, start the cooldown, and
    /// schedule the strike to land partway into the animation
    fn start_attack_action(&mut self, target: ActorId, ctx: &mut UpdateContext) {
        let Some(target_pos) = ctx.actors.actor(target).map(|a| a.position) else {
            return;
        };
        if !ctx
            .actors
            .get(target)
            .and_then(|e| e.downcast_ref::<Creature>())
            .map(|c| c.is_alive())
            .unwrap_or(false)
        {
            return;
        }

        if self.can_move() && self.attack_cool_down_timer <= 0.0 {
            let charge_multiplier =
                (self.time_since_last_attack / self.attack_charge_time).min(1.0) * 0.90 + 0.10;
            let damage_value =
                (self.attack_damage as f32 * charge_multiplier * self.weapon_multiplier).floor()
                    as i32;

            let delay = ctx.services.animation_length_ms(self.actor.id, "attack");
            ctx.services.change_animation(self.actor.id, "attack", 1.0);

            self.attack_cool_down_timer =
                (self.attack_cool_down * self.attack_cool_down_multiplier).max(delay);

            // The damage lands once the swing is underway
            ctx.queue_strike(PendingStrike {
                delay_ms: delay * 0.33,
                attacker: self.actor.id,
                target,
                damage: damage_value,
            });

            self.time_since_last_attack = 0.0;
            let sfx = self.attack_sfx(ctx);
            ctx.services.play_sound(&sfx);
            self.actor.look_at(target_pos);
        }
    }

    fn walk_anim(&self) -> &'static str {
        if self.actor.velocity.length() < self.actor.min_walking_velocity {
            "idle"
        } else {
            "run"
        }
    }

    fn pick_sound(sounds: &[String], index: usize) -> String {
        match sounds.len() {
            0 => DEFAULT_SOUND.into(),
            1 => sounds[0].clone(),
            n => sounds[index % n].clone(),
        }
    }

    /// A dying sound, chosen at random when several are configured
    pub fn dying_sfx(&self) -> String {
        Self::pick_sound(&self.dying_sounds, 0)
    }

    fn attack_sfx(&self, ctx: &mut UpdateContext) -> String {
        let index = ctx.random_index(self.attack_sounds.len());
        Self::pick_sound(&self.attack_sounds, index)
    }

    /// An attention sound, chosen at random when several are configured
    pub fn attn_sfx(&self, index: usize) -> String {
        Self::pick_sound(&self.attn_sounds, index)
    }
}

impl Entity for Creature {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    fn type_name(&self) -> &'static str {
        "creature"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        Creature::update(self, dt_ms, ctx);
    }

    fn on_message(&mut self, msg: &Message) {
        debug_assert_eq!(
            self.actor.id, msg.recipient,
            "message was mailed to the wrong actor"
        );
        self.buffer_message(*msg);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.actor.load(bag);

        self.health_points = bag.get_or("healthPoints", self.health_points);
        self.max_health_points = bag.get_or("maxHealthPoints", self.max_health_points);
        self.attack_damage = bag.get_or("attackDamage", self.attack_damage);
        self.weapon_multiplier = bag.get_or("weaponMultiplier", self.weapon_multiplier);
        self.armor_multiplier = bag.get_or("armorMultiplier", self.armor_multiplier);
        self.attack_cool_down = bag.get_or("attackCoolDown", self.attack_cool_down);
        self.attack_cool_down_multiplier =
            bag.get_or("attackCoolDownMultiplier", self.attack_cool_down_multiplier);
        self.attack_charge_time = bag.get_or("attackChargeTime", self.attack_charge_time);
        self.damage_percent_to_stun =
            bag.get_or("damagePercentToStun", self.damage_percent_to_stun);
        self.max_knock_back_time = bag.get_or("maxKnockBackTime", self.max_knock_back_time);
        self.knock_back_speed = bag.get_or("knockBackSpeed", self.knock_back_speed);

        self.dying_sounds = bag.get_list("dyingSounds");
        self.pain_sounds = bag.get_list("painSounds");
        self.attack_sounds = bag.get_list("attackSounds");
        self.attn_sounds = bag.get_list("attnSounds");

        self.fsm_name = bag.get_or("fsm", std::mem::take(&mut self.fsm_name));
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = Creature::new(ActorId::INVALID);
        self.actor.save_tidy(bag, &defaults.actor);

        bag.set_tidy("healthPoints", &self.health_points, &defaults.health_points);
        bag.set_tidy(
            "maxHealthPoints",
            &self.max_health_points,
            &defaults.max_health_points,
        );
        bag.set_tidy("attackDamage", &self.attack_damage, &defaults.attack_damage);
        bag.set_tidy(
            "weaponMultiplier",
            &self.weapon_multiplier,
            &defaults.weapon_multiplier,
        );
        bag.set_tidy(
            "armorMultiplier",
            &self.armor_multiplier,
            &defaults.armor_multiplier,
        );
        bag.set_tidy(
            "attackCoolDown",
            &self.attack_cool_down,
            &defaults.attack_cool_down,
        );
        bag.set_tidy(
            "attackCoolDownMultiplier",
            &self.attack_cool_down_multiplier,
            &defaults.attack_cool_down_multiplier,
        );
        bag.set_tidy(
            "attackChargeTime",
            &self.attack_charge_time,
            &defaults.attack_charge_time,
        );
        bag.set_tidy(
            "damagePercentToStun",
            &self.damage_percent_to_stun,
            &defaults.damage_percent_to_stun,
        );
        bag.set_list("dyingSounds", &self.dying_sounds);
        bag.set_list("painSounds", &self.pain_sounds);
        bag.set_list("attackSounds", &self.attack_sounds);
        bag.set_list("attnSounds", &self.attn_sounds);
        bag.set_tidy("fsm", &self.fsm_name, &defaults.fsm_name);
    }
}

impl std::fmt::Debug for Creature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creature")
            .field("id", &self.actor.id)
            .field("name", &self.actor.name)
            .field("state", &self.state)
            .field("health", &self.health_points)
            .field("orders", &self.orders.len())
            .finish()
    }
}

/// Resolve a matured strike: the damage lands only if both parties are
/// still present, alive, and within melee range
pub fn deliver_strike(
    set: &mut ActorSet,
    services: &mut dyn WorldServices,
    strike: &PendingStrike,
) {
    let attacker = match set.get(strike.attacker).and_then(|e| e.downcast_ref::<Creature>()) {
        Some(c) => (
            c.actor.position,
            c.actor.cylinder_radius,
            c.actor.zombie,
            c.is_alive() && c.can_move(),
        ),
        None => return,
    };
    let (attacker_pos, attacker_radius, attacker_zombie, attacker_able) = attacker;

    let Some(target) = set
        .get_mut(strike.target)
        .and_then(|e| e.downcast_mut::<Creature>())
    else {
        return;
    };

    let distance = planar_distance(attacker_pos, target.actor.position);
    let max_attack_distance = (attacker_radius + target.actor.cylinder_radius) * 1.1;

    if !attacker_zombie
        && !target.actor.zombie
        && attacker_able
        && target.is_alive()
        && distance < max_attack_distance
    {
        target.damage(strike.damage, strike.attacker, Some(attacker_pos), services);
    }
}

/// The owner/world seam handed to the high-level FSM while it runs
struct CreatureFsmContext<'b, 'a> {
    creature: &'b mut Creature,
    world: &'b mut UpdateContext<'a>,
}

impl FsmContext for CreatureFsmContext<'_, '_> {
    fn owner_id(&self) -> ActorId {
        self.creature.actor.id
    }

    fn clock_ms(&self) -> f64 {
        self.world.clock_ms
    }

    fn owner_position(&self) -> Vec3 {
        self.creature.actor.position
    }

    fn owner_spawn_point(&self) -> Vec3 {
        self.creature.actor.spawn_point
    }

    fn owner_health_fraction(&self) -> f32 {
        self.creature.health_fraction()
    }

    fn owner_has_orders(&self) -> bool {
        self.creature.has_orders()
    }

    fn owner_any_collisions(&self) -> bool {
        self.creature.actor.any_collisions()
    }

    fn queue_command(&mut self, cmd: Command) -> bool {
        self.creature.queue_command(cmd)
    }

    fn inject_command(&mut self, cmd: Command) -> bool {
        self.creature.inject_command(cmd)
    }

    fn cancel_orders(&mut self) {
        self.creature.cancel_orders();
    }

    fn surface_distance_to(&self, id: ActorId) -> Option<f32> {
        let other = self.world.actors.actor(id)?;
        let separation = self.creature.actor.cylinder_radius + other.cylinder_radius;
        Some(planar_distance(self.creature.actor.position, other.position) - separation)
    }

    fn is_attackable(&self, id: ActorId) -> bool {
        self.world
            .actors
            .get(id)
            .and_then(|e| e.downcast_ref::<Creature>())
            .map(|c| c.is_alive())
            .unwrap_or(false)
    }

    fn closest_attackable(&self, range: f32) -> ActorId {
        let mut best = ActorId::INVALID;
        let mut best_distance = range;

        for &player in self.world.players {
            if player == self.creature.actor.id {
                continue;
            }
            if !self.is_attackable(player) {
                continue;
            }
            let Some(other) = self.world.actors.actor(player) else {
                continue;
            };
            let distance = planar_distance(self.creature.actor.position, other.position);
            if distance <= best_distance {
                best = player;
                best_distance = distance;
            }
        }

        best
    }

    fn send_message(&mut self, msg: Message) -> bool {
        self.world.send_message(msg)
    }

    fn random_range(&mut self, lo: f32, hi: f32) -> f32 {
        self.world.random_range(lo, hi)
    }

    fn play_attention_sound(&mut self) {
        let index = self.world.random_index(self.creature.attn_sounds.len());
        let sfx = self.creature.attn_sfx(index);
        self.world.services.play_sound(&sfx);
    }
}
