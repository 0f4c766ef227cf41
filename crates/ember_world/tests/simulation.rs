//! Whole-zone simulation scenarios

use ember_actor::{BasicActor, Entity, Map};
use ember_combat::{Creature, CreatureState};
use ember_core::PropertyBag;
use ember_message::{Message, MessageKind};
use ember_triggers::{Detector, Listener};
use ember_world::Zone;
use glam::Vec3;

fn flat_zone() -> Zone {
    Zone::new(Map::new(32, 32, 1.0))
}

fn creature_bag(name: &str, health: i32) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.set("type", &"creature".to_string());
    bag.set("name", &name.to_string());
    bag.set("healthPoints", &health);
    bag.set("maxHealthPoints", &health);
    bag
}

#[test]
fn monster_hunts_and_wounds_the_player() {
    let mut zone = flat_zone();
    let player = zone.add_player(Vec3::new(8.0, 0.0, 8.0));

    let mut bag = creature_bag("grub", 60);
    bag.set("attackDamage", &10);
    // Instant charge so the first swing can happen as soon as it is in reach
    bag.set("attackChargeTime", &1.0f32);
    bag.set("fsm", &"monster".to_string());
    zone.spawn_now(&bag, Vec3::new(9.0, 0.0, 8.0)).unwrap();

    for _ in 0..60 {
        zone.update(100.0);
    }

    let hp = zone
        .objects
        .get(player)
        .unwrap()
        .downcast_ref::<Creature>()
        .unwrap()
        .health_points;
    assert!(hp < 100, "monster never landed a hit; hp = {hp}");
}

#[test]
fn persistent_collision_never_advances_position() {
    let mut zone = flat_zone();

    // A wall of an actor, and a walker driven into it every tick
    let wall = zone.objects.spawn_with(|id| {
        let mut a = BasicActor::new(id);
        a.actor_mut().place(Vec3::new(10.0, 0.0, 10.0));
        a.actor_mut().cylinder_radius = 1.0;
        Box::new(a)
    });
    let walker = zone.objects.spawn_with(|id| {
        let mut a = BasicActor::new(id);
        a.actor_mut().place(Vec3::new(8.9, 0.0, 10.0));
        a.actor_mut().cylinder_radius = 1.0;
        Box::new(a)
    });

    let start = zone.objects.actor(walker).unwrap().position;

    for _ in 0..10 {
        // Re-shove every tick; friction would otherwise stop the walker
        zone.objects.actor_mut(walker).unwrap().velocity = Vec3::new(2.0, 0.0, 0.0);
        zone.update(100.0);
        // Position never advances while persistently colliding
        assert_eq!(zone.objects.actor(walker).unwrap().position, start);
    }

    let _ = wall;
}

#[test]
fn collision_free_actor_commits_position_every_tick() {
    let mut zone = flat_zone();
    let drifter = zone.objects.spawn_with(|id| {
        let mut a = BasicActor::new(id);
        a.actor_mut().place(Vec3::new(2.0, 0.0, 2.0));
        Box::new(a)
    });

    for _ in 0..5 {
        zone.objects.actor_mut(drifter).unwrap().velocity = Vec3::new(1.0, 0.0, 0.0);
        zone.update(100.0);
        let actor = zone.objects.actor(drifter).unwrap();
        assert_eq!(actor.position, actor.validated_pos);
    }

    assert!(zone.objects.actor(drifter).unwrap().position.x > 2.0);
}

#[test]
fn delayed_duplicate_messages_deliver_once() {
    let mut zone = flat_zone();
    let a = zone.add_player(Vec3::new(1.0, 0.0, 1.0));
    let b = zone.add_player(Vec3::new(4.0, 0.0, 4.0));

    let msg = Message::new(MessageKind::Sanity, a, b)
        .with_int(7)
        .with_delay(200.0);

    let now = zone.clock_ms();
    assert!(zone.router.send(msg, now, &mut zone.objects));
    assert!(!zone.router.send(msg, now, &mut zone.objects));
    assert_eq!(zone.router.pending_count(), 1);

    zone.update(250.0);

    let creature = zone
        .objects
        .get(b)
        .unwrap()
        .downcast_ref::<Creature>()
        .unwrap();
    let buffered = creature.buffered_message().unwrap();
    assert_eq!(buffered.kind, MessageKind::Sanity);
    assert_eq!(zone.router.pending_count(), 0);
}

#[test]
fn detector_signal_reaches_listener_through_zone() {
    let mut zone = flat_zone();
    zone.add_player(Vec3::new(5.0, 0.0, 5.0));

    // A proximity detector wired to signal 2, and a listener on signal 2
    let mut detector_bag = PropertyBag::new();
    detector_bag.set("type", &"proximity_detector".to_string());
    detector_bag.set("signalSuccess", &2);
    detector_bag.set("triggerRadius", &3.0f32);
    detector_bag.set("solid", &false);
    let detector = zone.spawn_now(&detector_bag, Vec3::new(5.0, 0.0, 6.0)).unwrap();

    let mut listener_bag = PropertyBag::new();
    listener_bag.set("type", &"listener".to_string());
    listener_bag.set("expression", &"any: 2".to_string());
    listener_bag.set("solid", &false);
    let listener = zone
        .spawn_now(&listener_bag, Vec3::new(20.0, 0.0, 20.0))
        .unwrap();

    zone.update(16.0);

    assert!(zone
        .objects
        .get(detector)
        .unwrap()
        .downcast_ref::<Detector>()
        .is_some());
    let l = zone
        .objects
        .get(listener)
        .unwrap()
        .downcast_ref::<Listener>()
        .unwrap();
    assert!(l.poll_conditions(), "listener never heard the signal");
}

#[test]
fn command_timeout_fires_for_every_command_kind() {
    use ember_ai::Command;

    let mut zone = flat_zone();
    let far_target = zone.add_player(Vec3::new(30.0, 0.0, 30.0));

    let id = zone
        .spawn_now(&creature_bag("stuck", 10), Vec3::new(2.0, 0.0, 2.0))
        .unwrap();

    let commands = [
        Command::move_to_pos(Vec3::new(500.0, 0.0, 500.0)).with_timeout(400.0),
        Command::freeze(far_target, 400.0),
        Command::flee(far_target, 10_000.0).with_timeout(400.0),
    ];

    for cmd in commands {
        {
            let creature = zone
                .objects
                .get_mut(id)
                .unwrap()
                .downcast_mut::<Creature>()
                .unwrap();
            creature.cancel_orders();
            creature.queue_command(cmd);
        }

        // Never reaches the goal, so only the timeout can clear it
        for _ in 0..5 {
            zone.update(100.0);
        }
        let creature = zone
            .objects
            .get(id)
            .unwrap()
            .downcast_ref::<Creature>()
            .unwrap();
        assert!(
            !creature.has_orders(),
            "{:?} survived its timeout",
            cmd.kind
        );
    }
}

#[test]
fn dying_creature_despawns_after_corpse_time() {
    let mut zone = flat_zone();
    let id = zone
        .spawn_now(&creature_bag("doomed", 5), Vec3::new(3.0, 0.0, 3.0))
        .unwrap();

    {
        let creature = zone
            .objects
            .get_mut(id)
            .unwrap()
            .downcast_mut::<Creature>()
            .unwrap();
        let mut services = ember_actor::NullServices;
        creature.damage(50, ember_core::ActorId::INVALID, None, &mut services);
        assert_eq!(creature.state, CreatureState::Dying);
    }

    // Dying animation (1000 ms default), corpse time (1000 ms), margin
    for _ in 0..25 {
        zone.update(100.0);
    }

    assert!(!zone.objects.is_member(id), "corpse never despawned");
}

#[test]
fn use_input_activates_nearest_switch() {
    let mut zone = flat_zone();
    let player = zone.add_player(Vec3::new(5.0, 0.0, 5.0));

    let mut bag = PropertyBag::new();
    bag.set("type", &"powerup_heal".to_string());
    bag.set("triggerRadius", &2.0f32);
    bag.set("solid", &false);
    let powerup = zone.spawn_now(&bag, Vec3::new(5.5, 0.0, 5.0)).unwrap();

    {
        let creature = zone
            .objects
            .get_mut(player)
            .unwrap()
            .downcast_mut::<Creature>()
            .unwrap();
        creature.health_points = 40;
    }

    assert!(zone.try_use(player));

    let creature = zone
        .objects
        .get(player)
        .unwrap()
        .downcast_ref::<Creature>()
        .unwrap();
    assert_eq!(creature.health_points, 70);
    assert!(zone.objects.actor(powerup).unwrap().zombie);

    // The pickup is gone after the next tick's garbage collection
    zone.update(16.0);
    assert!(!zone.objects.is_member(powerup));
}
