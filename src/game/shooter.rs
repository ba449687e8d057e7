//! Battle Arena - the shooter game variant
//!
//! Owns one room's players, bots, projectiles and world objects, and
//! resolves one simulation tick at a time. Everything time-based runs off
//! the game's own clock, advanced only by `update(dt)`.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{GameSnapshot, ObstacleData, PlayerData};

use super::bot::{Bot, CONTACT_DAMAGE};
use super::combat::Projectile;
use super::geometry::{Rect, Vec2};
use super::objects::{
    InteractiveKind, InteractiveObject, SHIELD_DURATION, SHIELD_RESPAWN, SPEED_BOOST_DURATION,
    SPEED_BOOST_RESPAWN, TELEPORT_COOLDOWN,
};
use super::player::{Effect, Player};
use super::{Game, GameConfig, GameEvent, GameType, PLAYER_COLORS};

const BOT_SPAWN_POINTS: [Vec2; 3] = [
    Vec2::new(200.0, 200.0),
    Vec2::new(1000.0, 400.0),
    Vec2::new(600.0, 100.0),
];

pub struct ShooterGame {
    config: GameConfig,
    players: HashMap<Uuid, Player>,
    bots: Vec<Bot>,
    projectiles: Vec<Projectile>,
    obstacles: Vec<Rect>,
    objects: Vec<InteractiveObject>,
    clock: f64,
    color_index: usize,
    rng: ChaCha8Rng,
}

impl ShooterGame {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bots = BOT_SPAWN_POINTS
            .iter()
            .enumerate()
            .map(|(i, &spawn)| Bot::new(i, spawn, &mut rng))
            .collect();

        Self {
            config,
            players: HashMap::new(),
            bots,
            projectiles: Vec::new(),
            obstacles: Self::world_obstacles(),
            objects: Self::world_objects(),
            clock: 0.0,
            color_index: 0,
            rng,
        }
    }

    fn world_obstacles() -> Vec<Rect> {
        vec![Rect::new(200.0, 150.0, 100.0, 20.0)]
    }

    fn world_objects() -> Vec<InteractiveObject> {
        vec![
            InteractiveObject::new(
                "teleporter1",
                Rect::new(150.0, 100.0, 40.0, 40.0),
                InteractiveKind::Teleporter {
                    target_id: "teleporter2".to_string(),
                },
            ),
            InteractiveObject::new(
                "teleporter2",
                Rect::new(900.0, 600.0, 40.0, 40.0),
                InteractiveKind::Teleporter {
                    target_id: "teleporter1".to_string(),
                },
            ),
            InteractiveObject::new(
                "speedBoost1",
                Rect::new(400.0, 200.0, 30.0, 30.0),
                InteractiveKind::SpeedBoost,
            ),
            InteractiveObject::new(
                "speedBoost2",
                Rect::new(800.0, 500.0, 30.0, 30.0),
                InteractiveKind::SpeedBoost,
            ),
            InteractiveObject::new(
                "shield1",
                Rect::new(600.0, 100.0, 35.0, 35.0),
                InteractiveKind::Shield,
            ),
            InteractiveObject::new(
                "bouncer1",
                Rect::new(350.0, 350.0, 50.0, 50.0),
                InteractiveKind::Bouncer,
            ),
            InteractiveObject::new(
                "bouncer2",
                Rect::new(750.0, 250.0, 50.0, 50.0),
                InteractiveKind::Bouncer,
            ),
        ]
    }

    fn update_players(&mut self, dt: f32) {
        let clock = self.clock;
        let ids: Vec<Uuid> = self.players.keys().copied().collect();
        for id in ids {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.update_effects(clock);
            player.tick_respawn(clock, &self.config, &mut self.rng);

            if !player.advance(dt, &self.config, &self.obstacles) {
                continue;
            }

            // A successful move may land on an interactive object
            let rect = player.rect(&self.config);
            for i in 0..self.objects.len() {
                if !self.objects[i].rect.overlaps(&rect) {
                    continue;
                }
                match self.objects[i].kind.clone() {
                    InteractiveKind::Teleporter { target_id } => {
                        if clock < self.objects[i].cooldown_until {
                            continue;
                        }
                        if let Some(j) = self.objects.iter().position(|o| o.id == target_id) {
                            player.x = self.objects[j].rect.x;
                            player.y = self.objects[j].rect.y;
                            // Shared cooldown on both ends prevents ping-pong
                            self.objects[i].cooldown_until = clock + TELEPORT_COOLDOWN;
                            self.objects[j].cooldown_until = clock + TELEPORT_COOLDOWN;
                        }
                    }
                    InteractiveKind::SpeedBoost => {
                        if self.objects[i].active {
                            player.effects.speed_boost = Effect {
                                active: true,
                                ends_at: clock + SPEED_BOOST_DURATION,
                            };
                            self.objects[i].active = false;
                            self.objects[i].respawn_at = clock + SPEED_BOOST_RESPAWN;
                        }
                    }
                    InteractiveKind::Shield => {
                        if self.objects[i].active {
                            player.effects.shield = Effect {
                                active: true,
                                ends_at: clock + SHIELD_DURATION,
                            };
                            self.objects[i].active = false;
                            self.objects[i].respawn_at = clock + SHIELD_RESPAWN;
                        }
                    }
                    InteractiveKind::Bouncer => {}
                }
            }
        }
    }

    fn update_bots(&mut self, dt: f32) {
        let clock = self.clock;
        let alive: Vec<(Uuid, f32, f32)> = self
            .players
            .values()
            .filter(|p| p.alive)
            .map(|p| (p.id, p.x, p.y))
            .collect();

        for bot in &mut self.bots {
            if let Some(target_id) = bot.update(dt, clock, &alive, &self.config, &mut self.rng) {
                if let Some(player) = self.players.get_mut(&target_id) {
                    if !player.shield_blocks(clock) {
                        player.health -= CONTACT_DAMAGE;
                        if player.health <= 0.0 {
                            player.kill(clock, &self.config);
                        }
                    }
                }
            }
        }
    }

    /// Advance projectiles and resolve collisions in a fixed order:
    /// obstacles, bouncers (redirect only), players, bots. The first
    /// matching target wins the tick.
    fn update_projectiles(&mut self, dt: f32) -> Vec<GameEvent> {
        let clock = self.clock;
        let mut events = Vec::new();

        let mut i = 0;
        while i < self.projectiles.len() {
            self.projectiles[i].advance(dt, &self.config);

            if self.projectiles[i].expired(clock) {
                self.projectiles.remove(i);
                continue;
            }

            let mut prect = self.projectiles[i].rect(&self.config);

            if self.obstacles.iter().any(|o| o.overlaps(&prect)) {
                self.projectiles.remove(i);
                continue;
            }

            for oi in 0..self.objects.len() {
                if !matches!(self.objects[oi].kind, InteractiveKind::Bouncer) {
                    continue;
                }
                if !self.objects[oi].rect.overlaps(&prect) {
                    continue;
                }
                let center = self.objects[oi].rect.center();
                let proj = &mut self.projectiles[i];
                let dx = proj.x - center.x;
                let dy = proj.y - center.y;
                // Reflect the dominant axis, then nudge outward so the same
                // bouncer cannot re-trigger within this tick
                if dx.abs() > dy.abs() {
                    proj.vx = -proj.vx;
                } else {
                    proj.vy = -proj.vy;
                }
                proj.x += proj.vx * dt * 2.0;
                proj.y += proj.vy * dt * 2.0;
                prect = proj.rect(&self.config);
            }

            let owner = self.projectiles[i].owner;

            let target = self
                .players
                .values()
                .find(|p| p.alive && p.id != owner && p.rect(&self.config).overlaps(&prect))
                .map(|p| p.id);
            if let Some(target_id) = target {
                let killed = self
                    .players
                    .get_mut(&target_id)
                    .map(|p| p.take_damage(clock, &self.config))
                    .unwrap_or(false);
                if killed {
                    if let Some(shooter) = self.players.get_mut(&owner) {
                        shooter.kills += 1;
                    }
                    events.push(GameEvent::PlayerHit {
                        player_id: target_id,
                        shooter_id: owner,
                    });
                }
                self.projectiles.remove(i);
                continue;
            }

            if let Some(bi) = self
                .bots
                .iter()
                .position(|b| b.alive && b.rect().overlaps(&prect))
            {
                if self.bots[bi].take_hit(clock) {
                    let bot_id = self.bots[bi].id.clone();
                    let (x, y) = (self.bots[bi].x, self.bots[bi].y);
                    if let Some(shooter) = self.players.get_mut(&owner) {
                        shooter.bot_kills += 1;
                    }
                    events.push(GameEvent::BotKilled {
                        bot_id,
                        killer_id: owner,
                        x,
                        y,
                    });
                }
                self.projectiles.remove(i);
                continue;
            }

            i += 1;
        }

        events
    }
}

impl Game for ShooterGame {
    fn game_type(&self) -> GameType {
        GameType::Shooter
    }

    fn config(&self) -> GameConfig {
        self.config
    }

    fn player_count(&self) -> usize {
        self.players.len()
    }

    fn add_player(&mut self, id: Uuid, name: &str) -> PlayerData {
        let color = PLAYER_COLORS[self.color_index % PLAYER_COLORS.len()];
        self.color_index += 1;
        let player = Player::new(id, name, color, &self.config, &mut self.rng);
        let data = player.data();
        self.players.insert(id, player);
        data
    }

    fn remove_player(&mut self, id: Uuid) {
        // In-flight projectiles keep only the owner's id; they fly on
        self.players.remove(&id);
    }

    fn handle_input(&mut self, id: Uuid, axes: Vec2) {
        if let Some(player) = self.players.get_mut(&id) {
            player.set_input(axes);
        }
    }

    fn handle_aim(&mut self, id: Uuid, axes: Vec2) {
        if let Some(player) = self.players.get_mut(&id) {
            player.set_aim(axes);
        }
    }

    fn handle_shoot(&mut self, id: Uuid) {
        let clock = self.clock;
        if let Some(player) = self.players.get_mut(&id) {
            if let Some(projectile) = player.try_shoot(clock, &self.config) {
                self.projectiles.push(projectile);
            }
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        self.clock += dt as f64;
        let clock = self.clock;

        self.update_players(dt);
        self.update_bots(dt);
        for obj in &mut self.objects {
            obj.tick_respawn(clock);
        }
        self.update_projectiles(dt)
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.values().map(Player::data).collect(),
            bots: self.bots.iter().map(Bot::data).collect(),
            projectiles: self.projectiles.iter().map(Projectile::data).collect(),
            checkpoints: None,
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleData {
                    x: o.x,
                    y: o.y,
                    width: o.width,
                    height: o.height,
                    kind: "wall".to_string(),
                })
                .collect(),
            interactive_objects: self.objects.iter().map(InteractiveObject::data).collect(),
            wave: None,
            base_health: None,
        }
    }

    /// The world grows to the largest screen any client has reported
    fn update_world_size(&mut self, width: f32, height: f32) -> Option<(f32, f32)> {
        if width > self.config.world_width {
            self.config.world_width = width;
        }
        if height > self.config.world_height {
            self.config.world_height = height;
        }
        Some((self.config.world_width, self.config.world_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn game() -> ShooterGame {
        ShooterGame::new(GameConfig::default(), 42)
    }

    /// Place a player at an exact position with no input
    fn place(game: &mut ShooterGame, id: Uuid, x: f32, y: f32) {
        let player = game.players.get_mut(&id).unwrap();
        player.x = x;
        player.y = y;
    }

    fn run(game: &mut ShooterGame, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(game.update(DT));
        }
        events
    }

    #[test]
    fn one_second_of_input_moves_one_second_of_speed() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        place(&mut game, id, 400.0, 800.0);
        game.handle_input(id, Vec2::new(1.0, 0.0));

        run(&mut game, 60);

        let player = game.players.get(&id).unwrap();
        let expected = 400.0 + game.config.player_speed;
        assert!(
            (player.x - expected).abs() < 1.0,
            "x = {}, expected ~{}",
            player.x,
            expected
        );
        assert!(player.is_moving);
        assert_eq!(player.aim, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn position_wraps_instead_of_clamping() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        let w = game.config.world_width;
        let size = game.config.player_size;
        place(&mut game, id, w - size - 1.0, 800.0);
        game.handle_input(id, Vec2::new(1.0, 0.0));

        for _ in 0..30 {
            game.update(DT);
            let x = game.players.get(&id).unwrap().x;
            assert!(x < w, "position {} escaped the world", x);
        }
        // Crossing the edge lands back near zero
        let x = game.players.get(&id).unwrap().x;
        assert!(x < w / 2.0);
    }

    #[test]
    fn projectile_kill_credits_shooter_and_emits_hit() {
        let mut game = game();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        game.add_player(p1, "P1");
        game.add_player(p2, "P2");
        place(&mut game, p1, 100.0, 800.0);
        place(&mut game, p2, 100.0, 700.0);
        game.handle_aim(p1, Vec2::new(0.0, -1.0));
        game.handle_shoot(p1);
        assert_eq!(game.projectiles.len(), 1);

        let events = run(&mut game, 30);

        let victim = game.players.get(&p2).unwrap();
        assert!(!victim.alive);
        assert_eq!(victim.deaths, 1);
        assert_eq!(game.players.get(&p1).unwrap().kills, 1);
        assert!(game.projectiles.is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PlayerHit { player_id, shooter_id }
                if *player_id == p2 && *shooter_id == p1
        )));
    }

    #[test]
    fn shielded_player_survives_projectile() {
        let mut game = game();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        game.add_player(p1, "P1");
        game.add_player(p2, "P2");
        place(&mut game, p1, 100.0, 800.0);
        place(&mut game, p2, 100.0, 700.0);
        game.players.get_mut(&p2).unwrap().effects.shield = Effect {
            active: true,
            ends_at: 60.0,
        };
        game.handle_aim(p1, Vec2::new(0.0, -1.0));
        game.handle_shoot(p1);

        let events = run(&mut game, 30);

        assert!(game.players.get(&p2).unwrap().alive);
        assert_eq!(game.players.get(&p1).unwrap().kills, 0);
        // The projectile is still consumed by the hit
        assert!(game.projectiles.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn bouncer_redirects_projectile_without_consuming_it() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        // Fire straight right into bouncer1 at (350, 350, 50, 50)
        place(&mut game, id, 250.0, 375.0);
        game.handle_aim(id, Vec2::new(1.0, 0.0));
        game.handle_shoot(id);
        assert_eq!(game.projectiles.len(), 1);
        assert!(game.projectiles[0].vx > 0.0);

        run(&mut game, 30);

        // Still in flight, heading back the way it came
        assert_eq!(game.projectiles.len(), 1);
        assert!(game.projectiles[0].vx < 0.0);
        assert!(game.projectiles[0].x < 350.0);
    }

    #[test]
    fn shoot_rate_limit_holds_across_ticks() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        place(&mut game, id, 1400.0, 900.0);

        game.handle_shoot(id);
        game.update(DT);
        game.handle_shoot(id); // ~16 ms later, inside the 300 ms window
        assert_eq!(game.projectiles.len(), 1);

        run(&mut game, 20); // past the window
        game.handle_shoot(id);
        assert_eq!(game.projectiles.len(), 2);
    }

    #[test]
    fn two_projectile_hits_kill_bot_and_it_respawns() {
        let mut game = game();
        let p1 = Uuid::new_v4();
        game.add_player(p1, "P1");
        // Stand below bot_0's spawn and shoot straight up
        place(&mut game, p1, 200.0, 330.0);
        game.handle_aim(p1, Vec2::new(0.0, -1.0));

        game.handle_shoot(p1);
        let mut events = run(&mut game, 20);
        game.handle_shoot(p1);
        events.extend(run(&mut game, 20));

        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::BotKilled { bot_id, killer_id, .. }
                    if bot_id == "bot_0" && *killer_id == p1)),
            "expected a bot kill, got {:?}",
            events
        );
        let bot = game.bots.iter().find(|b| b.id == "bot_0").unwrap();
        assert!(!bot.alive);
        assert_eq!(game.players.get(&p1).unwrap().bot_kills, 1);

        // Park the shooter far away so the respawned bot is left alone
        place(&mut game, p1, 1600.0, 900.0);
        run(&mut game, 200); // > 3 s of simulated time
        let bot = game.bots.iter().find(|b| b.id == "bot_0").unwrap();
        assert!(bot.alive);
        assert_eq!(bot.health, super::super::bot::BOT_HEALTH);
    }

    #[test]
    fn speed_boost_applies_and_pad_cycles() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        // Walk right onto speedBoost1 at (400, 200)
        place(&mut game, id, 360.0, 200.0);
        game.handle_input(id, Vec2::new(1.0, 0.0));
        run(&mut game, 15);

        let player = game.players.get(&id).unwrap();
        assert!(player.effects.speed_boost.active);
        assert!(player.effects.speed_boost.ends_at > game.clock);
        assert_eq!(player.speed_multiplier(), 1.5);
        let pad = game.objects.iter().find(|o| o.id == "speedBoost1").unwrap();
        assert!(!pad.active);

        // Step off the pad; it reactivates on the room clock alone
        game.handle_input(id, Vec2::default());
        place(&mut game, id, 1500.0, 900.0);
        run(&mut game, 11 * 60);
        let pad = game.objects.iter().find(|o| o.id == "speedBoost1").unwrap();
        assert!(pad.active);
        // And the 5 s buff has long expired
        assert!(!game.players.get(&id).unwrap().effects.speed_boost.active);
    }

    #[test]
    fn shield_pad_arms_the_player_and_deactivates() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        // Walk right onto shield1 at (600, 100)
        place(&mut game, id, 560.0, 100.0);
        game.handle_input(id, Vec2::new(1.0, 0.0));
        run(&mut game, 10);

        let player = game.players.get(&id).unwrap();
        assert!(player.effects.shield.active);
        assert!(player.shield_blocks(game.clock));
        let pad = game.objects.iter().find(|o| o.id == "shield1").unwrap();
        assert!(!pad.active);
        assert!(pad.respawn_at > game.clock);
    }

    #[test]
    fn teleporter_swaps_ends_with_shared_cooldown() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        place(&mut game, id, 150.0, 100.0); // standing on teleporter1

        game.update(DT);
        let player = game.players.get(&id).unwrap();
        assert_eq!((player.x, player.y), (900.0, 600.0));

        // Both ends are cooling down; nothing happens for a while
        run(&mut game, 30);
        let player = game.players.get(&id).unwrap();
        assert_eq!((player.x, player.y), (900.0, 600.0));

        // After the shared cooldown the pair fires again
        run(&mut game, 60);
        let player = game.players.get(&id).unwrap();
        assert_eq!((player.x, player.y), (150.0, 100.0));
    }

    #[test]
    fn removed_player_is_gone_from_snapshot_immediately() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "P1");
        assert_eq!(game.player_count(), 1);

        game.remove_player(id);
        assert_eq!(game.player_count(), 0);
        assert!(game.snapshot().players.is_empty());
        // Late input for the removed player is a safe no-op
        game.handle_input(id, Vec2::new(1.0, 0.0));
        game.handle_shoot(id);
        game.update(DT);
    }

    #[test]
    fn world_only_grows_to_largest_screen() {
        let mut game = game();
        assert_eq!(game.update_world_size(2560.0, 1440.0), Some((2560.0, 1440.0)));
        assert_eq!(game.update_world_size(800.0, 600.0), Some((2560.0, 1440.0)));
    }
}
