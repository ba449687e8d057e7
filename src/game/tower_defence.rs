//! Cooperative tower-defence variant
//!
//! Creep waves march from fixed entry points toward the base rect. Players
//! move and shoot exactly as in the shooter; a creep that reaches the base
//! damages it and despawns. When the base falls, spawning stops and the
//! surviving creeps halt.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{BotData, GameSnapshot, ObstacleData, PlayerData};

use super::combat::Projectile;
use super::geometry::{Rect, Vec2};
use super::player::Player;
use super::{Game, GameConfig, GameEvent, GameType, PLAYER_COLORS};

const CREEP_SIZE: f32 = 25.0;
const CREEP_COLOR: &str = "#9b59b6";
const CREEP_HEALTH: i32 = 2;
const CREEP_SPEED: f32 = 80.0;
/// Damage the base takes from each creep that reaches it
const CREEP_BASE_DAMAGE: f32 = 10.0;
const BASE_HEALTH: f32 = 100.0;
/// Seconds between the end of one wave's spawning and the next wave
const WAVE_INTERVAL: f64 = 10.0;
/// Seconds between creep spawns within a wave
const SPAWN_INTERVAL: f64 = 1.2;

const ENTRY_POINTS: [Vec2; 3] = [
    Vec2::new(0.0, 150.0),
    Vec2::new(0.0, 900.0),
    Vec2::new(900.0, 0.0),
];

const BASE_RECT: Rect = Rect {
    x: 1700.0,
    y: 490.0,
    width: 100.0,
    height: 100.0,
};

fn wave_size(wave: u32) -> u32 {
    4 + 2 * wave
}

struct Creep {
    id: String,
    x: f32,
    y: f32,
    health: i32,
}

impl Creep {
    fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, CREEP_SIZE, CREEP_SIZE)
    }

    fn march(&mut self, dt: f32) {
        let target = BASE_RECT.center();
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 0.0 {
            self.x += dx / dist * CREEP_SPEED * dt;
            self.y += dy / dist * CREEP_SPEED * dt;
        }
    }

    fn data(&self) -> BotData {
        BotData {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            alive: true,
            color: CREEP_COLOR.to_string(),
            size: CREEP_SIZE,
            is_chasing: true,
        }
    }
}

pub struct TowerDefenceGame {
    config: GameConfig,
    players: HashMap<Uuid, Player>,
    creeps: Vec<Creep>,
    projectiles: Vec<Projectile>,
    clock: f64,
    color_index: usize,
    rng: ChaCha8Rng,

    wave: u32,
    base_health: f32,
    creeps_spawned: u64,
    /// Creeps still owed by the current wave
    wave_remaining: u32,
    next_spawn_at: f64,
    next_wave_at: f64,
}

impl TowerDefenceGame {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            players: HashMap::new(),
            creeps: Vec::new(),
            projectiles: Vec::new(),
            clock: 0.0,
            color_index: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            wave: 0,
            base_health: BASE_HEALTH,
            creeps_spawned: 0,
            wave_remaining: 0,
            next_spawn_at: 0.0,
            next_wave_at: 0.0,
        }
    }

    fn base_alive(&self) -> bool {
        self.base_health > 0.0
    }

    fn update_spawner(&mut self) {
        if !self.base_alive() {
            return;
        }
        if self.wave_remaining == 0 && self.clock >= self.next_wave_at {
            self.wave += 1;
            self.wave_remaining = wave_size(self.wave);
            self.next_spawn_at = self.clock;
        }
        while self.wave_remaining > 0 && self.clock >= self.next_spawn_at {
            let entry = ENTRY_POINTS[(self.creeps_spawned as usize) % ENTRY_POINTS.len()];
            self.creeps.push(Creep {
                id: format!("creep_{}", self.creeps_spawned),
                x: entry.x,
                y: entry.y,
                health: CREEP_HEALTH,
            });
            self.creeps_spawned += 1;
            self.wave_remaining -= 1;
            self.next_spawn_at += SPAWN_INTERVAL;
            if self.wave_remaining == 0 {
                self.next_wave_at = self.clock + WAVE_INTERVAL;
            }
        }
    }

    fn update_creeps(&mut self, dt: f32) {
        if !self.base_alive() {
            return;
        }
        let mut i = 0;
        while i < self.creeps.len() {
            self.creeps[i].march(dt);
            if self.creeps[i].rect().overlaps(&BASE_RECT) {
                self.base_health = (self.base_health - CREEP_BASE_DAMAGE).max(0.0);
                self.creeps.remove(i);
                continue;
            }
            i += 1;
        }
    }

    fn update_players(&mut self, dt: f32) {
        let clock = self.clock;
        for player in self.players.values_mut() {
            player.update_effects(clock);
            player.tick_respawn(clock, &self.config, &mut self.rng);
            player.advance(dt, &self.config, &[]);
        }
    }

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

            let prect = self.projectiles[i].rect(&self.config);
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

            if let Some(ci) = self.creeps.iter().position(|c| c.rect().overlaps(&prect)) {
                self.creeps[ci].health -= 1;
                if self.creeps[ci].health <= 0 {
                    let creep = self.creeps.remove(ci);
                    if let Some(shooter) = self.players.get_mut(&owner) {
                        shooter.bot_kills += 1;
                    }
                    events.push(GameEvent::BotKilled {
                        bot_id: creep.id,
                        killer_id: owner,
                        x: creep.x,
                        y: creep.y,
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

impl Game for TowerDefenceGame {
    fn game_type(&self) -> GameType {
        GameType::TowerDefence
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
        self.update_players(dt);
        self.update_spawner();
        self.update_creeps(dt);
        self.update_projectiles(dt)
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.values().map(Player::data).collect(),
            bots: self.creeps.iter().map(Creep::data).collect(),
            projectiles: self.projectiles.iter().map(Projectile::data).collect(),
            checkpoints: None,
            obstacles: vec![ObstacleData {
                x: BASE_RECT.x,
                y: BASE_RECT.y,
                width: BASE_RECT.width,
                height: BASE_RECT.height,
                kind: "base".to_string(),
            }],
            interactive_objects: Vec::new(),
            wave: Some(self.wave),
            base_health: Some(self.base_health),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn game() -> TowerDefenceGame {
        TowerDefenceGame::new(GameConfig::default(), 11)
    }

    fn run(game: &mut TowerDefenceGame, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(game.update(DT));
        }
        events
    }

    #[test]
    fn first_wave_spawns_on_schedule() {
        let mut game = game();
        game.update(DT);
        assert_eq!(game.wave, 1);
        assert_eq!(game.creeps.len(), 1);

        // One more creep every SPAWN_INTERVAL until the wave is out
        run(&mut game, 80); // ~1.3 s
        assert_eq!(game.creeps.len(), 2);
        run(&mut game, 6 * 60);
        assert_eq!(game.creeps.len() as u32, wave_size(1));
        assert_eq!(game.wave_remaining, 0);
    }

    #[test]
    fn creep_marches_toward_base_and_damages_it() {
        let mut game = game();
        game.update(DT);
        game.creeps.truncate(1);
        game.wave_remaining = 0;
        game.next_wave_at = f64::INFINITY;
        // Drop the creep right next to the base
        game.creeps[0].x = BASE_RECT.x - CREEP_SIZE - 5.0;
        game.creeps[0].y = BASE_RECT.y + 20.0;

        run(&mut game, 30);
        assert!(game.creeps.is_empty());
        assert_eq!(game.base_health, BASE_HEALTH - CREEP_BASE_DAMAGE);
    }

    #[test]
    fn shooting_a_creep_twice_kills_and_credits() {
        let mut game = game();
        let p1 = Uuid::new_v4();
        game.add_player(p1, "defender");
        game.update(DT);
        game.creeps.truncate(1);
        game.wave_remaining = 0;
        game.next_wave_at = f64::INFINITY;

        // Park the creep just above the player; it keeps marching toward
        // the base, so re-aim at its current center before each shot
        let (px, py) = {
            let p = game.players.get(&p1).unwrap();
            (p.x, p.y)
        };
        game.creeps[0].x = px;
        game.creeps[0].y = py - 50.0;

        let aim_at_creep = |game: &mut TowerDefenceGame| {
            let (px, py) = {
                let p = game.players.get(&p1).unwrap();
                (p.x + 15.0, p.y + 15.0)
            };
            let c = &game.creeps[0];
            let v = Vec2::new(c.x + CREEP_SIZE / 2.0 - px, c.y + CREEP_SIZE / 2.0 - py);
            game.handle_aim(p1, v.normalized());
        };

        aim_at_creep(&mut game);
        game.handle_shoot(p1);
        let mut events = run(&mut game, 25);
        assert_eq!(game.creeps[0].health, CREEP_HEALTH - 1);

        aim_at_creep(&mut game);
        game.handle_shoot(p1);
        events.extend(run(&mut game, 25));

        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BotKilled { killer_id, .. } if *killer_id == p1)));
        assert!(game.creeps.is_empty());
        assert_eq!(game.players.get(&p1).unwrap().bot_kills, 1);
    }

    #[test]
    fn destroyed_base_stops_spawning_and_marching() {
        let mut game = game();
        game.base_health = 0.0;
        run(&mut game, 120);
        assert_eq!(game.wave, 0);
        assert!(game.creeps.is_empty());
        assert_eq!(game.snapshot().base_health, Some(0.0));
    }

    #[test]
    fn snapshot_carries_wave_and_base_state() {
        let mut game = game();
        game.update(DT);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.wave, Some(1));
        assert_eq!(snapshot.base_health, Some(BASE_HEALTH));
        assert_eq!(snapshot.bots.len(), 1);
        assert_eq!(snapshot.obstacles[0].kind, "base");
        assert!(snapshot.checkpoints.is_none());
    }
}
