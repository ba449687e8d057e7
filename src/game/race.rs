//! Top-down racing variant
//!
//! Cars steer with input.x and throttle with input.y; position advances
//! along the car's heading. Ordered checkpoint rects form the lap: crossing
//! them in sequence and returning to the first completes a lap. There is no
//! combat here; aim and shoot inputs are silent no-ops.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{CheckpointData, GameSnapshot, ObstacleData, PlayerData};

use super::geometry::{wrap_coord, Rect, Vec2};
use super::{Game, GameConfig, GameEvent, GameType, PLAYER_COLORS};

/// Car footprint used for checkpoint and obstacle overlap
const CAR_SIZE: f32 = 30.0;
/// Top speed in world units per second
const MAX_SPEED: f32 = 350.0;
/// Throttle acceleration per second
const ACCELERATION: f32 = 300.0;
/// Passive deceleration per second with no throttle
const DRAG: f32 = 150.0;
/// Steering rate in radians per second at full deflection
const TURN_RATE: f32 = 3.0;
/// Reversing is allowed at a fraction of top speed
const MAX_REVERSE_SPEED: f32 = 120.0;

struct Car {
    id: Uuid,
    name: String,
    color: String,
    x: f32,
    y: f32,
    angle: f32,
    speed: f32,
    lap: u32,
    /// Index into the checkpoint sequence the car must cross next
    next_checkpoint: usize,
    input: Vec2,
}

impl Car {
    fn new(id: Uuid, name: &str, color: &str, start: Vec2, jitter: f32) -> Self {
        Self {
            id,
            name: name.to_string(),
            color: color.to_string(),
            x: start.x,
            y: start.y + jitter,
            angle: 0.0,
            speed: 0.0,
            lap: 0,
            next_checkpoint: 0,
            input: Vec2::default(),
        }
    }

    fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, CAR_SIZE, CAR_SIZE)
    }

    fn data(&self) -> PlayerData {
        let mut data = PlayerData::base(
            self.id,
            self.name.clone(),
            self.x,
            self.y,
            true,
            self.color.clone(),
        );
        data.angle = Some(self.angle);
        data.speed = Some(self.speed);
        data.lap = Some(self.lap);
        data
    }
}

pub struct RaceGame {
    config: GameConfig,
    cars: HashMap<Uuid, Car>,
    checkpoints: Vec<Rect>,
    obstacles: Vec<Rect>,
    start: Vec2,
    color_index: usize,
    rng: ChaCha8Rng,
}

impl RaceGame {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            cars: HashMap::new(),
            checkpoints: Self::track_checkpoints(),
            obstacles: Self::track_obstacles(),
            start: Vec2::new(100.0, 500.0),
            color_index: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A rough clockwise circuit around the track obstacles
    fn track_checkpoints() -> Vec<Rect> {
        vec![
            Rect::new(900.0, 80.0, 40.0, 200.0),
            Rect::new(1700.0, 450.0, 200.0, 40.0),
            Rect::new(900.0, 800.0, 40.0, 200.0),
            Rect::new(60.0, 450.0, 200.0, 40.0),
        ]
    }

    fn track_obstacles() -> Vec<Rect> {
        vec![
            Rect::new(400.0, 300.0, 300.0, 40.0),
            Rect::new(1200.0, 300.0, 300.0, 40.0),
            Rect::new(400.0, 740.0, 300.0, 40.0),
            Rect::new(1200.0, 740.0, 300.0, 40.0),
            // Track island
            Rect::new(760.0, 440.0, 400.0, 200.0),
        ]
    }

    fn advance_car(car: &mut Car, dt: f32, config: &GameConfig, obstacles: &[Rect]) {
        car.angle += car.input.x * TURN_RATE * dt;

        let throttle = -car.input.y; // screen-up input means forward
        if throttle > 0.0 {
            car.speed = (car.speed + throttle * ACCELERATION * dt).min(MAX_SPEED);
        } else if throttle < 0.0 {
            car.speed = (car.speed + throttle * ACCELERATION * dt).max(-MAX_REVERSE_SPEED);
        } else if car.speed > 0.0 {
            car.speed = (car.speed - DRAG * dt).max(0.0);
        } else {
            car.speed = (car.speed + DRAG * dt).min(0.0);
        }

        let mut new_x = car.x + car.angle.cos() * car.speed * dt;
        let mut new_y = car.y + car.angle.sin() * car.speed * dt;
        new_x = wrap_coord(new_x, config.world_width, CAR_SIZE);
        new_y = wrap_coord(new_y, config.world_height, CAR_SIZE);

        let moved = Rect::new(new_x, new_y, CAR_SIZE, CAR_SIZE);
        if obstacles.iter().any(|o| o.overlaps(&moved)) {
            // Crashing into a wall stops the car in place
            car.speed = 0.0;
            return;
        }
        car.x = new_x;
        car.y = new_y;
    }

    fn check_lap_progress(car: &mut Car, checkpoints: &[Rect]) {
        let Some(next) = checkpoints.get(car.next_checkpoint) else {
            return;
        };
        if next.overlaps(&car.rect()) {
            car.next_checkpoint += 1;
            if car.next_checkpoint >= checkpoints.len() {
                car.next_checkpoint = 0;
                car.lap += 1;
            }
        }
    }
}

impl Game for RaceGame {
    fn game_type(&self) -> GameType {
        GameType::Race
    }

    fn config(&self) -> GameConfig {
        self.config
    }

    fn player_count(&self) -> usize {
        self.cars.len()
    }

    fn add_player(&mut self, id: Uuid, name: &str) -> PlayerData {
        let color = PLAYER_COLORS[self.color_index % PLAYER_COLORS.len()];
        self.color_index += 1;
        let jitter = self.rng.gen_range(-40.0..40.0);
        let car = Car::new(id, name, color, self.start, jitter);
        let data = car.data();
        self.cars.insert(id, car);
        data
    }

    fn remove_player(&mut self, id: Uuid) {
        self.cars.remove(&id);
    }

    fn handle_input(&mut self, id: Uuid, axes: Vec2) {
        if let Some(car) = self.cars.get_mut(&id) {
            car.input = Vec2::new(axes.x.clamp(-1.0, 1.0), axes.y.clamp(-1.0, 1.0));
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        for car in self.cars.values_mut() {
            Self::advance_car(car, dt, &self.config, &self.obstacles);
            Self::check_lap_progress(car, &self.checkpoints);
        }
        Vec::new()
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.cars.values().map(Car::data).collect(),
            bots: Vec::new(),
            projectiles: Vec::new(),
            checkpoints: Some(
                self.checkpoints
                    .iter()
                    .enumerate()
                    .map(|(i, c)| CheckpointData {
                        id: format!("checkpoint_{}", i),
                        x: c.x,
                        y: c.y,
                        width: c.width,
                        height: c.height,
                    })
                    .collect(),
            ),
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
            interactive_objects: Vec::new(),
            wave: None,
            base_health: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn game() -> RaceGame {
        RaceGame::new(GameConfig::default(), 5)
    }

    fn car_pos(game: &RaceGame, id: Uuid) -> (f32, f32) {
        let car = game.cars.get(&id).unwrap();
        (car.x, car.y)
    }

    #[test]
    fn throttle_accelerates_toward_max_and_drag_stops() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "racer");
        {
            let car = game.cars.get_mut(&id).unwrap();
            car.x = 1000.0;
            car.y = 200.0;
        }

        game.handle_input(id, Vec2::new(0.0, -1.0));
        for _ in 0..300 {
            game.update(DT);
        }
        let speed = game.cars.get(&id).unwrap().speed;
        assert!((speed - MAX_SPEED).abs() < 1.0, "speed = {}", speed);

        game.handle_input(id, Vec2::default());
        for _ in 0..300 {
            game.update(DT);
        }
        assert_eq!(game.cars.get(&id).unwrap().speed, 0.0);
    }

    #[test]
    fn car_moves_along_heading() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "racer");
        {
            let car = game.cars.get_mut(&id).unwrap();
            car.x = 1000.0;
            car.y = 200.0;
            car.angle = 0.0; // facing +x
        }
        game.handle_input(id, Vec2::new(0.0, -1.0));
        let (x0, y0) = car_pos(&game, id);
        for _ in 0..60 {
            game.update(DT);
        }
        let (x1, y1) = car_pos(&game, id);
        assert!(x1 > x0 + 50.0);
        assert!((y1 - y0).abs() < 1.0);
    }

    #[test]
    fn wall_crash_stops_the_car_in_place() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "racer");
        {
            let car = game.cars.get_mut(&id).unwrap();
            car.x = 360.0; // just left of the (400, 300) wall
            car.y = 310.0;
            car.angle = 0.0;
            car.speed = MAX_SPEED;
        }
        for _ in 0..10 {
            game.update(DT);
        }
        let car = game.cars.get(&id).unwrap();
        assert_eq!(car.speed, 0.0);
        assert!(car.x < 400.0);
    }

    #[test]
    fn checkpoints_count_only_in_order() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "racer");

        // Driving through checkpoint 1 first does nothing
        {
            let car = game.cars.get_mut(&id).unwrap();
            car.x = 1750.0;
            car.y = 460.0;
        }
        game.update(DT);
        assert_eq!(game.cars.get(&id).unwrap().next_checkpoint, 0);

        // Visiting them in sequence advances and laps
        for (cx, cy) in [(910.0, 150.0), (1750.0, 460.0), (910.0, 850.0), (100.0, 460.0)] {
            let car = game.cars.get_mut(&id).unwrap();
            car.x = cx;
            car.y = cy;
            game.update(DT);
        }
        let car = game.cars.get(&id).unwrap();
        assert_eq!(car.lap, 1);
        assert_eq!(car.next_checkpoint, 0);
    }

    #[test]
    fn race_snapshot_has_checkpoints_and_no_combat_state() {
        let mut game = game();
        let id = Uuid::new_v4();
        game.add_player(id, "racer");
        // Shooter-only inputs are ignored
        game.handle_aim(id, Vec2::new(1.0, 0.0));
        game.handle_shoot(id);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.checkpoints.as_ref().unwrap().len(), 4);
        assert!(snapshot.projectiles.is_empty());
        assert!(snapshot.bots.is_empty());
        let player = &snapshot.players[0];
        assert!(player.health.is_none());
        assert_eq!(player.lap, Some(0));
        assert!(player.angle.is_some());
    }
}
