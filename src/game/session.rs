//! Play session
//!
//! Drives the simulation from frame time and player input, resolves probe
//! contacts and moves between map cells.

use std::collections::BTreeSet;
use std::time::Duration;

use glam::{IVec2, Vec2};

use super::camera::Camera;
use super::probe::{CollisionOracle, Probe, probe_offsets};
use crate::audio::SoundCue;
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{LevelError, LevelSet, ShapeType, SimEvent, Simulation, SimulationContext, Special};
use crate::sign;

/// Movement intent, -1..1 per axis (y grows downwards)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub move_x: f32,
    pub move_y: f32,
}

impl PlayerInput {
    pub fn new(move_x: f32, move_y: f32) -> Self {
        Self {
            move_x: move_x.clamp(-1.0, 1.0),
            move_y: move_y.clamp(-1.0, 1.0),
        }
    }

    /// From four held direction keys
    pub fn from_keys(left: bool, right: bool, up: bool, down: bool) -> Self {
        let axis = |neg: bool, pos: bool| pos as i8 as f32 - neg as i8 as f32;
        Self::new(axis(left, right), axis(up, down))
    }
}

/// Screen overlay selected by the ground under the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeTint {
    #[default]
    Normal,
    Reversed,
    Stopped,
    Superhot,
}

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Simulation ticks run (both directions)
    pub ticks: usize,
    /// Cues to hand to the audio manager, in order
    pub sounds: Vec<SoundCue>,
    pub restarted: bool,
    pub traveled: bool,
}

/// State captured on entering a map cell, restored on death
#[derive(Debug, Clone, Default)]
struct RestartPoint {
    keys: BTreeSet<u8>,
    start: Vec2,
}

/// Levels loaded for a map cell
pub fn level_indices(index: usize) -> Vec<usize> {
    if index == OUTRO_LEVEL_INDEX {
        vec![index]
    } else {
        vec![index, OVERLAY_LEVEL_INDEX]
    }
}

pub struct Session {
    levels: LevelSet,
    settings: Settings,
    pub sim: Simulation,
    pub ctx: SimulationContext,
    pub camera: Camera,
    /// Current map cell (column, row)
    pub map: IVec2,
    /// Simulated seconds per real second for the next frame
    pub time_rate: f32,
    pub tint: TimeTint,
    /// Simulation stays frozen while positive
    pub time_until_start: f32,
    player: Option<usize>,
    facing: f32,
    restart_point: RestartPoint,
}

impl Session {
    /// Enter the configured start cell with the player at the arena center
    pub fn new(levels: LevelSet, settings: Settings) -> Result<Self, LevelError> {
        let mut session = Self {
            camera: Camera::new(settings.camera_seed),
            map: IVec2::new(settings.start_map.0, settings.start_map.1),
            sim: Simulation::from_shapes(Vec::new(), Vec::new()),
            ctx: SimulationContext::new(),
            levels,
            settings,
            time_rate: 1.0,
            tint: TimeTint::Normal,
            time_until_start: 0.0,
            player: None,
            facing: 1.0,
            restart_point: RestartPoint::default(),
        };
        session.travel(Vec2::ZERO)?;
        Ok(session)
    }

    pub fn player(&self) -> Option<usize> {
        self.player
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player.map(|p| self.sim.shapes[p].pose.position)
    }

    /// Level index of the current map cell
    pub fn level_index(&self) -> i32 {
        self.map.x * MAP_COLUMNS + self.map.y
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Remember the keys held now and (re)start the current cell
    pub fn travel(&mut self, start: Vec2) -> Result<(), LevelError> {
        self.restart_point = RestartPoint {
            keys: self.ctx.keys.persistent.clone(),
            start,
        };
        self.restart()
    }

    /// Reload the current cell with the keys held when it was entered
    ///
    /// Cells outside the map are ignored.
    pub fn restart(&mut self) -> Result<(), LevelError> {
        let index = self.level_index();
        if !(0..LEVEL_COUNT).contains(&index) {
            log::warn!("No level at map cell {:?}", self.map);
            return Ok(());
        }

        self.ctx.keys.persistent = self.restart_point.keys.clone();
        self.ctx.keys.clear_temporary();

        self.sim = Simulation::start(&self.levels, &level_indices(index as usize))?;
        self.player = self.sim.find_special(Special::Player);
        match self.player {
            Some(p) => self.sim.shapes[p].pose.position = self.restart_point.start,
            None => log::info!("Level {} has no player", index),
        }
        Ok(())
    }

    /// Apply the special behavior of a shape the player touches
    pub fn trigger_contact(&mut self, index: usize) {
        let (special, key) = (self.sim.shapes[index].special, self.sim.shapes[index].key);
        match special {
            Special::Exit => {
                if let Some(p) = self.player {
                    self.sim.shapes[p].pose.position.y = EXIT_SENTINEL_Y;
                }
            }
            Special::ProximitySetKey => {
                self.ctx.keys.persistent.insert(key);
            }
            Special::ProximityUnsetKey => {
                self.ctx.keys.persistent.remove(&key);
            }
            Special::ProximityTempSetKey => {
                self.ctx.keys.temporary.insert(key);
            }
            _ => {}
        }
    }

    /// Run one rendered frame of `elapsed` real seconds
    pub fn frame(
        &mut self,
        elapsed: f32,
        input: PlayerInput,
        oracle: &dyn CollisionOracle,
    ) -> Result<FrameReport, LevelError> {
        let elapsed = elapsed.max(0.0);
        self.ctx.wall_time += Duration::try_from_secs_f32(elapsed).unwrap_or_default();

        let mut elapsed = elapsed.min(self.settings.max_frame_seconds);
        self.time_until_start -= elapsed;
        if self.time_until_start >= 0.0 {
            elapsed = 0.0;
        }

        self.camera.update();

        // Step back and replay so the latest tick always reflects this frame
        let mut report = FrameReport::default();
        report.ticks += self.sim.advance(-STEP_INTERVAL, &mut self.ctx);
        report.ticks += self.sim.advance(
            (elapsed * self.time_rate) as f64 + STEP_INTERVAL,
            &mut self.ctx,
        );
        report
            .sounds
            .extend(self.sim.take_events().into_iter().map(|e| match e {
                SimEvent::Sound(cue) => cue,
            }));

        let old_rate = self.time_rate;
        self.time_rate = 1.0;
        self.tint = TimeTint::Normal;

        let Some(player) = self.player else {
            return Ok(report);
        };

        self.track_player(player, old_rate, elapsed);
        let moving = self.move_player(player, input, elapsed);

        if self.time_until_start < 0.0
            && self.resolve_probes(player, moving, elapsed, oracle, &mut report)?
        {
            return Ok(report);
        }

        self.check_travel(player, &mut report)?;
        Ok(report)
    }

    /// Trackers chase the player at `context` units per second
    fn track_player(&mut self, player: usize, old_rate: f32, elapsed: f32) {
        let target = self.sim.shapes[player].pose.position;
        for index in 0..self.sim.shapes.len() {
            let shape = &self.sim.shapes[index];
            let special = shape.special;
            if !(special.tracks_x() || special.tracks_y()) {
                continue;
            }
            if !(old_rate > 0.0 || special.is_timeless()) || self.ctx.is_timelocked(shape) {
                continue;
            }

            let shape = &mut self.sim.shapes[index];
            let speed = elapsed * shape.pose.context;
            let chase = |from: f32, to: f32| {
                let d = to - from;
                if d.abs() < speed { d } else { speed * sign(d) }
            };
            if special.tracks_x() {
                shape.pose.position.x += chase(shape.pose.position.x, target.x);
            }
            if special.tracks_y() {
                shape.pose.position.y += chase(shape.pose.position.y, target.y);
            }
        }
    }

    /// Returns whether the player moved this frame
    fn move_player(&mut self, player: usize, input: PlayerInput, elapsed: f32) -> bool {
        let velocity = Vec2::new(input.move_x, input.move_y) * PLAYER_VELOCITY * elapsed;
        let moving = velocity.x.abs() + velocity.y.abs() > 0.0;

        let shape = &mut self.sim.shapes[player];
        shape.pose.position += velocity;
        let turn = sign(velocity.x);
        if turn != 0.0 {
            self.facing = turn;
        }
        shape.pose.scale.x = self.facing * 2.0;
        shape.previous.scale.x = self.facing * 2.0;

        self.ctx.keys.temporary.insert(MOVEMENT_KEY);
        if !moving && shape.pose.time % MOVEMENT_KEY_PERIOD < STEP_INTERVAL {
            self.ctx.keys.temporary.remove(&MOVEMENT_KEY);
        }
        moving
    }

    /// Returns true when the player died and the level restarted
    fn resolve_probes(
        &mut self,
        player: usize,
        moving: bool,
        elapsed: f32,
        oracle: &dyn CollisionOracle,
        report: &mut FrameReport,
    ) -> Result<bool, LevelError> {
        for (d, offset) in probe_offsets().into_iter().enumerate() {
            let center = d == 8;
            let point = self.sim.shapes[player].pose.position * POSITION_STEP + offset;

            let blocked = match oracle.sample(&self.sim, point) {
                Probe::Void => true,
                Probe::Edge => false,
                Probe::Shape(index) => {
                    let kind = self.sim.shapes[index].kind;
                    if center && kind == ShapeType::Hazard {
                        self.die(report)?;
                        return Ok(true);
                    }
                    let blocked = self.enter_ground(kind, moving);
                    self.trigger_contact(index);
                    blocked
                }
            };

            if blocked && !center {
                let push = offset.normalize() * elapsed * PLAYER_VELOCITY * PUSHBACK_FACTOR;
                self.sim.shapes[player].pose.position -= push;
            }
        }
        Ok(false)
    }

    /// Time rate and tint for the ground type; true if it blocks
    fn enter_ground(&mut self, kind: ShapeType, moving: bool) -> bool {
        if let Some(rate) = kind.time_rate_effect(moving) {
            self.time_rate = rate;
            self.tint = match kind {
                ShapeType::Reverse => TimeTint::Reversed,
                ShapeType::Stop => TimeTint::Stopped,
                _ => TimeTint::Superhot,
            };
        }
        kind.blocks_movement()
    }

    fn die(&mut self, report: &mut FrameReport) -> Result<(), LevelError> {
        log::info!("Player died in level {}", self.level_index());
        if self.settings.effective_screen_shake() {
            self.camera.shake(DEATH_QUAKE);
        }
        self.restart()?;
        report.sounds.push(SoundCue::Killed);
        report.restarted = true;
        self.time_until_start = DEATH_DELAY;
        Ok(())
    }

    fn check_travel(&mut self, player: usize, report: &mut FrameReport) -> Result<(), LevelError> {
        let pos = self.sim.shapes[player].pose.position;
        let cross = |v: f32, bound: f32| (v > bound) as i32 - (v < -bound) as i32;
        let delta = IVec2::new(cross(pos.x, ARENA_BOUND_X), cross(pos.y, ARENA_BOUND_Y));
        if delta == IVec2::ZERO {
            return Ok(());
        }

        self.map += delta;
        let enter = |d: i32, v: f32, edge: f32| match d {
            1 => -edge,
            -1 => edge,
            _ => v,
        };
        let start = Vec2::new(
            enter(delta.x, pos.x, REENTRY_X),
            enter(delta.y, pos.y, REENTRY_Y),
        );
        log::info!("Travel to map cell {:?} (level {})", self.map, self.level_index());

        self.travel(start)?;
        self.camera
            .shift(-delta.as_vec2() * Vec2::new(ARENA_SIZE_X, ARENA_SIZE_Y));
        self.time_until_start = TRAVEL_DELAY;
        report.traveled = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Level, Shape};

    struct FnOracle<F: Fn(Vec2) -> Probe>(F);

    impl<F: Fn(Vec2) -> Probe> CollisionOracle for FnOracle<F> {
        fn sample(&self, _sim: &Simulation, point: Vec2) -> Probe {
            (self.0)(point)
        }
    }

    fn open() -> FnOracle<impl Fn(Vec2) -> Probe> {
        FnOracle(|_| Probe::Edge)
    }

    fn shape(kind: ShapeType, special: Special) -> Shape {
        Shape {
            kind,
            special,
            ..Default::default()
        }
    }

    /// Level 0 holds the player; level 1 is the room under test
    fn session_with(room: Vec<Shape>) -> Session {
        let overlay = Level {
            shapes: vec![shape(ShapeType::Open1, Special::Player)],
        };
        let mut levels = vec![overlay, Level { shapes: room }];
        levels.resize(10, Level::default());
        let levels = LevelSet { levels };
        let settings = Settings {
            start_map: (0, 1),
            ..Default::default()
        };
        Session::new(levels, settings).unwrap()
    }

    #[test]
    fn test_new_session_loads_room_and_overlay() {
        let session = session_with(vec![shape(ShapeType::Wall1, Special::None)]);
        assert_eq!(session.sim.levels, vec![1, 0]);
        assert_eq!(session.player(), Some(1));
        assert_eq!(session.player_position(), Some(Vec2::ZERO));
        assert_eq!(session.level_index(), 1);
    }

    #[test]
    fn test_outro_level_has_no_overlay() {
        assert_eq!(level_indices(32), vec![32]);
        assert_eq!(level_indices(5), vec![5, 0]);
    }

    #[test]
    fn test_walking_moves_and_faces() {
        let mut session = session_with(vec![]);
        let player = session.player().unwrap();

        session.frame(0.02, PlayerInput::new(1.0, 0.0), &open()).unwrap();
        let shape = &session.sim.shapes[player];
        assert!((shape.pose.position.x - 0.36).abs() < 1e-5);
        assert_eq!(shape.pose.scale.x, 2.0);
        assert_eq!(shape.previous.scale.x, 2.0);
        assert!(session.ctx.keys.temporary.contains(&MOVEMENT_KEY));

        session.frame(0.02, PlayerInput::new(-1.0, 0.0), &open()).unwrap();
        assert_eq!(session.sim.shapes[player].pose.scale.x, -2.0);

        // Standing still keeps the last facing
        session.frame(0.02, PlayerInput::default(), &open()).unwrap();
        assert_eq!(session.sim.shapes[player].pose.scale.x, -2.0);
    }

    #[test]
    fn test_input_from_keys() {
        assert_eq!(PlayerInput::from_keys(true, false, false, true), PlayerInput::new(-1.0, 1.0));
        assert_eq!(PlayerInput::from_keys(true, true, false, false), PlayerInput::default());
    }

    #[test]
    fn test_start_delay_freezes_frame() {
        let mut session = session_with(vec![]);
        session.time_until_start = 0.7;
        let report = session.frame(0.02, PlayerInput::new(1.0, 0.0), &open()).unwrap();
        assert_eq!(session.player_position(), Some(Vec2::ZERO));
        // Only the replayed boundary ticks run
        assert_eq!(report.ticks, 2);
    }

    #[test]
    fn test_elapsed_is_clamped() {
        let mut session = session_with(vec![]);
        session.frame(1.0, PlayerInput::new(0.0, 1.0), &open()).unwrap();
        let y = session.player_position().unwrap().y;
        assert!((y - 0.36).abs() < 1e-5);
    }

    #[test]
    fn test_unbounded_elapsed_is_clamped() {
        let mut session = session_with(vec![]);
        let wall_time = session.ctx.wall_time;
        session.frame(f32::INFINITY, PlayerInput::new(0.0, 1.0), &open()).unwrap();
        let y = session.player_position().unwrap().y;
        assert!((y - 0.36).abs() < 1e-5);
        assert_eq!(session.ctx.wall_time, wall_time);

        session.frame(f32::NAN, PlayerInput::new(0.0, 1.0), &open()).unwrap();
        let y = session.player_position().unwrap().y;
        assert!((y - 0.36).abs() < 1e-5);
    }

    #[test]
    fn test_void_probe_pushes_back() {
        let mut session = session_with(vec![]);
        let oracle = FnOracle(|p: Vec2| if p.x > 9.0 { Probe::Void } else { Probe::Edge });
        session.frame(0.02, PlayerInput::default(), &oracle).unwrap();
        let x = session.player_position().unwrap().x;
        assert!((x + 0.02 * 18.0 * 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_wall_blocks_like_void() {
        let mut session = session_with(vec![shape(ShapeType::Wall2, Special::None)]);
        let oracle = FnOracle(|p: Vec2| if p.y > 9.0 { Probe::Shape(0) } else { Probe::Edge });
        session.frame(0.02, PlayerInput::default(), &oracle).unwrap();
        let y = session.player_position().unwrap().y;
        assert!(y < -0.3);
    }

    #[test]
    fn test_ground_sets_time_rate() {
        let mut session = session_with(vec![
            shape(ShapeType::Reverse, Special::None),
            shape(ShapeType::Superhot, Special::None),
        ]);
        session.frame(0.02, PlayerInput::default(), &FnOracle(|_| Probe::Shape(0))).unwrap();
        assert_eq!(session.time_rate, -1.0);
        assert_eq!(session.tint, TimeTint::Reversed);

        session.frame(0.02, PlayerInput::default(), &FnOracle(|_| Probe::Shape(1))).unwrap();
        assert_eq!(session.time_rate, 0.0);
        assert_eq!(session.tint, TimeTint::Superhot);

        session.frame(0.02, PlayerInput::new(1.0, 0.0), &FnOracle(|_| Probe::Shape(1))).unwrap();
        assert_eq!(session.time_rate, 1.0);

        session.frame(0.02, PlayerInput::default(), &open()).unwrap();
        assert_eq!(session.tint, TimeTint::Normal);
    }

    #[test]
    fn test_exit_sends_player_up_one_cell() {
        let mut session = session_with(vec![shape(ShapeType::Open1, Special::Exit)]);
        session.trigger_contact(0);
        assert_eq!(session.player_position().unwrap().y, EXIT_SENTINEL_Y);

        let report = session.frame(0.0, PlayerInput::default(), &open()).unwrap();
        assert!(report.traveled);
        assert_eq!(session.map, IVec2::new(0, 0));
        assert_eq!(session.player_position().unwrap().y, REENTRY_Y);
        assert_eq!(session.time_until_start, TRAVEL_DELAY);
        assert!((session.camera.offset.y - ARENA_SIZE_Y).abs() < 1e-3);
    }

    #[test]
    fn test_walking_off_the_right_edge() {
        let mut session = session_with(vec![]);
        let player = session.player().unwrap();
        session.sim.shapes[player].pose.position = Vec2::new(37.9, 4.0);
        session.frame(0.02, PlayerInput::new(1.0, 0.0), &open()).unwrap();
        assert_eq!(session.map, IVec2::new(1, 1));
        assert_eq!(session.sim.levels, vec![9, 0]);
        assert_eq!(session.player_position(), Some(Vec2::new(-REENTRY_X, 4.0)));
        assert!((session.camera.offset.x + ARENA_SIZE_X).abs() < 1e-3);
    }

    #[test]
    fn test_hazard_at_center_restarts_with_entry_keys() {
        let mut session = session_with(vec![
            shape(ShapeType::Hazard, Special::None),
            Shape {
                key: 5,
                ..shape(ShapeType::Open1, Special::ProximitySetKey)
            },
        ]);
        session.ctx.keys.persistent.insert(3);
        session.travel(Vec2::new(1.0, 2.0)).unwrap();

        session.trigger_contact(1);
        session.ctx.keys.temporary.insert(9);
        assert!(session.ctx.keys.persistent.contains(&5));

        let player = session.player().unwrap();
        session.sim.shapes[player].pose.position = Vec2::new(10.0, 10.0);
        let oracle = FnOracle(|p: Vec2| {
            if p == Vec2::new(80.0, 80.0) { Probe::Shape(0) } else { Probe::Edge }
        });
        let report = session.frame(0.02, PlayerInput::default(), &oracle).unwrap();

        assert!(report.restarted);
        assert_eq!(report.sounds, vec![SoundCue::Killed]);
        assert_eq!(session.time_until_start, DEATH_DELAY);
        assert_eq!(session.camera.quake, DEATH_QUAKE);
        assert_eq!(session.ctx.keys.persistent, BTreeSet::from([3]));
        assert!(session.ctx.keys.temporary.is_empty());
        assert_eq!(session.player_position(), Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_hazard_off_center_is_harmless() {
        let mut session = session_with(vec![shape(ShapeType::Hazard, Special::None)]);
        let oracle = FnOracle(|p: Vec2| if p.x > 9.0 { Probe::Shape(0) } else { Probe::Edge });
        let report = session.frame(0.02, PlayerInput::default(), &oracle).unwrap();
        assert!(!report.restarted);
    }

    #[test]
    fn test_proximity_keys() {
        let mut session = session_with(vec![
            Shape { key: 4, ..shape(ShapeType::Open1, Special::ProximitySetKey) },
            Shape { key: 4, ..shape(ShapeType::Open1, Special::ProximityUnsetKey) },
            Shape { key: 6, ..shape(ShapeType::Open1, Special::ProximityTempSetKey) },
        ]);
        session.trigger_contact(0);
        assert!(session.ctx.keys.persistent.contains(&4));
        session.trigger_contact(1);
        assert!(!session.ctx.keys.persistent.contains(&4));
        session.trigger_contact(2);
        assert!(session.ctx.keys.temporary.contains(&6));
    }

    #[test]
    fn test_trackers_chase_player() {
        let mut tracker = shape(ShapeType::Hazard, Special::TrackX);
        tracker.pose.position = Vec2::new(5.0, 3.0);
        tracker.pose.context = 10.0;
        let mut timeless = shape(ShapeType::Hazard, Special::TrackXYTimeless);
        timeless.pose.position = Vec2::new(0.1, -4.0);
        timeless.pose.context = 10.0;
        let mut session = session_with(vec![tracker, timeless]);

        session.frame(0.02, PlayerInput::default(), &open()).unwrap();
        let tracker = session.sim.shapes[0].pose.position;
        assert!((tracker.x - 4.8).abs() < 1e-4);
        assert_eq!(tracker.y, 3.0);
        let timeless = session.sim.shapes[1].pose.position;
        // Snaps when closer than one step
        assert_eq!(timeless.x, 0.0);
        assert!((timeless.y + 3.8).abs() < 1e-4);

        // Stopped time halts plain trackers only
        session.time_rate = 0.0;
        session.frame(0.02, PlayerInput::default(), &open()).unwrap();
        assert!((session.sim.shapes[0].pose.position.x - 4.8).abs() < 1e-4);
        assert!((session.sim.shapes[1].pose.position.y + 3.6).abs() < 1e-4);
    }

    #[test]
    fn test_off_map_restart_is_ignored() {
        let mut session = session_with(vec![]);
        session.map = IVec2::new(9, 0);
        session.restart().unwrap();
        assert_eq!(session.sim.levels, vec![1, 0]);
    }
}
