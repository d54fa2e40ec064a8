//! Level: the game session container
//!
//! A level owns the physics world (through its [`LevelContext`]), a flat list
//! of actors and the script that populates it. Each fixed tick steps the
//! physics, dispatches contact events to every actor, ticks the actors and then
//! moves the camera to follow the players.

use glam::Vec2;
use rapier2d::prelude::ColliderHandle;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorId, ActorKind, LevelContext, Outcome};
use super::camera::{Bounds, Camera};
use super::input::PlayerInput;
use super::physics::ContactEvent;
use crate::audio::{Music, SoundRequest};
use crate::consts::*;
use crate::error::{Result, SandlotError};
use crate::renderer::DrawList;

/// Static level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    /// World size (bounds start at the origin)
    pub width: f32,
    pub height: f32,
    /// Space reserved around HUD elements
    pub hud_margin: f32,
    /// Canvas size
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Camera slack around the players
    pub player_margin: f32,
    pub gravity_x: f32,
    pub gravity_y: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "Anonymous Level".to_string(),
            width: LEVEL_WIDTH,
            height: LEVEL_HEIGHT,
            hud_margin: HUD_MARGIN,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            player_margin: PLAYER_MARGIN,
            gravity_x: 0.0,
            gravity_y: 0.0,
        }
    }
}

/// Lifecycle of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    /// Constructed, waiting for assets and `init`
    Loading,
    Running,
    Destroyed,
}

/// Pointer event types forwarded from the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Click,
    Down,
    Up,
    Move,
}

/// Touch event types forwarded from the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Start,
    Move,
    End,
}

/// Per-level behavior: what to spawn and when the level is over
pub trait LevelScript {
    /// Background music, if any
    fn bgm(&self) -> Option<Music> {
        None
    }

    /// Populate the level (runs once the level is running)
    fn populate(&mut self, level: &mut Level) -> Result<()>;

    /// Runs after every actor ticked
    fn tick(&mut self, _level: &mut Level) {}

    /// Painted before any actor
    fn draw_background(&self, _ctx: &LevelContext, _list: &mut DrawList) {}

    /// Painted after every actor
    fn draw(&self, _ctx: &LevelContext, _list: &mut DrawList) {}

    /// Painted in screen space on top of the world
    fn draw_hud(&self, _ctx: &LevelContext, _list: &mut DrawList) {}
}

pub struct Level {
    ctx: LevelContext,
    actors: Vec<Box<dyn Actor>>,
    script: Option<Box<dyn LevelScript>>,
    state: LevelState,
    accumulator: f32,
}

impl Level {
    pub fn new(config: LevelConfig) -> Self {
        Self {
            ctx: LevelContext::new(config),
            actors: Vec::new(),
            script: None,
            state: LevelState::Loading,
            accumulator: 0.0,
        }
    }

    /// Start the level and let the script populate it
    pub fn init(&mut self, mut script: Box<dyn LevelScript>) -> Result<()> {
        match self.state {
            LevelState::Loading => {}
            LevelState::Running => return Err(SandlotError::AlreadyInitialized),
            LevelState::Destroyed => return Err(SandlotError::LevelDestroyed),
        }

        self.state = LevelState::Running;
        script.populate(self)?;
        self.script = Some(script);
        self.adjust_viewport();

        log::info!(
            "Level '{}' initialized with {} actors",
            self.ctx.config.name,
            self.actors.len()
        );
        Ok(())
    }

    // === Accessors ===

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.ctx.config.name
    }

    pub fn config(&self) -> &LevelConfig {
        &self.ctx.config
    }

    pub fn context(&self) -> &LevelContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut LevelContext {
        &mut self.ctx
    }

    pub fn camera(&self) -> &Camera {
        &self.ctx.camera
    }

    pub fn bounds(&self) -> Bounds {
        self.ctx.bounds
    }

    pub fn input_mut(&mut self) -> &mut PlayerInput {
        &mut self.ctx.input
    }

    pub fn score(&self) -> u64 {
        self.ctx.score()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.ctx.outcome()
    }

    pub fn bgm(&self) -> Option<Music> {
        self.script.as_ref().and_then(|s| s.bgm())
    }

    pub fn actors(&self) -> impl Iterator<Item = &dyn Actor> {
        self.actors.iter().map(|a| a.as_ref())
    }

    pub fn actors_of_kind(&self, kind: ActorKind) -> impl Iterator<Item = &dyn Actor> {
        self.actors().filter(move |a| a.kind() == kind)
    }

    pub fn count_of_kind(&self, kind: ActorKind) -> usize {
        self.actors_of_kind(kind).count()
    }

    /// Where the audio listener should be (the camera center)
    pub fn listener_position(&self) -> Vec2 {
        self.ctx.camera.center
    }

    // === World ===

    /// Build an actor against the context and add it to the level
    pub fn spawn<A, F>(&mut self, build: F) -> Result<ActorId>
    where
        A: Actor + 'static,
        F: FnOnce(&mut LevelContext) -> A,
    {
        if self.state == LevelState::Destroyed {
            return Err(SandlotError::LevelDestroyed);
        }
        let actor = build(&mut self.ctx);
        let id = actor.id();
        log::debug!("Spawned {:?} {}", actor.kind(), id);
        self.actors.push(Box::new(actor));
        Ok(id)
    }

    /// Add a static rectangular wall centered at `center`
    pub fn add_wall(&mut self, center: Vec2, width: f32, height: f32) -> ColliderHandle {
        self.ctx.physics.add_static_rect(center, width, height)
    }

    /// Remove a wall added with [`Level::add_wall`]
    pub fn remove_from_world(&mut self, wall: ColliderHandle) {
        self.ctx.physics.remove_collider(wall);
    }

    pub fn point_is_out_of_bounds(&self, point: Vec2) -> bool {
        self.ctx.point_is_out_of_bounds(point)
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.ctx.camera.set_viewport(width, height);
        self.adjust_viewport();
    }

    // === Simulation ===

    /// Advance by a frame delta using fixed substeps. Returns ticks run.
    pub fn step(&mut self, dt: f32) -> u32 {
        if self.state != LevelState::Running || self.ctx.outcome().is_some() {
            return 0;
        }

        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// One fixed simulation tick
    pub fn tick(&mut self) {
        if self.state != LevelState::Running {
            return;
        }

        let events = self.ctx.physics.step();
        self.ctx.time_ticks += 1;

        for event in &events {
            match event {
                ContactEvent::Started(pair) => {
                    for actor in self.actors.iter_mut() {
                        actor.on_collision_start(&mut self.ctx, pair);
                    }
                }
                ContactEvent::Stopped(pair) => {
                    for actor in self.actors.iter_mut() {
                        actor.on_collision_end(&mut self.ctx, pair);
                    }
                }
            }
        }

        for actor in self.actors.iter_mut() {
            actor.tick(&mut self.ctx);
        }
        self.actors.retain(|a| a.is_alive());

        if let Some(mut script) = self.script.take() {
            script.tick(self);
            // The script may have destroyed the level
            if self.state == LevelState::Running {
                self.script = Some(script);
            }
        }

        self.adjust_viewport();
    }

    /// Center the camera on the average player position
    pub fn adjust_viewport(&mut self) {
        let positions: Vec<Vec2> = self
            .actors_of_kind(ActorKind::Player)
            .filter_map(|p| p.position(&self.ctx))
            .collect();

        if positions.is_empty() {
            return;
        }

        let average = positions.iter().copied().sum::<Vec2>() / positions.len() as f32;
        let bounds = self.ctx.bounds;
        self.ctx.camera.move_into_view(average, &bounds);
    }

    // === Input ===

    /// Page coordinates -> world coordinates
    pub fn transform_window_space_to_game_space(&self, point: Vec2, canvas_origin: Vec2) -> Vec2 {
        let point_in_canvas = point - canvas_origin;
        self.ctx.camera.view_to_world(point_in_canvas)
    }

    /// Handle a mouse event. Returns true when the point falls inside the
    /// world and the browser default should be prevented.
    pub fn handle_pointer_event(&mut self, kind: PointerKind, page: Vec2, canvas_origin: Vec2) -> bool {
        let position = self.transform_window_space_to_game_space(page, canvas_origin);

        if kind == PointerKind::Move {
            self.dispatch_mouse_move(position);
        }

        self.ctx.bounds.contains(position)
    }

    /// Handle a touch event; only the first touch matters
    pub fn handle_touch_event(&mut self, kind: TouchKind, first_touch: Option<Vec2>, canvas_origin: Vec2) {
        let Some(touch) = first_touch else {
            return;
        };
        let position = self.transform_window_space_to_game_space(touch, canvas_origin);

        if kind == TouchKind::Move {
            self.dispatch_mouse_move(position);
        }
    }

    pub fn dispatch_mouse_move(&mut self, position: Vec2) {
        for actor in self.actors.iter_mut() {
            actor.on_mouse_move(&mut self.ctx, position);
        }
    }

    // === Outcome and sound ===

    pub fn win(&mut self) {
        self.ctx.win();
    }

    pub fn lose(&mut self) {
        self.ctx.lose();
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.ctx.set_audio_enabled(enabled);
    }

    pub fn drain_sounds(&mut self) -> Vec<SoundRequest> {
        self.ctx.drain_sounds()
    }

    // === Drawing ===

    pub fn draw_background(&self, list: &mut DrawList) {
        if let Some(script) = &self.script {
            script.draw_background(&self.ctx, list);
        }
    }

    pub fn draw(&self, list: &mut DrawList) {
        if let Some(script) = &self.script {
            script.draw(&self.ctx, list);
        }
    }

    pub fn draw_hud(&self, list: &mut DrawList) {
        if let Some(script) = &self.script {
            script.draw_hud(&self.ctx, list);
        }
    }

    // === Teardown ===

    /// Destroy every actor. The level cannot be used afterwards.
    pub fn destroy(&mut self) {
        if self.state == LevelState::Destroyed {
            return;
        }
        for actor in self.actors.iter_mut() {
            actor.destroy(&mut self.ctx);
        }
        self.actors.clear();
        self.script = None;
        self.state = LevelState::Destroyed;
        log::info!("Level '{}' destroyed", self.ctx.config.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ball::Ball;
    use crate::sim::physics::CollisionPair;
    use crate::sim::player::Player;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every hook call
    #[derive(Default)]
    struct Log {
        starts: u32,
        ends: u32,
        ticks: u32,
        moves: Vec<Vec2>,
        destroyed: bool,
    }

    struct Recorder {
        id: ActorId,
        log: Rc<RefCell<Log>>,
    }

    impl Actor for Recorder {
        fn id(&self) -> ActorId {
            self.id
        }
        fn kind(&self) -> ActorKind {
            ActorKind::Floor
        }
        fn tick(&mut self, _ctx: &mut LevelContext) {
            self.log.borrow_mut().ticks += 1;
        }
        fn on_collision_start(&mut self, _ctx: &mut LevelContext, _pair: &CollisionPair) {
            self.log.borrow_mut().starts += 1;
        }
        fn on_collision_end(&mut self, _ctx: &mut LevelContext, _pair: &CollisionPair) {
            self.log.borrow_mut().ends += 1;
        }
        fn on_mouse_move(&mut self, _ctx: &mut LevelContext, position: Vec2) {
            self.log.borrow_mut().moves.push(position);
        }
        fn destroy(&mut self, _ctx: &mut LevelContext) {
            self.log.borrow_mut().destroyed = true;
        }
    }

    /// Script spawning from a closure
    struct Setup<F: FnMut(&mut Level) -> Result<()>>(F);

    impl<F: FnMut(&mut Level) -> Result<()>> LevelScript for Setup<F> {
        fn populate(&mut self, level: &mut Level) -> Result<()> {
            (self.0)(level)
        }
    }

    fn big_config() -> LevelConfig {
        LevelConfig {
            width: 2000.0,
            height: 1500.0,
            ..Default::default()
        }
    }

    fn running_level(setup: impl FnMut(&mut Level) -> Result<()> + 'static) -> Level {
        let mut level = Level::new(big_config());
        level.init(Box::new(Setup(setup))).unwrap();
        level
    }

    #[test]
    fn test_init_twice_fails() {
        let mut level = running_level(|_| Ok(()));
        assert_eq!(level.state(), LevelState::Running);
        let err = level.init(Box::new(Setup(|_| Ok(())))).unwrap_err();
        assert!(matches!(err, SandlotError::AlreadyInitialized));
    }

    #[test]
    fn test_default_config() {
        let level = Level::new(LevelConfig::default());
        assert_eq!(level.name(), "Anonymous Level");
        assert_eq!(level.bounds(), Bounds::from_size(800.0, 600.0));
        assert_eq!(level.config().hud_margin, 32.0);
        assert_eq!(level.state(), LevelState::Loading);
        assert!(level.bgm().is_none());
    }

    #[test]
    fn test_step_runs_fixed_substeps() {
        let mut level = running_level(|_| Ok(()));
        assert_eq!(level.step(SIM_DT * 3.5), 3);
        // Leftover time carries into the next frame
        assert_eq!(level.step(SIM_DT * 0.6), 1);
        assert_eq!(level.context().time_ticks, 4);

        // Huge frames are capped
        let ran = level.step(10.0);
        assert!(ran <= MAX_SUBSTEPS);
        assert_eq!(level.context().time_ticks, 4 + ran as u64);
    }

    #[test]
    fn test_step_ignored_while_loading() {
        let mut level = Level::new(big_config());
        assert_eq!(level.step(1.0), 0);
        assert_eq!(level.context().time_ticks, 0);
    }

    #[test]
    fn test_collisions_dispatched_to_every_actor() {
        let log_a = Rc::new(RefCell::new(Log::default()));
        let log_b = Rc::new(RefCell::new(Log::default()));
        let (a, b) = (log_a.clone(), log_b.clone());

        let mut level = running_level(move |level| {
            let (a, b) = (a.clone(), b.clone());
            level.spawn(|ctx| Recorder { id: ctx.next_actor_id(), log: a })?;
            level.spawn(|ctx| Recorder { id: ctx.next_actor_id(), log: b })?;
            // Two balls touching at start
            level.spawn(|ctx| Ball::new(ctx, Vec2::new(500.0, 500.0)))?;
            level.spawn(|ctx| Ball::new(ctx, Vec2::new(530.0, 500.0)))?;
            Ok(())
        });

        level.tick();

        assert!(log_a.borrow().starts >= 1);
        assert_eq!(log_a.borrow().starts, log_b.borrow().starts);
        assert_eq!(log_a.borrow().ticks, 1);
        assert_eq!(log_b.borrow().ticks, 1);
    }

    #[test]
    fn test_pointer_move_transformed_and_dispatched() {
        let log = Rc::new(RefCell::new(Log::default()));
        let recorder_log = log.clone();
        let mut level = running_level(move |level| {
            let recorder_log = recorder_log.clone();
            level.spawn(|ctx| Recorder { id: ctx.next_actor_id(), log: recorder_log })?;
            Ok(())
        });
        level.context_mut().camera.center = Vec2::new(1000.0, 700.0);

        let canvas_origin = Vec2::new(20.0, 30.0);
        let inside = level.handle_pointer_event(PointerKind::Move, Vec2::new(120.0, 130.0), canvas_origin);

        // (120,130) - (20,30) + (1000-400, 700-300)
        assert!(inside);
        assert_eq!(log.borrow().moves, vec![Vec2::new(700.0, 500.0)]);

        // Clicks are not mouse moves
        level.handle_pointer_event(PointerKind::Down, Vec2::new(120.0, 130.0), canvas_origin);
        assert_eq!(log.borrow().moves.len(), 1);

        // Touch without a touch point is ignored, touch move dispatches
        level.handle_touch_event(TouchKind::Move, None, canvas_origin);
        level.handle_touch_event(TouchKind::Start, Some(Vec2::new(20.0, 30.0)), canvas_origin);
        level.handle_touch_event(TouchKind::Move, Some(Vec2::new(20.0, 30.0)), canvas_origin);
        assert_eq!(log.borrow().moves, vec![Vec2::new(700.0, 500.0), Vec2::new(600.0, 400.0)]);
    }

    #[test]
    fn test_walls_added_and_removed() {
        let mut level = running_level(|_| Ok(()));
        let wall = level.add_wall(Vec2::new(100.0, 100.0), 50.0, 10.0);
        assert!(level.context().physics.contains_collider(wall));
        assert_eq!(level.context().physics.solid_outlines().len(), 1);
        level.remove_from_world(wall);
        assert!(!level.context().physics.contains_collider(wall));
    }

    #[test]
    fn test_pointer_outside_world() {
        let mut level = running_level(|_| Ok(()));
        // Camera at its initial center: canvas (0,0) is world (0,0)
        assert!(!level.handle_pointer_event(PointerKind::Click, Vec2::new(-10.0, 5.0), Vec2::ZERO));
        assert!(level.point_is_out_of_bounds(Vec2::new(-10.0, 5.0)));
        assert!(!level.point_is_out_of_bounds(Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn test_camera_follows_average_player() {
        let mut level = running_level(|level| {
            level.spawn(|ctx| Player::new(ctx, Vec2::new(1200.0, 800.0)))?;
            level.spawn(|ctx| Player::new(ctx, Vec2::new(1400.0, 1000.0)))?;
            Ok(())
        });

        // Average (1300, 900); camera started at (400, 300) with margin 200
        assert_eq!(level.camera().center, Vec2::new(1100.0, 700.0));
        assert_eq!(level.count_of_kind(ActorKind::Player), 2);
    }

    #[test]
    fn test_camera_still_without_players() {
        let mut level = running_level(|_| Ok(()));
        let before = level.camera().center;
        level.tick();
        assert_eq!(level.camera().center, before);
    }

    #[test]
    fn test_destroy_tears_down_actors() {
        let log = Rc::new(RefCell::new(Log::default()));
        let recorder_log = log.clone();
        let mut level = running_level(move |level| {
            let recorder_log = recorder_log.clone();
            level.spawn(|ctx| Recorder { id: ctx.next_actor_id(), log: recorder_log })?;
            level.spawn(|ctx| Player::new(ctx, Vec2::new(100.0, 100.0)))?;
            Ok(())
        });
        assert_eq!(level.context().physics.body_count(), 1);

        level.destroy();

        assert!(log.borrow().destroyed);
        assert_eq!(level.actors().count(), 0);
        assert_eq!(level.context().physics.body_count(), 0);
        assert_eq!(level.state(), LevelState::Destroyed);
        assert_eq!(level.step(1.0), 0);
        assert!(matches!(
            level.spawn(|ctx| Ball::new(ctx, Vec2::ZERO)),
            Err(SandlotError::LevelDestroyed)
        ));
    }

    #[test]
    fn test_outcome_freezes_simulation() {
        let mut level = running_level(|_| Ok(()));
        level.lose();
        level.win();
        assert_eq!(level.outcome(), Some(Outcome::Lost));
        assert_eq!(level.step(1.0), 0);
    }

    #[test]
    fn test_dead_actors_removed_after_tick() {
        let mut level = running_level(|level| {
            level.spawn(|ctx| Ball::new(ctx, Vec2::new(100.0, 100.0)))?;
            Ok(())
        });
        assert_eq!(level.context().physics.body_count(), 1);

        // Kill the ball out of band
        for actor in level.actors.iter_mut() {
            actor.destroy(&mut level.ctx);
        }
        assert_eq!(level.count_of_kind(ActorKind::Ball), 1);
        level.tick();
        assert_eq!(level.count_of_kind(ActorKind::Ball), 0);
    }
}
