//! The floor demo level
//!
//! A walled yard with a grass floor, a sand beach and a pond. Push the ball
//! into the pond to win; a player who stays in the water too long drowns.

use glam::Vec2;

use super::actor::{ActorKind, LevelContext};
use super::ball::Ball;
use super::level::{Level, LevelConfig, LevelScript};
use super::player::Player;
use super::terrain::Terrain;
use crate::audio::Music;
use crate::consts::*;
use crate::error::Result;
use crate::renderer::{DrawList, colors};

const WIDTH: f32 = 1600.0;
const HEIGHT: f32 = 1200.0;
const WALL: f32 = 60.0;

pub const BALL_SPAWN: Vec2 = Vec2::new(400.0, 300.0);
pub const PLAYER_SPAWN: Vec2 = Vec2::new(600.0, 400.0);

pub struct FloorDemo {
    seed: u64,
}

impl FloorDemo {
    /// `seed` drives the sand texture
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn config() -> LevelConfig {
        LevelConfig {
            name: "Floor Demo".to_string(),
            width: WIDTH,
            height: HEIGHT,
            ..Default::default()
        }
    }

    /// Build a level running this script
    pub fn level(seed: u64) -> Result<Level> {
        let mut level = Level::new(Self::config());
        level.init(Box::new(Self::new(seed)))?;
        Ok(level)
    }

    /// Won once every ball sank, lost once every player died
    pub fn check_outcome(level: &mut Level) {
        if level.count_of_kind(ActorKind::Ball) == 0 {
            level.win();
        } else if level.count_of_kind(ActorKind::Player) == 0 {
            level.lose();
        }
    }

    fn floor_outline() -> Vec<Vec2> {
        vec![
            Vec2::new(30.0, 30.0),
            Vec2::new(1570.0, 30.0),
            Vec2::new(1570.0, 700.0),
            Vec2::new(900.0, 700.0),
            Vec2::new(900.0, 1170.0),
            Vec2::new(30.0, 1170.0),
        ]
    }

    fn sand_outline() -> Vec<Vec2> {
        vec![
            Vec2::new(900.0, 700.0),
            Vec2::new(1570.0, 700.0),
            Vec2::new(1570.0, 1170.0),
            Vec2::new(900.0, 1170.0),
        ]
    }

    fn water_outline() -> Vec<Vec2> {
        vec![
            Vec2::new(1000.0, 950.0),
            Vec2::new(1300.0, 900.0),
            Vec2::new(1500.0, 1000.0),
            Vec2::new(1450.0, 1130.0),
            Vec2::new(1150.0, 1150.0),
            Vec2::new(980.0, 1080.0),
        ]
    }
}

impl LevelScript for FloorDemo {
    fn bgm(&self) -> Option<Music> {
        Some(Music::Bgm1)
    }

    fn populate(&mut self, level: &mut Level) -> Result<()> {
        // Ground, ceiling, left and right walls
        level.add_wall(Vec2::new(WIDTH / 2.0, HEIGHT), WIDTH + WALL, WALL);
        level.add_wall(Vec2::new(WIDTH / 2.0, 0.0), WIDTH + WALL, WALL);
        level.add_wall(Vec2::new(0.0, HEIGHT / 2.0), WALL, HEIGHT);
        level.add_wall(Vec2::new(WIDTH, HEIGHT / 2.0), WALL, HEIGHT);

        level.spawn(|ctx| Ball::new(ctx, BALL_SPAWN))?;

        let seed = self.seed;
        level.spawn(|ctx| Terrain::floor(ctx, Self::floor_outline()))?;
        level.spawn(|ctx| Terrain::sand(ctx, Self::sand_outline(), seed))?;
        level.spawn(|ctx| Terrain::water(ctx, Self::water_outline()))?;

        level.spawn(|ctx| Player::new(ctx, PLAYER_SPAWN))?;
        Ok(())
    }

    fn tick(&mut self, level: &mut Level) {
        Self::check_outcome(level);
    }

    fn draw_background(&self, ctx: &LevelContext, list: &mut DrawList) {
        list.fill_rect(ctx.bounds.min, ctx.bounds.size(), colors::BACKGROUND);
    }

    fn draw_hud(&self, ctx: &LevelContext, list: &mut DrawList) {
        // Score pips along the top edge, one per sunk ball
        let pips = (ctx.score() / BALL_SINK_POINTS).min(10);
        let margin = ctx.config.hud_margin;
        for i in 0..pips {
            let center = Vec2::new(margin + i as f32 * margin * 0.75, margin / 2.0);
            list.fill_circle(center, margin / 4.0, colors::BALL);
        }
    }
}
