//! HUD model and the frame-time debug graph
//!
//! Text goes to DOM elements; the graph is drawn in screen space on top of the
//! playfield.

use std::collections::VecDeque;

use glam::Vec2;

use crate::renderer::{DrawList, colors};
use crate::settings::Settings;
use crate::sim::Level;

/// Frames averaged for the FPS counter
const FPS_WINDOW: usize = 60;
/// Debug graph size in pixels, one column per frame
pub const GRAPH_WIDTH: usize = 800;
pub const GRAPH_HEIGHT: f32 = 200.0;
/// Cleared columns ahead of the newest bar
const GRAPH_GAP: usize = 10;

/// Frame timing history
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Timestamps (ms) of the last `FPS_WINDOW` frames
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    fps: u32,
    /// Frame durations (ms), oldest first
    durations: VecDeque<f32>,
    /// Frames recorded so far; the graph column wraps around
    frames: usize,
    last_time: Option<f64>,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            fps: 0,
            durations: VecDeque::with_capacity(GRAPH_WIDTH),
            frames: 0,
            last_time: None,
        }
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `time` (ms, requestAnimationFrame clock)
    pub fn record(&mut self, time: f64) {
        if let Some(last) = self.last_time {
            if self.durations.len() == GRAPH_WIDTH {
                self.durations.pop_front();
            }
            self.durations.push_back((time - last).max(0.0) as f32);
            self.frames += 1;
        }
        self.last_time = Some(time);

        self.frame_times[self.frame_index] = time;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;

        // The next slot holds the oldest frame, FPS_WINDOW - 1 intervals back
        let oldest = self.frame_times[self.frame_index];
        if oldest > 0.0 {
            let elapsed = time - oldest;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn last_duration(&self) -> Option<f32> {
        self.durations.back().copied()
    }

    /// Frame-time graph with its top-left corner at `origin`.
    ///
    /// Each frame is a black bar as tall as its duration in ms, written at a
    /// column that wraps around the graph width. Reference lines mark 60, 30
    /// and 15 fps.
    pub fn graph(&self, origin: Vec2) -> DrawList {
        let mut list = DrawList::new();
        let width = GRAPH_WIDTH as f32;
        list.fill_rect(origin, Vec2::new(width, GRAPH_HEIGHT), colors::GRAPH_BACKGROUND);

        let count = self.durations.len();
        let first_frame = self.frames - count;
        for (i, ms) in self.durations.iter().enumerate() {
            let column = (first_frame + i) % GRAPH_WIDTH;
            // Columns just ahead of the cursor read as cleared
            let age = count - 1 - i;
            if age + GRAPH_GAP >= GRAPH_WIDTH {
                continue;
            }
            let height = ms.min(GRAPH_HEIGHT);
            list.fill_rect(
                origin + Vec2::new(column as f32, GRAPH_HEIGHT - height),
                Vec2::new(1.0, height),
                colors::GRAPH_BAR,
            );
        }

        for (fps, color) in [
            (60.0, colors::GRAPH_60FPS),
            (30.0, colors::GRAPH_30FPS),
            (15.0, colors::GRAPH_15FPS),
        ] {
            let y = origin.y + GRAPH_HEIGHT - 1000.0 / fps;
            list.line(Vec2::new(origin.x, y), Vec2::new(origin.x + width, y), 1.0, color);
        }

        list
    }
}

/// Text shown in the DOM HUD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudModel {
    pub level_name: String,
    pub score: String,
    pub fps: Option<String>,
    /// Game-end overlay message
    pub game_end: Option<String>,
}

impl HudModel {
    pub fn from_level(level: &Level, stats: &FrameStats, settings: &Settings) -> Self {
        Self {
            level_name: level.name().to_string(),
            score: level.score().to_string(),
            fps: settings.show_fps.then(|| stats.fps().to_string()),
            game_end: level.outcome().map(|o| o.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{FloorDemo, Level, LevelConfig};

    #[test]
    fn test_fps_from_frame_window() {
        let mut stats = FrameStats::new();
        for i in 1..=(FPS_WINDOW as u32 * 2) {
            stats.record(i as f64 * 1000.0 / 60.0);
        }
        assert_eq!(stats.fps(), 60);
        assert!((stats.last_duration().unwrap() - 16.666).abs() < 0.01);
    }

    #[test]
    fn test_no_fps_before_window_fills() {
        let mut stats = FrameStats::new();
        stats.record(16.0);
        stats.record(32.0);
        assert_eq!(stats.fps(), 0);
    }

    #[test]
    fn test_graph_history_is_bounded() {
        let mut stats = FrameStats::new();
        for i in 0..(GRAPH_WIDTH * 3) {
            stats.record(i as f64 * 20.0);
        }
        assert_eq!(stats.durations.len(), GRAPH_WIDTH);

        let graph = stats.graph(Vec2::ZERO);
        // Background, bars, reference lines
        let bars = GRAPH_WIDTH - GRAPH_GAP;
        assert_eq!(graph.triangle_count(), 2 + bars * 2 + 3 * 2);
    }

    #[test]
    fn test_graph_without_frames() {
        let graph = FrameStats::new().graph(Vec2::new(0.0, 400.0));
        assert_eq!(graph.triangle_count(), 2 + 3 * 2);
        assert!(graph.vertices().iter().all(|v| v.position[1] >= 400.0));
    }

    #[test]
    fn test_hud_model() {
        let mut level = FloorDemo::level(3).unwrap();
        let stats = FrameStats::new();
        let mut settings = Settings::default();

        let hud = HudModel::from_level(&level, &stats, &settings);
        assert_eq!(hud.level_name, "Floor Demo");
        assert_eq!(hud.score, "0");
        assert_eq!(hud.fps.as_deref(), Some("0"));
        assert_eq!(hud.game_end, None);

        settings.show_fps = false;
        level.lose();
        let hud = HudModel::from_level(&level, &stats, &settings);
        assert_eq!(hud.fps, None);
        assert_eq!(
            hud.game_end.as_deref(),
            Some("You lost! Nobody made it out of the water.")
        );

        let anon = Level::new(LevelConfig::default());
        assert_eq!(HudModel::from_level(&anon, &stats, &settings).level_name, "Anonymous Level");
    }
}
