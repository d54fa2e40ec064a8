//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects and music - no external files needed.
//! The simulation only queues [`SoundRequest`]s; the browser shell plays them.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Something entered water
    Splash,
    /// Ball sank in water
    Sink,
    /// Player died
    Dead,
    /// Ball bumped into something solid
    Bump,
}

impl SoundEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Splash => "splash",
            SoundEffect::Sink => "sink",
            SoundEffect::Dead => "dead",
            SoundEffect::Bump => "bump",
        }
    }

    /// Seconds from the start of the effect until its last oscillator stops
    pub fn duration(&self) -> f64 {
        match self {
            SoundEffect::Splash => 0.35,
            SoundEffect::Sink => 0.7,
            SoundEffect::Dead => 1.0,
            SoundEffect::Bump => 0.15,
        }
    }
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Music {
    /// Slow three-voice drone
    Bgm1,
}

impl Music {
    /// Oscillator frequencies making up the drone
    pub fn voices(&self) -> &'static [f32] {
        match self {
            Music::Bgm1 => &[110.0, 164.8, 220.5],
        }
    }
}

/// A sound the level wants played, optionally positioned in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub effect: SoundEffect,
    pub at: Option<Vec2>,
}

/// Panner reference distance (world pixels)
pub const PANNER_REF_DISTANCE: f64 = 100.0;
/// Panner maximum distance (effectively unbounded)
pub const PANNER_MAX_DISTANCE: f64 = 10_000_000.0;

/// Extra time a positioned effect's panner is kept after the effect ends
const RELEASE_MARGIN: f64 = 0.1;

/// Milliseconds to wait before disconnecting the panner carrying `effect`
pub fn release_delay_ms(effect: SoundEffect) -> i32 {
    ((effect.duration() + RELEASE_MARGIN) * 1000.0).ceil() as i32
}

/// Random droplet pitches and onsets for the splash sound.
/// Returns `(frequency_hz, delay_seconds)` pairs sorted by delay.
pub fn droplet_pitches(rng: &mut Pcg32, count: usize) -> Vec<(f32, f64)> {
    let mut drops: Vec<(f32, f64)> = (0..count)
        .map(|_| {
            let freq = rng.random_range(600.0..1800.0);
            let delay = rng.random_range(0.0..0.25);
            (freq, delay)
        })
        .collect();
    drops.sort_by(|a, b| a.1.total_cmp(&b.1));
    drops
}

/// Seeded RNG used for sound jitter
pub fn sound_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use glam::Vec2;
    use rand_pcg::Pcg32;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

    use super::*;
    use crate::error::{Result, SandlotError};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: AudioContext,
        master_volume: f32,
        sfx_volume: f32,
        music_volume: f32,
        muted: bool,
        music: Vec<OscillatorNode>,
        rng: Pcg32,
    }

    impl AudioManager {
        pub fn new(seed: u64) -> Result<Self> {
            let ctx = AudioContext::new()
                .map_err(|e| SandlotError::Audio(format!("{:?}", e)))?;
            Ok(Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                music_volume: 0.7,
                muted: false,
                music: Vec::new(),
                rng: sound_rng(seed),
            })
        }

        /// Pick up volume settings
        pub fn apply_settings(&mut self, settings: &Settings) {
            self.master_volume = settings.master_volume.clamp(0.0, 1.0);
            self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
            self.music_volume = settings.music_volume.clamp(0.0, 1.0);
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            let _ = self.ctx.resume();
        }

        /// Mute/unmute all audio
        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            if muted {
                let _ = self.ctx.suspend();
            } else {
                self.resume();
            }
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        /// Move the listener (follows the camera center)
        pub fn set_listener_position(&self, pos: Vec2) {
            self.ctx
                .listener()
                .set_position(pos.x as f64, pos.y as f64, 1.0);
        }

        /// Play a queued request, panned when it carries a position
        pub fn play_request(&mut self, request: &SoundRequest) {
            match request.at {
                Some(point) => self.play_at_point(request.effect, point),
                None => self.play(request.effect),
            }
        }

        /// Play a sound effect without positioning
        pub fn play(&mut self, effect: SoundEffect) {
            let dest: AudioNode = self.ctx.destination().into();
            self.play_into(effect, &dest);
        }

        /// Play a sound effect panned to a world position
        pub fn play_at_point(&mut self, effect: SoundEffect, point: Vec2) {
            let Ok(panner) = self.ctx.create_panner() else {
                self.play(effect);
                return;
            };
            panner.set_orientation(0.0, 0.0, 1.0);
            panner.set_position(point.x as f64, point.y as f64, 0.0);
            panner.set_ref_distance(PANNER_REF_DISTANCE);
            panner.set_max_distance(PANNER_MAX_DISTANCE);
            if panner
                .connect_with_audio_node(&self.ctx.destination())
                .is_err()
            {
                return;
            }
            let dest: AudioNode = panner.into();
            self.play_into(effect, &dest);
            Self::release_later(dest, effect);
        }

        /// Disconnect a per-sound node once the effect has finished
        fn release_later(node: AudioNode, effect: SoundEffect) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let release = Closure::once_into_js(move || {
                let _ = node.disconnect();
            });
            if window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    release.unchecked_ref(),
                    release_delay_ms(effect),
                )
                .is_err()
            {
                log::warn!("Could not schedule release of the {} panner", effect.name());
            }
        }

        fn play_into(&mut self, effect: SoundEffect, dest: &AudioNode) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            if self.ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = self.ctx.resume();
            }

            match effect {
                SoundEffect::Splash => self.play_splash(dest, vol),
                SoundEffect::Sink => self.play_sink(dest, vol),
                SoundEffect::Dead => self.play_dead(dest, vol),
                SoundEffect::Bump => self.play_bump(dest, vol),
            }
        }

        /// Start looping background music (replaces any playing track)
        pub fn start_music(&mut self, music: Music) {
            self.stop_music();
            let vol = if self.muted {
                0.0
            } else {
                self.master_volume * self.music_volume * 0.08
            };
            let dest: AudioNode = self.ctx.destination().into();

            for (i, freq) in music.voices().iter().enumerate() {
                let osc_type = if i == 0 {
                    OscillatorType::Sine
                } else {
                    OscillatorType::Triangle
                };
                if let Some((osc, gain)) = self.create_osc(*freq, osc_type, &dest) {
                    gain.gain().set_value(vol);
                    // Slight detune per voice so the drone beats slowly
                    osc.detune().set_value(i as f32 * 3.0);
                    if osc.start().is_ok() {
                        self.music.push(osc);
                    }
                }
            }
            log::info!("Music started: {:?}", music);
        }

        pub fn stop_music(&mut self) {
            for osc in self.music.drain(..) {
                let _ = osc.stop();
                let _ = osc.disconnect();
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            freq: f32,
            osc_type: OscillatorType,
            dest: &AudioNode,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = self.ctx.create_oscillator().ok()?;
            let gain = self.ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(dest).ok()?;

            Some((osc, gain))
        }

        /// Splash - a burst of random droplets
        fn play_splash(&mut self, dest: &AudioNode, vol: f32) {
            let drops = droplet_pitches(&mut self.rng, 6);
            for (freq, delay) in drops {
                if let Some((osc, gain)) = self.create_osc(freq, OscillatorType::Sine, dest) {
                    let t = self.ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.2, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                        .ok();
                    osc.frequency().set_value_at_time(freq, t).ok();
                    osc.frequency()
                        .exponential_ramp_to_value_at_time(freq * 1.6, t + 0.08)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.1).ok();
                }
            }
        }

        /// Sink - gurgling descend
        fn play_sink(&self, dest: &AudioNode, vol: f32) {
            let Some((osc, gain)) = self.create_osc(500.0, OscillatorType::Sine, dest) else {
                return;
            };
            let t = self.ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.6)
                .ok();
            osc.frequency().set_value_at_time(500.0, t).ok();
            osc.frequency().set_value_at_time(420.0, t + 0.1).ok();
            osc.frequency().set_value_at_time(460.0, t + 0.2).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(80.0, t + 0.6)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.7).ok();
        }

        /// Dead - sad descending
        fn play_dead(&self, dest: &AudioNode, vol: f32) {
            for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                let delay = i as f64 * 0.2;
                if let Some((osc, gain)) = self.create_osc(*freq, OscillatorType::Sine, dest) {
                    let t = self.ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.4).ok();
                }
            }
        }

        /// Bump - solid thump
        fn play_bump(&self, dest: &AudioNode, vol: f32) {
            let Some((osc, gain)) = self.create_osc(150.0, OscillatorType::Sine, dest) else {
                return;
            };
            let t = self.ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(60.0, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }

    impl Drop for AudioManager {
        fn drop(&mut self) {
            self.stop_music();
            let _ = self.ctx.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_droplets_sorted_and_in_range() {
        let mut rng = sound_rng(7);
        let drops = droplet_pitches(&mut rng, 12);
        assert_eq!(drops.len(), 12);
        assert!(drops.windows(2).all(|w| w[0].1 <= w[1].1));
        for (freq, delay) in &drops {
            assert!((600.0..1800.0).contains(freq));
            assert!((0.0..0.25).contains(delay));
        }
    }

    #[test]
    fn test_droplets_deterministic() {
        let a = droplet_pitches(&mut sound_rng(42), 5);
        let b = droplet_pitches(&mut sound_rng(42), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_panner_released_after_effect() {
        for effect in [
            SoundEffect::Splash,
            SoundEffect::Sink,
            SoundEffect::Dead,
            SoundEffect::Bump,
        ] {
            let delay = release_delay_ms(effect);
            assert!(delay as f64 >= effect.duration() * 1000.0, "{}", effect.name());
            assert!(delay <= 1500);
        }
        // Splash droplets start up to 0.25 s late
        assert!(SoundEffect::Splash.duration() > 0.25);
        assert!(release_delay_ms(SoundEffect::Dead) > release_delay_ms(SoundEffect::Bump));
    }

    #[test]
    fn test_sound_names() {
        assert_eq!(SoundEffect::Dead.name(), "dead");
        assert_eq!(Music::Bgm1.voices().len(), 3);
    }
}
