//! # Simulation Configuration
//!
//! Every tunable of the simulation, loaded once at startup from TOML.
//! Missing keys fall back to the defaults below.
//!
//! ```toml
//! [timing]
//! tick_rate = 120.0
//!
//! [movement]
//! max_speed = 20.0
//! jump_force = 30.0
//!
//! [scene]
//! seed = 7
//! platform_count = 10
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{GameError, GameResult};

/// Fixed-timestep settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Simulation ticks per second.
    pub tick_rate: f32,
    /// Longest frame the accumulator will accept, in seconds.
    pub max_frame_time: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: 120.0,
            max_frame_time: 0.1,
        }
    }
}

impl TimingConfig {
    /// Duration of one tick in seconds.
    #[inline]
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate
    }
}

/// Player control law constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementConfig {
    /// Horizontal speed cap (units/s).
    pub max_speed: f32,
    /// Forward/back acceleration (units/s²).
    pub acceleration: f32,
    /// Yaw acceleration (degrees/s²).
    pub rotation_acceleration_deg: f32,
    /// Yaw speed cap (degrees/s).
    pub max_rotation_speed_deg: f32,
    /// Horizontal velocity decay rate without input (1/s).
    pub friction: f32,
    /// Yaw velocity decay rate without input (1/s).
    pub rotational_friction: f32,
    /// Vertical impulse added by a jump (units/s).
    pub jump_force: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed: 20.0,
            acceleration: 1500.0,
            rotation_acceleration_deg: 180.0,
            max_rotation_speed_deg: 90.0,
            friction: 8.0,
            rotational_friction: 8.0,
            jump_force: 30.0,
        }
    }
}

impl MovementConfig {
    /// Yaw acceleration in radians/s².
    #[inline]
    #[must_use]
    pub fn rotation_acceleration(&self) -> f32 {
        self.rotation_acceleration_deg.to_radians()
    }

    /// Yaw speed cap in radians/s.
    #[inline]
    #[must_use]
    pub fn max_rotation_speed(&self) -> f32 {
        self.max_rotation_speed_deg.to_radians()
    }
}

/// Integration and collision constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Vertical acceleration applied to gravity-affected entities (units/s²).
    pub gravity: f32,
    /// Box half extent per axis before scaling.
    pub default_half_extent: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81 * 5.0,
            default_half_extent: 0.5,
        }
    }
}

/// Level layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Seed for the platform path.
    pub seed: u64,
    /// Platforms after the start platform.
    pub platform_count: u32,
    /// Shortest hop between platform centers.
    pub min_platform_distance: f32,
    /// Longest hop between platform centers.
    pub max_platform_distance: f32,
    /// Height gained per platform.
    pub platform_step_height: f32,
    /// Largest turn between consecutive hops (degrees).
    pub max_turn_deg: f32,
    /// Scale of the platform at the origin.
    pub start_platform_scale: [f32; 3],
    /// Scale of every other platform.
    pub platform_scale: [f32; 3],
    /// Where the player appears.
    pub player_spawn: [f32; 3],
    /// Falling below this height resets the world.
    pub fall_reset_height: f32,
    /// Model used for the player and platforms.
    pub model_path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            platform_count: 10,
            min_platform_distance: 10.0,
            max_platform_distance: 20.0,
            platform_step_height: 0.5,
            max_turn_deg: 45.0,
            start_platform_scale: [10.0, 1.0, 10.0],
            platform_scale: [5.0, 1.0, 5.0],
            player_spawn: [0.0, 2.0, 0.0],
            fall_reset_height: -30.0,
            model_path: "assets/models/cube.obj".to_owned(),
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Fixed-timestep settings.
    pub timing: TimingConfig,
    /// Player control law.
    pub movement: MovementConfig,
    /// Integration and collision.
    pub physics: PhysicsConfig,
    /// Level layout.
    pub scene: SceneConfig,
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigParse`] for malformed TOML or unknown keys,
    /// [`GameError::InvalidConfig`] for values that fail [`Self::validate`].
    pub fn from_toml_str(source: &str) -> GameResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigIo`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GameError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    /// Rejects values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> GameResult<()> {
        fn ensure(ok: bool, message: &str) -> GameResult<()> {
            if ok {
                Ok(())
            } else {
                Err(GameError::InvalidConfig(message.to_owned()))
            }
        }

        for (name, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(GameError::InvalidConfig(format!("{name} must be finite, got {value}")));
            }
        }

        let dt = self.timing.tick_seconds();
        ensure(self.timing.tick_rate > 0.0, "timing.tick_rate must be positive")?;
        ensure(
            self.timing.max_frame_time >= dt,
            "timing.max_frame_time must fit at least one tick",
        )?;
        ensure(self.movement.max_speed > 0.0, "movement.max_speed must be positive")?;
        ensure(
            self.movement.max_rotation_speed_deg > 0.0,
            "movement.max_rotation_speed_deg must be positive",
        )?;
        ensure(
            (0.0..=1.0).contains(&(self.movement.friction * dt)),
            "movement.friction times tick length must lie in [0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&(self.movement.rotational_friction * dt)),
            "movement.rotational_friction times tick length must lie in [0, 1]",
        )?;
        ensure(
            self.physics.default_half_extent > 0.0,
            "physics.default_half_extent must be positive",
        )?;
        ensure(
            self.scene.min_platform_distance > 0.0
                && self.scene.min_platform_distance <= self.scene.max_platform_distance,
            "scene platform distances must satisfy 0 < min <= max",
        )?;
        ensure(
            self.scene
                .start_platform_scale
                .iter()
                .chain(&self.scene.platform_scale)
                .all(|s| *s > 0.0),
            "scene platform scales must be positive",
        )?;
        ensure(
            self.scene.fall_reset_height < self.scene.player_spawn[1],
            "scene.fall_reset_height must lie below the player spawn",
        )?;
        Ok(())
    }

    /// Every floating-point setting, by its TOML path.
    fn float_fields(&self) -> Vec<(String, f32)> {
        let timing = &self.timing;
        let movement = &self.movement;
        let physics = &self.physics;
        let scene = &self.scene;

        let mut fields: Vec<(String, f32)> = [
            ("timing.tick_rate", timing.tick_rate),
            ("timing.max_frame_time", timing.max_frame_time),
            ("movement.max_speed", movement.max_speed),
            ("movement.acceleration", movement.acceleration),
            ("movement.rotation_acceleration_deg", movement.rotation_acceleration_deg),
            ("movement.max_rotation_speed_deg", movement.max_rotation_speed_deg),
            ("movement.friction", movement.friction),
            ("movement.rotational_friction", movement.rotational_friction),
            ("movement.jump_force", movement.jump_force),
            ("physics.gravity", physics.gravity),
            ("physics.default_half_extent", physics.default_half_extent),
            ("scene.min_platform_distance", scene.min_platform_distance),
            ("scene.max_platform_distance", scene.max_platform_distance),
            ("scene.platform_step_height", scene.platform_step_height),
            ("scene.max_turn_deg", scene.max_turn_deg),
            ("scene.fall_reset_height", scene.fall_reset_height),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect();

        for (name, values) in [
            ("scene.start_platform_scale", &scene.start_platform_scale),
            ("scene.platform_scale", &scene.platform_scale),
            ("scene.player_spawn", &scene.player_spawn),
        ] {
            fields.extend(
                values
                    .iter()
                    .enumerate()
                    .map(|(axis, value)| (format!("{name}[{axis}]"), *value)),
            );
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert!((config.timing.tick_seconds() - 1.0 / 120.0).abs() < 1e-9);
        assert!((config.physics.gravity + 49.05).abs() < 1e-4);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [movement]
            max_speed = 12.5

            [scene]
            seed = 99
            "#,
        )
        .unwrap();

        assert_eq!(config.movement.max_speed, 12.5);
        assert_eq!(config.movement.jump_force, 30.0);
        assert_eq!(config.scene.seed, 99);
        assert_eq!(config.timing, TimingConfig::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = SimulationConfig::from_toml_str("[timing]\ntick_hz = 60.0\n").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for source in [
            "[timing]\ntick_rate = 0.0\n",
            "[movement]\nmax_speed = -1.0\n",
            "[movement]\nfriction = 500.0\n",
            "[scene]\nmin_platform_distance = 30.0\n",
            "[scene]\nfall_reset_height = 5.0\n",
        ] {
            let err = SimulationConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, GameError::InvalidConfig(_)), "{source}: {err}");
        }
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        for source in [
            "[scene]\nmax_platform_distance = inf\n",
            "[scene]\nmax_turn_deg = inf\n",
            "[scene]\nplatform_step_height = nan\n",
            "[scene]\nplayer_spawn = [0.0, inf, 0.0]\n",
            "[physics]\ngravity = nan\n",
            "[physics]\ngravity = -inf\n",
            "[movement]\njump_force = inf\n",
            "[timing]\nmax_frame_time = inf\n",
        ] {
            let err = SimulationConfig::from_toml_str(source).unwrap_err();
            match err {
                GameError::InvalidConfig(message) => {
                    assert!(message.contains("must be finite"), "{source}: {message}");
                }
                other => panic!("{source}: unexpected {other}"),
            }
        }
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SimulationConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, GameError::ConfigIo { .. }));
        assert!(err.to_string().contains("not/here.toml"));
    }

    #[test]
    fn test_degrees_convert_to_radians() {
        let movement = MovementConfig::default();
        assert!((movement.max_rotation_speed() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((movement.rotation_acceleration() - std::f32::consts::PI).abs() < 1e-6);
    }
}
