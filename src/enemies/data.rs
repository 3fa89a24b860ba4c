//! Archetype stats and AI tuning, with optional overrides from RON files.

use bevy::prelude::*;
use serde::Deserialize;
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::error::DataLoadError;

/// Directory scanned for `<archetype>.ron` stat overrides.
pub const ARCHETYPE_DIR: &str = "assets/data/archetypes";

/// Optional tuning override file.
pub const TUNING_FILE: &str = "assets/data/ai_tuning.ron";

/// The fixed set of enemy classes. Also inserted on agent entities.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Archetype {
    #[default]
    Basic,
    Heavy,
    Sniper,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Basic, Archetype::Heavy, Archetype::Sniper];

    pub fn name(self) -> &'static str {
        match self {
            Archetype::Basic => "basic",
            Archetype::Heavy => "heavy",
            Archetype::Sniper => "sniper",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Archetype {
    type Err = DataLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|archetype| archetype.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DataLoadError::UnknownArchetype(s.to_string()))
    }
}

/// Combat stats shared by every agent of an archetype.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ArchetypeStats {
    pub max_health: f32,
    /// Movement speed in units per second
    pub speed: f32,
    pub damage: f32,
    /// Maximum distance at which an attack is attempted
    pub attack_range: f32,
    /// Minimum seconds between two attacks
    pub attack_cooldown: f32,
    /// Hit chance handed to the hit-resolution system (0.0 to 1.0)
    pub accuracy: f32,
    /// Seconds between starting an attack and releasing it
    #[serde(default)]
    pub attack_windup: f32,
}

impl ArchetypeStats {
    pub fn basic() -> Self {
        Self {
            max_health: 100.0,
            speed: 4.0,
            damage: 10.0,
            attack_range: 10.0,
            attack_cooldown: 0.8,
            accuracy: 0.7,
            attack_windup: 0.2,
        }
    }

    pub fn heavy() -> Self {
        Self {
            max_health: 220.0,
            speed: 2.5,
            damage: 25.0,
            attack_range: 6.0,
            attack_cooldown: 1.6,
            accuracy: 0.6,
            attack_windup: 0.5,
        }
    }

    pub fn sniper() -> Self {
        Self {
            max_health: 60.0,
            speed: 3.5,
            damage: 40.0,
            attack_range: 18.0,
            attack_cooldown: 2.5,
            accuracy: 0.9,
            attack_windup: 0.6,
        }
    }

    /// Reject stats that would break the controller's arithmetic.
    pub fn validate(&self, context: &str) -> Result<(), DataLoadError> {
        let invalid = |field: &'static str, reason: &str| DataLoadError::InvalidValue {
            context: context.to_string(),
            field,
            reason: reason.to_string(),
        };

        if !(self.max_health > 0.0) {
            return Err(invalid("max_health", "must be positive"));
        }
        if !(self.speed >= 0.0) {
            return Err(invalid("speed", "must not be negative"));
        }
        if !(self.damage >= 0.0) {
            return Err(invalid("damage", "must not be negative"));
        }
        if !(self.attack_range > 0.0) {
            return Err(invalid("attack_range", "must be positive"));
        }
        if !(self.attack_cooldown >= 0.0) {
            return Err(invalid("attack_cooldown", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.accuracy) {
            return Err(invalid("accuracy", "must be within 0.0..=1.0"));
        }
        if !(self.attack_windup >= 0.0) || self.attack_windup > self.attack_cooldown {
            return Err(invalid("attack_windup", "must be between 0 and attack_cooldown"));
        }
        Ok(())
    }
}

/// Stats for every archetype, supplied once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchetypeTable {
    basic: ArchetypeStats,
    heavy: ArchetypeStats,
    sniper: ArchetypeStats,
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            basic: ArchetypeStats::basic(),
            heavy: ArchetypeStats::heavy(),
            sniper: ArchetypeStats::sniper(),
        }
    }
}

impl ArchetypeTable {
    pub fn get(&self, archetype: Archetype) -> &ArchetypeStats {
        match archetype {
            Archetype::Basic => &self.basic,
            Archetype::Heavy => &self.heavy,
            Archetype::Sniper => &self.sniper,
        }
    }

    pub fn set(&mut self, archetype: Archetype, stats: ArchetypeStats) {
        match archetype {
            Archetype::Basic => self.basic = stats,
            Archetype::Heavy => self.heavy = stats,
            Archetype::Sniper => self.sniper = stats,
        }
    }

    /// Apply every `<archetype>.ron` found in `dir` on top of the current
    /// values. Files that fail to load are logged and skipped.
    ///
    /// Returns the number of archetypes overridden.
    pub fn apply_overrides_from_dir(&mut self, dir: &Path) -> usize {
        if !dir.exists() {
            info!("Archetype directory {:?} not found, using built-in stats", dir);
            return 0;
        }

        let Ok(entries) = fs::read_dir(dir) else {
            warn!("Failed to read archetype directory {:?}", dir);
            return 0;
        };

        let mut paths: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        // Directory order is platform dependent.
        paths.sort();

        let mut applied = 0;
        for path in paths {
            match load_archetype_file(&path) {
                Ok((archetype, stats)) => {
                    info!("Loaded archetype stats: {} ({:?})", archetype, path);
                    self.set(archetype, stats);
                    applied += 1;
                }
                Err(e) => error!("Skipping archetype file: {}", e),
            }
        }
        applied
    }
}

/// Load one archetype file; the file stem names the archetype.
pub fn load_archetype_file(path: &Path) -> Result<(Archetype, ArchetypeStats), DataLoadError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let archetype: Archetype = stem.parse()?;
    let contents = read_data_file(path)?;
    let stats = parse_archetype_stats(&contents, &path.display().to_string())?;
    Ok((archetype, stats))
}

/// Parse and validate archetype stats from RON text.
pub fn parse_archetype_stats(contents: &str, context: &str) -> Result<ArchetypeStats, DataLoadError> {
    let stats: ArchetypeStats = ron::from_str(contents).map_err(|e| DataLoadError::ParseError {
        path: context.to_string(),
        details: e.to_string(),
    })?;
    stats.validate(context)?;
    Ok(stats)
}

fn read_data_file(path: &Path) -> Result<String, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound(path.display().to_string()));
    }
    fs::read_to_string(path).map_err(|e| DataLoadError::ReadError {
        path: path.display().to_string(),
        details: e.to_string(),
    })
}

/// Thresholds and timings for the state machine and movement planner.
///
/// Every field may be overridden from `assets/data/ai_tuning.ron`; fields
/// missing from the file keep their default.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AiTuning {
    /// Minimum seconds between two non-death state changes
    pub min_state_duration: f32,
    /// Distance at or below which a visible target is chased
    pub chase_start: f32,
    /// Distance at or below which the agent engages (attack/strafe)
    pub attack_start: f32,
    /// Distance at or below which an approaching target triggers a retreat
    pub retreat_start: f32,
    /// Closing speed (units/sec) above which the target counts as approaching
    pub approach_speed_threshold: f32,
    /// Seconds spent in Attack before repositioning with Strafe
    pub attack_dwell: f32,
    /// Seconds spent in Strafe before returning to Attack
    pub strafe_dwell: f32,
    /// Seconds between strafe direction flips
    pub strafe_duration: f32,
    /// Preferred distance from the target while strafing
    pub strafe_range: f32,
    /// Angle (radians) the strafe point is swung around the target; a quarter
    /// turn puts it perpendicular to the agent's bearing
    pub strafe_arc: f32,
    /// Distance at which a movement target counts as reached
    pub arrival_radius: f32,
    /// Radius of the synthesised patrol circle
    pub patrol_radius: f32,
    /// Waypoints on the synthesised patrol circle
    pub patrol_points: usize,
    pub cover_search_radius: f32,
    /// Distance of cover candidates from their obstacle
    pub cover_offset: f32,
    /// Target distance beyond which cover scores stop improving
    pub cover_distance_cap: f32,
    /// Seconds a Cover agent stays put before re-evaluating
    pub cover_hold: f32,
    /// Seconds a Retreat may continue without sight of the target
    pub retreat_timeout: f32,
    /// Extra distance added to the current range when fleeing without cover
    pub retreat_step: f32,
    pub min_retreat_distance: f32,
    /// Maximum random deviation (radians) of the flee direction
    pub retreat_jitter: f32,
    /// Exponential rate at which velocity approaches the desired velocity
    pub velocity_smoothing: f32,
    /// Exponential rate at which yaw approaches the desired facing
    pub turn_rate: f32,
    /// Facing differences (radians) below this are ignored
    pub rotation_threshold: f32,
    /// Seconds a dead agent lingers before removal
    pub despawn_delay: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            min_state_duration: 0.5,
            chase_start: 20.0,
            attack_start: 10.0,
            retreat_start: 5.0,
            approach_speed_threshold: 2.0,
            attack_dwell: 2.0,
            strafe_dwell: 3.0,
            strafe_duration: 1.5,
            strafe_range: 7.0,
            strafe_arc: FRAC_PI_2,
            arrival_radius: 0.5,
            patrol_radius: 5.0,
            patrol_points: 6,
            cover_search_radius: 15.0,
            cover_offset: 3.0,
            cover_distance_cap: 20.0,
            cover_hold: 3.0,
            retreat_timeout: 4.0,
            retreat_step: 4.0,
            min_retreat_distance: 8.0,
            retreat_jitter: 0.35,
            velocity_smoothing: 6.0,
            turn_rate: 8.0,
            rotation_threshold: 0.01,
            despawn_delay: 2.0,
        }
    }
}

impl AiTuning {
    /// Load tuning overrides from a RON file.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let contents = read_data_file(path)?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parse and validate tuning from RON text.
    pub fn parse(contents: &str, context: &str) -> Result<Self, DataLoadError> {
        let tuning: AiTuning = ron::from_str(contents).map_err(|e| DataLoadError::ParseError {
            path: context.to_string(),
            details: e.to_string(),
        })?;
        tuning.validate(context)?;
        Ok(tuning)
    }

    pub fn validate(&self, context: &str) -> Result<(), DataLoadError> {
        let invalid = |field: &'static str, reason: &str| DataLoadError::InvalidValue {
            context: context.to_string(),
            field,
            reason: reason.to_string(),
        };

        let non_negative = [
            ("min_state_duration", self.min_state_duration),
            ("approach_speed_threshold", self.approach_speed_threshold),
            ("attack_dwell", self.attack_dwell),
            ("strafe_dwell", self.strafe_dwell),
            ("cover_hold", self.cover_hold),
            ("retreat_step", self.retreat_step),
            ("retreat_jitter", self.retreat_jitter),
            ("rotation_threshold", self.rotation_threshold),
            ("despawn_delay", self.despawn_delay),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(invalid(field, "must not be negative"));
            }
        }

        let positive = [
            ("retreat_start", self.retreat_start),
            ("strafe_duration", self.strafe_duration),
            ("strafe_range", self.strafe_range),
            ("arrival_radius", self.arrival_radius),
            ("patrol_radius", self.patrol_radius),
            ("cover_search_radius", self.cover_search_radius),
            ("cover_offset", self.cover_offset),
            ("cover_distance_cap", self.cover_distance_cap),
            ("retreat_timeout", self.retreat_timeout),
            ("min_retreat_distance", self.min_retreat_distance),
            ("velocity_smoothing", self.velocity_smoothing),
            ("turn_rate", self.turn_rate),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(invalid(field, "must be positive"));
            }
        }

        if !(self.retreat_start <= self.attack_start && self.attack_start <= self.chase_start) {
            return Err(invalid(
                "attack_start",
                "thresholds must satisfy retreat_start <= attack_start <= chase_start",
            ));
        }
        if self.patrol_points < 2 {
            return Err(invalid("patrol_points", "need at least 2 waypoints"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stats_are_valid() {
        for archetype in Archetype::ALL {
            ArchetypeTable::default()
                .get(archetype)
                .validate(archetype.name())
                .unwrap();
        }
        AiTuning::default().validate("default").unwrap();
    }

    #[test]
    fn archetype_names_round_trip_case_insensitively() {
        assert_eq!("Sniper".parse::<Archetype>().unwrap(), Archetype::Sniper);
        assert!(matches!(
            "dragon".parse::<Archetype>(),
            Err(DataLoadError::UnknownArchetype(name)) if name == "dragon"
        ));
    }

    #[test]
    fn partial_tuning_keeps_defaults() {
        let tuning = AiTuning::parse("(attack_start: 8.0, retreat_start: 3.0)", "inline").unwrap();
        assert_eq!(tuning.attack_start, 8.0);
        assert_eq!(tuning.retreat_start, 3.0);
        assert_eq!(tuning.chase_start, AiTuning::default().chase_start);
    }

    #[test]
    fn misordered_thresholds_are_rejected() {
        let err = AiTuning::parse("(attack_start: 30.0)", "inline").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { field: "attack_start", .. }));
    }

    #[test]
    fn archetype_stats_parse_with_default_windup() {
        let stats = parse_archetype_stats(
            "(max_health: 50.0, speed: 3.0, damage: 5.0, attack_range: 4.0, attack_cooldown: 1.0, accuracy: 0.5)",
            "inline",
        )
        .unwrap();
        assert_eq!(stats.attack_windup, 0.0);
    }

    #[test]
    fn accuracy_out_of_range_is_rejected() {
        let mut stats = ArchetypeStats::basic();
        stats.accuracy = 1.5;
        assert!(stats.validate("test").is_err());
    }

    #[test]
    fn missing_tuning_file_reports_not_found() {
        let err = AiTuning::load(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound(_)));
    }

    #[test]
    fn table_overrides_single_archetype() {
        let mut table = ArchetypeTable::default();
        let mut heavy = ArchetypeStats::heavy();
        heavy.max_health = 500.0;
        table.set(Archetype::Heavy, heavy.clone());
        assert_eq!(table.get(Archetype::Heavy), &heavy);
        assert_eq!(table.get(Archetype::Basic), &ArchetypeStats::basic());
    }

    #[test]
    fn shipped_data_files_match_builtins() {
        let mut table = ArchetypeTable::default();
        assert_eq!(table.apply_overrides_from_dir(Path::new(ARCHETYPE_DIR)), 3);
        assert_eq!(table, ArchetypeTable::default());
        assert_eq!(AiTuning::load(Path::new(TUNING_FILE)).unwrap(), AiTuning::default());
    }
}
