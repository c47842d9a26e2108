//! TOML-backed search settings and the body/star catalogue.
//!
//! Every field has a default, so an empty document is valid:
//!
//! ```toml
//! [scan]
//! step_minutes = 1.0
//! threshold_deg = 0.25
//! refine_peak = false
//!
//! [crossing]
//! tolerance = 1e-4
//! max_iterations = 60
//! dedup_window_days = 0.1
//! step_divisor = 16.0
//! step_floor_days = 1.0
//! fallback_synodic_days = 30.0
//! method = "bisection"
//! max_bracket_jump = 270.0
//!
//! [paginator]
//! advance_days = 1.0
//! overrides = { transit = 2.0 }
//!
//! [parallel]
//! workers = 4
//!
//! [[bodies]]
//! name = "Mars"
//! period_days = 686.98
//!
//! [[stars]]
//! name = "Aldebaran"
//! ra_hours = 4.5987
//! dec_deg = 16.5093
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::aspect_calendar::AspectCalendar;
use crate::crossing_types::{
    CrossingConfig, DEFAULT_STEP_DIVISOR, DEFAULT_STEP_FLOOR_DAYS, FALLBACK_SYNODIC_DAYS,
    RefineMethod, StepSizer,
};
use crate::paginator_types::{DEFAULT_ADVANCE_DAYS, EventCategory, PaginatorSettings};
use crate::threshold_types::ScanConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid settings: {0}")]
    Invalid(&'static str),
}

/// A body usable in pair searches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodySpec {
    pub name: String,
    /// Sidereal orbital period (days), used for synodic step sizing.
    pub period_days: f64,
}

/// A fixed star, e.g. an occultation target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StarSpec {
    pub name: String,
    pub ra_hours: f64,
    pub dec_deg: f64,
}

/// Bodies and stars known to the caller's oracles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub bodies: Vec<BodySpec>,
    pub stars: Vec<StarSpec>,
}

impl Catalog {
    pub fn body(&self, name: &str) -> Option<&BodySpec> {
        self.bodies.iter().find(|b| b.name == name)
    }

    pub fn star(&self, name: &str) -> Option<&StarSpec> {
        self.stars.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub step_minutes: f64,
    pub threshold_deg: f64,
    pub refine_peak: bool,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            step_minutes: 1.0,
            threshold_deg: 0.25,
            refine_peak: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrossingSection {
    pub tolerance: f64,
    pub max_iterations: u32,
    pub dedup_window_days: f64,
    pub step_divisor: f64,
    pub step_floor_days: f64,
    pub fallback_synodic_days: f64,
    pub method: RefineMethod,
    pub max_bracket_jump: Option<f64>,
}

impl Default for CrossingSection {
    fn default() -> Self {
        let config = CrossingConfig::default();
        Self {
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            dedup_window_days: config.dedup_window_days,
            step_divisor: DEFAULT_STEP_DIVISOR,
            step_floor_days: DEFAULT_STEP_FLOOR_DAYS,
            fallback_synodic_days: FALLBACK_SYNODIC_DAYS,
            method: config.method,
            max_bracket_jump: config.max_bracket_jump,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginatorSection {
    pub advance_days: f64,
    /// Per-category advance, keyed by category name (`"node"`, `"transit"`, ...).
    pub overrides: HashMap<String, f64>,
}

impl Default for PaginatorSection {
    fn default() -> Self {
        Self {
            advance_days: DEFAULT_ADVANCE_DAYS,
            overrides: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelSection {
    pub workers: usize,
}

impl Default for ParallelSection {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// All tunables of the search engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    pub scan: ScanSection,
    pub crossing: CrossingSection,
    pub paginator: PaginatorSection,
    pub parallel: ParallelSection,
    pub bodies: Vec<BodySpec>,
    pub stars: Vec<StarSpec>,
}

fn category_named(name: &str) -> Option<EventCategory> {
    EventCategory::ALL.iter().copied().find(|c| c.name() == name)
}

impl SearchSettings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            warn!(path = %path.display(), error = %source, "failed to read settings");
            SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_toml_str(&text).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "rejected settings");
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.scan_config()
            .validate()
            .map_err(SettingsError::Invalid)?;
        self.crossing_config()
            .validate()
            .map_err(SettingsError::Invalid)?;
        StepSizer::synodic(
            self.crossing.fallback_synodic_days,
            self.crossing.step_divisor,
            self.crossing.step_floor_days,
        )
        .validate()
        .map_err(SettingsError::Invalid)?;
        self.paginator_settings()?
            .validate()
            .map_err(SettingsError::Invalid)?;
        if self.parallel.workers == 0 {
            return Err(SettingsError::Invalid("workers must be > 0"));
        }

        let mut names = HashSet::new();
        for body in &self.bodies {
            if body.name.is_empty() {
                return Err(SettingsError::Invalid("body name must not be empty"));
            }
            if !body.period_days.is_finite() || body.period_days <= 0.0 {
                return Err(SettingsError::Invalid("body period_days must be positive"));
            }
            if !names.insert(body.name.as_str()) {
                return Err(SettingsError::Invalid("duplicate body name"));
            }
        }
        for star in &self.stars {
            if star.name.is_empty() {
                return Err(SettingsError::Invalid("star name must not be empty"));
            }
            if !(0.0..24.0).contains(&star.ra_hours) {
                return Err(SettingsError::Invalid("star ra_hours must be in [0, 24)"));
            }
            if !(-90.0..=90.0).contains(&star.dec_deg) {
                return Err(SettingsError::Invalid("star dec_deg must be in [-90, 90]"));
            }
        }
        Ok(())
    }

    pub fn scan_config(&self) -> ScanConfig {
        let config = ScanConfig::minutes(self.scan.step_minutes, self.scan.threshold_deg);
        if self.scan.refine_peak {
            config.with_peak_refinement()
        } else {
            config
        }
    }

    pub fn crossing_config(&self) -> CrossingConfig {
        CrossingConfig {
            tolerance: self.crossing.tolerance,
            max_iterations: self.crossing.max_iterations,
            dedup_window_days: self.crossing.dedup_window_days,
            method: self.crossing.method,
            max_bracket_jump: self.crossing.max_bracket_jump,
        }
    }

    /// Fails on an override naming an unknown category.
    pub fn paginator_settings(&self) -> Result<PaginatorSettings, SettingsError> {
        let mut settings = PaginatorSettings::new(self.paginator.advance_days);
        for (name, &advance) in &self.paginator.overrides {
            let category = category_named(name)
                .ok_or(SettingsError::Invalid("unknown event category in paginator overrides"))?;
            settings = settings.with_override(category, advance);
        }
        Ok(settings)
    }

    pub fn workers(&self) -> usize {
        self.parallel.workers
    }

    pub fn catalog(&self) -> Catalog {
        Catalog {
            bodies: self.bodies.clone(),
            stars: self.stars.clone(),
        }
    }

    /// Aspect calendar over the catalogued bodies with these crossing settings.
    ///
    /// Without a configured `max_bracket_jump` the aspect wrap guard applies.
    pub fn aspect_calendar(&self) -> AspectCalendar {
        let mut config = self.crossing_config();
        config.max_bracket_jump = config
            .max_bracket_jump
            .or(CrossingConfig::aspect().max_bracket_jump);
        AspectCalendar::new(self.bodies.clone())
            .with_config(config)
            .with_step_sizing(
                self.crossing.step_divisor,
                self.crossing.step_floor_days,
                self.crossing.fallback_synodic_days,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let s = SearchSettings::from_toml_str("").unwrap();
        assert_eq!(s, SearchSettings::default());
        assert_eq!(s.scan_config(), ScanConfig::occultation());
        assert_eq!(s.crossing_config(), CrossingConfig::default());
        assert_eq!(s.paginator_settings().unwrap(), PaginatorSettings::default());
        assert_eq!(s.workers(), 1);
    }

    #[test]
    fn sections_override_defaults() {
        let s = SearchSettings::from_toml_str(
            r#"
            [scan]
            step_minutes = 2.0
            refine_peak = true

            [crossing]
            method = "illinois"
            max_bracket_jump = 270.0

            [paginator]
            overrides = { transit = 30.0 }

            [parallel]
            workers = 3
            "#,
        )
        .unwrap();
        let scan = s.scan_config();
        assert!((scan.step_days - 2.0 / 1440.0).abs() < 1e-15);
        assert!(scan.refine_peak);
        let crossing = s.crossing_config();
        assert_eq!(crossing.method, RefineMethod::Illinois);
        assert_eq!(crossing.max_bracket_jump, Some(270.0));
        let pag = s.paginator_settings().unwrap();
        assert_eq!(pag.advance_for(EventCategory::Transit), 30.0);
        assert_eq!(pag.advance_for(EventCategory::Node), 1.0);
        assert_eq!(s.workers(), 3);
    }

    #[test]
    fn unknown_override_category_rejected() {
        let err = SearchSettings::from_toml_str("[paginator]\noverrides = { comet = 1.0 }\n")
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn unknown_field_is_parse_error() {
        let err = SearchSettings::from_toml_str("[scan]\nstep = 1.0\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn invalid_values_rejected() {
        for text in [
            "[scan]\nstep_minutes = 0.0\n",
            "[crossing]\ntolerance = -1.0\n",
            "[crossing]\nstep_divisor = 0.0\n",
            "[paginator]\nadvance_days = 20.0\n",
            "[parallel]\nworkers = 0\n",
            "[[bodies]]\nname = \"Mars\"\nperiod_days = -1.0\n",
            "[[stars]]\nname = \"Spica\"\nra_hours = 25.0\ndec_deg = 0.0\n",
        ] {
            let err = SearchSettings::from_toml_str(text).unwrap_err();
            assert!(matches!(err, SettingsError::Invalid(_)), "{text}: {err}");
        }
    }

    #[test]
    fn duplicate_body_rejected() {
        let text = "[[bodies]]\nname = \"Mars\"\nperiod_days = 687.0\n\
                    [[bodies]]\nname = \"Mars\"\nperiod_days = 687.0\n";
        assert!(matches!(
            SearchSettings::from_toml_str(text),
            Err(SettingsError::Invalid("duplicate body name"))
        ));
    }

    #[test]
    fn catalog_lookup() {
        let s = SearchSettings::from_toml_str(
            r#"
            [[bodies]]
            name = "Venus"
            period_days = 224.701

            [[stars]]
            name = "Regulus"
            ra_hours = 10.1395
            dec_deg = 11.9672
            "#,
        )
        .unwrap();
        let catalog = s.catalog();
        assert!((catalog.body("Venus").unwrap().period_days - 224.701).abs() < 1e-12);
        assert!(catalog.star("Regulus").is_some());
        assert!(catalog.body("Pluto").is_none());
    }

    #[test]
    fn aspect_calendar_keeps_wrap_guard() {
        let s = SearchSettings::from_toml_str(
            "[[bodies]]\nname = \"Sun\"\nperiod_days = 365.25\n\
             [[bodies]]\nname = \"Mars\"\nperiod_days = 686.98\n",
        )
        .unwrap();
        let cal = s.aspect_calendar();
        assert_eq!(cal.config().max_bracket_jump, Some(270.0));
        assert_eq!(cal.units().len(), 8);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SearchSettings::load("/nonexistent/orrery-settings.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
