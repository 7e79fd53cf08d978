use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::family::SymmetryFamily;
use crate::orientation::Euler;
use crate::sampling::{Method, PhiEqPsi, SamplingConfig};

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Symmetry tag, e.g. `c1`, `d7`, `icos`.
    pub symmetry: String,
    /// Angular step of the sampling in degrees.
    pub delta: f64,
    #[serde(default)]
    pub theta1: Option<f64>,
    #[serde(default)]
    pub theta2: Option<f64>,
    #[serde(default)]
    pub phi1: Option<f64>,
    #[serde(default)]
    pub phi2: Option<f64>,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub phi_eq_psi: PhiEqPsi,
    #[serde(default = "default_inc_mirror")]
    pub inc_mirror: bool,
    /// Reduce this many random orientations instead of sampling.
    #[serde(default)]
    pub random: Option<usize>,
    /// Reduce these orientations instead of sampling.
    #[serde(default)]
    pub reduce: Option<Vec<Euler>>,
    pub seed: Option<u64>,
}

fn default_inc_mirror() -> bool {
    true
}

impl Settings {
    /// Sampler parameters described by these settings.
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig::new(self.delta)
            .with_theta(self.theta1, self.theta2)
            .with_phi(self.phi1, self.phi2)
            .with_method(self.method)
            .with_phi_eq_psi(self.phi_eq_psi)
            .with_inc_mirror(self.inc_mirror)
    }
}

pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let config = read_config(&default_config_file, false)?;
    validate_config(&config)?;

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut config = read_config(&config_file, true)?;

    // Parse command-line arguments and override values
    let args = CliArgs::parse();
    apply_overrides(&mut config, args);

    validate_config(&config)?;

    Ok(config)
}

fn read_config(path: &Path, with_environment: bool) -> Result<Settings> {
    let mut builder = Config::builder().add_source(File::from(path).required(true));
    if with_environment {
        builder = builder.add_source(Environment::with_prefix("symorient"));
    }
    let settings = builder
        .build()
        .with_context(|| format!("Error loading configuration from {:?}", path))?;

    settings
        .try_deserialize()
        .context("Error deserializing configuration")
}

/// Applies command-line overrides on top of the file configuration.
pub fn apply_overrides(config: &mut Settings, args: CliArgs) {
    if let Some(sym) = args.sym {
        config.symmetry = sym;
    }
    if let Some(delta) = args.delta {
        config.delta = delta;
    }
    if args.theta1.is_some() {
        config.theta1 = args.theta1;
    }
    if args.theta2.is_some() {
        config.theta2 = args.theta2;
    }
    if args.phi1.is_some() {
        config.phi1 = args.phi1;
    }
    if args.phi2.is_some() {
        config.phi2 = args.phi2;
    }
    if let Some(method) = args.method {
        config.method = method;
    }
    if args.minus {
        config.phi_eq_psi = PhiEqPsi::Minus;
    }
    if args.no_mirror {
        config.inc_mirror = false;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    // Handle orientation input
    if let Some(num) = args.random {
        config.random = Some(num);
        config.reduce = None;
    } else if let Some(eulers) = args.reduce {
        config.reduce = Some(eulers);
        config.random = None;
    }

    if config.seed.is_some() && config.random.is_none() {
        warn!("A seed was given but no random orientations are requested, ignoring it");
    }
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the SYMORIENT_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("SYMORIENT_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    // Fallback: walk upward from the executable directory
    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
        .context("Could not find project root directory")
}

pub fn validate_config(config: &Settings) -> Result<()> {
    SymmetryFamily::parse(&config.symmetry)?;
    if config.delta.is_nan() || config.delta <= 0.0 {
        bail!("Angular step must be greater than 0, got {}", config.delta);
    }
    if let (Some(t1), Some(t2)) = (config.theta1, config.theta2) {
        if t1 >= 0.0 && t2 >= 0.0 && t2 < t1 {
            bail!("theta2 ({}) must not be smaller than theta1 ({})", t2, t1);
        }
    }
    if let (Some(p1), Some(p2)) = (config.phi1, config.phi2) {
        if p1 >= 0.0 && p2 >= 0.0 && p2 < p1 {
            bail!("phi2 ({}) must not be smaller than phi1 ({})", p2, p1);
        }
    }
    Ok(())
}

#[derive(Parser, Debug, Default)]
#[command(
    version,
    about = "symorient - point-group symmetry and even angular sampling of orientations"
)]
pub struct CliArgs {
    /// Symmetry of the particle: cn, dn, tet, oct or icos.
    #[arg(long)]
    sym: Option<String>,

    /// Angular step of the sampling in degrees.
    #[arg(short, long)]
    delta: Option<f64>,

    /// Lower polar bound in degrees. Negative values select the default.
    #[arg(long, allow_hyphen_values = true)]
    theta1: Option<f64>,

    /// Upper polar bound in degrees. Negative values select the default.
    #[arg(long, allow_hyphen_values = true)]
    theta2: Option<f64>,

    /// Lower azimuthal bound in degrees. Negative values select the default.
    #[arg(long, allow_hyphen_values = true)]
    phi1: Option<f64>,

    /// Upper azimuthal bound in degrees. Negative values select the default.
    #[arg(long, allow_hyphen_values = true)]
    phi2: Option<f64>,

    /// Sampling method: S (Saff spiral), P (parallels) or M (parallels from the equator).
    #[arg(short, long)]
    method: Option<Method>,

    /// Set psi to -phi instead of 0.
    #[arg(long)]
    minus: bool,

    /// Treat mirrored directions as equivalent (half the asymmetric unit).
    #[arg(long)]
    no_mirror: bool,

    /// Random seed for --random.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Reduce this many random orientations into the asymmetric unit instead of sampling.
    #[arg(long, group = "input")]
    random: Option<usize>,

    /// Reduce the given Euler angles (in degrees) into the asymmetric unit.
    /// Format: phi1,theta1,psi1 phi2,theta2,psi2 ...
    #[arg(long, value_parser = parse_euler_angles, num_args = 1.., value_delimiter = ' ', group = "input")]
    reduce: Option<Vec<Euler>>,
}

/// Parse a string of Euler angles in the format "phi,theta,psi"
fn parse_euler_angles(s: &str) -> std::result::Result<Euler, String> {
    s.parse()
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |v: Option<f64>| match v {
            Some(v) if v >= 0.0 => format!("{:.6}", v),
            _ => "default".to_string(),
        };
        write!(
            f,
            "Settings:
  - Symmetry: {}
  - Delta: {:.6}
  - Theta: {} .. {}
  - Phi: {} .. {}
  - Method: {}
  - Psi: {:?}
  - Include Mirror: {}
  ",
            self.symmetry,
            self.delta,
            bound(self.theta1),
            bound(self.theta2),
            bound(self.phi1),
            bound(self.phi2),
            self.method,
            self.phi_eq_psi,
            self.inc_mirror,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Settings {
        Settings {
            symmetry: "c1".to_string(),
            delta: 15.0,
            theta1: None,
            theta2: None,
            phi1: None,
            phi2: None,
            method: Method::Spiral,
            phi_eq_psi: PhiEqPsi::Zero,
            inc_mirror: true,
            random: None,
            reduce: None,
            seed: None,
        }
    }

    #[test]
    fn cli_overrides() {
        let args = CliArgs::try_parse_from([
            "symorient",
            "--sym",
            "d5",
            "--delta",
            "7.5",
            "--theta2",
            "-1",
            "--method",
            "P",
            "--minus",
            "--no-mirror",
            "--random",
            "20",
            "--seed",
            "3",
        ])
        .unwrap();
        let mut settings = base();
        apply_overrides(&mut settings, args);

        assert_eq!(settings.symmetry, "d5");
        assert_eq!(settings.delta, 7.5);
        assert_eq!(settings.theta2, Some(-1.0));
        assert_eq!(settings.method, Method::Parallels);
        assert_eq!(settings.phi_eq_psi, PhiEqPsi::Minus);
        assert!(!settings.inc_mirror);
        assert_eq!(settings.random, Some(20));
        assert_eq!(settings.seed, Some(3));
        validate_config(&settings).unwrap();
    }

    #[test]
    fn cli_reduce_list() {
        let args =
            CliArgs::try_parse_from(["symorient", "--reduce", "10,20,30 40,50,60"]).unwrap();
        let mut settings = base();
        apply_overrides(&mut settings, args);
        assert_eq!(
            settings.reduce,
            Some(vec![Euler::new(10.0, 20.0, 30.0), Euler::new(40.0, 50.0, 60.0)])
        );
    }

    #[test]
    fn cli_rejects_unknown_method() {
        assert!(CliArgs::try_parse_from(["symorient", "--method", "Q"]).is_err());
        assert!(CliArgs::try_parse_from(["symorient", "--random", "3", "--reduce", "1,2,3"]).is_err());
    }

    #[test]
    fn validation() {
        let mut settings = base();
        settings.symmetry = "x3".to_string();
        assert!(validate_config(&settings).is_err());

        let mut settings = base();
        settings.delta = 0.0;
        assert!(validate_config(&settings).is_err());

        let mut settings = base();
        settings.theta1 = Some(90.0);
        settings.theta2 = Some(45.0);
        assert!(validate_config(&settings).is_err());

        // negative bounds stand for the defaults
        settings.theta2 = Some(-1.0);
        assert!(validate_config(&settings).is_ok());
    }

    #[test]
    fn sampling_config_from_settings() {
        let mut settings = base();
        settings.phi2 = Some(90.0);
        settings.inc_mirror = false;
        let config = settings.sampling();
        assert_eq!(config.phi2, Some(90.0));
        assert!(!config.inc_mirror);
        assert_eq!(config.delta, 15.0);
    }

    #[test]
    fn display_mentions_defaults() {
        let text = base().to_string();
        assert!(text.contains("Symmetry: c1"));
        assert!(text.contains("default .. default"));
    }
}
