use crate::error::{KeeperError, Result};
use crate::field::Field;
use crate::math::Vec2;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperSettings {
    /// Degrees turned per scan step
    pub face_movement: f64,
    /// Margin shaved off the width-probe half-angle, in degrees
    pub epsilon_degree: f64,
    /// How close to a field edge a beam end counts as "on" it
    pub boundary_tolerance: f64,
    /// Pause between two state-machine steps
    pub tick_ms: u64,
}

impl Default for KeeperSettings {
    fn default() -> Self {
        KeeperSettings {
            face_movement: 2.0,
            epsilon_degree: 1.0,
            boundary_tolerance: 1e-6,
            tick_ms: 10,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub duration_secs: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings { duration_secs: 300 }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Intercom {
    pub master: bool,
    pub port: u32,
}

impl Default for Intercom {
    fn default() -> Self {
        Intercom {
            master: true,
            port: 4100,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// 0 draws a fresh seed from the OS
    pub seed: u64,
    /// Distance the ball rolls per laser reading
    pub ball_speed: f64,
    pub noise_std: f64,
    pub opponents: Vec<Vec2>,
    pub teammate: Option<Vec2>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            seed: 0,
            ball_speed: 0.02,
            noise_std: 0.0,
            opponents: Vec::new(),
            teammate: None,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub field: Field,
    #[serde(default)]
    pub keeper: KeeperSettings,
    #[serde(default, rename = "match")]
    pub match_settings: MatchSettings,
    #[serde(default)]
    pub intercom: Intercom,
    #[serde(default)]
    pub simulation: SimulationSettings,

    #[serde(skip)]
    pub drill: bool,
}

impl Config {
    pub fn from_yaml(string: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(string)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let field = &self.field;
        let dimensions = [
            ("robot_radius", field.robot_radius),
            ("ball_radius", field.ball_radius),
            ("field_length", field.field_length),
            ("field_width", field.field_width),
            ("goal_width", field.goal_width),
            ("face_movement", self.keeper.face_movement),
        ];
        for (name, value) in dimensions {
            if !(value.is_finite() && value > 0.0) {
                return Err(KeeperError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if field.goal_width > field.field_length {
            return Err(KeeperError::Config(
                "goal_width cannot exceed field_length".to_owned(),
            ));
        }

        let guard_points = [
            ("home position", field.home()),
            ("right corner guard", field.right_corner_guard()),
            ("left corner guard", field.left_corner_guard()),
        ];
        for (name, point) in guard_points {
            if !field.contains(point) {
                return Err(KeeperError::Config(format!(
                    "{} ({}, {}) lies outside the field",
                    name, point.x, point.y
                )));
            }
        }

        if field.ball_radius * 2.0 >= field.field_width * 0.5 {
            return Err(KeeperError::Config(
                "field too narrow to launch simulated shots".to_owned(),
            ));
        }

        if field.ball_radius * 2.0 >= field.field_length {
            return Err(KeeperError::Config(
                "field too short to place the simulated ball".to_owned(),
            ));
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: Option<String>,

    /// Intercom port
    #[arg(long)]
    port: Option<u32>,

    #[arg(long)]
    master: Option<bool>,

    /// Seed for the simulated scene
    #[arg(long)]
    seed: Option<u64>,

    /// Match length in seconds
    #[arg(long)]
    duration: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Defend against the simulated laser without radio, then exit
    Drill,
}

pub fn read_from_disk() -> Result<Config> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(|| "config.yaml".to_owned());
    let string = fs::read_to_string(&config_path)?;
    let mut config = Config::from_yaml(&string)?;
    log::info!("Configuration loaded from {}", config_path);

    if let Some(port) = args.port {
        config.intercom.port = port;
    }

    if let Some(master) = args.master {
        config.intercom.master = master;
    }

    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }

    if let Some(duration) = args.duration {
        config.match_settings.duration_secs = duration;
    }

    if let Some(Commands::Drill) = args.command {
        config.drill = true;
    }

    Ok(config)
}
