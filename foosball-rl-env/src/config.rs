//! Configuration of [`TableEnv`](crate::TableEnv).
use crate::episode::EpisodeDefinition;
use anyhow::Result;
use foosball_rl_core::error::FrlError;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};

/// Identifier of a registered environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvId {
    /// The black goalie defends shots of the white striker.
    #[serde(rename = "Goalkeeper-v0")]
    Goalkeeper,

    /// The black team plays on the full table against idle white rods.
    #[serde(rename = "Foosball-v0")]
    Foosball,
}

impl EnvId {
    /// All registered environments.
    pub const ALL: [EnvId; 2] = [EnvId::Goalkeeper, EnvId::Foosball];

    /// Name under which the environment is registered.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Goalkeeper => "Goalkeeper-v0",
            Self::Foosball => "Foosball-v0",
        }
    }

    /// Episode definition used unless another one is configured.
    pub fn default_episode(&self) -> EpisodeDefinition {
        match self {
            Self::Goalkeeper => EpisodeDefinition::goalkeeper(),
            Self::Foosball => EpisodeDefinition::foosball(),
        }
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnvId {
    type Err = FrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|id| id.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let ids: Vec<_> = Self::ALL.iter().map(|id| id.as_str()).collect();
                FrlError::InvalidConfig(format!(
                    "unknown environment {}, expected one of {}",
                    s,
                    ids.join(", ")
                ))
            })
    }
}

fn default_step_frequency() -> usize {
    16
}

fn default_max_episode_steps() -> Option<usize> {
    Some(1000)
}

fn default_render_size() -> (usize, usize) {
    (120, 224)
}

/// Configuration of [`TableEnv`](crate::TableEnv).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableEnvConfig {
    /// The environment.
    pub env_id: EnvId,

    /// Simulation steps per environment step.
    #[serde(default = "default_step_frequency")]
    pub step_frequency: usize,

    /// Observe rendered images instead of feature vectors.
    #[serde(default)]
    pub use_image_obs: bool,

    /// Rules of an episode. The preset of `env_id` if not given.
    #[serde(default)]
    pub episode: Option<EpisodeDefinition>,

    /// Truncates an episode after this number of steps, 1000 by default.
    ///
    /// `None` disables the limit; episodes of `Foosball-v0` then only end on a goal.
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: Option<usize>,

    /// Size `(height, width)` of rendered images.
    #[serde(default = "default_render_size")]
    pub render_size: (usize, usize),
}

impl Default for TableEnvConfig {
    fn default() -> Self {
        Self::new(EnvId::Goalkeeper)
    }
}

impl TableEnvConfig {
    /// Creates the default configuration of the given environment.
    pub fn new(env_id: EnvId) -> Self {
        Self {
            env_id,
            step_frequency: default_step_frequency(),
            use_image_obs: false,
            episode: None,
            max_episode_steps: default_max_episode_steps(),
            render_size: default_render_size(),
        }
    }

    /// Sets the number of simulation steps per environment step.
    pub fn step_frequency(mut self, v: usize) -> Self {
        self.step_frequency = v;
        self
    }

    /// Observe rendered images instead of feature vectors.
    pub fn use_image_obs(mut self, v: bool) -> Self {
        self.use_image_obs = v;
        self
    }

    /// Sets the episode definition.
    pub fn episode(mut self, v: EpisodeDefinition) -> Self {
        self.episode = Some(v);
        self
    }

    /// Sets the maximum number of steps of an episode.
    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the size of rendered images.
    pub fn render_size(mut self, height: usize, width: usize) -> Self {
        self.render_size = (height, width);
        self
    }

    /// Constructs [`TableEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TableEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
