//! Configuration management
//!
//! Groups every loss hyperparameter in one serializable structure. Parsing
//! works on strings; reading files is left to the caller.

use serde::{Deserialize, Serialize};
use tch::Tensor;
use tracing::warn;

use crate::autograd::GradientEngine;
use crate::error::{Error, Result};
use crate::losses::{AdvLoss, LatentOptConfig, PenaltyKind};
use crate::model::Discriminator;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossConfig {
    /// Adversarial loss formulation
    pub adv_loss: AdvLoss,
    /// Contrastive loss configuration
    pub contrastive: ContrastiveConfig,
    /// Gradient penalty configuration
    pub penalty: PenaltyConfig,
    /// Latent optimisation configuration
    pub latent_opt: LatentOptConfig,
}

/// Contrastive-loss configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastiveConfig {
    /// Softmax temperature
    pub temperature: f64,
}

/// Gradient penalty configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Penalty variant
    pub kind: PenaltyKind,
    /// Weight of the penalty in the discriminator loss
    pub lambda: f64,
}

impl PenaltyConfig {
    /// Compute the configured penalty scaled by `lambda`, `None` when disabled
    pub fn compute<D, E>(
        &self,
        real: &Tensor,
        real_labels: &Tensor,
        fake: &Tensor,
        discriminator: &D,
        engine: &E,
    ) -> Result<Option<Tensor>>
    where
        D: Discriminator + ?Sized,
        E: GradientEngine + ?Sized,
    {
        let penalty = self.kind.compute(real, real_labels, fake, discriminator, engine)?;
        Ok(penalty.map(|penalty| penalty * self.lambda))
    }
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            adv_loss: AdvLoss::Hinge,
            contrastive: ContrastiveConfig { temperature: 1.0 },
            penalty: PenaltyConfig {
                kind: PenaltyKind::None,
                lambda: 10.0,
            },
            latent_opt: LatentOptConfig::default(),
        }
    }
}

impl LossConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LossConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: LossConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON text
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let tau = self.contrastive.temperature;
        if tau.is_nan() || tau <= 0.0 {
            return Err(Error::InvalidConfig(format!("temperature must be > 0, got {}", tau)));
        }
        if self.penalty.lambda.is_nan() || self.penalty.lambda < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "penalty lambda must be >= 0, got {}",
                self.penalty.lambda
            )));
        }
        self.latent_opt.validate()?;
        if self.latent_opt.ignored_steps() > 0 {
            warn!(
                steps = self.latent_opt.steps,
                "single-step latent optimisation ignores the extra steps"
            );
        }
        Ok(())
    }
}
