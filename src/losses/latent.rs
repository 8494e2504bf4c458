//! Latent optimisation
//!
//! Moves latent codes along the normalised gradient of the discriminator
//! score before the generator pass that feeds the generator loss, so
//! generated samples start from regions the discriminator rates as real.

use serde::{Deserialize, Serialize};
use tch::{Kind, Tensor};
use tracing::debug;

use crate::autograd::{input_gradient, GradientEngine};
use crate::error::{Error, Result};
use crate::model::{Discriminator, Generator};

/// How many configured steps are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatentStepMode {
    /// Exactly one step whatever `steps` says, as the reference training code does
    #[default]
    SingleStep,
    /// Run all `steps` and accumulate the transport cost
    MultiStep,
}

/// Hyperparameters of latent optimisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentOptConfig {
    /// Probability that a sample receives the update, in [0, 1]
    pub rate: f64,
    /// Number of gradient steps, >= 1
    pub steps: usize,
    /// Step size numerator
    pub alpha: f64,
    /// Damping added to the squared gradient norm
    pub beta: f64,
    /// Accumulate mean ‖δz‖² over the executed steps
    pub track_cost: bool,
    /// Step-count behaviour
    #[serde(default)]
    pub mode: LatentStepMode,
}

impl Default for LatentOptConfig {
    fn default() -> Self {
        Self {
            rate: 0.9,
            steps: 1,
            alpha: 5.0,
            beta: 0.1,
            track_cost: false,
            mode: LatentStepMode::SingleStep,
        }
    }
}

impl LatentOptConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(Error::InvalidConfig(format!(
                "latent optimisation rate must be in [0, 1], got {}",
                self.rate
            )));
        }
        if self.steps == 0 {
            return Err(Error::InvalidConfig(
                "latent optimisation steps must be > 0".to_string(),
            ));
        }
        if !self.alpha.is_finite() {
            return Err(Error::InvalidConfig(
                "latent optimisation alpha must be finite".to_string(),
            ));
        }
        if self.beta.is_nan() || self.beta < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "latent optimisation beta must be >= 0, got {}",
                self.beta
            )));
        }
        Ok(())
    }

    /// Number of steps that will actually run
    pub fn effective_steps(&self) -> usize {
        match self.mode {
            LatentStepMode::SingleStep => 1,
            LatentStepMode::MultiStep => self.steps,
        }
    }

    /// Configured steps that single-step mode skips
    pub fn ignored_steps(&self) -> usize {
        self.steps.saturating_sub(self.effective_steps())
    }
}

/// Result of latent optimisation
#[derive(Debug)]
pub struct LatentOutcome {
    /// Refined latent codes, clamped to [-1, 1]
    pub zs: Tensor,
    /// Accumulated mean ‖δz‖² when cost tracking is enabled
    pub transport_cost: Option<Tensor>,
}

/// Refine latent codes by gradient ascent on the discriminator score
///
/// # Arguments
///
/// * `zs` - Latent codes of shape (batch, z_dim)
/// * `fake_labels` - Labels conditioning both networks
/// * `generator` - Generator mapping codes to samples
/// * `discriminator` - Discriminator scoring the samples
/// * `config` - Step hyperparameters
/// * `engine` - Gradient engine
pub fn latent_optimise<G, D, E>(
    zs: &Tensor,
    fake_labels: &Tensor,
    generator: &G,
    discriminator: &D,
    config: &LatentOptConfig,
    engine: &E,
) -> Result<LatentOutcome>
where
    G: Generator + ?Sized,
    D: Discriminator + ?Sized,
    E: GradientEngine + ?Sized,
{
    config.validate()?;
    if zs.dim() != 2 {
        return Err(Error::shape(
            "latent_optimise",
            "latent codes of shape (batch, z_dim)",
            zs.size(),
        ));
    }
    let batch_size = zs.size()[0];
    if fake_labels.dim() == 0 || fake_labels.size()[0] != batch_size {
        return Err(Error::shape(
            "latent_optimise labels",
            format!("leading dimension {}", batch_size),
            fake_labels.size(),
        ));
    }
    if config.ignored_steps() > 0 {
        debug!(steps = config.steps, "single-step latent optimisation, extra steps skipped");
    }

    let mut zs = if zs.requires_grad() {
        zs.shallow_clone()
    } else {
        zs.detach().set_requires_grad(true)
    };
    let mut transport_cost: Option<Tensor> = None;

    for step in 0..config.effective_steps() {
        let drop_mask = Tensor::rand([batch_size, 1], (zs.kind(), zs.device()))
            .gt(1.0 - config.rate)
            .to_kind(zs.kind());

        let fake_images = generator.forward(&zs, fake_labels);
        let output = discriminator.forward(&fake_images, fake_labels, false);
        let z_grads = input_gradient(&output.adv_output, &zs, engine)?;

        let z_grads_norm = z_grads
            .norm_scalaropt_dim(2.0, [1].as_slice(), false)
            .pow_tensor_scalar(2.0)
            .unsqueeze(1);
        let delta_z = config.alpha * &z_grads / (config.beta + z_grads_norm);
        zs = (&zs + &drop_mask * &delta_z).clamp(-1.0, 1.0);

        if config.track_cost {
            let step_cost = delta_z
                .norm_scalaropt_dim(2.0, [1].as_slice(), false)
                .pow_tensor_scalar(2.0)
                .mean(delta_z.kind());
            transport_cost = Some(match transport_cost {
                Some(cost) => cost + step_cost,
                None => step_cost,
            });
        }

        debug!(
            step,
            updated = drop_mask.sum(Kind::Float).double_value(&[]),
            batch_size,
            "latent optimisation step"
        );
    }

    Ok(LatentOutcome { zs, transport_cost })
}
