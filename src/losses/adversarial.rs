//! Adversarial loss formulations for GAN training
//!
//! Each formulation pairs a discriminator loss over real and fake logits with
//! a generator loss over fake logits. All of them reduce to a scalar with the
//! batch mean.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tch::Tensor;

use crate::error::Error;

/// Vanilla discriminator loss: -E[log σ(D(x))] - E[log σ(1 - D(G(z)))]
///
/// Uses the stable log-sigmoid primitive.
pub fn d_vanilla(d_logit_real: &Tensor, d_logit_fake: &Tensor) -> Tensor {
    let real_term = d_logit_real.log_sigmoid().mean(d_logit_real.kind());
    let fake_term = (1.0f64 - d_logit_fake).log_sigmoid().mean(d_logit_fake.kind());
    -real_term - fake_term
}

/// Vanilla generator loss: -E[log σ(D(G(z)))]
pub fn g_vanilla(g_logit_fake: &Tensor) -> Tensor {
    -g_logit_fake.log_sigmoid().mean(g_logit_fake.kind())
}

/// Least-squares discriminator loss: E[0.5·(D(x) - 1)² + 0.5·D(G(z))²]
pub fn d_ls(d_logit_real: &Tensor, d_logit_fake: &Tensor) -> Tensor {
    let real_term = (d_logit_real - 1.0).pow_tensor_scalar(2.0) * 0.5;
    let fake_term = d_logit_fake.pow_tensor_scalar(2.0) * 0.5;
    (real_term + fake_term).mean(d_logit_real.kind())
}

/// Least-squares generator loss: E[0.5·(D(G(z)) - 1)²]
pub fn g_ls(g_logit_fake: &Tensor) -> Tensor {
    ((g_logit_fake - 1.0).pow_tensor_scalar(2.0) * 0.5).mean(g_logit_fake.kind())
}

/// Hinge discriminator loss: E[relu(1 - D(x))] + E[relu(1 + D(G(z)))]
pub fn d_hinge(d_logit_real: &Tensor, d_logit_fake: &Tensor) -> Tensor {
    (1.0f64 - d_logit_real).relu().mean(d_logit_real.kind())
        + (1.0f64 + d_logit_fake).relu().mean(d_logit_fake.kind())
}

/// Hinge generator loss: -E[D(G(z))]
pub fn g_hinge(g_logit_fake: &Tensor) -> Tensor {
    -g_logit_fake.mean(g_logit_fake.kind())
}

/// Wasserstein discriminator loss: E[D(G(z)) - D(x)]
pub fn d_wasserstein(d_logit_real: &Tensor, d_logit_fake: &Tensor) -> Tensor {
    (d_logit_fake - d_logit_real).mean(d_logit_real.kind())
}

/// Wasserstein generator loss: -E[D(G(z))]
pub fn g_wasserstein(g_logit_fake: &Tensor) -> Tensor {
    -g_logit_fake.mean(g_logit_fake.kind())
}

/// Selectable adversarial loss formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvLoss {
    /// Non-saturating cross-entropy GAN loss
    Vanilla,
    /// Least-squares GAN loss
    LeastSquare,
    /// Hinge loss
    #[default]
    Hinge,
    /// Wasserstein critic loss
    Wasserstein,
}

impl AdvLoss {
    /// All formulations, in declaration order
    pub const ALL: [AdvLoss; 4] = [
        AdvLoss::Vanilla,
        AdvLoss::LeastSquare,
        AdvLoss::Hinge,
        AdvLoss::Wasserstein,
    ];

    /// Discriminator loss for this formulation
    pub fn d_loss(&self, d_logit_real: &Tensor, d_logit_fake: &Tensor) -> Tensor {
        match self {
            AdvLoss::Vanilla => d_vanilla(d_logit_real, d_logit_fake),
            AdvLoss::LeastSquare => d_ls(d_logit_real, d_logit_fake),
            AdvLoss::Hinge => d_hinge(d_logit_real, d_logit_fake),
            AdvLoss::Wasserstein => d_wasserstein(d_logit_real, d_logit_fake),
        }
    }

    /// Generator loss for this formulation
    pub fn g_loss(&self, g_logit_fake: &Tensor) -> Tensor {
        match self {
            AdvLoss::Vanilla => g_vanilla(g_logit_fake),
            AdvLoss::LeastSquare => g_ls(g_logit_fake),
            AdvLoss::Hinge => g_hinge(g_logit_fake),
            AdvLoss::Wasserstein => g_wasserstein(g_logit_fake),
        }
    }

    /// Canonical name, as accepted by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            AdvLoss::Vanilla => "vanilla",
            AdvLoss::LeastSquare => "least_square",
            AdvLoss::Hinge => "hinge",
            AdvLoss::Wasserstein => "wasserstein",
        }
    }
}

impl fmt::Display for AdvLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdvLoss {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vanilla" => Ok(AdvLoss::Vanilla),
            "least_square" | "ls" => Ok(AdvLoss::LeastSquare),
            "hinge" => Ok(AdvLoss::Hinge),
            "wasserstein" | "wgan" => Ok(AdvLoss::Wasserstein),
            other => Err(Error::InvalidConfig(format!("unknown adversarial loss `{}`", other))),
        }
    }
}
