//! Gradient penalty estimators
//!
//! Both estimators push the norm of the discriminator's input gradient
//! towards 1 on samples drawn around the data. The penalty stays
//! differentiable with respect to the discriminator parameters so it can be
//! added to the discriminator loss.

use serde::{Deserialize, Serialize};
use tch::Tensor;
use tracing::debug;

use crate::autograd::{input_gradient, GradientEngine};
use crate::error::{Error, Result};
use crate::model::Discriminator;

/// Interpolation-based gradient penalty (WGAN-GP)
///
/// Samples α ~ U(0, 1) per sample, scores α·real + (1 - α)·fake and returns
/// mean((‖∇D‖₂ - 1)²).
///
/// # Arguments
///
/// * `real` - Real samples of shape (batch, ...)
/// * `real_labels` - Labels of the real samples, leading dimension `batch`
/// * `fake` - Generated samples, same shape as `real`
/// * `discriminator` - Model whose `adv_output` is differentiated
/// * `engine` - Gradient engine
pub fn gradient_penalty<D, E>(
    real: &Tensor,
    real_labels: &Tensor,
    fake: &Tensor,
    discriminator: &D,
    engine: &E,
) -> Result<Tensor>
where
    D: Discriminator + ?Sized,
    E: GradientEngine + ?Sized,
{
    check_batch("gradient_penalty", real, real_labels)?;
    if fake.size() != real.size() {
        return Err(Error::shape(
            "gradient_penalty fake samples",
            format!("{:?}", real.size()),
            fake.size(),
        ));
    }

    let alpha = per_sample_uniform(real);
    let interpolates = &alpha * real + (1.0 - &alpha) * fake;

    let penalty = penalty_at(&interpolates, real_labels, discriminator, engine)?;
    debug!(penalty = penalty.double_value(&[]), "interpolation gradient penalty");
    Ok(penalty)
}

/// Perturbation-based gradient penalty (DRAGAN)
///
/// Scores real + α·δ with δ = 0.5·std(real)·U(0, 1) drawn elementwise, so the
/// constraint is enforced in a neighbourhood of the data instead of on the
/// path towards generated samples.
#[doc(alias = "calc_derv4dra")]
pub fn dragan_penalty<D, E>(
    real: &Tensor,
    real_labels: &Tensor,
    discriminator: &D,
    engine: &E,
) -> Result<Tensor>
where
    D: Discriminator + ?Sized,
    E: GradientEngine + ?Sized,
{
    check_batch("dragan_penalty", real, real_labels)?;

    let alpha = per_sample_uniform(real);
    let differences = 0.5 * real.std(true) * real.rand_like();
    let interpolates = real + &alpha * differences;

    let penalty = penalty_at(&interpolates, real_labels, discriminator, engine)?;
    debug!(penalty = penalty.double_value(&[]), "dragan gradient penalty");
    Ok(penalty)
}

/// Gradient penalty variant selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    /// No penalty
    #[default]
    None,
    /// Interpolation between real and fake samples
    Interpolation,
    /// Perturbation of real samples
    Dragan,
}

impl PenaltyKind {
    /// Compute the selected penalty, `None` when disabled
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
        match self {
            PenaltyKind::None => Ok(None),
            PenaltyKind::Interpolation => {
                gradient_penalty(real, real_labels, fake, discriminator, engine).map(Some)
            }
            PenaltyKind::Dragan => {
                dragan_penalty(real, real_labels, discriminator, engine).map(Some)
            }
        }
    }
}

/// mean((‖∇ₓ D(x)‖₂ - 1)²) at the given points
fn penalty_at<D, E>(
    points: &Tensor,
    labels: &Tensor,
    discriminator: &D,
    engine: &E,
) -> Result<Tensor>
where
    D: Discriminator + ?Sized,
    E: GradientEngine + ?Sized,
{
    let points = points.detach().set_requires_grad(true);
    let output = discriminator.forward(&points, labels, false);
    let grads = input_gradient(&output.adv_output, &points, engine)?;

    let batch_size = grads.size()[0];
    let grads = grads.reshape([batch_size, -1]);
    let norms = grads.norm_scalaropt_dim(2.0, [1].as_slice(), false);
    let kind = norms.kind();
    Ok((norms - 1.0).pow_tensor_scalar(2.0).mean(kind))
}

/// α ~ U(0, 1) of shape (batch, 1, ..., 1), broadcastable over `samples`
fn per_sample_uniform(samples: &Tensor) -> Tensor {
    let mut shape = vec![1i64; samples.dim()];
    shape[0] = samples.size()[0];
    Tensor::rand(shape.as_slice(), (samples.kind(), samples.device()))
}

fn check_batch(context: &'static str, samples: &Tensor, labels: &Tensor) -> Result<()> {
    if samples.dim() < 2 {
        return Err(Error::shape(context, "samples of shape (batch, ...)", samples.size()));
    }
    let batch_size = samples.size()[0];
    if labels.dim() == 0 || labels.size()[0] != batch_size {
        return Err(Error::shape(
            context,
            format!("labels with leading dimension {}", batch_size),
            labels.size(),
        ));
    }
    Ok(())
}
