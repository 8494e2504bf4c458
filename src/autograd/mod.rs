//! Reverse-mode differentiation seam
//!
//! Gradient penalties and latent optimisation need input gradients of the
//! discriminator that stay differentiable themselves. The engine that
//! produces them is injected through [`GradientEngine`] so the losses do not
//! hard-wire one autograd implementation. [`TchAutograd`] is the libtorch
//! backed default.

use tch::Tensor;
use tracing::trace;

use crate::error::{Error, Result};

/// Options of a single gradient request
#[derive(Debug, Default)]
pub struct GradRequest {
    /// Upstream gradient; `None` seeds with ones (outputs treated as summed)
    pub seed: Option<Tensor>,
    /// Build a graph of the gradient computation for higher-order derivatives
    pub create_graph: bool,
    /// Keep the forward graph alive after the call
    pub retain_graph: bool,
}

impl GradRequest {
    /// Ones seed, differentiable result and preserved graph
    pub fn higher_order() -> Self {
        Self {
            seed: None,
            create_graph: true,
            retain_graph: true,
        }
    }
}

/// Reverse-mode gradient primitive
pub trait GradientEngine {
    /// Gradient of `outputs` with respect to `inputs`, shaped like `inputs`
    fn grad(&self, outputs: &Tensor, inputs: &Tensor, request: &GradRequest) -> Result<Tensor>;
}

/// Gradient engine backed by libtorch autograd
#[derive(Debug, Clone, Copy, Default)]
pub struct TchAutograd;

impl GradientEngine for TchAutograd {
    fn grad(&self, outputs: &Tensor, inputs: &Tensor, request: &GradRequest) -> Result<Tensor> {
        if !inputs.requires_grad() {
            return Err(Error::InvalidConfig(
                "gradient requested for a tensor that does not require grad".to_string(),
            ));
        }

        // libtorch seeds every root with ones_like, so a custom seed is folded
        // into a weighted sum first.
        let root = match &request.seed {
            Some(seed) => {
                if seed.size() != outputs.size() {
                    return Err(Error::shape(
                        "gradient seed",
                        format!("{:?}", outputs.size()),
                        seed.size(),
                    ));
                }
                (outputs * seed).sum(outputs.kind())
            }
            None => outputs.shallow_clone(),
        };

        let keep_graph = request.retain_graph || request.create_graph;
        let mut grads =
            Tensor::f_run_backward(&[&root], &[inputs], keep_graph, request.create_graph)?;
        let grad = grads.pop().ok_or_else(|| {
            Error::Engine(tch::TchError::Torch("autograd returned no gradient".to_string()))
        })?;

        trace!(outputs = ?outputs.size(), inputs = ?inputs.size(), "computed input gradient");
        Ok(grad)
    }
}

/// Differentiable gradient of `outputs` with respect to `inputs`
///
/// Seeds with ones, creates a graph for a second differentiation and keeps the
/// forward graph, returning only the gradient for `inputs`.
#[doc(alias = "cal_deriv")]
pub fn input_gradient<E>(outputs: &Tensor, inputs: &Tensor, engine: &E) -> Result<Tensor>
where
    E: GradientEngine + ?Sized,
{
    engine.grad(outputs, inputs, &GradRequest::higher_order())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tch::{Device, Kind};

    #[test]
    fn test_ones_seed_sums_outputs() {
        let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0]).set_requires_grad(true);
        let y = &x * &x;

        let grad = input_gradient(&y, &x, &TchAutograd).unwrap();

        // d/dx sum(x^2) = 2x
        assert_eq!(grad.size(), vec![3]);
        assert_abs_diff_eq!(grad.double_value(&[0]), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grad.double_value(&[2]), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_custom_seed_weights_outputs() {
        let x = Tensor::from_slice(&[1.0f32, 2.0]).set_requires_grad(true);
        let y = &x * 3.0;
        let request = GradRequest {
            seed: Some(Tensor::from_slice(&[2.0f32, -1.0])),
            create_graph: false,
            retain_graph: false,
        };

        let grad = TchAutograd.grad(&y, &x, &request).unwrap();

        assert_abs_diff_eq!(grad.double_value(&[0]), 6.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grad.double_value(&[1]), -3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gradient_is_differentiable() {
        let x = Tensor::from_slice(&[1.5f32, -0.5]).set_requires_grad(true);
        let y = x.pow_tensor_scalar(3.0);

        let grad = input_gradient(&y, &x, &TchAutograd).unwrap();
        assert!(grad.requires_grad());

        // d/dx sum(3x^2) = 6x
        let second = input_gradient(&grad, &x, &TchAutograd).unwrap();
        assert_abs_diff_eq!(second.double_value(&[0]), 9.0, epsilon = 1e-5);
        assert_abs_diff_eq!(second.double_value(&[1]), -3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_untracked_input() {
        let x = Tensor::ones([2], (Kind::Float, Device::Cpu));
        let y = &x * 2.0;
        assert!(input_gradient(&y, &x, &TchAutograd).is_err());
    }

    #[test]
    fn test_rejects_mismatched_seed() {
        let x = Tensor::ones([3], (Kind::Float, Device::Cpu)).set_requires_grad(true);
        let y = &x * 2.0;
        let request = GradRequest {
            seed: Some(Tensor::ones([2], (Kind::Float, Device::Cpu))),
            ..GradRequest::higher_order()
        };
        assert!(matches!(
            TchAutograd.grad(&y, &x, &request),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
