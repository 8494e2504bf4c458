//! Generator contract
//!
//! The generator turns latent codes into samples. Latent optimisation only
//! needs its forward pass, so any `Fn(&Tensor, &Tensor) -> Tensor` works.

use tch::Tensor;

/// Generator network seen through its forward pass
pub trait Generator {
    /// Map latent codes of shape (batch, z_dim) and labels to samples
    fn forward(&self, latent: &Tensor, labels: &Tensor) -> Tensor;
}

impl<F> Generator for F
where
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    fn forward(&self, latent: &Tensor, labels: &Tensor) -> Tensor {
        self(latent, labels)
    }
}
