//! Discriminator contract
//!
//! The losses treat the discriminator as an opaque differentiable function.
//! Anything that maps `(images, labels, eval)` to a [`DiscriminatorOutput`]
//! can be plugged in, including plain closures.

use tch::Tensor;

use crate::error::{Error, Result};

/// Structured result of a discriminator forward pass
#[derive(Debug)]
pub struct DiscriminatorOutput {
    /// Adversarial score per sample, shape (batch,) or (batch, 1)
    pub adv_output: Tensor,
    /// Penultimate-layer embeddings, shape (batch, dim)
    pub embed: Option<Tensor>,
    /// Class proxy table, shape (num_classes, dim)
    pub proxy: Option<Tensor>,
}

impl DiscriminatorOutput {
    /// Output carrying only the adversarial score
    pub fn adversarial(adv_output: Tensor) -> Self {
        Self {
            adv_output,
            embed: None,
            proxy: None,
        }
    }

    /// Attach contrastive embeddings and proxies
    pub fn with_contrastive(mut self, embed: Tensor, proxy: Tensor) -> Self {
        self.embed = Some(embed);
        self.proxy = Some(proxy);
        self
    }

    /// Borrow the embeddings, failing if the discriminator did not produce them
    pub fn embed(&self) -> Result<&Tensor> {
        self.embed.as_ref().ok_or(Error::MissingOutput("embed"))
    }

    /// Borrow the proxy table, failing if the discriminator did not produce it
    pub fn proxy(&self) -> Result<&Tensor> {
        self.proxy.as_ref().ok_or(Error::MissingOutput("proxy"))
    }
}

/// Discriminator network seen through its forward pass
pub trait Discriminator {
    /// Score `images` conditioned on `labels`
    ///
    /// `eval` is forwarded untouched so implementations can switch
    /// dropout or batch statistics.
    fn forward(&self, images: &Tensor, labels: &Tensor, eval: bool) -> DiscriminatorOutput;
}

impl<F> Discriminator for F
where
    F: Fn(&Tensor, &Tensor, bool) -> DiscriminatorOutput,
{
    fn forward(&self, images: &Tensor, labels: &Tensor, eval: bool) -> DiscriminatorOutput {
        self(images, labels, eval)
    }
}
