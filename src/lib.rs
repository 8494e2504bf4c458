//! # GAN Losses
//!
//! This crate provides the loss layer of conditional GAN training on top of
//! libtorch tensors.
//!
//! ## Modules
//!
//! - `losses`: Adversarial, contrastive, gradient penalty and latent optimisation
//! - `model`: Generator and discriminator contracts
//! - `autograd`: Injected reverse-mode gradient engine
//! - `utils`: Configuration and logging
//!
//! ## Example
//!
//! ```no_run
//! use gan_losses::{AdvLoss, ConditionalContrastive, positive_mask};
//! use tch::{Device, Kind, Tensor};
//!
//! fn main() -> gan_losses::Result<()> {
//!     let d_real = Tensor::randn([8, 1], (Kind::Float, Device::Cpu));
//!     let d_fake = Tensor::randn([8, 1], (Kind::Float, Device::Cpu));
//!     let d_loss = AdvLoss::Hinge.d_loss(&d_real, &d_fake);
//!
//!     let labels = Tensor::from_slice(&[0i64, 1, 0, 1, 2, 2, 0, 1]);
//!     let embed = Tensor::randn([8, 16], (Kind::Float, Device::Cpu));
//!     let proxy = Tensor::randn([3, 16], (Kind::Float, Device::Cpu));
//!     let mask = positive_mask(&labels, 3, Device::Cpu)?;
//!     let contrastive = ConditionalContrastive::new(Device::Cpu)
//!         .forward(&embed, &proxy, &mask, &labels, 0.5)?;
//!
//!     let _total = d_loss + contrastive;
//!     Ok(())
//! }
//! ```

pub mod autograd;
pub mod error;
pub mod losses;
pub mod model;
pub mod utils;

// Re-export main types for convenience
pub use autograd::{input_gradient, GradRequest, GradientEngine, TchAutograd};
pub use error::{Error, Result};
pub use losses::{
    cosine_similarity_matrix, dragan_penalty, gradient_penalty, latent_optimise, positive_mask,
    remove_diag, AdvLoss, ConditionalContrastive, LatentOptConfig, LatentOutcome, LatentStepMode,
    PenaltyKind,
};
pub use model::{Discriminator, DiscriminatorOutput, Generator};
pub use utils::{setup_logging, LossConfig};
