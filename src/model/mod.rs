//! Model contracts consumed by the losses
//!
//! This module provides:
//! - Generator trait mapping latent codes to samples
//! - Discriminator trait producing a structured output
//! - DiscriminatorOutput carrying adversarial scores, embeddings and proxies

mod discriminator;
mod generator;

pub use discriminator::{Discriminator, DiscriminatorOutput};
pub use generator::Generator;
