//! Loss functions for conditional GAN training
//!
//! This module provides:
//! - Pairwise cosine similarity and diagonal removal
//! - Adversarial losses (vanilla, least-squares, hinge, Wasserstein)
//! - Conditional contrastive loss over embeddings and class proxies
//! - Gradient penalties (interpolation and DRAGAN)
//! - Latent optimisation of generator inputs

mod adversarial;
mod contrastive;
mod latent;
mod penalty;
mod similarity;

pub use adversarial::{
    d_hinge, d_ls, d_vanilla, d_wasserstein, g_hinge, g_ls, g_vanilla, g_wasserstein, AdvLoss,
};
pub use contrastive::{positive_mask, ConditionalContrastive};
pub use latent::{latent_optimise, LatentOptConfig, LatentOutcome, LatentStepMode};
pub use penalty::{dragan_penalty, gradient_penalty, PenaltyKind};
pub use similarity::{
    cosine_similarity_matrix, off_diagonal_mask, paired_cosine_similarity, remove_diag,
};
