//! Conditional contrastive loss
//!
//! Pulls every embedding towards its class proxy and towards the other
//! same-class embeddings of the batch, ranked against all non-self samples
//! in a softmax over cosine similarities.

use tch::{Device, Kind, Tensor};
use tracing::trace;

use super::similarity::{cosine_similarity_matrix, paired_cosine_similarity, remove_diag};
use crate::error::{Error, Result};

/// Class-proxy anchored supervised contrastive objective
#[derive(Debug, Clone, Copy)]
pub struct ConditionalContrastive {
    device: Device,
}

impl ConditionalContrastive {
    /// Create the loss bound to `device`
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    /// Device the diagonal masks are built on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Pairwise cosine similarity between two embedding batches
    pub fn similarity_matrix(&self, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        cosine_similarity_matrix(x, y)
    }

    /// Drop the diagonal of a square matrix, shape (h, h) -> (h, h - 1)
    pub fn remove_diag(&self, matrix: &Tensor) -> Result<Tensor> {
        remove_diag(matrix, self.device)
    }

    /// Compute the loss
    ///
    /// # Arguments
    ///
    /// * `embed` - Discriminator embeddings of shape (batch, dim)
    /// * `proxy` - Class proxy table of shape (num_classes, dim)
    /// * `mask` - Positive-pair mask of shape (num_classes, batch)
    /// * `labels` - Int64 or Int32 class ids in [0, num_classes), shape (batch,)
    /// * `temperature` - Softmax temperature, > 0
    ///
    /// # Returns
    ///
    /// Scalar loss tensor
    pub fn forward(
        &self,
        embed: &Tensor,
        proxy: &Tensor,
        mask: &Tensor,
        labels: &Tensor,
        temperature: f64,
    ) -> Result<Tensor> {
        if temperature.is_nan() || temperature <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "temperature must be > 0, got {}",
                temperature
            )));
        }
        let batch_size = check_inputs(embed, proxy, mask, labels)?;
        trace!(batch_size, classes = proxy.size()[0], "conditional contrastive loss");

        let sim_matrix = self.similarity_matrix(embed, embed)?;
        let sim_matrix = (self.remove_diag(&sim_matrix)? / temperature).exp();

        let kind = sim_matrix.kind();
        let pos_mask = self.remove_diag(&mask.f_index_select(0, labels)?.to_kind(kind))?;
        let sim_btw_pos = (&pos_mask * &sim_matrix).sum_dim_intlist([1].as_slice(), false, kind);

        let class_proxy = proxy.f_index_select(0, labels)?;
        let emb2proxy = (paired_cosine_similarity(embed, &class_proxy)? / temperature).exp();

        let numerator = &emb2proxy + sim_btw_pos;
        let denominator = &emb2proxy + sim_matrix.sum_dim_intlist([1].as_slice(), false, kind);
        let criterion = -(numerator / denominator).log();
        Ok(criterion.mean(kind))
    }
}

/// Build the (num_classes, batch) positive-pair mask of a label batch
///
/// Entry (c, j) is 1 when sample j belongs to class c.
pub fn positive_mask(labels: &Tensor, num_classes: i64, device: Device) -> Result<Tensor> {
    if labels.dim() != 1 {
        return Err(Error::shape("positive_mask", "labels of shape (batch,)", labels.size()));
    }
    let classes = Tensor::arange(num_classes, (Kind::Int64, device)).unsqueeze(1);
    let labels = labels.to_device(device).to_kind(Kind::Int64).unsqueeze(0);
    Ok(classes.eq_tensor(&labels).to_kind(Kind::Float))
}

/// Validate input shapes and the label range, return the batch size
fn check_inputs(embed: &Tensor, proxy: &Tensor, mask: &Tensor, labels: &Tensor) -> Result<i64> {
    if embed.dim() != 2 {
        return Err(Error::shape("contrastive embed", "(batch, dim)", embed.size()));
    }
    let (batch_size, dim) = (embed.size()[0], embed.size()[1]);

    if proxy.dim() != 2 || proxy.size()[1] != dim {
        return Err(Error::shape(
            "contrastive proxy",
            format!("(num_classes, {})", dim),
            proxy.size(),
        ));
    }
    if labels.size() != [batch_size] {
        return Err(Error::shape(
            "contrastive labels",
            format!("({},)", batch_size),
            labels.size(),
        ));
    }
    let num_classes = proxy.size()[0];
    if mask.size() != [num_classes, batch_size] {
        return Err(Error::shape(
            "contrastive mask",
            format!("({}, {})", num_classes, batch_size),
            mask.size(),
        ));
    }
    if !matches!(labels.kind(), Kind::Int64 | Kind::Int) {
        return Err(Error::InvalidConfig(format!(
            "contrastive labels must be Int64 or Int32 class ids, got {:?}",
            labels.kind()
        )));
    }
    if batch_size > 0 {
        let (lowest, highest) = (labels.min().int64_value(&[]), labels.max().int64_value(&[]));
        if lowest < 0 || highest >= num_classes {
            return Err(Error::InvalidConfig(format!(
                "contrastive labels must lie in [0, {}), got range [{}, {}]",
                num_classes, lowest, highest
            )));
        }
    }
    Ok(batch_size)
}
