//! Pairwise cosine similarity and self-similarity removal

use tch::{Device, Kind, Tensor};

use crate::error::{Error, Result};

/// Numerical floor of the cosine denominator, libtorch's default
const COSINE_EPS: f64 = 1e-8;

/// Cosine similarity matrix between two embedding batches
///
/// # Arguments
///
/// * `x` - Tensor of shape (n, dim)
/// * `y` - Tensor of shape (m, dim)
///
/// # Returns
///
/// Tensor of shape (n, m) where entry (i, j) is cos(x[i], y[j])
pub fn cosine_similarity_matrix(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    if x.dim() != 2 || y.dim() != 2 {
        return Err(Error::shape(
            "cosine_similarity_matrix",
            "two (batch, dim) matrices",
            (x.size(), y.size()),
        ));
    }
    if x.size()[1] != y.size()[1] {
        return Err(Error::shape(
            "cosine_similarity_matrix",
            format!("feature dim {}", x.size()[1]),
            y.size(),
        ));
    }

    // (n, 1, d) against (1, m, d) broadcasts to (n, m)
    Ok(Tensor::cosine_similarity(&x.unsqueeze(1), &y.unsqueeze(0), -1, COSINE_EPS))
}

/// Row-wise cosine similarity between paired vectors of two batches
pub fn paired_cosine_similarity(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    if x.size() != y.size() {
        return Err(Error::shape(
            "paired_cosine_similarity",
            format!("{:?}", x.size()),
            y.size(),
        ));
    }
    Ok(Tensor::cosine_similarity(x, y, -1, COSINE_EPS))
}

/// Boolean mask that is false on the diagonal of an (h, h) matrix
pub fn off_diagonal_mask(h: i64, device: Device) -> Tensor {
    Tensor::eye(h, (Kind::Float, device)).eq(0.0)
}

/// Drop the diagonal of a square matrix
///
/// Selects the off-diagonal entries with an explicit boolean mask and
/// reshapes them to (h, h - 1). Row order and the relative order of the
/// remaining columns are preserved.
pub fn remove_diag(matrix: &Tensor, device: Device) -> Result<Tensor> {
    let size = matrix.size();
    if size.len() != 2 || size[0] != size[1] {
        return Err(Error::shape("remove_diag", "square (h, h) matrix", size));
    }
    let h = size[0];

    let mask = off_diagonal_mask(h, device);
    Ok(matrix.masked_select(&mask).reshape([h, h - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn matrix(values: &[f32], rows: i64, cols: i64) -> Tensor {
        Tensor::from_slice(values).reshape([rows, cols])
    }

    #[test]
    fn test_similarity_matrix_shape() {
        let x = Tensor::randn([4, 8], (Kind::Float, Device::Cpu));
        let y = Tensor::randn([6, 8], (Kind::Float, Device::Cpu));

        let sim = cosine_similarity_matrix(&x, &y).unwrap();
        assert_eq!(sim.size(), vec![4, 6]);
    }

    #[test]
    fn test_similarity_values() {
        let x = matrix(&[1.0, 0.0, 0.0, 2.0], 2, 2);
        let y = matrix(&[3.0, 0.0, 1.0, 1.0, 0.0, -1.0], 3, 2);

        let sim = cosine_similarity_matrix(&x, &y).unwrap();

        assert_abs_diff_eq!(sim.double_value(&[0, 0]), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sim.double_value(&[0, 1]), 0.5f64.sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(sim.double_value(&[0, 2]), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sim.double_value(&[1, 2]), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_self_similarity_diagonal_is_one() {
        let x = Tensor::randn([5, 3], (Kind::Float, Device::Cpu));
        let sim = cosine_similarity_matrix(&x, &x).unwrap();

        for i in 0..5 {
            assert_abs_diff_eq!(sim.double_value(&[i, i]), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_similarity_dim_mismatch() {
        let x = Tensor::randn([4, 8], (Kind::Float, Device::Cpu));
        let y = Tensor::randn([4, 7], (Kind::Float, Device::Cpu));
        assert!(matches!(
            cosine_similarity_matrix(&x, &y),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_remove_diag_shape_and_order() {
        let m = matrix(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 3, 3);

        let out = remove_diag(&m, Device::Cpu).unwrap();
        assert_eq!(out.size(), vec![3, 2]);

        let expected = [[1.0, 2.0], [3.0, 5.0], [6.0, 7.0]];
        for (i, row) in expected.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                assert_eq!(out.double_value(&[i as i64, j as i64]), *value);
            }
        }
    }

    #[test]
    fn test_remove_diag_keeps_every_off_diagonal_once() {
        let h = 6;
        // Distinct values; diagonal entries are negative
        let values: Vec<f32> = (0..h * h)
            .map(|k| if k / h == k % h { -1.0 - k as f32 } else { k as f32 })
            .collect();
        let m = matrix(&values, h, h);

        let out = remove_diag(&m, Device::Cpu).unwrap();
        assert_eq!(out.size(), vec![h, h - 1]);

        let mut kept: Vec<f64> = Vec::new();
        for i in 0..h {
            for j in 0..h - 1 {
                kept.push(out.double_value(&[i, j]));
            }
        }
        assert!(kept.iter().all(|v| *v >= 0.0));

        kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
        kept.dedup();
        assert_eq!(kept.len() as i64, h * (h - 1));
    }

    #[test]
    fn test_remove_diag_rejects_non_square() {
        let m = Tensor::zeros([2, 3], (Kind::Float, Device::Cpu));
        assert!(matches!(
            remove_diag(&m, Device::Cpu),
            Err(Error::ShapeMismatch { .. })
        ));

        let v = Tensor::zeros([4], (Kind::Float, Device::Cpu));
        assert!(remove_diag(&v, Device::Cpu).is_err());
    }

    #[test]
    fn test_remove_diag_single_element() {
        let m = Tensor::ones([1, 1], (Kind::Float, Device::Cpu));
        let out = remove_diag(&m, Device::Cpu).unwrap();
        assert_eq!(out.size(), vec![1, 0]);
    }
}
