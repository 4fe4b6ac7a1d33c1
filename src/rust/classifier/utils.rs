use ndarray::{Array2, ArrayView1};

/// Scales `values` in place to unit L2 norm. All-zero vectors stay zero.
pub(crate) fn l2_normalize(values: &mut [f32]) {
    let norm: f32 = values.iter().map(|&x| x * x).sum::<f32>().sqrt();
    scale(values, norm);
}

/// Scales `values` in place to unit L1 norm. All-zero vectors stay zero.
pub(crate) fn l1_normalize(values: &mut [f32]) {
    let norm: f32 = values.iter().map(|x| x.abs()).sum();
    scale(values, norm);
}

fn scale(values: &mut [f32], norm: f32) {
    if norm > 1e-10 {
        values.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Dot product of a dense row with a sparse `(index, value)` vector.
pub(crate) fn sparse_dot(row: ArrayView1<f32>, features: &[(usize, f32)]) -> f32 {
    features.iter().map(|&(idx, value)| row[idx] * value).sum()
}

/// Builds a `rows x cols` matrix from nested rows, rejecting ragged input.
pub(crate) fn matrix_from_rows(rows: Vec<Vec<f32>>) -> Result<Array2<f32>, String> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_cols) {
        return Err(format!(
            "coefficient row {} has {} columns, expected {}",
            i,
            row.len(),
            n_cols
        ));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| e.to_string())
}
