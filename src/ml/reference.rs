// Plain f64 re-implementations of the cell equations, used by the
// unit tests to check the Burn graphs against hand-written math.

use burn::prelude::*;

pub type Matrix = Vec<Vec<f64>>;

pub fn tensor1<B: Backend>(values: &[f64], device: &B::Device) -> Tensor<B, 1> {
    let flat: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Tensor::from_floats(flat.as_slice(), device)
}

pub fn tensor2<B: Backend>(rows: &[Vec<f64>], device: &B::Device) -> Tensor<B, 2> {
    let cols = rows[0].len();
    let flat: Vec<f32> = rows.iter().flatten().map(|&v| v as f32).collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows.len(), cols])
}

pub fn tensor3<B: Backend>(blocks: &[Matrix], device: &B::Device) -> Tensor<B, 3> {
    let rows = blocks[0].len();
    let cols = blocks[0][0].len();
    let flat: Vec<f32> = blocks
        .iter()
        .flatten()
        .flatten()
        .map(|&v| v as f32)
        .collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([blocks.len(), rows, cols])
}

/// Deterministic, non-symmetric weights in [-2·scale, 2·scale].
pub fn patterned(rows: usize, cols: usize, scale: f64) -> Matrix {
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| scale * (((r * 7 + c * 3) % 5) as f64 - 2.0))
                .collect()
        })
        .collect()
}

pub fn matmul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Matrix {
    let inner = b.len();
    let cols  = b[0].len();
    a.iter()
        .map(|row| {
            (0..cols)
                .map(|c| (0..inner).map(|k| row[k] * b[k][c]).sum())
                .collect()
        })
        .collect()
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn softmax(xs: &[f64]) -> Vec<f64> {
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = xs.iter().map(|x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// One fused-kernel LSTM step over a batch; returns (cell, hidden).
pub fn lstm_step(
    x:           &[Vec<f64>],
    h:           &[Vec<f64>],
    c:           &[Vec<f64>],
    kernel:      &[Vec<f64>],
    bias:        &[f64],
    forget_bias: f64,
) -> (Matrix, Matrix) {
    let n = h[0].len();
    let xh: Matrix = x
        .iter()
        .zip(h)
        .map(|(xr, hr)| xr.iter().chain(hr.iter()).cloned().collect())
        .collect();
    let gates = matmul(&xh, kernel);

    let mut cells   = Vec::new();
    let mut hiddens = Vec::new();
    for (row, gate) in gates.iter().enumerate() {
        let mut c_row = Vec::with_capacity(n);
        let mut h_row = Vec::with_capacity(n);
        for u in 0..n {
            let i = sigmoid(gate[u] + bias[u]);
            let j = (gate[n + u] + bias[n + u]).tanh();
            let f = sigmoid(gate[2 * n + u] + bias[2 * n + u] + forget_bias);
            let o = sigmoid(gate[3 * n + u] + bias[3 * n + u]);
            let cell = f * c[row][u] + i * j;
            c_row.push(cell);
            h_row.push(o * cell.tanh());
        }
        cells.push(c_row);
        hiddens.push(h_row);
    }
    (cells, hiddens)
}

/// Masked attention read shared by both cells:
///   G = tanh(keys·W_k + query), scores = G·w + b (+ mask), α = softmax(scores)
/// Returns (α, Σ α_i · keys_i) for one example.
pub fn attention(
    keys:   &[Vec<f64>],
    w_k:    &[Vec<f64>],
    query:  &[f64],
    w:      &[f64],
    b:      f64,
    length: usize,
) -> (Vec<f64>, Vec<f64>) {
    let projected = matmul(keys, w_k);
    let scores: Vec<f64> = projected
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if i >= length {
                return f64::NEG_INFINITY;
            }
            row.iter()
                .zip(query)
                .zip(w)
                .map(|((p, q), wi)| (p + q).tanh() * wi)
                .sum::<f64>()
                + b
        })
        .collect();
    let alpha = softmax(&scores);
    let width = keys[0].len();
    let read = (0..width)
        .map(|d| keys.iter().zip(&alpha).map(|(k, a)| k[d] * a).sum())
        .collect();
    (alpha, read)
}

pub fn assert_close<B: Backend>(actual: &Tensor<B, 2>, expected: &[Vec<f64>], tol: f64) {
    let [rows, cols] = actual.dims();
    assert_eq!(rows, expected.len(), "row count");
    let values: Vec<f32> = actual.clone().into_data().convert::<f32>().to_vec().unwrap();
    for r in 0..rows {
        assert_eq!(cols, expected[r].len(), "column count");
        for c in 0..cols {
            let got  = values[r * cols + c] as f64;
            let want = expected[r][c];
            assert!(
                (got - want).abs() < tol,
                "mismatch at [{r}, {c}]: got {got}, want {want}"
            );
        }
    }
}
