//! Reduces the emphasized signal to one energy value per 20 ms block.

/// Block duration in seconds.
pub const BLOCK_SECONDS: f64 = 0.02;

/// Samples per block at `sample_rate`.
pub fn block_size(sample_rate: u32) -> usize {
    (sample_rate as f64 * BLOCK_SECONDS).round() as usize
}

/// Mean of each full block; a trailing partial block is dropped.
pub fn frame_energies(emphasized: &[f32], sample_rate: u32) -> Vec<f32> {
    let size = block_size(sample_rate);
    if size == 0 {
        return Vec::new();
    }
    emphasized
        .chunks_exact(size)
        .map(|block| block.iter().sum::<f32>() / size as f32)
        .collect()
}
