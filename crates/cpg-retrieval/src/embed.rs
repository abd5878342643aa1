//! Text embedding capability
//!
//! The index only needs `embed(text) -> unit vector`. [`HashingEmbedder`] is a
//! dependency-free feature-hashing embedder; model-backed embedders plug in
//! through the same trait.

use crate::error::Result;

/// Default embedding width
pub const DEFAULT_DIMENSIONS: usize = 256;

/// Maps text to a fixed-width vector
pub trait Embedder: Send + Sync {
    /// Vector width
    fn dimensions(&self) -> usize;

    /// Embed `text`; the result is L2-normalized (or all zeros for no tokens)
    ///
    /// # Errors
    /// Backend-specific embedding failure.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Signed feature hashing over lowercase word and hashtag tokens
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let hash = blake3::hash(token.as_bytes());
        let bytes = hash.as_bytes();
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[..8]);
        let n = u64::from_le_bytes(word);
        #[allow(clippy::cast_possible_truncation)]
        let index = (n % self.dimensions as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let (index, sign) = self.bucket(&token);
            vector[index] += sign;
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

/// Lowercase alphanumeric tokens of two or more characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() > 1)
        .map(str::to_lowercase)
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Dot product of two normalized vectors
#[must_use]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_scores_one() {
        let e = HashingEmbedder::default();
        let a = e.embed("summer glow skincare").unwrap();
        let b = e.embed("Summer GLOW skincare").unwrap();
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn related_text_scores_higher_than_unrelated() {
        let e = HashingEmbedder::default();
        let q = e.embed("neural networks research").unwrap();
        let related = e.embed("new research on neural networks and backprop").unwrap();
        let unrelated = e.embed("lipstick shades for the holidays").unwrap();
        assert!(cosine(&q, &related) > cosine(&q, &unrelated));
    }

    #[test]
    fn no_tokens_gives_zero_vector() {
        let e = HashingEmbedder::new(8);
        assert_eq!(e.embed("!!").unwrap(), vec![0.0; 8]);
    }
}
