//! VSA operations: bind, bundle, permute, similarity.
//!
//! These are the algebraic operations every encoder and detector is built
//! from. Each operation is dispatched through the word kernel chosen at
//! construction time.

use crate::error::VsaError;
use crate::simd::VsaKernel;

use super::{Dimension, HyperVec};

/// Result type for VSA operations.
pub type VsaResult<T> = std::result::Result<T, VsaError>;

/// Ensure two hypervectors have matching dimensions.
fn check_compatible(a: &HyperVec, b: &HyperVec) -> VsaResult<()> {
    if a.dim() != b.dim() {
        return Err(VsaError::DimensionMismatch {
            expected: a.dim().0,
            actual: b.dim().0,
        });
    }
    Ok(())
}

/// VSA operations backed by a word kernel.
pub struct VsaOps {
    kernel: Box<dyn VsaKernel>,
    dim: Dimension,
}

impl VsaOps {
    /// Create VSA operations with the given kernel and dimension.
    pub fn new(kernel: Box<dyn VsaKernel>, dim: Dimension) -> Self {
        Self { kernel, dim }
    }

    /// The dimension these ops work with.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// The instruction set level of the kernel.
    pub fn isa_level(&self) -> crate::simd::IsaLevel {
        self.kernel.isa_level()
    }

    /// Draw a uniform random bipolar hypervector.
    pub fn random(&self, rng: &mut impl rand::Rng) -> HyperVec {
        let mut words = vec![0u64; self.dim.word_len()];
        rng.fill(words.as_mut_slice());
        HyperVec::from_words(words, self.dim)
    }

    /// Bind two hypervectors (XOR).
    ///
    /// The result is dissimilar to both inputs; this is role-filler
    /// association.
    pub fn bind(&self, a: &HyperVec, b: &HyperVec) -> VsaResult<HyperVec> {
        check_compatible(a, b)?;
        let mut out = vec![0u64; a.words().len()];
        self.kernel.xor_bind(a.words(), b.words(), &mut out);
        Ok(HyperVec::from_words(out, a.dim()))
    }

    /// Unbind. XOR is its own inverse, so this is `bind`.
    pub fn unbind(&self, bound: &HyperVec, key: &HyperVec) -> VsaResult<HyperVec> {
        self.bind(bound, key)
    }

    /// Bundle hypervectors by per-component majority vote.
    ///
    /// Ties (possible for an even number of inputs) resolve to +1 on even
    /// component indices and -1 on odd ones, so the result depends only on
    /// the multiset of inputs and bundling is exactly commutative.
    pub fn bundle(&self, vectors: &[&HyperVec]) -> VsaResult<HyperVec> {
        let Some(first) = vectors.first() else {
            return Err(VsaError::EmptyBundle);
        };
        let dim = first.dim();
        for v in &vectors[1..] {
            check_compatible(first, v)?;
        }

        let mut acc = vec![0i32; dim.0];
        for v in vectors {
            self.kernel.accumulate(&mut acc, v.words());
        }

        let mut result = HyperVec::zero(dim);
        for (i, &count) in acc.iter().enumerate() {
            if count > 0 || (count == 0 && i % 2 == 0) {
                result.set_bit(i, true);
            }
        }
        Ok(result)
    }

    /// Cyclically shift component positions by `shift`.
    ///
    /// The permuted vector is dissimilar to the input; used to mark order.
    pub fn permute(&self, v: &HyperVec, shift: usize) -> HyperVec {
        let mut out = vec![0u64; v.words().len()];
        self.kernel.rotate(v.words(), v.dim().0, shift, &mut out);
        HyperVec::from_words(out, v.dim())
    }

    /// Undo [`permute`](Self::permute) with the same shift.
    pub fn inverse_permute(&self, v: &HyperVec, shift: usize) -> HyperVec {
        let dim = v.dim().0;
        if dim == 0 {
            return v.clone();
        }
        self.permute(v, dim - shift % dim)
    }

    /// Bipolar cosine similarity in `[-1.0, 1.0]`.
    ///
    /// 1.0 means identical, 0.0 uncorrelated (two random vectors), -1.0
    /// complementary.
    pub fn similarity(&self, a: &HyperVec, b: &HyperVec) -> VsaResult<f32> {
        check_compatible(a, b)?;
        let dim = a.dim().0;
        if dim == 0 {
            return Ok(0.0);
        }
        let hamming = self.kernel.hamming_distance(a.words(), b.words());
        Ok(1.0 - 2.0 * hamming as f32 / dim as f32)
    }

    /// Normalised Hamming similarity in `[0.0, 1.0]`; 0.5 means uncorrelated.
    pub fn hamming_similarity(&self, a: &HyperVec, b: &HyperVec) -> VsaResult<f32> {
        Ok((self.similarity(a, b)? + 1.0) / 2.0)
    }
}

impl std::fmt::Debug for VsaOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VsaOps")
            .field("dim", &self.dim)
            .field("isa", &self.kernel.isa_level())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd;
    use rand::SeedableRng;

    fn test_ops() -> VsaOps {
        VsaOps::new(simd::best_kernel(), Dimension::DEFAULT)
    }

    fn seeded_rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn random_vectors_are_roughly_uncorrelated() {
        let ops = test_ops();
        let mut rng = seeded_rng();
        let a = ops.random(&mut rng);
        let b = ops.random(&mut rng);
        let sim = ops.similarity(&a, &b).unwrap();
        assert!(sim.abs() < 0.1, "similarity was {sim}, expected ~0");
    }

    #[test]
    fn self_similarity_is_one() {
        let ops = test_ops();
        let a = ops.random(&mut seeded_rng());
        assert!((ops.similarity(&a, &a).unwrap() - 1.0).abs() < 1e-6);
        assert!((ops.hamming_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bind_is_dissimilar_to_inputs() {
        let ops = test_ops();
        let mut rng = seeded_rng();
        let a = ops.random(&mut rng);
        let b = ops.random(&mut rng);
        let bound = ops.bind(&a, &b).unwrap();
        assert!(ops.similarity(&bound, &a).unwrap().abs() < 0.1);
        assert!(ops.similarity(&bound, &b).unwrap().abs() < 0.1);
    }

    #[test]
    fn unbind_recovers_filler() {
        let ops = test_ops();
        let mut rng = seeded_rng();
        let role = ops.random(&mut rng);
        let filler = ops.random(&mut rng);
        let bound = ops.bind(&role, &filler).unwrap();
        let recovered = ops.unbind(&bound, &role).unwrap();
        assert_eq!(recovered, filler);
    }

    #[test]
    fn bundle_is_similar_to_inputs() {
        let ops = test_ops();
        let mut rng = seeded_rng();
        let a = ops.random(&mut rng);
        let b = ops.random(&mut rng);
        let c = ops.random(&mut rng);
        let bundled = ops.bundle(&[&a, &b, &c]).unwrap();
        for v in [&a, &b, &c] {
            let sim = ops.similarity(&bundled, v).unwrap();
            assert!(sim > 0.4, "sim={sim}");
        }
    }

    #[test]
    fn bundle_is_commutative() {
        let ops = test_ops();
        let mut rng = seeded_rng();
        let a = ops.random(&mut rng);
        let b = ops.random(&mut rng);
        let c = ops.random(&mut rng);
        assert_eq!(ops.bundle(&[&a, &b]).unwrap(), ops.bundle(&[&b, &a]).unwrap());
        assert_eq!(
            ops.bundle(&[&a, &b, &c]).unwrap(),
            ops.bundle(&[&c, &a, &b]).unwrap()
        );
    }

    #[test]
    fn bundle_of_one_is_identity() {
        let ops = test_ops();
        let a = ops.random(&mut seeded_rng());
        assert_eq!(ops.bundle(&[&a]).unwrap(), a);
    }

    #[test]
    fn bundle_empty_is_error() {
        let ops = test_ops();
        assert!(matches!(ops.bundle(&[]), Err(VsaError::EmptyBundle)));
    }

    #[test]
    fn permute_is_dissimilar_and_invertible() {
        let ops = test_ops();
        let a = ops.random(&mut seeded_rng());
        let permuted = ops.permute(&a, 1);
        assert!(ops.similarity(&a, &permuted).unwrap().abs() < 0.1);
        assert_eq!(ops.inverse_permute(&permuted, 1), a);
    }

    #[test]
    fn dimension_mismatch_detected() {
        let ops = test_ops();
        let a = HyperVec::zero(Dimension(100));
        let b = HyperVec::zero(Dimension(200));
        assert!(matches!(
            ops.bind(&a, &b),
            Err(VsaError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            ops.bundle(&[&a, &b]),
            Err(VsaError::DimensionMismatch { .. })
        ));
    }
}
