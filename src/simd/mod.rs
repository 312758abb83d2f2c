//! Word-level kernels for bipolar hypervector arithmetic.
//!
//! Hypervectors are bit-packed into `u64` words. The [`VsaKernel`] trait covers
//! the hot loops (XOR binding, Hamming distance, majority accumulation and
//! bit rotation); [`best_kernel`] picks the fastest implementation available on
//! the running CPU.
//!
//! # Supported ISA levels
//!
//! - **Generic**: portable scalar code, also the reference for conformance tests
//! - **AVX2**: 256-bit XOR lanes on x86_64

pub mod avx2;
pub mod generic;

/// Instruction set architecture level detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IsaLevel {
    /// Portable scalar operations.
    Generic,
    /// x86_64 AVX2 (256-bit vectors).
    Avx2,
}

impl std::fmt::Display for IsaLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsaLevel::Generic => write!(f, "Generic (scalar)"),
            IsaLevel::Avx2 => write!(f, "AVX2 (256-bit)"),
        }
    }
}

/// Detect the best ISA level available on the current CPU.
pub fn detect_isa() -> IsaLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return IsaLevel::Avx2;
        }
    }
    IsaLevel::Generic
}

/// Kernel over bit-packed bipolar hypervectors.
///
/// Component `i` of a vector lives at bit `i % 64` of word `i / 64`. Bits past
/// the vector's dimension are always zero, and every kernel must keep them so.
pub trait VsaKernel: Send + Sync {
    /// The ISA level this kernel targets.
    fn isa_level(&self) -> IsaLevel;

    /// Word-wise XOR of `a` and `b` into `out`. All slices share one length.
    fn xor_bind(&self, a: &[u64], b: &[u64], out: &mut [u64]);

    /// Number of differing bits between `a` and `b`.
    fn hamming_distance(&self, a: &[u64], b: &[u64]) -> u32;

    /// Add the bipolar value (+1 for a set bit, -1 otherwise) of each of the
    /// first `acc.len()` components of `words` into `acc`.
    fn accumulate(&self, acc: &mut [i32], words: &[u64]);

    /// Rotate the first `dim` components of `data` so that component `i`
    /// moves to `(i + shift) % dim`. `out` is overwritten.
    fn rotate(&self, data: &[u64], dim: usize, shift: usize, out: &mut [u64]);
}

/// Return the best available kernel for the current CPU.
pub fn best_kernel() -> Box<dyn VsaKernel> {
    match detect_isa() {
        #[cfg(target_arch = "x86_64")]
        IsaLevel::Avx2 => Box::new(avx2::Avx2Kernel),
        _ => Box::new(generic::GenericKernel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_isa_returns_valid_level() {
        assert!(detect_isa() >= IsaLevel::Generic);
    }

    /// Shared conformance suite for every kernel implementation.
    pub fn kernel_conformance_tests(kernel: &dyn VsaKernel) {
        // XOR bind, including a length that is not a multiple of four words.
        let a = vec![u64::MAX; 7];
        let b = vec![0xAAAA_AAAA_AAAA_AAAA_u64; 7];
        let mut out = vec![0u64; 7];
        kernel.xor_bind(&a, &b, &mut out);
        assert!(out.iter().all(|&w| w == 0x5555_5555_5555_5555));

        kernel.xor_bind(&a, &a, &mut out);
        assert!(out.iter().all(|&w| w == 0));

        // Hamming distance
        let zeros = vec![0u64; 7];
        assert_eq!(kernel.hamming_distance(&a, &zeros), 7 * 64);
        assert_eq!(kernel.hamming_distance(&a, &a), 0);

        // Accumulate: bit 0 set, bit 1 clear.
        let mut acc = vec![0i32; 3];
        kernel.accumulate(&mut acc, &[0b101]);
        assert_eq!(acc, vec![1, -1, 1]);
        kernel.accumulate(&mut acc, &[0b001]);
        assert_eq!(acc, vec![2, -2, 0]);

        // Rotation within a 70-component vector wraps at the dimension.
        let mut data = vec![0u64; 2];
        data[1] = 1 << 5; // component 69
        let mut rotated = vec![0u64; 2];
        kernel.rotate(&data, 70, 1, &mut rotated);
        assert_eq!(rotated, vec![1, 0]);
        kernel.rotate(&data, 70, 0, &mut rotated);
        assert_eq!(rotated, data);
    }

    #[test]
    fn generic_kernel_conformance() {
        kernel_conformance_tests(&generic::GenericKernel);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn avx2_kernel_conformance() {
        if detect_isa() >= IsaLevel::Avx2 {
            kernel_conformance_tests(&avx2::Avx2Kernel);
        }
    }
}
