//! AVX2 (256-bit) kernel for x86_64.
//!
//! Only XOR binding is vectorised; four `u64` words fit one register and any
//! tail is handled by the scalar kernel.

use super::{IsaLevel, VsaKernel};
use super::generic::GenericKernel;

/// AVX2-accelerated word kernel.
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel;

#[cfg(target_arch = "x86_64")]
impl VsaKernel for Avx2Kernel {
    fn isa_level(&self) -> IsaLevel {
        IsaLevel::Avx2
    }

    fn xor_bind(&self, a: &[u64], b: &[u64], out: &mut [u64]) {
        debug_assert_eq!(a.len(), b.len());
        debug_assert_eq!(a.len(), out.len());

        if is_x86_feature_detected!("avx2") {
            // Safety: AVX2 support was confirmed at runtime.
            unsafe { self.xor_bind_avx2(a, b, out) }
        } else {
            GenericKernel.xor_bind(a, b, out);
        }
    }

    fn hamming_distance(&self, a: &[u64], b: &[u64]) -> u32 {
        // `count_ones` lowers to POPCNT; AVX2 has no lane popcount.
        GenericKernel.hamming_distance(a, b)
    }

    fn accumulate(&self, acc: &mut [i32], words: &[u64]) {
        GenericKernel.accumulate(acc, words);
    }

    fn rotate(&self, data: &[u64], dim: usize, shift: usize, out: &mut [u64]) {
        GenericKernel.rotate(data, dim, shift, out);
    }
}

#[cfg(target_arch = "x86_64")]
impl Avx2Kernel {
    #[target_feature(enable = "avx2")]
    unsafe fn xor_bind_avx2(&self, a: &[u64], b: &[u64], out: &mut [u64]) {
        use std::arch::x86_64::*;

        let lanes = a.len() / 4;
        for i in 0..lanes {
            let offset = i * 4;
            unsafe {
                let va = _mm256_loadu_si256(a.as_ptr().add(offset) as *const __m256i);
                let vb = _mm256_loadu_si256(b.as_ptr().add(offset) as *const __m256i);
                let result = _mm256_xor_si256(va, vb);
                _mm256_storeu_si256(out.as_mut_ptr().add(offset) as *mut __m256i, result);
            }
        }

        let tail = lanes * 4;
        GenericKernel.xor_bind(&a[tail..], &b[tail..], &mut out[tail..]);
    }
}
