//! Portable scalar kernel.
//!
//! Works on every target and is the reference the AVX2 kernel is tested
//! against.

use super::{IsaLevel, VsaKernel};

/// Scalar word kernel, no intrinsics.
#[derive(Debug, Clone, Copy)]
pub struct GenericKernel;

impl VsaKernel for GenericKernel {
    fn isa_level(&self) -> IsaLevel {
        IsaLevel::Generic
    }

    fn xor_bind(&self, a: &[u64], b: &[u64], out: &mut [u64]) {
        debug_assert_eq!(a.len(), b.len());
        debug_assert_eq!(a.len(), out.len());
        for ((o, &av), &bv) in out.iter_mut().zip(a).zip(b) {
            *o = av ^ bv;
        }
    }

    fn hamming_distance(&self, a: &[u64], b: &[u64]) -> u32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(&av, &bv)| (av ^ bv).count_ones()).sum()
    }

    fn accumulate(&self, acc: &mut [i32], words: &[u64]) {
        debug_assert!(words.len() * 64 >= acc.len());
        for (i, slot) in acc.iter_mut().enumerate() {
            let bit = (words[i / 64] >> (i % 64)) & 1;
            *slot += if bit == 1 { 1 } else { -1 };
        }
    }

    fn rotate(&self, data: &[u64], dim: usize, shift: usize, out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        out.iter_mut().for_each(|w| *w = 0);
        if dim == 0 {
            return;
        }
        let shift = shift % dim;
        for src in 0..dim {
            if (data[src / 64] >> (src % 64)) & 1 == 1 {
                let dst = (src + shift) % dim;
                out[dst / 64] |= 1 << (dst % 64);
            }
        }
    }
}
