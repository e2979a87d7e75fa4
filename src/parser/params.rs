//! Bounded CSI/OSC argument vectors.

use smallvec::SmallVec;

/// CSI arguments are capped at 5 (SPEC_FULL §4.2); additional
/// `;`-separated values are discarded with a trace.
pub const MAX_CSI_ARGS: usize = 5;

pub type CsiParams = SmallVec<[i64; MAX_CSI_ARGS]>;
pub type OscParams = SmallVec<[i64; 4]>;

pub fn arg_or(params: &CsiParams, index: usize, default: i64) -> i64 {
    match params.get(index) {
        Some(&v) if v != 0 => v,
        _ => default,
    }
}

pub fn arg_or_zero_ok(params: &CsiParams, index: usize, default: i64) -> i64 {
    params.get(index).copied().unwrap_or(default)
}
