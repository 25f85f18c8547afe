//! Aliasing partition over an argument tuple.
//!
//! Kernels may fold loads, reorder stores, or write in place depending on
//! whether arguments share storage, so the partition participates in the
//! specialization key.

use skala_tensor::Tensor;

use crate::key::SpecializationKey;

/// Storage relation between two arguments: `0` = disjoint, `+1` = strict
/// alias (same storage, sizes, strides, and offset), `-1` = overlapping
/// storage without strict equality.
pub fn alias_kind(a: &Tensor, b: &Tensor) -> i8 {
    if !a.is_alias_of(b) {
        0
    } else if a.is_set_to(b) {
        1
    } else {
        // TODO: prove non-overlap for disjoint views of one storage and
        // return 0 for them.
        -1
    }
}

/// Partition the tuple by storage sharing.
///
/// Group ids are assigned in order of first appearance. The first member of
/// a group is always recorded with the positive id; later members carry the
/// id multiplied by their alias kind relative to that first member.
pub fn compute_alias_groups<const N: usize>(args: &[Tensor; N]) -> [i8; N] {
    let mut groups = [0i8; N];
    let mut current_id = 0i8;
    for i in 0..N {
        if groups[i] != 0 {
            continue;
        }
        for j in i + 1..N {
            let kind = alias_kind(&args[i], &args[j]);
            if kind != 0 {
                if groups[i] == 0 {
                    current_id += 1;
                    groups[i] = current_id;
                }
                groups[j] = current_id * kind;
            }
        }
    }
    groups
}

/// Build the key tuple for one call. Only the final argument carries the
/// `out` marker.
pub fn compute_key<const N: usize, const MAX_DIMS: usize>(
    args: &[Tensor; N],
    has_out: bool,
) -> [SpecializationKey<MAX_DIMS>; N] {
    let groups = compute_alias_groups(args);
    std::array::from_fn(|i| SpecializationKey::new(&args[i], groups[i], i + 1 == N && has_out))
}
