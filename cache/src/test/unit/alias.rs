use crate::alias::{alias_kind, compute_alias_groups, compute_key};
use crate::test::helpers::vector;

#[test]
fn test_alias_kind() {
    let a = vector(16);
    let b = vector(16);
    assert_eq!(alias_kind(&a, &b), 0);
    assert_eq!(alias_kind(&a, &a.clone()), 1);

    let view = a.as_strided(&[4], &[2], 0).unwrap();
    assert_eq!(alias_kind(&a, &view), -1);
    assert_eq!(alias_kind(&view, &view.clone()), 1);
}

#[test]
fn test_disjoint_arguments_stay_unaliased() {
    let args = [vector(4), vector(4), vector(4)];
    assert_eq!(compute_alias_groups(&args), [0, 0, 0]);
}

/// Same tensor passed twice forms a strict group; an unrelated third
/// argument stays unaliased.
#[test]
fn test_strict_alias_group() {
    let a = vector(16);
    let args = [a.clone(), a.clone(), vector(16)];
    assert_eq!(compute_alias_groups(&args), [1, 1, 0]);
}

/// A restrided view shares storage without strict equality, so it joins the
/// group with a negated id.
#[test]
fn test_overlapping_alias_group() {
    let base = vector(16);
    let view = base.as_strided(&[4], &[2], 0).unwrap();
    let args = [base, view];
    assert_eq!(compute_alias_groups(&args), [1, -1]);
}

#[test]
fn test_group_ids_in_order_of_first_appearance() {
    let a = vector(16);
    let b = vector(16);
    let b_view = b.as_strided(&[2], &[3], 0).unwrap();
    let args = [a.clone(), b.clone(), a.clone(), b_view];
    assert_eq!(compute_alias_groups(&args), [1, 2, 1, -2]);
}

#[test]
fn test_out_marker_applies_to_last_argument_only() {
    let args = [vector(4), vector(4), vector(4)];

    let keys = compute_key::<3, 2>(&args, true);
    assert!(!keys[0].is_out());
    assert!(!keys[1].is_out());
    assert!(keys[2].is_out());

    let keys = compute_key::<3, 2>(&args, false);
    assert!(keys.iter().all(|key| !key.is_out()));
}

#[test]
fn test_alias_groups_flow_into_keys() {
    let a = vector(4);
    let aliased = [a.clone(), a.clone(), vector(4)];
    let keys = compute_key::<3, 2>(&aliased, true);
    assert_eq!(keys[0].alias_group(), 1);
    assert_eq!(keys[1].alias_group(), 1);
    assert_eq!(keys[2].alias_group(), 0);

    let disjoint = [vector(4), vector(4), vector(4)];
    assert_ne!(keys, compute_key::<3, 2>(&disjoint, true));
}
