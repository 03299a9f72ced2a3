//! Property-based tests for the kernel invariants.

use crate::{contract, permute};
use proptest::prelude::*;
use tensal_core::labels::parse_indices;
use tensal_core::DenseData;

fn matrix() -> impl Strategy<Value = DenseData> {
    (1usize..5, 1usize..5)
        .prop_flat_map(|(r, c)| {
            proptest::collection::vec(-10.0f64..10.0, r * c).prop_map(move |vals| {
                DenseData::from_vec(vals, &[r, c]).unwrap()
            })
        })
}

proptest! {
    // A pure relabeling preserves the Frobenius norm.
    #[test]
    fn prop_permute_preserves_norm(a in matrix()) {
        let mut c = DenseData::zeros(&[a.shape()[1], a.shape()[0]]);
        permute(&mut c, &a, &parse_indices("ji"), &parse_indices("ij"), 1.0, 0.0).unwrap();
        let na = a.norm(2.0);
        let nc = c.norm(2.0);
        prop_assert!((na - nc).abs() <= 1e-12 * na.max(1.0));
    }

    // Transposing twice is the identity.
    #[test]
    fn prop_permute_roundtrip(a in matrix()) {
        let mut t = DenseData::zeros(&[a.shape()[1], a.shape()[0]]);
        permute(&mut t, &a, &parse_indices("ji"), &parse_indices("ij"), 1.0, 0.0).unwrap();
        let mut back = DenseData::zeros(a.shape());
        permute(&mut back, &t, &parse_indices("ij"), &parse_indices("ji"), 1.0, 0.0).unwrap();
        prop_assert_eq!(a.data(), back.data());
    }

    // The full contraction of A with itself is the squared Frobenius norm.
    #[test]
    fn prop_contract_self_inner_product(a in matrix()) {
        let mut s = DenseData::zeros(&[]);
        contract(
            &mut s,
            &a,
            &a,
            &parse_indices(""),
            &parse_indices("ij"),
            &parse_indices("ij"),
            1.0,
            0.0,
        )
        .unwrap();
        let n = a.norm(2.0);
        prop_assert!((s.data()[0] - n * n).abs() <= 1e-9 * (n * n).max(1.0));
    }

    // Contracting against an identity matrix is a no-op.
    #[test]
    fn prop_contract_identity(a in matrix()) {
        let n = a.shape()[1];
        let mut eye = DenseData::zeros(&[n, n]);
        for i in 0..n {
            eye[&[i, i]] = 1.0;
        }
        let mut c = DenseData::zeros(a.shape());
        contract(
            &mut c,
            &a,
            &eye,
            &parse_indices("ij"),
            &parse_indices("ik"),
            &parse_indices("kj"),
            1.0,
            0.0,
        )
        .unwrap();
        for (x, y) in a.data().iter().zip(c.data().iter()) {
            prop_assert!((x - y).abs() <= 1e-12);
        }
    }
}
