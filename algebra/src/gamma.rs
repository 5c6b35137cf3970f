//! Euclidean gamma matrices in the chiral-degenerate basis used by the kernels.

use crate::complex::Coefficient;
use crate::direction::Axis;

/// A 4×4 complex matrix indexed `[spin_row][spin_column]`.
pub type Matrix4 = [[Coefficient; 4]; 4];

const O: Coefficient = Coefficient::ZERO;
const P: Coefficient = Coefficient::ONE;
const M: Coefficient = Coefficient::MINUS_ONE;
const I: Coefficient = Coefficient::I;
const J: Coefficient = Coefficient::MINUS_I;

/// The 4×4 identity.
pub const IDENTITY: Matrix4 = [[P, O, O, O], [O, P, O, O], [O, O, P, O], [O, O, O, P]];

const GAMMA_X: Matrix4 = [[O, O, O, I], [O, O, I, O], [O, J, O, O], [J, O, O, O]];

const GAMMA_Y: Matrix4 = [[O, O, O, P], [O, O, M, O], [O, M, O, O], [P, O, O, O]];

const GAMMA_Z: Matrix4 = [[O, O, I, O], [O, O, O, J], [J, O, O, O], [O, I, O, O]];

const GAMMA_T: Matrix4 = [[P, O, O, O], [O, P, O, O], [O, O, M, O], [O, O, O, M]];

/// The gamma matrix associated with a lattice axis.
#[must_use]
pub fn gamma(axis: Axis) -> &'static Matrix4 {
    match axis {
        Axis::X => &GAMMA_X,
        Axis::Y => &GAMMA_Y,
        Axis::Z => &GAMMA_Z,
        Axis::T => &GAMMA_T,
    }
}

/// Entry-wise `a + factor·b`.
#[must_use]
pub fn combine(a: &Matrix4, factor: f64, b: &Matrix4) -> Matrix4 {
    let scale = Coefficient::new(factor, 0.0);
    let mut out = [[Coefficient::ZERO; 4]; 4];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, entry) in out_row.iter_mut().enumerate() {
            *entry = a[row][col] + scale * b[row][col];
        }
    }
    out
}

/// Matrix product.
#[must_use]
pub fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4 {
    let mut out = [[Coefficient::ZERO; 4]; 4];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, entry) in out_row.iter_mut().enumerate() {
            for k in 0..4 {
                *entry = *entry + a[row][k] * b[k][col];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gammas_square_to_identity() {
        for axis in Axis::ALL {
            let g = gamma(axis);
            assert_eq!(multiply(g, g), IDENTITY, "gamma_{axis:?}^2 != 1");
        }
    }

    #[test]
    fn gammas_anticommute() {
        for a in Axis::ALL {
            for b in Axis::ALL.into_iter().filter(|b| *b != a) {
                let ab = multiply(gamma(a), gamma(b));
                let ba = multiply(gamma(b), gamma(a));
                assert_eq!(combine(&ab, 1.0, &ba), [[Coefficient::ZERO; 4]; 4]);
            }
        }
    }
}
