//! Lattice axes, hopping directions and the operator adjoint.

/// One of the four lattice axes. `T` is the temporal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// First spatial axis.
    X,
    /// Second spatial axis.
    Y,
    /// Third spatial axis.
    Z,
    /// Temporal axis.
    T,
}

impl Axis {
    /// All axes in lattice order.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::T];

    /// Zero-based axis index (`coord[index]`, `param.ghostDim[index]`).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::T => 3,
        }
    }

    /// Upper-case label used in kernel-type names (`EXTERIOR_KERNEL_X`).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::T => "T",
        }
    }
}

/// Sign of the gamma matrix in a projector `identity ± gamma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// `identity - gamma`
    Minus,
    /// `identity + gamma`
    Plus,
}

impl Sign {
    /// `-1.0` or `+1.0`.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Sign::Minus => -1.0,
            Sign::Plus => 1.0,
        }
    }

    /// `'-'` or `'+'`.
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Sign::Minus => '-',
            Sign::Plus => '+',
        }
    }
}

/// Whether the plain operator or its Hermitian conjugate is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adjoint {
    /// The Dslash operator itself.
    Plain,
    /// The Hermitian-conjugate ("dagger") operator.
    Dagger,
}

impl Adjoint {
    /// Both adjoints, plain first.
    pub const ALL: [Adjoint; 2] = [Adjoint::Plain, Adjoint::Dagger];

    /// Returns true for the dagger operator.
    #[must_use]
    pub fn is_dagger(self) -> bool {
        self == Adjoint::Dagger
    }
}

/// One of the eight hopping directions: even indices hop forward along an
/// axis, odd indices hop backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Direction(u8);

impl Direction {
    /// All eight directions in generation order.
    pub const ALL: [Direction; 8] = [
        Direction(0),
        Direction(1),
        Direction(2),
        Direction(3),
        Direction(4),
        Direction(5),
        Direction(6),
        Direction(7),
    ];

    /// Returns the direction with the given index, if it is below 8.
    #[must_use]
    pub fn new(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Index in `0..8`.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The axis this direction hops along.
    #[must_use]
    pub fn axis(self) -> Axis {
        Axis::ALL[self.index() / 2]
    }

    /// True for `X+1`-style hops, false for `X-1`-style hops.
    #[must_use]
    pub fn is_forward(self) -> bool {
        self.0 % 2 == 0
    }

    /// True for the two temporal directions.
    #[must_use]
    pub fn is_temporal(self) -> bool {
        self.axis() == Axis::T
    }

    /// The opposite hop along the same axis.
    #[must_use]
    pub fn partner(self) -> Direction {
        Direction(self.0 ^ 1)
    }

    /// The direction whose projector is applied when hopping along `self`.
    ///
    /// The dagger operator exchanges the projectors of each forward/backward
    /// pair.
    #[must_use]
    pub fn projector_direction(self, adjoint: Adjoint) -> Direction {
        match adjoint {
            Adjoint::Plain => self,
            Adjoint::Dagger => self.partner(),
        }
    }

    /// Sign of the gamma matrix in this direction's own projector.
    #[must_use]
    pub fn projector_sign(self) -> Sign {
        if self.is_forward() {
            Sign::Minus
        } else {
            Sign::Plus
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_and_parity() {
        assert_eq!(Direction::ALL[5].axis(), Axis::Z);
        assert!(Direction::ALL[6].is_forward());
        assert!(Direction::ALL[7].is_temporal());
        assert!(!Direction::ALL[5].is_temporal());
        assert_eq!(Direction::new(8), None);
    }

    #[test]
    fn dagger_swaps_pairs() {
        for d in Direction::ALL {
            assert_eq!(d.projector_direction(Adjoint::Plain), d);
            let swapped = d.projector_direction(Adjoint::Dagger);
            assert_eq!(swapped.axis(), d.axis());
            assert_ne!(swapped.is_forward(), d.is_forward());
        }
    }
}
