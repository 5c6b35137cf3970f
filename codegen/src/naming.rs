//! Component → symbol naming tables.
//!
//! Pure mappings from abstract indices (spin, color, chirality block, link
//! orientation) to the identifiers the kernels use. Nothing here depends on
//! the architecture; placement decisions live in [`crate::layout`].

use tmc_algebra::Direction;

/// Real or imaginary half of a complex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// Real part.
    Re,
    /// Imaginary part.
    Im,
}

impl Part {
    /// Both parts, real first.
    pub const BOTH: [Part; 2] = [Part::Re, Part::Im];

    /// Identifier suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Part::Re => "re",
            Part::Im => "im",
        }
    }

    /// Offset of this part within an interleaved (re, im) pair.
    #[must_use]
    pub fn offset(self) -> usize {
        match self {
            Part::Re => 0,
            Part::Im => 1,
        }
    }
}

/// Storage precision of a field. Wide storage packs two scalars per vector
/// slot, narrow storage packs four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// `double2` slots.
    Double,
    /// `float4` slots.
    Single,
}

impl Precision {
    /// Double first, matching the `#ifdef *_DOUBLE` branch order.
    pub const ALL: [Precision; 2] = [Precision::Double, Precision::Single];

    /// Scalars per vector slot.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Precision::Double => 2,
            Precision::Single => 4,
        }
    }

    /// Scalar C type.
    #[must_use]
    pub fn scalar_type(self) -> &'static str {
        match self {
            Precision::Double => "double",
            Precision::Single => "float",
        }
    }

    /// Vector C type.
    #[must_use]
    pub fn vector_type(self) -> &'static str {
        match self {
            Precision::Double => "double2",
            Precision::Single => "float4",
        }
    }

    /// Suffix of the shared-memory spinor I/O macros.
    #[must_use]
    pub fn shared_io_suffix(self) -> &'static str {
        match self {
            Precision::Double => "DOUBLE2",
            Precision::Single => "FLOAT4",
        }
    }
}

const LANES: [&str; 4] = ["x", "y", "z", "w"];

/// Vector slot holding scalar `index`.
#[must_use]
pub fn slot(index: usize, precision: Precision) -> usize {
    index / precision.width()
}

/// Lane symbol of scalar `index` within its slot.
#[must_use]
pub fn lane(index: usize, precision: Precision) -> &'static str {
    LANES[index % precision.width()]
}

/// `<base><slot>.<lane>` for scalar `index` of a packed vector array.
#[must_use]
pub fn packed(base: &str, index: usize, precision: Precision) -> String {
    format!(
        "{base}{}.{}",
        slot(index, precision),
        lane(index, precision)
    )
}

/// Position of spinor component (spin, color, part) in the interleaved
/// scalar stream of a 12-complex spinor.
#[must_use]
pub fn spinor_scalar(spin: usize, color: usize, part: Part) -> usize {
    2 * (3 * spin + color) + part.offset()
}

/// Input spinor component, e.g. `i01_re`.
#[must_use]
pub fn spinor_in(spin: usize, color: usize, part: Part) -> String {
    format!("i{spin}{color}_{}", part.suffix())
}

/// Output spinor component, e.g. `o01_re`.
#[must_use]
pub fn spinor_out(spin: usize, color: usize, part: Part) -> String {
    format!("o{spin}{color}_{}", part.suffix())
}

/// Accumulator (xpay) spinor component, e.g. `acc01_re`.
#[must_use]
pub fn accumulator(spin: usize, color: usize, part: Part) -> String {
    format!("acc{spin}{color}_{}", part.suffix())
}

/// Projected half spinor: half 0 is `a`, half 1 is `b`.
#[must_use]
pub fn projected(half: usize, color: usize, part: Part) -> String {
    format!("{}{color}_{}", ["a", "b"][half], part.suffix())
}

/// Gauge-transported half spinor: half 0 is `A`, half 1 is `B`.
#[must_use]
pub fn transported(half: usize, color: usize, part: Part) -> String {
    format!("{}{color}_{}", ["A", "B"][half], part.suffix())
}

/// How a direction reads its gauge link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkForm {
    /// The link as stored (forward hops).
    Direct,
    /// The conjugate transpose of the stored link (backward hops).
    Adjoint,
}

impl LinkForm {
    /// Forward hops read the link directly, backward hops its adjoint.
    #[must_use]
    pub fn for_direction(direction: Direction) -> Self {
        if direction.is_forward() {
            LinkForm::Direct
        } else {
            LinkForm::Adjoint
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            LinkForm::Direct => "g",
            LinkForm::Adjoint => "gT",
        }
    }
}

/// Gauge link entry (row, col), e.g. `g12_im` or `gT12_im`.
#[must_use]
pub fn gauge(form: LinkForm, row: usize, col: usize, part: Part) -> String {
    format!("{}{row}{col}_{}", form.prefix(), part.suffix())
}

/// Row or column index `0..6` inside one 6×6 chiral block of the clover term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChiralIndex(pub usize);

impl ChiralIndex {
    /// All six indices.
    #[must_use]
    pub fn all() -> [ChiralIndex; 6] {
        [0, 1, 2, 3, 4, 5].map(ChiralIndex)
    }

    /// Spin within the block (0 or 1).
    #[must_use]
    pub fn spin(self) -> usize {
        self.0 / 3
    }

    /// Color (0..3).
    #[must_use]
    pub fn color(self) -> usize {
        self.0 % 3
    }
}

/// The clover term or its precomputed inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloverKind {
    /// The clover term.
    Direct,
    /// The inverse of the twisted clover term.
    Inverse,
}

impl CloverKind {
    /// Both kinds, direct first.
    pub const ALL: [CloverKind; 2] = [CloverKind::Direct, CloverKind::Inverse];

    /// Name prefix.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            CloverKind::Direct => "c",
            CloverKind::Inverse => "cinv",
        }
    }

    /// Human label used in comments.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CloverKind::Direct => "clover term",
            CloverKind::Inverse => "inverted clover term",
        }
    }
}

/// Clover entry of chiral `block` (0 or 1), e.g. `c21_30_re`.
///
/// Spins are global, so block 1 names carry spins 2 and 3.
#[must_use]
pub fn clover(
    kind: CloverKind,
    block: usize,
    row: ChiralIndex,
    col: ChiralIndex,
    part: Part,
) -> String {
    format!(
        "{}{}{}_{}{}_{}",
        kind.prefix(),
        row.spin() + 2 * block,
        row.color(),
        col.spin() + 2 * block,
        col.color(),
        part.suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_and_lane() {
        assert_eq!(packed("I", 5, Precision::Double), "I2.y");
        assert_eq!(packed("I", 5, Precision::Single), "I1.y");
        assert_eq!(packed("C", 35, Precision::Single), "C8.w");
        assert_eq!(packed("C", 35, Precision::Double), "C17.y");
    }

    #[test]
    fn spinor_names() {
        assert_eq!(spinor_in(3, 2, Part::Im), "i32_im");
        assert_eq!(spinor_out(0, 1, Part::Re), "o01_re");
        assert_eq!(accumulator(2, 0, Part::Re), "acc20_re");
        assert_eq!(projected(1, 2, Part::Re), "b2_re");
        assert_eq!(transported(0, 1, Part::Im), "A1_im");
        assert_eq!(spinor_scalar(3, 2, Part::Im), 23);
    }

    #[test]
    fn gauge_names_follow_parity() {
        let backward = Direction::ALL[3];
        let form = LinkForm::for_direction(backward);
        assert_eq!(gauge(form, 0, 2, Part::Re), "gT02_re");
        let forward = LinkForm::for_direction(Direction::ALL[2]);
        assert_eq!(gauge(forward, 0, 2, Part::Re), "g02_re");
    }

    #[test]
    fn clover_names_shift_spin_by_block() {
        let row = ChiralIndex(4);
        let col = ChiralIndex(0);
        assert_eq!(
            clover(CloverKind::Direct, 0, row, col, Part::Re),
            "c11_00_re"
        );
        assert_eq!(
            clover(CloverKind::Inverse, 1, row, col, Part::Im),
            "cinv31_20_im"
        );
    }
}
