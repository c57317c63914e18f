//! Typed-damage model: discard categories as a bit set.
//!
//! Base categories are single flags; the composite categories are always
//! derived from them by union/complement and are never assigned on their own.
//! `NONE` means "unassigned/untyped" and never blocks anything.
//!
//! The affinity rule is rock-paper-scissors by top-level category: an attack
//! is blocked when it belongs to the same top-level category (recyclable /
//! non-recyclable) as the victim's own affinity. Category membership is a
//! flag-intersection test, not equality, so base-vs-composite comparisons
//! behave the same as base-vs-base ones.

use bevy::prelude::*;
use rand::Rng;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DiscardSet(pub u8);

impl DiscardSet {
    pub const NONE: Self = Self(0);
    pub const ORGANIC: Self = Self(1);
    pub const METALLIC: Self = Self(1 << 1);
    pub const PLASTIC: Self = Self(1 << 2);

    /// Metallic or plastic.
    pub const RECYCLABLE: Self = Self(Self::METALLIC.0 | Self::PLASTIC.0);

    /// Organic, plus everything that is not recyclable.
    pub const NON_RECYCLABLE: Self = Self(Self::ORGANIC.0 | !Self::RECYCLABLE.0);

    const BASES: [Self; 3] = [Self::ORGANIC, Self::METALLIC, Self::PLASTIC];

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flag containment test: do the two sets share any flag?
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// The top-level category this set belongs to.
    ///
    /// Any set touching the recyclable flags is recyclable; every other
    /// non-empty set is non-recyclable.
    #[inline]
    pub fn top_level(self) -> Self {
        if self.is_empty() {
            Self::NONE
        } else if self.intersects(Self::RECYCLABLE) {
            Self::RECYCLABLE
        } else {
            Self::NON_RECYCLABLE
        }
    }

    /// Whether damage of type `incoming` applies to a victim with this
    /// affinity. Same top-level category blocks; untyped never blocks.
    #[inline]
    pub fn damage_applies(incoming: Self, victim_affinity: Self) -> bool {
        if incoming.is_empty() || victim_affinity.is_empty() {
            return true;
        }
        incoming.top_level() != victim_affinity.top_level()
    }

    /// Uniform random base (non-composite) category.
    pub fn random_base(rng: &mut impl Rng) -> Self {
        Self::BASES[rng.gen_range(0..Self::BASES.len())]
    }
}

impl std::ops::BitOr for DiscardSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// -----------------------------------------------------------------------------
// Display metadata lookup
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct TypeEntry {
    pub ty: DiscardSet,
    pub color: Color,
}

/// Identity metadata (colors) for concrete discard types.
///
/// Lookup is first-intersecting-entry; an unknown type falls back to a
/// neutral entry so display never fails.
#[derive(Resource, Debug, Clone)]
pub struct TypePalette {
    entries: Vec<TypeEntry>,
}

impl TypePalette {
    pub fn get(&self, ty: DiscardSet) -> TypeEntry {
        self.entries
            .iter()
            .copied()
            .find(|entry| entry.ty.intersects(ty))
            .unwrap_or(TypeEntry {
                ty: DiscardSet::NONE,
                color: Color::srgb(0.6, 0.6, 0.6),
            })
    }
}

impl Default for TypePalette {
    fn default() -> Self {
        Self {
            entries: vec![
                TypeEntry { ty: DiscardSet::ORGANIC, color: Color::srgb(0.45, 0.62, 0.25) },
                TypeEntry { ty: DiscardSet::METALLIC, color: Color::srgb(0.62, 0.66, 0.72) },
                TypeEntry { ty: DiscardSet::PLASTIC, color: Color::srgb(0.92, 0.78, 0.25) },
            ],
        }
    }
}
