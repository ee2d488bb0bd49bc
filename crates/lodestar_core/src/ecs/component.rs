//! # Component Types and Signatures
//!
//! Components are pure data containers with no behavior. Each distinct
//! component type gets a small integer id at registration time, and that id
//! is the bit it occupies in a [`Signature`].

use std::fmt;

use lodestar_shared::MAX_COMPONENT_TYPES;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Clone`: entities can be duplicated with all their components
/// - `'static`: storages are looked up by `TypeId`
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default)]
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: Clone + 'static {}

/// Runtime id of a registered component type (0-63).
///
/// Allocated once per type, monotonically increasing, never reused within
/// a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentType(u8);

impl ComponentType {
    /// Wraps a raw id. Returns `None` if it does not fit in a signature.
    #[must_use]
    pub fn new(id: usize) -> Option<Self> {
        if id < MAX_COMPONENT_TYPES {
            u8::try_from(id).ok().map(Self)
        } else {
            None
        }
    }

    /// The bit index this type occupies in a [`Signature`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bitmask of attached components (up to 64 component types).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature(u64);

impl Signature {
    /// The empty signature.
    pub const EMPTY: Self = Self(0);

    /// Creates a signature from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Builds a signature from a list of component types.
    #[must_use]
    pub fn of(types: &[ComponentType]) -> Self {
        types.iter().fold(Self::EMPTY, |sig, &ty| sig.with(ty))
    }

    /// Returns a copy with `ty` set.
    #[inline]
    #[must_use]
    pub const fn with(self, ty: ComponentType) -> Self {
        Self(self.0 | (1 << ty.0))
    }

    /// Returns a copy with `ty` cleared.
    #[inline]
    #[must_use]
    pub const fn without(self, ty: ComponentType) -> Self {
        Self(self.0 & !(1 << ty.0))
    }

    /// Sets the bit of `ty`.
    #[inline]
    pub fn insert(&mut self, ty: ComponentType) {
        *self = self.with(ty);
    }

    /// Clears the bit of `ty`.
    #[inline]
    pub fn remove(&mut self, ty: ComponentType) {
        *self = self.without(ty);
    }

    /// Checks if the bit of `ty` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, ty: ComponentType) -> bool {
        self.0 & (1 << ty.0) != 0
    }

    /// True if every bit of `self` is also set in `other`.
    #[inline]
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & other.0 == self.0
    }

    /// True if the two signatures share at least one bit.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// True if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#066b})", self.0)
    }
}
