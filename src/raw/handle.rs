use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Index of a node slot inside an [`Arena`](super::arena::Arena).
///
/// Stored as `index + 1` so that `Option<Handle>` (used for parent links and the
/// root) costs nothing over a bare handle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        // `index + 1` is never zero and fits because `index <= MAX`.
        #[allow(clippy::cast_possible_truncation)]
        Self(NonZero::new((index + 1) as RawHandle).unwrap())
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    // Parent links are `Option<Handle>`; they must stay pointer-free and niche-packed.
    assert_eq_size!(Handle, Option<Handle>);
    assert_eq_size!(Handle, RawHandle);

    #[test]
    #[should_panic(expected = "`Handle::from_index()` - `index` > `Handle::MAX`!")]
    fn index_past_max_is_rejected() {
        let _ = Handle::from_index(Handle::MAX + 1);
    }

    #[test]
    fn first_and_last_index() {
        assert_eq!(Handle::from_index(0).to_index(), 0);
        assert_eq!(Handle::from_index(Handle::MAX).to_index(), Handle::MAX);
        assert_ne!(Handle::from_index(0), Handle::from_index(1));
    }

    proptest! {
        #[test]
        fn index_survives_handle(index in 0..=Handle::MAX) {
            prop_assert_eq!(Handle::from_index(index).to_index(), index);
        }
    }
}
