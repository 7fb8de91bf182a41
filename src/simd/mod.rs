use std::simd::{prelude::*, SimdElement};

/// Capability trait for vectors of alignment score cells.
///
/// Gathers the lane-parallel operations the dynamic-programming kernel needs
/// beyond what the `std::simd` comparison traits already provide: saturating
/// arithmetic, so scores clamp at the cell range instead of wrapping. Not
/// meant for a prelude, to avoid conflicts with `std::simd::SimdInt`.
pub trait SimdScore<T, const N: usize>:
    SimdOrd + SimdPartialEq<Mask = Mask<<T as SimdElement>::Mask, N>>
where
    T: SimdElement,
{
    #[must_use]
    fn saturating_add(self, rhs: Self) -> Self;
    #[must_use]
    fn saturating_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_simd_score {
    ($($t:ty),*) => {
        $(
            impl<const N: usize> SimdScore<$t, N> for Simd<$t, N>
            {
                #[inline]
                fn saturating_add(self, rhs: Self) -> Self {
                    <Self as std::simd::num::SimdInt>::saturating_add(self, rhs)
                }

                #[inline]
                fn saturating_sub(self, rhs: Self) -> Self {
                    <Self as std::simd::num::SimdInt>::saturating_sub(self, rhs)
                }
            }
        )*
    };
}
impl_simd_score!(i8, i16);
