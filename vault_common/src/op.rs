/// Implements the standard arithmetic operator traits for a single-field newtype.
///
/// `op!(binary T, Add, add)` expands to `impl Add for T`, and similarly for the
/// `inplace` (e.g. `AddAssign`) and `unary` (e.g. `Neg`) forms.
#[macro_export]
macro_rules! op {
    (binary $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            fn $method(&mut self, rhs: Self) {
                std::ops::$trait::$method(&mut self.0, rhs.0)
            }
        }
    };
    (unary $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0))
            }
        }
    };
}
