macro_rules! enum_sim {
    (
        $(#[$enum_attr: meta])*
        pub struct $tname:ident ($size_t:ty) {
            $(
                $(#[$arm_attr: meta])*
                $enum_arm:ident = $num_exp:expr
            ),+ $(,)?
        }
    ) => {
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
        $(#[$enum_attr])*
        pub struct $tname($size_t);

        impl $tname {
            $(
                $(#[$arm_attr])*
                pub const $enum_arm: Self = Self($num_exp);
            )+

            /// Get the raw value.
            #[inline]
            pub fn raw(&self) -> $size_t {
                self.0
            }
        }

        impl ::core::convert::From<$size_t> for $tname {
            #[inline]
            fn from(value: $size_t) -> $tname {
                $tname(value)
            }
        }

        impl ::core::convert::From<$tname> for $size_t {
            #[inline]
            fn from(value: $tname) -> $size_t {
                value.0
            }
        }
    };
}

macro_rules! flag_set {
    (
        $(#[$set_attr: meta])*
        pub struct $tname:ident ($size_t:ty) {
            $(
                $(#[$flag_attr: meta])*
                $flag:ident = $val:expr
            ),+ $(,)?
        }
    ) => {
        #[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
        $(#[$set_attr])*
        pub struct $tname($size_t);

        impl $tname {
            $(
                $(#[$flag_attr])*
                pub const $flag: Self = Self($val);
            )+

            /// An empty set.
            pub const EMPTY: Self = Self(0);

            #[inline]
            pub fn bits(&self) -> $size_t {
                self.0
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0 == 0
            }

            /// Check whether every bit of `other` is set in `self`.
            #[inline]
            pub fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Check whether `self` and `other` share at least one bit.
            #[inline]
            pub fn intersects(&self, other: Self) -> bool {
                self.0 & other.0 != 0
            }
        }

        impl ::core::ops::BitOr for $tname {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl ::core::ops::BitOrAssign for $tname {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

macro_rules! header_field_val_accessors {
    ( $(($get_val: ident, $get_val_mut: ident, $val: literal $(,)?)),* $(,)? ) => {
        $(
            #[inline]
            fn $get_val(buf: &[u8]) -> &u8 {
                &buf[$val]
            }

            #[inline]
            fn $get_val_mut(buf: &mut [u8]) -> &mut u8 {
                &mut buf[$val]
            }
        )*
    };
}

macro_rules! header_field_range_accessors {
    ( $(($get_range: ident, $get_range_mut: ident, $left: literal..$right: literal $(,)?)),* $(,)? ) => {
        $(
            #[inline]
            fn $get_range(buf: &[u8]) -> &[u8] {
                &buf[$left..$right]
            }

            #[inline]
            fn $get_range_mut(buf: &mut [u8]) -> &mut [u8] {
                &mut buf[$left..$right]
            }
        )*
    };
}
