use core::ops::{Add, Div, Mul};

macro_rules! constrained_f64 {
    ( $name:ident, $closure:tt, $msg:expr ) => {
        #[derive(Debug, Copy, Clone, PartialEq)]
        pub struct $name(f64);

        impl $name {
            pub fn new(x: f64) -> Self {
                assert!(($closure)(x), $msg);
                Self(x)
            }

            pub fn unwrap(self) -> f64 {
                self.0
            }

            pub fn ln(self) -> f64 {
                self.0.ln()
            }
        }

        impl Add<f64> for $name {
            type Output = f64;

            fn add(self, other: f64) -> f64 {
                self.0 + other
            }
        }

        impl Add<$name> for f64 {
            type Output = f64;

            fn add(self, other: $name) -> f64 {
                self + other.0
            }
        }

        impl Mul<f64> for $name {
            type Output = f64;

            fn mul(self, other: f64) -> f64 {
                self.0 * other
            }
        }

        impl Mul<$name> for f64 {
            type Output = f64;

            fn mul(self, other: $name) -> f64 {
                self * other.0
            }
        }

        impl Div<f64> for $name {
            type Output = f64;

            fn div(self, other: f64) -> f64 {
                self.0 / other
            }
        }

        impl Div<$name> for f64 {
            type Output = f64;

            fn div(self, other: $name) -> f64 {
                self / other.0
            }
        }
    };
}

constrained_f64!(
    Mass,
    (|x: f64| x > 0.0 && x.is_finite()),
    "Mass must be greater than zero."
);

constrained_f64!(
    Concentration,
    (|x: f64| x > 0.0 && x.is_finite()),
    "Concentration must be greater than zero."
);

constrained_f64!(
    Smoothing,
    (|x: f64| x > 0.0 && x.is_finite()),
    "Smoothing must be greater than zero."
);
