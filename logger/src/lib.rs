//! Logging facade shared by the workspace crates.
//!
//! The macros forward to `defmt` or `log`, whichever the *calling* crate enables through its own
//! `defmt` / `log` features. With neither enabled they expand to nothing, so driver code can log
//! freely without pulling a backend into builds that don't want one.
#![no_std]

#[doc(hidden)]
#[macro_export]
macro_rules! __forward {
    ($level:ident, $($args:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($($args)*);
        #[cfg(feature = "log")]
        ::log::$level!($($args)*);
    }};
}

#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => { $crate::__forward!(trace, $($args)*) };
}

#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => { $crate::__forward!(debug, $($args)*) };
}

#[macro_export]
macro_rules! info {
    ($($args:tt)*) => { $crate::__forward!(info, $($args)*) };
}

#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => { $crate::__forward!(warn, $($args)*) };
}

#[macro_export]
macro_rules! error {
    ($($args:tt)*) => { $crate::__forward!(error, $($args)*) };
}
