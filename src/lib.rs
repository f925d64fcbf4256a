//! A scheduled updater that regenerates GitHub profile statistics cards and
//! commits them back to the repository when the content changed.
//!
//! One invocation performs four ordered steps: acquire credentials from the
//! environment, generate the statistics artifacts, record any file changes as
//! a revision (or skip when nothing changed), and publish the revision to the
//! remote. A missing diff is a benign outcome, never an error.

pub mod cache;
pub mod env;
pub mod framework;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod stats;
pub mod svg;

/// A shorthand to define a statically allocated variable using a [`std::sync::LazyLock`].
///
/// # Examples
///
/// ```rust
/// use std::sync::LazyLock;
/// use profile_refresh::static_lazy_lock;
///
/// static_lazy_lock!{
///     VAR_1: String = String::from("a static variable");
/// }
/// // ...equals to...
/// static VAR_2: LazyLock<String> = LazyLock::new(|| String::from("a static variable"));
/// ```
#[macro_export]
macro_rules! static_lazy_lock {
    ($(#[$meta:meta])* $vis:vis $name:ident: $type:ty = $expr:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::__priv_macro_use::LazyLock<$type> =
            $crate::__priv_macro_use::LazyLock::new(|| $expr);
    };
}

#[doc(hidden)]
pub mod __priv_macro_use {
    pub use std::sync::LazyLock;
}
