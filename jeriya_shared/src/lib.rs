//! Third-party crates that are shared between the jeriya crates.
//!
//! The other crates use these re-exports instead of depending on the crates directly
//! so that the whole workspace agrees on a single version of each.

pub use chrono;
pub use crossbeam_channel;
pub use log;
pub use parking_lot;
pub use thiserror;
pub use tracy_client;
pub use walkdir;

/// Name of the function this macro is called in
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}
