//! AVM Object - the dynamic object model of the script runtime.
//!
//! This crate provides:
//! - Reference-counted scripted objects in an arena heap (`ObjectHeap`, `ObjectId`)
//! - Level-aware variable tables with numeric slots (`VariableTable`)
//! - The property-access API used by the interpreter (`get_property`, `set_property`, ...)
//! - Per-type object pools (`Manager`)
//! - Coercions and the `==` / `<` operators
//!
//! # Levels
//!
//! A class hierarchy is flattened into numbered levels: level 0 is the root
//! ancestor, each subclass adds one. Every declaration in a variable table is
//! tagged with the level of the class that made it, and each object carries
//! the level its next property access is evaluated at (`cur_level`).
//!
//! # Errors
//!
//! See [`ObjectError`] for the split between invariant violations and
//! script-visible runtime errors.

mod access;
mod compare;
mod config;
mod errors;
mod function;
mod heap;
mod object;
mod pool;
mod refcount;
mod slot;
mod table;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use access::Resolved;
pub use config::HeapConfig;
pub use errors::{ObjectError, ObjectErrorKind, ObjectResult};
pub use function::{FunctionObject, NativeFunction};
pub use heap::{HeapStats, ObjectHeap};
pub use object::{ClassInfo, ObjectFlags, ObjectId, ObjectKind, ObjectTag, ScriptObject};
pub use pool::{Manager, ManagerId, OnRelease, Poolable, Release};
pub use refcount::{RefCount, Transition};
pub use slot::{Declared, MemberSlot, Readable};
pub use table::{EntryId, EntryView, Found, NsQuery, VariableTable};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=avm_object=debug` or
/// `RUST_LOG=avm_object=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
