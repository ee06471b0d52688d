// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handle spaces.
//!
//! Every entity the broker allocates is named by an opaque `u32` handle that
//! is unique within its own namespace. Each namespace gets its own newtype so
//! an object handle can never be passed where an attribute handle is expected.
//! Handle `0` is never allocated and is used on the wire as "none".

use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The unallocated handle.
            pub const NONE: Self = Self(0);

            /// Raw wire value.
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// True if this is the unallocated handle.
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(handle: $name) -> u32 {
                handle.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

define_handle!(
    /// A live federation execution.
    FederationHandle,
    "federation"
);
define_handle!(
    /// A federate, unique within its federation.
    FederateHandle,
    "federate"
);
define_handle!(ObjectClassHandle, "object-class");
define_handle!(InteractionClassHandle, "interaction-class");
define_handle!(
    /// A registered object instance.
    ObjectHandle,
    "object"
);
define_handle!(AttributeHandle, "attribute");
define_handle!(ParameterHandle, "parameter");
define_handle!(RegionHandle, "region");
define_handle!(
    /// A routing space used by data distribution regions.
    SpaceHandle,
    "space"
);

/// Monotonic handle allocator.
///
/// Handles are never reused; exhausting the `u32` space is reported as `None`
/// so callers can surface `MemoryExhausted`.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next raw handle value.
    pub fn allocate(&mut self) -> Option<u32> {
        let value = self.next;
        self.next = self.next.checked_add(1)?;
        Some(value)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_starts_at_one_and_never_repeats() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate().unwrap();
        let b = alloc.allocate().unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_allocator_exhaustion() {
        let mut alloc = HandleAllocator { next: u32::MAX - 1 };
        assert_eq!(alloc.allocate(), Some(u32::MAX - 1));
        assert_eq!(alloc.allocate(), None);
    }

    #[test]
    fn test_handle_display_and_none() {
        assert_eq!(ObjectHandle(7).to_string(), "object#7");
        assert!(FederateHandle::NONE.is_none());
        assert!(!FederateHandle(3).is_none());
    }
}
