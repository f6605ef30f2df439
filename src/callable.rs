//! Fixed-footprint, type-erased callable slot.
//!
//! A [`Callable`] holds at most one closure inline, in `N` bytes of
//! [`SLOT_ALIGN`]-aligned storage, together with two trampolines: one to
//! invoke the target and one to destroy it.  Nothing is ever heap-allocated.
//!
//! ```text
//!   Callable<'a, fn(&A) -> R, N>
//!   ┌──────────────────────────┬──────────────────────────┐
//!   │ storage: [u8; N] align 8 │ vtable: Option<{call,    │
//!   │ (the closure, in place)  │          drop}>          │
//!   └──────────────────────────┴──────────────────────────┘
//! ```
//!
//! The signature is named with a fn-pointer type (`fn(&A) -> R`), which keeps
//! argument lifetimes higher-ranked and out of the slot's own type.
//! Size and alignment of the target are checked at compile time; an
//! oversized closure fails the build, it never fails at runtime.
//!
//! Targets are `Fn` closures invoked through `&self`, so a slot may be
//! re-entered while it is already running.  Mutable state belongs in `Cell`s
//! captured by the target.
//!
//! Rust moves are plain relocations, so there is no move trampoline.  Moving
//! a target *out* of a slot while leaving the slot behind is done with
//! [`Callable::take`], after which the source is empty.

use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ptr;

/// Default slot footprint: two pointer widths.
pub const DEFAULT_FOOTPRINT: usize = 2 * mem::size_of::<usize>();

/// Alignment guaranteed for the inline storage of every slot.
pub const SLOT_ALIGN: usize = 8;

/// A callable signature, spelled as a fn-pointer type.
///
/// Implemented for the shapes the port framework needs:
/// `fn() -> R`, `fn(&A) -> R`, `fn(&mut A) -> R`, `fn(&A, &B) -> R` and
/// `fn(&A, &mut B) -> R`.
pub trait Signature {
    /// Type-erased invoker: first argument is the address of the target.
    type Trampoline: Copy;
}

#[repr(C, align(8))]
struct Storage<const N: usize>(UnsafeCell<[MaybeUninit<u8>; N]>);

impl<const N: usize> Storage<N> {
    const fn uninit() -> Self {
        Self(UnsafeCell::new([MaybeUninit::uninit(); N]))
    }

    fn as_ptr(&self) -> *mut u8 {
        self.0.get().cast()
    }
}

struct VTable<S: Signature> {
    call: S::Trampoline,
    drop: unsafe fn(*mut u8),
}

impl<S: Signature> Clone for VTable<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Signature> Copy for VTable<S> {}

/// Inline storage for one closure of signature `S`, at most `N` bytes.
///
/// The slot is `!Send` and `!Sync`: targets may capture `Cell`s and other
/// single-threaded state.
pub struct Callable<'a, S: Signature, const N: usize = DEFAULT_FOOTPRINT> {
    storage: Storage<N>,
    vtable: Option<VTable<S>>,
    _marker: PhantomData<(&'a (), *mut ())>,
}

impl<'a, S: Signature, const N: usize> Callable<'a, S, N> {
    /// An empty slot.  Invoking it panics.
    pub const fn empty() -> Self {
        Self {
            storage: Storage::uninit(),
            vtable: None,
            _marker: PhantomData,
        }
    }

    /// Whether the slot currently holds a target.
    pub fn is_valid(&self) -> bool {
        self.vtable.is_some()
    }

    /// Move the target out, leaving this slot empty.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }

    /// Destroy the target, if any.
    pub fn clear(&mut self) {
        drop(self.take());
    }

    /// Move the target into a slot with an equal or larger footprint.
    ///
    /// Narrowing is rejected at compile time.
    pub fn widen<const M: usize>(self) -> Callable<'a, S, M> {
        const { assert!(N <= M, "cannot move a callable into a smaller slot") };

        let mut this = self;
        let mut wide = Callable::<'a, S, M>::empty();
        if let Some(vtable) = this.vtable.take() {
            // SAFETY: `this` held a live target in its first `N` bytes; M >= N
            // and both storages share SLOT_ALIGN.  Ownership moves with the
            // vtable, and `this` is now empty so its Drop will not run the
            // destructor a second time.
            unsafe {
                ptr::copy_nonoverlapping(this.storage.as_ptr(), wide.storage.as_ptr(), N);
            }
            wide.vtable = Some(vtable);
        }
        wide
    }

    fn emplace<F: 'a>(target: F, call: S::Trampoline) -> Self {
        const {
            assert!(mem::size_of::<F>() <= N, "callable target exceeds the slot footprint");
            assert!(mem::align_of::<F>() <= SLOT_ALIGN, "callable target is over-aligned for the slot");
        }

        let mut slot = Self::empty();
        // SAFETY: size and alignment of F were checked above against the
        // storage, which is uninitialised and owned by `slot`.
        unsafe { slot.storage.as_ptr().cast::<F>().write(target) };
        slot.vtable = Some(VTable {
            call,
            drop: drop_target::<F>,
        });
        slot
    }

    fn vtable(&self) -> VTable<S> {
        match self.vtable {
            Some(vtable) => vtable,
            None => empty_slot(),
        }
    }
}

impl<S: Signature, const N: usize> Drop for Callable<'_, S, N> {
    fn drop(&mut self) {
        if let Some(vtable) = self.vtable.take() {
            // SAFETY: the vtable is only present while storage holds the
            // target it was built for.
            unsafe { (vtable.drop)(self.storage.as_ptr()) }
        }
    }
}

impl<S: Signature, const N: usize> Default for Callable<'_, S, N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature, const N: usize> fmt::Debug for Callable<'_, S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("footprint", &N)
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cold]
#[track_caller]
fn empty_slot() -> ! {
    panic!("invoked an empty callable slot")
}

unsafe fn drop_target<F>(target: *mut u8) {
    // SAFETY: caller guarantees `target` points at a live, aligned F.
    unsafe { ptr::drop_in_place(target.cast::<F>()) }
}

macro_rules! signature_shape {
    ($trampoline:ident <$($g:ident),*> ($($arg:ident: $ty:ty),*)) => {
        impl<$($g: ?Sized,)* R> Signature for fn($($ty),*) -> R {
            type Trampoline = unsafe fn(*const u8 $(, $ty)*) -> R;
        }

        unsafe fn $trampoline<F, $($g: ?Sized,)* R>(target: *const u8 $(, $arg: $ty)*) -> R
        where
            F: Fn($($ty),*) -> R,
        {
            // SAFETY: caller guarantees `target` points at a live, aligned F.
            unsafe { (*target.cast::<F>())($($arg),*) }
        }

        impl<'a, $($g: ?Sized,)* R, const N: usize> Callable<'a, fn($($ty),*) -> R, N> {
            /// Build a slot around `target`.
            pub fn new<F>(target: F) -> Self
            where
                F: Fn($($ty),*) -> R + 'a,
            {
                Self::emplace(target, $trampoline::<F, $($g,)* R> as unsafe fn(*const u8 $(, $ty)*) -> R)
            }

            /// Invoke the target.  Re-entrant calls are allowed.
            ///
            /// # Panics
            ///
            /// Panics if the slot is empty.
            #[track_caller]
            pub fn call(&self $(, $arg: $ty)*) -> R {
                let call = self.vtable().call;
                // SAFETY: the vtable was built for the target in storage, and
                // the target is only ever reached through `&F` while stored.
                unsafe { call(self.storage.as_ptr() $(, $arg)*) }
            }
        }
    };
}

signature_shape!(call_nullary <> ());
signature_shape!(call_ref <A> (a: &A));
signature_shape!(call_mut <A> (a: &mut A));
signature_shape!(call_ref_ref <A, B> (a: &A, b: &B));
signature_shape!(call_ref_mut <A, B> (a: &A, b: &mut B));
