// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-shared barrier storage
//!
//! The barrier record lives in an anonymous `MAP_SHARED` mapping created
//! before any child is forked, so every child sees the same atomics. The
//! record holds nothing but atomics: no pointers, nothing that needs dropping.
//!
//! Waiters do not block in the kernel. They poll the generation word, backing
//! off from spinning to yielding to sleeping [`PARK_INTERVAL`] between checks,
//! so a party parked for a whole stage wakes every 200µs until released.

#![allow(unsafe_code)]

use super::{Fault, Rendezvous, WaitOutcome};
use crate::error::ResourceError;
use nix::sys::mman::{mmap_anonymous, munmap, MapFlags, ProtFlags};
use std::mem::ManuallyDrop;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// "SGBR"
const MAGIC: u32 = 0x5347_4252;

const LIVE: u32 = 0;
const ABORTED: u32 = 1;

const SPIN_LIMIT: u32 = 6;
const YIELD_LIMIT: u32 = 10;
const PARK_INTERVAL: Duration = Duration::from_micros(200);

/// Owner of an anonymous shared mapping holding one `T`.
///
/// Only the owner unmaps. Forked children inherit a bitwise copy of this
/// handle but leave through `_exit`, so their copy is never dropped.
pub(crate) struct SharedRegion<T> {
    ptr: NonNull<T>,
    len: NonZeroUsize,
}

// SAFETY: the region only ever hands out `&T`, so sharing it is as safe as sharing `T`.
unsafe impl<T: Sync> Sync for SharedRegion<T> {}
// SAFETY: the mapping is not tied to the creating thread.
unsafe impl<T: Sync> Send for SharedRegion<T> {}

impl<T: Sync> SharedRegion<T> {
    /// Map a fresh shared region and move `value` into it
    pub(crate) fn new(value: T) -> Result<Self, ResourceError> {
        let len = NonZeroUsize::new(std::mem::size_of::<T>()).unwrap_or(NonZeroUsize::MIN);

        // SAFETY: a new anonymous mapping aliases no existing memory.
        let addr = unsafe {
            mmap_anonymous(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
            )
        }
        .map_err(ResourceError::SharedMap)?;

        let ptr = addr.cast::<T>();
        // SAFETY: the mapping is page aligned, writable and at least `size_of::<T>()` long.
        unsafe { ptr.as_ptr().write(value) };

        tracing::debug!(bytes = len.get(), "mapped shared region");
        Ok(Self { ptr, len })
    }

    pub(crate) fn get(&self) -> &T {
        // SAFETY: initialised in `new` and mapped until `self` goes away.
        unsafe { self.ptr.as_ref() }
    }

    /// Unmap, reporting failure instead of swallowing it like `Drop` does
    pub(crate) fn unmap(self) -> Result<(), ResourceError> {
        let region = ManuallyDrop::new(self);
        // SAFETY: `region` is consumed, so no reference into the mapping survives.
        let result = unsafe { munmap(region.ptr.cast(), region.len.get()) };
        result.map_err(ResourceError::SharedUnmap)
    }
}

impl<T> Drop for SharedRegion<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no outstanding borrows of the mapping.
        if let Err(e) = unsafe { munmap(self.ptr.cast(), self.len.get()) } {
            tracing::warn!(error = %e, "failed to unmap shared region");
        }
    }
}

/// Generation-counting barrier made of atomics only.
///
/// Waiters cannot sleep on a process-local condition variable, so they back
/// off from spinning to yielding to short sleeps until the generation moves.
#[repr(C)]
pub(crate) struct SharedBarrier {
    magic: AtomicU32,
    parties: AtomicU32,
    arrived: AtomicU32,
    state: AtomicU32,
    generation: AtomicU64,
}

impl SharedBarrier {
    pub(crate) fn new(parties: u32) -> Self {
        Self {
            magic: AtomicU32::new(MAGIC),
            parties: AtomicU32::new(parties),
            arrived: AtomicU32::new(0),
            state: AtomicU32::new(LIVE),
            generation: AtomicU64::new(0),
        }
    }

    fn check(&self) -> Result<u32, Fault> {
        if self.magic.load(Ordering::Acquire) != MAGIC {
            return Err(Fault::Corrupted);
        }
        match self.parties.load(Ordering::Relaxed) {
            0 => Err(Fault::Corrupted),
            parties => Ok(parties),
        }
    }
}

impl Rendezvous for SharedBarrier {
    fn wait(&self) -> Result<WaitOutcome, Fault> {
        let parties = self.check()?;
        if self.state.load(Ordering::Acquire) != LIVE {
            return Err(Fault::Aborted);
        }

        // Cannot move before our own arrival completes the round
        let generation = self.generation.load(Ordering::Acquire);
        let arrived = self.arrived.fetch_add(1, Ordering::AcqRel) + 1;
        if arrived > parties {
            return Err(Fault::Corrupted);
        }

        if arrived == parties {
            self.arrived.store(0, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::Release);
            return Ok(WaitOutcome::Serial);
        }

        let mut backoff = Backoff::default();
        loop {
            if self.generation.load(Ordering::Acquire) != generation {
                return Ok(WaitOutcome::Normal);
            }
            if self.state.load(Ordering::Acquire) != LIVE {
                return Err(Fault::Aborted);
            }
            self.check()?;
            backoff.snooze();
        }
    }

    fn abort(&self) {
        self.state.store(ABORTED, Ordering::Release);
    }

    fn is_aborted(&self) -> bool {
        self.state.load(Ordering::Acquire) != LIVE
    }

    fn rounds(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn waiting(&self) -> usize {
        self.arrived.load(Ordering::Acquire) as usize
    }
}

/// Both barriers of a [`DualBarrier`](super::DualBarrier), laid out in one mapping
#[repr(C)]
pub(crate) struct SharedPair {
    pub(crate) stage: SharedBarrier,
    pub(crate) gate: SharedBarrier,
}

#[derive(Default)]
struct Backoff {
    step: u32,
}

impl Backoff {
    fn snooze(&mut self) {
        if self.step <= SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                std::hint::spin_loop();
            }
        } else if self.step <= YIELD_LIMIT {
            std::thread::yield_now();
        } else {
            std::thread::sleep(PARK_INTERVAL);
            return;
        }
        self.step += 1;
    }
}
