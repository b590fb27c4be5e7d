//! Saved fiber state and the context-switch primitive.
//!
//! A fiber context is just the stack pointer of a suspended fiber; everything
//! else lives in the callee-saved frame that `fiber_switch` pushes on the
//! fiber's own stack. Switching saves the current frame into `from`, loads
//! `to`, and returns into whatever call site (or bootstrap trampoline) last
//! saved `to`.

// Layer 1: Standard library imports
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use std::arch::naked_asm;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
// (none)

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("filament-rt supports x86_64 and aarch64 targets only");

/// Saved state of a suspended fiber.
///
/// The struct is `repr(C)` because the switch routine stores the stack
/// pointer through the struct's first (and only) field.
#[repr(C)]
#[derive(Debug)]
pub struct FiberContext {
    sp: usize,
}

/// Size of the bootstrap frame laid out by [`FiberContext::bootstrap`].
///
/// x86_64: 6 callee-saved registers + return slot + alignment pad.
/// aarch64: x19-x28, fp, lr and d8-d15.
#[cfg(target_arch = "x86_64")]
const BOOT_FRAME: usize = 64;
#[cfg(target_arch = "aarch64")]
const BOOT_FRAME: usize = 160;

impl FiberContext {
    /// A context that will be filled in by the first switch away from it.
    /// Used for the scheduler's own (OS-provided) stack.
    pub fn root() -> Self {
        FiberContext { sp: 0 }
    }

    /// Prepare a fresh fiber so that the first switch into it enters
    /// `entry` on the stack topped at `stack_high`.
    ///
    /// The frame mimics a suspension inside `fiber_switch`: callee-saved
    /// slots are zeroed and the return slot points at `entry`. `entry` never
    /// returns; it must switch away for good instead.
    ///
    /// # Safety
    /// `stack_high` must be the high end of a live, 16-aligned stack region
    /// at least `BOOT_FRAME + 16` bytes long, exclusively owned by this
    /// fiber.
    pub unsafe fn bootstrap(stack_high: usize, entry: extern "C" fn() -> !) -> Self {
        let top = stack_high & !15usize;
        let frame = (top - BOOT_FRAME) as *mut u64;
        for i in 0..(BOOT_FRAME / 8) {
            frame.add(i).write(0);
        }
        #[cfg(target_arch = "x86_64")]
        {
            // Layout, low to high: r15 r14 r13 r12 rbx rbp [entry] [pad].
            // The six pops plus `ret` in fiber_switch land in `entry` with
            // rsp ≡ 8 (mod 16), exactly as after a call instruction.
            frame.add(6).write(entry as usize as u64);
        }
        #[cfg(target_arch = "aarch64")]
        {
            // Layout matches the stp sequence in fiber_switch; the lr slot
            // at offset 88 makes `ret` branch into `entry` with sp at `top`.
            frame.add(11).write(entry as usize as u64);
        }
        FiberContext { sp: frame as usize }
    }

    /// Whether this context has ever been saved or bootstrapped.
    pub fn is_armed(&self) -> bool {
        self.sp != 0
    }
}

/// Swap execution from one fiber to another.
///
/// Saves the callee-saved register file and stack pointer into `from`, then
/// restores `to` and resumes wherever `to` last suspended (or its bootstrap
/// entry). Returns when some later switch targets `from` again.
///
/// # Safety
/// Both pointers must reference valid, distinct contexts; `to` must have
/// been armed by a previous save or by [`FiberContext::bootstrap`]; the
/// stacks backing both contexts must outlive the suspension. No references
/// into runtime-owned state may be held across the call.
#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
pub unsafe extern "C" fn fiber_switch(from: *mut FiberContext, to: *const FiberContext) {
    naked_asm!(
        "push rbp",
        "push rbx",
        "push r12",
        "push r13",
        "push r14",
        "push r15",
        "mov qword ptr [rdi], rsp",
        "mov rsp, qword ptr [rsi]",
        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop rbx",
        "pop rbp",
        "ret",
    )
}

/// Swap execution from one fiber to another (aarch64 variant).
///
/// # Safety
/// See the x86_64 variant.
#[cfg(target_arch = "aarch64")]
#[unsafe(naked)]
pub unsafe extern "C" fn fiber_switch(from: *mut FiberContext, to: *const FiberContext) {
    naked_asm!(
        "sub sp, sp, #160",
        "stp x19, x20, [sp, #0]",
        "stp x21, x22, [sp, #16]",
        "stp x23, x24, [sp, #32]",
        "stp x25, x26, [sp, #48]",
        "stp x27, x28, [sp, #64]",
        "stp x29, x30, [sp, #80]",
        "stp d8,  d9,  [sp, #96]",
        "stp d10, d11, [sp, #112]",
        "stp d12, d13, [sp, #128]",
        "stp d14, d15, [sp, #144]",
        "mov x2, sp",
        "str x2, [x0]",
        "ldr x2, [x1]",
        "mov sp, x2",
        "ldp x19, x20, [sp, #0]",
        "ldp x21, x22, [sp, #16]",
        "ldp x23, x24, [sp, #32]",
        "ldp x25, x26, [sp, #48]",
        "ldp x27, x28, [sp, #64]",
        "ldp x29, x30, [sp, #80]",
        "ldp d8,  d9,  [sp, #96]",
        "ldp d10, d11, [sp, #112]",
        "ldp d12, d13, [sp, #128]",
        "ldp d14, d15, [sp, #144]",
        "add sp, sp, #160",
        "ret",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct SwitchFixture {
        main: FiberContext,
        fiber: FiberContext,
        hops: u32,
    }

    thread_local! {
        static FIXTURE: RefCell<Option<SwitchFixture>> = const { RefCell::new(None) };
    }

    extern "C" fn bounce_entry() -> ! {
        // Ping-pong back to the main context twice, then park forever.
        for _ in 0..2 {
            let (from, to) = FIXTURE.with(|f| {
                let mut guard = f.borrow_mut();
                let fx = guard.as_mut().unwrap();
                fx.hops += 1;
                (
                    &mut fx.fiber as *mut FiberContext,
                    &fx.main as *const FiberContext,
                )
            });
            unsafe { fiber_switch(from, to) };
        }
        unreachable!("fiber resumed after parking");
    }

    #[test]
    fn test_bootstrap_and_round_trip_switch() {
        let mut arena = crate::stack::StackArena::new(0);
        let stack = crate::stack::StackSegment::allocate(&mut arena, 64 * 1024, true).unwrap();

        let fiber = unsafe { FiberContext::bootstrap(stack.high(), bounce_entry) };
        assert!(fiber.is_armed());
        FIXTURE.with(|f| {
            *f.borrow_mut() = Some(SwitchFixture {
                main: FiberContext::root(),
                fiber,
                hops: 0,
            });
        });

        for expected in 1..=2u32 {
            let (from, to) = FIXTURE.with(|f| {
                let mut guard = f.borrow_mut();
                let fx = guard.as_mut().unwrap();
                (
                    &mut fx.main as *mut FiberContext,
                    &fx.fiber as *const FiberContext,
                )
            });
            unsafe { fiber_switch(from, to) };
            let hops = FIXTURE.with(|f| f.borrow().as_ref().unwrap().hops);
            assert_eq!(hops, expected);
        }

        // The fiber is parked inside its second suspension; it never runs
        // again, so its stack can be released.
        FIXTURE.with(|f| *f.borrow_mut() = None);
        stack.release(&mut arena);
    }

    #[test]
    fn test_root_context_is_unarmed() {
        assert!(!FiberContext::root().is_armed());
    }
}
