/*
    vgamem
    Video adapter memory subsystem

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    timing.rs

    Models adapter wait-states by debiting the CPU's cycle budget.

*/

/// Divisor applied to the CPU cycle ceiling for each CGA access on the slow CGA path.
/// 1024 / 2.8, truncated.
pub const SLOW_CGA_DIVISOR: i64 = 365;

/// Duration of one write to the PC-98 wait port, in tenths of a microsecond.
pub const PC98_WAIT_PORT_TENTHS_US: i64 = 6;

/// The CPU's cycle counters, shared with the CPU core. The CPU sets `cycle_max` and `cycles`
/// before each slice; handlers debit `cycles` and account the debit in `io_delay_removed`
/// so the scheduler can return it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleBudget {
    pub cycle_max: i64,
    pub cycles: i64,
    pub io_delay_removed: i64,
}

impl CycleBudget {
    pub fn new(cycle_max: i64) -> Self {
        Self {
            cycle_max,
            cycles: cycle_max,
            io_delay_removed: 0,
        }
    }

    #[inline]
    pub fn debit(&mut self, cycles: i64) {
        self.cycles -= cycles;
        self.io_delay_removed += cycles;
    }
}

/// The per-access VRAM delay. Writes are cheaper than reads, at three quarters of the read cost.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MemIoDelay {
    pub delay_ns: i64,
}

impl MemIoDelay {
    pub fn new(delay_ns: u32) -> Self {
        Self {
            delay_ns: delay_ns as i64,
        }
    }

    pub fn read_cycles(&self, budget: &CycleBudget) -> i64 {
        budget.cycle_max * self.delay_ns / 1_000_000
    }

    pub fn write_cycles(&self, budget: &CycleBudget) -> i64 {
        (budget.cycle_max * self.delay_ns * 3) / (1_000_000 * 4)
    }

    #[inline]
    pub fn delay_read(&self, budget: &mut CycleBudget) {
        if self.delay_ns > 0 {
            let cycles = self.read_cycles(budget);
            budget.debit(cycles);
        }
    }

    #[inline]
    pub fn delay_write(&self, budget: &mut CycleBudget) {
        if self.delay_ns > 0 {
            let cycles = self.write_cycles(budget);
            budget.debit(cycles);
        }
    }
}

/// CGA memory is only reachable between character clocks. The debit is skipped once the slice
/// is nearly exhausted so that the CPU is never starved outright.
#[inline]
pub fn delay_slow_cga(budget: &mut CycleBudget) {
    let mut cycles = budget.cycle_max / SLOW_CGA_DIVISOR;
    if budget.cycles < 3 * cycles {
        cycles = 0;
    }
    budget.debit(cycles);
}

/// A write to the PC-98 wait port stalls the CPU for 0.6us.
pub fn delay_pc98_wait_port(budget: &mut CycleBudget) {
    // cycle_max is the number of cycles in one millisecond
    let cycles = budget.cycle_max * PC98_WAIT_PORT_TENTHS_US / 10_000;
    budget.debit(cycles);
}
