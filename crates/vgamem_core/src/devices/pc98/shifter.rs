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

    devices::pc98::shifter.rs

    Implements the EGC bit shifter.

    The EGC moves pixel data through a 4096-bit delay line shared by all four
    planes. Data enters at the input cursor and leaves at the output cursor,
    realigned from the source bit phase to the destination bit phase. Each
    plane occupies every fourth byte of the ring, so one advance of a cursor
    moves all four planes in lock-step.

*/

use super::egc::EgcQuad;

pub const SHIFTER_BUFFER_SIZE: usize = 512;
const BUFFER_MASK: usize = SHIFTER_BUFFER_SIZE - 1;

/// The starting cursor for a descending transfer: the last 4-plane slot of the ring.
const DESCEND_START: usize = SHIFTER_BUFFER_SIZE + 3 - 16;

/// Shift parameters as programmed through the EGC bit address and bit length registers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ShiftConfig {
    pub descend: bool,
    /// Transfer length in bits, minus one.
    pub length: u16,
    pub srcbit: u8,
    pub dstbit: u8,
}

#[derive(Clone)]
pub struct EgcShifter {
    descend: bool,
    remain: u16,
    srcbit: u16,
    dstbit: u16,
    o_srcbit: u16,
    o_dstbit: u16,
    buffer: [u8; SHIFTER_BUFFER_SIZE],
    bufi: usize,
    bufo: usize,
    shft8load: u8,
    shft8bitr: u8,
    shft8bitl: u8,
}

impl Default for EgcShifter {
    fn default() -> Self {
        Self {
            descend: false,
            remain: 0x10,
            srcbit: 0,
            dstbit: 0,
            o_srcbit: 0,
            o_dstbit: 0,
            buffer: [0; SHIFTER_BUFFER_SIZE],
            bufi: 0,
            bufo: 0,
            shft8load: 0,
            shft8bitr: 0,
            shft8bitl: 0,
        }
    }
}

impl EgcShifter {
    pub fn new() -> Self {
        EgcShifter::default()
    }

    pub fn reset(&mut self) {
        *self = EgcShifter::default();
    }

    /// Start a new transfer. Called whenever the bit address or length registers are written,
    /// and by the shifter itself when a transfer runs out of bits.
    pub fn reinit(&mut self, config: &ShiftConfig) {
        self.descend = config.descend;
        self.remain = config.length + 1;
        self.srcbit = (config.srcbit & 0x0F) as u16;
        self.dstbit = (config.dstbit & 0x0F) as u16;
        self.bufi = if self.descend { DESCEND_START } else { 0 };
        self.bufo = self.bufi;

        let src = self.srcbit & 7;
        let dst = self.dstbit & 7;
        if src < dst {
            self.shft8bitr = (dst - src) as u8;
            self.shft8bitl = 8 - self.shft8bitr;
        }
        else if src > dst {
            self.shft8bitl = (src - dst) as u8;
            self.shft8bitr = 8 - self.shft8bitl;
        }
        else {
            self.shft8bitr = 0;
            self.shft8bitl = 0;
        }

        self.shft8load = 0;
        self.o_srcbit = src;
        self.o_dstbit = dst;
    }

    pub fn remain(&self) -> u16 {
        self.remain
    }

    pub fn descending(&self) -> bool {
        self.descend
    }

    /// Bits staged in the delay line and not yet shifted out.
    pub fn loaded(&self) -> u8 {
        self.shft8load
    }

    pub fn shift_amounts(&self) -> (u8, u8) {
        (self.shft8bitl, self.shft8bitr)
    }

    pub fn cursors(&self) -> (usize, usize) {
        (self.bufi, self.bufo)
    }

    #[inline]
    fn bi(&mut self, ofs: usize, val: u16, width: usize) {
        let ip = self.bufi + ofs;
        for i in 0..width {
            self.buffer[(ip + i) & BUFFER_MASK] = (val >> (i * 8)) as u8;
        }
    }

    #[inline]
    fn bi_adv(&mut self, width: usize) {
        let step = if self.descend { SHIFTER_BUFFER_SIZE - width } else { width };
        self.bufi = (self.bufi + step) & BUFFER_MASK;
    }

    #[inline]
    fn bo(&self, ofs: usize) -> u8 {
        self.buffer[(self.bufo + ofs) & BUFFER_MASK]
    }

    #[inline]
    fn bo_adv(&mut self) {
        let step = if self.descend { SHIFTER_BUFFER_SIZE - 1 } else { 1 };
        self.bufo = (self.bufo + step) & BUFFER_MASK;
    }

    /// Edge mask for the byte about to be output. Partial at the end of a transfer and at a
    /// non-zero destination bit phase.
    pub fn dstbit_mask(&self) -> u8 {
        let mb: u32 = if self.remain >= 8 {
            0xFF
        }
        else {
            let n = 8 - self.remain as u32;
            if self.descend {
                0xFF >> n
            }
            else {
                (0xFF << n) & 0xFF
            }
        };

        let mb = if self.descend { mb << self.dstbit } else { mb >> self.dstbit };
        mb as u8
    }

    /// Push one width-sized chunk per plane into the delay line. `width` is 1 or 2 bytes and
    /// `odd` is the byte lane of a byte-wide access.
    pub fn input(&mut self, planes: [u16; 4], width: usize, odd: usize, srcmask: &mut [u8; 2]) {
        let base = if self.descend { SHIFTER_BUFFER_SIZE + 1 - width } else { 0 };
        for (p, val) in planes.iter().enumerate() {
            self.bi(base + p * 4, *val, width);
        }

        if self.shft8load <= 16 {
            self.bi_adv(width);

            if width == 2 {
                if self.srcbit >= 8 {
                    self.bo_adv();
                }
                self.shft8load += (16 - self.srcbit) as u8;
                self.srcbit = 0;
            }
            else if self.srcbit >= 8 {
                self.srcbit -= 8;
            }
            else {
                self.shft8load += (8 - self.srcbit) as u8;
                self.srcbit = 0;
            }
        }

        if width == 2 {
            *srcmask = [0xFF, 0xFF];
        }
        else {
            srcmask[odd & 1] = 0xFF;
        }
    }

    /// Shift one byte per plane out of the delay line into byte lane `lane` of `out`.
    /// A recursive call is one half of a word-wide output, which does its own load accounting.
    pub fn output8(
        &mut self,
        out: &mut EgcQuad,
        lane: usize,
        srcmask: &mut [u8; 2],
        recursive: bool,
        config: &ShiftConfig,
    ) {
        let lane = lane & 1;

        if !recursive {
            let need = 8 - self.dstbit as i32;
            if (self.shft8load as i32) < need {
                srcmask[lane] = 0;
                return;
            }
            self.shft8load = (self.shft8load as i32 - need) as u8;
        }

        if self.dstbit >= 8 {
            self.dstbit -= 8;
            srcmask[lane] = 0;
            return;
        }

        srcmask[lane] = self.dstbit_mask();

        if self.dstbit > 0 {
            let consumed = 8 - self.dstbit;
            self.remain = self.remain.saturating_sub(consumed);
        }
        else {
            self.remain = self.remain.saturating_sub(8);
        }

        let mut bytes = [0u8; 4];
        if self.o_srcbit < self.o_dstbit {
            if self.dstbit != 0 {
                let r = self.shft8bitr as u32;
                for (p, b) in bytes.iter_mut().enumerate() {
                    let v = self.bo(p * 4) as u32;
                    *b = if self.descend { (v << r) as u8 } else { (v >> r) as u8 };
                }
                self.dstbit = 0;
            }
            else {
                self.shift_combine(&mut bytes);
            }
        }
        else if self.o_srcbit > self.o_dstbit {
            self.dstbit = 0;
            self.shift_combine(&mut bytes);
        }
        else {
            self.dstbit = 0;
            for (p, b) in bytes.iter_mut().enumerate() {
                *b = self.bo(p * 4);
            }
            self.bo_adv();
        }

        for (p, b) in bytes.iter().enumerate() {
            out.set_byte(p, lane, *b);
        }

        if !recursive && self.remain == 0 {
            self.reinit(config);
        }
    }

    /// Merge two adjacent delay line bytes across the phase difference. The cursor moves before
    /// the merge when descending and after it when ascending.
    fn shift_combine(&mut self, bytes: &mut [u8; 4]) {
        let l = self.shft8bitl as u32;
        let r = self.shft8bitr as u32;
        if self.descend {
            self.bo_adv();
            for (p, b) in bytes.iter_mut().enumerate() {
                let near = self.bo(p * 4) as u32;
                let far = self.bo(p * 4 + 1) as u32;
                *b = ((far >> l) | (near << r)) as u8;
            }
        }
        else {
            for (p, b) in bytes.iter_mut().enumerate() {
                let near = self.bo(p * 4) as u32;
                let far = self.bo(p * 4 + 1) as u32;
                *b = ((near << l) | (far >> r)) as u8;
            }
            self.bo_adv();
        }
    }

    /// Shift one word per plane out of the delay line, as two byte outputs in transfer order.
    pub fn output16(&mut self, out: &mut EgcQuad, srcmask: &mut [u8; 2], config: &ShiftConfig) {
        let need = 16 - self.dstbit as i32;
        if (self.shft8load as i32) < need {
            *srcmask = [0, 0];
            return;
        }
        self.shft8load = (self.shft8load as i32 - need) as u8;

        let (first, second) = if self.descend { (1, 0) } else { (0, 1) };
        self.output8(out, first, srcmask, true, config);
        if self.remain != 0 {
            self.output8(out, second, srcmask, true, config);
        }
        else {
            srcmask[second] = 0;
        }

        if self.remain == 0 {
            self.reinit(config);
        }
    }

    /// Width-dispatched output. `width` is 1 or 2 bytes.
    pub fn output(
        &mut self,
        out: &mut EgcQuad,
        width: usize,
        odd: usize,
        srcmask: &mut [u8; 2],
        config: &ShiftConfig,
    ) {
        if width == 2 {
            self.output16(out, srcmask, config);
        }
        else {
            self.output8(out, odd, srcmask, false, config);
        }
    }
}
