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

    devices::vga::vram.rs

    Implements the adapter's video RAM.

    VRAM is kept as one linear byte buffer. Planar modes view it as an array
    of dwords, where byte lane n of each dword holds plane n, so planar offset
    x lives at bytes x*4 .. x*4+3. Chained and linear modes address the same
    buffer bytewise.

    All offsets are wrapped. The wrap window (vmemwrap) may be set smaller
    than the allocation by an SVGA chipset restricting its visible memory.

*/

use crate::bus::AccessWidth;

pub struct Vram {
    linear: Box<[u8]>,
    size: usize,
    wrap: usize,
}

impl Default for Vram {
    fn default() -> Self {
        Vram::empty()
    }
}

impl Vram {
    /// Allocate `size` bytes of zeroed VRAM. `size` must be a power of two.
    pub fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            linear: vec![0; size].into_boxed_slice(),
            size,
            wrap: size,
        }
    }

    pub fn empty() -> Self {
        Self {
            linear: Box::new([]),
            size: 0,
            wrap: 0,
        }
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.size > 0
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn wrap(&self) -> usize {
        self.wrap
    }

    /// Restrict the visible window of VRAM. The wrap is clamped to the allocation and rounded
    /// down to a power of two.
    pub fn set_wrap(&mut self, wrap: usize) {
        let wrap = wrap.min(self.size);
        self.wrap = match wrap {
            0 => 0,
            w => 1 << (usize::BITS - 1 - w.leading_zeros()),
        };
    }

    /// Wrap a byte offset, for chained and linear addressing.
    #[inline(always)]
    pub fn checked(&self, offset: usize) -> usize {
        offset & self.wrap.saturating_sub(1)
    }

    /// Wrap a planar dword offset. Planar addressing sees a quarter of VRAM per plane.
    #[inline(always)]
    pub fn checked_planar(&self, offset: usize) -> usize {
        offset & (self.wrap >> 2).saturating_sub(1)
    }

    #[inline(always)]
    fn index(&self, offset: usize) -> usize {
        offset & self.size.saturating_sub(1)
    }

    #[inline]
    pub fn read_u8(&self, offset: usize) -> u8 {
        self.linear[self.index(offset)]
    }

    #[inline]
    pub fn write_u8(&mut self, offset: usize, data: u8) {
        let idx = self.index(offset);
        self.linear[idx] = data;
    }

    /// Read a little-endian value of width W at a byte offset.
    #[inline]
    pub fn read<W: AccessWidth>(&self, offset: usize) -> W {
        let mut value = 0u32;
        for i in 0..W::BYTES {
            value |= (self.read_u8(offset + i) as u32) << (i * 8);
        }
        W::from_u32(value)
    }

    #[inline]
    pub fn write<W: AccessWidth>(&mut self, offset: usize, data: W) {
        let value = data.to_u32();
        for i in 0..W::BYTES {
            self.write_u8(offset + i, (value >> (i * 8)) as u8);
        }
    }

    /// Read the planar dword at planar offset `offset`.
    #[inline]
    pub fn read_planar(&self, offset: usize) -> u32 {
        self.read::<u32>(offset << 2)
    }

    #[inline]
    pub fn write_planar(&mut self, offset: usize, data: u32) {
        self.write::<u32>(offset << 2, data)
    }

    pub fn clear(&mut self) {
        self.linear.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.linear
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.linear
    }
}
