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

    devices::vga::handlers::chained.rs

    Handlers for chained memory layouts: the EGA's chained odd/even modes
    and VGA chain-4, in the generic and Tseng flavors. The fast variants
    copy host data straight into VRAM; the slow variants run each byte
    through the raster operation engine so that the bit mask is honored.

*/

use super::{gather, scatter, width_generic_handler};
use crate::{
    bus::AccessWidth,
    devices::vga::{graphics_controller::lane, VgaMemory},
};

#[inline]
fn chained_offset(vga: &VgaMemory, addr: usize, bank: usize) -> usize {
    vga.vram.checked((addr & vga.pages.mask) + bank)
}

/// Generic chain-4: host address bits 0-1 select the plane, and the rest select the planar
/// dword. Only the low 64K of host address space is decoded.
#[inline(always)]
fn chain4_offset(addr: usize) -> usize {
    ((addr & 0xFFFC) << 2) + (addr & 3)
}

#[inline]
fn is_aligned<W: AccessWidth>(addr: usize) -> bool {
    addr & (W::BYTES - 1) == 0
}

fn chained_ega_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let start = chained_offset(vga, addr, vga.banks.read_full());
    gather::<W>(|i| vga.vram.read_u8(start + i))
}

/// The write still runs through the mode logic so that its side effects on diagnostics match
/// a planar write, but the host byte is stored as-is.
fn chained_ega_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let start = chained_offset(vga, addr, vga.banks.write_full());
    scatter(val, |i, b| {
        let _ = vga.gc.mode_operation(b);
        vga.vram.write_u8(start + i, b);
    });
}

fn chained_vga_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let addr = chained_offset(vga, addr, vga.banks.read_full());
    if is_aligned::<W>(addr) {
        vga.vram.read::<W>(chain4_offset(addr))
    }
    else {
        gather::<W>(|i| vga.vram.read_u8(chain4_offset(addr + i)))
    }
}

fn chained_vga_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let addr = chained_offset(vga, addr, vga.banks.write_full());
    if is_aligned::<W>(addr) {
        vga.vram.write::<W>(chain4_offset(addr), val);
    }
    else {
        scatter(val, |i, b| vga.vram.write_u8(chain4_offset(addr + i), b));
    }
}

fn chained_vga_slow_read_byte(vga: &mut VgaMemory, addr: usize) -> u8 {
    let latch = vga.vram.read_planar(addr & !3);
    vga.gc.load_latch(latch);
    lane(latch, addr & 3)
}

fn chained_vga_slow_write_byte(vga: &mut VgaMemory, addr: usize, val: u8) {
    let pixels = vga.gc.mode_operation(val);
    vga.vram.write_u8(((addr & !3) << 2) + (addr & 3), lane(pixels, addr & 3));
}

fn chained_vga_slow_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let addr = chained_offset(vga, addr, vga.banks.read_full());
    gather::<W>(|i| chained_vga_slow_read_byte(vga, addr + i))
}

fn chained_vga_slow_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let addr = chained_offset(vga, addr, vga.banks.write_full());
    scatter(val, |i, b| chained_vga_slow_write_byte(vga, addr + i, b));
}

fn et4000_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let addr = chained_offset(vga, addr, vga.banks.read_full());
    if is_aligned::<W>(addr) {
        vga.vram.read::<W>(addr)
    }
    else {
        gather::<W>(|i| vga.vram.read_u8(addr + i))
    }
}

fn et4000_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let addr = chained_offset(vga, addr, vga.banks.write_full());
    if is_aligned::<W>(addr) {
        vga.vram.write::<W>(addr, val);
    }
    else {
        scatter(val, |i, b| vga.vram.write_u8(addr + i, b));
    }
}

fn et4000_slow_read_byte(vga: &mut VgaMemory, addr: usize) -> u8 {
    let latch = vga.vram.read_planar(addr >> 2);
    vga.gc.load_latch(latch);
    lane(latch, addr & 3)
}

fn et4000_slow_write_byte(vga: &mut VgaMemory, addr: usize, val: u8) {
    let pixels = vga.gc.mode_operation(val);
    vga.vram.write_u8(addr, lane(pixels, addr & 3));
}

fn et4000_slow_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let addr = chained_offset(vga, addr, vga.banks.read_full());
    gather::<W>(|i| et4000_slow_read_byte(vga, addr + i))
}

fn et4000_slow_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let addr = chained_offset(vga, addr, vga.banks.write_full());
    scatter(val, |i, b| et4000_slow_write_byte(vga, addr + i, b));
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainedEgaHandler;

width_generic_handler!(ChainedEgaHandler, chained_ega_read, chained_ega_write);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainedVgaHandler;

width_generic_handler!(ChainedVgaHandler, chained_vga_read, chained_vga_write);

/// Chain-4 with the bit mask and raster operations applied. Selected whenever the bit mask is
/// not the identity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainedVgaSlowHandler;

width_generic_handler!(ChainedVgaSlowHandler, chained_vga_slow_read, chained_vga_slow_write);

/// Tseng chain-4. The planar byte address is the host address shifted right by two, so VRAM
/// is filled linearly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Et4000Handler;

width_generic_handler!(Et4000Handler, et4000_read, et4000_write);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Et4000SlowHandler;

width_generic_handler!(Et4000SlowHandler, et4000_slow_read, et4000_slow_write);
