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

    devices::vga::handlers::planar.rs

    Handlers for planar (unchained) memory layouts. Every CPU byte address
    selects one planar dword; reads go through the latch, and writes go
    through the raster operation engine and the map mask.

*/

use super::{gather, scatter, width_generic_handler, VgaPageHandler};
use crate::{bus::AccessWidth, devices::vga::VgaMemory};

/// Load the latch from planar offset `start` and return the byte selected by the read mode.
fn unchained_read_byte(vga: &mut VgaMemory, start: usize) -> u8 {
    let memstart = if vga.gc.config.odd_even_chained() {
        start & !1
    }
    else {
        start
    };
    let latch = vga.vram.read_planar(memstart);
    vga.gc.load_latch(latch);
    vga.gc.read_latched(start)
}

fn unchained_ega_write_byte(vga: &mut VgaMemory, start: usize, val: u8) {
    let data = vga.gc.mode_operation(val);
    let config = &vga.gc.config;
    let pixels = (vga.vram.read_planar(start) & config.full_not_map_mask) | (data & config.full_map_mask);
    vga.vram.write_planar(start, pixels);
}

/// Unchained write with odd/even plane selection. In odd/even mode the map mask picks planes
/// 0 and 2 for even addresses and planes 1 and 3 for odd ones.
fn unchained_vga_write_byte(vga: &mut VgaMemory, start: usize, val: u8) {
    let data = vga.gc.mode_operation(val);
    let config = &vga.gc.config;

    let memaddr = if config.odd_even_chained() { start & !1 } else { start };
    let mut pixels = vga.vram.read_planar(memaddr).to_le_bytes();
    let data_bytes = data.to_le_bytes();

    if !config.odd_even_disabled() {
        let map_mask = config.map_mask;
        if start & 1 != 0 {
            if map_mask & 0x02 != 0 {
                pixels[1] = data_bytes[1];
            }
            if map_mask & 0x08 != 0 {
                pixels[3] = data_bytes[3];
            }
        }
        else {
            if map_mask & 0x01 != 0 {
                pixels[0] = data_bytes[0];
            }
            if map_mask & 0x04 != 0 {
                pixels[2] = data_bytes[2];
                vga.write_font(memaddr, data_bytes[2]);
            }
        }
        vga.vram.write_planar(memaddr, u32::from_le_bytes(pixels));
    }
    else {
        let pixels = (u32::from_le_bytes(pixels) & config.full_not_map_mask) | (data & config.full_map_mask);
        vga.vram.write_planar(memaddr, pixels);
    }
}

#[inline]
fn unchained_start(vga: &VgaMemory, addr: usize, bank: usize) -> usize {
    vga.vram.checked_planar((addr & vga.pages.mask) + bank)
}

/// SVGA 16-color modes address a 64K window within the current bank.
#[inline]
fn lin4_start(vga: &VgaMemory, addr: usize, bank: usize) -> usize {
    vga.vram.checked_planar(bank + (addr & 0xFFFF))
}

fn unchained_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let start = unchained_start(vga, addr, vga.banks.read_full());
    gather::<W>(|i| unchained_read_byte(vga, start + i))
}

fn unchained_ega_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let start = unchained_start(vga, addr, vga.banks.write_full());
    scatter(val, |i, b| unchained_ega_write_byte(vga, start + i, b));
}

fn unchained_vga_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let start = unchained_start(vga, addr, vga.banks.write_full());
    scatter(val, |i, b| unchained_vga_write_byte(vga, start + i, b));
}

fn lin4_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let start = lin4_start(vga, addr, vga.banks.read_full());
    gather::<W>(|i| unchained_read_byte(vga, start + i))
}

fn lin4_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let start = lin4_start(vga, addr, vga.banks.write_full());
    scatter(val, |i, b| unchained_ega_write_byte(vga, start + i, b));
}

/// EGA planar modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnchainedEgaHandler;

width_generic_handler!(UnchainedEgaHandler, unchained_read, unchained_ega_write);

/// VGA planar modes, including mode X.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnchainedVgaHandler;

width_generic_handler!(UnchainedVgaHandler, unchained_read, unchained_vga_write);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Lin4Handler;

width_generic_handler!(Lin4Handler, lin4_read, lin4_write);

/// Alphanumeric modes. Characters live in plane 0, attributes in plane 1 and the font in
/// plane 2. Writes bypass the raster operation engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextHandler;

impl VgaPageHandler for TextHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        vga.delay_read();

        let config = &vga.gc.config;
        let mut addr = addr & vga.pages.mask;
        let mut plane = config.read_map_select as usize;
        if !config.odd_even_disabled() {
            plane = (plane & !1) + (addr & 1);
        }
        if config.odd_even_chained() {
            addr &= !1;
        }

        let offset = vga.vram.checked(vga.banks.read_full() + (addr << 2) + plane);
        vga.vram.read_u8(offset)
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        vga.delay_write();

        let config = &vga.gc.config;
        let addr = addr & vga.pages.mask;
        let memaddr = if config.odd_even_chained() { addr & !1 } else { addr };
        let odd_even_disabled = config.odd_even_disabled();
        let map_mask = config.map_mask;

        let mut pixels = vga.vram.read_planar(memaddr).to_le_bytes();
        if odd_even_disabled || addr & 1 != 0 {
            if map_mask & 0x02 != 0 {
                pixels[1] = val;
            }
            if map_mask & 0x08 != 0 {
                pixels[3] = val;
            }
        }
        if odd_even_disabled || addr & 1 == 0 {
            if map_mask & 0x01 != 0 {
                pixels[0] = val;
            }
            if map_mask & 0x04 != 0 {
                pixels[2] = val;
                vga.write_font(memaddr, val);
            }
        }
        vga.vram.write_planar(memaddr, u32::from_le_bytes(pixels));
    }
}
