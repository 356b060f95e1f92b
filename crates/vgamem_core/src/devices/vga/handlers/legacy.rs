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

    devices::vga::handlers::legacy.rs

    Handlers for the pre-EGA adapters: CGA, the PCjr and Tandy family with
    their shared system RAM, the Hercules, and the Amstrad PC1512's
    four-plane color mode.

*/

use super::{gather, scatter, width_generic_handler, VgaPageHandler};
use crate::{
    bus::{AccessWidth, PAGE_MASK, PAGE_SHIFT},
    devices::vga::{VgaMemory, VGA_PAGE_B8},
    machine_types::VideoMode,
    timing::delay_slow_cga,
};

const CGA_WINDOW_BASE: usize = 0xB8000;
const AMSTRAD_PLANE_SIZE: usize = 0x4000;

#[inline]
fn slow_cga_offset(addr: usize) -> usize {
    addr.wrapping_sub(CGA_WINDOW_BASE) & 0x7FFF
}

fn slow_cga_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    delay_slow_cga(&mut vga.budget);
    let base = vga.tandy.mem_base;
    gather::<W>(|i| vga.base_read(base, slow_cga_offset(addr + i)))
}

fn slow_cga_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    delay_slow_cga(&mut vga.budget);
    let base = vga.tandy.mem_base;
    scatter(val, |i, b| vga.base_write(base, slow_cga_offset(addr + i), b));
}

/// CGA memory, contended with the CRTC. Each access costs a fraction of the CPU slice.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SlowCgaHandler;

width_generic_handler!(SlowCgaHandler, slow_cga_read, slow_cga_write);

fn cga_text_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let base = vga.tandy.mem_base;
    gather::<W>(|i| vga.base_read(base, (addr + i) & 0x3FFF))
}

fn cga_text_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let base = vga.tandy.mem_base;
    scatter(val, |i, b| {
        if vga.cga_snow_enabled {
            vga.capture_snow(b);
        }
        vga.base_write(base, (addr + i) & 0x3FFF, b);
    });
}

/// CGA text modes with snow. Every write is also recorded in the snow buffer at the column
/// the beam is on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CgaTextHandler;

width_generic_handler!(CgaTextHandler, cga_text_read, cga_text_write);

/// The Tandy's B8000 window onto the selected 32K page of system RAM. Odd banks hold only
/// 16K, which repeats.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TandyHandler;

impl TandyHandler {
    #[inline]
    fn offset(vga: &VgaMemory, addr: usize) -> usize {
        let page_mask = if vga.tandy.mem_bank & 1 != 0 { 0x03 } else { 0x07 };
        (((addr >> PAGE_SHIFT) & page_mask) << PAGE_SHIFT) + (addr & PAGE_MASK)
    }
}

impl VgaPageHandler for TandyHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        vga.base_read(vga.tandy.mem_base, TandyHandler::offset(vga, addr))
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        let offset = TandyHandler::offset(vga, addr);
        vga.base_write(vga.tandy.mem_base, offset, val);
    }
}

/// The PCjr's 16K video page, repeated through the 32K window.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PcJrHandler;

impl PcJrHandler {
    #[inline]
    fn offset(addr: usize) -> usize {
        ((((addr >> PAGE_SHIFT).wrapping_sub(VGA_PAGE_B8)) & 0x03) << PAGE_SHIFT) + (addr & PAGE_MASK)
    }
}

impl VgaPageHandler for PcJrHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        vga.base_read(vga.tandy.mem_base, PcJrHandler::offset(addr))
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        vga.base_write(vga.tandy.mem_base, PcJrHandler::offset(addr), val);
    }
}

/// Hercules text mode. The first 4K repeats throughout the window.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HerculesHandler;

impl VgaPageHandler for HerculesHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        vga.vram.read_u8(addr & PAGE_MASK)
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        vga.vram.write_u8(addr & PAGE_MASK, val);
    }
}

/// Offset of an Amstrad access within plane 0. Outside the PC1512's own mode the window
/// behaves like a Tandy page.
fn amstrad_offset(vga: &VgaMemory, addr: usize) -> usize {
    if vga.mode != VideoMode::Amstrad {
        let addr = addr.wrapping_sub(CGA_WINDOW_BASE);
        let mut page = addr >> PAGE_SHIFT;
        if vga.tandy.mem_bank & 1 != 0 {
            page &= 0x03;
        }
        (page << PAGE_SHIFT) + (addr & PAGE_MASK)
    }
    else {
        ((addr & 0xFFFF).wrapping_sub(0x8000)) & 0x7FFF
    }
}

fn amstrad_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    let start = (amstrad_offset(vga, addr) + vga.amstrad.read_plane as usize * AMSTRAD_PLANE_SIZE) & 0xFFFF;
    let base = vga.tandy.mem_base;
    gather::<W>(|i| vga.base_read(base, start + i))
}

/// Writes go to every plane enabled in the plane write register. Planes are 16K apart.
fn amstrad_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    let start = amstrad_offset(vga, addr);
    let planes = if vga.mode == VideoMode::Amstrad {
        vga.amstrad.write_plane
    }
    else {
        0x01
    };
    let base = vga.tandy.mem_base;
    for plane in 0..4 {
        if planes & (1 << plane) != 0 {
            let plane_start = start + plane * AMSTRAD_PLANE_SIZE;
            scatter(val, |i, b| vga.base_write(base, plane_start + i, b));
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AmstradHandler;

width_generic_handler!(AmstradHandler, amstrad_read, amstrad_write);
