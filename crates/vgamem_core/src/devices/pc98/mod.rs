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

    devices::pc98::mod.rs

    Memory decoder for the PC-98 fixed memory layout: text and attribute
    RAM, the MSW register window, and the four-plane graphics RAM with its
    GRCG tile modes and EGC path.

*/

pub mod egc;
pub mod rop;
pub mod shifter;

use crate::{
    bus::AccessWidth,
    devices::vga::vram::Vram,
    util::{Diagnostic, WarnOnce},
};
use egc::{EgcPipeline, EgcQuad, EgcRegisters};
use rop::PLANE_OFFSET;

/// Physical address of the 32-byte MSW register window. Registers sit at 4-byte strides.
pub const PC98_MSW_BASE: usize = 0xA3FE0;
pub const PC98_MSW_COUNT: usize = 8;
/// Start of the fourth-plane window used in 16-color analog mode.
pub const PC98_ANALOG_BASE: usize = 0xE0000;
/// Offset of the second set of planes, selected by the access bit of the VRAM op register.
pub const PC98_VOP_OFFSET: usize = 0x20000;

// VRAM operation register bits
pub const VOPBIT_ACCESS: u8 = 0x01;
pub const VOPBIT_EGC: u8 = 0x02;
pub const VOPBIT_RMW: u8 = 0x04;
pub const VOPBIT_GRCG: u8 = 0x08;
pub const VOPBIT_ANALOG: u8 = 0x10;

const TRAM_CHAR: usize = 0;
const TRAM_ATTR: usize = 1;
const TRAM_UNKNOWN: usize = 2;
const TRAM_ABSENT: usize = 3;

/// GDC-side registers read by the decoder. Owned by the GDC and GRCG port emulation.
#[derive(Copy, Clone, Debug, Default)]
pub struct GdcRegisters {
    /// VRAM operation mode. Low 4 bits select the G-RAM access mode.
    pub vramop: u8,
    /// GRCG mode register. Bits 0-3 disable the corresponding plane in tile modes.
    pub grcg_mode: u8,
}

impl GdcRegisters {
    pub fn set_vramop_bit(&mut self, bit: u8, state: bool) {
        if state {
            self.vramop |= bit;
        }
        else {
            self.vramop &= !bit;
        }
    }

    #[inline]
    pub fn analog_enabled(&self) -> bool {
        self.vramop & VOPBIT_ANALOG != 0
    }

    #[inline]
    fn vop_offset(&self) -> usize {
        if self.vramop & VOPBIT_ACCESS != 0 {
            PC98_VOP_OFFSET
        }
        else {
            0
        }
    }

    #[inline]
    fn plane_enabled(&self, plane: usize) -> bool {
        self.grcg_mode & (1 << plane) == 0
    }
}

#[derive(Clone, Default)]
pub struct Pc98State {
    pub gdc: GdcRegisters,
    pub egc_regs: EgcRegisters,
    tiles: EgcQuad,
    pipeline: EgcPipeline,
    msw: [u8; PC98_MSW_COUNT],
    warn: WarnOnce,
}

/// Fold a physical address into the decoder's 17-bit space. The analog window maps onto the
/// fourth plane.
#[inline]
fn fold_address(addr: usize) -> usize {
    if addr >= PC98_ANALOG_BASE {
        (addr & 0x7FFF) + PC98_VOP_OFFSET
    }
    else {
        addr & 0x1FFFF
    }
}

#[inline]
fn is_msw(addr: usize) -> bool {
    (addr & !0x1F) == PC98_MSW_BASE
}

impl Pc98State {
    pub fn new() -> Self {
        Pc98State::default()
    }

    /// Clear core-owned state. Register state belongs to the port emulation and is kept.
    pub fn reset(&mut self) {
        self.tiles = EgcQuad::default();
        self.pipeline.reset(&self.egc_regs);
        self.warn.clear();
    }

    pub fn tiles(&self) -> &EgcQuad {
        &self.tiles
    }

    pub fn pipeline(&self) -> &EgcPipeline {
        &self.pipeline
    }

    /// Load a GRCG tile register. The byte is replicated into both halves of the plane word.
    pub fn set_tile(&mut self, plane: usize, byte: u8) {
        self.tiles.0[plane & 3] = u16::from_le_bytes([byte, byte]);
    }

    pub fn msw(&self, which: usize) -> u8 {
        self.msw[which & 7]
    }

    pub fn set_msw(&mut self, which: usize, val: u8) {
        self.msw[which & 7] = val;
    }

    /// MSW3 reports the installed memory size to the BIOS.
    pub fn set_msw3_ramsize(&mut self, val: u8) {
        self.msw[2] = val;
    }

    /// Handle a word write to one of the EGC registers. `offset` is the register's offset from
    /// the EGC port base. Writes to the bit address or length registers restart the shifter.
    pub fn egc_write_port(&mut self, offset: usize, val: u16) {
        let regs = &mut self.egc_regs;
        match offset & 0x0E {
            0x00 => regs.access = val as u8,
            0x02 => regs.write_mode_register(val),
            0x04 => regs.write_rop_register(val),
            0x06 => regs.write_foreground_color(val as u8),
            0x08 => regs.mask = val.to_le_bytes(),
            0x0A => regs.write_background_color(val as u8),
            0x0C => {
                regs.write_bit_address(val);
                self.pipeline.shifter.reinit(&regs.shift);
            }
            _ => {
                regs.write_bit_length(val);
                self.pipeline.shifter.reinit(&regs.shift);
            }
        }
    }

    pub fn read<W: AccessWidth>(&mut self, vram: &Vram, addr: usize) -> W {
        debug_assert!(addr % W::BYTES == 0, "unaligned PC-98 read at {:05X}", addr);

        if is_msw(addr) {
            return W::from_u32(self.msw((addr >> 2) & 7) as u32);
        }

        let addr = fold_address(addr);
        match addr >> 13 {
            TRAM_CHAR | TRAM_UNKNOWN => return vram.read::<W>(addr),
            TRAM_ATTR => {
                if addr & 1 != 0 {
                    return W::ONES;
                }
                return W::from_u32(vram.read::<W>(addr).to_u32() | 0xFF00);
            }
            TRAM_ABSENT => return W::ONES,
            _ => {}
        }

        let vop = self.gdc.vop_offset();
        match self.gdc.vramop & 0x0F {
            0x00..=0x07 | 0x0C | 0x0D => vram.read::<W>(addr + vop),
            0x08 | 0x09 => {
                // TCR: compare all enabled planes against the tiles at once
                let plane_addr = addr & 0x7FFF;
                let mut r = 0u32;
                for p in 0..4 {
                    if self.gdc.plane_enabled(p) {
                        let b = vram.read::<W>(plane_addr + PLANE_OFFSET * (p + 1) + vop).to_u32();
                        r |= b ^ self.tiles.lane::<W>(p, 0).to_u32();
                    }
                }
                W::from_u32(!r)
            }
            0x0A | 0x0B | 0x0E | 0x0F => self.pipeline.read::<W>(
                &self.egc_regs,
                &mut self.tiles,
                vram,
                (addr & 0x7FFF) + vop,
                addr + vop,
            ),
            mode => {
                if self.warn.first(Diagnostic::UnsupportedVramOp, mode as u32) {
                    log::warn!("PC-98 VRAM read: unsupported opmode 0x{:X}", mode);
                }
                vram.read::<W>(addr + vop)
            }
        }
    }

    pub fn write<W: AccessWidth>(&mut self, vram: &mut Vram, addr: usize, val: W) {
        debug_assert!(addr % W::BYTES == 0, "unaligned PC-98 write at {:05X}", addr);

        if is_msw(addr) {
            return;
        }

        let addr = fold_address(addr);
        match addr >> 13 {
            TRAM_CHAR | TRAM_UNKNOWN => {
                vram.write::<W>(addr, val);
                return;
            }
            TRAM_ATTR => {
                if addr & 1 == 0 {
                    vram.write::<W>(addr, W::from_u32(val.to_u32() | 0xFF00));
                }
                return;
            }
            TRAM_ABSENT => return,
            _ => {}
        }

        let vop = self.gdc.vop_offset();
        match self.gdc.vramop & 0x0F {
            0x00..=0x07 => vram.write::<W>(addr + vop, val),
            0x08 | 0x09 => {
                // TDW: the written value is ignored, only the tile data lands
                let plane_addr = addr & 0x7FFF;
                for p in 0..4 {
                    if self.gdc.plane_enabled(p) {
                        self.replicate_tile::<W>(p);
                        vram.write::<W>(plane_addr + PLANE_OFFSET * (p + 1) + vop, self.tiles.lane::<W>(p, 0));
                    }
                }
            }
            0x0C | 0x0D => {
                let plane_addr = addr & 0x7FFF;
                let v = val.to_u32();
                for p in 0..4 {
                    if self.gdc.plane_enabled(p) {
                        self.replicate_tile::<W>(p);
                        let off = plane_addr + PLANE_OFFSET * (p + 1) + vop;
                        let old = vram.read::<W>(off).to_u32();
                        let t = (old & !v) | (v & self.tiles.lane::<W>(p, 0).to_u32());
                        vram.write::<W>(off, W::from_u32(t));
                    }
                }
            }
            0x0A | 0x0B | 0x0E | 0x0F => {
                self.pipeline
                    .write::<W>(&self.egc_regs, &mut self.tiles, vram, (addr & 0x7FFF) + vop, val)
            }
            mode => {
                if self.warn.first(Diagnostic::UnsupportedVramOp, mode as u32) {
                    log::warn!("PC-98 VRAM write: unsupported opmode 0x{:X}", mode);
                }
                vram.write::<W>(addr + vop, val);
            }
        }
    }

    /// Wide tile accesses repeat the tile's first byte.
    #[inline]
    fn replicate_tile<W: AccessWidth>(&mut self, plane: usize) {
        if W::BYTES > 1 {
            let b = self.tiles.byte(plane, 0);
            self.tiles.set_byte(plane, 1, b);
        }
    }
}
