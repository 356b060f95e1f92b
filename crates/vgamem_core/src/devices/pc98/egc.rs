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

    devices::pc98::egc.rs

    Implements the EGC (Enhanced Graphic Charger) data path for G-RAM
    accesses: selection of the light source, the shifter, the raster
    operation and the masked write back to the four planes.

*/

use modular_bitfield::prelude::*;

use super::{
    rop::{self, RopOperands, PLANE_OFFSET},
    shifter::{EgcShifter, ShiftConfig},
};
use crate::{bus::AccessWidth, devices::vga::vram::Vram, util::WarnOnce};

/// One 16-bit word per plane.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EgcQuad(pub [u16; 4]);

impl EgcQuad {
    /// Expand the low four bits of `color` into all-ones or all-zero plane words.
    pub fn from_color(color: u8) -> Self {
        EgcQuad(std::array::from_fn(|p| if color & (1 << p) != 0 { 0xFFFF } else { 0 }))
    }

    #[inline]
    pub fn byte(&self, plane: usize, lane: usize) -> u8 {
        (self.0[plane] >> ((lane & 1) * 8)) as u8
    }

    #[inline]
    pub fn set_byte(&mut self, plane: usize, lane: usize, val: u8) {
        let shift = (lane & 1) * 8;
        self.0[plane] = (self.0[plane] & !(0xFF << shift)) | ((val as u16) << shift);
    }

    /// Read the part of a plane word touched by an access of width W at byte lane `odd`.
    #[inline]
    pub fn lane<W: AccessWidth>(&self, plane: usize, odd: usize) -> W {
        if W::BYTES == 1 {
            W::from_u32(self.byte(plane, odd) as u32)
        }
        else {
            W::from_u32(self.0[plane] as u32)
        }
    }

    #[inline]
    pub fn set_lane<W: AccessWidth>(&mut self, plane: usize, odd: usize, val: W) {
        if W::BYTES == 1 {
            self.set_byte(plane, odd, val.to_u32() as u8);
        }
        else {
            self.0[plane] = val.to_u32() as u16;
        }
    }

    /// The per-plane values in the form fed to the shifter.
    fn lanes<W: AccessWidth>(&self, odd: usize) -> [u16; 4] {
        std::array::from_fn(|p| self.lane::<W>(p, odd).to_u32() as u16)
    }
}

/// Width-sized view of a two-byte mask register.
#[inline]
fn mask_lane<W: AccessWidth>(mask: &[u8; 2], odd: usize) -> W {
    if W::BYTES == 1 {
        W::from_u32(mask[odd & 1] as u32)
    }
    else {
        W::from_u32(u16::from_le_bytes(*mask) as u32)
    }
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct EgcModeRegister {
    #[skip]
    unused0: B8,
    pub lead_plane: B4,
    #[skip]
    unused1: B1,
    pub fgc: B2,
    #[skip]
    unused2: B1,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct EgcRopRegister {
    pub rop: B8,
    pub regload: B2,
    pub shiftinput: bool,
    pub lightsource: B2,
    /// Set to disable comparison against the lead plane.
    pub no_compare_lead: bool,
    #[skip]
    unused: B2,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct EgcBitAddressRegister {
    pub srcbit: B4,
    pub dstbit: B4,
    #[skip]
    unused0: B4,
    pub descend: bool,
    #[skip]
    unused1: B3,
}

/// EGC register state. Written through the EGC I/O ports, read on every EGC G-RAM access.
#[derive(Copy, Clone, Debug, Default)]
pub struct EgcRegisters {
    /// Planes with their bit set are excluded from writes.
    pub access: u8,
    /// Pattern source: 1 = background color, 2 = foreground color, otherwise the tile/pattern register.
    pub fgc: u8,
    pub lead_plane: u8,
    pub compare_lead: bool,
    /// 0 = CPU data, 1 = raster operation result, 2 = color register.
    pub lightsource: u8,
    /// The shifter takes its input from CPU writes rather than VRAM reads.
    pub shiftinput: bool,
    /// Bit 0 loads the pattern register on VRAM read, bit 1 on VRAM write.
    pub regload: u8,
    pub rop: u8,
    pub mask: [u8; 2],
    pub foreground_color: u8,
    pub background_color: u8,
    pub shift: ShiftConfig,
    fgcm: EgcQuad,
    bgcm: EgcQuad,
}

impl EgcRegisters {
    pub fn write_foreground_color(&mut self, color: u8) {
        self.foreground_color = color;
        self.fgcm = EgcQuad::from_color(color);
    }

    pub fn write_background_color(&mut self, color: u8) {
        self.background_color = color;
        self.bgcm = EgcQuad::from_color(color);
    }

    pub fn fgcm(&self) -> &EgcQuad {
        &self.fgcm
    }

    pub fn bgcm(&self) -> &EgcQuad {
        &self.bgcm
    }

    pub fn write_mode_register(&mut self, word: u16) {
        let reg = EgcModeRegister::from_bytes(word.to_le_bytes());
        self.fgc = reg.fgc();
        self.lead_plane = reg.lead_plane();
    }

    pub fn write_rop_register(&mut self, word: u16) {
        let reg = EgcRopRegister::from_bytes(word.to_le_bytes());
        self.rop = reg.rop();
        self.regload = reg.regload();
        self.shiftinput = reg.shiftinput();
        self.lightsource = reg.lightsource();
        self.compare_lead = !reg.no_compare_lead();
    }

    pub fn write_bit_address(&mut self, word: u16) {
        let reg = EgcBitAddressRegister::from_bytes(word.to_le_bytes());
        self.shift.srcbit = reg.srcbit();
        self.shift.dstbit = reg.dstbit();
        self.shift.descend = reg.descend();
    }

    pub fn write_bit_length(&mut self, word: u16) {
        self.shift.length = word & 0x0FFF;
    }
}

/// The EGC's internal registers: source, data and VRAM snapshot quads, the write masks and
/// the shifter.
#[derive(Clone, Default)]
pub struct EgcPipeline {
    src: EgcQuad,
    data: EgcQuad,
    last_vram: EgcQuad,
    srcmask: [u8; 2],
    maskef: [u8; 2],
    pub shifter: EgcShifter,
    warn: WarnOnce,
}

impl EgcPipeline {
    pub fn new() -> Self {
        EgcPipeline::default()
    }

    pub fn reset(&mut self, regs: &EgcRegisters) {
        *self = EgcPipeline::default();
        self.shifter.reinit(&regs.shift);
    }

    pub fn src(&self) -> &EgcQuad {
        &self.src
    }

    pub fn last_vram(&self) -> &EgcQuad {
        &self.last_vram
    }

    pub fn srcmask(&self) -> [u8; 2] {
        self.srcmask
    }

    pub fn maskef(&self) -> [u8; 2] {
        self.maskef
    }

    pub fn warnings(&self) -> &WarnOnce {
        &self.warn
    }

    /// Feed four plane values through the shifter into the source quad.
    fn shift<W: AccessWidth>(&mut self, regs: &EgcRegisters, input: [u16; 4], odd: usize) {
        self.shifter.input(input, W::BYTES, odd, &mut self.srcmask);
        self.shifter
            .output(&mut self.src, W::BYTES, odd, &mut self.srcmask, &regs.shift);
    }

    fn mask_with_source(&mut self) {
        self.maskef[0] &= self.srcmask[0];
        self.maskef[1] &= self.srcmask[1];
    }

    /// Compute the quad to be written for a CPU write of `val`, per the light source.
    /// Also computes the effective write mask.
    pub fn operate<W: AccessWidth>(
        &mut self,
        regs: &EgcRegisters,
        tiles: &EgcQuad,
        vram: &Vram,
        vramoff: usize,
        val: W,
    ) -> EgcQuad {
        let odd = vramoff & 1;
        self.maskef = regs.mask;

        match regs.lightsource {
            1 => {
                // Raster operation result
                if regs.shiftinput {
                    let v = val.to_u32() as u16;
                    self.shift::<W>(regs, [v; 4], odd);
                }
                self.mask_with_source();

                let ops = RopOperands {
                    src: &self.src,
                    tiles,
                    fgcm: &regs.fgcm,
                    bgcm: &regs.bgcm,
                    last_vram: &self.last_vram,
                    fgc: regs.fgc,
                    regload: regs.regload,
                    vram,
                    vramoff: vramoff & !1,
                };
                rop::apply(regs.rop, &ops, &mut self.warn)
            }
            2 => {
                // Color register
                match regs.fgc {
                    1 => regs.bgcm,
                    2 => regs.fgcm,
                    _ => {
                        if regs.shiftinput {
                            let v = val.to_u32() as u16;
                            self.shift::<W>(regs, [v; 4], odd);
                        }
                        self.mask_with_source();
                        self.src
                    }
                }
            }
            _ => {
                // CPU data, replicated to all planes
                let v = val.to_u32() as u16;
                let word = if W::BYTES == 1 { v | (v << 8) } else { v };
                self.data = EgcQuad([word; 4]);
                self.data
            }
        }
    }

    /// An EGC read of G-RAM. `vramoff` is the offset within the plane; `fulloff` is the
    /// undecoded offset used when not comparing against the lead plane.
    pub fn read<W: AccessWidth>(
        &mut self,
        regs: &EgcRegisters,
        tiles: &mut EgcQuad,
        vram: &Vram,
        vramoff: usize,
        fulloff: usize,
    ) -> W {
        let odd = vramoff & 1;

        for p in 0..4 {
            let v = vram.read::<W>(vramoff + PLANE_OFFSET * (p + 1));
            self.last_vram.set_lane::<W>(p, odd, v);
        }

        if !regs.shiftinput {
            let input = self.last_vram.lanes::<W>(odd);
            self.shift::<W>(regs, input, odd);
        }

        if regs.regload & 1 != 0 {
            for p in 0..4 {
                tiles.set_lane::<W>(p, odd, self.last_vram.lane::<W>(p, odd));
            }
        }

        if regs.compare_lead {
            let lead = (regs.lead_plane & 3) as usize;
            if !regs.shiftinput {
                return self.src.lane::<W>(lead, 0);
            }
            return vram.read::<W>(vramoff + PLANE_OFFSET * (lead + 1));
        }

        vram.read::<W>(fulloff)
    }

    /// An EGC write to G-RAM. Only planes not excluded by the access register are touched,
    /// and only in the bits of the effective write mask.
    pub fn write<W: AccessWidth>(
        &mut self,
        regs: &EgcRegisters,
        tiles: &mut EgcQuad,
        vram: &mut Vram,
        vramoff: usize,
        val: W,
    ) {
        let odd = vramoff & 1;

        if regs.regload & 2 != 0 {
            for p in 0..4 {
                let v = vram.read::<W>(vramoff + PLANE_OFFSET * (p + 1));
                tiles.set_lane::<W>(p, odd, v);
            }
        }

        let dst = self.operate::<W>(regs, tiles, vram, vramoff, val);
        let accmask = mask_lane::<W>(&self.maskef, odd).to_u32();
        if accmask == 0 {
            return;
        }

        for p in 0..4 {
            if regs.access & (1 << p) != 0 {
                continue;
            }
            let off = vramoff + PLANE_OFFSET * (p + 1);
            let old = vram.read::<W>(off).to_u32();
            let new = (old & !accmask) | (accmask & dst.lane::<W>(p, odd).to_u32());
            vram.write::<W>(off, W::from_u32(new));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs() -> EgcRegisters {
        let mut regs = EgcRegisters::default();
        regs.mask = [0xFF, 0xFF];
        regs.shift.length = 15;
        regs
    }

    #[test]
    fn test_quad_lanes() {
        let mut q = EgcQuad::default();
        q.set_lane::<u8>(2, 1, 0xAB);
        q.set_lane::<u8>(2, 0, 0xCD);
        assert_eq!(q.0[2], 0xABCD);
        assert_eq!(q.lane::<u8>(2, 1), 0xAB);
        assert_eq!(q.lane::<u16>(2, 0), 0xABCD);
        assert_eq!(EgcQuad::from_color(0b1001).0, [0xFFFF, 0, 0, 0xFFFF]);
    }

    #[test]
    fn test_register_decode() {
        let mut regs = EgcRegisters::default();
        regs.write_mode_register(0x4300);
        assert_eq!(regs.fgc, 2);
        assert_eq!(regs.lead_plane, 3);

        regs.write_rop_register(0x09F0);
        assert_eq!(regs.rop, 0xF0);
        assert_eq!(regs.regload, 1);
        assert!(!regs.shiftinput);
        assert_eq!(regs.lightsource, 1);
        assert!(regs.compare_lead);

        regs.write_rop_register(0x2400);
        assert!(!regs.compare_lead);
        assert!(regs.shiftinput);

        regs.write_bit_address(0x1052);
        assert!(regs.shift.descend);
        assert_eq!(regs.shift.dstbit, 5);
        assert_eq!(regs.shift.srcbit, 2);

        regs.write_bit_length(0xF123);
        assert_eq!(regs.shift.length, 0x123);
    }

    #[test]
    fn test_cpu_data_light_source() {
        let mut egc = EgcPipeline::new();
        let regs = regs();
        let vram = Vram::new(0x80000);
        let q = egc.operate::<u8>(&regs, &EgcQuad::default(), &vram, 0x11, 0x5A);
        assert_eq!(q.0, [0x5A5A; 4]);
        assert_eq!(egc.maskef(), [0xFF, 0xFF]);
    }

    #[test]
    fn test_color_light_source() {
        let mut egc = EgcPipeline::new();
        let mut regs = regs();
        regs.lightsource = 2;
        regs.fgc = 2;
        regs.write_foreground_color(0b0110);
        let vram = Vram::new(0x80000);
        let q = egc.operate::<u16>(&regs, &EgcQuad::default(), &vram, 0x10, 0);
        assert_eq!(q.0, [0, 0xFFFF, 0xFFFF, 0]);
    }

    #[test]
    fn test_copy_through_shifter() {
        // VRAM to VRAM copy: read plane data through the shifter, then write the source with ROP 0xF0.
        let mut regs = regs();
        regs.lightsource = 1;
        regs.rop = 0xF0;
        let mut egc = EgcPipeline::new();
        egc.reset(&regs);
        let mut tiles = EgcQuad::default();
        let mut vram = Vram::new(0x80000);
        for p in 0..4 {
            vram.write::<u16>(0x20 + PLANE_OFFSET * (p + 1), 0x1111 * (p as u16 + 1));
        }

        let _: u16 = egc.read::<u16>(&regs, &mut tiles, &vram, 0x20, 0x8020);
        assert_eq!(egc.src().0, [0x1111, 0x2222, 0x3333, 0x4444]);

        egc.write::<u16>(&regs, &mut tiles, &mut vram, 0x40, 0xFFFF);
        for p in 0..4 {
            assert_eq!(vram.read::<u16>(0x40 + PLANE_OFFSET * (p + 1)), 0x1111 * (p as u16 + 1));
        }
    }

    #[test]
    fn test_write_respects_access_and_mask() {
        let mut regs = regs();
        regs.access = 0b1010;
        regs.mask = [0x0F, 0xFF];
        let mut egc = EgcPipeline::new();
        let mut tiles = EgcQuad::default();
        let mut vram = Vram::new(0x80000);

        egc.write::<u8>(&regs, &mut tiles, &mut vram, 0x100, 0xFF);
        assert_eq!(vram.read_u8(0x100 + PLANE_OFFSET), 0x0F);
        assert_eq!(vram.read_u8(0x100 + PLANE_OFFSET * 2), 0x00);
        assert_eq!(vram.read_u8(0x100 + PLANE_OFFSET * 3), 0x0F);
        assert_eq!(vram.read_u8(0x100 + PLANE_OFFSET * 4), 0x00);
    }

    #[test]
    fn test_read_loads_pattern_register() {
        let mut regs = regs();
        regs.regload = 1;
        regs.shiftinput = true;
        let mut egc = EgcPipeline::new();
        let mut tiles = EgcQuad::default();
        let mut vram = Vram::new(0x80000);
        vram.write_u8(0x201 + PLANE_OFFSET * 3, 0x77);
        vram.write_u8(0x8201, 0x99);

        let v: u8 = egc.read::<u8>(&regs, &mut tiles, &vram, 0x201, 0x8201);
        assert_eq!(tiles.byte(2, 1), 0x77);
        assert_eq!(v, 0x99);

        regs.compare_lead = true;
        regs.lead_plane = 2;
        let v: u8 = egc.read::<u8>(&regs, &mut tiles, &vram, 0x201, 0x8201);
        assert_eq!(v, 0x77);
    }
}
