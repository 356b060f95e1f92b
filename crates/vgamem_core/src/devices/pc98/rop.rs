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

    devices::pc98::rop.rs

    EGC raster operation table.

    The ROP selector is an 8-bit minterm code over three inputs: the shifter
    output (source, 0xF0), VRAM (destination, 0xCC) and the pattern (0xAA).
    Only a handful of codes are implemented. All others return the VRAM
    snapshot latched by the last EGC read, and are reported once.

*/

use super::egc::EgcQuad;
use crate::{
    devices::vga::vram::Vram,
    util::{Diagnostic, WarnOnce},
};

/// Offset of plane 0 within a G-RAM page. Plane n lives at PLANE_OFFSET * (n + 1).
pub const PLANE_OFFSET: usize = 0x8000;

/// Everything a raster operation may combine.
pub struct RopOperands<'a> {
    pub src: &'a EgcQuad,
    pub tiles: &'a EgcQuad,
    pub fgcm: &'a EgcQuad,
    pub bgcm: &'a EgcQuad,
    pub last_vram: &'a EgcQuad,
    pub fgc: u8,
    pub regload: u8,
    pub vram: &'a Vram,
    /// Word-aligned offset within the G-RAM page.
    pub vramoff: usize,
}

impl RopOperands<'_> {
    /// Current VRAM contents of all four planes.
    fn destination(&self) -> [u16; 4] {
        std::array::from_fn(|p| self.vram.read::<u16>(self.vramoff + PLANE_OFFSET * (p + 1)))
    }

    /// The pattern term, chosen by the foreground/background color select.
    fn pattern(&self) -> &EgcQuad {
        match self.fgc {
            1 => self.bgcm,
            2 => self.fgcm,
            _ => {
                if self.regload & 1 != 0 {
                    self.src
                }
                else {
                    self.tiles
                }
            }
        }
    }
}

pub type RopFn = fn(u8, &RopOperands) -> EgcQuad;

const IMPLEMENTED_ROPS: &[(u8, RopFn)] = &[
    (0x0C, rop_src_dst_terms),
    (0xAC, rop_pattern_terms),
    (0xC0, rop_src_and_dst),
    (0xF0, rop_src),
    (0xFC, rop_src_or_dst),
];

pub fn lookup(code: u8) -> Option<RopFn> {
    IMPLEMENTED_ROPS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, f)| *f)
}

pub fn is_implemented(code: u8) -> bool {
    lookup(code).is_some()
}

/// Run raster operation `code`. Unimplemented codes hand back the last latched VRAM snapshot.
pub fn apply(code: u8, ops: &RopOperands, warn: &mut WarnOnce) -> EgcQuad {
    match lookup(code) {
        Some(rop) => rop(code, ops),
        None => {
            if warn.first(Diagnostic::UnimplementedEgcRop, code as u32) {
                log::warn!("EGC ROP 0x{:02X} not implemented", code);
            }
            *ops.last_vram
        }
    }
}

/// Sum of the source/destination minterms selected by bits 7, 5, 3 and 1 of the code.
fn rop_src_dst_terms(code: u8, ops: &RopOperands) -> EgcQuad {
    let dst = ops.destination();
    let mut out = EgcQuad::default();
    for p in 0..4 {
        let s = ops.src.0[p];
        let d = dst[p];
        let mut v = 0;
        if code & 0x80 != 0 {
            v |= s & d;
        }
        if code & 0x20 != 0 {
            v |= s & !d;
        }
        if code & 0x08 != 0 {
            v |= !s & d;
        }
        if code & 0x02 != 0 {
            v |= !s & !d;
        }
        out.0[p] = v;
    }
    out
}

/// Sum of all eight pattern/source/destination minterms selected by the code.
fn rop_pattern_terms(code: u8, ops: &RopOperands) -> EgcQuad {
    let dst = ops.destination();
    let pat = ops.pattern();
    let mut out = EgcQuad::default();
    for p in 0..4 {
        let (t, s, d) = (pat.0[p], ops.src.0[p], dst[p]);
        let mut v = 0;
        if code & 0x80 != 0 {
            v |= t & s & d;
        }
        if code & 0x40 != 0 {
            v |= !t & s & d;
        }
        if code & 0x20 != 0 {
            v |= t & s & !d;
        }
        if code & 0x10 != 0 {
            v |= !t & s & !d;
        }
        if code & 0x08 != 0 {
            v |= t & !s & d;
        }
        if code & 0x04 != 0 {
            v |= !t & !s & d;
        }
        if code & 0x02 != 0 {
            v |= t & !s & !d;
        }
        if code & 0x01 != 0 {
            v |= !t & !s & !d;
        }
        out.0[p] = v;
    }
    out
}

fn rop_src_and_dst(_code: u8, ops: &RopOperands) -> EgcQuad {
    let dst = ops.destination();
    EgcQuad(std::array::from_fn(|p| ops.src.0[p] & dst[p]))
}

fn rop_src(_code: u8, ops: &RopOperands) -> EgcQuad {
    *ops.src
}

fn rop_src_or_dst(_code: u8, ops: &RopOperands) -> EgcQuad {
    let dst = ops.destination();
    EgcQuad(std::array::from_fn(|p| {
        let s = ops.src.0[p];
        s | (!s & dst[p])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        src: EgcQuad,
        tiles: EgcQuad,
        fgcm: EgcQuad,
        bgcm: EgcQuad,
        last_vram: EgcQuad,
        vram: Vram,
    }

    impl Fixture {
        fn new(dst: u16) -> Self {
            let mut vram = Vram::new(0x80000);
            for p in 0..4 {
                vram.write::<u16>(0x100 + PLANE_OFFSET * (p + 1), dst);
            }
            Self {
                src: EgcQuad([0xF0F0, 0x0F0F, 0xFFFF, 0x0000]),
                tiles: EgcQuad([0xAAAA; 4]),
                fgcm: EgcQuad([0xFFFF, 0, 0xFFFF, 0]),
                bgcm: EgcQuad([0, 0xFFFF, 0, 0xFFFF]),
                last_vram: EgcQuad([0x1234, 0x5678, 0x9ABC, 0xDEF0]),
                vram,
            }
        }

        fn ops(&self, fgc: u8, regload: u8) -> RopOperands<'_> {
            RopOperands {
                src: &self.src,
                tiles: &self.tiles,
                fgcm: &self.fgcm,
                bgcm: &self.bgcm,
                last_vram: &self.last_vram,
                fgc,
                regload,
                vram: &self.vram,
                vramoff: 0x100,
            }
        }
    }

    #[test]
    fn test_source_passes_through() {
        let mut warn = WarnOnce::new();
        for dst in [0x0000, 0x5A5A, 0xFFFF] {
            let f = Fixture::new(dst);
            assert_eq!(apply(0xF0, &f.ops(0, 0), &mut warn), f.src);
        }
        assert_eq!(warn.count(), 0);
    }

    #[test]
    fn test_and_or_terms() {
        let mut warn = WarnOnce::new();
        let f = Fixture::new(0x00FF);
        assert_eq!(
            apply(0xC0, &f.ops(0, 0), &mut warn).0,
            [0x00F0, 0x000F, 0x00FF, 0x0000]
        );
        assert_eq!(
            apply(0xFC, &f.ops(0, 0), &mut warn).0,
            [0xF0FF, 0x0FFF, 0xFFFF, 0x00FF]
        );
        // ~S & D
        assert_eq!(
            apply(0x0C, &f.ops(0, 0), &mut warn).0,
            [0x000F, 0x00F0, 0x0000, 0x00FF]
        );
    }

    #[test]
    fn test_pattern_terms_follow_color_select() {
        let mut warn = WarnOnce::new();
        let f = Fixture::new(0x0000);
        // 0xAC over a cleared destination reduces to P & S
        assert_eq!(
            apply(0xAC, &f.ops(2, 0), &mut warn).0,
            [0xF0F0, 0x0000, 0xFFFF, 0x0000]
        );
        assert_eq!(
            apply(0xAC, &f.ops(1, 0), &mut warn).0,
            [0x0000, 0x0F0F, 0x0000, 0x0000]
        );
        assert_eq!(
            apply(0xAC, &f.ops(0, 0), &mut warn).0,
            [0xA0A0, 0x0A0A, 0xAAAA, 0x0000]
        );
        // Pattern from the source: P & S = S
        assert_eq!(apply(0xAC, &f.ops(0, 1), &mut warn), f.src);
    }

    #[test]
    fn test_unimplemented_returns_stale_snapshot() {
        let mut warn = WarnOnce::new();
        let f = Fixture::new(0x1111);
        let g = Fixture::new(0xEEEE);
        assert!(!is_implemented(0x33));
        assert_eq!(apply(0x33, &f.ops(0, 0), &mut warn), f.last_vram);
        assert_eq!(apply(0x33, &g.ops(2, 1), &mut warn), g.last_vram);
        assert_eq!(apply(0x96, &f.ops(0, 0), &mut warn), f.last_vram);
        assert_eq!(warn.count(), 2);
    }

    #[test]
    fn test_implemented_set() {
        let implemented: Vec<u8> = (0..=255u8).filter(|c| is_implemented(*c)).collect();
        assert_eq!(implemented, vec![0x0C, 0xAC, 0xC0, 0xF0, 0xFC]);
    }
}
