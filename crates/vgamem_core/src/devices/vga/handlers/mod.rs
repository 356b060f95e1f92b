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

    devices::vga::handlers::mod.rs

    The set of page handler strategies. Each physical page of the adapter's
    window is bound to exactly one handler, which translates a CPU access
    into a VRAM (or register) access for the current mode.

*/

pub mod chained;
pub mod legacy;
pub mod linear;
pub mod planar;

use enum_dispatch::enum_dispatch;
use strum_macros::IntoStaticStr;

pub use chained::{ChainedEgaHandler, ChainedVgaHandler, ChainedVgaSlowHandler, Et4000Handler, Et4000SlowHandler};
pub use legacy::{AmstradHandler, CgaTextHandler, HerculesHandler, PcJrHandler, SlowCgaHandler, TandyHandler};
pub use linear::{EmptyHandler, LfbHandler, MapHandler, MmioHandler};
pub use planar::{Lin4Handler, TextHandler, UnchainedEgaHandler, UnchainedVgaHandler};

use super::VgaMemory;
use crate::bus::AccessWidth;

#[enum_dispatch]
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum PageHandler {
    MapHandler,
    LfbHandler,
    MmioHandler,
    EmptyHandler,
    TextHandler,
    Lin4Handler,
    UnchainedEgaHandler,
    UnchainedVgaHandler,
    ChainedEgaHandler,
    ChainedVgaHandler,
    ChainedVgaSlowHandler,
    Et4000Handler,
    Et4000SlowHandler,
    SlowCgaHandler,
    CgaTextHandler,
    TandyHandler,
    PcJrHandler,
    HerculesHandler,
    AmstradHandler,
    Pc98Handler,
}

impl PageHandler {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A memory access strategy. `addr` is always the full physical address of the access.
///
/// The wide accesses default to byte sequences. Handlers that charge an access delay override
/// them, since the delay is charged once per CPU access regardless of width.
#[enum_dispatch(PageHandler)]
pub trait VgaPageHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8;
    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8);

    fn readw(&self, vga: &mut VgaMemory, addr: usize) -> u16 {
        self.readb(vga, addr) as u16 | (self.readb(vga, addr + 1) as u16) << 8
    }

    fn readd(&self, vga: &mut VgaMemory, addr: usize) -> u32 {
        self.readw(vga, addr) as u32 | (self.readw(vga, addr + 2) as u32) << 16
    }

    fn writew(&self, vga: &mut VgaMemory, addr: usize, val: u16) {
        self.writeb(vga, addr, val as u8);
        self.writeb(vga, addr + 1, (val >> 8) as u8);
    }

    fn writed(&self, vga: &mut VgaMemory, addr: usize, val: u32) {
        self.writew(vga, addr, val as u16);
        self.writew(vga, addr + 2, (val >> 16) as u16);
    }
}

/// Assemble a little-endian value of width W from per-byte reads.
#[inline]
pub(crate) fn gather<W: AccessWidth>(mut read: impl FnMut(usize) -> u8) -> W {
    let mut value = 0u32;
    for i in 0..W::BYTES {
        value |= (read(i) as u32) << (i * 8);
    }
    W::from_u32(value)
}

/// Split a value of width W into per-byte writes, lowest byte first.
#[inline]
pub(crate) fn scatter<W: AccessWidth>(val: W, mut write: impl FnMut(usize, u8)) {
    let value = val.to_u32();
    for i in 0..W::BYTES {
        write(i, (value >> (i * 8)) as u8);
    }
}

/// Implement every access width of [VgaPageHandler] through a pair of width-generic functions.
macro_rules! width_generic_handler {
    ($handler:ty, $read:ident, $write:ident) => {
        impl $crate::devices::vga::handlers::VgaPageHandler for $handler {
            #[inline]
            fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
                $read::<u8>(vga, addr)
            }
            #[inline]
            fn readw(&self, vga: &mut VgaMemory, addr: usize) -> u16 {
                $read::<u16>(vga, addr)
            }
            #[inline]
            fn readd(&self, vga: &mut VgaMemory, addr: usize) -> u32 {
                $read::<u32>(vga, addr)
            }
            #[inline]
            fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
                $write::<u8>(vga, addr, val)
            }
            #[inline]
            fn writew(&self, vga: &mut VgaMemory, addr: usize, val: u16) {
                $write::<u16>(vga, addr, val)
            }
            #[inline]
            fn writed(&self, vga: &mut VgaMemory, addr: usize, val: u32) {
                $write::<u32>(vga, addr, val)
            }
        }
    };
}
pub(crate) use width_generic_handler;

/// Routes the whole window to the PC-98 memory decoder. Word accesses at odd addresses are
/// split into bytes, as an 8086 bus would.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pc98Handler;

impl VgaPageHandler for Pc98Handler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        vga.pc98.read::<u8>(&vga.vram, addr)
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        vga.pc98.write::<u8>(&mut vga.vram, addr, val)
    }

    fn readw(&self, vga: &mut VgaMemory, addr: usize) -> u16 {
        if addr & 1 == 0 {
            vga.pc98.read::<u16>(&vga.vram, addr)
        }
        else {
            self.readb(vga, addr) as u16 | (self.readb(vga, addr + 1) as u16) << 8
        }
    }

    fn writew(&self, vga: &mut VgaMemory, addr: usize, val: u16) {
        if addr & 1 == 0 {
            vga.pc98.write::<u16>(&mut vga.vram, addr, val)
        }
        else {
            self.writeb(vga, addr, val as u8);
            self.writeb(vga, addr + 1, (val >> 8) as u8);
        }
    }
}
