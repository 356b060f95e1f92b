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

    devices::vga::handlers::linear.rs

    Handlers for directly mapped memory: the banked linear window, the
    linear framebuffer, the accelerator MMIO window, and the empty window.

*/

use super::{width_generic_handler, VgaPageHandler};
use crate::{
    bus::{AccessWidth, OPEN_BUS_BYTE, PAGE_MASK, PAGE_SHIFT},
    devices::vga::VgaMemory,
};

/// Direct byte-for-byte map of the decoded window onto VRAM, offset by the active bank.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MapHandler;

impl MapHandler {
    #[inline]
    fn offset(vga: &VgaMemory, addr: usize, bank: usize) -> usize {
        let page = (addr >> PAGE_SHIFT).wrapping_sub(vga.pages.base);
        vga.vram.checked(bank + (page << PAGE_SHIFT)) + (addr & PAGE_MASK)
    }
}

impl VgaPageHandler for MapHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        let offset = MapHandler::offset(vga, addr, vga.banks.read_full());
        vga.vram.read_u8(offset)
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        let offset = MapHandler::offset(vga, addr, vga.banks.write_full());
        vga.vram.write_u8(offset, val);
    }
}

/// The linear framebuffer. Wraps at the size of VRAM.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LfbHandler;

impl LfbHandler {
    #[inline]
    fn offset(vga: &VgaMemory, addr: usize) -> usize {
        let page_mask = (vga.vmemsize >> PAGE_SHIFT).saturating_sub(1);
        let page = (addr >> PAGE_SHIFT).wrapping_sub(vga.lfb.page) & page_mask;
        vga.vram.checked(page << PAGE_SHIFT) + (addr & PAGE_MASK)
    }
}

impl VgaPageHandler for LfbHandler {
    fn readb(&self, vga: &mut VgaMemory, addr: usize) -> u8 {
        let offset = LfbHandler::offset(vga, addr);
        vga.vram.read_u8(offset)
    }

    fn writeb(&self, vga: &mut VgaMemory, addr: usize, val: u8) {
        let offset = LfbHandler::offset(vga, addr);
        vga.vram.write_u8(offset, val);
    }
}

/// Forwards accesses to the accelerator's register file. The port is the offset within the
/// 64K window.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MmioHandler;

fn mmio_read<W: AccessWidth>(vga: &mut VgaMemory, addr: usize) -> W {
    vga.delay_read();
    W::from_u32(vga.accel.xga_read(addr & 0xFFFF, W::BYTES))
}

fn mmio_write<W: AccessWidth>(vga: &mut VgaMemory, addr: usize, val: W) {
    vga.delay_write();
    vga.accel.xga_write(addr & 0xFFFF, val.to_u32(), W::BYTES);
}

width_generic_handler!(MmioHandler, mmio_read, mmio_write);

/// Nothing behind the window.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EmptyHandler;

impl VgaPageHandler for EmptyHandler {
    fn readb(&self, _vga: &mut VgaMemory, _addr: usize) -> u8 {
        OPEN_BUS_BYTE
    }

    fn writeb(&self, _vga: &mut VgaMemory, _addr: usize, _val: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AdapterConfig,
        devices::vga::{AcceleratorPorts, VGA_PAGE_A0},
        machine_types::{MachineType, SvgaCard, VideoMode},
    };
    use std::{cell::RefCell, rc::Rc};

    fn vga(svga: SvgaCard) -> VgaMemory {
        VgaMemory::new(&AdapterConfig::new(MachineType::Vga, svga, 1024)).unwrap()
    }

    #[test]
    fn test_map_uses_bank() {
        let mut vga = vga(SvgaCard::TsengEt4k);
        vga.set_mode(VideoMode::Lin16);
        vga.set_bank(1, 2);

        MapHandler.writeb(&mut vga, 0xA0010, 0x5A);
        assert_eq!(vga.vram().read_u8(0x20010), 0x5A);

        vga.vram_mut().write_u8(0x11234, 0xC3);
        assert_eq!(MapHandler.readb(&mut vga, 0xA1234), 0xC3);
        assert_eq!(vga.pages().base, VGA_PAGE_A0);
    }

    #[test]
    fn test_lfb_wraps_at_vram_size() {
        let mut vga = vga(SvgaCard::S3Trio);
        vga.lfb.page = 0xE0000;
        LfbHandler.writeb(&mut vga, 0xE000_0004, 0x11);
        assert_eq!(vga.vram().read_u8(4), 0x11);

        // One megabyte past the base is back at the start of VRAM
        assert_eq!(LfbHandler.readb(&mut vga, 0xE010_0004), 0x11);
        LfbHandler.writew(&mut vga, 0xE000_0FFE, 0xBEEF);
        assert_eq!(vga.vram().read::<u16>(0xFFE), 0xBEEF);
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<(usize, u32, usize)>,
    }

    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl AcceleratorPorts for SharedRecorder {
        fn xga_read(&mut self, port: usize, len: usize) -> u32 {
            (port as u32) | (len as u32) << 16
        }

        fn xga_write(&mut self, port: usize, val: u32, len: usize) {
            self.0.borrow_mut().log.push((port, val, len));
        }
    }

    #[test]
    fn test_mmio_forwards_to_accelerator() {
        let mut vga = vga(SvgaCard::S3Trio);
        assert_eq!(MmioHandler.readd(&mut vga, 0xA8100), 0);

        let recorder = Rc::new(RefCell::new(Recorder::default()));
        vga.set_accelerator(Box::new(SharedRecorder(recorder.clone())));
        MmioHandler.writew(&mut vga, 0xA8100, 0x1234);
        MmioHandler.writed(&mut vga, 0xE101_8200, 0xCAFEBABE);
        assert_eq!(recorder.borrow().log, vec![(0x8100, 0x1234, 2), (0x8200, 0xCAFEBABE, 4)]);

        assert_eq!(MmioHandler.readb(&mut vga, 0xA8104), 0x04);
        assert_eq!(MmioHandler.readd(&mut vga, 0xA8104), 0x0004_8104);
    }

    #[test]
    fn test_empty_floats() {
        let mut vga = vga(SvgaCard::None);
        EmptyHandler.writeb(&mut vga, 0xA0000, 0x00);
        assert_eq!(EmptyHandler.readb(&mut vga, 0xA0000), 0xFF);
        assert_eq!(EmptyHandler.readd(&mut vga, 0xA0000), 0xFFFF_FFFF);
    }
}
