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

    devices::vga::mmio.rs

    Implements the MemoryMappedDevice trait for the adapter memory. Every
    access is routed through the page table to the handler bound to its
    page.

*/

use super::{handlers::VgaPageHandler, VgaMemory};
use crate::bus::{
    AccessWidth,
    MemRangeDescriptor,
    MemoryMappedDevice,
    PageBinding,
    OPEN_BUS_BYTE,
    PAGE_MASK,
    PAGE_SIZE,
};

impl VgaMemory {
    /// Accesses that run off the end of a page are split so each byte reaches its own handler.
    #[inline]
    fn crosses_page<W: AccessWidth>(address: usize) -> bool {
        (address & PAGE_MASK) + W::BYTES > PAGE_SIZE
    }

    fn bus_read<W: AccessWidth>(&mut self, address: usize) -> W {
        if !self.vram.is_allocated() {
            return W::ONES;
        }
        if W::BYTES > 1 && VgaMemory::crosses_page::<W>(address) {
            let mut value = 0u32;
            for i in 0..W::BYTES {
                value |= (self.bus_read::<u8>(address + i) as u32) << (i * 8);
            }
            return W::from_u32(value);
        }

        match self.page_table.binding(address) {
            PageBinding::Handler(handler) => {
                let value = match W::BYTES {
                    1 => handler.readb(self, address) as u32,
                    2 => handler.readw(self, address) as u32,
                    _ => handler.readd(self, address),
                };
                W::from_u32(value)
            }
            PageBinding::Unmapped | PageBinding::Ram => W::from_u32(u32::from_le_bytes([OPEN_BUS_BYTE; 4])),
        }
    }

    fn bus_write<W: AccessWidth>(&mut self, address: usize, data: W) {
        if !self.vram.is_allocated() {
            return;
        }
        if W::BYTES > 1 && VgaMemory::crosses_page::<W>(address) {
            let value = data.to_u32();
            for i in 0..W::BYTES {
                self.bus_write::<u8>(address + i, (value >> (i * 8)) as u8);
            }
            return;
        }

        if let PageBinding::Handler(handler) = self.page_table.binding(address) {
            match W::BYTES {
                1 => handler.writeb(self, address, data.to_u32() as u8),
                2 => handler.writew(self, address, data.to_u32() as u16),
                _ => handler.writed(self, address, data.to_u32()),
            }
        }
    }
}

impl MemoryMappedDevice for VgaMemory {
    fn mmio_read_u8(&mut self, address: usize) -> u8 {
        self.bus_read::<u8>(address)
    }

    fn mmio_read_u16(&mut self, address: usize) -> u16 {
        self.bus_read::<u16>(address)
    }

    fn mmio_read_u32(&mut self, address: usize) -> u32 {
        self.bus_read::<u32>(address)
    }

    fn mmio_write_u8(&mut self, address: usize, data: u8) {
        self.bus_write(address, data)
    }

    fn mmio_write_u16(&mut self, address: usize, data: u16) {
        self.bus_write(address, data)
    }

    fn mmio_write_u32(&mut self, address: usize, data: u32) {
        self.bus_write(address, data)
    }

    /// The windows this device currently decodes. Pages handed back to RAM are the host's.
    fn get_mapping(&self) -> Vec<MemRangeDescriptor> {
        self.page_table
            .runs()
            .into_iter()
            .filter(|(_, binding)| matches!(binding, PageBinding::Handler(_)))
            .map(|(range, _)| MemRangeDescriptor::new(range.address(), range.size(), false))
            .collect()
    }
}
