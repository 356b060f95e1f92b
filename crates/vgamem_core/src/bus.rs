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

    bus.rs

    Defines the bus-facing surface of the adapter: the memory mapped device
    trait, the access width abstraction shared by the width-generic handlers,
    and the page table binding physical 4K pages to handler strategies.

*/

use std::fmt;

use crate::devices::vga::handlers::{LfbHandler, MmioHandler, PageHandler};

pub const OPEN_BUS_BYTE: u8 = 0xFF;

pub const PAGE_SHIFT: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
pub const PAGE_MASK: usize = PAGE_SIZE - 1;
/// Number of 4K pages in the first megabyte of physical address space.
pub const LEGACY_PAGES: usize = 0x100;

/// Offset of the accelerator MMIO window above the linear framebuffer base.
pub const LFB_MMIO_OFFSET: usize = 0x0100_0000;
pub const LFB_MMIO_PAGES: usize = 16;

pub trait MemoryMappedDevice {
    fn mmio_read_u8(&mut self, address: usize) -> u8;
    fn mmio_read_u16(&mut self, address: usize) -> u16;
    fn mmio_read_u32(&mut self, address: usize) -> u32;

    fn mmio_write_u8(&mut self, address: usize, data: u8);
    fn mmio_write_u16(&mut self, address: usize, data: u16);
    fn mmio_write_u32(&mut self, address: usize, data: u32);

    fn get_mapping(&self) -> Vec<MemRangeDescriptor>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemRangeDescriptor {
    pub address: usize,
    pub size: usize,
    pub cycle_cost: u32,
    pub read_only: bool,
    pub priority: u32,
}

impl MemRangeDescriptor {
    pub fn new(address: usize, size: usize, read_only: bool) -> Self {
        Self {
            address,
            size,
            cycle_cost: 0,
            read_only,
            priority: 1,
        }
    }
}

/// An integer access width. Implemented for the byte, word and doubleword accesses a CPU can issue.
/// Values are always little-endian when laid out in VRAM.
pub trait AccessWidth: Copy + Default + Eq + fmt::Debug + 'static {
    const BYTES: usize;
    const ONES: Self;

    /// Truncating conversion from a 32-bit value.
    fn from_u32(value: u32) -> Self;
    fn to_u32(self) -> u32;
}

macro_rules! impl_access_width {
    ($t:ty, $bytes:expr) => {
        impl AccessWidth for $t {
            const BYTES: usize = $bytes;
            const ONES: Self = <$t>::MAX;

            #[inline(always)]
            fn from_u32(value: u32) -> Self {
                value as $t
            }

            #[inline(always)]
            fn to_u32(self) -> u32 {
                self as u32
            }
        }
    };
}

impl_access_width!(u8, 1);
impl_access_width!(u16, 2);
impl_access_width!(u32, 4);

/// What a physical page currently decodes to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PageBinding {
    /// Nothing answers; reads float to open bus.
    #[default]
    Unmapped,
    /// The page has been handed back to system RAM. The host bus owns it.
    Ram,
    Handler(PageHandler),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub start_page: usize,
    pub pages: usize,
}

impl PageRange {
    #[inline]
    pub fn contains(&self, page: usize) -> bool {
        page >= self.start_page && page < self.start_page + self.pages
    }

    pub fn address(&self) -> usize {
        self.start_page << PAGE_SHIFT
    }

    pub fn size(&self) -> usize {
        self.pages << PAGE_SHIFT
    }
}

/// Maps physical pages to handler strategies. The first megabyte is a flat table; the linear
/// framebuffer and its MMIO companion window are tracked as ranges since they may sit anywhere
/// in the 32-bit space.
pub struct PageTable {
    legacy: [PageBinding; LEGACY_PAGES],
    lfb: Option<PageRange>,
    lfb_mmio: Option<PageRange>,
    epoch: u64,
}

impl Default for PageTable {
    fn default() -> Self {
        Self {
            legacy: [PageBinding::Unmapped; LEGACY_PAGES],
            lfb: None,
            lfb_mmio: None,
            epoch: 0,
        }
    }
}

impl PageTable {
    pub fn new() -> Self {
        PageTable::default()
    }

    pub fn reset(&mut self) {
        let epoch = self.epoch;
        *self = PageTable::default();
        self.epoch = epoch.wrapping_add(1);
    }

    /// Bind `pages` pages starting at physical page `page`. Pages beyond the first megabyte are ignored.
    pub fn set_range(&mut self, page: usize, pages: usize, binding: PageBinding) {
        let end = (page + pages).min(LEGACY_PAGES);
        if page >= end {
            return;
        }
        log::trace!("Binding pages {:02X}-{:02X} to {:?}", page, end - 1, binding);
        self.legacy[page..end].fill(binding);
    }

    pub fn set_handler(&mut self, page: usize, pages: usize, handler: impl Into<PageHandler>) {
        self.set_range(page, pages, PageBinding::Handler(handler.into()));
    }

    /// Map the linear framebuffer at `page` along with its MMIO window, or unmap both if `pages` is 0.
    pub fn set_lfb(&mut self, page: usize, pages: usize) {
        if pages == 0 {
            self.lfb = None;
            self.lfb_mmio = None;
            return;
        }
        self.lfb = Some(PageRange { start_page: page, pages });
        self.lfb_mmio = Some(PageRange {
            start_page: page + (LFB_MMIO_OFFSET >> PAGE_SHIFT),
            pages: LFB_MMIO_PAGES,
        });
    }

    pub fn lfb(&self) -> Option<PageRange> {
        self.lfb
    }

    pub fn lfb_mmio(&self) -> Option<PageRange> {
        self.lfb_mmio
    }

    /// Incremented whenever the binding set changes. Hosts caching translations should flush
    /// them when this moves.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    #[inline]
    pub fn page_binding(&self, page: usize) -> PageBinding {
        if page < LEGACY_PAGES {
            return self.legacy[page];
        }
        if let Some(lfb) = self.lfb {
            if lfb.contains(page) {
                return PageBinding::Handler(LfbHandler.into());
            }
        }
        if let Some(mmio) = self.lfb_mmio {
            if mmio.contains(page) {
                return PageBinding::Handler(MmioHandler.into());
            }
        }
        PageBinding::Unmapped
    }

    #[inline]
    pub fn binding(&self, address: usize) -> PageBinding {
        self.page_binding(address >> PAGE_SHIFT)
    }

    /// Collapse the page table into contiguous runs of identical binding, for bus registration.
    pub fn runs(&self) -> Vec<(PageRange, PageBinding)> {
        let mut runs: Vec<(PageRange, PageBinding)> = Vec::new();
        for (page, binding) in self.legacy.iter().enumerate() {
            if *binding == PageBinding::Unmapped {
                continue;
            }
            match runs.last_mut() {
                Some((range, last)) if *last == *binding && range.start_page + range.pages == page => {
                    range.pages += 1;
                }
                _ => runs.push((PageRange { start_page: page, pages: 1 }, *binding)),
            }
        }
        if let Some(lfb) = self.lfb {
            runs.push((lfb, PageBinding::Handler(LfbHandler.into())));
        }
        if let Some(mmio) = self.lfb_mmio {
            runs.push((mmio, PageBinding::Handler(MmioHandler.into())));
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::vga::handlers::{EmptyHandler, MapHandler};

    #[test]
    fn test_set_range_clips_to_first_megabyte() {
        let mut table = PageTable::new();
        table.set_handler(0xF8, 0x20, EmptyHandler);
        assert_eq!(table.binding(0xFF000), PageBinding::Handler(EmptyHandler.into()));
        assert_eq!(table.binding(0x100000), PageBinding::Unmapped);
    }

    #[test]
    fn test_runs_merge_adjacent_pages() {
        let mut table = PageTable::new();
        table.set_handler(0xA0, 16, MapHandler);
        table.set_handler(0xB0, 8, EmptyHandler);
        table.set_range(0xB8, 8, PageBinding::Ram);
        let runs = table.runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].0, PageRange { start_page: 0xA0, pages: 16 });
        assert_eq!(runs[2].1, PageBinding::Ram);
    }

    #[test]
    fn test_lfb_and_mmio_windows() {
        let mut table = PageTable::new();
        table.set_lfb(0xE0000, 0x100);
        assert_eq!(table.binding(0xE000_0000), PageBinding::Handler(LfbHandler.into()));
        assert_eq!(table.binding(0xE00F_FFFF), PageBinding::Handler(LfbHandler.into()));
        assert_eq!(table.binding(0xE100_0000), PageBinding::Handler(MmioHandler.into()));
        assert_eq!(table.binding(0xE101_0000), PageBinding::Unmapped);
        table.set_lfb(0, 0);
        assert_eq!(table.binding(0xE000_0000), PageBinding::Unmapped);
    }

    #[test]
    fn test_access_width_truncates() {
        assert_eq!(u8::from_u32(0x1234), 0x34);
        assert_eq!(u16::from_u32(0x12345678), 0x5678);
        assert_eq!(<u16 as AccessWidth>::ONES, 0xFFFF);
        assert_eq!(<u32 as AccessWidth>::BYTES, 4);
    }
}
