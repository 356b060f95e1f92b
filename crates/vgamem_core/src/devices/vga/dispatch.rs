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

    devices::vga::dispatch.rs

    Chooses the page handler for the adapter window from the machine type,
    the video mode and the graphics controller's memory map, and binds it
    into the page table.

*/

use super::{
    graphics_controller::MemoryMap,
    handlers::{
        AmstradHandler,
        CgaTextHandler,
        ChainedEgaHandler,
        ChainedVgaHandler,
        ChainedVgaSlowHandler,
        EmptyHandler,
        Et4000Handler,
        Et4000SlowHandler,
        HerculesHandler,
        Lin4Handler,
        MapHandler,
        MmioHandler,
        PageHandler,
        PcJrHandler,
        Pc98Handler,
        SlowCgaHandler,
        TandyHandler,
        TextHandler,
        UnchainedEgaHandler,
        UnchainedVgaHandler,
    },
    MemBase,
    VgaMemory,
    VGA_PAGES,
    VGA_PAGE_A0,
    VGA_PAGE_B0,
    VGA_PAGE_B8,
    PC98_PAGE_E0,
};
use crate::{
    bus::{PageBinding, PAGE_SHIFT},
    machine_types::{MachineType, SvgaCard, VideoMode},
};

const TANDY_BANK_SIZE: usize = 16 * 1024;

impl VgaMemory {
    /// Rebind the adapter window for the current machine, mode and memory map. Called after any
    /// register write that can change the decode.
    pub fn setup_handlers(&mut self) {
        self.banks.recalculate();

        match self.machine {
            MachineType::Cga => {
                if self.cga_snow_enabled && self.mode.is_cga_text() {
                    self.page_table.set_handler(VGA_PAGE_B8, 8, CgaTextHandler);
                }
                else {
                    self.page_table.set_handler(VGA_PAGE_B8, 8, SlowCgaHandler);
                }
                return self.handlers_done();
            }
            MachineType::PcJr => {
                self.tandy.mem_base = MemBase::shared(self.tandy.mem_bank as usize * TANDY_BANK_SIZE);
                self.page_table.set_handler(VGA_PAGE_B8, 8, PcJrHandler);
                return self.handlers_done();
            }
            MachineType::Hercules => {
                self.pages.base = VGA_PAGE_B0;
                let graphics = self.herc.enable_bits & 0x01 != 0;
                let handler: PageHandler = if graphics {
                    MapHandler.into()
                }
                else {
                    HerculesHandler.into()
                };
                if self.herc.enable_bits & 0x02 != 0 {
                    self.pages.mask = 0xFFFF;
                    self.page_table.set_handler(VGA_PAGE_B0, 16, handler);
                }
                else {
                    // 32K mode leaves a hole at B8000
                    self.pages.mask = 0x7FFF;
                    self.page_table.set_handler(VGA_PAGE_B0, 8, handler);
                    self.page_table.set_handler(VGA_PAGE_B8, 8, EmptyHandler);
                }
                return self.handlers_done();
            }
            MachineType::Tandy => {
                self.pages.base = VGA_PAGE_A0;
                self.pages.mask = 0x1FFFF;
                self.page_table.set_handler(VGA_PAGE_A0, VGA_PAGES, MapHandler);
                if self.tandy.extended_ram & 0x01 != 0 {
                    self.tandy.draw_base = MemBase::vram(0);
                    self.tandy.mem_base = MemBase::vram(0);
                }
                else {
                    self.tandy.draw_base = MemBase::shared(self.tandy.draw_bank as usize * TANDY_BANK_SIZE);
                    self.tandy.mem_base = MemBase::shared(self.tandy.mem_bank as usize * TANDY_BANK_SIZE);
                    self.page_table.set_handler(VGA_PAGE_B8, 8, TandyHandler);
                }
                return self.handlers_done();
            }
            MachineType::Amstrad => {
                self.page_table.set_handler(VGA_PAGE_B8, 8, AmstradHandler);
                return self.handlers_done();
            }
            MachineType::Ega | MachineType::Vga | MachineType::Pc98 => {}
        }

        let handler = match self.mode_handler() {
            Some(handler) => handler,
            None => {
                log::trace!("No memory handler for mode {:?}", self.mode);
                return;
            }
        };

        if self.mode == VideoMode::Pc98 {
            if self.pc98.gdc.analog_enabled() {
                self.page_table.set_handler(PC98_PAGE_E0, 8, handler);
            }
            else {
                self.page_table.set_range(PC98_PAGE_E0, 8, PageBinding::Unmapped);
            }
        }

        match self.gc.config.memory_map() {
            MemoryMap::A0000_128k => {
                self.pages.base = VGA_PAGE_A0;
                // The ET3000 keeps whatever window it last decoded
                if self.svga != SvgaCard::TsengEt3k {
                    self.pages.mask = 0x1FFFF;
                }
                self.page_table.set_handler(VGA_PAGE_A0, VGA_PAGES, handler);
            }
            MemoryMap::A0000_64K => {
                self.pages.base = VGA_PAGE_A0;
                self.pages.mask = 0xFFFF;
                self.page_table.set_handler(VGA_PAGE_A0, 16, handler);
                self.release_pages(VGA_PAGE_B0, 16);
            }
            MemoryMap::B0000_32K => {
                self.pages.base = VGA_PAGE_B0;
                self.pages.mask = 0x7FFF;
                self.page_table.set_handler(VGA_PAGE_B0, 8, handler);
                self.release_pages(VGA_PAGE_A0, 16);
                self.release_pages(VGA_PAGE_B8, 8);
            }
            MemoryMap::B8000_32K => {
                self.pages.base = VGA_PAGE_B8;
                self.pages.mask = 0x7FFF;
                self.page_table.set_handler(VGA_PAGE_B8, 8, handler);
                self.release_pages(VGA_PAGE_A0, 16);
                self.release_pages(VGA_PAGE_B0, 8);
            }
        }

        if self.svga == SvgaCard::S3Trio && self.s3.ext_mem_ctrl & 0x10 != 0 {
            self.page_table.set_handler(VGA_PAGE_A0, 16, MmioHandler);
        }

        self.handlers_done();
    }

    /// Called by the SVGA collaborators after a bank register write.
    pub fn changed_bank(&mut self) {
        self.setup_handlers();
    }

    /// Recompute the linear framebuffer window from the S3 linear address window registers.
    pub fn start_update_lfb(&mut self) {
        let window_size = match self.s3.reg_58 & 0x03 {
            1 => 1 << 20,
            2 => 2 << 20,
            3 => 4 << 20,
            _ => 0x10000,
        };

        let la_window = self.s3.la_window as usize;
        self.lfb.page = la_window << 4;
        self.lfb.addr = la_window << 16;
        self.lfb.window_size = window_size;

        if self.lfb.page < self.total_pages {
            // A 64K window below the top of RAM is legacy banking, anything larger is a conflict
            if window_size != 0x10000 {
                log::warn!(
                    "S3: linear window of {}K at {:08X} conflicts with system RAM",
                    window_size / 1024,
                    self.lfb.addr
                );
            }
            self.page_table.set_lfb(0, 0);
        }
        else {
            self.page_table.set_lfb(self.lfb.page, self.vmemsize >> PAGE_SHIFT);
        }
        self.page_table.bump_epoch();
    }

    /// The handler for the planar window, or `None` when the mode has no memory decode.
    fn mode_handler(&self) -> Option<PageHandler> {
        let config = &self.gc.config;
        let handler: PageHandler = match self.mode {
            VideoMode::Lin4 => Lin4Handler.into(),
            VideoMode::Lin15 | VideoMode::Lin16 | VideoMode::Lin24 | VideoMode::Lin32 => MapHandler.into(),
            VideoMode::Lin8 | VideoMode::Vga => {
                if config.chained {
                    let slow = config.bit_mask_active();
                    match (slow || config.compatible_chain4, self.svga.is_tseng(), slow) {
                        (true, true, true) => Et4000SlowHandler.into(),
                        (true, true, false) => Et4000Handler.into(),
                        (true, false, true) => ChainedVgaSlowHandler.into(),
                        (true, false, false) => ChainedVgaHandler.into(),
                        (false, _, _) => MapHandler.into(),
                    }
                }
                else {
                    UnchainedVgaHandler.into()
                }
            }
            VideoMode::Ega => {
                if config.chained {
                    ChainedEgaHandler.into()
                }
                else {
                    UnchainedEgaHandler.into()
                }
            }
            VideoMode::Text | VideoMode::Cga2 | VideoMode::Cga4 => TextHandler.into(),
            VideoMode::Pc98 => Pc98Handler.into(),
            VideoMode::Amstrad => MapHandler.into(),
            _ => return None,
        };
        Some(handler)
    }

    /// Hand a window not claimed by the current memory map back to the host bus.
    fn release_pages(&mut self, page: usize, pages: usize) {
        let binding = if self.adapter_rom_is_ram {
            PageBinding::Ram
        }
        else {
            PageBinding::Unmapped
        };
        self.page_table.set_range(page, pages, binding);
    }

    fn handlers_done(&mut self) {
        self.page_table.bump_epoch();
        log::debug!(
            "Memory handlers set up for {} mode {:?}, epoch {}",
            self.machine,
            self.mode,
            self.page_table.epoch()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bus::MemoryMappedDevice, config::AdapterConfig};

    fn adapter(machine: MachineType, svga: SvgaCard, kb: u32) -> VgaMemory {
        VgaMemory::new(&AdapterConfig::new(machine, svga, kb)).unwrap()
    }

    fn handler_at(vga: &VgaMemory, addr: usize) -> PageBinding {
        vga.page_table().binding(addr)
    }

    fn bound<H: Into<PageHandler>>(handler: H) -> PageBinding {
        PageBinding::Handler(handler.into())
    }

    #[test]
    fn test_error_mode_binds_nothing() {
        let vga = adapter(MachineType::Vga, SvgaCard::None, 256);
        assert_eq!(vga.mode(), VideoMode::Error);
        assert_eq!(handler_at(&vga, 0xA0000), PageBinding::Unmapped);
        assert_eq!(vga.epoch(), 0);
    }

    #[test]
    fn test_chained_vga_selection() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::None, 256);
        vga.set_mode(VideoMode::Vga);
        assert_eq!(handler_at(&vga, 0xA0000), bound(UnchainedVgaHandler));

        vga.write_seq_memory_mode(0x08);
        assert_eq!(handler_at(&vga, 0xA0000), bound(MapHandler));
        vga.set_compatible_chain4(true);
        assert_eq!(handler_at(&vga, 0xA0000), bound(ChainedVgaHandler));
        vga.write_gfx_bit_mask(0x0F);
        assert_eq!(handler_at(&vga, 0xA0000), bound(ChainedVgaSlowHandler));

        // The slow path is taken whenever the bit mask is active, even without compatible chain-4
        vga.set_compatible_chain4(false);
        assert_eq!(handler_at(&vga, 0xA0000), bound(ChainedVgaSlowHandler));
    }

    #[test]
    fn test_tseng_chain4_selection() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::TsengEt4k, 1024);
        vga.set_mode(VideoMode::Lin8);
        vga.write_seq_memory_mode(0x08);
        vga.set_compatible_chain4(true);
        assert_eq!(handler_at(&vga, 0xAFFFF), bound(Et4000Handler));
        vga.write_gfx_bit_mask(0x00);
        assert_eq!(handler_at(&vga, 0xAFFFF), bound(Et4000SlowHandler));
    }

    #[test]
    fn test_mode_handlers() {
        let mut vga = adapter(MachineType::Ega, SvgaCard::None, 256);
        let cases: [(VideoMode, PageHandler); 6] = [
            (VideoMode::Ega, UnchainedEgaHandler.into()),
            (VideoMode::Text, TextHandler.into()),
            (VideoMode::Cga4, TextHandler.into()),
            (VideoMode::Lin4, Lin4Handler.into()),
            (VideoMode::Lin16, MapHandler.into()),
            (VideoMode::Amstrad, MapHandler.into()),
        ];
        for (mode, handler) in cases {
            vga.set_mode(mode);
            assert_eq!(handler_at(&vga, 0xA0000), PageBinding::Handler(handler), "{:?}", mode);
        }

        vga.set_mode(VideoMode::Ega);
        vga.write_seq_memory_mode(0x08);
        assert_eq!(handler_at(&vga, 0xA0000), bound(ChainedEgaHandler));
    }

    #[test]
    fn test_unsupported_mode_keeps_bindings() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::None, 256);
        vga.set_mode(VideoMode::Text);
        let epoch = vga.epoch();
        vga.set_mode(VideoMode::Tandy16);
        assert_eq!(vga.epoch(), epoch);
        assert_eq!(handler_at(&vga, 0xB8000), bound(TextHandler));
    }

    #[test]
    fn test_memory_maps() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::None, 256);
        vga.set_mode(VideoMode::Text);
        assert_eq!(vga.pages().mask, 0x1FFFF);

        // A0000, 64K
        vga.write_gfx_misc(0x04);
        assert_eq!(vga.pages().base, VGA_PAGE_A0);
        assert_eq!(vga.pages().mask, 0xFFFF);
        assert_eq!(handler_at(&vga, 0xAF000), bound(TextHandler));
        assert_eq!(handler_at(&vga, 0xB8000), PageBinding::Unmapped);

        // B0000, 32K
        vga.write_gfx_misc(0x08);
        assert_eq!(vga.pages().base, VGA_PAGE_B0);
        assert_eq!(vga.pages().mask, 0x7FFF);
        assert_eq!(handler_at(&vga, 0xB7000), bound(TextHandler));
        assert_eq!(handler_at(&vga, 0xA0000), PageBinding::Unmapped);
        assert_eq!(handler_at(&vga, 0xB8000), PageBinding::Unmapped);

        // B8000, 32K
        vga.write_gfx_misc(0x0C);
        assert_eq!(vga.pages().base, VGA_PAGE_B8);
        assert_eq!(handler_at(&vga, 0xBF000), bound(TextHandler));
        assert_eq!(handler_at(&vga, 0xB0000), PageBinding::Unmapped);
    }

    #[test]
    fn test_released_windows_revert_to_ram() {
        let config = AdapterConfig {
            adapter_rom_is_ram: true,
            ..AdapterConfig::new(MachineType::Vga, SvgaCard::None, 256)
        };
        let mut vga = VgaMemory::new(&config).unwrap();
        vga.set_mode(VideoMode::Text);
        vga.write_gfx_misc(0x0C);
        assert_eq!(handler_at(&vga, 0xA0000), PageBinding::Ram);
        assert_eq!(handler_at(&vga, 0xB0000), PageBinding::Ram);
        assert_eq!(vga.mmio_read_u8(0xA0000), 0xFF);
    }

    #[test]
    fn test_et3000_keeps_window_mask() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::TsengEt3k, 512);
        vga.set_mode(VideoMode::Vga);
        vga.write_gfx_misc(0x04);
        assert_eq!(vga.pages().mask, 0xFFFF);
        vga.write_gfx_misc(0x00);
        assert_eq!(vga.pages().mask, 0xFFFF);
        assert_eq!(handler_at(&vga, 0xB8000), bound(UnchainedVgaHandler));
    }

    #[test]
    fn test_s3_mmio_window() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::S3Trio, 1024);
        vga.set_mode(VideoMode::Lin8);
        vga.set_s3_ext_mem_ctrl(0x10);
        assert_eq!(handler_at(&vga, 0xA0000), bound(MmioHandler));
        assert_eq!(handler_at(&vga, 0xB0000), bound(UnchainedVgaHandler));
    }

    #[test]
    fn test_cga_handlers() {
        let mut vga = adapter(MachineType::Cga, SvgaCard::None, 16);
        vga.set_mode(VideoMode::Text);
        assert_eq!(handler_at(&vga, 0xB8000), bound(SlowCgaHandler));

        let config = AdapterConfig {
            cga_snow: true,
            ..AdapterConfig::new(MachineType::Cga, SvgaCard::None, 16)
        };
        let mut vga = VgaMemory::new(&config).unwrap();
        assert_eq!(handler_at(&vga, 0xB8000), bound(SlowCgaHandler));
        vga.set_mode(VideoMode::Text);
        assert_eq!(handler_at(&vga, 0xBF000), bound(CgaTextHandler));
        vga.set_mode(VideoMode::Cga2);
        assert_eq!(handler_at(&vga, 0xBF000), bound(SlowCgaHandler));
    }

    #[test]
    fn test_hercules_windows() {
        let mut vga = adapter(MachineType::Hercules, SvgaCard::None, 64);
        assert_eq!(handler_at(&vga, 0xB0000), bound(HerculesHandler));
        assert_eq!(handler_at(&vga, 0xB8000), bound(EmptyHandler));
        assert_eq!(vga.pages().mask, 0x7FFF);

        vga.set_herc_enable_bits(0x03);
        assert_eq!(handler_at(&vga, 0xB8000), bound(MapHandler));
        assert_eq!(vga.pages().base, VGA_PAGE_B0);
        assert_eq!(vga.pages().mask, 0xFFFF);

        vga.set_herc_enable_bits(0x02);
        assert_eq!(handler_at(&vga, 0xBF000), bound(HerculesHandler));
    }

    #[test]
    fn test_tandy_banks() {
        let mut vga = adapter(MachineType::Tandy, SvgaCard::None, 64);
        vga.set_tandy_banks(6, 4, 0);
        assert_eq!(handler_at(&vga, 0xA0000), bound(MapHandler));
        assert_eq!(handler_at(&vga, 0xB8000), bound(TandyHandler));
        assert_eq!(vga.tandy.mem_base, MemBase::shared(6 * TANDY_BANK_SIZE));
        assert_eq!(vga.tandy.draw_base, MemBase::shared(4 * TANDY_BANK_SIZE));

        vga.set_tandy_banks(6, 4, 1);
        assert_eq!(vga.tandy.mem_base, MemBase::vram(0));
        assert_eq!(vga.tandy.draw_base, MemBase::vram(0));
        // The B8000 binding from the previous dispatch was overwritten by the map
        assert_eq!(handler_at(&vga, 0xB8000), bound(MapHandler));
    }

    #[test]
    fn test_pcjr_and_amstrad() {
        let mut vga = adapter(MachineType::PcJr, SvgaCard::None, 16);
        vga.set_tandy_banks(3, 3, 0);
        assert_eq!(handler_at(&vga, 0xB8000), bound(PcJrHandler));
        assert_eq!(vga.tandy.mem_base, MemBase::shared(3 * TANDY_BANK_SIZE));

        let vga = adapter(MachineType::Amstrad, SvgaCard::None, 64);
        assert_eq!(handler_at(&vga, 0xBC000), bound(AmstradHandler));
        assert_eq!(handler_at(&vga, 0xA0000), PageBinding::Unmapped);
    }

    #[test]
    fn test_pc98_analog_window() {
        let mut vga = adapter(MachineType::Pc98, SvgaCard::None, 512);
        vga.set_mode(VideoMode::Pc98);
        assert_eq!(handler_at(&vga, 0xA8000), bound(Pc98Handler));
        assert_eq!(handler_at(&vga, 0xE0000), PageBinding::Unmapped);

        vga.write_pc98_vramop(crate::devices::pc98::VOPBIT_ANALOG);
        assert_eq!(handler_at(&vga, 0xE7000), bound(Pc98Handler));
        vga.write_pc98_vramop(0);
        assert_eq!(handler_at(&vga, 0xE7000), PageBinding::Unmapped);
    }

    #[test]
    fn test_every_dispatch_bumps_epoch() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::None, 256);
        vga.set_mode(VideoMode::Vga);
        let epoch = vga.epoch();
        vga.set_bank(1, 1);
        assert_eq!(vga.epoch(), epoch + 1);
        vga.changed_bank();
        assert_eq!(vga.epoch(), epoch + 2);
    }

    #[test]
    fn test_lfb_window() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::S3Trio, 2048);
        vga.s3.la_window = 0xE000;
        vga.s3.reg_58 = 0x03;
        vga.start_update_lfb();
        let lfb = vga.lfb_range().unwrap();
        assert_eq!(lfb.address(), 0xE000_0000);
        assert_eq!(lfb.size(), 2048 * 1024);
        assert_eq!(vga.lfb().window_size, 4 << 20);

        vga.mmio_write_u32(0xE000_0010, 0xDEADBEEF);
        assert_eq!(vga.vram().read::<u32>(0x10), 0xDEADBEEF);
        assert_eq!(vga.mmio_read_u8(0xE000_0010), 0xEF);
        // Only vmemsize worth of pages is bound
        assert_eq!(vga.mmio_read_u8(0xE020_0010), 0xFF);
        assert_eq!(handler_at(&vga, 0xE100_0000), bound(MmioHandler));
    }

    #[test]
    fn test_lfb_inside_ram_is_unmapped() {
        let mut vga = adapter(MachineType::Vga, SvgaCard::S3Trio, 1024);
        // 640K of guest RAM is 160 pages; window 0x0008 puts the LFB at page 0x80
        vga.s3.la_window = 0x0008;
        vga.start_update_lfb();
        assert_eq!(vga.lfb().addr, 0x80000);
        assert!(vga.lfb_range().is_none());
    }
}
