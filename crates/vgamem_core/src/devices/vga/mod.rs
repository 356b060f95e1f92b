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

    devices::vga::mod.rs

    Implements the memory side of a video adapter: VRAM, the handler
    strategies that decode CPU accesses into it, and the register state those
    handlers consult. The register state is written by the port emulation of
    the respective chips; this module reads it on every access.

*/

pub mod dispatch;
pub mod graphics_controller;
pub mod handlers;
pub mod mmio;
pub mod tablegen;
pub mod vram;

use crate::{
    bus::{PageRange, PageTable},
    config::{AdapterConfig, ConfigError},
    devices::pc98::{Pc98State, VOPBIT_ANALOG},
    machine_types::{MachineType, SvgaCard, VideoMode},
    timing::{delay_pc98_wait_port, CycleBudget, MemIoDelay},
};
use graphics_controller::GraphicsController;
use vram::Vram;

pub const VGA_PAGE_A0: usize = 0xA0000 >> 12;
pub const VGA_PAGE_B0: usize = 0xB0000 >> 12;
pub const VGA_PAGE_B8: usize = 0xB8000 >> 12;
/// Pages in the full 128K legacy window.
pub const VGA_PAGES: usize = 128 / 4;
pub const PC98_PAGE_E0: usize = 0xE0000 >> 12;

pub const DEFAULT_BANK_SIZE: usize = 0x10000;
/// System RAM shared with the video hardware on the PCjr and Tandy, at 0x80000-0x9FFFF.
pub const SHARED_RAM_SIZE: usize = 0x20000;
/// Physical address of the start of the shared RAM window.
pub const SHARED_RAM_BASE: usize = 0x80000;
pub const FONT_SIZE: usize = 0x10000;
pub const CGA_SNOW_COLUMNS: usize = 80;

/// SVGA bank registers. The byte offsets are derived from the bank numbers on every handler setup.
#[derive(Copy, Clone, Debug)]
pub struct SvgaBanks {
    pub bank_read: u8,
    pub bank_write: u8,
    pub bank_size: usize,
    bank_read_full: usize,
    bank_write_full: usize,
}

impl Default for SvgaBanks {
    fn default() -> Self {
        Self {
            bank_read: 0,
            bank_write: 0,
            bank_size: DEFAULT_BANK_SIZE,
            bank_read_full: 0,
            bank_write_full: 0,
        }
    }
}

impl SvgaBanks {
    #[inline]
    pub fn read_full(&self) -> usize {
        self.bank_read_full
    }

    #[inline]
    pub fn write_full(&self) -> usize {
        self.bank_write_full
    }

    fn recalculate(&mut self) {
        self.bank_read_full = self.bank_read as usize * self.bank_size;
        self.bank_write_full = self.bank_write as usize * self.bank_size;
    }
}

/// The currently decoded legacy window: its first page and the address mask within it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VgaPages {
    pub base: usize,
    pub mask: usize,
}

impl Default for VgaPages {
    fn default() -> Self {
        Self {
            base: VGA_PAGE_A0,
            mask: 0x1FFFF,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct HerculesRegs {
    /// Configuration switch. Bit 0 allows graphics, bit 1 pages in the upper 32K.
    pub enable_bits: u8,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MemRegion {
    #[default]
    Vram,
    SharedRam,
}

/// A base pointer into either VRAM or the shared system RAM window.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MemBase {
    pub region: MemRegion,
    pub offset: usize,
}

impl MemBase {
    pub fn vram(offset: usize) -> Self {
        Self {
            region: MemRegion::Vram,
            offset,
        }
    }

    pub fn shared(offset: usize) -> Self {
        Self {
            region: MemRegion::SharedRam,
            offset,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct TandyRegs {
    pub mem_bank: u8,
    pub draw_bank: u8,
    pub extended_ram: u8,
    /// Where CPU accesses to the B8000 window land.
    pub mem_base: MemBase,
    /// Where the renderer fetches from.
    pub draw_base: MemBase,
}

#[derive(Copy, Clone, Debug)]
pub struct AmstradRegs {
    pub write_plane: u8,
    pub read_plane: u8,
}

impl Default for AmstradRegs {
    fn default() -> Self {
        Self {
            write_plane: 0x0F,
            read_plane: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct S3Regs {
    pub ext_mem_ctrl: u8,
    /// Linear address window position, in 64K units.
    pub la_window: u16,
    /// Linear address window control. Bits 0-1 select the window size.
    pub reg_58: u8,
}

/// Current position of the renderer, in PIC time. Supplied by the host for snow emulation.
#[derive(Copy, Clone, Debug, Default)]
pub struct DrawTiming {
    pub pic_index: f64,
    pub framestart: f64,
    pub htotal: f64,
    pub hblkstart: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LfbState {
    pub page: usize,
    pub addr: usize,
    pub window_size: usize,
}

/// The accelerator's register file, reached through the MMIO window.
pub trait AcceleratorPorts {
    fn xga_read(&mut self, port: usize, len: usize) -> u32;
    fn xga_write(&mut self, port: usize, val: u32, len: usize);
}

/// No accelerator present. Reads float low.
#[derive(Default)]
pub struct NullAccelerator;

impl AcceleratorPorts for NullAccelerator {
    fn xga_read(&mut self, _port: usize, _len: usize) -> u32 {
        0
    }

    fn xga_write(&mut self, _port: usize, _val: u32, _len: usize) {}
}

pub struct VgaMemory {
    machine: MachineType,
    svga: SvgaCard,
    vmemsize: usize,
    adapter_rom_is_ram: bool,
    cga_snow_enabled: bool,
    total_pages: usize,

    mode: VideoMode,
    vram: Vram,
    font: Box<[u8]>,
    shared_ram: Box<[u8]>,
    cga_snow: [u8; CGA_SNOW_COLUMNS],
    pages: VgaPages,
    page_table: PageTable,
    lfb: LfbState,

    pub gc: GraphicsController,
    pub pc98: Pc98State,
    pub banks: SvgaBanks,
    pub herc: HerculesRegs,
    pub tandy: TandyRegs,
    pub amstrad: AmstradRegs,
    pub s3: S3Regs,
    pub draw: DrawTiming,
    pub budget: CycleBudget,

    delay: MemIoDelay,
    accel: Box<dyn AcceleratorPorts>,
}

impl VgaMemory {
    /// Create the adapter memory and allocate VRAM.
    pub fn new(config: &AdapterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut vga = Self {
            machine: config.machine,
            svga: config.svga,
            vmemsize: config.vmemsize(),
            adapter_rom_is_ram: config.adapter_rom_is_ram,
            cga_snow_enabled: config.cga_snow,
            total_pages: config.total_pages(),
            mode: VideoMode::default(),
            vram: Vram::empty(),
            font: vec![0; FONT_SIZE].into_boxed_slice(),
            shared_ram: vec![0; SHARED_RAM_SIZE].into_boxed_slice(),
            cga_snow: [0; CGA_SNOW_COLUMNS],
            pages: VgaPages::default(),
            page_table: PageTable::new(),
            lfb: LfbState::default(),
            gc: GraphicsController::new(),
            pc98: Pc98State::new(),
            banks: SvgaBanks::default(),
            herc: HerculesRegs::default(),
            tandy: TandyRegs::default(),
            amstrad: AmstradRegs::default(),
            s3: S3Regs::default(),
            draw: DrawTiming::default(),
            budget: CycleBudget::default(),
            delay: MemIoDelay::new(config.memio_delay_ns),
            accel: Box::new(NullAccelerator),
        };

        vga.setup_memory();
        Ok(vga)
    }

    /// (Re)allocate VRAM and return the memory map to its power-on state.
    pub fn setup_memory(&mut self) {
        self.banks = SvgaBanks::default();
        self.vram = Vram::new(self.vmemsize);
        self.font.fill(0);

        self.tandy.mem_base = MemBase::vram(0);
        self.tandy.draw_base = MemBase::vram(0);

        log::debug!(
            "Allocated {}K of VRAM for {} ({})",
            self.vmemsize / 1024,
            self.machine,
            self.svga
        );
        self.setup_handlers();
    }

    /// Stop decoding the legacy window and release VRAM.
    pub fn shutdown(&mut self) {
        self.page_table.set_handler(VGA_PAGE_A0, VGA_PAGES, handlers::EmptyHandler);
        self.page_table.set_range(PC98_PAGE_E0, 8, crate::bus::PageBinding::Unmapped);
        self.page_table.set_lfb(0, 0);
        self.page_table.bump_epoch();
        self.vram = Vram::empty();
        log::debug!("VGA memory shut down");
    }

    /// Whole-machine reset. Clears VRAM, the latch and the EGC, then re-dispatches.
    pub fn reset(&mut self) {
        self.vram.clear();
        self.font.fill(0);
        self.cga_snow = [0; CGA_SNOW_COLUMNS];
        self.gc.reset();
        self.pc98.reset();
        self.setup_handlers();
    }

    pub fn machine(&self) -> MachineType {
        self.machine
    }

    pub fn svga(&self) -> SvgaCard {
        self.svga
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    pub fn vmemsize(&self) -> usize {
        self.vmemsize
    }

    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut Vram {
        &mut self.vram
    }

    /// Plane 2 shadow used by the text renderer.
    pub fn font(&self) -> &[u8] {
        &self.font
    }

    pub fn shared_ram(&self) -> &[u8] {
        &self.shared_ram
    }

    pub fn shared_ram_mut(&mut self) -> &mut [u8] {
        &mut self.shared_ram
    }

    pub fn cga_snow(&self) -> &[u8; CGA_SNOW_COLUMNS] {
        &self.cga_snow
    }

    pub fn clear_cga_snow(&mut self) {
        self.cga_snow = [0; CGA_SNOW_COLUMNS];
    }

    pub fn pages(&self) -> VgaPages {
        self.pages
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn lfb(&self) -> LfbState {
        self.lfb
    }

    pub fn lfb_range(&self) -> Option<PageRange> {
        self.page_table.lfb()
    }

    /// Handler epoch. Moves whenever the page bindings may have changed.
    pub fn epoch(&self) -> u64 {
        self.page_table.epoch()
    }

    pub fn set_accelerator(&mut self, accel: Box<dyn AcceleratorPorts>) {
        self.accel = accel;
    }

    pub fn set_memio_delay(&mut self, delay_ns: u32) {
        self.delay = MemIoDelay::new(delay_ns);
    }

    pub fn set_vmemwrap(&mut self, wrap: usize) {
        self.vram.set_wrap(wrap);
    }

    pub fn set_mode(&mut self, mode: VideoMode) {
        if self.mode != mode {
            log::debug!("Video mode changed: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.setup_handlers();
        }
    }

    pub fn set_bank(&mut self, bank_read: u8, bank_write: u8) {
        self.banks.bank_read = bank_read;
        self.banks.bank_write = bank_write;
        self.changed_bank();
    }

    pub fn set_bank_size(&mut self, bank_size: usize) {
        self.banks.bank_size = bank_size;
        self.changed_bank();
    }

    /// Graphics Controller Miscellaneous register. Selects the memory map and odd/even chaining.
    pub fn write_gfx_misc(&mut self, byte: u8) {
        self.gc.config.write_miscellaneous(byte);
        self.setup_handlers();
    }

    /// Sequencer Memory Mode register. Selects chain-4 and odd/even addressing.
    pub fn write_seq_memory_mode(&mut self, byte: u8) {
        self.gc.config.write_memory_mode(byte);
        self.setup_handlers();
    }

    /// Graphics Controller Bit Mask register. Chained modes switch between the fast and slow
    /// handlers when the mask leaves or returns to the identity.
    pub fn write_gfx_bit_mask(&mut self, byte: u8) {
        let was_active = self.gc.config.bit_mask_active();
        self.gc.config.write_bit_mask(byte);
        if self.gc.config.chained && was_active != self.gc.config.bit_mask_active() {
            self.setup_handlers();
        }
    }

    pub fn set_compatible_chain4(&mut self, state: bool) {
        if self.gc.config.compatible_chain4 != state {
            self.gc.config.compatible_chain4 = state;
            self.setup_handlers();
        }
    }

    pub fn set_herc_enable_bits(&mut self, bits: u8) {
        self.herc.enable_bits = bits;
        self.setup_handlers();
    }

    pub fn set_tandy_banks(&mut self, mem_bank: u8, draw_bank: u8, extended_ram: u8) {
        self.tandy.mem_bank = mem_bank;
        self.tandy.draw_bank = draw_bank;
        self.tandy.extended_ram = extended_ram;
        self.setup_handlers();
    }

    pub fn set_s3_ext_mem_ctrl(&mut self, byte: u8) {
        self.s3.ext_mem_ctrl = byte;
        self.setup_handlers();
    }

    /// PC-98 VRAM operation register. The analog window is rebound when its bit changes.
    pub fn write_pc98_vramop(&mut self, vramop: u8) {
        let changed = (self.pc98.gdc.vramop ^ vramop) & VOPBIT_ANALOG != 0;
        self.pc98.gdc.vramop = vramop;
        if changed {
            self.setup_handlers();
        }
    }

    /// A write to the PC-98 wait port.
    pub fn pc98_wait_port(&mut self) {
        delay_pc98_wait_port(&mut self.budget);
    }

    #[inline]
    pub(crate) fn delay_read(&mut self) {
        self.delay.delay_read(&mut self.budget);
    }

    #[inline]
    pub(crate) fn delay_write(&mut self) {
        self.delay.delay_write(&mut self.budget);
    }

    #[inline]
    pub(crate) fn base_read(&self, base: MemBase, offset: usize) -> u8 {
        match base.region {
            MemRegion::Vram => self.vram.read_u8(base.offset + offset),
            MemRegion::SharedRam => self.shared_ram[(base.offset + offset) & (SHARED_RAM_SIZE - 1)],
        }
    }

    #[inline]
    pub(crate) fn base_write(&mut self, base: MemBase, offset: usize, data: u8) {
        match base.region {
            MemRegion::Vram => self.vram.write_u8(base.offset + offset, data),
            MemRegion::SharedRam => self.shared_ram[(base.offset + offset) & (SHARED_RAM_SIZE - 1)] = data,
        }
    }

    #[inline]
    pub(crate) fn write_font(&mut self, offset: usize, data: u8) {
        self.font[offset & (FONT_SIZE - 1)] = data;
    }

    /// Record a CGA text write in the snow buffer at the column the beam is currently on.
    pub(crate) fn capture_snow(&mut self, val: u8) {
        let draw = &self.draw;
        if draw.htotal <= 0.0 || draw.hblkstart <= 0.0 {
            return;
        }
        let time_in_line = (draw.pic_index - draw.framestart) % draw.htotal;
        let x = (time_in_line * CGA_SNOW_COLUMNS as f64) / draw.hblkstart;
        if x >= 0.0 && x < CGA_SNOW_COLUMNS as f64 {
            self.cga_snow[x as usize] = val;
        }
    }
}
