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
*/

//! The raster operation engine of the EGA/VGA Graphics Controller.
//!
//! The register state here is owned by the Graphics Controller and Sequencer port handlers; they
//! decode register writes into [PlanarConfig]. The latch is owned by this module and is only ever
//! loaded by a planar read.

use modular_bitfield::prelude::*;

use super::tablegen::{EXPAND_TABLE, FILL_TABLE};
use crate::util::{Diagnostic, WarnOnce};

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct GDataRotateRegister {
    pub count: B3,
    #[bits = 2]
    pub function: LogicFunction,
    #[skip]
    unused: B3,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct GModeRegister {
    #[bits = 2]
    pub write_mode: WriteMode,
    pub test_condition: bool,
    #[bits = 1]
    pub read_mode: ReadMode,
    pub odd_even: OddEvenModeComplement,
    #[bits = 2]
    pub shift_mode: ShiftMode,
    #[skip]
    unused: B1,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct GMiscellaneousRegister {
    pub graphics_mode: bool,
    pub chain_odd_even: bool,
    pub memory_map: MemoryMap,
    #[skip]
    pub unused: B4,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SMemoryModeRegister {
    #[bits = 1]
    pub alpha_mode: bool,
    pub extended_memory: bool,
    pub odd_even_disable: bool,
    pub chain4: bool,
    #[skip]
    unused: B4,
}

#[derive(Copy, Clone, Debug, BitfieldSpecifier)]
pub enum OddEvenModeComplement {
    Sequential,
    OddEven,
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, BitfieldSpecifier)]
pub enum MemoryMap {
    A0000_128k,
    A0000_64K,
    B0000_32K,
    B8000_32K,
}

#[derive(Copy, Clone, Debug, BitfieldSpecifier)]
pub enum LogicFunction {
    Unmodified,
    And,
    Or,
    Xor,
}

#[derive(Copy, Clone, Debug, BitfieldSpecifier)]
pub enum WriteMode {
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

#[derive(Copy, Clone, Debug, BitfieldSpecifier)]
pub enum ReadMode {
    ReadSelectedPlane,
    ReadComparedPlanes,
}

#[derive(Copy, Clone, Debug, BitfieldSpecifier)]
pub enum ShiftMode {
    Standard,
    CGACompatible,
    Chain4,
    Unused,
}

/// Planar pipeline configuration. Fields are public so that the port handlers owning these
/// registers can store raw values; the `write_*` methods decode a register byte and keep the
/// expanded 32-bit forms in step.
#[derive(Copy, Clone, Debug)]
pub struct PlanarConfig {
    pub write_mode: u8,
    pub read_mode: u8,
    pub raster_op: u8,
    pub data_rotate: u8,
    pub read_map_select: u8,
    pub color_compare: u8,
    pub color_dont_care: u8,
    pub map_mask: u8,
    pub bit_mask: u8,
    pub set_reset: u8,
    pub enable_set_reset: u8,
    pub miscellaneous: GMiscellaneousRegister,
    pub memory_mode: SMemoryModeRegister,
    pub chained: bool,
    /// Set by SVGA chipsets whose chain-4 addressing is linear rather than planar.
    pub compatible_chain4: bool,

    pub full_bit_mask: u32,
    pub full_map_mask: u32,
    pub full_not_map_mask: u32,
    pub full_set_reset: u32,
    pub full_not_enable_set_reset: u32,
    pub full_enable_and_set_reset: u32,
}

impl Default for PlanarConfig {
    fn default() -> Self {
        Self {
            write_mode: 0,
            read_mode: 0,
            raster_op: 0,
            data_rotate: 0,
            read_map_select: 0,
            color_compare: 0,
            color_dont_care: 0,
            map_mask: 0x0F,
            bit_mask: 0xFF,
            set_reset: 0,
            enable_set_reset: 0,
            miscellaneous: GMiscellaneousRegister::new(),
            memory_mode: SMemoryModeRegister::new(),
            chained: false,
            compatible_chain4: false,

            full_bit_mask: 0xFFFFFFFF,
            full_map_mask: 0xFFFFFFFF,
            full_not_map_mask: 0,
            full_set_reset: 0,
            full_not_enable_set_reset: 0xFFFFFFFF,
            full_enable_and_set_reset: 0,
        }
    }
}

impl PlanarConfig {
    /// Decode a write to the Graphics Mode register.
    pub fn write_mode_register(&mut self, byte: u8) {
        // Bits 0-1: Write Mode
        // Bit 3: Read Mode
        let mode = GModeRegister::from_bytes([byte]);
        self.write_mode = mode.write_mode() as u8;
        self.read_mode = mode.read_mode() as u8;
    }

    pub fn write_data_rotate(&mut self, byte: u8) {
        // Bits 0-2: Rotate Count
        // Bits 3-4: Function Select
        let rotate = GDataRotateRegister::from_bytes([byte]);
        self.data_rotate = rotate.count();
        self.raster_op = rotate.function() as u8;
    }

    pub fn write_bit_mask(&mut self, byte: u8) {
        self.bit_mask = byte;
        self.full_bit_mask = EXPAND_TABLE[byte as usize];
    }

    pub fn write_map_mask(&mut self, byte: u8) {
        self.map_mask = byte & 0x0F;
        self.full_map_mask = FILL_TABLE[self.map_mask as usize];
        self.full_not_map_mask = !self.full_map_mask;
    }

    pub fn write_set_reset(&mut self, byte: u8) {
        self.set_reset = byte & 0x0F;
        self.update_set_reset();
    }

    pub fn write_enable_set_reset(&mut self, byte: u8) {
        self.enable_set_reset = byte & 0x0F;
        self.update_set_reset();
    }

    pub fn write_read_map_select(&mut self, byte: u8) {
        self.read_map_select = byte & 0x03;
    }

    pub fn write_color_compare(&mut self, byte: u8) {
        self.color_compare = byte & 0x0F;
    }

    pub fn write_color_dont_care(&mut self, byte: u8) {
        self.color_dont_care = byte & 0x0F;
    }

    pub fn write_miscellaneous(&mut self, byte: u8) {
        self.miscellaneous = GMiscellaneousRegister::from_bytes([byte]);
    }

    /// Decode a write to the Sequencer Memory Mode register. Chain-4 enables chained addressing.
    pub fn write_memory_mode(&mut self, byte: u8) {
        self.memory_mode = SMemoryModeRegister::from_bytes([byte]);
        self.chained = self.memory_mode.chain4();
    }

    fn update_set_reset(&mut self) {
        self.full_set_reset = FILL_TABLE[self.set_reset as usize];
        let full_enable_set_reset = FILL_TABLE[self.enable_set_reset as usize];
        self.full_not_enable_set_reset = !full_enable_set_reset;
        self.full_enable_and_set_reset = self.full_set_reset & full_enable_set_reset;
    }

    /// Host address bit 0 selects between even and odd planes.
    #[inline]
    pub fn odd_even_chained(&self) -> bool {
        self.miscellaneous.chain_odd_even()
    }

    #[inline]
    pub fn odd_even_disabled(&self) -> bool {
        self.memory_mode.odd_even_disable()
    }

    #[inline]
    pub fn memory_map(&self) -> MemoryMap {
        self.miscellaneous.memory_map()
    }

    /// The bit mask register is not the identity, so writes must merge with the latch.
    #[inline]
    pub fn bit_mask_active(&self) -> bool {
        self.full_bit_mask != 0xFFFFFFFF
    }
}

#[derive(Default, Debug)]
pub struct GraphicsControllerStats {
    pub mode_0_writes: u32,
    pub mode_1_writes: u32,
    pub mode_2_writes: u32,
    pub mode_3_writes: u32,
    pub mode_0_reads: u32,
    pub mode_1_reads: u32,
}

#[derive(Default)]
pub struct GraphicsController {
    pub config: PlanarConfig,
    latch: u32,
    warn: WarnOnce,
    stats: GraphicsControllerStats,
}

#[inline(always)]
pub fn lane(dword: u32, lane: usize) -> u8 {
    (dword >> (lane * 8)) as u8
}

impl GraphicsController {
    pub fn new() -> Self {
        GraphicsController::default()
    }

    /// Clear the latch and diagnostics. Register state belongs to the port handlers and is kept.
    pub fn reset(&mut self) {
        self.latch = 0;
        self.warn.clear();
        self.stats = GraphicsControllerStats::default();
    }

    #[inline]
    pub fn latch(&self) -> u32 {
        self.latch
    }

    #[inline]
    pub fn load_latch(&mut self, dword: u32) {
        self.latch = dword;
    }

    pub fn stats(&self) -> &GraphicsControllerStats {
        &self.stats
    }

    /// Combine new planar data with the latch. Bits set in `mask` take the logic function
    /// result, bits clear keep the latch.
    #[inline]
    pub fn raster_op(&self, input: u32, mask: u32) -> u32 {
        match self.config.raster_op {
            0x00 => (input & mask) | (self.latch & !mask),
            0x01 => (input | !mask) & self.latch,
            0x02 => (input & mask) | self.latch,
            0x03 => (input & mask) ^ self.latch,
            _ => 0,
        }
    }

    /// Turn a host byte into a planar dword according to the current write mode.
    pub fn mode_operation(&mut self, val: u8) -> u32 {
        let config = &self.config;
        match config.write_mode {
            0x00 => {
                self.stats.mode_0_writes = self.stats.mode_0_writes.wrapping_add(1);
                // Write Mode 0: rotate, then Set/Reset replaces the planes it is enabled for.
                let val = val.rotate_right(config.data_rotate as u32);
                let full = EXPAND_TABLE[val as usize];
                let full = (full & config.full_not_enable_set_reset) | config.full_enable_and_set_reset;
                self.raster_op(full, config.full_bit_mask)
            }
            0x01 => {
                self.stats.mode_1_writes = self.stats.mode_1_writes.wrapping_add(1);
                // Write Mode 1: latches pass through untouched.
                self.latch
            }
            0x02 => {
                self.stats.mode_2_writes = self.stats.mode_2_writes.wrapping_add(1);
                // Write Mode 2: each of the low four bits fills its plane.
                self.raster_op(FILL_TABLE[(val & 0x0F) as usize], config.full_bit_mask)
            }
            0x03 => {
                self.stats.mode_3_writes = self.stats.mode_3_writes.wrapping_add(1);
                // Write Mode 3: Set/Reset is the data, the rotated host byte is ANDed into the bit mask.
                let val = val.rotate_right(config.data_rotate as u32);
                let full = EXPAND_TABLE[val as usize];
                self.raster_op(config.full_set_reset, full & config.full_bit_mask)
            }
            mode => {
                if self.warn.first(Diagnostic::UnsupportedWriteMode, mode as u32) {
                    log::warn!("Unsupported write mode {}", mode);
                }
                0
            }
        }
    }

    /// Produce the byte returned to the CPU for a planar read, after the latch has been loaded.
    /// `start` is the planar address, whose low bit picks the odd or even plane in odd/even mode.
    pub fn read_latched(&mut self, start: usize) -> u8 {
        let config = &self.config;
        match config.read_mode {
            0x00 => {
                self.stats.mode_0_reads = self.stats.mode_0_reads.wrapping_add(1);
                let mut plane = config.read_map_select as usize;
                // Odd/even mode picks plane 0/1 or 2/3 by address parity
                if !config.odd_even_disabled() && config.odd_even_chained() {
                    plane = (plane & !1) + (start & 1);
                }
                lane(self.latch, plane & 0x03)
            }
            0x01 => {
                self.stats.mode_1_reads = self.stats.mode_1_reads.wrapping_add(1);
                // Read Mode 1: a set bit is a pixel matching Color Compare on all cared-for planes
                let dont_care = config.color_dont_care as usize & 0x0F;
                let compare = config.color_compare as usize & dont_care;
                let mismatch = (self.latch & FILL_TABLE[dont_care]) ^ FILL_TABLE[compare];
                !(lane(mismatch, 0) | lane(mismatch, 1) | lane(mismatch, 2) | lane(mismatch, 3))
            }
            _ => 0,
        }
    }
}
