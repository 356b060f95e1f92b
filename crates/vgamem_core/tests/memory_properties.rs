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

    tests::memory_properties.rs

    End-to-end checks of the adapter memory through the bus surface.

*/

use vgamem_core::{
    devices::{
        pc98::{
            egc::EgcQuad,
            rop::{self, RopOperands},
            shifter::{EgcShifter, ShiftConfig},
        },
        vga::vram::Vram,
    },
    machine_types::{MachineType, SvgaCard, VideoMode},
    timing::CycleBudget,
    util::WarnOnce,
    AdapterConfig,
    MemoryMappedDevice,
    VgaMemory,
};

fn adapter(machine: MachineType, svga: SvgaCard, kb: u32) -> VgaMemory {
    VgaMemory::new(&AdapterConfig::new(machine, svga, kb)).unwrap()
}

fn planar_vga() -> VgaMemory {
    let mut vga = adapter(MachineType::Vga, SvgaCard::None, 256);
    vga.set_mode(VideoMode::Vga);
    // Odd/even disabled, chain-4 off
    vga.write_seq_memory_mode(0x06);
    vga
}

#[test]
fn write_mode_0_replicates_across_planes() {
    let mut vga = planar_vga();
    vga.mmio_write_u8(0xA0000, 0xAA);
    assert_eq!(vga.vram().read_planar(0), 0xAAAA_AAAA);
}

#[test]
fn write_mode_1_restores_latched_dword() {
    let mut vga = planar_vga();
    vga.vram_mut().write_planar(0x20, 0x1234_5678);

    let _ = vga.mmio_read_u8(0xA0020);
    assert_eq!(vga.gc.latch(), 0x1234_5678);

    vga.gc.config.write_mode_register(0x01);
    vga.mmio_write_u8(0xA0040, 0x00);
    assert_eq!(vga.vram().read_planar(0x40), 0x1234_5678);
    vga.mmio_write_u8(0xA0041, 0xFF);
    assert_eq!(vga.vram().read_planar(0x41), 0x1234_5678);
}

#[test]
fn raster_ops_against_fixed_latch() {
    let mut vga = planar_vga();
    vga.gc.load_latch(0x1234_5678);

    let expected = [
        (0x00, 0x0F0F_0F0F),
        (0x08, 0x0204_0608),
        (0x10, 0x1F3F_5F7F),
        (0x18, 0x1D3B_5977),
    ];
    for (rotate_reg, result) in expected {
        vga.gc.config.write_data_rotate(rotate_reg);
        assert_eq!(vga.gc.raster_op(0x0F0F_0F0F, 0xFFFF_FFFF), result);
    }
}

#[test]
fn egc_shifter_identity_and_descending() {
    let mut srcmask = [0u8; 2];

    let config = ShiftConfig {
        length: 15,
        ..Default::default()
    };
    let mut shifter = EgcShifter::new();
    shifter.reinit(&config);
    let mut out = EgcQuad::default();
    shifter.input([0xABCD; 4], 2, 0, &mut srcmask);
    shifter.output(&mut out, 2, 0, &mut srcmask, &config);
    assert_eq!(out.0, [0xABCD; 4]);

    // With a one byte transfer only one lane survives, and which one depends on direction
    let mut lanes = Vec::new();
    for descend in [false, true] {
        let config = ShiftConfig {
            descend,
            length: 7,
            ..Default::default()
        };
        shifter.reinit(&config);
        let mut out = EgcQuad::default();
        shifter.input([0xABCD; 4], 2, 0, &mut srcmask);
        shifter.output(&mut out, 2, 0, &mut srcmask, &config);
        lanes.push(out.0[0]);
    }
    assert_eq!(lanes, vec![0x00CD, 0xAB00]);
}

fn pc98() -> VgaMemory {
    let mut vga = adapter(MachineType::Pc98, SvgaCard::None, 512);
    vga.set_mode(VideoMode::Pc98);
    vga
}

#[test]
fn pc98_character_ram_is_linear() {
    let mut vga = pc98();
    vga.mmio_write_u8(0xA1000, 0x41);
    assert_eq!(vga.vram().read_u8(0x1000), 0x41);

    vga.vram_mut().write_u8(0x1001, 0x07);
    assert_eq!(vga.mmio_read_u16(0xA1000), 0x0741);
}

#[test]
fn pc98_odd_attribute_reads_float() {
    let mut vga = pc98();
    vga.mmio_write_u8(0xA2001, 0x34);
    assert_eq!(vga.mmio_read_u8(0xA2001), 0xFF);

    vga.mmio_write_u8(0xA2000, 0x34);
    assert_eq!(vga.mmio_read_u8(0xA2000), 0x34);
}

#[test]
fn bank_write_offsets_window() {
    // Chain-4 without the compatibility flag maps the window straight onto VRAM
    let mut vga = adapter(MachineType::Vga, SvgaCard::TsengEt4k, 1024);
    vga.set_mode(VideoMode::Lin8);
    vga.write_seq_memory_mode(0x08);
    vga.set_bank_size(0x10000);
    vga.set_bank(0, 1);

    vga.mmio_write_u8(0xA0000, 0x5A);
    assert_eq!(vga.vram().read_u8(0x10000), 0x5A);
    assert_eq!(vga.vram().read_u8(0x00000), 0x00);

    // Reads come from bank 0
    assert_eq!(vga.mmio_read_u8(0xA0000), 0x00);
    vga.set_bank(1, 1);
    assert_eq!(vga.mmio_read_u8(0xA0000), 0x5A);

    // Same through the Tseng chain-4 handler
    vga.set_compatible_chain4(true);
    vga.mmio_write_u16(0xA0010, 0xBEEF);
    assert_eq!(vga.vram().read::<u16>(0x10010), 0xBEEF);
}

#[test]
fn rop_table_source_copy_and_stub_fallback() {
    let mut vram = Vram::new(0x40000);
    vram.write::<u16>(0x8000, 0x5555);

    let src = EgcQuad([0x1234, 0x5678, 0x9ABC, 0xDEF0]);
    let last_vram = EgcQuad([0x0101, 0x0202, 0x0303, 0x0404]);
    let zero = EgcQuad::default();
    let mut warn = WarnOnce::new();

    let ops = RopOperands {
        src: &src,
        tiles: &zero,
        fgcm: &zero,
        bgcm: &zero,
        last_vram: &last_vram,
        fgc: 0,
        regload: 0,
        vram: &vram,
        vramoff: 0,
    };
    assert_eq!(rop::apply(0xF0, &ops, &mut warn), src);
    assert_eq!(warn.count(), 0);

    assert_eq!(rop::apply(0x33, &ops, &mut warn), last_vram);
    let other_src = EgcQuad([0xFFFF; 4]);
    let ops = RopOperands {
        src: &other_src,
        ..ops
    };
    assert_eq!(rop::apply(0x33, &ops, &mut warn), last_vram);
    assert_eq!(warn.count(), 1);
}

#[test]
fn delay_charged_once_per_access() {
    let mut vga = planar_vga();
    vga.set_memio_delay(1000);
    vga.budget = CycleBudget::new(100_000);

    let _ = vga.mmio_read_u32(0xA0000);
    assert_eq!(vga.budget.io_delay_removed, 100);
    vga.mmio_write_u16(0xA0000, 0x1234);
    assert_eq!(vga.budget.io_delay_removed, 175);
    assert_eq!(vga.budget.cycles, 100_000 - 175);
}

#[test]
fn config_from_toml() {
    let config = AdapterConfig::from_toml_str(
        r#"
        machine = "Pc98"
        vmemsize_kb = 512
        "#,
    )
    .unwrap();
    let vga = VgaMemory::new(&config).unwrap();
    assert_eq!(vga.machine(), MachineType::Pc98);
    assert_eq!(vga.vram().size(), 512 * 1024);
}
