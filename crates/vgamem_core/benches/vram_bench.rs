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

    benches::vram_bench.rs

    Benchmarks for CPU writes into VRAM through the page table.

*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vgamem_core::{
    machine_types::{MachineType, SvgaCard, VideoMode},
    AdapterConfig,
    MemoryMappedDevice,
    VgaMemory,
};

fn vga() -> VgaMemory {
    let config = AdapterConfig {
        memio_delay_ns: 0,
        ..AdapterConfig::new(MachineType::Vga, SvgaCard::None, 256)
    };
    VgaMemory::new(&config).unwrap()
}

pub fn chained_write_bench(c: &mut Criterion) {
    let mut vga = vga();
    vga.set_mode(VideoMode::Vga);
    vga.write_seq_memory_mode(0x0E);
    vga.set_compatible_chain4(true);

    c.bench_function("chained_vga_write_u32", |b| {
        b.iter(|| {
            for addr in (0xA0000..0xAFA00).step_by(4) {
                vga.mmio_write_u32(black_box(addr), black_box(0x0F0F_0F0F));
            }
        });
    });

    vga.write_gfx_bit_mask(0x55);
    c.bench_function("chained_vga_slow_write_u8", |b| {
        b.iter(|| {
            for addr in 0xA0000..0xAFA00 {
                vga.mmio_write_u8(black_box(addr), black_box(0x0F));
            }
        });
    });
}

pub fn planar_write_bench(c: &mut Criterion) {
    let mut vga = vga();
    vga.set_mode(VideoMode::Vga);
    vga.write_seq_memory_mode(0x06);
    vga.gc.config.write_mode_register(0x02);

    c.bench_function("unchained_vga_write_mode_2", |b| {
        b.iter(|| {
            for addr in 0xA0000..0xA9600 {
                vga.mmio_write_u8(black_box(addr), black_box(0x0C));
            }
        });
    });
}

criterion_group!(benches, chained_write_bench, planar_write_bench);
criterion_main!(benches);
