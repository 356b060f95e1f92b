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

//! The memory-mapped VRAM layer of an emulated PC video adapter.
//!
//! Every CPU access landing in the adapter's physical window is routed through a [bus::PageTable]
//! to one handler strategy chosen by the dispatcher in [devices::vga::dispatch]. Handlers cover the
//! planar EGA/VGA family, the chained SVGA variants, the CGA-class legacy adapters and the PC-98
//! graphics layout with its EGC bit-shifter.

#![allow(clippy::new_without_default)]

pub mod bus;
pub mod config;
pub mod devices;
pub mod machine_types;
pub mod timing;
pub mod util;

pub use bus::MemoryMappedDevice;
pub use config::AdapterConfig;
pub use devices::vga::VgaMemory;
