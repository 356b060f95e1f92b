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

    devices::vga::tablegen.rs

    Const table generation for the planar write pipeline.

*/

/// LUT to replicate a byte into all four plane lanes of a planar dword.
pub const EXPAND_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u32;
        table[i] = b | (b << 8) | (b << 16) | (b << 24);
        i += 1;
    }
    table
};

/// LUT to extend a 4-bit plane mask into a planar dword, with bit n of the nibble selecting
/// lane n as 0xFF.
pub const FILL_TABLE: [u32; 16] = {
    let mut table = [0u32; 16];
    let mut i = 0;
    while i < 16 {
        let mut lane = 0;
        let mut k = 0u32;
        while lane < 4 {
            if (i >> lane) & 0x01 != 0 {
                k |= 0xFFu32 << (lane * 8);
            }
            lane += 1;
        }
        table[i] = k;
        i += 1;
    }
    table
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_table() {
        assert_eq!(EXPAND_TABLE[0x00], 0x00000000);
        assert_eq!(EXPAND_TABLE[0xAA], 0xAAAAAAAA);
        assert_eq!(EXPAND_TABLE[0x5F], 0x5F5F5F5F);
    }

    #[test]
    fn test_fill_table() {
        assert_eq!(FILL_TABLE[0b0000], 0x00000000);
        assert_eq!(FILL_TABLE[0b0001], 0x000000FF);
        assert_eq!(FILL_TABLE[0b0101], 0x00FF00FF);
        assert_eq!(FILL_TABLE[0b1000], 0xFF000000);
        assert_eq!(FILL_TABLE[0b1111], 0xFFFFFFFF);
    }
}
