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

    machine_types.rs

    Machine, SVGA chipset and display mode type definitions.

*/

use std::str::FromStr;

use serde_derive::Deserialize;
use strum_macros::{Display, EnumIter};

#[derive(Copy, Clone, Debug, Default, Deserialize, Hash, Eq, PartialEq, Display, EnumIter)]
pub enum MachineType {
    Cga,
    PcJr,
    Hercules,
    Tandy,
    Amstrad,
    Ega,
    #[default]
    Vga,
    Pc98,
}

impl FromStr for MachineType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "cga" => Ok(MachineType::Cga),
            "pcjr" => Ok(MachineType::PcJr),
            "hercules" | "herc" => Ok(MachineType::Hercules),
            "tandy" => Ok(MachineType::Tandy),
            "amstrad" => Ok(MachineType::Amstrad),
            "ega" => Ok(MachineType::Ega),
            "vga" => Ok(MachineType::Vga),
            "pc98" => Ok(MachineType::Pc98),
            _ => Err("Bad value for MachineType".to_string()),
        }
    }
}

impl MachineType {
    /// EGA and VGA share the planar memory architecture.
    pub fn is_ega_vga(&self) -> bool {
        matches!(self, MachineType::Ega | MachineType::Vga)
    }
}

#[derive(Copy, Clone, Debug, Default, Deserialize, Hash, Eq, PartialEq, Display)]
pub enum SvgaCard {
    #[default]
    None,
    S3Trio,
    TsengEt3k,
    TsengEt4k,
    ParadisePvga1a,
}

impl FromStr for SvgaCard {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "none" => Ok(SvgaCard::None),
            "s3" | "s3trio" => Ok(SvgaCard::S3Trio),
            "et3000" | "tsenget3k" => Ok(SvgaCard::TsengEt3k),
            "et4000" | "tsenget4k" => Ok(SvgaCard::TsengEt4k),
            "pvga1a" | "paradisepvga1a" => Ok(SvgaCard::ParadisePvga1a),
            _ => Err("Bad value for SvgaCard".to_string()),
        }
    }
}

impl SvgaCard {
    pub fn is_tseng(&self) -> bool {
        matches!(self, SvgaCard::TsengEt3k | SvgaCard::TsengEt4k)
    }
}

/// The display mode as decoded by the CRTC/attribute collaborators. Only the memory layout
/// implied by each mode matters here.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Display, EnumIter)]
pub enum VideoMode {
    #[default]
    Error,
    Text,
    Cga2,
    Cga4,
    TandyText,
    Tandy2,
    Tandy4,
    Tandy16,
    HercText,
    HercGfx,
    Ega,
    Vga,
    Lin4,
    Lin8,
    Lin15,
    Lin16,
    Lin24,
    Lin32,
    Amstrad,
    Pc98,
}

impl VideoMode {
    /// Modes whose pixels are read straight out of a linear framebuffer.
    pub fn is_direct_color(&self) -> bool {
        matches!(self, VideoMode::Lin15 | VideoMode::Lin16 | VideoMode::Lin24 | VideoMode::Lin32)
    }

    pub fn is_cga_text(&self) -> bool {
        matches!(self, VideoMode::Text | VideoMode::TandyText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_type_from_str() {
        assert_eq!(MachineType::from_str("PC98"), Ok(MachineType::Pc98));
        assert_eq!(MachineType::from_str("herc"), Ok(MachineType::Hercules));
        assert!(MachineType::from_str("apple2").is_err());
    }

    #[test]
    fn test_svga_card_from_str() {
        assert_eq!(SvgaCard::from_str("ET4000"), Ok(SvgaCard::TsengEt4k));
        assert!(SvgaCard::TsengEt3k.is_tseng());
        assert!(!SvgaCard::S3Trio.is_tseng());
    }
}
