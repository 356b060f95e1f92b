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

    config.rs

    Adapter configuration, deserialized from TOML.

*/

use std::path::Path;

use anyhow::Context;
use serde_derive::Deserialize;
use thiserror::Error;

use crate::machine_types::{MachineType, SvgaCard};

pub const DEFAULT_MEMIO_DELAY_NS: u32 = 1000;
pub const MIN_VMEMSIZE_KB: u32 = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VRAM size of {0}KB is not a power of two")]
    VramNotPowerOfTwo(u32),
    #[error("VRAM size of {0}KB is below the 16KB minimum")]
    VramTooSmall(u32),
    #[error("PC-98 graphics require at least 512KB of VRAM, got {0}KB")]
    Pc98VramTooSmall(u32),
    #[error("failed to parse adapter configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_vmemsize_kb() -> u32 {
    256
}

fn default_memio_delay_ns() -> u32 {
    DEFAULT_MEMIO_DELAY_NS
}

fn default_total_memory_kb() -> u32 {
    640
}

#[derive(Clone, Debug, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub machine: MachineType,
    #[serde(default)]
    pub svga: SvgaCard,
    #[serde(default = "default_vmemsize_kb")]
    pub vmemsize_kb: u32,
    /// Modeled wait-state per VRAM access, in nanoseconds. 0 disables the delay.
    #[serde(default = "default_memio_delay_ns")]
    pub memio_delay_ns: u32,
    #[serde(default)]
    pub cga_snow: bool,
    /// When set, legacy windows not claimed by the current memory map revert to system RAM
    /// instead of floating.
    #[serde(default)]
    pub adapter_rom_is_ram: bool,
    #[serde(default = "default_total_memory_kb")]
    pub total_memory_kb: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            machine: MachineType::default(),
            svga: SvgaCard::default(),
            vmemsize_kb: default_vmemsize_kb(),
            memio_delay_ns: default_memio_delay_ns(),
            cga_snow: false,
            adapter_rom_is_ram: false,
            total_memory_kb: default_total_memory_kb(),
        }
    }
}

impl AdapterConfig {
    pub fn new(machine: MachineType, svga: SvgaCard, vmemsize_kb: u32) -> Self {
        Self {
            machine,
            svga,
            vmemsize_kb,
            ..Default::default()
        }
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AdapterConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't read adapter config: {}", path.display()))?;
        let config = AdapterConfig::from_toml_str(&toml_str)
            .with_context(|| format!("Invalid adapter config: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vmemsize_kb < MIN_VMEMSIZE_KB {
            return Err(ConfigError::VramTooSmall(self.vmemsize_kb));
        }
        if !self.vmemsize_kb.is_power_of_two() {
            return Err(ConfigError::VramNotPowerOfTwo(self.vmemsize_kb));
        }
        if matches!(self.machine, MachineType::Pc98) && self.vmemsize_kb < 512 {
            return Err(ConfigError::Pc98VramTooSmall(self.vmemsize_kb));
        }
        Ok(())
    }

    pub fn vmemsize(&self) -> usize {
        self.vmemsize_kb as usize * 1024
    }

    /// Guest RAM size in 4K pages.
    pub fn total_pages(&self) -> usize {
        self.total_memory_kb as usize / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = AdapterConfig::from_toml_str(
            r#"
            machine = "Vga"
            svga = "TsengEt4k"
            vmemsize_kb = 1024
            cga_snow = true
            "#,
        )
        .unwrap();
        assert_eq!(config.machine, MachineType::Vga);
        assert_eq!(config.svga, SvgaCard::TsengEt4k);
        assert_eq!(config.vmemsize(), 0x100000);
        assert_eq!(config.memio_delay_ns, DEFAULT_MEMIO_DELAY_NS);
        assert!(config.cga_snow);
    }

    #[test]
    fn test_rejects_bad_vram_size() {
        assert!(matches!(
            AdapterConfig::from_toml_str("vmemsize_kb = 384"),
            Err(ConfigError::VramNotPowerOfTwo(384))
        ));
        assert!(matches!(
            AdapterConfig::from_toml_str("vmemsize_kb = 8"),
            Err(ConfigError::VramTooSmall(8))
        ));
        assert!(matches!(
            AdapterConfig::from_toml_str("machine = \"Pc98\"\nvmemsize_kb = 256"),
            Err(ConfigError::Pc98VramTooSmall(256))
        ));
    }

    #[test]
    fn test_rejects_unknown_machine() {
        assert!(matches!(
            AdapterConfig::from_toml_str("machine = \"Apple2\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
