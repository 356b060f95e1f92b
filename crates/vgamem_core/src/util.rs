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

    util.rs

    Utility routines.

*/

use fxhash::FxHashSet;

/// Categories of diagnostic that are reported only once per distinct value.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Diagnostic {
    UnsupportedWriteMode,
    UnsupportedVramOp,
    UnimplementedEgcRop,
}

/// Remembers which diagnostics have already been logged.
#[derive(Clone, Debug, Default)]
pub struct WarnOnce {
    seen: FxHashSet<(Diagnostic, u32)>,
}

impl WarnOnce {
    pub fn new() -> Self {
        WarnOnce::default()
    }

    /// Returns true the first time a (diagnostic, code) pair is seen.
    #[inline]
    pub fn first(&mut self, kind: Diagnostic, code: u32) -> bool {
        self.seen.insert((kind, code))
    }

    pub fn seen(&self, kind: Diagnostic, code: u32) -> bool {
        self.seen.contains(&(kind, code))
    }

    pub fn count(&self) -> usize {
        self.seen.len()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once() {
        let mut warn = WarnOnce::new();
        assert!(warn.first(Diagnostic::UnimplementedEgcRop, 0x42));
        assert!(!warn.first(Diagnostic::UnimplementedEgcRop, 0x42));
        assert!(warn.first(Diagnostic::UnsupportedVramOp, 0x42));
        assert_eq!(warn.count(), 2);
    }
}
