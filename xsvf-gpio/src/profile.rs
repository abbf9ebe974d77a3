//! Buffer size profiling.
//!
//! Recording the largest buffer an engine ever asks for, per category, over a run with
//! representative vector files yields the static buffer sizes needed to run the same engine on
//! a target without a heap. [`MemoryProfile::write_allocator`] emits a C allocator backed by
//! such static buffers.
use std::io::{self, Write};

use xsvf_host::MemKind;

#[derive(Debug, Clone)]
pub struct MemoryProfile {
    max_size: [usize; MemKind::COUNT],
}

impl Default for MemoryProfile {
    fn default() -> Self {
        MemoryProfile {
            max_size: [0; MemKind::COUNT],
        }
    }
}

impl MemoryProfile {
    pub fn new() -> MemoryProfile {
        MemoryProfile::default()
    }

    /// Note a request for `size` bytes of `kind`.
    pub fn record(&mut self, kind: MemKind, size: usize) {
        let max = &mut self.max_size[kind.index()];
        if size > *max {
            *max = size;
        }
    }

    /// Largest size requested for `kind` so far.
    pub fn max(&self, kind: MemKind) -> usize {
        self.max_size[kind.index()]
    }

    /// Categories that were requested with a non-zero size, with their maximum.
    pub fn used(&self) -> impl Iterator<Item = (MemKind, usize)> + '_ {
        MemKind::ALL
            .iter()
            .map(|&kind| (kind, self.max(kind)))
            .filter(|&(_, size)| size > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.used().next().is_none()
    }

    /// Write a C function `name` with the signature of the engine's realloc callback that
    /// hands out one static buffer per used category.
    ///
    /// The tables are sized up to the highest used category. A request for an unused category
    /// or for more than the recorded maximum returns a null pointer.
    pub fn write_allocator(&self, name: &str, out: &mut impl Write) -> io::Result<()> {
        let num = self.used().last().map_or(0, |(kind, _)| kind.index() + 1);
        let kinds = &MemKind::ALL[..num];

        writeln!(
            out,
            "void *{}(void *h, void *ptr, int size, int which) {{",
            name
        )?;
        for (kind, size) in self.used() {
            writeln!(out, "\tstatic unsigned char buf_{}[{}];", kind, size)?;
        }

        let buffers: Vec<String> = kinds
            .iter()
            .map(|&kind| match self.max(kind) {
                0 => "(void*)0".to_string(),
                _ => format!("buf_{}", kind),
            })
            .collect();
        writeln!(
            out,
            "\tstatic unsigned char *buflist[{}] = {{{} }};",
            num,
            initializer(&buffers)
        )?;

        let sizes: Vec<String> = kinds
            .iter()
            .map(|&kind| match self.max(kind) {
                0 => "0".to_string(),
                _ => format!("sizeof(buf_{})", kind),
            })
            .collect();
        writeln!(
            out,
            "\tstatic int sizelist[{}] = {{{} }};",
            num,
            initializer(&sizes)
        )?;

        writeln!(
            out,
            "\treturn which < {} && size <= sizelist[which] ? buflist[which] : (void*)0;",
            num
        )?;
        writeln!(out, "}};")
    }
}

/// Elements of a C array initializer, each preceded by its separator.
fn initializer(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}{}", if i == 0 { " " } else { ", " }, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_maximum() {
        let mut profile = MemoryProfile::new();
        profile.record(MemKind::SvfCommandBuf, 10);
        profile.record(MemKind::SvfCommandBuf, 30);
        profile.record(MemKind::SvfCommandBuf, 5);
        assert_eq!(profile.max(MemKind::SvfCommandBuf), 30);
        assert_eq!(profile.max(MemKind::XsvfTdiData), 0);
    }

    #[test]
    fn zero_sized_requests_do_not_count_as_used() {
        let mut profile = MemoryProfile::new();
        profile.record(MemKind::XsvfTdoMask, 0);
        assert!(profile.is_empty());
    }

    #[test]
    fn allocator_source() {
        let mut profile = MemoryProfile::new();
        profile.record(MemKind::XsvfTdiData, 4);
        profile.record(MemKind::XsvfTdoMask, 8);

        let mut out = Vec::new();
        profile.write_allocator("my_realloc", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "void *my_realloc(void *h, void *ptr, int size, int which) {\n\
             \tstatic unsigned char buf_XSVF_TDI_DATA[4];\n\
             \tstatic unsigned char buf_XSVF_TDO_MASK[8];\n\
             \tstatic unsigned char *buflist[3] = { buf_XSVF_TDI_DATA, (void*)0, buf_XSVF_TDO_MASK };\n\
             \tstatic int sizelist[3] = { sizeof(buf_XSVF_TDI_DATA), 0, sizeof(buf_XSVF_TDO_MASK) };\n\
             \treturn which < 3 && size <= sizelist[which] ? buflist[which] : (void*)0;\n\
             };\n"
        );
    }

    #[test]
    fn empty_allocator_never_hands_out_buffers() {
        let mut out = Vec::new();
        MemoryProfile::new().write_allocator("f", &mut out).unwrap();
        let source = String::from_utf8(out).unwrap();
        assert!(source.contains("static unsigned char *buflist[0] = { };"));
        assert!(source.contains("return which < 0 &&"));
    }
}
