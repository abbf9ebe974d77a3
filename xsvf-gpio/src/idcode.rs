use std::fmt::Display;

/// A 32 bit JTAG IDCODE.
///
/// ```text
///  31    28 27                12 11           1   0
/// | version |    part number     | manufacturer | 1 |
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct IdCode(pub u32);

impl IdCode {
    /// JEDEC manufacturer code, bits 1-11
    pub fn manufacturer(self) -> u16 {
        ((self.0 >> 1) & 0x7ff) as u16
    }

    /// Part number, bits 12-27
    pub fn part(self) -> u16 {
        ((self.0 >> 12) & 0xffff) as u16
    }

    /// Revision, bits 28-31
    pub fn revision(self) -> u8 {
        ((self.0 >> 28) & 0xf) as u8
    }
}

impl Display for IdCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "idcode=0x{:08x}, revision=0x{:x}, part=0x{:04x}, manufacturer=0x{:03x}",
            self.0,
            self.revision(),
            self.part(),
            self.manufacturer()
        )
    }
}

#[test]
fn field_extraction() {
    let id = IdCode(0x1234_5678);
    assert_eq!(id.manufacturer(), 0x33c);
    assert_eq!(id.part(), 0x2345);
    assert_eq!(id.revision(), 0x1);
}

#[test]
fn field_boundaries() {
    assert_eq!(IdCode(0x0000_0ffe).manufacturer(), 0x7ff);
    assert_eq!(IdCode(0x0000_0ffe).part(), 0);
    assert_eq!(IdCode(0x0fff_f000).part(), 0xffff);
    assert_eq!(IdCode(0x0fff_f000).manufacturer(), 0);
    assert_eq!(IdCode(0xf000_0000).revision(), 0xf);
    assert_eq!(IdCode(0xf000_0000).part(), 0);
}

#[test]
fn display() {
    assert_eq!(
        IdCode(0x4ba0_0477).to_string(),
        "idcode=0x4ba00477, revision=0x4, part=0xba00, manufacturer=0x23b"
    );
}
