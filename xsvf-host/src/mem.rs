//! Buffer categories requested through [`crate::XsvfHost::realloc`].
use std::fmt::Display;

macro_rules! mem_kinds {
    ($($variant:ident => $name:literal,)*) => {
        /// The working buffers a playback engine allocates, one category per purpose.
        ///
        /// The discriminant is the engine's category index.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub enum MemKind {
            $($variant,)*
        }

        impl MemKind {
            /// All categories in index order
            pub const ALL: &[MemKind] = &[$(MemKind::$variant,)*];

            /// The name used in generated code
            pub fn name(self) -> &'static str {
                match self {
                    $(MemKind::$variant => $name,)*
                }
            }
        }
    };
}

mem_kinds! {
    XsvfTdiData => "XSVF_TDI_DATA",
    XsvfTdoData => "XSVF_TDO_DATA",
    XsvfTdoMask => "XSVF_TDO_MASK",
    XsvfAddrMask => "XSVF_ADDR_MASK",
    XsvfDataMask => "XSVF_DATA_MASK",
    SvfCommandBuf => "SVF_COMMANDBUF",
    SvfHdrTdiData => "SVF_HDR_TDI_DATA",
    SvfHdrTdiMask => "SVF_HDR_TDI_MASK",
    SvfHdrTdoData => "SVF_HDR_TDO_DATA",
    SvfHdrTdoMask => "SVF_HDR_TDO_MASK",
    SvfHdrRetMask => "SVF_HDR_RET_MASK",
    SvfHirTdiData => "SVF_HIR_TDI_DATA",
    SvfHirTdiMask => "SVF_HIR_TDI_MASK",
    SvfHirTdoData => "SVF_HIR_TDO_DATA",
    SvfHirTdoMask => "SVF_HIR_TDO_MASK",
    SvfHirRetMask => "SVF_HIR_RET_MASK",
    SvfTdrTdiData => "SVF_TDR_TDI_DATA",
    SvfTdrTdiMask => "SVF_TDR_TDI_MASK",
    SvfTdrTdoData => "SVF_TDR_TDO_DATA",
    SvfTdrTdoMask => "SVF_TDR_TDO_MASK",
    SvfTdrRetMask => "SVF_TDR_RET_MASK",
    SvfTirTdiData => "SVF_TIR_TDI_DATA",
    SvfTirTdiMask => "SVF_TIR_TDI_MASK",
    SvfTirTdoData => "SVF_TIR_TDO_DATA",
    SvfTirTdoMask => "SVF_TIR_TDO_MASK",
    SvfTirRetMask => "SVF_TIR_RET_MASK",
    SvfSdrTdiData => "SVF_SDR_TDI_DATA",
    SvfSdrTdiMask => "SVF_SDR_TDI_MASK",
    SvfSdrTdoData => "SVF_SDR_TDO_DATA",
    SvfSdrTdoMask => "SVF_SDR_TDO_MASK",
    SvfSdrRetMask => "SVF_SDR_RET_MASK",
    SvfSirTdiData => "SVF_SIR_TDI_DATA",
    SvfSirTdiMask => "SVF_SIR_TDI_MASK",
    SvfSirTdoData => "SVF_SIR_TDO_DATA",
    SvfSirTdoMask => "SVF_SIR_TDO_MASK",
    SvfSirRetMask => "SVF_SIR_RET_MASK",
}

impl MemKind {
    /// Number of categories
    pub const COUNT: usize = MemKind::ALL.len();

    /// Index of this category in tables indexed by category
    pub fn index(self) -> usize {
        self as usize
    }
}

impl Display for MemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn indices_follow_declaration_order() {
    assert_eq!(MemKind::COUNT, 36);
    for (i, kind) in MemKind::ALL.iter().enumerate() {
        assert_eq!(kind.index(), i);
    }
    assert_eq!(MemKind::SvfCommandBuf.index(), 5);
    assert_eq!(MemKind::SvfSirRetMask.name(), "SVF_SIR_RET_MASK");
}
