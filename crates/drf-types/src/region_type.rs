use drf_wire::region_frame::region_type;

/// Semantic region type identifiers.
///
/// ```text
/// ┌──────┬─────────┬──────────────────────────────────────┐
/// │ Wire │ Variant │ Description                          │
/// ├──────┼─────────┼──────────────────────────────────────┤
/// │ 0x01 │ Text    │ Titled text, always parsed eagerly   │
/// │ 0x02 │ Image   │ Pixel payload, eligible for deferral │
/// │ 0xFF │ End     │ End-of-document sentinel             │
/// └──────┴─────────┴──────────────────────────────────────┘
/// ```
///
/// Anything else is kept as `Unknown(id)` and skipped by length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionType {
    Text,
    Image,
    End,
    Unknown(u8),
}

impl RegionType {
    pub fn wire_id(self) -> u8 {
        match self {
            Self::Text => region_type::TEXT,
            Self::Image => region_type::IMAGE,
            Self::End => region_type::END,
            Self::Unknown(id) => id,
        }
    }

    pub fn from_wire_id(id: u8) -> Self {
        match id {
            region_type::TEXT => Self::Text,
            region_type::IMAGE => Self::Image,
            region_type::END => Self::End,
            other => Self::Unknown(other),
        }
    }

    /// Uppercase label used in summaries and CLI output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::End => "END",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}
