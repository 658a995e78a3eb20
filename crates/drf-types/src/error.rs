use drf_wire::WireError;

/// Errors raised while encoding or decoding typed region bodies.
///
/// These sit one level above [`WireError`]: they are about which fields a
/// region body carries, not about raw framing.
///
/// ```text
/// ┌─────────────────────────────────────────────────────┐
/// │ TypeError                                           │
/// │   ├── MissingRequiredField   incomplete body        │
/// │   ├── UnexpectedField        field order violated   │
/// │   ├── UnknownFieldWireType   bad TLV wire type      │
/// │   ├── InvalidEnumValue       out-of-range enum byte │
/// │   └── Wire                   varint / length errors │
/// └─────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
  #[error("missing required field: {field}")]
  MissingRequiredField { field: &'static str },

  /// A field appeared where the layout requires a different one.
  ///
  /// IMAGE bodies must open with their nested header so the header can
  /// be read without touching the payload.
  #[error("expected field {expected} first, found field {found}")]
  UnexpectedField { expected: u64, found: u64 },

  /// The TLV wire type was not 0, 1, or 2.
  #[error("unknown field wire type: {value}")]
  UnknownFieldWireType { value: u64 },

  #[error("invalid {enum_name} value: {value:#04X}")]
  InvalidEnumValue { enum_name: &'static str, value: u8 },

  /// A varint field held a value too wide for its typed slot.
  #[error("field {field} value {value} out of range")]
  ValueOutOfRange { field: &'static str, value: u64 },

  #[error(transparent)]
  Wire(#[from] WireError),
}
