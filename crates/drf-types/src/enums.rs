use crate::error::TypeError;

// Each wire enum is a closed set of variants mapped to one byte, with a
// to/from pair. The macro keeps doc comments and derives at the call site.
macro_rules! wire_enum {
  (
    $(#[$meta:meta])*
    pub enum $name:ident {
      $( $(#[$vmeta:meta])* $variant:ident = $wire:expr ),+ $(,)?
    }
  ) => {
    $(#[$meta])*
    pub enum $name {
      $( $(#[$vmeta])* $variant ),+
    }

    impl $name {
      /// Encode this variant as a single wire byte.
      pub fn to_wire_byte(self) -> u8 {
        match self {
          $( Self::$variant => $wire ),+
        }
      }

      /// Decode a wire byte into this enum.
      ///
      /// # Errors
      ///
      /// [`TypeError::InvalidEnumValue`] for bytes outside the set.
      pub fn from_wire_byte(value: u8) -> Result<Self, TypeError> {
        match value {
          $( $wire => Ok(Self::$variant), )+
          other => Err(TypeError::InvalidEnumValue {
            enum_name: stringify!($name),
            value: other,
          }),
        }
      }
    }
  };
}

wire_enum! {
  /// Pixel layout of an IMAGE region's decoded payload.
  ///
  /// ```text
  /// ┌──────┬───────┬─────────────────┐
  /// │ Wire │ Type  │ Bytes per pixel │
  /// ├──────┼───────┼─────────────────┤
  /// │ 0x01 │ Gray8 │ 1               │
  /// │ 0x02 │ Rgb8  │ 3               │
  /// │ 0x03 │ Rgba8 │ 4               │
  /// └──────┴───────┴─────────────────┘
  /// ```
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub enum PixelFormat {
    Gray8 = 0x01,
    Rgb8 = 0x02,
    Rgba8 = 0x03,
  }
}

impl PixelFormat {
  pub fn bytes_per_pixel(self) -> u64 {
    match self {
      Self::Gray8 => 1,
      Self::Rgb8 => 3,
      Self::Rgba8 => 4,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Gray8 => "gray8",
      Self::Rgb8 => "rgb8",
      Self::Rgba8 => "rgba8",
    }
  }

  /// Parse the lowercase name used by manifests and the CLI.
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "gray8" => Some(Self::Gray8),
      "rgb8" => Some(Self::Rgb8),
      "rgba8" => Some(Self::Rgba8),
      _ => None,
    }
  }
}
