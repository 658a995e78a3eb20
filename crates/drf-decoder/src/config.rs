/// Settings for [`DocumentReader`](crate::DocumentReader).
///
/// ```text
/// ┌─────────────────────┬──────────────────┬───────────────────────────────┐
/// │ Field               │ Default          │ Purpose                       │
/// ├─────────────────────┼──────────────────┼───────────────────────────────┤
/// │ lazy_policy         │ Threshold(4096)  │ which images are left lazy    │
/// │ max_pixel_bytes     │ 64 MiB           │ cap on one decoded image      │
/// │ max_text_bytes      │ 16 MiB           │ cap on one TEXT body          │
/// │ verify_digests      │ true             │ check BLAKE3 when present     │
/// │ allow_trailing_data │ false            │ accept bytes after END        │
/// └─────────────────────┴──────────────────┴───────────────────────────────┘
/// ```
///
/// The pixel cap applies when an image is loaded, not when it is
/// skipped, so an oversized image only fails the access that needs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub lazy_policy: LazyPolicy,
    pub max_pixel_bytes: usize,
    pub max_text_bytes: usize,
    pub verify_digests: bool,
    pub allow_trailing_data: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            lazy_policy: LazyPolicy::Threshold(4096),
            max_pixel_bytes: 64 * 1024 * 1024,
            max_text_bytes: 16 * 1024 * 1024,
            verify_digests: true,
            allow_trailing_data: false,
        }
    }
}

impl DecoderConfig {
    /// Defaults with every image loaded during the initial pass.
    #[must_use]
    pub fn eager() -> Self {
        Self {
            lazy_policy: LazyPolicy::Never,
            ..Self::default()
        }
    }
}

/// Which IMAGE regions are left unloaded after the initial pass.
///
/// Every image goes through the same lazy binding either way; under a
/// policy that declines to defer, the reader just forces the load right
/// after wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LazyPolicy {
    Always,
    Never,
    /// Defer images whose stored body is at least this many bytes.
    Threshold(u64),
}

impl LazyPolicy {
    #[must_use]
    pub fn defers(self, content_len: u64) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Threshold(min) => content_len >= min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let policy = LazyPolicy::Threshold(4096);
        assert!(!policy.defers(4095));
        assert!(policy.defers(4096));
    }

    #[test]
    fn eager_only_changes_policy() {
        let eager = DecoderConfig::eager();
        assert_eq!(eager.lazy_policy, LazyPolicy::Never);
        assert_eq!(eager.max_pixel_bytes, DecoderConfig::default().max_pixel_bytes);
    }
}
