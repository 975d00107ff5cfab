//! Card encoding variants and their precedence.

use std::fmt;

/// The encoding a card was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatVariant {
    /// Character Card V3, `ccv3` text chunk.
    V3,
    /// Character Card V2, `chara` text chunk.
    V2,
    /// Legacy NovelAI/TavernAI V1 JSON stored as plain text under `chara`.
    LegacyV1,
    /// Stable Diffusion `parameters` text. Read-only.
    StableDiffusion,
}

impl FormatVariant {
    /// All variants, highest priority first.
    pub const PRECEDENCE: [FormatVariant; 4] = [
        FormatVariant::V3,
        FormatVariant::V2,
        FormatVariant::LegacyV1,
        FormatVariant::StableDiffusion,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FormatVariant::V3 => "TavernAI V3",
            FormatVariant::V2 => "TavernAI V2",
            FormatVariant::LegacyV1 => "NovelAI V1",
            FormatVariant::StableDiffusion => "Stable Diffusion",
        }
    }

    /// Whether cards of this variant can be saved back.
    pub fn is_read_only(&self) -> bool {
        matches!(self, FormatVariant::StableDiffusion)
    }

    /// Whether this variant is read from the chunk scan rather than the text-metadata fallback.
    pub fn is_chunk_variant(&self) -> bool {
        matches!(self, FormatVariant::V3 | FormatVariant::V2)
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        let mut sorted = FormatVariant::PRECEDENCE;
        sorted.sort();
        assert_eq!(sorted, FormatVariant::PRECEDENCE);
        assert_eq!(FormatVariant::PRECEDENCE[0], FormatVariant::V3);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FormatVariant::V2.to_string(), "TavernAI V2");
        assert!(FormatVariant::StableDiffusion.is_read_only());
        assert!(!FormatVariant::LegacyV1.is_chunk_variant());
    }
}
