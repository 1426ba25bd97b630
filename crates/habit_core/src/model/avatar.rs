//! Avatar palette offered when creating a habit.

/// Glyphs offered by the avatar picker, in display order.
pub const AVATAR_PALETTE: &[&str] = &[
    "🏃‍♂️", "💪", "📚", "🧘‍♂️", "💧", "🥗", "😴", "🎯", "✍️", "🎨", "🎸", "🧠",
];

/// Avatar preselected for new habits.
pub const DEFAULT_AVATAR: &str = "🎯";

/// Returns a trimmed avatar, falling back to [`DEFAULT_AVATAR`] when blank.
///
/// Any non-blank glyph is accepted; the palette is a suggestion only.
pub fn normalize_avatar(avatar: &str) -> String {
    let trimmed = avatar.trim();
    if trimmed.is_empty() {
        DEFAULT_AVATAR.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_avatar, AVATAR_PALETTE, DEFAULT_AVATAR};

    #[test]
    fn default_avatar_is_in_palette() {
        assert!(AVATAR_PALETTE.contains(&DEFAULT_AVATAR));
    }

    #[test]
    fn blank_avatar_falls_back_to_default() {
        assert_eq!(normalize_avatar("  "), DEFAULT_AVATAR);
        assert_eq!(normalize_avatar(" 📚 "), "📚");
    }
}
