//! Ladder tier names for RANK mode.

/// Tier labels indexed by rank value minus one (`ビギナー2` = 1 … `マスター1` = 32).
pub const TIERS: [&str; 32] = [
    "ビギナー2",
    "ビギナー1",
    "ブロンズ5",
    "ブロンズ4",
    "ブロンズ3",
    "ブロンズ2",
    "ブロンズ1",
    "シルバー5",
    "シルバー4",
    "シルバー3",
    "シルバー2",
    "シルバー1",
    "ゴールド5",
    "ゴールド4",
    "ゴールド3",
    "ゴールド2",
    "ゴールド1",
    "プラチナ5",
    "プラチナ4",
    "プラチナ3",
    "プラチナ2",
    "プラチナ1",
    "ダイヤモンド5",
    "ダイヤモンド4",
    "ダイヤモンド3",
    "ダイヤモンド2",
    "ダイヤモンド1",
    "マスター5",
    "マスター4",
    "マスター3",
    "マスター2",
    "マスター1",
];

/// Rank preselected by the entry form (`プラチナ5`).
pub const DEFAULT_RANK: i64 = 18;

/// Tier label for a rank value, if it is inside the table.
pub fn tier_name(rank: i64) -> Option<&'static str> {
    usize::try_from(rank)
        .ok()
        .and_then(|r| r.checked_sub(1))
        .and_then(|idx| TIERS.get(idx).copied())
}

/// Render a rank for display: the tier label, or the bare number.
pub fn display(rank: i64) -> String {
    tier_name(rank)
        .map(str::to_string)
        .unwrap_or_else(|| rank.to_string())
}

/// Parse a tier label back to its rank, falling back to a bare integer.
pub fn parse(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    TIERS
        .iter()
        .position(|tier| *tier == trimmed)
        .map(|idx| idx as i64 + 1)
        .or_else(|| trimmed.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platinum_five_is_eighteen() {
        assert_eq!(parse("プラチナ5"), Some(DEFAULT_RANK));
        assert_eq!(tier_name(18), Some("プラチナ5"));
    }

    #[test]
    fn bounds_of_table() {
        assert_eq!(tier_name(1), Some("ビギナー2"));
        assert_eq!(tier_name(32), Some("マスター1"));
        assert_eq!(tier_name(0), None);
        assert_eq!(tier_name(33), None);
        assert_eq!(tier_name(-1), None);
    }

    #[test]
    fn unknown_label_falls_back_to_integer() {
        assert_eq!(parse("99"), Some(99));
        assert_eq!(parse(" 7 "), Some(7));
        assert_eq!(parse("レジェンド"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn display_outside_table_is_numeric() {
        assert_eq!(display(99), "99");
        assert_eq!(display(28), "マスター5");
    }
}
