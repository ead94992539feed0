/// Medal label for a 1-based group rank.
///
/// | Rank    | Label       |
/// |---------|-------------|
/// | 1 - 4   | GOLD n      |
/// | 5 - 8   | SILVER n    |
/// | 9 - 12  | BRONZE n    |
/// | > 12    | n           |
pub fn medal(rank: usize) -> Option<&'static str> {
    match rank {
        1..=4 => Some("gold"),
        5..=8 => Some("silver"),
        9..=12 => Some("bronze"),
        _ => None,
    }
}

/// Rank cell: a styled medal label, or the bare rank past the medal places.
pub fn rank_label(rank: usize) -> String {
    match medal(rank) {
        Some(kind) => super::table::tag(
            &format!("{} {rank}", kind.to_uppercase()),
            "span",
            &[("class", &format!("label label-{kind}"))],
        ),
        None => rank.to_string(),
    }
}
