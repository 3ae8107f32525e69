//! Faction tables.
//!
//! The API exposes the nine races under two independent numberings: the 1v1
//! leaderboard ids run 1..=9 while in-match race codes run 0..=8. Both tables
//! are kept as observed upstream rather than derived from one another.

/// 1v1 leaderboard id paired with the faction it ranks.
pub const FACTIONS: [(u32, &str); 9] = [
    (1, "Chaos"),
    (2, "Dark Eldar"),
    (3, "Eldar"),
    (4, "Imperial Guard"),
    (5, "Necrons"),
    (6, "Orks"),
    (7, "Sisters of Battle"),
    (8, "Space Marines"),
    (9, "Tau Empire"),
];

/// In-match race code paired with the faction name.
pub const RACE_CODES: [(u32, &str); 9] = [
    (0, "Chaos"),
    (1, "Dark Eldar"),
    (2, "Eldar"),
    (3, "Imperial Guard"),
    (4, "Necrons"),
    (5, "Orks"),
    (6, "Sisters of Battle"),
    (7, "Space Marines"),
    (8, "Tau Empire"),
];

pub fn faction_name(leaderboard_id: u32) -> Option<&'static str> {
    FACTIONS
        .iter()
        .find(|(id, _)| *id == leaderboard_id)
        .map(|(_, name)| *name)
}

/// Name for an in-match race code. Codes outside the known table get a
/// synthetic label so an unexpected code never invalidates a match.
pub fn race_name(race_id: u32) -> String {
    RACE_CODES
        .iter()
        .find(|(id, _)| *id == race_id)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Race {race_id}"))
}

pub fn race_names() -> impl Iterator<Item = &'static str> {
    FACTIONS.iter().map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_ids_offset_from_race_codes_by_one() {
        for ((lb_id, lb_name), (code, code_name)) in FACTIONS.iter().zip(RACE_CODES.iter()) {
            assert_eq!(*lb_id, code + 1);
            assert_eq!(lb_name, code_name);
        }
    }

    #[test]
    fn unknown_race_code_gets_synthetic_label() {
        assert_eq!(race_name(7), "Space Marines");
        assert_eq!(race_name(12), "Race 12");
    }
}
