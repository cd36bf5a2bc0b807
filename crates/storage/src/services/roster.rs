use crate::models::{Gender, PlayStyle, RosterPlayer};

use crate::models::Gender::{Men, Women};
use crate::models::PlayStyle::{AllRound, Attacking, Defensive, FastAttack, Power};

const ROSTER: &[(&str, &str, u32, u32, PlayStyle, Gender)] = &[
    ("Wang Chuqin", "CHN", 1, 95, Attacking, Men),
    ("Fan Zhendong", "CHN", 2, 94, Attacking, Men),
    ("Ma Long", "CHN", 3, 93, AllRound, Men),
    ("Liang Jingkun", "CHN", 4, 91, Attacking, Men),
    ("Lin Shidong", "CHN", 5, 90, Attacking, Men),
    ("Tomokazu Harimoto", "JPN", 6, 89, Attacking, Men),
    ("Hugo Calderano", "BRA", 7, 88, Attacking, Men),
    ("Lin Yun-Ju", "TPE", 8, 87, FastAttack, Men),
    ("Truls Moregard", "SWE", 9, 86, Attacking, Men),
    ("Felix Lebrun", "FRA", 10, 85, Attacking, Men),
    ("Quadri Aruna", "NGR", 11, 84, Power, Men),
    ("Lim Jonghoon", "KOR", 12, 83, Defensive, Men),
    ("Dimitrij Ovtcharov", "GER", 13, 82, AllRound, Men),
    ("Patrick Franziska", "GER", 14, 81, Attacking, Men),
    ("Darko Jorgic", "SLO", 15, 80, Attacking, Men),
    ("Sun Yingsha", "CHN", 1, 96, Attacking, Women),
    ("Wang Manyu", "CHN", 2, 94, Attacking, Women),
    ("Chen Meng", "CHN", 3, 93, AllRound, Women),
    ("Wang Yidi", "CHN", 4, 91, Attacking, Women),
    ("Shin Yubin", "KOR", 5, 89, FastAttack, Women),
    ("Hina Hayata", "JPN", 6, 88, Attacking, Women),
    ("Mima Ito", "JPN", 7, 87, FastAttack, Women),
    ("Cheng I-Ching", "TPE", 8, 85, AllRound, Women),
    ("Bernadette Szocs", "ROU", 9, 83, Attacking, Women),
    ("Adriana Diaz", "PUR", 10, 82, Attacking, Women),
];

fn to_player(entry: &(&str, &str, u32, u32, PlayStyle, Gender)) -> RosterPlayer {
    let (name, country, rank, rating, style, gender) = *entry;
    RosterPlayer {
        name: name.to_string(),
        country: country.to_string(),
        rank,
        rating,
        style,
        gender,
    }
}

/// Roster sorted by rank, optionally limited to one gender
pub fn players(gender: Option<Gender>) -> Vec<RosterPlayer> {
    let mut players: Vec<RosterPlayer> = ROSTER
        .iter()
        .filter(|p| gender.is_none_or(|g| p.5 == g))
        .map(to_player)
        .collect();
    players.sort_by_key(|p| p.rank);
    players
}

/// Case-insensitive exact lookup
pub fn find(name: &str) -> Option<RosterPlayer> {
    let name = name.trim();
    ROSTER
        .iter()
        .find(|p| p.0.eq_ignore_ascii_case(name))
        .map(to_player)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_sizes() {
        assert_eq!(players(Some(Gender::Men)).len(), 15);
        assert_eq!(players(Some(Gender::Women)).len(), 10);
        assert_eq!(players(None).len(), 25);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let p = find("sun yingsha").unwrap();
        assert_eq!(p.rating, 96);
        assert_eq!(p.gender, Gender::Women);
        assert!(find("Nobody").is_none());
    }

    #[test]
    fn test_sorted_by_rank() {
        let men = players(Some(Gender::Men));
        assert!(men.windows(2).all(|w| w[0].rank <= w[1].rank));
        assert_eq!(men[0].name, "Wang Chuqin");
    }
}
