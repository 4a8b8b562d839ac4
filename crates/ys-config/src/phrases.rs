/// Search phrases collected when the config file does not override them.
pub const DEFAULT_SEARCH_PHRASES: &[&str] = &[
    "Beethoven Symphony",
    "Handel Messiah",
    "Mozart Requiem",
    "Mozart Coronation Mass",
    "Bach St Matthew Passion",
    "Bach St John Passion",
    "Brahms A German Requiem",
    "Haydn The Creation",
    "Haydn The Seasons",
    "Faure Requiem",
    "Faure Cantique de Jean Racine",
    "Vivaldi Gloria",
    "Bach Magnificat",
    "Mendelssohn Elijah",
    "Schubert Mass",
    "Beethoven Missa Solemnis",
    "Mozart Ave Verum",
];

pub fn default_search_phrases() -> Vec<String> {
    DEFAULT_SEARCH_PHRASES
        .iter()
        .map(|phrase| phrase.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_phrases_are_unique() {
        let phrases = default_search_phrases();
        let unique: HashSet<_> = phrases.iter().collect();
        assert_eq!(phrases.len(), 17);
        assert_eq!(unique.len(), phrases.len());
    }
}
