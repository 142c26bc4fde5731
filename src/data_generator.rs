//! Fake author data for seeding a database or the in-memory repository.

use crate::Author;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::Write;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Donald", "Edsger", "Frances", "Grace", "Hedy",
    "John", "Ken", "Leslie", "Margaret", "Niklaus", "Radia", "Sophie", "Tim", "Ursula", "Dorothy",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Liskov", "Shannon", "Ritchie", "Knuth", "Dijkstra", "Allen", "Hopper",
    "Lamarr", "O'Connor", "D'Angelo", "Thompson", "Lamport", "Hamilton", "Wirth", "Perlman",
    "Wilson", "O'Brien", "Hodgkin",
];

const FIRST_BIRTH_YEAR: i32 = 1910;

/// `count` authors with ids from 1, birth years in `1910..=2009`.
///
/// The same `seed` always yields the same authors.
pub fn generate_authors(count: usize, seed: u64) -> Vec<Author> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (1..=count as i64)
        .map(|id| {
            let first_name = pick_name(&mut rng, FIRST_NAMES);
            let last_name = pick_name(&mut rng, LAST_NAMES);
            let year_of_birth = FIRST_BIRTH_YEAR + rng.gen_range(0..100);
            Author::new(id, first_name, last_name, year_of_birth)
        })
        .collect()
}

fn pick_name<R: Rng>(rng: &mut R, names: &[&str]) -> String {
    let name = names.choose(rng).copied().unwrap_or_default();
    strip_apostrophe_prefix(name)
}

// Names like O'Connor lose the prefix so they never need quoting in the seed script.
fn strip_apostrophe_prefix(name: &str) -> String {
    name.replacen("O'", "", 1).replacen("D'", "", 1)
}

/// Render the authors as one SQL insert statement for the `author` table.
/// Ids are left to the database.
pub fn sql_insert_script(authors: &[Author]) -> String {
    let mut script =
        String::from("INSERT INTO author (first_name,last_name,year_of_birth) VALUES");
    for (idx, author) in authors.iter().enumerate() {
        if idx > 0 {
            script.push(',');
        }
        let _ = write!(
            script,
            "\n ('{}','{}',{})",
            author.first_name.replace('\'', "''"),
            author.last_name.replace('\'', "''"),
            author.year_of_birth
        );
    }
    script.push_str(";\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_authors_is_deterministic() {
        let first = generate_authors(25, 42);
        let second = generate_authors(25, 42);
        assert_eq!(first, second);
        assert_eq!(first.len(), 25);
        assert_eq!(first.first().map(|a| a.id), Some(1));
        assert_eq!(first.last().map(|a| a.id), Some(25));
    }

    #[test]
    fn generated_authors_are_in_range_and_unquoted() {
        for author in generate_authors(500, 7) {
            assert!((1910..=2009).contains(&author.year_of_birth));
            assert!(!author.first_name.contains('\''));
            assert!(!author.last_name.contains('\''));
            assert!(!author.last_name.is_empty());
        }
    }

    #[test]
    fn generate_no_authors() {
        assert!(generate_authors(0, 1).is_empty());
    }

    #[test]
    fn strip_prefixes() {
        assert_eq!(strip_apostrophe_prefix("O'Brien"), "Brien");
        assert_eq!(strip_apostrophe_prefix("D'Angelo"), "Angelo");
        assert_eq!(strip_apostrophe_prefix("Knuth"), "Knuth");
    }

    #[test]
    fn sql_insert_script_format() {
        let script = sql_insert_script(&[
            Author::new(1, "Ada", "Lovelace", 1815),
            Author::new(2, "Alan", "Turing", 1912),
        ]);
        assert_eq!(
            script,
            "INSERT INTO author (first_name,last_name,year_of_birth) VALUES\n ('Ada','Lovelace',1815),\n ('Alan','Turing',1912);\n"
        );
    }

    #[test]
    fn sql_insert_script_escapes_quotes() {
        let script = sql_insert_script(&[Author::new(1, "Miles", "O'Neil", 1950)]);
        assert!(script.contains("'O''Neil'"));
    }
}
