//! Local keyword/name matching resolver.
//!
//! Handles the common "show me X's schedule" requests without a network call.
//! Booking-looking text is deferred to the next resolver. Roster names and
//! aliases match as whole words, so "Madina" never matches "Adina".

use crate::intent::{Intent, IntentError, IntentResolver};
use crate::model::person::{same_person_name, Person, PersonRole, RoleFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Words that mark a request as a booking rather than a lookup.
pub const BOOKING_KEYWORDS: &[&str] = &[
    "add", "book", "set", "new", "добавь", "запиши", "поставь", "назначь",
];

/// Known people and alternative spellings used for local matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    pub teachers: Vec<String>,
    pub students: Vec<String>,
    /// Alternative spelling (any case) -> canonical roster name.
    pub aliases: BTreeMap<String, String>,
}

impl Roster {
    /// Adds stored people whose names are not already listed for their role.
    pub fn with_people(mut self, people: &[Person]) -> Self {
        for person in people {
            let names = match person.role {
                PersonRole::Teacher => &mut self.teachers,
                PersonRole::Student => &mut self.students,
            };
            if !names.iter().any(|name| same_person_name(name, &person.name)) {
                names.push(person.name.clone());
            }
        }
        self
    }

    pub fn is_teacher(&self, name: &str) -> bool {
        self.teachers
            .iter()
            .any(|teacher| same_person_name(teacher, name))
    }
}

pub struct KeywordIntentResolver {
    teachers: Vec<String>,
    students: Vec<String>,
    /// `(lowercase alias, canonical name, role)`, longest alias first.
    aliases: Vec<(String, String, RoleFilter)>,
}

impl KeywordIntentResolver {
    pub fn new(roster: &Roster) -> Self {
        let mut aliases = roster
            .aliases
            .iter()
            .filter(|(alias, _)| !alias.trim().is_empty())
            .map(|(alias, canonical)| {
                let role = if roster.is_teacher(canonical) {
                    RoleFilter::Teacher
                } else {
                    RoleFilter::Student
                };
                (alias.trim().to_lowercase(), canonical.clone(), role)
            })
            .collect::<Vec<_>>();
        aliases.sort_by(|left, right| {
            right
                .0
                .chars()
                .count()
                .cmp(&left.0.chars().count())
                .then_with(|| left.0.cmp(&right.0))
        });

        Self {
            teachers: roster.teachers.clone(),
            students: roster.students.clone(),
            aliases,
        }
    }

    fn classify(&self, text: &str) -> Option<Intent> {
        let lowered = text.to_lowercase();
        let tokens = words(&lowered);
        if looks_like_booking(&tokens) {
            return None;
        }

        let mention = |name: &str| {
            let name = name.to_lowercase();
            let needle = words(&name);
            !needle.is_empty()
                && tokens
                    .windows(needle.len())
                    .any(|window| window == needle.as_slice())
        };

        if let Some(teacher) = self.teachers.iter().find(|name| mention(name.as_str())) {
            return Some(query(teacher, RoleFilter::Teacher));
        }
        if let Some(student) = self.students.iter().find(|name| mention(name.as_str())) {
            return Some(query(student, RoleFilter::Student));
        }
        self.aliases
            .iter()
            .find(|(alias, _, _)| mention(alias.as_str()))
            .map(|(_, canonical, role)| query(canonical, *role))
    }
}

impl IntentResolver for KeywordIntentResolver {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn resolve(&self, text: &str) -> Result<Option<Intent>, IntentError> {
        Ok(self.classify(text))
    }
}

fn query(person: &str, role: RoleFilter) -> Intent {
    Intent::Query {
        person: person.to_string(),
        role,
    }
}

/// Splits on anything that is not a letter or digit.
fn words(text: &str) -> Vec<&str> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

fn looks_like_booking(words: &[&str]) -> bool {
    words.len() > 2 && words.iter().any(|word| BOOKING_KEYWORDS.contains(word))
}

#[cfg(test)]
mod tests {
    use super::{KeywordIntentResolver, Roster};
    use crate::intent::Intent;
    use crate::model::person::{Person, PersonRole, RoleFilter};
    use std::collections::BTreeMap;

    fn roster() -> Roster {
        Roster {
            teachers: vec!["Adina".to_string(), "Diana".to_string()],
            students: vec!["Diana".to_string(), "Madina".to_string()],
            aliases: BTreeMap::from([
                ("адина".to_string(), "Adina".to_string()),
                ("мадины".to_string(), "Madina".to_string()),
            ]),
        }
    }

    fn query(person: &str, role: RoleFilter) -> Option<Intent> {
        Some(Intent::Query {
            person: person.to_string(),
            role,
        })
    }

    #[test]
    fn teacher_match_takes_precedence_over_student() {
        let resolver = KeywordIntentResolver::new(&roster());
        assert_eq!(
            resolver.classify("schedule for diana"),
            query("Diana", RoleFilter::Teacher)
        );
    }

    #[test]
    fn alias_maps_to_canonical_name_and_role() {
        let resolver = KeywordIntentResolver::new(&roster());
        assert_eq!(
            resolver.classify("расписание Мадины"),
            query("Madina", RoleFilter::Student)
        );
        assert_eq!(
            resolver.classify("где Адина"),
            query("Adina", RoleFilter::Teacher)
        );
    }

    #[test]
    fn booking_text_is_deferred() {
        let resolver = KeywordIntentResolver::new(&roster());
        assert_eq!(resolver.classify("book Adina with Madina tomorrow"), None);
        assert_eq!(resolver.classify("добавь урок Адина"), None);
    }

    #[test]
    fn names_match_whole_words_only() {
        let resolver = KeywordIntentResolver::new(&roster());
        assert_eq!(
            resolver.classify("schedule for Madina"),
            query("Madina", RoleFilter::Student)
        );
        assert_eq!(resolver.classify("what about Dianara"), None);
    }

    #[test]
    fn short_keyword_text_is_still_a_query() {
        let resolver = KeywordIntentResolver::new(&roster());
        assert_eq!(
            resolver.classify("new Adina"),
            query("Adina", RoleFilter::Teacher)
        );
    }

    #[test]
    fn unknown_text_is_unresolved() {
        let resolver = KeywordIntentResolver::new(&roster());
        assert_eq!(resolver.classify("what is on today"), None);
    }

    #[test]
    fn stored_people_extend_the_roster() {
        let merged = Roster::default().with_people(&[
            Person::new("Assel", PersonRole::Teacher),
            Person::new("Karima", PersonRole::Student),
        ]);
        let resolver = KeywordIntentResolver::new(&merged);
        assert_eq!(
            resolver.classify("karima please"),
            query("Karima", RoleFilter::Student)
        );
    }

    #[test]
    fn stored_people_merge_ignoring_cyrillic_case() {
        let configured = Roster {
            teachers: vec!["Адина".to_string()],
            ..Roster::default()
        };
        let merged = configured.with_people(&[
            Person::new("адина", PersonRole::Teacher),
            Person::new("адина", PersonRole::Student),
        ]);

        assert_eq!(merged.teachers, vec!["Адина"]);
        assert_eq!(merged.students, vec!["адина"]);
        assert!(merged.is_teacher("АДИНА"));
    }
}
