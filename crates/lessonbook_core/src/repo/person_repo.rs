//! Person repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Names are normalized before lookup and insert.
//! - Lookup is exact within a role on the lower-cased `name_key`, so
//!   "Адина" and "адина" are one person.

use crate::model::person::{normalize_person_name, person_name_key, Person, PersonRole};
use crate::repo::lesson_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub trait PersonRepository {
    fn find_person(&self, name: &str, role: PersonRole) -> RepoResult<Option<Person>>;
    /// Returns the existing person for `(role, name)` or inserts a new one.
    fn ensure_person(&self, name: &str, role: PersonRole) -> RepoResult<Person>;
    fn list_people(&self, role: Option<PersonRole>) -> RepoResult<Vec<Person>>;
}

pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn find_person(&self, name: &str, role: PersonRole) -> RepoResult<Option<Person>> {
        let Some(key) = person_name_key(name) else {
            return Ok(None);
        };

        let person = self
            .conn
            .query_row(
                "SELECT uuid, name, role
                 FROM people
                 WHERE role = ?1 AND name_key = ?2;",
                params![role.as_str(), key],
                |row| Ok(parse_person_row(row)),
            )
            .optional()?;

        person.transpose()
    }

    fn ensure_person(&self, name: &str, role: PersonRole) -> RepoResult<Person> {
        let normalized =
            normalize_person_name(name).ok_or_else(|| RepoError::InvalidPersonName(name.into()))?;
        if let Some(existing) = self.find_person(&normalized, role)? {
            return Ok(existing);
        }

        let key = normalized.to_lowercase();
        let person = Person::new(normalized, role);
        self.conn.execute(
            "INSERT INTO people (uuid, name, name_key, role) VALUES (?1, ?2, ?3, ?4);",
            params![person.id.to_string(), person.name.as_str(), key, role.as_str()],
        )?;
        Ok(person)
    }

    fn list_people(&self, role: Option<PersonRole>) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, role
             FROM people
             WHERE ?1 IS NULL OR role = ?1
             ORDER BY role ASC, name_key ASC;",
        )?;
        let mut rows = stmt.query([role.map(PersonRole::as_str)])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in people.uuid"))
    })?;
    let role_text: String = row.get("role")?;
    let role = PersonRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in people.role"))
    })?;

    Ok(Person {
        id,
        name: row.get("name")?,
        role,
    })
}
