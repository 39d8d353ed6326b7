//! Generated object names.
//!
//! The editor synthesizes names for objects the user did not name: primary
//! key constraints (`PK_<table>`), NOT NULL check constraints
//! (`CK_IS_NOT_NULL_<table>_<column>`), anonymous foreign keys and the
//! managed indexes that back them. Suffixed names carry 16 lowercase hex
//! digits drawn from a [`SuffixSource`] so tests can pin the draw while
//! production uses OS-seeded randomness. Draws that collide with an existing
//! name are retried with a fresh suffix.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the 64-bit values rendered as name suffixes.
pub trait SuffixSource: Send {
    fn next_suffix(&mut self) -> u64;
}

/// OS-seeded random suffixes, the production source.
pub struct RandomSuffixSource {
    rng: StdRng,
}

impl RandomSuffixSource {
    pub fn new() -> Self {
        RandomSuffixSource {
            rng: StdRng::from_os_rng(),
        }
    }

    /// A reproducible source for tests and tooling.
    pub fn seeded(seed: u64) -> Self {
        RandomSuffixSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSuffixSource {
    fn default() -> Self {
        RandomSuffixSource::new()
    }
}

impl SuffixSource for RandomSuffixSource {
    fn next_suffix(&mut self) -> u64 {
        self.rng.random()
    }
}

/// Counting source producing `0, 1, 2, ...`; fully deterministic.
#[derive(Default)]
pub struct SequentialSuffixSource {
    next: u64,
}

impl SequentialSuffixSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u64) -> Self {
        SequentialSuffixSource { next }
    }
}

impl SuffixSource for SequentialSuffixSource {
    fn next_suffix(&mut self) -> u64 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}

/// Name of the implicit primary key constraint of `table`.
pub fn primary_key_name(table: &str) -> String {
    format!("PK_{table}")
}

/// Name of the synthesized NOT NULL check constraint for `column` of `table`.
pub fn not_null_check_name(table: &str, column: &str) -> String {
    format!("CK_IS_NOT_NULL_{table}_{column}")
}

/// Generates suffixed names for managed indexes and anonymous foreign keys.
pub struct NameGenerator {
    source: Box<dyn SuffixSource>,
}

impl NameGenerator {
    pub fn new(source: Box<dyn SuffixSource>) -> Self {
        NameGenerator { source }
    }

    pub fn random() -> Self {
        NameGenerator::new(Box::new(RandomSuffixSource::new()))
    }

    /// Name for a managed index backing a foreign key:
    /// `IDX_<table>_<col1>_..._<U|N>_<16 hex>`. `U` marks the unique index on
    /// the referenced side, `N` the non-unique index on the referencing side.
    /// `taken` reports whether a candidate collides; collisions redraw.
    pub fn managed_index_name(
        &mut self,
        table: &str,
        columns: &[String],
        unique: bool,
        mut taken: impl FnMut(&str) -> bool,
    ) -> String {
        let marker = if unique { "U" } else { "N" };
        let columns = columns.join("_");
        loop {
            let suffix = self.source.next_suffix();
            let name = format!("IDX_{table}_{columns}_{marker}_{suffix:016x}");
            if !taken(&name) {
                return name;
            }
        }
    }

    /// Name for an anonymous foreign key:
    /// `FK_<referencing table>_<referenced table>_<16 hex>`.
    pub fn foreign_key_name(
        &mut self,
        table: &str,
        referenced_table: &str,
        mut taken: impl FnMut(&str) -> bool,
    ) -> String {
        loop {
            let suffix = self.source.next_suffix();
            let name = format!("FK_{table}_{referenced_table}_{suffix:016x}");
            if !taken(&name) {
                return name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_names_have_expected_shape() {
        assert_eq!(primary_key_name("Users"), "PK_Users");
        assert_eq!(
            not_null_check_name("Users", "Email"),
            "CK_IS_NOT_NULL_Users_Email"
        );
    }

    #[test]
    fn managed_index_names_are_deterministic_with_a_pinned_source() {
        let mut names = NameGenerator::new(Box::new(SequentialSuffixSource::new()));
        let cols = vec!["A".to_string(), "B".to_string()];
        let name = names.managed_index_name("T", &cols, true, |_| false);
        assert_eq!(name, "IDX_T_A_B_U_0000000000000000");
        let name = names.managed_index_name("T", &cols, false, |_| false);
        assert_eq!(name, "IDX_T_A_B_N_0000000000000001");
    }

    #[test]
    fn collisions_redraw_the_suffix() {
        let mut names = NameGenerator::new(Box::new(SequentialSuffixSource::new()));
        let cols = vec!["A".to_string()];
        let name = names.managed_index_name("T", &cols, true, |candidate| {
            candidate.ends_with("0000000000000000")
        });
        assert_eq!(name, "IDX_T_A_U_0000000000000001");
    }

    #[test]
    fn random_source_produces_sixteen_hex_digits() {
        let mut names = NameGenerator::random();
        let name = names.foreign_key_name("Child", "Parent", |_| false);
        let suffix = name.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(name.starts_with("FK_Child_Parent_"));
    }
}
