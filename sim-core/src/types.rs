/// Identifier for a person in a [`crate::population::Population`].
///
/// Ids are assigned `1..=N` in creation order and never reused within a run.
/// This is distinct from the person's index into `Population::people`,
/// which is always `id - 1` for a seeded population.
pub type PersonId = u32;

/// One discrete simulation step.
pub type Tick = u64;
