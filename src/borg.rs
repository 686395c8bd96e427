use crate::error::BorgError;
use crate::shared_state::SharedState;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Key of the attribute every handle exposes through `state()` and `Display`.
pub const STATE_KEY: &str = "state";

/// Seeded into a family by its first default construction.
pub const DEFAULT_STATE: &str = "Init";

/// A handle with its own identity and a borrowed attribute namespace.
///
/// Two handles of one family are never the same instance, yet they always
/// report the same attributes: a write through either one is a write to the
/// family's [`SharedState`].
///
/// Not `Clone` on purpose: a copy would share the identity too.
#[derive(Debug)]
pub struct Borg {
    id: Uuid,
    shared: SharedState,
}

impl Borg {
    /// Joins the process-wide family. See [`Borg::in_family`].
    pub fn new(initial: Option<&str>) -> Self {
        Self::in_family(SharedState::global(), initial)
    }

    /// Joins `family`.
    ///
    /// A non-empty `initial` overwrites the family's state for every member.
    /// Otherwise the state is seeded with [`DEFAULT_STATE`] only if nobody has
    /// set it yet, so later default constructions never reset it.
    pub fn in_family(family: &SharedState, initial: Option<&str>) -> Self {
        let borg = Self {
            id: Uuid::new_v4(),
            shared: family.clone(),
        };

        match initial.filter(|state| !state.is_empty()) {
            Some(state) => {
                borg.shared.set(STATE_KEY, state);
            }
            None => {
                borg.shared.set_default(STATE_KEY, DEFAULT_STATE);
            }
        }

        borg
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> String {
        match self.shared.get(STATE_KEY) {
            Ok(Value::String(state)) => state,
            Ok(other) => other.to_string(),
            // Construction always seeds the key; only an explicit remove gets here.
            Err(_) => String::new(),
        }
    }

    pub fn set_state(&self, state: impl Into<String>) {
        self.shared.set(STATE_KEY, state.into());
    }

    pub fn get_attr(&self, name: &str) -> Result<Value, BorgError> {
        self.shared.get(name)
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.shared.set(name, value);
    }

    /// Identity, not equality: `false` for any two separate constructions.
    pub fn is(&self, other: &Borg) -> bool {
        self.id == other.id
    }

    pub fn shares_state_with(&self, other: &Borg) -> bool {
        self.shared.same_family(&other.shared)
    }

    pub fn shared_state(&self) -> &SharedState {
        &self.shared
    }
}

impl fmt::Display for Borg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_default_construction_seeds_init() {
        let family = SharedState::new();
        let rm1 = Borg::in_family(&family, None);
        assert_eq!(rm1.state(), DEFAULT_STATE);
        assert_eq!(family.get(STATE_KEY).unwrap(), json!("Init"));
    }

    #[test]
    fn test_write_through_one_handle_seen_by_another() {
        let family = SharedState::new();
        let rm1 = Borg::in_family(&family, None);
        let rm2 = Borg::in_family(&family, None);

        rm1.set_state("Idle");
        assert_eq!(rm2.state(), "Idle");

        rm2.set_state("Running");
        assert_eq!(rm1.to_string(), "Running");
        assert_eq!(rm2.to_string(), "Running");
    }

    #[test]
    fn test_default_construction_does_not_reset() {
        let family = SharedState::new();
        let rm1 = Borg::in_family(&family, None);
        rm1.set_state("Zombie");

        let rm3 = Borg::in_family(&family, None);
        assert_eq!(rm3.state(), "Zombie");
        assert_eq!(rm1.state(), "Zombie");
    }

    #[test]
    fn test_explicit_initial_overwrites_for_everyone() {
        let family = SharedState::new();
        let rm3 = Borg::in_family(&family, None);
        rm3.set_state("Zombie");

        let rm4 = Borg::in_family(&family, Some("Running"));
        assert_eq!(rm4.state(), "Running");
        assert_eq!(rm3.state(), "Running");
    }

    #[test]
    fn test_empty_initial_counts_as_absent() {
        let family = SharedState::new();
        let first = Borg::in_family(&family, Some(""));
        assert_eq!(first.state(), DEFAULT_STATE);

        first.set_state("Idle");
        let second = Borg::in_family(&family, Some(""));
        assert_eq!(second.state(), "Idle");
    }

    #[test]
    fn test_identity_is_per_construction() {
        let family = SharedState::new();
        let rm1 = Borg::in_family(&family, None);
        let rm2 = Borg::in_family(&family, None);

        assert!(rm1.is(&rm1));
        assert!(!rm1.is(&rm2));
        assert_ne!(rm1.id(), rm2.id());
        assert_eq!(rm1.to_string(), rm2.to_string());
        assert!(rm1.shares_state_with(&rm2));
    }

    #[test]
    fn test_families_are_isolated() {
        let left = Borg::in_family(&SharedState::new(), Some("Idle"));
        let right = Borg::in_family(&SharedState::new(), None);

        left.set_state("Running");
        assert_eq!(right.state(), DEFAULT_STATE);
        assert!(!left.shares_state_with(&right));
    }

    #[test]
    fn test_arbitrary_attributes_are_shared() {
        let family = SharedState::new();
        let rm1 = Borg::in_family(&family, None);
        let rm2 = Borg::in_family(&family, None);

        assert_eq!(
            rm2.get_attr("pid"),
            Err(BorgError::attribute_not_found("pid"))
        );

        rm1.set_attr("pid", 4242);
        assert_eq!(rm2.get_attr("pid").unwrap(), json!(4242));
        assert!(rm2.shared_state().same_family(&family));
    }

    #[test]
    fn test_handles_on_other_threads() {
        let family = SharedState::new();
        let observer = Borg::in_family(&family, None);

        let writers: Vec<_> = ["Idle", "Running", "Zombie"]
            .into_iter()
            .map(|state| {
                let family = family.clone();
                std::thread::spawn(move || {
                    let borg = Borg::in_family(&family, None);
                    borg.set_state(state);
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert!(["Idle", "Running", "Zombie"].contains(&observer.state().as_str()));
        assert_eq!(family.len(), 1);
    }

    #[test]
    fn test_non_string_state_is_rendered() {
        let family = SharedState::new();
        let rm1 = Borg::in_family(&family, None);
        rm1.set_attr(STATE_KEY, 7);
        assert_eq!(rm1.to_string(), "7");

        family.remove(STATE_KEY);
        assert_eq!(rm1.state(), "");
    }
}
