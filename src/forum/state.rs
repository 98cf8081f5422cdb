//! Per-field validation state for the remotely checked registration fields.
//!
//! Each check takes a [`Ticket`] when it starts and settles with it when the
//! reply arrives. Starting a new check (or editing the field) bumps the field's
//! generation, so a reply that belongs to an older check is discarded instead of
//! overwriting the newer result.

use super::error::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validity {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldState {
    pub validity: Validity,
    pub checking: bool,
    generation: u64,
}

/// Proof that a check was started for `field` at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    field: Field,
    generation: u64,
}

impl Ticket {
    #[must_use]
    pub fn field(&self) -> Field {
        self.field
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationBoard {
    username: FieldState,
    email: FieldState,
    code: FieldState,
}

impl ValidationBoard {
    /// Fields that must be `Valid` before registration is submitted, in check order.
    pub const TRACKED: [Field; 3] = [Field::VerificationCode, Field::Username, Field::Email];

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: Field) -> Option<&FieldState> {
        match field {
            Field::Username => Some(&self.username),
            Field::Email => Some(&self.email),
            Field::VerificationCode => Some(&self.code),
            _ => None,
        }
    }

    fn slot_mut(&mut self, field: Field) -> Option<&mut FieldState> {
        match field {
            Field::Username => Some(&mut self.username),
            Field::Email => Some(&mut self.email),
            Field::VerificationCode => Some(&mut self.code),
            _ => None,
        }
    }

    /// State of a tracked field; untracked fields always read as `Unknown`.
    #[must_use]
    pub fn get(&self, field: Field) -> FieldState {
        self.slot(field).copied().unwrap_or_default()
    }

    /// Marks a check as started and returns its ticket.
    pub fn begin(&mut self, field: Field) -> Ticket {
        let generation = match self.slot_mut(field) {
            Some(state) => {
                state.generation += 1;
                state.checking = true;
                state.generation
            }
            None => 0,
        };
        Ticket { field, generation }
    }

    /// Records the outcome of a check. Returns `false` and leaves the state
    /// untouched when a newer check or an edit superseded this ticket.
    pub fn settle(&mut self, ticket: Ticket, validity: Validity) -> bool {
        match self.slot_mut(ticket.field) {
            Some(state) if state.generation == ticket.generation => {
                state.validity = validity;
                state.checking = false;
                true
            }
            _ => false,
        }
    }

    /// Forgets the result of a field after the user edits it.
    pub fn reset(&mut self, field: Field) {
        if let Some(state) = self.slot_mut(field) {
            state.generation += 1;
            state.validity = Validity::Unknown;
            state.checking = false;
        }
    }

    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.first_not_valid().is_none()
    }

    /// First tracked field, in check order, whose state is not `Valid`.
    #[must_use]
    pub fn first_not_valid(&self) -> Option<Field> {
        Self::TRACKED
            .into_iter()
            .find(|field| self.get(*field).validity != Validity::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_is_unknown_and_gated() {
        let board = ValidationBoard::new();
        for field in ValidationBoard::TRACKED {
            assert_eq!(board.get(field), FieldState::default());
        }
        assert!(!board.all_valid());
        assert_eq!(board.first_not_valid(), Some(Field::VerificationCode));
    }

    #[test]
    fn begin_marks_checking_and_settle_clears_it() {
        let mut board = ValidationBoard::new();
        let ticket = board.begin(Field::Username);
        assert!(board.get(Field::Username).checking);

        assert!(board.settle(ticket, Validity::Valid));
        let state = board.get(Field::Username);
        assert!(!state.checking);
        assert_eq!(state.validity, Validity::Valid);
    }

    #[test]
    fn stale_reply_does_not_overwrite_newer_check() {
        let mut board = ValidationBoard::new();
        let first = board.begin(Field::Email);
        let second = board.begin(Field::Email);

        assert!(board.settle(second, Validity::Valid));
        assert!(!board.settle(first, Validity::Invalid));
        assert_eq!(board.get(Field::Email).validity, Validity::Valid);
    }

    #[test]
    fn edit_discards_in_flight_result() {
        let mut board = ValidationBoard::new();
        let ticket = board.begin(Field::Username);
        board.reset(Field::Username);

        assert!(!board.settle(ticket, Validity::Valid));
        assert_eq!(board.get(Field::Username).validity, Validity::Unknown);
    }

    #[test]
    fn all_valid_requires_every_tracked_field() {
        let mut board = ValidationBoard::new();
        for field in [Field::VerificationCode, Field::Username] {
            let ticket = board.begin(field);
            board.settle(ticket, Validity::Valid);
        }
        assert_eq!(board.first_not_valid(), Some(Field::Email));

        let ticket = board.begin(Field::Email);
        board.settle(ticket, Validity::Valid);
        assert!(board.all_valid());
    }

    #[test]
    fn untracked_fields_are_ignored() {
        let mut board = ValidationBoard::new();
        let ticket = board.begin(Field::Password);
        assert!(!board.settle(ticket, Validity::Valid));
        assert_eq!(board.get(Field::Password).validity, Validity::Unknown);
    }
}
