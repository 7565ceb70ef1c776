use crate::error::{validation_error, DeskResult};

pub mod scheduler;
pub mod time;

/// Reject ids that could not have been assigned by a store
pub fn validate_id(kind: &str, id: &str) -> DeskResult<()> {
    let well_formed = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(validation_error(&format!("Invalid {} id: '{}'", kind, id)))
    }
}
