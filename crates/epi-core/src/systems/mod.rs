//! ECS Systems
//!
//! Daily systems for disease progression, transmission, vaccination, and
//! quarantine, plus the pure helpers they are built from.

pub mod contacts;
pub mod immunity;
pub mod intervention;
pub mod progression;
pub mod transmission;
pub mod vaccination;

// Re-export commonly used systems
pub use contacts::{daily_contacts, DailyContacts};
pub use immunity::{protection_after_recovery, transition_to_recovered, update_post_recovery_immunity};
pub use intervention::{apply_self_quarantine, release_quarantine};
pub use progression::{advance_disease, draw_disease_course, infect_person, next_state, severe_reduction};
pub use transmission::{
    contact_probability, layer_multiplier, severity_factor, susceptibility, transmit_infections, FrozenAgent,
    TransmissionLog,
};
pub use vaccination::{
    administer_dose, administer_vaccines, refresh_protection, update_vaccine_protection, vaccine_decay,
    vaccine_protection,
};
