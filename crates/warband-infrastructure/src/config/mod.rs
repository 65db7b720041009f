mod roster;
mod settings;

pub use roster::{load_roster, parse_roster, RosterRow};
pub use settings::{load_settings, SettingsFile};
