//! Terminal presentation: layout, drawing, keys and strings.

mod keys;
mod locale;
pub mod preview;
mod terminal;
mod view;

pub use keys::{handle_key_event, UiAction};
pub use locale::{Locale, Messages};
pub use terminal::TerminalGuard;
pub use view::{draw, layout, Line, Tone, ViewOptions};
