//! External service integrations.

pub mod search_client {
    pub use crate::search_client::*;
}

pub mod gemini_client {
    pub use crate::gemini_client::*;
}

pub mod html_text {
    pub use crate::html_text::*;
}
