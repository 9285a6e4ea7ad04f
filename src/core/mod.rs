// Domain-layer modules and shared errors/models
pub mod services {
    pub use crate::services::*;
}

pub mod lead_parser {
    pub use crate::lead_parser::*;
}

pub mod rate_limit {
    pub use crate::rate_limit::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
