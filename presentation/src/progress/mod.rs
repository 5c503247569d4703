//! Progress display while requests are pending

pub mod reporter;
