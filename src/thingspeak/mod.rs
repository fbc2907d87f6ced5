pub mod submitter;
pub mod transport;

pub use submitter::{form_fields, BackoffPolicy, SubmitOutcome, Submitter};
pub use transport::{HttpTransport, Transport};
