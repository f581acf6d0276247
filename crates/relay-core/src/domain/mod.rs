//! Domain model (IDs, envelopes, references, states, outcomes, errors).

pub mod envelope;
pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod reference;
pub mod state;

pub use self::envelope::DeliveryEnvelope;
pub use self::errors::{ErrorKind, PipelineError};
pub use self::events::{CompletionEvent, DEFAULT_SUBJECT};
pub use self::ids::{MessageId, ParseIdError, ReceiptHandle};
pub use self::outcome::{BatchSummary, MessageOutcome};
pub use self::reference::{Blob, ContentType, StorageReference, TransformedBlob};
pub use self::state::{Disposition, MessageState};
