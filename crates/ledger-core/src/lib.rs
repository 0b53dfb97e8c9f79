//! Core of a single-node proof-of-work ledger: blocks, mining, the height-indexed
//! ledger and its canonical JSON snapshot format.

pub mod block;
pub mod clock;
pub mod codec;
pub mod constants;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod mine;

pub use block::Block;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CodecError, MineError, RejectionReason};
pub use ledger::{Ledger, LedgerConfig, RejectedBlock, RestoreReport};
pub use mine::{ensure_reachable, mine_parallel, CancelToken, NonceSearch, SearchStatus};
