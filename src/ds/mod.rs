pub mod bucket;
pub mod key_counter;
pub mod slot_arena;

pub use bucket::Bucket;
#[cfg(feature = "concurrency")]
pub use key_counter::ConcurrentKeyCounter;
pub use key_counter::{BucketIter, DEFAULT_BUCKET_PREALLOC, KeyCounter};
pub use slot_arena::{SlotArena, SlotId};
