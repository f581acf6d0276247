//! IdGenerator port - キューが払い出す ID の生成
//!
//! # 実装
//! - **UlidGenerator**: 単調増加 ULID。timestamp 部分は Clock から取るので、
//!   FixedClock を渡すと同じミリ秒内の連番になります。

use std::sync::Mutex;
use std::time::SystemTime;

use ulid::{Generator, Ulid};

use crate::domain::{MessageId, ReceiptHandle};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_message_id(&self) -> MessageId;

    /// A fresh receipt for every delivery attempt.
    fn generate_receipt(&self) -> ReceiptHandle;
}

pub struct UlidGenerator<C> {
    clock: C,
    generator: Mutex<Generator>,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            generator: Mutex::new(Generator::new()),
        }
    }

    fn next_ulid(&self) -> Ulid {
        let at = SystemTime::from(self.clock.now());
        let mut generator = self.generator.lock().unwrap_or_else(|e| e.into_inner());
        // overflow only after 2^80 ids within one millisecond
        generator
            .generate_from_datetime(at)
            .unwrap_or_else(|_| Ulid::from_datetime(at))
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_message_id(&self) -> MessageId {
        self.next_ulid().into()
    }

    fn generate_receipt(&self) -> ReceiptHandle {
        self.next_ulid().into()
    }
}
