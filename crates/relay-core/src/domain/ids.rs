//! Queue identifiers.
//!
//! # ULID + Phantom type
//! キューが払い出す 2 種類の識別子を、同じ `Id<K>` の別インスタンスとして表します。
//!
//! - **MessageId**: メッセージ本体の ID（再配送されても変わらない）
//! - **ReceiptHandle**: 配送ごとに払い出される受領トークン（再配送で変わる）
//!
//! 型を分けることで「メッセージ ID で delete する」取り違えはコンパイルエラーになります。
//! 文字列表現は `<prefix><ulid>`（例: `msg-01HV...`）で、`FromStr` で読み戻せます。

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// Compile-time tag for an `Id` kind.
pub trait IdKind: Send + Sync + 'static {
    const PREFIX: &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<K: IdKind> {
    ulid: Ulid,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K: IdKind> Id<K> {
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            kind: PhantomData,
        }
    }

    pub const fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<K: IdKind> From<Ulid> for Id<K> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<K: IdKind> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(K::PREFIX)?;
        fmt::Display::fmt(&self.ulid, f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("expected prefix '{expected}' in '{input}'")]
    Prefix { expected: &'static str, input: String },

    #[error("invalid ulid in '{input}': {reason}")]
    Ulid { input: String, reason: String },
}

impl<K: IdKind> FromStr for Id<K> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(K::PREFIX).ok_or_else(|| ParseIdError::Prefix {
            expected: K::PREFIX,
            input: s.to_string(),
        })?;
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|e| ParseIdError::Ulid {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {}

impl IdKind for Message {
    const PREFIX: &'static str = "msg-";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Receipt {}

impl IdKind for Receipt {
    const PREFIX: &'static str = "rcpt-";
}

/// Identifier of a queued message (stable across redeliveries).
pub type MessageId = Id<Message>;

/// Token that acknowledges one specific delivery of a message.
pub type ReceiptHandle = Id<Receipt>;
