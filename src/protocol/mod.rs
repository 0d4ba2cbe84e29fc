//! Request/response envelope for the quorum protocol
//!
//! Message kinds are a tagged union with stable one-byte discriminants;
//! dispatch is a `match` on [`Request`]/[`Response`], and each request kind
//! pairs with exactly one response kind. Keys and values are opaque byte
//! sequences.

pub mod codec;

use crate::common::{Error, Result};
use bytes::Bytes;

/// Wire discriminant for get requests
pub const GET_REQUEST: u8 = 0x01;
/// Wire discriminant for put requests
pub const PUT_REQUEST: u8 = 0x02;
/// Response discriminants are the request discriminant with the high bit set
pub const GET_RESPONSE: u8 = GET_REQUEST | 0x80;
pub const PUT_RESPONSE: u8 = PUT_REQUEST | 0x80;

/// Replication parameters for a single request: N replicas, R read acks,
/// W write acks.
///
/// Immutable once constructed; invalid combinations are rejected at
/// construction time, never at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationSpec {
    n: u8,
    r: u8,
    w: u8,
}

impl ReplicationSpec {
    /// Validate and construct a replication spec.
    ///
    /// Requires `1 <= r <= n` and `1 <= w <= n`.
    pub fn new(n: u8, r: u8, w: u8) -> Result<Self> {
        let fail = |reason: &str| Error::InvalidReplicationSpec {
            n,
            r,
            w,
            reason: reason.to_string(),
        };

        if n == 0 {
            return Err(fail("n must be at least 1"));
        }
        if r == 0 || r > n {
            return Err(fail("r must satisfy 1 <= r <= n"));
        }
        if w == 0 || w > n {
            return Err(fail("w must satisfy 1 <= w <= n"));
        }
        Ok(Self { n, r, w })
    }

    pub fn n(&self) -> u8 {
        self.n
    }

    pub fn r(&self) -> u8 {
        self.r
    }

    pub fn w(&self) -> u8 {
        self.w
    }
}

impl Default for ReplicationSpec {
    /// N=3, R=2, W=2
    fn default() -> Self {
        Self { n: 3, r: 2, w: 2 }
    }
}

/// A value as stored on one replica, paired with its version.
///
/// `value: None` with a non-zero version is a tombstone (an observed
/// delete); version 0 means the replica has never stored the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: Option<Bytes>,
    pub version: u64,
}

impl Versioned {
    /// The state of a replica that has never seen the key.
    pub fn missing() -> Self {
        Self {
            value: None,
            version: 0,
        }
    }

    pub fn value(value: impl Into<Bytes>, version: u64) -> Self {
        Self {
            value: Some(value.into()),
            version,
        }
    }

    pub fn tombstone(version: u64) -> Self {
        Self {
            value: None,
            version,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none() && self.version > 0
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none() && self.version == 0
    }

    /// Total order used by both the reconciler and replica-side apply:
    /// version first, then raw value bytes (a tombstone loses to an
    /// equal-version value). Deterministic, independent of arrival order.
    pub fn cmp_priority(&self, other: &Self) -> std::cmp::Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.value.as_deref().cmp(&other.value.as_deref()))
    }
}

/// Read request: key plus replication parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub key: Bytes,
    pub spec: ReplicationSpec,
}

impl GetRequest {
    /// Construct with default replication (N=3, R=2, W=2).
    pub fn new(key: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            spec: ReplicationSpec::default(),
        }
    }

    /// Replace the replication spec (consuming builder; the request stays
    /// immutable once shared).
    pub fn with_spec(mut self, spec: ReplicationSpec) -> Self {
        self.spec = spec;
        self
    }
}

/// Read response: the replica's current record for the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResponse {
    pub value: Option<Bytes>,
    pub version: u64,
}

impl GetResponse {
    pub fn versioned(&self) -> Versioned {
        Versioned {
            value: self.value.clone(),
            version: self.version,
        }
    }
}

impl From<Versioned> for GetResponse {
    fn from(v: Versioned) -> Self {
        Self {
            value: v.value,
            version: v.version,
        }
    }
}

/// Write request: key, value (`None` writes a tombstone), coordinator-assigned
/// version, replication parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub key: Bytes,
    pub value: Option<Bytes>,
    pub version: u64,
    pub spec: ReplicationSpec,
}

impl PutRequest {
    pub fn new(key: impl Into<Bytes>, value: Option<Bytes>, version: u64) -> Self {
        Self {
            key: key.into(),
            value,
            version,
            spec: ReplicationSpec::default(),
        }
    }

    pub fn with_spec(mut self, spec: ReplicationSpec) -> Self {
        self.spec = spec;
        self
    }
}

/// Write acknowledgement.
///
/// `applied` is false when the replica already held a newer record; the
/// write still counts as an acknowledgement for quorum purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResponse {
    pub version: u64,
    pub applied: bool,
}

/// All request kinds, keyed by discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(GetRequest),
    Put(PutRequest),
}

impl Request {
    pub fn discriminant(&self) -> u8 {
        match self {
            Request::Get(_) => GET_REQUEST,
            Request::Put(_) => PUT_REQUEST,
        }
    }

    /// Discriminant of the response kind this request expects.
    pub fn response_discriminant(&self) -> u8 {
        self.discriminant() | 0x80
    }
}

/// All response kinds, keyed by discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Get(GetResponse),
    Put(PutResponse),
}

impl Response {
    pub fn discriminant(&self) -> u8 {
        match self {
            Response::Get(_) => GET_RESPONSE,
            Response::Put(_) => PUT_RESPONSE,
        }
    }

    /// Does this response answer the given request?
    pub fn answers(&self, request: &Request) -> bool {
        self.discriminant() == request.response_discriminant()
    }
}
