//! Tag-length-value wire codec for the request/response envelope
//!
//! Frame layout: one discriminant byte, then zero or more fields of
//! `(tag: u8, len: u32 LE, payload)`. Readers skip tags they do not know,
//! so new fields can be added without breaking old peers. The actual
//! transport framing (length prefixes, connection handling) lives outside
//! this crate.

use crate::common::{Error, Result};
use crate::protocol::{
    GetRequest, GetResponse, PutRequest, PutResponse, ReplicationSpec, Request, Response,
    GET_REQUEST, GET_RESPONSE, PUT_REQUEST, PUT_RESPONSE,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};

// Field tags shared by both request kinds (the first four match the
// original wire contract).
const TAG_N: u8 = 1;
const TAG_R: u8 = 2;
const TAG_W: u8 = 3;
const TAG_KEY: u8 = 4;
const TAG_VERSION: u8 = 5;
const TAG_VALUE: u8 = 6;

// Response field tags.
const TAG_RESP_VERSION: u8 = 1;
const TAG_RESP_VALUE: u8 = 2;
const TAG_RESP_APPLIED: u8 = 2;

/// Encode a request frame. Fails when a field payload exceeds the u32
/// length the frame format can carry.
pub fn encode_request(request: &Request) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    buf.put_u8(request.discriminant());

    match request {
        Request::Get(get) => {
            put_spec(&mut buf, &get.spec)?;
            put_field(&mut buf, TAG_KEY, &get.key)?;
        }
        Request::Put(put) => {
            put_spec(&mut buf, &put.spec)?;
            put_field(&mut buf, TAG_KEY, &put.key)?;
            put_u64_field(&mut buf, TAG_VERSION, put.version)?;
            if let Some(value) = &put.value {
                put_field(&mut buf, TAG_VALUE, value)?;
            }
        }
    }

    Ok(buf.freeze())
}

/// Decode a request frame. Dispatch is a match on the discriminant byte.
pub fn decode_request(frame: &[u8]) -> Result<Request> {
    let (discriminant, fields) = split_frame(frame)?;
    match discriminant {
        GET_REQUEST => {
            let fields = parse_fields(fields)?;
            Ok(Request::Get(GetRequest {
                key: fields.require_key()?,
                spec: fields.spec()?,
            }))
        }
        PUT_REQUEST => {
            let fields = parse_fields(fields)?;
            Ok(Request::Put(PutRequest {
                key: fields.require_key()?,
                value: fields.bytes(TAG_VALUE),
                version: fields.require_u64(TAG_VERSION)?,
                spec: fields.spec()?,
            }))
        }
        other => Err(Error::UnknownDiscriminant(other)),
    }
}

/// Encode a response frame.
pub fn encode_response(response: &Response) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    buf.put_u8(response.discriminant());

    match response {
        Response::Get(get) => {
            put_u64_field(&mut buf, TAG_RESP_VERSION, get.version)?;
            if let Some(value) = &get.value {
                put_field(&mut buf, TAG_RESP_VALUE, value)?;
            }
        }
        Response::Put(put) => {
            put_u64_field(&mut buf, TAG_RESP_VERSION, put.version)?;
            put_field(&mut buf, TAG_RESP_APPLIED, &[put.applied as u8])?;
        }
    }

    Ok(buf.freeze())
}

/// Decode a response frame.
pub fn decode_response(frame: &[u8]) -> Result<Response> {
    let (discriminant, fields) = split_frame(frame)?;
    match discriminant {
        GET_RESPONSE => {
            let fields = parse_fields(fields)?;
            Ok(Response::Get(GetResponse {
                value: fields.bytes(TAG_RESP_VALUE),
                version: fields.require_u64(TAG_RESP_VERSION)?,
            }))
        }
        PUT_RESPONSE => {
            let fields = parse_fields(fields)?;
            let applied = fields
                .bytes(TAG_RESP_APPLIED)
                .map(|b| !b.is_empty() && b[0] != 0)
                .unwrap_or(false);
            Ok(Response::Put(PutResponse {
                version: fields.require_u64(TAG_RESP_VERSION)?,
                applied,
            }))
        }
        other => Err(Error::UnknownDiscriminant(other)),
    }
}

fn split_frame(frame: &[u8]) -> Result<(u8, &[u8])> {
    match frame.split_first() {
        Some((discriminant, rest)) => Ok((*discriminant, rest)),
        None => Err(Error::MalformedFrame("empty frame".into())),
    }
}

fn put_field(buf: &mut BytesMut, tag: u8, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        Error::MalformedFrame(format!(
            "field tag {} payload of {} bytes exceeds the u32 frame limit",
            tag,
            payload.len()
        ))
    })?;
    buf.put_u8(tag);
    buf.put_u32_le(len);
    buf.put_slice(payload);
    Ok(())
}

fn put_u64_field(buf: &mut BytesMut, tag: u8, value: u64) -> Result<()> {
    put_field(buf, tag, &value.to_le_bytes())
}

fn put_spec(buf: &mut BytesMut, spec: &ReplicationSpec) -> Result<()> {
    put_field(buf, TAG_N, &[spec.n()])?;
    put_field(buf, TAG_R, &[spec.r()])?;
    put_field(buf, TAG_W, &[spec.w()])
}

/// Fields of one frame, keyed by tag. Unknown tags were already skipped.
struct Fields {
    entries: Vec<(u8, Bytes)>,
}

impl Fields {
    fn bytes(&self, tag: u8) -> Option<Bytes> {
        self.entries
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, payload)| payload.clone())
    }

    fn require_bytes(&self, tag: u8) -> Result<Bytes> {
        self.bytes(tag)
            .ok_or_else(|| Error::MalformedFrame(format!("missing field tag {}", tag)))
    }

    fn require_key(&self) -> Result<Bytes> {
        let key = self.require_bytes(TAG_KEY)?;
        if key.is_empty() {
            return Err(Error::MalformedFrame("empty key".into()));
        }
        Ok(key)
    }

    fn require_u64(&self, tag: u8) -> Result<u64> {
        let payload = self.require_bytes(tag)?;
        let raw: [u8; 8] = payload
            .as_ref()
            .try_into()
            .map_err(|_| Error::MalformedFrame(format!("field tag {} is not a u64", tag)))?;
        Ok(u64::from_le_bytes(raw))
    }

    fn u8_field(&self, tag: u8) -> Result<u8> {
        let payload = self.require_bytes(tag)?;
        if payload.len() != 1 {
            return Err(Error::MalformedFrame(format!(
                "field tag {} is not a single byte",
                tag
            )));
        }
        Ok(payload[0])
    }

    fn spec(&self) -> Result<ReplicationSpec> {
        ReplicationSpec::new(
            self.u8_field(TAG_N)?,
            self.u8_field(TAG_R)?,
            self.u8_field(TAG_W)?,
        )
    }
}

fn parse_fields(mut buf: &[u8]) -> Result<Fields> {
    let mut entries = Vec::new();

    while buf.has_remaining() {
        if buf.remaining() < 5 {
            return Err(Error::MalformedFrame("truncated field header".into()));
        }
        let tag = buf.get_u8();
        let len = buf.get_u32_le() as usize;
        if buf.remaining() < len {
            return Err(Error::MalformedFrame(format!(
                "field tag {} truncated: want {} bytes, have {}",
                tag,
                len,
                buf.remaining()
            )));
        }
        let payload = Bytes::copy_from_slice(&buf[..len]);
        buf.advance(len);
        entries.push((tag, payload));
    }

    Ok(Fields { entries })
}
